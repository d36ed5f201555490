//! Map the service's JSON answer onto study-suggestion events.

use chrono::NaiveTime;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::GenerationError;
use crate::event::CalendarEvent;
use crate::week::WeekWindow;

/// Parse `H:mm` or `HH:mm` (24-hour). A trailing `:ss` is accepted and ignored.
pub fn parse_time(time_str: &str) -> Option<NaiveTime> {
    let (hour, rest) = time_str.split_once(':')?;
    let digits = |s: &str| !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit());
    let minute = match rest.split_once(':') {
        Some((minute, second)) => {
            if !digits(second) || second.len() != 2 || second.parse::<u32>().ok()? > 59 {
                return None;
            }
            minute
        }
        None => rest,
    };
    if !digits(hour) || hour.len() > 2 || !digits(minute) || minute.len() != 2 {
        return None;
    }
    let hour = hour.parse::<u32>().ok()?;
    let minute = minute.parse::<u32>().ok()?;
    if hour > 23 || minute > 59 {
        return None;
    }
    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Models sometimes wrap JSON in a markdown fence despite the MIME type.
fn strip_code_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(inner) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let inner = inner.strip_prefix("json").unwrap_or(inner);
    inner.strip_suffix("```").unwrap_or(inner).trim()
}

/// Decode a response body into suggestions dated within `week`.
///
/// Whole-body problems are errors. Bad individual entries are logged and
/// skipped.
pub fn decode_suggestions(text: &str, week: &WeekWindow) -> Result<Vec<CalendarEvent>, GenerationError> {
    let body = strip_code_fence(text);
    if body.is_empty() {
        return Err(GenerationError::EmptyResponse);
    }

    let value: Value = serde_json::from_str(body)
        .map_err(|e| GenerationError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    let entries = value
        .as_object()
        .and_then(|obj| obj.get("study_suggestions"))
        .and_then(Value::as_array)
        .ok_or_else(|| {
            GenerationError::MalformedResponse("missing 'study_suggestions' array".to_string())
        })?;

    let stamp = uuid::Uuid::new_v4();
    let suggestions = entries
        .iter()
        .enumerate()
        .filter_map(|(index, entry)| {
            let Some(obj) = entry.as_object() else {
                warn!("Skipping study suggestion {}: not an object", index);
                return None;
            };
            decode_entry(obj, index, week, &stamp.to_string())
        })
        .collect();

    Ok(suggestions)
}

fn decode_entry(
    obj: &Map<String, Value>,
    index: usize,
    week: &WeekWindow,
    stamp: &str,
) -> Option<CalendarEvent> {
    let field = |name: &str| {
        let value = obj.get(name).and_then(Value::as_str);
        if value.is_none() {
            warn!("Skipping study suggestion {}: missing '{}'", index, name);
        }
        value
    };

    let title = field("title")?;
    let day = field("day_of_week")?;
    let start_time = field("start_time")?;
    let end_time = field("end_time")?;
    let description = field("description")?;

    let Some(date) = WeekWindow::day_index(day).and_then(|i| week.day(i)) else {
        warn!("Invalid day_of_week from AI: {}", day);
        return None;
    };

    let (Some(start), Some(end)) = (parse_time(start_time), parse_time(end_time)) else {
        warn!(
            "Skipping study suggestion '{}' due to bad time: {} - {}",
            title, start_time, end_time
        );
        return None;
    };

    let event = CalendarEvent::study_suggestion(
        format!("study-{}-{}", index, stamp),
        title.to_string(),
        date.and_time(start),
        date.and_time(end),
        description.to_string(),
    );
    if event.is_none() {
        warn!(
            "Skipping study suggestion '{}': end {} is not after start {}",
            title, end_time, start_time
        );
    }
    event
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use serde_json::json;

    fn week() -> WeekWindow {
        WeekWindow::containing(
            NaiveDate::from_ymd_opt(2025, 9, 1)
                .unwrap()
                .and_hms_opt(9, 0, 0)
                .unwrap(),
        )
    }

    fn entry(day: &str, start: &str, end: &str) -> Value {
        json!({
            "title": "Review for Math101",
            "day_of_week": day,
            "start_time": start,
            "end_time": end,
            "description": "Consolidate the lecture"
        })
    }

    #[test]
    fn test_decodes_valid_entry() {
        let body = json!({ "study_suggestions": [entry("Monday", "11:00", "12:30")] }).to_string();
        let events = decode_suggestions(&body, &week()).unwrap();

        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert!(event.is_study_suggestion());
        assert!(event.id().starts_with("study-0-"));
        assert_eq!(
            event.start(),
            NaiveDate::from_ymd_opt(2025, 9, 1).unwrap().and_hms_opt(11, 0, 0).unwrap()
        );
        assert_eq!(event.description(), Some("Consolidate the lecture"));
        assert_eq!(event.location(), Some("AI Suggestion"));
    }

    #[test]
    fn test_body_level_failures() {
        assert!(matches!(
            decode_suggestions("  \n", &week()),
            Err(GenerationError::EmptyResponse)
        ));
        assert!(matches!(
            decode_suggestions("{}", &week()),
            Err(GenerationError::MalformedResponse(_))
        ));
        assert!(matches!(
            decode_suggestions("not json", &week()),
            Err(GenerationError::MalformedResponse(_))
        ));
        assert!(matches!(
            decode_suggestions("[1, 2]", &week()),
            Err(GenerationError::MalformedResponse(_))
        ));
        assert!(matches!(
            decode_suggestions(r#"{"study_suggestions": "soon"}"#, &week()),
            Err(GenerationError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_skips_bad_entries_and_keeps_good_ones() {
        let body = json!({ "study_suggestions": [
            "just text",
            { "title": "No times", "day_of_week": "Monday", "description": "x" },
            entry("Funday", "11:00", "12:30"),
            entry("Tuesday", "25:00", "26:00"),
            entry("Tuesday", "9am", "10am"),
            entry("Wednesday", "14:00", "14:00"),
            entry("Thursday", "16:00", "15:00"),
            entry("Friday", "8:30", "10:00"),
        ]})
        .to_string();

        let events = decode_suggestions(&body, &week()).unwrap();

        assert_eq!(events.len(), 1);
        assert!(events[0].id().starts_with("study-7-"));
        assert!(events.iter().all(|e| e.end() > e.start()));
    }

    #[test]
    fn test_code_fence_is_tolerated() {
        let body = format!(
            "```json\n{}\n```",
            json!({ "study_suggestions": [] })
        );
        assert!(decode_suggestions(&body, &week()).unwrap().is_empty());
    }

    #[test]
    fn test_parse_time() {
        assert_eq!(parse_time("9:05"), NaiveTime::from_hms_opt(9, 5, 0));
        assert_eq!(parse_time("23:59"), NaiveTime::from_hms_opt(23, 59, 0));
        assert_eq!(parse_time("24:00"), None);
        assert_eq!(parse_time("12:60"), None);
        assert_eq!(parse_time("12:5"), None);
        assert_eq!(parse_time("+1:00"), None);
        assert_eq!(parse_time("1200"), None);
    }

    #[test]
    fn test_parse_time_ignores_seconds() {
        assert_eq!(parse_time("14:00:00"), NaiveTime::from_hms_opt(14, 0, 0));
        assert_eq!(parse_time("9:30:15"), NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(parse_time("14:00:60"), None);
        assert_eq!(parse_time("14:00:"), None);
        assert_eq!(parse_time("14:00:00:00"), None);
    }
}
