//! ICS parsing using the icalendar crate's parser.

use chrono::Duration;
use icalendar::{
    DatePerhapsTime,
    parser::{Component, Property, read_calendar, unfold},
};
use tracing::{debug, warn};

use crate::error::{SchedulrError, SchedulrResult};
use crate::ics::time::EventTime;

/// A VEVENT as read from the file, before recurrence expansion.
#[derive(Debug, Clone)]
pub struct IcsEvent {
    pub uid: Option<String>,
    pub summary: String,
    pub description: Option<String>,
    pub location: Option<String>,
    pub start: EventTime,
    pub end: EventTime,
    pub cancelled: bool,
    pub recurrence: Option<Recurrence>,
    /// Set on instance overrides of a recurring master
    pub recurrence_id: Option<EventTime>,
}

/// Recurrence data of a master event.
#[derive(Debug, Clone, PartialEq)]
pub struct Recurrence {
    pub rrules: Vec<String>,
    pub exdates: Vec<EventTime>,
    pub rdates: Vec<EventTime>,
}

impl IcsEvent {
    pub fn is_recurring(&self) -> bool {
        self.recurrence.is_some()
    }
}

/// Parse a whole calendar file into its VEVENTs.
///
/// Fails when the text is not iCalendar. A calendar without events is
/// not an error and yields an empty list. VEVENTs without a usable DTSTART
/// are skipped.
pub fn parse_calendar(content: &str) -> SchedulrResult<Vec<IcsEvent>> {
    let unfolded = unfold(content.trim_start_matches('\u{feff}'));

    let starts_with_calendar = unfolded
        .trim_start()
        .get(..15)
        .is_some_and(|head| head.eq_ignore_ascii_case("BEGIN:VCALENDAR"));
    if !starts_with_calendar {
        return Err(SchedulrError::IcsParse(
            "Input does not start with BEGIN:VCALENDAR".to_string(),
        ));
    }

    let calendar = read_calendar(&unfolded).map_err(|e| SchedulrError::IcsParse(e.to_string()))?;

    let mut vevents = Vec::new();
    for component in &calendar.components {
        collect_vevents(component, &mut vevents);
    }

    let events = vevents
        .into_iter()
        .filter_map(|vevent| {
            let parsed = parse_vevent(vevent);
            if parsed.is_none() {
                warn!(
                    "Skipping VEVENT without a valid DTSTART (UID: {})",
                    vevent
                        .find_prop("UID")
                        .map(|p| p.val.to_string())
                        .unwrap_or_else(|| "none".to_string())
                );
            }
            parsed
        })
        .collect();

    Ok(events)
}

/// VEVENTs may sit at the top level or inside the VCALENDAR root,
/// depending on how the parser flattened the tree.
fn collect_vevents<'a>(component: &'a Component<'a>, out: &mut Vec<&'a Component<'a>>) {
    if component.name == "VEVENT" {
        out.push(component);
        return;
    }
    for child in &component.components {
        collect_vevents(child, out);
    }
}

fn parse_vevent(vevent: &Component) -> Option<IcsEvent> {
    let start = to_event_time(DatePerhapsTime::try_from(vevent.find_prop("DTSTART")?).ok()?);

    let end = vevent
        .find_prop("DTEND")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_event_time)
        .or_else(|| {
            let duration = parse_duration(vevent.find_prop("DURATION")?.val.as_ref())?;
            Some(add_duration(&start, duration))
        })
        .unwrap_or_else(|| {
            if !start.is_date() {
                debug!(
                    "Event without DTEND or DURATION at {:?}, showing it as {} minutes",
                    start, INSTANT_EVENT_MINUTES
                );
            }
            default_end(&start)
        });

    let uid = vevent.find_prop("UID").map(|p| p.val.to_string());
    let summary = vevent
        .find_prop("SUMMARY")
        .map(|p| unescape_text(p.val.as_ref()))
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| "(No title)".to_string());
    let description = vevent
        .find_prop("DESCRIPTION")
        .map(|p| unescape_text(p.val.as_ref()))
        .filter(|s| !s.is_empty());
    let location = vevent
        .find_prop("LOCATION")
        .map(|p| unescape_text(p.val.as_ref()))
        .filter(|s| !s.is_empty());

    let cancelled = vevent
        .find_prop("STATUS")
        .is_some_and(|p| p.val.as_ref().eq_ignore_ascii_case("CANCELLED"));

    // Recurrence (RRULE, RDATE, EXDATE)
    let rrules: Vec<String> = vevent
        .properties
        .iter()
        .filter(|p| p.name == "RRULE")
        .map(|p| p.val.to_string())
        .collect();
    let rdates: Vec<EventTime> = vevent
        .properties
        .iter()
        .filter(|p| p.name == "RDATE")
        .flat_map(parse_date_list_property)
        .collect();
    let exdates: Vec<EventTime> = vevent
        .properties
        .iter()
        .filter(|p| p.name == "EXDATE")
        .flat_map(parse_date_list_property)
        .collect();
    let recurrence = if rrules.is_empty() && rdates.is_empty() {
        None
    } else {
        Some(Recurrence {
            rrules,
            exdates,
            rdates,
        })
    };

    let recurrence_id = vevent
        .find_prop("RECURRENCE-ID")
        .and_then(|p| DatePerhapsTime::try_from(p).ok())
        .map(to_event_time);

    Some(IcsEvent {
        uid,
        summary,
        description,
        location,
        start,
        end,
        cancelled,
        recurrence,
        recurrence_id,
    })
}

/// Convert icalendar's DatePerhapsTime to our EventTime, preserving timezone info
fn to_event_time(dpt: DatePerhapsTime) -> EventTime {
    match dpt {
        DatePerhapsTime::Date(d) => EventTime::Date(d),
        DatePerhapsTime::DateTime(cal_dt) => match cal_dt {
            icalendar::CalendarDateTime::Utc(dt) => EventTime::DateTimeUtc(dt),
            icalendar::CalendarDateTime::Floating(naive) => EventTime::DateTimeFloating(naive),
            icalendar::CalendarDateTime::WithTimezone { date_time, tzid } => {
                EventTime::DateTimeZoned {
                    datetime: date_time,
                    tzid,
                }
            }
        },
    }
}

/// Parse an EXDATE or RDATE property into a list of EventTime values.
///
/// Handles:
/// - TZID parameter: `EXDATE;TZID=America/New_York:20240108T100000`
/// - VALUE=DATE: `EXDATE;VALUE=DATE:20240108`
/// - UTC: `EXDATE:20240108T100000Z`
/// - Floating: `EXDATE:20240108T100000`
/// - Comma-separated values: `EXDATE;TZID=...:20240108T100000,20240115T100000`
///
/// RDATE periods (VALUE=PERIOD) are not supported and are dropped.
fn parse_date_list_property(prop: &Property) -> Vec<EventTime> {
    let tzid = prop
        .params
        .iter()
        .find(|p| p.key == "TZID")
        .and_then(|p| p.val.as_ref().map(|v| v.to_string()));

    let is_date = prop
        .params
        .iter()
        .any(|p| p.key == "VALUE" && p.val.as_ref().map(|v| v.as_ref()) == Some("DATE"));

    let val_str = prop.val.as_ref();
    val_str
        .split(',')
        .filter_map(|s| {
            let s = s.trim();
            if s.is_empty() || s.contains('/') {
                return None;
            }
            if is_date || s.len() == 8 {
                chrono::NaiveDate::parse_from_str(s, "%Y%m%d")
                    .ok()
                    .map(EventTime::Date)
            } else if let Some(ref tz) = tzid {
                chrono::NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|dt| EventTime::DateTimeZoned {
                        datetime: dt,
                        tzid: tz.clone(),
                    })
            } else if s.ends_with('Z') {
                let s = s.trim_end_matches('Z');
                chrono::NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(|dt| EventTime::DateTimeUtc(dt.and_utc()))
            } else {
                chrono::NaiveDateTime::parse_from_str(s, "%Y%m%dT%H%M%S")
                    .ok()
                    .map(EventTime::DateTimeFloating)
            }
        })
        .collect()
}

/// Parse a DURATION value (P1D, PT1H30M, -PT15M). Negative durations are rejected.
fn parse_duration(value: &str) -> Option<Duration> {
    let value = value.trim();
    if value.starts_with('-') {
        return None;
    }
    let duration = iso8601::duration(value.trim_start_matches('+')).ok()?;
    let std_duration: std::time::Duration = duration.into();
    Duration::from_std(std_duration).ok()
}

fn add_duration(start: &EventTime, duration: Duration) -> EventTime {
    match start {
        EventTime::Date(d) => EventTime::Date(*d + Duration::days(duration.num_days().max(1))),
        EventTime::DateTimeUtc(dt) => EventTime::DateTimeUtc(*dt + duration),
        EventTime::DateTimeFloating(dt) => EventTime::DateTimeFloating(*dt + duration),
        EventTime::DateTimeZoned { datetime, tzid } => EventTime::DateTimeZoned {
            datetime: *datetime + duration,
            tzid: tzid.clone(),
        },
    }
}

/// Display length of a date-time event without DTEND/DURATION. Such events
/// are instants per RFC 5545; one grid row keeps them visible.
const INSTANT_EVENT_MINUTES: i64 = 30;

/// A date-only event without DTEND/DURATION lasts one day.
fn default_end(start: &EventTime) -> EventTime {
    match start {
        EventTime::Date(d) => EventTime::Date(*d + Duration::days(1)),
        other => add_duration(other, Duration::minutes(INSTANT_EVENT_MINUTES)),
    }
}

/// Undo TEXT escaping (`\n`, `\,`, `\;`, `\\`).
fn unescape_text(value: &str) -> String {
    let mut result = String::with_capacity(value.len());
    let mut chars = value.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            result.push(c);
            continue;
        }
        match chars.next() {
            Some('n') | Some('N') => result.push('\n'),
            Some(other) => result.push(other),
            None => result.push('\\'),
        }
    }

    result
}
