//! RRULE expansion for recurring events.
//!
//! Expands a master recurring event into the start times of its occurrences,
//! up to a forward horizon, respecting RDATEs and EXDATEs.

use chrono::{DateTime, Utc};
use rrule::RRuleSet;
use tracing::warn;

use crate::ics::parse::IcsEvent;
use crate::ics::time::{EventTime, resolve_tzid};

/// Render an EventTime as the value part of a DTSTART/EXDATE/RDATE line.
///
/// The rrule crate needs date-times, so all-day dates become midnight UTC and
/// floating times are pinned to UTC; the wall-clock value survives either way.
fn rrule_time(prefix: &str, time: &EventTime) -> String {
    match time {
        EventTime::Date(d) => format!("{}:{}T000000Z", prefix, d.format("%Y%m%d")),
        EventTime::DateTimeUtc(dt) => format!("{}:{}", prefix, dt.format("%Y%m%dT%H%M%SZ")),
        EventTime::DateTimeFloating(dt) => format!("{}:{}Z", prefix, dt.format("%Y%m%dT%H%M%S")),
        EventTime::DateTimeZoned { datetime, tzid } => match resolve_tzid(tzid) {
            Some(tz) => format!(
                "{};TZID={}:{}",
                prefix,
                tz.name(),
                datetime.format("%Y%m%dT%H%M%S")
            ),
            None => format!("{}:{}Z", prefix, datetime.format("%Y%m%dT%H%M%S")),
        },
    }
}

/// The rrule crate insists on a UTC UNTIL for date-time starts; many
/// exporters write a bare date or a local time instead.
fn normalize_until(rrule: &str) -> String {
    rrule
        .split(';')
        .map(|part| match part.split_once('=') {
            Some((key, value)) if key.eq_ignore_ascii_case("UNTIL") => {
                if value.len() == 8 {
                    format!("UNTIL={}T235959Z", value)
                } else if !value.ends_with('Z') {
                    format!("UNTIL={}Z", value)
                } else {
                    part.to_string()
                }
            }
            _ => part.to_string(),
        })
        .collect::<Vec<_>>()
        .join(";")
}

/// Build an iCalendar-format rule set string for the rrule crate parser.
fn build_rrule_string(master: &IcsEvent) -> Option<String> {
    let recurrence = master.recurrence.as_ref()?;
    let mut lines = vec![rrule_time("DTSTART", &master.start)];

    for rule in &recurrence.rrules {
        lines.push(format!("RRULE:{}", normalize_until(rule)));
    }
    for rdate in &recurrence.rdates {
        lines.push(rrule_time("RDATE", rdate));
    }
    for exdate in &recurrence.exdates {
        lines.push(rrule_time("EXDATE", exdate));
    }

    Some(lines.join("\n"))
}

/// Convert an rrule occurrence datetime back to an EventTime matching the master's variant.
fn occurrence_to_event_time(dt: &DateTime<rrule::Tz>, master_start: &EventTime) -> EventTime {
    match master_start {
        EventTime::Date(_) => EventTime::Date(dt.date_naive()),
        EventTime::DateTimeUtc(_) => EventTime::DateTimeUtc(dt.with_timezone(&Utc)),
        EventTime::DateTimeFloating(_) => EventTime::DateTimeFloating(dt.naive_utc()),
        EventTime::DateTimeZoned { tzid, datetime } => match resolve_tzid(tzid) {
            Some(_) => EventTime::DateTimeZoned {
                datetime: dt.naive_local(),
                tzid: tzid.clone(),
            },
            // Pinned to UTC in rrule_time, so the UTC wall clock is the local one
            None => EventTime::DateTimeZoned {
                datetime: dt.naive_utc().date().and_time(datetime.time()),
                tzid: tzid.clone(),
            },
        },
    }
}

/// Occurrences of a master whose rule cannot be used: DTSTART plus RDATEs,
/// minus EXDATEs.
fn explicit_occurrences(master: &IcsEvent, horizon: DateTime<Utc>) -> Vec<EventTime> {
    let horizon = horizon.naive_utc();
    let (rdates, exdates) = master
        .recurrence
        .as_ref()
        .map(|r| (r.rdates.as_slice(), r.exdates.as_slice()))
        .unwrap_or_default();

    let mut starts: Vec<EventTime> = std::iter::once(&master.start)
        .chain(rdates)
        .filter(|time| !exdates.contains(*time))
        .filter(|time| time.to_local(chrono_tz::UTC) < horizon)
        .cloned()
        .collect();
    starts.sort_by_key(|time| time.to_local(chrono_tz::UTC));
    starts.dedup();
    starts
}

/// Expand a recurring master into the start times of its occurrences that
/// begin before `horizon`, in chronological order.
///
/// The master's own DTSTART is included as the first occurrence.
/// At most `limit` occurrences are produced. A rule the rrule crate rejects
/// is ignored with a warning, leaving DTSTART and the RDATEs.
pub fn expand_occurrences(master: &IcsEvent, horizon: DateTime<Utc>, limit: u16) -> Vec<EventTime> {
    let Some(rrule_str) = build_rrule_string(master) else {
        return vec![master.start.clone()];
    };

    let rrule_set: RRuleSet = match rrule_str.parse() {
        Ok(set) => set,
        Err(e) => {
            warn!("Ignoring unusable RRULE of '{}': {}", master.summary, e);
            return explicit_occurrences(master, horizon);
        }
    };

    let tz: rrule::Tz = Utc.into();
    let before = horizon.with_timezone(&tz);

    let result = rrule_set.before(before).all(limit);
    if result.limited {
        warn!(
            "Recurrence of '{}' truncated after {} occurrences",
            master.summary, limit
        );
    }

    result
        .dates
        .iter()
        .filter(|dt| dt.with_timezone(&Utc) < horizon)
        .map(|dt| occurrence_to_event_time(dt, &master.start))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ics::parse::parse_calendar;
    use chrono::{Duration, NaiveDate, TimeZone};

    fn master(body: &str) -> IcsEvent {
        let ics = format!(
            "BEGIN:VCALENDAR\r\nVERSION:2.0\r\nPRODID:TEST\r\nBEGIN:VEVENT\r\n{body}END:VEVENT\r\nEND:VCALENDAR\r\n"
        );
        parse_calendar(&ics)
            .expect("Should parse")
            .into_iter()
            .next()
            .expect("Should have one event")
    }

    #[test]
    fn test_weekly_expansion_stops_at_horizon() {
        let event = master(
            "UID:weekly\r\nSUMMARY:Weekly\r\n\
DTSTART:20250901T090000Z\r\nDTEND:20250901T100000Z\r\n\
RRULE:FREQ=WEEKLY\r\n",
        );
        let horizon = Utc.with_ymd_and_hms(2025, 9, 29, 9, 0, 0).unwrap();

        let occurrences = expand_occurrences(&event, horizon, 1000);

        // Sep 1, 8, 15, 22; Sep 29 09:00 is not before the horizon
        assert_eq!(occurrences.len(), 4);
        for occ in &occurrences {
            match occ {
                EventTime::DateTimeUtc(dt) => assert!(*dt < horizon),
                other => panic!("Expected DateTimeUtc, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_exdate_and_rdate() {
        let event = master(
            "UID:weekly\r\nSUMMARY:Weekly\r\n\
DTSTART:20250901T090000Z\r\nDTEND:20250901T100000Z\r\n\
RRULE:FREQ=WEEKLY;COUNT=3\r\n\
EXDATE:20250908T090000Z\r\n\
RDATE:20250910T090000Z\r\n",
        );
        let horizon = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        let starts: Vec<EventTime> = expand_occurrences(&event, horizon, 1000);
        let expected: Vec<EventTime> = [(9, 1), (9, 10), (9, 15)]
            .iter()
            .map(|(m, d)| EventTime::DateTimeUtc(Utc.with_ymd_and_hms(2025, *m, *d, 9, 0, 0).unwrap()))
            .collect();
        assert_eq!(starts, expected);
    }

    #[test]
    fn test_zoned_expansion_keeps_wall_clock_across_dst() {
        let event = master(
            "UID:zoned\r\nSUMMARY:Zoned\r\n\
DTSTART;TZID=America/New_York:20251027T090000\r\n\
DTEND;TZID=America/New_York:20251027T100000\r\n\
RRULE:FREQ=WEEKLY;COUNT=2\r\n",
        );
        let horizon = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        let starts = expand_occurrences(&event, horizon, 1000);
        let second = NaiveDate::from_ymd_opt(2025, 11, 3)
            .unwrap()
            .and_hms_opt(9, 0, 0)
            .unwrap();
        assert_eq!(
            starts[1],
            EventTime::DateTimeZoned {
                datetime: second,
                tzid: "America/New_York".to_string()
            }
        );
    }

    #[test]
    fn test_all_day_rule_with_date_until() {
        let event = master(
            "UID:daily\r\nSUMMARY:Daily\r\n\
DTSTART;VALUE=DATE:20250901\r\nDTEND;VALUE=DATE:20250902\r\n\
RRULE:FREQ=DAILY;UNTIL=20250905\r\n",
        );
        let horizon = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        let starts = expand_occurrences(&event, horizon, 1000);
        assert_eq!(starts.len(), 5);
        assert_eq!(
            starts[4],
            EventTime::Date(NaiveDate::from_ymd_opt(2025, 9, 5).unwrap())
        );
    }

    #[test]
    fn test_limit_caps_unbounded_rules() {
        let event = master(
            "UID:hourly\r\nSUMMARY:Hourly\r\n\
DTSTART:20250901T090000Z\r\nDTEND:20250901T093000Z\r\n\
RRULE:FREQ=HOURLY\r\n",
        );
        let horizon = Utc.with_ymd_and_hms(2025, 9, 1, 9, 0, 0).unwrap() + Duration::days(365);

        let starts = expand_occurrences(&event, horizon, 50);
        assert_eq!(starts.len(), 50);
    }

    #[test]
    fn test_until_before_start_keeps_dtstart() {
        let event = master(
            "UID:stale\r\nSUMMARY:Stale\r\n\
DTSTART:20250902T090000Z\r\nDTEND:20250902T100000Z\r\n\
RRULE:FREQ=WEEKLY;UNTIL=20250801T000000Z\r\n",
        );
        let horizon = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        let starts = expand_occurrences(&event, horizon, 1000);
        assert_eq!(
            starts,
            vec![EventTime::DateTimeUtc(Utc.with_ymd_and_hms(2025, 9, 2, 9, 0, 0).unwrap())]
        );
    }

    #[test]
    fn test_unsupported_rule_part_keeps_dtstart_and_rdates() {
        let event = master(
            "UID:vendor\r\nSUMMARY:Vendor\r\n\
DTSTART:20250901T090000Z\r\nDTEND:20250901T100000Z\r\n\
RRULE:FREQ=WEEKLY;X-FOO=1\r\n\
RDATE:20250904T090000Z\r\n\
RDATE:20270104T090000Z\r\n",
        );
        let horizon = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();

        let starts = expand_occurrences(&event, horizon, 1000);
        let expected: Vec<EventTime> = [1, 4]
            .iter()
            .map(|d| EventTime::DateTimeUtc(Utc.with_ymd_and_hms(2025, 9, *d, 9, 0, 0).unwrap()))
            .collect();
        assert_eq!(starts, expected);
    }

    #[test]
    fn test_normalize_until() {
        assert_eq!(
            normalize_until("FREQ=DAILY;UNTIL=20250905"),
            "FREQ=DAILY;UNTIL=20250905T235959Z"
        );
        assert_eq!(
            normalize_until("FREQ=DAILY;UNTIL=20250905T090000"),
            "FREQ=DAILY;UNTIL=20250905T090000Z"
        );
        assert_eq!(
            normalize_until("FREQ=DAILY;UNTIL=20250905T090000Z;COUNT=1"),
            "FREQ=DAILY;UNTIL=20250905T090000Z;COUNT=1"
        );
    }
}
