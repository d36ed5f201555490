//! Time values as they appear in ICS files.

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

/// An RFC 5545 date or date-time, keeping the form it was written in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventTime {
    /// All-day value (VALUE=DATE)
    Date(NaiveDate),
    /// `...Z` suffixed date-time
    DateTimeUtc(DateTime<Utc>),
    /// Date-time without zone, interpreted in the viewer's zone
    DateTimeFloating(NaiveDateTime),
    /// Date-time with a TZID parameter
    DateTimeZoned { datetime: NaiveDateTime, tzid: String },
}

impl EventTime {
    pub fn is_date(&self) -> bool {
        matches!(self, EventTime::Date(_))
    }

    /// Resolve to wall-clock time in the viewer's zone.
    ///
    /// Unknown TZIDs are treated as floating. Zoned times that fall into a
    /// DST gap are shifted forward to the first valid instant.
    pub fn to_local(&self, viewer: Tz) -> NaiveDateTime {
        match self {
            EventTime::Date(d) => d.and_time(NaiveTime::MIN),
            EventTime::DateTimeUtc(dt) => dt.with_timezone(&viewer).naive_local(),
            EventTime::DateTimeFloating(dt) => *dt,
            EventTime::DateTimeZoned { datetime, tzid } => match resolve_tzid(tzid) {
                Some(source) => source
                    .from_local_datetime(datetime)
                    .earliest()
                    .or_else(|| {
                        source
                            .from_local_datetime(&(*datetime + chrono::Duration::hours(1)))
                            .earliest()
                    })
                    .map(|dt| dt.with_timezone(&viewer).naive_local())
                    .unwrap_or(*datetime),
                None => {
                    warn!("Unknown TZID '{}', treating time as floating", tzid);
                    *datetime
                }
            },
        }
    }
}

/// Look up an IANA zone name, tolerating the `/vendor/.../Area/City` prefixes
/// some exporters emit.
pub fn resolve_tzid(tzid: &str) -> Option<Tz> {
    if let Ok(tz) = tzid.parse::<Tz>() {
        return Some(tz);
    }

    let parts: Vec<&str> = tzid.trim_matches('/').split('/').collect();
    (0..parts.len()).find_map(|i| parts[i..].join("/").parse::<Tz>().ok())
}
