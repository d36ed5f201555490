//! The Sunday-to-Saturday week shown on the grid.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

/// Day names as the AI service is asked to write them, Sunday first.
pub const DAY_NAMES: [&str; 7] = [
    "Sunday",
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
];

/// Half-open window `[Sunday 00:00, next Sunday 00:00)` in viewer-local time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekWindow {
    start: NaiveDate,
}

impl WeekWindow {
    /// The week that contains `at`.
    pub fn containing(at: NaiveDateTime) -> Self {
        let date = at.date();
        let offset = date.weekday().num_days_from_sunday() as i64;
        WeekWindow {
            start: date - Duration::days(offset),
        }
    }

    /// The Sunday that opens the week.
    pub fn start_date(&self) -> NaiveDate {
        self.start
    }

    /// The Saturday that closes the week.
    pub fn end_date(&self) -> NaiveDate {
        self.start + Duration::days(6)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start.and_time(NaiveTime::MIN)
    }

    /// Exclusive upper bound: the following Sunday at midnight.
    pub fn end(&self) -> NaiveDateTime {
        (self.start + Duration::days(7)).and_time(NaiveTime::MIN)
    }

    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start() && at < self.end()
    }

    /// Date of the given day, 0 = Sunday. `None` past Saturday.
    pub fn day(&self, index: usize) -> Option<NaiveDate> {
        (index < 7).then(|| self.start + Duration::days(index as i64))
    }

    /// Index of an exact English day name, `"Sunday"` = 0.
    pub fn day_index(name: &str) -> Option<usize> {
        DAY_NAMES.iter().position(|d| *d == name)
    }
}
