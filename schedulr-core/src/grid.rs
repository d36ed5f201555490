//! Weekly grid layout.
//!
//! Seven day columns (Sunday first) by 32 half-hour rows covering
//! 07:00 to 23:00. Overlapping events get the same cells; nothing is
//! moved aside.

use chrono::{Datelike, Duration, NaiveDateTime, Timelike};
use serde::Serialize;

use crate::event::CalendarEvent;
use crate::week::{DAY_NAMES, WeekWindow};

pub const FIRST_HOUR: u32 = 7;
pub const LAST_HOUR: u32 = 23;
pub const ROWS: u32 = (LAST_HOUR - FIRST_HOUR) * 2;
pub const COLUMNS: usize = 7;

/// Cells covered by one event. Rows are half-open: `[row_start, row_end)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GridPlacement {
    pub event_id: String,
    /// 0 = Sunday
    pub column: usize,
    pub row_start: u32,
    pub row_end: u32,
}

fn row_of(at: NaiveDateTime) -> u32 {
    let minutes = at.hour() * 60 + at.minute();
    let row = ((minutes as f64 - (FIRST_HOUR * 60) as f64) / 30.0).round();
    row.clamp(0.0, ROWS as f64) as u32
}

/// Place an event on the grid. `None` when nothing of it is visible.
pub fn place(event: &CalendarEvent) -> Option<GridPlacement> {
    let row_start = row_of(event.start());
    let row_end = if event.end().date() > event.start().date() {
        ROWS
    } else {
        row_of(event.end())
    };

    (row_end > row_start).then(|| GridPlacement {
        event_id: event.id().to_string(),
        column: event.start().weekday().num_days_from_sunday() as usize,
        row_start,
        row_end,
    })
}

/// Labels of the hour rows: "7 AM" through "10 PM".
pub fn hour_labels() -> Vec<String> {
    (FIRST_HOUR..LAST_HOUR)
        .map(|hour| match hour {
            12 => "12 PM".to_string(),
            h if h > 12 => format!("{} PM", h - 12),
            h => format!("{} AM", h),
        })
        .collect()
}

/// Text lines shown inside an event's block, depending on how tall it is.
pub fn block_lines(event: &CalendarEvent) -> Vec<String> {
    let mut lines = vec![event.title().to_string()];
    let duration = event.duration();

    if duration > Duration::minutes(45) {
        lines.push(event.time_range());
    }
    if duration > Duration::minutes(60) {
        let extra = if event.is_study_suggestion() {
            event.description()
        } else {
            event.location()
        };
        if let Some(text) = extra.filter(|t| !t.is_empty()) {
            lines.push(text.to_string());
        }
    }
    lines
}

/// A laid-out week.
#[derive(Debug, Clone, Serialize)]
pub struct WeekGrid {
    pub days: Vec<String>,
    pub hours: Vec<String>,
    pub placements: Vec<GridPlacement>,
}

impl WeekGrid {
    pub fn layout(week: &WeekWindow, events: &[CalendarEvent]) -> Self {
        let days = DAY_NAMES
            .iter()
            .enumerate()
            .map(|(i, name)| match week.day(i) {
                Some(date) => format!("{} {}", name, date.format("%-m/%-d")),
                None => name.to_string(),
            })
            .collect();

        WeekGrid {
            days,
            hours: hour_labels(),
            placements: events.iter().filter_map(place).collect(),
        }
    }

    /// Placements in one column, in event order.
    pub fn column(&self, column: usize) -> impl Iterator<Item = &GridPlacement> {
        self.placements.iter().filter(move |p| p.column == column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(d: u32, h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2025, 9, d)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    fn class(start: NaiveDateTime, end: NaiveDateTime) -> CalendarEvent {
        CalendarEvent::class("c".into(), "Math101".into(), start, end, Some("Room 4".into()), None)
            .unwrap()
    }

    #[test]
    fn test_rows_and_column() {
        // Monday 09:00-10:00
        let placement = place(&class(at(1, 9, 0), at(1, 10, 0))).unwrap();
        assert_eq!(placement.column, 1);
        assert_eq!((placement.row_start, placement.row_end), (4, 6));

        // 10:10 rounds to the 10:00 slot, 11:50 to the 12:00 line
        let placement = place(&class(at(1, 10, 10), at(1, 11, 50))).unwrap();
        assert_eq!((placement.row_start, placement.row_end), (6, 10));
    }

    #[test]
    fn test_clamping() {
        let early = place(&class(at(2, 6, 0), at(2, 8, 0))).unwrap();
        assert_eq!((early.row_start, early.row_end), (0, 2));

        let late = place(&class(at(3, 22, 0), at(3, 23, 59))).unwrap();
        assert_eq!((late.row_start, late.row_end), (30, 32));

        let overnight = place(&class(at(4, 22, 0), at(5, 1, 0))).unwrap();
        assert_eq!((overnight.row_start, overnight.row_end), (30, 32));
        assert_eq!(overnight.column, 4);
    }

    #[test]
    fn test_invisible_events() {
        assert!(place(&class(at(1, 5, 0), at(1, 6, 30))).is_none());
        assert!(place(&class(at(1, 23, 0), at(1, 23, 30))).is_none());
        // Shorter than a slot and rounding onto one line
        assert!(place(&class(at(1, 9, 0), at(1, 9, 10))).is_none());
    }

    #[test]
    fn test_overlaps_share_cells() {
        let week = WeekWindow::containing(at(1, 9, 0));
        let events = vec![class(at(1, 9, 0), at(1, 10, 0)), class(at(1, 9, 30), at(1, 11, 0))];
        let grid = WeekGrid::layout(&week, &events);
        assert_eq!(grid.column(1).count(), 2);
        assert_eq!(grid.days[0], "Sunday 8/31");
    }

    #[test]
    fn test_hour_labels() {
        let labels = hour_labels();
        assert_eq!(labels.len(), 16);
        assert_eq!(labels[0], "7 AM");
        assert_eq!(labels[5], "12 PM");
        assert_eq!(labels[15], "10 PM");
    }

    #[test]
    fn test_block_lines_by_duration() {
        let short = class(at(1, 9, 0), at(1, 9, 45));
        assert_eq!(block_lines(&short), vec!["Math101"]);

        let hour = class(at(1, 9, 0), at(1, 10, 0));
        assert_eq!(block_lines(&hour), vec!["Math101", "9:00 AM - 10:00 AM"]);

        let long = class(at(1, 9, 0), at(1, 10, 30));
        assert_eq!(block_lines(&long)[2], "Room 4");

        let study = CalendarEvent::study_suggestion(
            "s".into(),
            "Review".into(),
            at(1, 11, 0),
            at(1, 12, 30),
            "Gap after class".into(),
        )
        .unwrap();
        assert_eq!(block_lines(&study)[2], "Gap after class");
    }
}
