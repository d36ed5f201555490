//! The event value shown on the weekly grid.
//!
//! Both parsed classes and AI study suggestions end up as `CalendarEvent`s.
//! Times are wall-clock values in the viewer's time zone; ingestion resolves
//! every ICS time form to that zone before an event is built.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Location attached to every study suggestion.
pub const SUGGESTION_LOCATION: &str = "AI Suggestion";

/// Where an event came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    /// Parsed from the uploaded calendar
    Class,
    /// Suggested by the AI service
    StudySuggestion,
}

/// An immutable calendar event. `start < end` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarEvent {
    id: String,
    title: String,
    start: NaiveDateTime,
    end: NaiveDateTime,
    location: Option<String>,
    description: Option<String>,
    kind: EventKind,
}

impl CalendarEvent {
    /// Build a class event. Returns `None` unless `start < end`.
    pub fn class(
        id: String,
        title: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
        location: Option<String>,
        description: Option<String>,
    ) -> Option<Self> {
        Self::build(id, title, start, end, location, description, EventKind::Class)
    }

    /// Build a study suggestion. Returns `None` unless `start < end`.
    pub fn study_suggestion(
        id: String,
        title: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
        description: String,
    ) -> Option<Self> {
        Self::build(
            id,
            title,
            start,
            end,
            Some(SUGGESTION_LOCATION.to_string()),
            Some(description),
            EventKind::StudySuggestion,
        )
    }

    fn build(
        id: String,
        title: String,
        start: NaiveDateTime,
        end: NaiveDateTime,
        location: Option<String>,
        description: Option<String>,
        kind: EventKind,
    ) -> Option<Self> {
        if start >= end {
            return None;
        }
        Some(CalendarEvent {
            id,
            title,
            start,
            end,
            location,
            description,
            kind,
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn location(&self) -> Option<&str> {
        self.location.as_deref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn kind(&self) -> EventKind {
        self.kind
    }

    pub fn is_study_suggestion(&self) -> bool {
        self.kind == EventKind::StudySuggestion
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Time range in 12-hour form, e.g. "9:00 AM - 10:30 AM".
    pub fn time_range(&self) -> String {
        format!(
            "{} - {}",
            self.start.format("%-I:%M %p"),
            self.end.format("%-I:%M %p")
        )
    }
}

impl fmt::Display for CalendarEvent {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.title)
    }
}
