//! The detail card shown for a selected event.

use serde::Serialize;

use crate::event::{CalendarEvent, EventKind};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventDetail {
    pub id: String,
    pub title: String,
    pub kind: EventKind,
    /// "AI Study Suggestion" or "Class Schedule"
    pub heading: &'static str,
    /// e.g. "Monday, 9:00 AM - 10:00 AM"
    pub when: String,
    /// Why a suggestion was placed where it is
    pub reason: Option<String>,
    pub location: Option<String>,
    pub notes: Option<String>,
}

impl From<&CalendarEvent> for EventDetail {
    fn from(event: &CalendarEvent) -> Self {
        let suggestion = event.is_study_suggestion();
        let text = |value: Option<&str>| value.filter(|v| !v.is_empty()).map(str::to_string);

        EventDetail {
            id: event.id().to_string(),
            title: event.title().to_string(),
            kind: event.kind(),
            heading: if suggestion {
                "AI Study Suggestion"
            } else {
                "Class Schedule"
            },
            when: format!("{}, {}", event.start().format("%A"), event.time_range()),
            reason: if suggestion { text(event.description()) } else { None },
            location: if suggestion { None } else { text(event.location()) },
            notes: if suggestion { None } else { text(event.description()) },
        }
    }
}
