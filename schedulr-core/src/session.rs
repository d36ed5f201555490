//! Session state machine.
//!
//! A session moves `initial → parsing → generating → displaying`, with
//! `error` reachable from the two working states. Every change goes
//! through [`Session::apply`]; a rejected action leaves the session as it was.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{SchedulrError, SchedulrResult};
use crate::event::CalendarEvent;
use crate::grid::WeekGrid;
use crate::week::WeekWindow;

pub const NO_EVENTS_MESSAGE: &str =
    "No events found in the calendar. Please check the file or try another one.";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    #[default]
    Initial,
    Parsing,
    Generating,
    Displaying,
    Error,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let name = match self {
            Status::Initial => "initial",
            Status::Parsing => "parsing",
            Status::Generating => "generating",
            Status::Displaying => "displaying",
            Status::Error => "error",
        };
        write!(f, "{}", name)
    }
}

/// Why a step failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Failure {
    /// The file could not be read as a calendar
    Parse(String),
    /// The study-suggestion step failed
    Generation(String),
}

impl Failure {
    /// Message shown to the user.
    pub fn message(&self) -> String {
        match self {
            Failure::Parse(detail) => format!(
                "Failed to process calendar. {}. Please ensure it is a valid .ics file.",
                detail.trim_end_matches('.')
            ),
            Failure::Generation(detail) => format!(
                "Failed to generate study suggestions. {}.",
                detail.trim_end_matches('.')
            ),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Upload,
    Parsed(Vec<CalendarEvent>),
    SuggestionsReady(Vec<CalendarEvent>),
    Failed(Failure),
    Reset,
    Select(String),
    CloseDetail,
}

impl Action {
    pub fn name(&self) -> &'static str {
        match self {
            Action::Upload => "upload",
            Action::Parsed(_) => "parsed",
            Action::SuggestionsReady(_) => "suggestions_ready",
            Action::Failed(_) => "failed",
            Action::Reset => "reset",
            Action::Select(_) => "select",
            Action::CloseDetail => "close_detail",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct Session {
    status: Status,
    classes: Vec<CalendarEvent>,
    suggestions: Vec<CalendarEvent>,
    error: Option<String>,
    selected: Option<String>,
    /// Bumped on every upload and reset
    attempt: u64,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Class events held by the session, shown or not.
    pub fn classes(&self) -> &[CalendarEvent] {
        &self.classes
    }

    pub fn suggestions(&self) -> &[CalendarEvent] {
        &self.suggestions
    }

    /// Identifies the current upload. Results computed for an older
    /// attempt must not be applied.
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    /// Whether a new file may be uploaded now.
    pub fn can_upload(&self) -> bool {
        matches!(self.status, Status::Initial | Status::Error)
    }

    /// Apply an action, or reject it without changing anything.
    pub fn apply(&mut self, action: Action) -> SchedulrResult<()> {
        let reject = |status: Status, action: &Action| SchedulrError::InvalidTransition {
            status,
            action: action.name(),
        };

        match (self.status, action) {
            (_, Action::Reset) => {
                *self = Session {
                    attempt: self.attempt + 1,
                    ..Session::default()
                };
            }
            (Status::Initial | Status::Error, Action::Upload) => {
                *self = Session {
                    status: Status::Parsing,
                    attempt: self.attempt + 1,
                    ..Session::default()
                };
            }
            (Status::Parsing, Action::Parsed(events)) => {
                if events.is_empty() {
                    self.status = Status::Error;
                    self.error = Some(NO_EVENTS_MESSAGE.to_string());
                } else {
                    self.classes = events;
                    self.status = Status::Generating;
                }
            }
            (Status::Parsing, Action::Failed(failure @ Failure::Parse(_)))
            | (Status::Generating, Action::Failed(failure @ Failure::Generation(_))) => {
                self.error = Some(failure.message());
                self.suggestions.clear();
                self.selected = None;
                self.status = Status::Error;
            }
            (Status::Generating, Action::SuggestionsReady(events)) => {
                self.suggestions = events;
                self.status = Status::Displaying;
            }
            (Status::Generating | Status::Displaying, Action::Select(id)) => {
                if !self.visible_events().any(|e| e.id() == id) {
                    return Err(SchedulrError::EventNotFound(id));
                }
                self.selected = Some(id);
            }
            (Status::Generating | Status::Displaying, Action::CloseDetail) => {
                self.selected = None;
            }
            (status, action) => return Err(reject(status, &action)),
        }
        Ok(())
    }

    /// Events currently on the grid: classes while suggestions are being
    /// generated, everything once displayed, nothing otherwise.
    pub fn visible_events(&self) -> impl Iterator<Item = &CalendarEvent> {
        let (classes, suggestions): (&[CalendarEvent], &[CalendarEvent]) = match self.status {
            Status::Generating => (self.classes.as_slice(), &[]),
            Status::Displaying => (self.classes.as_slice(), self.suggestions.as_slice()),
            _ => (&[], &[]),
        };
        classes.iter().chain(suggestions.iter())
    }

    pub fn find_event(&self, id: &str) -> Option<&CalendarEvent> {
        self.visible_events().find(|e| e.id() == id)
    }

    /// The event whose detail card is open.
    pub fn selected_event(&self) -> Option<&CalendarEvent> {
        self.selected.as_deref().and_then(|id| self.find_event(id))
    }

    /// The week being shown, if any.
    pub fn week(&self) -> Option<WeekWindow> {
        self.visible_events().next()?;
        self.classes.first().map(|e| WeekWindow::containing(e.start()))
    }

    /// Grid layout of the visible events, if there is a week to show.
    pub fn grid(&self) -> Option<WeekGrid> {
        let week = self.week()?;
        let events: Vec<CalendarEvent> = self.visible_events().cloned().collect();
        Some(WeekGrid::layout(&week, &events))
    }
}
