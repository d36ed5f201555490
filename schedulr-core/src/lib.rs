//! Core library for schedulr.
//!
//! This crate holds everything the front ends share:
//! - `ics` and `ingest` turn an uploaded calendar into the class events of one week
//! - `suggest` and `gemini` ask a text-generation service for study blocks
//! - `grid` and `detail` lay events out for display
//! - `session` and `planner` drive the upload workflow

pub mod config;
pub mod detail;
pub mod error;
pub mod event;
pub mod gemini;
pub mod grid;
pub mod ics;
pub mod ingest;
pub mod planner;
pub mod session;
pub mod suggest;
pub mod week;

pub use self::config::SchedulrConfig;
pub use detail::EventDetail;
pub use error::{GenerationError, SchedulrError, SchedulrResult};
pub use event::{CalendarEvent, EventKind};
pub use gemini::GeminiClient;
pub use grid::{GridPlacement, WeekGrid};
pub use ingest::{IngestOptions, parse_schedule};
pub use planner::Planner;
pub use session::{Action, Failure, Session, Status};
pub use week::WeekWindow;
