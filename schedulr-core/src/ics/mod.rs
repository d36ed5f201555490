//! ICS file parsing and recurrence expansion.
//!
//! This module reads .ics files according to RFC 5545.

mod parse;
mod recurrence;
mod time;

pub use parse::{IcsEvent, Recurrence, parse_calendar};
pub use recurrence::expand_occurrences;
pub use time::{EventTime, resolve_tzid};
