//! Turn calendar text into the class events of one week.
//!
//! Recurring masters are expanded up to a horizon, instance overrides replace
//! the occurrences they name, and the result is cut down to the
//! Sunday-to-Saturday week of the earliest event.

use std::collections::HashMap;

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use chrono_tz::Tz;
use tracing::{debug, info, warn};

use crate::error::SchedulrResult;
use crate::event::CalendarEvent;
use crate::ics::{IcsEvent, expand_occurrences, parse_calendar};
use crate::week::WeekWindow;

/// How far ahead recurring events are expanded unless configured otherwise.
pub const DEFAULT_HORIZON_DAYS: i64 = 183;

/// Upper bound on occurrences generated per recurring master.
pub const DEFAULT_MAX_OCCURRENCES: u16 = 1000;

/// Knobs for [`parse_schedule`].
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Forward window from `now` for recurrence expansion
    pub horizon: Duration,
    /// Reference instant; the current time when `None`
    pub now: Option<DateTime<Utc>>,
    /// The viewer's zone every event time is resolved to
    pub timezone: Tz,
    pub max_occurrences: u16,
}

impl Default for IngestOptions {
    fn default() -> Self {
        IngestOptions {
            horizon: Duration::days(DEFAULT_HORIZON_DAYS),
            now: None,
            timezone: chrono_tz::UTC,
            max_occurrences: DEFAULT_MAX_OCCURRENCES,
        }
    }
}

impl IngestOptions {
    /// Instant before which recurring occurrences must start.
    pub fn horizon_at(&self) -> DateTime<Utc> {
        self.now.unwrap_or_else(Utc::now) + self.horizon
    }
}

/// Parse calendar text and return the events of the earliest event's week,
/// sorted by start.
///
/// A calendar that parses but has no usable events gives an empty list.
pub fn parse_schedule(content: &str, options: &IngestOptions) -> SchedulrResult<Vec<CalendarEvent>> {
    let parsed = parse_calendar(content)?;
    debug!("Parsed {} VEVENTs", parsed.len());

    let mut events = expand_events(&parsed, options);
    events.sort_by_key(|e| e.start());

    let Some(first) = events.first() else {
        return Ok(events);
    };
    let week = WeekWindow::containing(first.start());
    events.retain(|e| week.contains(e.start()));

    info!(
        "Ingested {} events for the week of {}",
        events.len(),
        week.start_date()
    );
    Ok(events)
}

/// Expand all VEVENTs into concrete events before the horizon, unsorted and
/// unfiltered by week.
pub fn expand_events(parsed: &[IcsEvent], options: &IngestOptions) -> Vec<CalendarEvent> {
    let tz = options.timezone;
    let horizon_at = options.horizon_at();
    let horizon_local = horizon_at.with_timezone(&tz).naive_local();

    let mut overrides: HashMap<(String, NaiveDateTime), &IcsEvent> = HashMap::new();
    for event in parsed {
        if let (Some(uid), Some(recurrence_id)) = (&event.uid, &event.recurrence_id) {
            overrides.insert((uid.clone(), recurrence_id.to_local(tz)), event);
        }
    }

    let mut events = Vec::new();
    let mut used_overrides = Vec::new();

    for master in parsed.iter().filter(|e| e.recurrence_id.is_none()) {
        if master.cancelled {
            debug!("Dropping cancelled event '{}'", master.summary);
            continue;
        }

        let uid = master
            .uid
            .clone()
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

        if !master.is_recurring() {
            let start = master.start.to_local(tz);
            if start < horizon_local {
                push_event(&mut events, &uid, master, start, master.end.to_local(tz));
            }
            continue;
        }

        let duration = master.end.to_local(tz) - master.start.to_local(tz);
        for occurrence in expand_occurrences(master, horizon_at, options.max_occurrences) {
            let start = occurrence.to_local(tz);
            let key = (uid.clone(), start);

            match overrides.get(&key) {
                Some(instance) => {
                    used_overrides.push(key);
                    push_override(&mut events, &uid, instance, tz, horizon_local);
                }
                None => push_event(&mut events, &uid, master, start, start + duration),
            }
        }
    }

    // Overrides whose occurrence was not generated still describe a real instance
    for (key, instance) in &overrides {
        if !used_overrides.contains(key) {
            push_override(&mut events, &key.0, instance, tz, horizon_local);
        }
    }

    events
}

fn push_override(
    events: &mut Vec<CalendarEvent>,
    uid: &str,
    instance: &IcsEvent,
    tz: Tz,
    horizon_local: NaiveDateTime,
) {
    if instance.cancelled {
        debug!("Dropping cancelled occurrence of '{}'", instance.summary);
        return;
    }
    let start = instance.start.to_local(tz);
    if start < horizon_local {
        push_event(events, uid, instance, start, instance.end.to_local(tz));
    }
}

fn push_event(
    events: &mut Vec<CalendarEvent>,
    uid: &str,
    source: &IcsEvent,
    start: NaiveDateTime,
    end: NaiveDateTime,
) {
    let id = format!("{}-{}", uid, start.format("%Y-%m-%dT%H:%M:%S"));
    match CalendarEvent::class(
        id,
        source.summary.clone(),
        start,
        end,
        source.location.clone(),
        source.description.clone(),
    ) {
        Some(event) => events.push(event),
        None => warn!(
            "Skipping '{}' at {}: end is not after start",
            source.summary, start
        ),
    }
}
