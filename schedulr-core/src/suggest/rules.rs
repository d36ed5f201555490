//! Placement rules for study blocks and an advisory audit against them.
//!
//! The same numbers are written into the prompt, so what the AI is asked
//! to do and what the audit checks cannot drift apart.

use chrono::{Duration, NaiveTime};
use serde::Serialize;
use std::fmt;

use crate::event::CalendarEvent;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlacementRules {
    pub min_duration: Duration,
    pub max_duration: Duration,
    /// Earliest allowed start
    pub day_start: NaiveTime,
    /// Latest allowed end
    pub day_end: NaiveTime,
    /// Minimum gap to any class
    pub buffer: Duration,
    pub min_count: usize,
    pub max_count: usize,
}

impl Default for PlacementRules {
    fn default() -> Self {
        PlacementRules {
            min_duration: Duration::minutes(90),
            max_duration: Duration::minutes(120),
            day_start: NaiveTime::from_hms_opt(8, 0, 0).unwrap_or(NaiveTime::MIN),
            day_end: NaiveTime::from_hms_opt(22, 0, 0).unwrap_or(NaiveTime::MIN),
            buffer: Duration::minutes(30),
            min_count: 3,
            max_count: 5,
        }
    }
}

/// One rule a suggestion (or the set of suggestions) does not follow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PlacementIssue {
    Duration { title: String, minutes: i64 },
    OutsideDaytime { title: String },
    TooCloseToClass { title: String, class: String },
    EmptyRationale { title: String },
    Count { count: usize },
}

impl fmt::Display for PlacementIssue {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlacementIssue::Duration { title, minutes } => {
                write!(f, "'{}' lasts {} minutes", title, minutes)
            }
            PlacementIssue::OutsideDaytime { title } => {
                write!(f, "'{}' falls outside daytime hours", title)
            }
            PlacementIssue::TooCloseToClass { title, class } => {
                write!(f, "'{}' leaves too little buffer around '{}'", title, class)
            }
            PlacementIssue::EmptyRationale { title } => {
                write!(f, "'{}' has no rationale", title)
            }
            PlacementIssue::Count { count } => write!(f, "{} suggestions returned", count),
        }
    }
}

impl PlacementRules {
    /// Check suggestions against these rules. Nothing is removed; the caller
    /// decides what to do with the findings.
    pub fn audit(&self, classes: &[CalendarEvent], suggestions: &[CalendarEvent]) -> Vec<PlacementIssue> {
        let mut issues = Vec::new();

        if !(self.min_count..=self.max_count).contains(&suggestions.len()) {
            issues.push(PlacementIssue::Count {
                count: suggestions.len(),
            });
        }

        for suggestion in suggestions {
            let title = suggestion.title().to_string();
            let duration = suggestion.duration();

            if duration < self.min_duration || duration > self.max_duration {
                issues.push(PlacementIssue::Duration {
                    title: title.clone(),
                    minutes: duration.num_minutes(),
                });
            }

            let same_day = suggestion.start().date() == suggestion.end().date();
            if !same_day
                || suggestion.start().time() < self.day_start
                || suggestion.end().time() > self.day_end
            {
                issues.push(PlacementIssue::OutsideDaytime {
                    title: title.clone(),
                });
            }

            let crowded = classes.iter().find(|class| {
                suggestion.start() < class.end() + self.buffer
                    && class.start() < suggestion.end() + self.buffer
            });
            if let Some(class) = crowded {
                issues.push(PlacementIssue::TooCloseToClass {
                    title: title.clone(),
                    class: class.title().to_string(),
                });
            }

            if suggestion.description().is_none_or(|d| d.trim().is_empty()) {
                issues.push(PlacementIssue::EmptyRationale { title });
            }
        }

        issues
    }
}
