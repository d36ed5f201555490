//! Drives a session through upload, parse and suggestion generation.

use std::sync::Arc;

use tracing::{info, warn};

use crate::error::SchedulrResult;
use crate::event::CalendarEvent;
use crate::ingest::{IngestOptions, parse_schedule};
use crate::session::{Action, Failure, Session, Status};
use crate::suggest::{PlacementIssue, PlacementRules, TextGenerator, generate_suggestions};

pub struct Planner {
    /// No suggestions are requested without a generator
    generator: Option<Arc<dyn TextGenerator>>,
    options: IngestOptions,
    rules: PlacementRules,
}

impl Planner {
    pub fn new(generator: Option<Arc<dyn TextGenerator>>, options: IngestOptions) -> Self {
        Planner {
            generator,
            options,
            rules: PlacementRules::default(),
        }
    }

    pub fn with_rules(mut self, rules: PlacementRules) -> Self {
        self.rules = rules;
        self
    }

    pub fn options(&self) -> &IngestOptions {
        &self.options
    }

    pub fn rules(&self) -> &PlacementRules {
        &self.rules
    }

    /// Parse calendar text into the action that reports the outcome.
    pub fn parse_step(&self, content: &str) -> Action {
        match parse_schedule(content, &self.options) {
            Ok(events) => Action::Parsed(events),
            Err(e) => {
                warn!("Calendar parsing failed: {}", e);
                Action::Failed(Failure::Parse(e.to_string()))
            }
        }
    }

    /// Request suggestions for `classes` and report the outcome as an action.
    pub async fn generate_step(&self, classes: &[CalendarEvent]) -> Action {
        let Some(generator) = &self.generator else {
            info!("No text generator configured, skipping study suggestions");
            return Action::SuggestionsReady(Vec::new());
        };

        match generate_suggestions(generator.as_ref(), classes, &self.rules).await {
            Ok(suggestions) => {
                for issue in self.rules.audit(classes, &suggestions) {
                    warn!("Study suggestion does not follow the placement rules: {}", issue);
                }
                Action::SuggestionsReady(suggestions)
            }
            Err(e) => {
                warn!("Study suggestion generation failed: {}", e);
                Action::Failed(Failure::Generation(e.to_string()))
            }
        }
    }

    /// Findings of the placement audit for what the session holds.
    pub fn audit(&self, session: &Session) -> Vec<PlacementIssue> {
        if session.status() != Status::Displaying || session.suggestions().is_empty() {
            return Vec::new();
        }
        self.rules.audit(session.classes(), session.suggestions())
    }

    /// Run upload → parse → generate on `session`, reporting every status
    /// it passes through to `on_status`.
    ///
    /// Parse and generation failures end in the `error` status and are not
    /// returned as errors. An upload the session refuses is.
    pub async fn process(
        &self,
        session: &mut Session,
        content: &str,
        mut on_status: impl FnMut(Status),
    ) -> SchedulrResult<()> {
        session.apply(Action::Upload)?;
        on_status(session.status());

        session.apply(self.parse_step(content))?;
        on_status(session.status());

        if session.status() != Status::Generating {
            return Ok(());
        }

        let outcome = self.generate_step(session.classes()).await;
        session.apply(outcome)?;
        on_status(session.status());

        Ok(())
    }
}
