//! Study-block suggestions from a text-generation service.

mod decode;
mod generator;
mod prompt;
mod rules;

pub use decode::{decode_suggestions, parse_time};
pub use generator::{GenerationRequest, TextGenerator};
pub use prompt::{build_prompt, response_schema};
pub use rules::{PlacementIssue, PlacementRules};

use tracing::{debug, info};

use crate::error::GenerationError;
use crate::event::CalendarEvent;
use crate::week::WeekWindow;

/// Build the request for a week of classes.
///
/// Returns `None` when there are no classes to plan around.
pub fn suggestion_request(classes: &[CalendarEvent], rules: &PlacementRules) -> Option<(WeekWindow, GenerationRequest)> {
    let first = classes.first()?;
    let week = WeekWindow::containing(first.start());
    let request = GenerationRequest {
        prompt: build_prompt(classes, &week, rules),
        schema: response_schema(),
    };
    Some((week, request))
}

/// Ask `generator` for study blocks around `classes` (sorted by start).
///
/// An empty class list returns no suggestions without calling the service.
pub async fn generate_suggestions(
    generator: &dyn TextGenerator,
    classes: &[CalendarEvent],
    rules: &PlacementRules,
) -> Result<Vec<CalendarEvent>, GenerationError> {
    let Some((week, request)) = suggestion_request(classes, rules) else {
        return Ok(Vec::new());
    };

    debug!(
        "Sending {} byte prompt to {}",
        request.prompt.len(),
        generator.name()
    );
    let text = generator.generate(&request).await?;
    debug!("Received {} byte response", text.len());

    let suggestions = decode_suggestions(&text, &week)?;
    info!("Decoded {} study suggestions", suggestions.len());
    Ok(suggestions)
}
