//! Prompt text and response schema sent to the text-generation service.

use serde::Serialize;
use serde_json::{Value, json};

use crate::event::CalendarEvent;
use crate::suggest::rules::PlacementRules;
use crate::week::{DAY_NAMES, WeekWindow};

/// A class as listed in the prompt.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PromptClass<'a> {
    title: &'a str,
    day: &'static str,
    start_time: String,
    end_time: String,
}

impl<'a> From<&'a CalendarEvent> for PromptClass<'a> {
    fn from(event: &'a CalendarEvent) -> Self {
        let weekday = chrono::Datelike::weekday(&event.start()).num_days_from_sunday() as usize;
        PromptClass {
            title: event.title(),
            day: DAY_NAMES[weekday % 7],
            start_time: event.start().format("%H:%M").to_string(),
            end_time: event.end().format("%H:%M").to_string(),
        }
    }
}

/// Compose the natural-language request for study blocks.
pub fn build_prompt(classes: &[CalendarEvent], week: &WeekWindow, rules: &PlacementRules) -> String {
    let listed: Vec<PromptClass> = classes.iter().map(PromptClass::from).collect();
    let schedule = serde_json::to_string(&listed).unwrap_or_else(|_| "[]".to_string());

    format!(
        "Analyze the following weekly class schedule, which runs from {from} to {to}.
Your task is to suggest {min_count} to {max_count} optimal study blocks.

RULES:
1. Place suggestions in the empty gaps between classes.
2. All study blocks must be between {min_minutes} minutes and {max_minutes} minutes long.
3. Schedule study blocks only between {day_start_12} ({day_start}) and {day_end_12} ({day_end}).
4. Ensure there is at least a {buffer}-minute break before and after any scheduled class. Do not suggest back-to-back sessions.
5. The title for each suggestion should be specific, like \"Review for [Class Name]\" or \"Work on [Class Name] Assignment\".
6. The description MUST provide a clear, concise reason for the study session. It cannot be empty.

Class Schedule:
{schedule}
",
        from = week.start_date().format("%-m/%-d/%Y"),
        to = week.end_date().format("%-m/%-d/%Y"),
        min_count = rules.min_count,
        max_count = rules.max_count,
        min_minutes = rules.min_duration.num_minutes(),
        max_minutes = rules.max_duration.num_minutes(),
        day_start_12 = rules.day_start.format("%-I:%M %p"),
        day_start = rules.day_start.format("%H:%M"),
        day_end_12 = rules.day_end.format("%-I:%M %p"),
        day_end = rules.day_end.format("%H:%M"),
        buffer = rules.buffer.num_minutes(),
    )
}

/// JSON schema the service must shape its answer to, in Gemini's dialect.
pub fn response_schema() -> Value {
    json!({
        "type": "OBJECT",
        "properties": {
            "study_suggestions": {
                "type": "ARRAY",
                "description": "A list of suggested study sessions.",
                "items": {
                    "type": "OBJECT",
                    "properties": {
                        "title": {
                            "type": "STRING",
                            "description": "A concise title for the study session, e.g., 'Study for Math'."
                        },
                        "day_of_week": {
                            "type": "STRING",
                            "description": "The day of the week for the study session (e.g., 'Monday', 'Tuesday')."
                        },
                        "start_time": {
                            "type": "STRING",
                            "description": "The start time in 24-hour HH:mm format (e.g., '14:00')."
                        },
                        "end_time": {
                            "type": "STRING",
                            "description": "The end time in 24-hour HH:mm format (e.g., '15:30')."
                        },
                        "description": {
                            "type": "STRING",
                            "description": "A brief reason or focus for this study session. Must not be empty."
                        }
                    },
                    "required": ["title", "day_of_week", "start_time", "end_time", "description"]
                }
            }
        },
        "required": ["study_suggestions"]
    })
}
