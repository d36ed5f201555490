//! Error types for schedulr.

use thiserror::Error;

use crate::session::Status;

/// Errors that can occur in schedulr operations.
#[derive(Error, Debug)]
pub enum SchedulrError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("ICS parse error: {0}")]
    IcsParse(String),

    #[error(transparent)]
    Generation(#[from] GenerationError),

    #[error("Cannot apply '{action}' while {status}")]
    InvalidTransition { status: Status, action: &'static str },

    #[error("Event not found: {0}")]
    EventNotFound(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Failures of the study-suggestion step.
///
/// Any of these ends the current attempt; individual malformed suggestions
/// are skipped instead and never surface here.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("The AI returned an empty response")]
    EmptyResponse,

    #[error("Failed to parse study suggestions from the AI response: {0}")]
    MalformedResponse(String),

    #[error("Request to the AI service failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("AI service responded with {status}: {body}")]
    Api { status: u16, body: String },

    #[error("GEMINI_API_KEY is not set")]
    MissingApiKey,
}

/// Result type alias for schedulr operations.
pub type SchedulrResult<T> = Result<T, SchedulrError>;
