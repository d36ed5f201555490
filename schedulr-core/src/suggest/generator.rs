use async_trait::async_trait;
use serde_json::Value;

use crate::error::GenerationError;

/// What is sent to a text-generation service.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    /// JSON schema the answer must follow
    pub schema: Value,
}

/// A service that turns a prompt into response text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Human-readable name, used in logs
    fn name(&self) -> &str;

    /// Return the raw text of the answer.
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}
