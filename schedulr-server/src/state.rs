use std::sync::Arc;

use anyhow::Result;
use schedulr_core::suggest::TextGenerator;
use schedulr_core::{GeminiClient, GenerationError, Planner, SchedulrConfig, Session};
use tokio::sync::Mutex;
use tracing::warn;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The one session this server holds
    pub session: Arc<Mutex<Session>>,
    pub planner: Arc<Planner>,
}

impl AppState {
    pub fn new(config: &SchedulrConfig) -> Result<Self> {
        let generator: Option<Arc<dyn TextGenerator>> = match GeminiClient::from_config(config) {
            Ok(client) => Some(Arc::new(client)),
            Err(GenerationError::MissingApiKey) => {
                warn!("GEMINI_API_KEY is not set, study suggestions are disabled");
                None
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Self::with_planner(Planner::new(generator, config.ingest_options()?)))
    }

    pub fn with_planner(planner: Planner) -> Self {
        AppState {
            session: Arc::new(Mutex::new(Session::new())),
            planner: Arc::new(planner),
        }
    }
}
