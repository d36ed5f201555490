pub mod health;
pub mod session;

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use schedulr_core::SchedulrError;
use serde::Serialize;

/// Standard API error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Convert anyhow errors to HTTP responses
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        match self.0.downcast_ref::<SchedulrError>() {
            Some(SchedulrError::InvalidTransition { .. }) => StatusCode::CONFLICT,
            Some(SchedulrError::EventNotFound(_)) => StatusCode::NOT_FOUND,
            Some(SchedulrError::IcsParse(_)) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(ErrorResponse {
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
