//! Error taxonomy shared by every endpoint, and its two-tier HTTP mapping.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
  #[error("Validation error: {0}")]
  Validation(String),

  #[error("Failed to download file: {0}")]
  Download(String),

  #[error("Unsupported file type: {0}")]
  UnsupportedType(String),

  #[error("Extracted content is empty.")]
  EmptyContent,

  #[error("Failed to extract text: {0}")]
  Extraction(String),

  /// Model text that could not be read as the expected JSON shape.
  #[error("Model response is not in valid JSON format: {reason}")]
  ResponseFormat { raw: String, reason: String },

  #[error("Failed to parse recommendations: {0}")]
  RecommendationParse(String),

  #[error("Failed to generate any unit details")]
  NoUnitsGenerated,

  #[error("Model call failed: {0}")]
  Model(#[from] ModelError),

  #[error("Internal server error: {0}")]
  Internal(String),
}

/// Failures of the text-generation collaborator itself.
#[derive(Debug, Error)]
pub enum ModelError {
  #[error("transport error: {0}")]
  Transport(String),

  #[error("HTTP {status}: {message}")]
  Http { status: u16, message: String },

  #[error("model returned no text")]
  Empty,
}

impl AppError {
  pub fn status_code(&self) -> StatusCode {
    match self {
      AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
      AppError::Download(_)
      | AppError::UnsupportedType(_)
      | AppError::EmptyContent
      | AppError::Extraction(_) => StatusCode::BAD_REQUEST,
      AppError::ResponseFormat { .. }
      | AppError::RecommendationParse(_)
      | AppError::NoUnitsGenerated
      | AppError::Model(_)
      | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
  pub detail: String,
}

impl IntoResponse for AppError {
  fn into_response(self) -> Response {
    let status = self.status_code();
    if status.is_server_error() {
      match &self {
        AppError::ResponseFormat { raw, .. } => {
          error!(target: "course_forge", error = %self, raw = %crate::util::trunc_for_log(raw, 400), "Request failed");
        }
        _ => error!(target: "course_forge", error = %self, "Request failed"),
      }
    }
    (status, Json(ErrorResponse { detail: self.to_string() })).into_response()
  }
}

impl From<validator::ValidationErrors> for AppError {
  fn from(err: validator::ValidationErrors) -> Self {
    AppError::Validation(err.to_string())
  }
}

pub type AppResult<T> = Result<T, AppError>;

/// Catch-all for a panicking handler: answered like any other server-side failure.
pub fn panic_response(panic: Box<dyn std::any::Any + Send + 'static>) -> Response {
  let message = if let Some(s) = panic.downcast_ref::<String>() {
    s.clone()
  } else if let Some(s) = panic.downcast_ref::<&str>() {
    s.to_string()
  } else {
    "handler panicked".to_string()
  };
  AppError::Internal(message).into_response()
}
