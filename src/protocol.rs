//! Public request/response structs for the HTTP endpoints (serde ready),
//! plus the validating JSON extractor.

use axum::{
  async_trait,
  extract::{FromRequest, Request},
  Json,
};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::Value;
use validator::Validate;

use crate::domain::Difficulty;
use crate::error::AppError;

/// `Json<T>` that also runs `Validate`; both failure kinds become `AppError::Validation`.
#[derive(Debug)]
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
  T: DeserializeOwned + Validate,
  S: Send + Sync,
{
  type Rejection = AppError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let Json(value) = Json::<T>::from_request(req, state)
      .await
      .map_err(|rejection| AppError::Validation(rejection.body_text()))?;
    value.validate()?;
    Ok(ValidatedJson(value))
  }
}

#[derive(Debug, Deserialize, Validate)]
pub struct FileRequest {
  #[validate(length(min = 1))]
  pub file_url: String,
}
#[derive(Debug, Serialize)]
pub struct ClassificationOut {
  pub filename: String,
  pub domain: Value,
  pub subdomain: Value,
  pub explanation: Value,
}

#[derive(Debug, Deserialize, Validate)]
pub struct RecommendationRequest {
  pub student_level: String,
  pub course: String,
}
#[derive(Debug, Serialize)]
pub struct RecommendationsOut {
  pub recommendations: Vec<Value>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct DoubtRequest {
  pub ques: String,
}
#[derive(Debug, Serialize)]
pub struct DoubtOut {
  pub answer: String,
}

/// Shared by `/generate-course` and `/generate-question`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CourseRequest {
  pub subject: String,
  pub difficulty: Difficulty,
  pub focus_area: String,
  #[validate(range(min = 1, max = 10))]
  pub units: u8,
}

#[derive(Debug, Deserialize, Validate)]
pub struct QuizResult {
  #[validate(range(min = 0.0, max = 9.0))]
  pub score: f64,
  #[validate(range(exclusive_min = 0.0))]
  pub time_taken: f64,
}

#[derive(Serialize)]
pub struct HealthOut {
  pub ok: bool,
}
