//! HTTP endpoint handlers. These are thin wrappers that forward to core logic.
//! Each handler is instrumented and logs its parameters and basic result info.

use std::sync::Arc;

use axum::{extract::State, response::IntoResponse, Json};
use tracing::{info, instrument};

use crate::classifier::classify_document;
use crate::course::generate_course;
use crate::error::AppResult;
use crate::level::predict_user_level;
use crate::mcq::generate_questions;
use crate::protocol::*;
use crate::recommender::{answer_doubt, recommend_courses};
use crate::state::AppState;

#[instrument(level = "info")]
pub async fn http_health() -> impl IntoResponse {
  Json(HealthOut { ok: true })
}

#[instrument(level = "info", skip(state, body), fields(file_url = %body.file_url))]
pub async fn http_detect_domain(
  State(state): State<Arc<AppState>>,
  ValidatedJson(body): ValidatedJson<FileRequest>,
) -> AppResult<impl IntoResponse> {
  let out = classify_document(&state, &body.file_url).await?;
  info!(target: "course_forge", filename = %out.filename, domain = %out.domain, "Document classified");
  Ok(Json(out))
}

#[instrument(level = "info", skip(state, body), fields(student_level = %body.student_level, course = %body.course))]
pub async fn http_course_recommendation(
  State(state): State<Arc<AppState>>,
  ValidatedJson(body): ValidatedJson<RecommendationRequest>,
) -> AppResult<impl IntoResponse> {
  let recommendations = recommend_courses(&state, &body.student_level, &body.course).await?;
  info!(target: "course_forge", count = recommendations.len(), "Recommendations served");
  Ok(Json(RecommendationsOut { recommendations }))
}

#[instrument(level = "info", skip(state, body), fields(question_len = body.ques.len()))]
pub async fn http_doubt_chatbot(
  State(state): State<Arc<AppState>>,
  ValidatedJson(body): ValidatedJson<DoubtRequest>,
) -> AppResult<impl IntoResponse> {
  let answer = answer_doubt(&state, &body.ques).await?;
  Ok(Json(DoubtOut { answer }))
}

#[instrument(level = "info", skip(state, body), fields(subject = %body.subject, difficulty = %body.difficulty, units = body.units))]
pub async fn http_generate_course(
  State(state): State<Arc<AppState>>,
  ValidatedJson(body): ValidatedJson<CourseRequest>,
) -> AppResult<impl IntoResponse> {
  let course = generate_course(&state, &body).await?;
  info!(target: "course_forge", units = course.units.len(), "Course generated");
  Ok(Json(course))
}

#[instrument(level = "info", skip(state, body), fields(subject = %body.subject, difficulty = %body.difficulty, units = body.units))]
pub async fn http_generate_question(
  State(state): State<Arc<AppState>>,
  ValidatedJson(body): ValidatedJson<CourseRequest>,
) -> AppResult<impl IntoResponse> {
  let course = generate_questions(&state, &body).await?;
  info!(target: "course_forge", units = course.units.len(), "Question set generated");
  Ok(Json(course))
}

#[instrument(level = "info", skip(body), fields(score = body.score, time_taken = body.time_taken))]
pub async fn http_predict_level(ValidatedJson(body): ValidatedJson<QuizResult>) -> impl IntoResponse {
  let level = predict_user_level(body.score, body.time_taken);
  info!(target: "course_forge", ?level, "Level predicted");
  Json(level)
}
