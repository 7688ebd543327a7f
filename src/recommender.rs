//! Course recommendations and the doubt chatbot: single-call endpoints.

use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::structured::{normalize_response, wrap_as_array};
use crate::util::{fill_template, trunc_for_log};

/// Ask for four recommendations. The model often drops the outer array, so the
/// normalized text is re-wrapped before parsing.
#[instrument(level = "info", skip(state))]
pub async fn recommend_courses(state: &AppState, student_level: &str, course: &str) -> AppResult<Vec<Value>> {
  let prompt = fill_template(
    &state.prompts.recommend_template,
    &[("student_level", student_level), ("course", course)],
  );
  let text = state.model.generate(&prompt).await?;
  debug!(target: "pipeline", response = %trunc_for_log(&text, 300), "Recommendation response received");
  parse_recommendations(&text)
}

pub fn parse_recommendations(text: &str) -> AppResult<Vec<Value>> {
  let wrapped = wrap_as_array(&normalize_response(text));
  serde_json::from_str::<Vec<Value>>(&wrapped).map_err(|e| AppError::RecommendationParse(e.to_string()))
}

/// Free-text answer; the completion is returned as-is.
#[instrument(level = "info", skip(state, question), fields(question_len = question.len()))]
pub async fn answer_doubt(state: &AppState, question: &str) -> AppResult<String> {
  let prompt = fill_template(&state.prompts.chatbot_template, &[("question", question)]);
  Ok(state.model.generate(&prompt).await?)
}
