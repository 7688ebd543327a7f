//! Structured generation: prompt → model → fence stripping → JSON.
//!
//! Model text is free-form, so every JSON-expecting call goes through the same
//! `normalize_response` table and a tagged parse step instead of trusting the
//! completion verbatim.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::{AppError, AppResult};
use crate::gemini::TextModel;
use crate::util::trunc_for_log;

/// Recognised (opener, closer) pairs. Each side is checked independently and
/// removed at most once, in table order.
pub const FENCE_MARKERS: &[(&str, &str)] = &[("```json", "```"), ("'''", "'''")];

/// Strip surrounding whitespace and code-fence / triple-quote markers.
/// Already-clean JSON comes back unchanged.
pub fn normalize_response(text: &str) -> String {
  let mut s = text.trim();
  for (opener, closer) in FENCE_MARKERS {
    if let Some(rest) = s.strip_prefix(opener) {
      s = rest;
    }
    if let Some(rest) = s.strip_suffix(closer) {
      s = rest;
    }
  }
  s.trim().to_string()
}

/// Outcome of reading normalized model text as a typed value.
#[derive(Debug)]
pub enum ParseOutcome<T> {
  Parsed(T),
  ParseFailed { raw: String, reason: String },
}

impl<T> ParseOutcome<T> {
  pub fn into_result(self) -> AppResult<T> {
    match self {
      ParseOutcome::Parsed(v) => Ok(v),
      ParseOutcome::ParseFailed { raw, reason } => Err(AppError::ResponseFormat { raw, reason }),
    }
  }
}

/// Normalize then deserialize. Shape mismatches count as parse failures.
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> ParseOutcome<T> {
  let cleaned = normalize_response(text);
  match serde_json::from_str::<T>(&cleaned) {
    Ok(v) => ParseOutcome::Parsed(v),
    Err(e) => ParseOutcome::ParseFailed { raw: text.to_string(), reason: e.to_string() },
  }
}

/// Re-wrap a recommendation list in array brackets.
///
/// Any run of `[`/`]` at either end is stripped first, so a bare object list
/// and an already-bracketed list both end up as one array. Nested arrays that
/// touch the ends lose their brackets too; see the tests.
pub fn wrap_as_array(normalized: &str) -> String {
  let inner = normalized.trim().trim_matches(|c| c == '[' || c == ']');
  format!("[{}]", inner)
}

/// One Structured Generation Call: invoke the model, then normalize and parse.
#[instrument(level = "info", skip(model, prompt), fields(prompt_len = prompt.len()))]
pub async fn generate_structured<T: DeserializeOwned>(model: &dyn TextModel, prompt: &str) -> AppResult<T> {
  let text = model.generate(prompt).await?;
  debug!(target: "pipeline", response = %trunc_for_log(&text, 300), "Model response received");
  parse_structured::<T>(&text).into_result()
}

/// Free-form JSON variant used where the shape is not fixed.
pub async fn generate_value(model: &dyn TextModel, prompt: &str) -> AppResult<Value> {
  generate_structured::<Value>(model, prompt).await
}
