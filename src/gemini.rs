//! Minimal Gemini client for our use-cases.
//!
//! We only call `generateContent` with a single user prompt and read back plain text.
//! Calls are instrumented and log the model name, latency and token usage (not contents).
//!
//! NOTE: We never log the API key; it travels in a header, not the URL.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use reqwest::header::{CONTENT_TYPE, USER_AGENT};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::config::Sampling;
use crate::error::ModelError;

/// The text-generation collaborator: prompt in, completion text out.
#[async_trait]
pub trait TextModel: Send + Sync {
  async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

#[derive(Clone)]
pub struct GeminiClient {
  client: reqwest::Client,
  api_key: SecretString,
  pub base_url: String,
  pub model: String,
  pub sampling: Sampling,
}

impl GeminiClient {
  pub fn new(
    api_key: SecretString,
    base_url: String,
    model: String,
    sampling: Sampling,
    timeout: Duration,
  ) -> Result<Self, ModelError> {
    let client = reqwest::Client::builder()
      .timeout(timeout)
      .build()
      .map_err(|e| ModelError::Transport(e.to_string()))?;
    Ok(Self { client, api_key, base_url, model, sampling })
  }

  fn request_body<'a>(&self, prompt: &'a str) -> GenerateContentRequest<'a> {
    GenerateContentRequest {
      contents: vec![Content { role: "user", parts: vec![PartReq { text: prompt }] }],
      generation_config: GenerationConfigReq {
        temperature: self.sampling.temperature,
        top_p: self.sampling.top_p,
        top_k: self.sampling.top_k,
        max_output_tokens: self.sampling.max_output_tokens,
      },
    }
  }
}

#[async_trait]
impl TextModel for GeminiClient {
  #[instrument(level = "info", skip(self, prompt), fields(model = %self.model, prompt_len = prompt.len()))]
  async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
    let url = format!("{}/models/{}:generateContent", self.base_url, self.model);
    let start = Instant::now();

    let res = self.client.post(&url)
      .header(USER_AGENT, "course-forge/0.1")
      .header(CONTENT_TYPE, "application/json")
      .header("x-goog-api-key", self.api_key.expose_secret())
      .json(&self.request_body(prompt))
      .send().await
      .map_err(|e| ModelError::Transport(e.to_string()))?;

    if !res.status().is_success() {
      let status = res.status().as_u16();
      let body = res.text().await.unwrap_or_default();
      let message = extract_gemini_error(&body).unwrap_or(body);
      return Err(ModelError::Http { status, message });
    }

    let body: GenerateContentResponse = res.json().await.map_err(|e| ModelError::Transport(e.to_string()))?;
    if let Some(usage) = &body.usage_metadata {
      info!(
        prompt_tokens = ?usage.prompt_token_count,
        completion_tokens = ?usage.candidates_token_count,
        total_tokens = ?usage.total_token_count,
        elapsed = ?start.elapsed(),
        "Gemini usage"
      );
    }
    candidate_text(body).ok_or(ModelError::Empty)
  }
}

/// Concatenated text parts of the first candidate, if it carries any text.
fn candidate_text(body: GenerateContentResponse) -> Option<String> {
  let candidate = body.candidates.into_iter().next()?;
  let text: String = candidate.content?.parts.into_iter().filter_map(|p| p.text).collect();
  if text.is_empty() { None } else { Some(text) }
}

// --- generateContent DTOs ---

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
  contents: Vec<Content<'a>>,
  generation_config: GenerationConfigReq,
}
#[derive(Serialize)]
struct Content<'a> { role: &'static str, parts: Vec<PartReq<'a>> }
#[derive(Serialize)]
struct PartReq<'a> { text: &'a str }
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfigReq {
  temperature: f32,
  top_p: f32,
  top_k: u32,
  max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
  #[serde(default)] candidates: Vec<Candidate>,
  #[serde(default)] usage_metadata: Option<UsageMetadata>,
}
#[derive(Deserialize)]
struct Candidate { #[serde(default)] content: Option<CandidateContent> }
#[derive(Deserialize)]
struct CandidateContent { #[serde(default)] parts: Vec<PartResp> }
#[derive(Deserialize)]
struct PartResp { #[serde(default)] text: Option<String> }
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
  #[serde(default)] prompt_token_count: Option<u32>,
  #[serde(default)] candidates_token_count: Option<u32>,
  #[serde(default)] total_token_count: Option<u32>,
}

/// Try to extract a clean error message from a Gemini error body.
fn extract_gemini_error(body: &str) -> Option<String> {
  #[derive(Deserialize)]
  struct EWrap { error: EObj }
  #[derive(Deserialize)]
  struct EObj { message: String }
  serde_json::from_str::<EWrap>(body).ok().map(|w| w.error.message)
}
