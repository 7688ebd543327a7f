//! Application state: the external collaborators and the prompt templates.
//!
//! Nothing here is mutable; every request borrows the same collaborators and
//! owns its own intermediate values. `main` builds the real clients from
//! `Settings`; tests hand in fakes through `AppState::from_parts`.

use std::sync::Arc;

use tracing::{info, instrument};

use crate::config::{Prompts, Settings};
use crate::documents::{DocumentSource, HttpDocumentSource};
use crate::error::ModelError;
use crate::gemini::{GeminiClient, TextModel};
use crate::video::{VideoLookup, YouTubeSearch};

#[derive(Clone)]
pub struct AppState {
    pub model: Arc<dyn TextModel>,
    pub videos: Arc<dyn VideoLookup>,
    pub documents: Arc<dyn DocumentSource>,
    pub prompts: Prompts,
}

impl AppState {
    /// Build the real clients from settings.
    #[instrument(level = "info", skip_all)]
    pub fn new(settings: &Settings) -> Result<Self, ModelError> {
        let gemini = GeminiClient::new(
            settings.gemini_api_key.clone(),
            settings.gemini_base_url.clone(),
            settings.gemini_model.clone(),
            settings.generation.sampling,
            settings.model_timeout,
        )?;
        info!(
            target: "course_forge",
            base_url = %gemini.base_url,
            model = %gemini.model,
            temperature = gemini.sampling.temperature,
            max_output_tokens = gemini.sampling.max_output_tokens,
            "Gemini client ready."
        );

        // Downloads and video lookups share one connection pool; the video
        // lookup applies its own per-request timeout.
        let http = reqwest::Client::builder()
            .timeout(settings.model_timeout)
            .build()
            .map_err(|e| ModelError::Transport(e.to_string()))?;

        Ok(Self::from_parts(
            Arc::new(gemini),
            Arc::new(YouTubeSearch::new(http.clone(), settings.youtube_api_key.clone(), settings.video_timeout)),
            Arc::new(HttpDocumentSource::new(http)),
            settings.generation.prompts.clone(),
        ))
    }

    pub fn from_parts(
        model: Arc<dyn TextModel>,
        videos: Arc<dyn VideoLookup>,
        documents: Arc<dyn DocumentSource>,
        prompts: Prompts,
    ) -> Self {
        Self { model, videos, documents, prompts }
    }
}
