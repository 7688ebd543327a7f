//! Course Forge · LLM-backed course tooling backend
//!
//! - Axum HTTP API (classification, recommendations, course + MCQ generation, level prediction)
//! - Gemini text generation, YouTube video lookup
//!
//! Important env variables:
//!   PORT                   : u16 (default 8000)
//!   GOOGLE_GEMINI_KEY      : required
//!   YOUTUBE_API_KEY        : required
//!   GEMINI_BASE_URL        : default "https://generativelanguage.googleapis.com/v1beta"
//!   GEMINI_MODEL           : default "gemini-1.5-flash"
//!   MODEL_TIMEOUT_SECS     : default 120
//!   VIDEO_TIMEOUT_SECS     : default 10
//!   GENERATION_CONFIG_PATH : path to TOML config (sampling + prompt templates)
//!   LOG_LEVEL              : tracing filter, e.g. "debug" or full directives
//!   LOG_FORMAT             : "pretty" (default) or "json"

mod classifier;
mod config;
mod course;
mod documents;
mod domain;
mod error;
mod gemini;
mod level;
mod mcq;
mod protocol;
mod recommender;
mod routes;
mod state;
mod structured;
mod telemetry;
#[cfg(test)]
mod test_utils;
mod util;
mod video;

use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::config::Settings;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
  // A missing .env is fine; the environment may already be populated.
  let _ = dotenvy::dotenv();
  telemetry::init_tracing();

  let settings = Settings::from_env().map_err(|e| {
    error!(target: "course_forge", error = %e, "Invalid configuration");
    e
  })?;

  // Collaborators are built once here and shared read-only by every request.
  let state = Arc::new(AppState::new(&settings)?);
  let app = build_router(state);

  let addr = SocketAddr::from(([0, 0, 0, 0], settings.port));
  let listener = TcpListener::bind(addr).await?;
  info!(target: "course_forge", %addr, "HTTP server listening");
  axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;
  info!(target: "course_forge", "HTTP server stopped");
  Ok(())
}

async fn shutdown_signal() {
  let ctrl_c = async {
    if let Err(e) = tokio::signal::ctrl_c().await {
      error!(target: "course_forge", error = %e, "Failed to listen for Ctrl-C");
      std::future::pending::<()>().await;
    }
  };

  #[cfg(unix)]
  let terminate = async {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
      Ok(mut sig) => { sig.recv().await; }
      Err(e) => {
        error!(target: "course_forge", error = %e, "Failed to listen for SIGTERM");
        std::future::pending::<()>().await;
      }
    }
  };

  #[cfg(not(unix))]
  let terminate = std::future::pending::<()>();

  tokio::select! {
    _ = ctrl_c => {},
    _ = terminate => {},
  }
  info!(target: "course_forge", "Shutdown signal received");
}
