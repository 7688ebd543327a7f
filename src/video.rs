//! External video lookup (YouTube Data API search).
//!
//! Lookups never fail the caller: every failure degrades to a sentinel link.

use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use tracing::{instrument, warn};

const SEARCH_URL: &str = "https://www.googleapis.com/youtube/v3/search";

pub const NOT_FOUND: &str = "No relevant video found.";
pub const TIMED_OUT: &str = "YouTube fetch timeout.";
pub const FAILED: &str = "Error fetching video.";

/// Result of a lookup. Serialises as the URL or the matching sentinel string.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum VideoLink {
  Found(String),
  NotFound,
  TimedOut,
  Failed,
}

impl VideoLink {
  pub fn as_str(&self) -> &str {
    match self {
      VideoLink::Found(url) => url,
      VideoLink::NotFound => NOT_FOUND,
      VideoLink::TimedOut => TIMED_OUT,
      VideoLink::Failed => FAILED,
    }
  }
}

impl Serialize for VideoLink {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(self.as_str())
  }
}

#[async_trait]
pub trait VideoLookup: Send + Sync {
  async fn find(&self, query: &str) -> VideoLink;
}

pub struct YouTubeSearch {
  client: reqwest::Client,
  api_key: SecretString,
  timeout: Duration,
}

impl YouTubeSearch {
  pub fn new(client: reqwest::Client, api_key: SecretString, timeout: Duration) -> Self {
    Self { client, api_key, timeout }
  }
}

#[async_trait]
impl VideoLookup for YouTubeSearch {
  #[instrument(level = "info", skip(self))]
  async fn find(&self, query: &str) -> VideoLink {
    let res = self.client.get(SEARCH_URL)
      .query(&[
        ("part", "snippet"),
        ("maxResults", "1"),
        ("type", "video"),
        ("q", query),
        ("key", self.api_key.expose_secret()),
      ])
      .timeout(self.timeout)
      .send().await
      .and_then(|r| r.error_for_status());

    let res = match res {
      Ok(r) => r,
      Err(e) => return link_for_error(e),
    };

    match res.json::<SearchResponse>().await {
      Ok(body) => first_video_link(body),
      Err(e) => link_for_error(e),
    }
  }
}

fn link_for_error(e: reqwest::Error) -> VideoLink {
  if e.is_timeout() {
    warn!(target: "pipeline", "Video lookup timed out");
    VideoLink::TimedOut
  } else {
    // Strip the URL: it carries the key.
    warn!(target: "pipeline", error = %e.without_url(), "Video lookup failed");
    VideoLink::Failed
  }
}

/// No items is "not found"; a first item without a video id (a channel or
/// playlist hit) is a malformed answer.
fn first_video_link(body: SearchResponse) -> VideoLink {
  match body.items.into_iter().next() {
    None => VideoLink::NotFound,
    Some(SearchItem { id: SearchId { video_id: Some(id) } }) => {
      VideoLink::Found(format!("https://www.youtube.com/watch?v={}", id))
    }
    Some(_) => {
      warn!(target: "pipeline", "First search item has no videoId");
      VideoLink::Failed
    }
  }
}

#[derive(Deserialize)]
struct SearchResponse { #[serde(default)] items: Vec<SearchItem> }
#[derive(Deserialize)]
struct SearchItem { id: SearchId }
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchId { #[serde(default)] video_id: Option<String> }
