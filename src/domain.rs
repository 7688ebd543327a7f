//! Domain models: difficulty/level enums and the course structures assembled
//! from model output. Keys the model adds beyond the ones we read are kept in
//! `extra` and passed back to the caller untouched.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::video::VideoLink;

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
  Easy,
  Medium,
  Hard,
}

impl fmt::Display for Difficulty {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(match self {
      Difficulty::Easy => "easy",
      Difficulty::Medium => "medium",
      Difficulty::Hard => "hard",
    })
  }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum UserLevel {
  Beginner,
  Intermediate,
  Advanced,
}

/// Stage 1 output: course metadata plus ordered unit stubs.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CourseOutline {
  pub units: Vec<UnitStub>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitStub {
  pub unit_title: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub unit_description: Option<String>,
}

/// Stage 3 output: the outline with its stubs replaced by expanded units.
#[derive(Clone, Debug, Serialize)]
pub struct Course<U> {
  #[serde(flatten)]
  pub extra: Map<String, Value>,
  pub units: Vec<U>,
}

impl CourseOutline {
  pub fn assemble<U>(self, units: Vec<U>) -> Course<U> {
    Course { extra: self.extra, units }
  }
}

/// Objectives/topics expansion of a stub, as returned by the model.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitDetail {
  pub unit_title: String,
  pub learning_objectives: Vec<String>,
  pub topics_covered: Vec<String>,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// A unit of the content pipeline: detail + long-form content + video.
#[derive(Clone, Debug, Serialize)]
pub struct ContentUnit {
  #[serde(flatten)]
  pub detail: UnitDetail,
  #[serde(rename = "detailedContent")]
  pub detailed_content: Value,
  pub youtube_video_url: VideoLink,
}

/// Minimal unit heading used by the MCQ pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UnitHeading {
  pub unit_title: String,
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// A unit of the MCQ pipeline: heading + question sets.
#[derive(Clone, Debug, Serialize)]
pub struct McqUnit {
  #[serde(flatten)]
  pub heading: UnitHeading,
  pub assessment: Value,
}
