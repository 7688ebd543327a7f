//! Process configuration: credentials and endpoints from the environment,
//! sampling + prompt templates from an optional TOML file.
//!
//! TOML schema (every key optional):
//!
//! ```toml
//! [sampling]
//! temperature = 0.3
//! top_p = 0.95
//! top_k = 64
//! max_output_tokens = 8192
//!
//! [prompts]
//! chatbot_template = "You are a doubt chatbot ... {question}"
//! ```

use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use thiserror::Error;
use tracing::{error, info};

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("missing required environment variable {0}")]
  Missing(&'static str),
}

/// Everything read once at startup.
#[derive(Clone, Debug)]
pub struct Settings {
  pub gemini_api_key: SecretString,
  pub youtube_api_key: SecretString,
  pub gemini_base_url: String,
  pub gemini_model: String,
  pub model_timeout: Duration,
  pub video_timeout: Duration,
  pub port: u16,
  pub generation: GenerationConfig,
}

impl Settings {
  pub fn from_env() -> Result<Self, ConfigError> {
    let gemini_api_key = required("GOOGLE_GEMINI_KEY")?;
    let youtube_api_key = required("YOUTUBE_API_KEY")?;
    let gemini_base_url = std::env::var("GEMINI_BASE_URL")
      .unwrap_or_else(|_| "https://generativelanguage.googleapis.com/v1beta".into());
    let gemini_model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-1.5-flash".into());

    Ok(Self {
      gemini_api_key,
      youtube_api_key,
      gemini_base_url,
      gemini_model,
      model_timeout: Duration::from_secs(env_parse("MODEL_TIMEOUT_SECS", 120)),
      video_timeout: Duration::from_secs(env_parse("VIDEO_TIMEOUT_SECS", 10)),
      port: env_parse("PORT", 8000),
      generation: load_generation_config_from_env().unwrap_or_default(),
    })
  }
}

fn required(key: &'static str) -> Result<SecretString, ConfigError> {
  match std::env::var(key) {
    Ok(v) if !v.trim().is_empty() => Ok(SecretString::from(v)),
    _ => Err(ConfigError::Missing(key)),
  }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
  std::env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Contents of the optional runtime configuration file.
#[derive(Clone, Debug, Deserialize, Default)]
pub struct GenerationConfig {
  #[serde(default)]
  pub sampling: Sampling,
  #[serde(default)]
  pub prompts: Prompts,
}

/// Fixed sampling configuration sent with every model call.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct Sampling {
  pub temperature: f32,
  pub top_p: f32,
  pub top_k: u32,
  pub max_output_tokens: u32,
}

impl Default for Sampling {
  fn default() -> Self {
    Self { temperature: 0.3, top_p: 0.95, top_k: 64, max_output_tokens: 8192 }
  }
}

/// Prompt templates. `{name}` placeholders are filled per request; any
/// template can be overridden individually from TOML.
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Prompts {
  pub classify_template: String,
  pub recommend_template: String,
  pub chatbot_template: String,
  pub outline_template: String,
  pub unit_detail_template: String,
  pub unit_content_template: String,
  pub mcq_unit_template: String,
  pub mcq_template: String,
}

impl Default for Prompts {
  fn default() -> Self {
    Self {
      classify_template: r#"Analyze the following educational content and determine its subject domain (e.g., Mathematics, Physics, Biology, History)
and its subdomain, if any. Briefly explain why you chose that domain and subdomain.
Respond as JSON with exactly three fields: "domain", "subdomain" and "explanation".

Content: {content}"#.into(),

      recommend_template: r#"You are an assistant that recommends educational courses.
Given the student's level and a course of interest, recommend exactly 4 courses.
Each recommendation has: subject, number of units, focus area and difficulty level. Respond in JSON.

Input:
1. Student Level: {student_level}
2. Course: {course}

Output:
    {"subject": "Python", "units": 3, "focus_area": "Python Basics", "difficulty": "Beginner"},
    {"subject": "Data Structures", "units": 3, "focus_area": "Arrays and Linked Lists", "difficulty": "Intermediate"},
    {"subject": "Algorithms", "units": 3, "focus_area": "Sorting and Searching", "difficulty": "Intermediate"},
    {"subject": "Advanced Python", "units": 3, "focus_area": "Python for Data Science", "difficulty": "Advanced"}"#.into(),

      chatbot_template: "You are a doubt-solving assistant for students. Resolve the student's doubt clearly. The question is: {question}".into(),

      outline_template: r#"Generate a comprehensive course structure for {subject} with exactly {units} units.
Focus area: {focus_area}
Difficulty: {difficulty}

Return ONLY unit titles in this JSON format:
{
    "courseTitle": "",
    "difficultyLevel": "",
    "description": "",
    "prerequisites": ["prerequisite 1", "prerequisite 2"],
    "learningOutcomes": ["outcome 1", "outcome 2"],
    "units": [
        {"unitTitle": "", "unitDescription": ""}
    ],
    "overview": "",
    "assessmentMethods": ["method 1", "method 2"]
}"#.into(),

      unit_detail_template: r#"Generate a detailed unit structure for "{unit_title}" in a {subject} course.
Difficulty level: {difficulty}
Focus area: {focus_area}

Return the response in this JSON format:
{
    "unitTitle": "{unit_title}",
    "learningObjectives": ["objective 1", "objective 2"],
    "topicsCovered": ["topic 1", "topic 2"],
    "resources": ["resource 1", "resource 2"],
    "estimatedDuration": "X weeks"
}

Keep it at the stated difficulty and focused on practical applications."#.into(),

      unit_content_template: r#"Generate detailed educational content for the unit "{unit_title}" in {subject}.
Topics to cover: {topics}
Learning objectives: {objectives}
Difficulty level: {difficulty}
Focus area: {focus_area}

Return the response in this JSON format:
{
    "topicContents": [
        {
            "topic": "Topic Name",
            "content": "Detailed explanation and educational content",
            "examples": ["example 1", "example 2"],
            "exercises": ["exercise 1", "exercise 2"]
        }
    ]
}

Keep the content practical and at the stated difficulty. Write at least 6000 words."#.into(),

      mcq_unit_template: r#"Generate a unit structure for "{unit_title}" in a {subject} course.
Difficulty level: {difficulty}
Focus area: {focus_area}

Return the response in this JSON format:
{
    "unitTitle": "{unit_title}"
}"#.into(),

      mcq_template: r#"Generate multiple choice questions for the unit "{unit_title}" in {subject}.
Difficulty level: {difficulty}
Focus area: {focus_area}

Return the response in this JSON format:
{
    "unitAssessment": [
        {
            "topic": "Topic Name",
            "questions": [
                {
                    "questionId": "unique_id",
                    "question": "Question text",
                    "options": ["Option A", "Option B", "Option C", "Option D"],
                    "correctAnswer": "Correct option",
                    "explanation": "Why the correct answer is correct"
                }
            ]
        }
    ]
}

Cover exactly 3 topics with at least 3 questions each, matching the difficulty level."#.into(),
    }
  }
}

/// Attempt to load `GenerationConfig` from GENERATION_CONFIG_PATH. On any parsing/IO error, returns None.
pub fn load_generation_config_from_env() -> Option<GenerationConfig> {
  let path = std::env::var("GENERATION_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match parse_generation_config(&s) {
      Ok(cfg) => {
        info!(target: "course_forge", %path, "Loaded generation config (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "course_forge", %path, error = %e, "Failed to parse TOML config");
        None
      }
    },
    Err(e) => {
      error!(target: "course_forge", %path, error = %e, "Failed to read TOML config file");
      None
    }
  }
}

pub fn parse_generation_config(s: &str) -> Result<GenerationConfig, toml::de::Error> {
  toml::from_str::<GenerationConfig>(s)
}
