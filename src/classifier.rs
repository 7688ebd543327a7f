//! Content classifier: download a document, extract its text, ask the model
//! for its subject domain.

use serde_json::{Map, Value};
use tracing::{info, instrument};

use crate::documents::{extension_of, extract_text, filename_from_url, DocumentKind};
use crate::error::{AppError, AppResult};
use crate::protocol::ClassificationOut;
use crate::state::AppState;
use crate::structured::generate_structured;
use crate::util::fill_template;

const UNKNOWN: &str = "Unknown";
const NO_EXPLANATION: &str = "No explanation provided.";

/// Absent keys get a placeholder. Present values, `null` included, pass
/// through with whatever JSON type the model chose.
fn take_or(answer: &mut Map<String, Value>, key: &str, fallback: &str) -> Value {
  answer.remove(key).unwrap_or_else(|| Value::String(fallback.into()))
}

#[instrument(level = "info", skip(state))]
pub async fn classify_document(state: &AppState, file_url: &str) -> AppResult<ClassificationOut> {
  let bytes = state.documents.fetch(file_url).await?;

  let filename = filename_from_url(file_url);
  let ext = extension_of(&filename);
  let kind = DocumentKind::from_extension(&ext).ok_or_else(|| AppError::UnsupportedType(ext.clone()))?;

  // pdf-extract can panic on malformed input; that is still a bad document.
  let content = tokio::task::spawn_blocking(move || extract_text(kind, &bytes))
    .await
    .map_err(|e| AppError::Extraction(format!("extractor aborted: {}", e)))??;
  if content.trim().is_empty() {
    return Err(AppError::EmptyContent);
  }
  info!(target: "course_forge", %filename, ?kind, content_len = content.len(), "Document text extracted");

  let prompt = fill_template(&state.prompts.classify_template, &[("content", &content)]);
  let mut answer: Map<String, Value> = generate_structured(state.model.as_ref(), &prompt).await?;

  Ok(ClassificationOut {
    filename,
    domain: take_or(&mut answer, "domain", UNKNOWN),
    subdomain: take_or(&mut answer, "subdomain", UNKNOWN),
    explanation: take_or(&mut answer, "explanation", NO_EXPLANATION),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{docx_bytes, state_with, ScriptedModel, StaticDocuments};
  use serde_json::json;

  #[tokio::test]
  async fn unsupported_extension_fails_before_any_model_call() {
    let model = ScriptedModel::always(r#"{"domain":"X"}"#);
    let state = state_with(model.clone(), StaticDocuments::new(b"plain text".to_vec()));

    let err = classify_document(&state, "https://files.example.com/notes.txt").await.unwrap_err();
    assert!(matches!(err, AppError::UnsupportedType(ref ext) if ext == "txt"));
    assert_eq!(model.calls(), 0);
  }

  #[tokio::test]
  async fn classifies_docx_and_defaults_missing_keys() {
    let model = ScriptedModel::always("```json\n{\"domain\": \"Physics\"}\n```");
    let state = state_with(model.clone(), StaticDocuments::new(docx_bytes(&["Kinematics", "Velocity and acceleration"])));

    let out = classify_document(&state, "https://files.example.com/lecture.docx?token=1").await.unwrap();
    assert_eq!(out.filename, "lecture.docx");
    assert_eq!(out.domain, "Physics");
    assert_eq!(out.subdomain, "Unknown");
    assert_eq!(out.explanation, "No explanation provided.");
    assert_eq!(model.calls(), 1);
    assert!(model.prompts()[0].contains("Velocity and acceleration"));
  }

  #[tokio::test]
  async fn answer_values_pass_through_untyped() {
    let model = ScriptedModel::always(r#"{"domain": 42, "subdomain": null, "explanation": "Kinematics."}"#);
    let state = state_with(model, StaticDocuments::new(docx_bytes(&["Velocity"])));

    let out = classify_document(&state, "https://x.example/a.docx").await.unwrap();
    assert_eq!(out.domain, json!(42));
    assert_eq!(out.subdomain, Value::Null);
    assert_eq!(out.explanation, "Kinematics.");
  }

  #[tokio::test]
  async fn non_object_answer_is_a_format_error() {
    let model = ScriptedModel::always(r#"["Physics"]"#);
    let state = state_with(model, StaticDocuments::new(docx_bytes(&["Velocity"])));

    let err = classify_document(&state, "https://x.example/a.docx").await.unwrap_err();
    assert!(matches!(err, AppError::ResponseFormat { .. }));
  }

  #[tokio::test]
  async fn malformed_pdf_is_an_extraction_error() {
    let model = ScriptedModel::always("{}");
    let state = state_with(model.clone(), StaticDocuments::new(b"%PDF-1.4 garbage".to_vec()));

    let err = classify_document(&state, "https://x.example/broken.pdf").await.unwrap_err();
    assert!(matches!(err, AppError::Extraction(_)));
    assert_eq!(model.calls(), 0);
  }

  #[tokio::test]
  async fn blank_document_is_rejected() {
    let model = ScriptedModel::always("{}");
    let state = state_with(model.clone(), StaticDocuments::new(docx_bytes(&["   ", ""])));

    let err = classify_document(&state, "https://files.example.com/empty.docx").await.unwrap_err();
    assert!(matches!(err, AppError::EmptyContent));
    assert_eq!(model.calls(), 0);
  }

  #[tokio::test]
  async fn download_failure_propagates() {
    let model = ScriptedModel::always("{}");
    let state = state_with(model.clone(), StaticDocuments::failing());

    let err = classify_document(&state, "https://files.example.com/a.pdf").await.unwrap_err();
    assert!(matches!(err, AppError::Download(_)));
  }

  #[tokio::test]
  async fn non_json_answer_is_a_format_error() {
    let model = ScriptedModel::always("This looks like biology to me.");
    let state = state_with(model, StaticDocuments::new(docx_bytes(&["Cells"])));

    let err = classify_document(&state, "https://files.example.com/bio.docx").await.unwrap_err();
    assert!(matches!(err, AppError::ResponseFormat { .. }));
  }
}
