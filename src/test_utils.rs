//! In-memory collaborators and document builders for tests.

use std::io::{Cursor, Write};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::json;
use zip::write::FileOptions;

use crate::config::Prompts;
use crate::documents::DocumentSource;
use crate::error::{AppError, AppResult, ModelError};
use crate::gemini::TextModel;
use crate::state::AppState;
use crate::video::{VideoLink, VideoLookup};

type Script = Box<dyn Fn(&str) -> Result<String, ModelError> + Send + Sync>;

/// Model fake that answers through a closure over the prompt. Records every
/// prompt and the highest number of calls in flight at once.
pub struct ScriptedModel {
  script: Script,
  prompts: Mutex<Vec<String>>,
  in_flight: AtomicUsize,
  max_in_flight: AtomicUsize,
}

impl ScriptedModel {
  pub fn new<F>(script: F) -> Arc<Self>
  where
    F: Fn(&str) -> Result<String, ModelError> + Send + Sync + 'static,
  {
    Arc::new(Self {
      script: Box::new(script),
      prompts: Mutex::new(Vec::new()),
      in_flight: AtomicUsize::new(0),
      max_in_flight: AtomicUsize::new(0),
    })
  }

  pub fn always(reply: &str) -> Arc<Self> {
    let reply = reply.to_string();
    Self::new(move |_| Ok(reply.clone()))
  }

  pub fn calls(&self) -> usize {
    self.prompts.lock().unwrap().len()
  }

  pub fn prompts(&self) -> Vec<String> {
    self.prompts.lock().unwrap().clone()
  }

  pub fn max_in_flight(&self) -> usize {
    self.max_in_flight.load(Ordering::SeqCst)
  }
}

#[async_trait]
impl TextModel for ScriptedModel {
  async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
    self.prompts.lock().unwrap().push(prompt.to_string());
    let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
    self.max_in_flight.fetch_max(now, Ordering::SeqCst);

    // Suspend once, like a network call would.
    tokio::task::yield_now().await;

    self.in_flight.fetch_sub(1, Ordering::SeqCst);
    (self.script)(prompt)
  }
}

/// Video fake returning a fixed link and recording queries.
#[derive(Clone)]
pub struct StaticVideos {
  link: VideoLink,
  queries: Arc<Mutex<Vec<String>>>,
}

impl StaticVideos {
  pub fn new(link: VideoLink) -> Self {
    Self { link, queries: Arc::new(Mutex::new(Vec::new())) }
  }

  pub fn queries(&self) -> Vec<String> {
    self.queries.lock().unwrap().clone()
  }
}

#[async_trait]
impl VideoLookup for StaticVideos {
  async fn find(&self, query: &str) -> VideoLink {
    self.queries.lock().unwrap().push(query.to_string());
    self.link.clone()
  }
}

/// Document fake: always the same bytes, or always a download failure.
pub struct StaticDocuments {
  bytes: Option<Vec<u8>>,
}

impl StaticDocuments {
  pub fn new(bytes: Vec<u8>) -> Self {
    Self { bytes: Some(bytes) }
  }

  pub fn failing() -> Self {
    Self { bytes: None }
  }
}

#[async_trait]
impl DocumentSource for StaticDocuments {
  async fn fetch(&self, _url: &str) -> AppResult<Vec<u8>> {
    self.bytes.clone().ok_or_else(|| AppError::Download("HTTP 404 Not Found".into()))
  }
}

pub fn state_with(model: Arc<ScriptedModel>, documents: StaticDocuments) -> AppState {
  AppState::from_parts(
    model,
    Arc::new(StaticVideos::new(VideoLink::NotFound)),
    Arc::new(documents),
    Prompts::default(),
  )
}

pub fn state_with_videos(model: Arc<ScriptedModel>, videos: StaticVideos) -> AppState {
  AppState::from_parts(model, Arc::new(videos), Arc::new(StaticDocuments::failing()), Prompts::default())
}

/// Outline JSON with the given unit titles, fenced the way the model usually answers.
pub fn outline_json(titles: &[&str]) -> String {
  let units: Vec<_> = titles
    .iter()
    .map(|t| json!({"unitTitle": t, "unitDescription": format!("About {}", t)}))
    .collect();
  let body = json!({
    "courseTitle": "Generated course",
    "difficultyLevel": "medium",
    "description": "",
    "prerequisites": [],
    "learningOutcomes": [],
    "units": units,
    "overview": "",
    "assessmentMethods": []
  });
  format!("```json\n{}\n```", body)
}

/// First double-quoted string in a prompt; the unit prompts quote the title first.
pub fn quoted_title(prompt: &str) -> &str {
  prompt.split('"').nth(1).unwrap_or_default()
}

fn zip_with(entries: &[(String, String)]) -> Vec<u8> {
  let mut zip = zip::ZipWriter::new(Cursor::new(Vec::new()));
  let options = FileOptions::default().compression_method(zip::CompressionMethod::Stored);
  for (name, body) in entries {
    zip.start_file(name.as_str(), options).unwrap();
    zip.write_all(body.as_bytes()).unwrap();
  }
  zip.finish().unwrap().into_inner()
}

fn xml_escape(s: &str) -> String {
  s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

pub fn docx_bytes(paragraphs: &[&str]) -> Vec<u8> {
  let body: String = paragraphs
    .iter()
    .map(|p| format!(r#"<w:p><w:r><w:t xml:space="preserve">{}</w:t></w:r></w:p>"#, xml_escape(p)))
    .collect();
  let document = format!(
    r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?><w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}<w:sectPr/></w:body></w:document>"#,
    body
  );
  zip_with(&[
    ("[Content_Types].xml".into(), "<Types/>".into()),
    ("word/document.xml".into(), document),
  ])
}

/// One slide per entry; entries are added to the archive in reverse order so
/// the extractor has to sort them.
pub fn pptx_bytes(slides: &[&str]) -> Vec<u8> {
  let mut entries: Vec<(String, String)> = slides
    .iter()
    .enumerate()
    .map(|(i, text)| {
      let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><p:sld xmlns:p="http://schemas.openxmlformats.org/presentationml/2006/main" xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main"><p:cSld><p:spTree><p:sp><p:txBody><a:p><a:r><a:t>{}</a:t></a:r></a:p></p:txBody></p:sp></p:spTree></p:cSld></p:sld>"#,
        xml_escape(text)
      );
      (format!("ppt/slides/slide{}.xml", i + 1), xml)
    })
    .collect();
  entries.reverse();
  entries.push(("ppt/slideLayouts/slideLayout1.xml".into(), "<p:sldLayout/>".into()));
  zip_with(&entries)
}
