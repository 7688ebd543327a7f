//! Document download and plain-text extraction (docx, pptx, pdf).
//!
//! docx and pptx are zip containers of XML parts; we walk the XML with
//! quick-xml and keep only text runs, one line per paragraph. PDF text comes
//! from `pdf-extract`.

use std::io::{Cursor, Read};

use async_trait::async_trait;
use quick_xml::events::Event;
use quick_xml::Reader;
use thiserror::Error;
use tracing::{info, instrument};

use crate::error::{AppError, AppResult};

#[derive(Debug, Error)]
pub enum ExtractError {
  #[error("invalid container: {0}")]
  Zip(#[from] zip::result::ZipError),
  #[error("invalid XML: {0}")]
  Xml(#[from] quick_xml::Error),
  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),
  #[error("PDF error: {0}")]
  Pdf(String),
}

impl From<ExtractError> for AppError {
  fn from(err: ExtractError) -> Self {
    AppError::Extraction(err.to_string())
  }
}

/// Where uploaded documents come from.
#[async_trait]
pub trait DocumentSource: Send + Sync {
  async fn fetch(&self, url: &str) -> AppResult<Vec<u8>>;
}

pub struct HttpDocumentSource {
  client: reqwest::Client,
}

impl HttpDocumentSource {
  pub fn new(client: reqwest::Client) -> Self {
    Self { client }
  }
}

#[async_trait]
impl DocumentSource for HttpDocumentSource {
  #[instrument(level = "info", skip(self))]
  async fn fetch(&self, url: &str) -> AppResult<Vec<u8>> {
    let res = self.client.get(url).send().await.map_err(|e| AppError::Download(e.to_string()))?;
    if !res.status().is_success() {
      return Err(AppError::Download(format!("HTTP {}", res.status())));
    }
    let bytes = res.bytes().await.map_err(|e| AppError::Download(e.to_string()))?;
    info!(target: "course_forge", size = bytes.len(), "Document downloaded");
    Ok(bytes.to_vec())
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DocumentKind {
  Docx,
  Pdf,
  Pptx,
}

impl DocumentKind {
  pub fn from_extension(ext: &str) -> Option<Self> {
    match ext.to_ascii_lowercase().as_str() {
      "docx" => Some(DocumentKind::Docx),
      "pdf" => Some(DocumentKind::Pdf),
      "pptx" => Some(DocumentKind::Pptx),
      _ => None,
    }
  }
}

/// Last path segment of the URL; query and fragment are ignored.
pub fn filename_from_url(url: &str) -> String {
  let path = match reqwest::Url::parse(url) {
    Ok(u) => u.path().to_string(),
    Err(_) => url.split(['?', '#']).next().unwrap_or(url).to_string(),
  };
  path.rsplit('/').next().unwrap_or_default().to_string()
}

/// Text after the last dot, lower-cased. A name without a dot is its own extension.
pub fn extension_of(filename: &str) -> String {
  filename.rsplit('.').next().unwrap_or_default().to_ascii_lowercase()
}

pub fn extract_text(kind: DocumentKind, bytes: &[u8]) -> Result<String, ExtractError> {
  match kind {
    DocumentKind::Docx => extract_docx(bytes),
    DocumentKind::Pptx => extract_pptx(bytes),
    DocumentKind::Pdf => pdf_extract::extract_text_from_mem(bytes).map_err(|e| ExtractError::Pdf(e.to_string())),
  }
}

fn extract_docx(bytes: &[u8]) -> Result<String, ExtractError> {
  let mut zip = zip::ZipArchive::new(Cursor::new(bytes))?;
  let xml = read_entry(&mut zip, "word/document.xml")?;
  let paragraphs = xml_paragraphs(&xml, b"p", b"t")?;
  Ok(paragraphs.join("\n"))
}

fn extract_pptx(bytes: &[u8]) -> Result<String, ExtractError> {
  let mut zip = zip::ZipArchive::new(Cursor::new(bytes))?;

  let mut slides: Vec<(u32, String)> = zip
    .file_names()
    .filter_map(|name| slide_number(name).map(|n| (n, name.to_string())))
    .collect();
  slides.sort_by_key(|(n, _)| *n);

  let mut lines = Vec::new();
  for (_, name) in slides {
    let xml = read_entry(&mut zip, &name)?;
    lines.extend(xml_paragraphs(&xml, b"p", b"t")?);
  }
  Ok(lines.join("\n"))
}

/// `ppt/slides/slide12.xml` → 12. Layouts, notes and rels don't match.
fn slide_number(name: &str) -> Option<u32> {
  name.strip_prefix("ppt/slides/slide")?.strip_suffix(".xml")?.parse().ok()
}

fn read_entry(zip: &mut zip::ZipArchive<Cursor<&[u8]>>, name: &str) -> Result<String, ExtractError> {
  let mut file = zip.by_name(name)?;
  let mut out = String::new();
  file.read_to_string(&mut out)?;
  Ok(out)
}

/// Collect the text of every `para_tag` element, matching on local names so
/// the `w:` / `a:` prefixes don't matter. Only text inside `text_tag` counts;
/// `tab`/`br` count only inside a run (`r`), so paragraph tab stops are skipped.
fn xml_paragraphs(xml: &str, para_tag: &[u8], text_tag: &[u8]) -> Result<Vec<String>, ExtractError> {
  let mut reader = Reader::from_str(xml);
  reader.trim_text(false);

  let mut buf = Vec::new();
  let mut paragraphs = Vec::new();
  let mut current: Option<String> = None;
  let mut in_text = false;
  let mut in_run = false;

  loop {
    match reader.read_event_into(&mut buf)? {
      Event::Start(e) => {
        let name = e.local_name();
        if name.as_ref() == para_tag {
          current = Some(String::new());
        } else if name.as_ref() == text_tag {
          in_text = true;
        } else if name.as_ref() == b"r" {
          in_run = true;
        }
      }
      Event::Empty(e) => {
        if let Some(p) = current.as_mut().filter(|_| in_run) {
          match e.local_name().as_ref() {
            b"tab" => p.push('\t'),
            b"br" => p.push('\n'),
            _ => {}
          }
        }
        if e.local_name().as_ref() == para_tag {
          paragraphs.push(String::new());
        }
      }
      Event::Text(t) => {
        if in_text {
          if let Some(p) = current.as_mut() {
            p.push_str(&t.unescape()?);
          }
        }
      }
      Event::End(e) => {
        let name = e.local_name();
        if name.as_ref() == text_tag {
          in_text = false;
        } else if name.as_ref() == b"r" {
          in_run = false;
        } else if name.as_ref() == para_tag {
          if let Some(p) = current.take() {
            paragraphs.push(p);
          }
        }
      }
      Event::Eof => break,
      _ => {}
    }
    buf.clear();
  }
  Ok(paragraphs)
}
