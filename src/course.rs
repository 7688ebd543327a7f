//! Course generation: the shared outline stage and the content pipeline.
//!
//! The content pipeline expands units one at a time. A unit whose expansion
//! fails is logged and left out; the request only fails when no unit survives.

use tracing::{info, instrument, warn};

use crate::domain::{ContentUnit, Course, CourseOutline, UnitDetail, UnitStub};
use crate::error::{AppError, AppResult};
use crate::protocol::CourseRequest;
use crate::state::AppState;
use crate::structured::{generate_structured, generate_value};
use crate::util::fill_template;

/// Stage 1: course metadata and ordered unit stubs.
#[instrument(level = "info", skip(state, req), fields(subject = %req.subject, units = req.units))]
pub async fn generate_outline(state: &AppState, req: &CourseRequest) -> AppResult<CourseOutline> {
  let units = req.units.to_string();
  let difficulty = req.difficulty.to_string();
  let prompt = fill_template(
    &state.prompts.outline_template,
    &[
      ("subject", &req.subject),
      ("units", &units),
      ("focus_area", &req.focus_area),
      ("difficulty", &difficulty),
    ],
  );
  let outline: CourseOutline = generate_structured(state.model.as_ref(), &prompt).await?;
  info!(target: "pipeline", stubs = outline.units.len(), "Course outline generated");
  Ok(outline)
}

/// Prompt for a per-unit call: the unit title, the request's parameters and
/// any stage-specific pairs, filled in a single pass.
pub(crate) fn unit_prompt(template: &str, unit_title: &str, req: &CourseRequest, extra: &[(&str, &str)]) -> String {
  let difficulty = req.difficulty.to_string();
  let mut pairs = vec![
    ("unit_title", unit_title),
    ("subject", req.subject.as_str()),
    ("difficulty", difficulty.as_str()),
    ("focus_area", req.focus_area.as_str()),
  ];
  pairs.extend_from_slice(extra);
  fill_template(template, &pairs)
}

#[instrument(level = "info", skip(state, req), fields(subject = %req.subject, difficulty = %req.difficulty, units = req.units))]
pub async fn generate_course(state: &AppState, req: &CourseRequest) -> AppResult<Course<ContentUnit>> {
  let outline = generate_outline(state, req).await?;

  let mut units = Vec::with_capacity(outline.units.len());
  for stub in &outline.units {
    match expand_content_unit(state, stub, req).await {
      Ok(unit) => {
        info!(target: "pipeline", unit = %stub.unit_title, "Unit expanded");
        units.push(unit);
      }
      Err(e) => {
        warn!(target: "pipeline", unit = %stub.unit_title, error = %e, "Unit expansion failed; skipping");
      }
    }
  }

  if units.is_empty() {
    return Err(AppError::NoUnitsGenerated);
  }
  Ok(outline.assemble(units))
}

/// Stage 2 for one unit: objectives/topics, then long-form content, then a video.
async fn expand_content_unit(state: &AppState, stub: &UnitStub, req: &CourseRequest) -> AppResult<ContentUnit> {
  let prompt = unit_prompt(&state.prompts.unit_detail_template, &stub.unit_title, req, &[]);
  let detail: UnitDetail = generate_structured(state.model.as_ref(), &prompt).await?;

  let topics = detail.topics_covered.join(", ");
  let objectives = detail.learning_objectives.join(", ");
  let content_prompt = unit_prompt(
    &state.prompts.unit_content_template,
    &detail.unit_title,
    req,
    &[("topics", &topics), ("objectives", &objectives)],
  );
  let detailed_content = generate_value(state.model.as_ref(), &content_prompt).await?;

  let query = format!("{} {} {}", stub.unit_title, req.subject, req.focus_area);
  let youtube_video_url = state.videos.find(&query).await;

  Ok(ContentUnit { detail, detailed_content, youtube_video_url })
}
