//! MCQ generation pipeline.
//!
//! Same outline stage as the content pipeline, but units are expanded
//! concurrently. Every unit task runs to completion: a failure is recorded for
//! that unit only and never cancels its siblings. Results keep outline order.

use futures::future::join_all;
use tracing::{info, instrument, warn};

use crate::course::{generate_outline, unit_prompt};
use crate::domain::{Course, McqUnit, UnitHeading, UnitStub};
use crate::error::{AppError, AppResult};
use crate::protocol::CourseRequest;
use crate::state::AppState;
use crate::structured::{generate_structured, generate_value};

#[instrument(level = "info", skip(state, req), fields(subject = %req.subject, difficulty = %req.difficulty, units = req.units))]
pub async fn generate_questions(state: &AppState, req: &CourseRequest) -> AppResult<Course<McqUnit>> {
  let outline = generate_outline(state, req).await?;

  let outcomes = join_all(outline.units.iter().map(|stub| expand_mcq_unit(state, stub, req))).await;

  let units: Vec<McqUnit> = outline
    .units
    .iter()
    .zip(outcomes)
    .filter_map(|(stub, outcome)| match outcome {
      Ok(unit) => Some(unit),
      Err(e) => {
        warn!(target: "pipeline", unit = %stub.unit_title, error = %e, "MCQ unit failed; dropping");
        None
      }
    })
    .collect();

  info!(target: "pipeline", requested = outline.units.len(), generated = units.len(), "MCQ units settled");
  if units.is_empty() {
    return Err(AppError::NoUnitsGenerated);
  }
  Ok(outline.assemble(units))
}

/// Stage 2 for one unit: heading, then question sets keyed by its title.
async fn expand_mcq_unit(state: &AppState, stub: &UnitStub, req: &CourseRequest) -> AppResult<McqUnit> {
  let prompt = unit_prompt(&state.prompts.mcq_unit_template, &stub.unit_title, req, &[]);
  let heading: UnitHeading = generate_structured(state.model.as_ref(), &prompt).await?;

  let mcq_prompt = unit_prompt(&state.prompts.mcq_template, &heading.unit_title, req, &[]);
  let assessment = generate_value(state.model.as_ref(), &mcq_prompt).await?;

  Ok(McqUnit { heading, assessment })
}
