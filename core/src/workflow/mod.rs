// florist/src/workflow/mod.rs

//! A small named-step workflow runner.
//!
//! A [`Pipeline`] is an ordered list of named steps, each with one or more async
//! handlers operating on a shared [`ContextData`]. Steps marked optional may fail
//! without failing the run: their errors are logged and recorded in the
//! [`RunOutcome`]. This is how side effects such as confirmation emails are kept
//! from blocking the primary database write.

pub mod context_data;
pub mod control;
pub mod execution;
pub mod pipeline;
pub mod step;

pub use context_data::ContextData;
pub use control::{RunOutcome, RunStatus, StepControl};
pub use pipeline::{Handler, Pipeline};
pub use step::{SkipCondition, StepDef};

use thiserror::Error;

/// Errors raised by the runner itself rather than by step handlers.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum WorkflowError {
  #[error("Handler missing for non-optional step: {step_name}")]
  HandlerMissing { step_name: String },

  #[error("Workflow '{workflow}' is not configured")]
  NotConfigured { workflow: String },
}
