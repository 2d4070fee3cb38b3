// florist/src/workflow/execution.rs

//! `Pipeline::run`.

use super::control::{RunOutcome, RunStatus, StepControl};
use super::pipeline::Pipeline;
use super::{ContextData, WorkflowError};
use tracing::{event, instrument, span, Instrument, Level};

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send + Sync,
  Err: std::error::Error + From<WorkflowError> + Send + Sync + 'static,
{
  /// Runs every step in order against `ctx`.
  ///
  /// A failing handler in a required step aborts the run with its error. A failing
  /// handler in an optional step ends that step, is logged, and the run moves on to
  /// the next step.
  #[instrument(name = "Pipeline::run", skip_all, fields(workflow = %self.name, num_steps = self.steps.len()), err(Display))]
  pub async fn run(&self, ctx: ContextData<TData>) -> Result<RunOutcome, Err> {
    let mut failed_optional_steps = Vec::new();

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = span!(
        Level::INFO,
        "workflow_step",
        step_name = step_name,
        step_index = step_idx,
        optional = step_def.optional
      );

      if step_def.should_skip(&ctx) {
        event!(parent: &step_span, Level::DEBUG, "Step skipped by condition.");
        continue;
      }

      let handlers = match self.handlers.get(step_name) {
        Some(handlers) if !handlers.is_empty() => handlers,
        _ if step_def.optional => {
          event!(parent: &step_span, Level::DEBUG, "Optional step has no handlers.");
          continue;
        }
        _ => {
          event!(parent: &step_span, Level::ERROR, "Required step has no handlers.");
          return Err(Err::from(WorkflowError::HandlerMissing {
            step_name: step_def.name.clone(),
          }));
        }
      };

      for handler in handlers {
        match handler(ctx.clone()).instrument(step_span.clone()).await {
          Ok(StepControl::Continue) => {}
          Ok(StepControl::Stop) => {
            event!(parent: &step_span, Level::INFO, "Workflow stopped by step.");
            return Ok(RunOutcome {
              status: RunStatus::Stopped,
              failed_optional_steps,
            });
          }
          Err(e) if step_def.optional => {
            event!(parent: &step_span, Level::WARN, error = %e, "Optional step failed; continuing.");
            failed_optional_steps.push(step_def.name.clone());
            break;
          }
          Err(e) => {
            event!(parent: &step_span, Level::ERROR, error = %e, "Step failed.");
            return Err(e);
          }
        }
      }
    }

    event!(Level::DEBUG, "Workflow completed.");
    Ok(RunOutcome {
      status: RunStatus::Completed,
      failed_optional_steps,
    })
  }
}
