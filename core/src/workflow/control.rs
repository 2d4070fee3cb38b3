// florist/src/workflow/control.rs

/// Returned by a step handler.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepControl {
  Continue,
  /// Halt the pipeline; no further handlers or steps run.
  Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
  Completed,
  Stopped,
}

/// Result of a pipeline run that did not fail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOutcome {
  pub status: RunStatus,
  /// Optional steps whose handlers returned an error, in execution order.
  pub failed_optional_steps: Vec<String>,
}

impl RunOutcome {
  pub fn is_completed(&self) -> bool {
    self.status == RunStatus::Completed
  }

  pub fn optional_step_failed(&self, step_name: &str) -> bool {
    self.failed_optional_steps.iter().any(|s| s == step_name)
  }
}
