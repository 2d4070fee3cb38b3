// storefront/src/pipelines/common_steps.rs

//! Email sending shared by workflow steps and post-commit notifications.

use crate::errors::{AppError, Result as AppResult};
use crate::services::EmailMessage;
use crate::state::AppState;
use tracing::{info, instrument, warn};

/// Sends `message`, turning a delivery failure into an error for optional workflow steps.
#[instrument(name = "common_step::send_email", skip(app_state, message), fields(to = %message.to, subject = %message.subject), err(Display))]
pub async fn send_email(app_state: &AppState, message: &EmailMessage) -> AppResult<()> {
  match app_state.email.send(message).await {
    Ok(sent_info) => {
      info!(message_id = %sent_info.message_id, "Email sent.");
      Ok(())
    }
    Err(e) => Err(AppError::Internal(format!("Email delivery failed: {:#}", e))),
  }
}

/// Sends `message` after the primary write has committed; failures are only logged.
pub async fn notify_best_effort(app_state: &AppState, message: EmailMessage) -> bool {
  match send_email(app_state, &message).await {
    Ok(()) => true,
    Err(e) => {
      warn!(error = %e, to = %message.to, "Notification email failed; continuing.");
      false
    }
  }
}
