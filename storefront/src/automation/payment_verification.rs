// storefront/src/automation/payment_verification.rs

use crate::db;
use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::common_steps::notify_best_effort;
use crate::services::{email, GatewayStatus};
use crate::state::AppState;
use chrono::{DateTime, Utc};
use florist::order::PaymentStatus;
use florist::{Order, OrderStatus};
use serde::Serialize;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentVerificationReport {
  pub checked: usize,
  pub paid: usize,
  pub failed: usize,
  pub still_pending: usize,
  pub errors: Vec<String>,
}

/// Applies an authoritative gateway status to a pending order.
///
/// Returns the updated order, or `None` when the order was no longer pending
/// or the gateway has not settled the payment yet.
#[instrument(name = "payments::apply_gateway_status", skip(state), err(Display))]
pub async fn apply_gateway_status(
  state: &AppState,
  order_id: Uuid,
  gateway_status: GatewayStatus,
  now: DateTime<Utc>,
) -> AppResult<Option<Order>> {
  let mut tx = state.db_pool.begin().await?;
  let Some(mut order) = db::orders::fetch_order_for_update(&mut tx, order_id).await? else {
    tx.rollback().await?;
    return Err(AppError::NotFound("Sipariş bulunamadı.".to_string()));
  };
  if order.status != OrderStatus::Pending || order.payment.status != PaymentStatus::Pending {
    tx.rollback().await?;
    return Ok(None);
  }

  match gateway_status {
    GatewayStatus::Paid => order.mark_paid(now)?,
    GatewayStatus::Failed => order.mark_payment_failed(now)?,
    GatewayStatus::Pending => {
      tx.rollback().await?;
      return Ok(None);
    }
    GatewayStatus::Refunded => {
      warn!(%order_id, "Gateway reports a refund for an order that was never marked paid.");
      tx.rollback().await?;
      return Ok(None);
    }
  }

  if !db::orders::update_order_state(&mut tx, &order, OrderStatus::Pending).await? {
    tx.rollback().await?;
    return Err(AppError::Conflict(
      "Sipariş durumu değişti, lütfen tekrar deneyin.".to_string(),
    ));
  }
  tx.commit().await?;
  info!(%order_id, status = %order.status, "Payment status applied.");
  Ok(Some(order))
}

/// Asks the gateway about pending card orders and settles the ones it has resolved.
/// Unresolved orders are picked up again on the next run.
#[instrument(name = "payments::verify_pending_payments", skip(state))]
pub async fn verify_pending_payments(state: &AppState, now: DateTime<Utc>) -> AppResult<PaymentVerificationReport> {
  let orders = db::orders::pending_gateway_orders(&state.db_pool, state.config.payment_verify_batch_size).await?;
  let mut report = PaymentVerificationReport::default();

  for order in orders {
    let Some(token) = order.payment.token.as_deref() else {
      continue;
    };
    report.checked += 1;

    let gateway_status = match state.payments.fetch_status(token).await {
      Ok(status) => status,
      Err(e) => {
        error!(order_id = %order.id, error = %e, "Gateway status lookup failed.");
        report.errors.push(format!("#{}: {}", order.order_number, e));
        continue;
      }
    };

    match apply_gateway_status(state, order.id, gateway_status, now).await {
      Ok(Some(updated)) => {
        match updated.status {
          OrderStatus::Confirmed => report.paid += 1,
          _ => report.failed += 1,
        }
        notify_best_effort(state, email::status_update_email(&updated)).await;
      }
      Ok(None) => report.still_pending += 1,
      Err(e) => report.errors.push(format!("#{}: {}", order.order_number, e)),
    }
    tokio::time::sleep(state.config.automation_delay).await;
  }

  info!(
    checked = report.checked,
    paid = report.paid,
    failed = report.failed,
    still_pending = report.still_pending,
    "Payment verification finished."
  );
  Ok(report)
}
