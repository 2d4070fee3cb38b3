// storefront/src/automation/runner.rs

use crate::db;
use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::common_steps::notify_best_effort;
use crate::services::email;
use crate::state::AppState;
use chrono::{DateTime, Utc};
use florist::time::istanbul_date;
use florist::{
  calculate_automation_schedule, due_transitions, FloristResult, Order, OrderStatus, ScheduleInput,
  ScheduledTransition, ShiftBucket, TimelineSource,
};
use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AutomationOutcome {
  Advanced,
  Skipped,
  Failed,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderAutomationResult {
  pub order_id: Uuid,
  pub order_number: i64,
  pub outcome: AutomationOutcome,
  pub from: OrderStatus,
  pub to: Option<OrderStatus>,
  #[serde(skip_serializing_if = "Option::is_none")]
  pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationReport {
  pub scanned: usize,
  /// Candidates whose next target has not passed yet; counted, not listed.
  pub waiting: usize,
  pub advanced: usize,
  pub skipped: usize,
  pub failed: usize,
  pub results: Vec<OrderAutomationResult>,
}

impl AutomationReport {
  fn record(&mut self, result: OrderAutomationResult) {
    match result.outcome {
      AutomationOutcome::Advanced => self.advanced += 1,
      AutomationOutcome::Skipped => self.skipped += 1,
      AutomationOutcome::Failed => self.failed += 1,
    }
    self.results.push(result);
  }
}

const NOT_DUE_YET: &str = "nothing due yet";

/// What the runner should do with one order at `now`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdvancePlan {
  Skip(&'static str),
  Advance {
    bucket: ShiftBucket,
    steps: Vec<ScheduledTransition>,
  },
}

pub fn plan_advance(order: &Order, now: DateTime<Utc>) -> AdvancePlan {
  if !order.status.is_automatable() {
    return AdvancePlan::Skip("status is not automatable");
  }
  let input = ScheduleInput {
    created_at: Some(order.created_at),
    delivery_date: Some(order.delivery.delivery_date.as_str()),
    stored_group: order.order_time_group.as_deref(),
  };
  let Some(schedule) = calculate_automation_schedule(&input) else {
    return AdvancePlan::Skip("no schedule for this order");
  };
  let steps = due_transitions(&schedule, order.status, now);
  if steps.is_empty() {
    return AdvancePlan::Skip(NOT_DUE_YET);
  }
  AdvancePlan::Advance {
    bucket: schedule.bucket,
    steps,
  }
}

fn automation_note(status: OrderStatus) -> &'static str {
  match status {
    OrderStatus::Processing => "Siparişiniz hazırlanıyor.",
    OrderStatus::Shipped => "Siparişiniz yola çıktı.",
    OrderStatus::Delivered => "Siparişiniz teslim edildi.",
    _ => "Sipariş durumu güncellendi.",
  }
}

/// Appends one automation timeline entry per due step and records the bucket
/// when the order has none stored yet.
pub fn apply_plan(
  order: &mut Order,
  bucket: ShiftBucket,
  steps: &[ScheduledTransition],
  now: DateTime<Utc>,
) -> FloristResult<()> {
  for step in steps {
    order.transition_to(step.status, automation_note(step.status), TimelineSource::Automation, now)?;
  }
  if order.order_time_group.is_none() {
    order.order_time_group = Some(bucket.as_str().to_string());
  }
  Ok(())
}

/// A page of automation candidates split by what the runner will do with them.
#[derive(Debug, Default)]
pub struct CandidateSplit {
  pub due: Vec<Order>,
  pub waiting: usize,
  pub skipped: Vec<(Order, &'static str)>,
}

/// Takes due orders from `candidates` until `room` is used up. Candidates after
/// that point are left for the next run.
pub fn split_candidates(candidates: Vec<Order>, now: DateTime<Utc>, room: usize) -> CandidateSplit {
  let mut split = CandidateSplit::default();
  for order in candidates {
    if split.due.len() >= room {
      break;
    }
    match plan_advance(&order, now) {
      AdvancePlan::Advance { .. } => split.due.push(order),
      AdvancePlan::Skip(NOT_DUE_YET) => split.waiting += 1,
      AdvancePlan::Skip(reason) => split.skipped.push((order, reason)),
    }
  }
  split
}

/// Re-reads the order under a row lock and applies whatever is due.
/// Returns the updated order, or `None` when nothing changed.
async fn advance_order(state: &AppState, order_id: Uuid, now: DateTime<Utc>) -> AppResult<Option<Order>> {
  let mut tx = state.db_pool.begin().await?;
  let Some(mut order) = db::orders::fetch_order_for_update(&mut tx, order_id).await? else {
    tx.rollback().await?;
    return Ok(None);
  };

  let (bucket, steps) = match plan_advance(&order, now) {
    AdvancePlan::Skip(_) => {
      tx.rollback().await?;
      return Ok(None);
    }
    AdvancePlan::Advance { bucket, steps } => (bucket, steps),
  };

  let expected = order.status;
  apply_plan(&mut order, bucket, &steps, now)?;
  if !db::orders::update_order_state(&mut tx, &order, expected).await? {
    tx.rollback().await?;
    return Err(AppError::Conflict("Order status changed concurrently.".to_string()));
  }
  tx.commit().await?;
  Ok(Some(order))
}

/// Advances every automatable order whose scheduled targets have passed.
///
/// Orders are handled one at a time; a failure is recorded and the run moves on.
#[instrument(name = "automation::run_order_automation", skip(state), fields(batch = state.config.automation_batch_size))]
pub async fn run_order_automation(state: &AppState, now: DateTime<Utc>) -> AppResult<AutomationReport> {
  let today = istanbul_date(now);
  let batch_size = state.config.automation_batch_size;
  let room = usize::try_from(batch_size).unwrap_or(usize::MAX);
  let mut report = AutomationReport::default();

  // Page past orders that are not due so they cannot crowd out due ones.
  let mut cursor: Option<db::orders::AutomationCursor> = None;
  let mut orders: Vec<Order> = Vec::new();
  loop {
    let page = db::orders::automatable_orders(&state.db_pool, today, cursor.as_ref(), batch_size).await?;
    let exhausted = page.len() < room;
    cursor = page.last().map(db::orders::AutomationCursor::after);
    report.scanned += page.len();

    let split = split_candidates(page, now, room - orders.len());
    report.waiting += split.waiting;
    for (order, reason) in split.skipped {
      debug!(order_id = %order.id, reason, "Order skipped by automation.");
      report.record(OrderAutomationResult {
        order_id: order.id,
        order_number: order.order_number,
        outcome: AutomationOutcome::Skipped,
        from: order.status,
        to: None,
        message: Some(reason.to_string()),
      });
    }
    orders.extend(split.due);
    if exhausted || orders.len() >= room {
      break;
    }
  }
  debug!(due = orders.len(), waiting = report.waiting, "Automation candidates selected.");

  for order in orders {
    let from = order.status;
    let base = OrderAutomationResult {
      order_id: order.id,
      order_number: order.order_number,
      outcome: AutomationOutcome::Skipped,
      from,
      to: None,
      message: None,
    };

    match advance_order(state, order.id, now).await {
      Ok(Some(updated)) => {
        info!(order_id = %updated.id, from = %from, to = %updated.status, "Order advanced by automation.");
        notify_best_effort(state, email::status_update_email(&updated)).await;
        report.record(OrderAutomationResult {
          outcome: AutomationOutcome::Advanced,
          to: Some(updated.status),
          ..base
        });
        tokio::time::sleep(state.config.automation_delay).await;
      }
      Ok(None) => report.record(OrderAutomationResult {
        message: Some("changed before it could be advanced".to_string()),
        ..base
      }),
      Err(e) => {
        error!(order_id = %order.id, error = %e, "Automation failed for order.");
        report.record(OrderAutomationResult {
          outcome: AutomationOutcome::Failed,
          message: Some(e.to_string()),
          ..base
        });
      }
    }
  }

  if report.failed > 0 {
    warn!(failed = report.failed, "Automation run finished with failures.");
  }
  info!(
    scanned = report.scanned,
    waiting = report.waiting,
    advanced = report.advanced,
    skipped = report.skipped,
    failed = report.failed,
    "Automation run finished."
  );
  Ok(report)
}
