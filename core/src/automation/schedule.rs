// florist/src/automation/schedule.rs
use super::shift::{classify_created_at, ShiftBucket};
use crate::delivery::parse_delivery_date;
use crate::order::OrderStatus;
use crate::time::istanbul_to_utc;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, instrument};

/// The fields of an order the scheduler looks at.
#[derive(Debug, Clone, Default)]
pub struct ScheduleInput<'a> {
  pub created_at: Option<DateTime<Utc>>,
  pub delivery_date: Option<&'a str>,
  pub stored_group: Option<&'a str>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScheduledTransition {
  pub status: OrderStatus,
  pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AutomationSchedule {
  pub bucket: ShiftBucket,
  /// processing, shipped, delivered; strictly increasing in time.
  pub steps: [ScheduledTransition; 3],
}

const SCHEDULED_STATUSES: [OrderStatus; 3] = [OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered];

/// Computes the processing/shipped/delivered targets for an order.
///
/// A stored bucket that parses wins over the one derived from `created_at`.
/// Returns `None` when the creation time is missing or the delivery date is
/// missing or malformed; such orders are skipped by the runner.
#[instrument(level = "debug", skip_all, fields(delivery_date = ?input.delivery_date, stored_group = ?input.stored_group))]
pub fn calculate_automation_schedule(input: &ScheduleInput<'_>) -> Option<AutomationSchedule> {
  let created_at = input.created_at?;
  let delivery_date = match input.delivery_date.map(parse_delivery_date) {
    Some(Ok(date)) => date,
    Some(Err(e)) => {
      debug!(error = %e, "Unusable delivery date; no schedule.");
      return None;
    }
    None => return None,
  };

  let bucket = input
    .stored_group
    .and_then(|group| group.parse::<ShiftBucket>().ok())
    .unwrap_or_else(|| classify_created_at(created_at));

  let times = bucket.target_times();
  let mut steps = [ScheduledTransition {
    status: OrderStatus::Processing,
    at: created_at,
  }; 3];
  for (idx, (status, local_time)) in SCHEDULED_STATUSES.iter().zip(times.iter()).enumerate() {
    steps[idx] = ScheduledTransition {
      status: *status,
      at: istanbul_to_utc(delivery_date, *local_time)?,
    };
  }

  Some(AutomationSchedule { bucket, steps })
}

/// Scheduled steps that are due at `now` and ahead of `current`, in order.
///
/// Only automatable statuses (`confirmed`, `processing`, `shipped`) move.
pub fn due_transitions(schedule: &AutomationSchedule, current: OrderStatus, now: DateTime<Utc>) -> Vec<ScheduledTransition> {
  if !current.is_automatable() {
    return Vec::new();
  }
  let current_rank = current.progress_rank().unwrap_or(u8::MAX);
  schedule
    .steps
    .iter()
    .filter(|step| step.at <= now)
    .filter(|step| step.status.progress_rank().is_some_and(|rank| rank > current_rank))
    .copied()
    .collect()
}
