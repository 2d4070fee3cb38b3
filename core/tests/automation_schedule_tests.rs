// tests/automation_schedule_tests.rs
mod common;

use common::*;
use florist::{calculate_automation_schedule, classify_created_at, due_transitions, OrderStatus, ScheduleInput, ShiftBucket};

fn schedule_for(created_at: chrono::DateTime<chrono::Utc>, delivery_date: &str, stored: Option<&str>) -> florist::AutomationSchedule {
  calculate_automation_schedule(&ScheduleInput {
    created_at: Some(created_at),
    delivery_date: Some(delivery_date),
    stored_group: stored,
  })
  .expect("schedule should be computed")
}

#[test]
fn classifies_by_istanbul_hour() {
  // Istanbul is UTC+3.
  assert_eq!(classify_created_at(utc(2025, 3, 13, 2, 59)), ShiftBucket::Overnight);
  assert_eq!(classify_created_at(utc(2025, 3, 13, 3, 0)), ShiftBucket::Morning);
  assert_eq!(classify_created_at(utc(2025, 3, 13, 7, 59)), ShiftBucket::Morning);
  assert_eq!(classify_created_at(utc(2025, 3, 13, 8, 0)), ShiftBucket::Noon);
  assert_eq!(classify_created_at(utc(2025, 3, 13, 13, 59)), ShiftBucket::Noon);
  assert_eq!(classify_created_at(utc(2025, 3, 13, 14, 0)), ShiftBucket::Evening);
  assert_eq!(classify_created_at(utc(2025, 3, 13, 20, 59)), ShiftBucket::Evening);
  assert_eq!(classify_created_at(utc(2025, 3, 13, 21, 0)), ShiftBucket::Overnight);
}

#[test]
fn noon_bucket_targets_local_11_12_18_in_utc() {
  let schedule = schedule_for(utc(2025, 3, 13, 9, 30), "2025-03-14", None);
  assert_eq!(schedule.bucket, ShiftBucket::Noon);

  let statuses: Vec<OrderStatus> = schedule.steps.iter().map(|s| s.status).collect();
  assert_eq!(
    statuses,
    vec![OrderStatus::Processing, OrderStatus::Shipped, OrderStatus::Delivered]
  );
  assert_eq!(schedule.steps[0].at, utc(2025, 3, 14, 8, 0));
  assert_eq!(schedule.steps[1].at, utc(2025, 3, 14, 9, 0));
  assert_eq!(schedule.steps[2].at, utc(2025, 3, 14, 15, 0));
}

#[test]
fn evening_and_morning_buckets_use_their_own_shift() {
  let evening = schedule_for(utc(2025, 3, 13, 15, 0), "2025-03-14", None);
  assert_eq!(evening.bucket, ShiftBucket::Evening);
  assert_eq!(evening.steps[0].at, utc(2025, 3, 14, 15, 0));
  assert_eq!(evening.steps[1].at, utc(2025, 3, 14, 16, 0));
  assert_eq!(evening.steps[2].at, utc(2025, 3, 14, 19, 30));

  let morning = schedule_for(utc(2025, 3, 13, 4, 0), "2025-03-14", None);
  assert_eq!(morning.bucket, ShiftBucket::Morning);
  assert_eq!(morning.steps[0].at, utc(2025, 3, 14, 6, 0));
  assert_eq!(morning.steps[2].at, utc(2025, 3, 14, 11, 0));
}

#[test]
fn stored_overnight_group_matches_noon_schedule() {
  let created_at = utc(2025, 3, 13, 15, 0); // evening by the clock
  let overnight = schedule_for(created_at, "2025-03-14", Some("overnight"));
  let noon = schedule_for(created_at, "2025-03-14", Some("noon"));

  assert_eq!(overnight.bucket, ShiftBucket::Overnight);
  assert_eq!(overnight.steps, noon.steps);
}

#[test]
fn unknown_stored_group_falls_back_to_classification() {
  let schedule = schedule_for(utc(2025, 3, 13, 15, 0), "2025-03-14", Some("lunch"));
  assert_eq!(schedule.bucket, ShiftBucket::Evening);
}

#[test]
fn steps_are_strictly_increasing_for_every_bucket() {
  for stored in ["morning", "noon", "evening", "overnight"] {
    let schedule = schedule_for(utc(2025, 3, 13, 9, 0), "2025-03-20", Some(stored));
    assert!(schedule.steps[0].at < schedule.steps[1].at, "{stored}");
    assert!(schedule.steps[1].at < schedule.steps[2].at, "{stored}");
  }
}

#[test]
fn malformed_or_missing_inputs_yield_no_schedule() {
  let created_at = Some(utc(2025, 3, 13, 9, 0));
  for bad in ["", "14/03/2025", "2025-02-30", "tomorrow"] {
    assert!(calculate_automation_schedule(&ScheduleInput {
      created_at,
      delivery_date: Some(bad),
      stored_group: None,
    })
    .is_none());
  }
  assert!(calculate_automation_schedule(&ScheduleInput {
    created_at,
    delivery_date: None,
    stored_group: None,
  })
  .is_none());
  assert!(calculate_automation_schedule(&ScheduleInput {
    created_at: None,
    delivery_date: Some("2025-03-14"),
    stored_group: Some("noon"),
  })
  .is_none());
}

#[test]
fn due_transitions_only_returns_passed_steps_ahead_of_current() {
  let schedule = schedule_for(utc(2025, 3, 13, 9, 30), "2025-03-14", None);

  // Before the first target nothing is due.
  assert!(due_transitions(&schedule, OrderStatus::Confirmed, utc(2025, 3, 14, 7, 59)).is_empty());

  // Between shipped and delivered a confirmed order catches up two stages.
  let due = due_transitions(&schedule, OrderStatus::Confirmed, utc(2025, 3, 14, 10, 0));
  let statuses: Vec<OrderStatus> = due.iter().map(|t| t.status).collect();
  assert_eq!(statuses, vec![OrderStatus::Processing, OrderStatus::Shipped]);

  // An order already shipped only gets the remaining stage.
  let due = due_transitions(&schedule, OrderStatus::Shipped, utc(2025, 3, 14, 16, 0));
  assert_eq!(due.len(), 1);
  assert_eq!(due[0].status, OrderStatus::Delivered);
}

#[test]
fn non_automatable_statuses_never_move() {
  let schedule = schedule_for(utc(2025, 3, 13, 9, 30), "2025-03-14", None);
  let late = utc(2025, 3, 20, 0, 0);
  for status in [
    OrderStatus::Pending,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
    OrderStatus::Refunded,
    OrderStatus::Failed,
  ] {
    assert!(due_transitions(&schedule, status, late).is_empty(), "{status}");
  }
}

#[test]
fn bucket_names_parse_and_unknown_names_are_errors() {
  use florist::automation::UnknownShiftBucket;

  assert_eq!(" Evening ".parse::<ShiftBucket>(), Ok(ShiftBucket::Evening));
  let err = "brunch".parse::<ShiftBucket>().unwrap_err();
  assert_eq!(err, UnknownShiftBucket("brunch".to_string()));
  assert_eq!(err.to_string(), "unknown shift bucket 'brunch'");
  let boxed: Box<dyn std::error::Error> = Box::new(err);
  assert!(boxed.source().is_none());
}
