// florist/src/order/timeline.rs
use super::OrderStatus;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who caused a timeline entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimelineSource {
  Customer,
  Admin,
  Automation,
  Payment,
  System,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineEntry {
  pub status: OrderStatus,
  pub note: String,
  pub source: TimelineSource,
  pub at: DateTime<Utc>,
}

impl TimelineEntry {
  pub fn new(status: OrderStatus, note: impl Into<String>, source: TimelineSource, at: DateTime<Utc>) -> Self {
    Self {
      status,
      note: note.into(),
      source,
      at,
    }
  }
}
