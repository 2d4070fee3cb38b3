// florist/src/automation/shift.rs
use crate::time::istanbul_hour;
use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Same-day shift window an order was placed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShiftBucket {
  Morning,
  Noon,
  Evening,
  Overnight,
}

impl ShiftBucket {
  pub fn as_str(self) -> &'static str {
    match self {
      ShiftBucket::Morning => "morning",
      ShiftBucket::Noon => "noon",
      ShiftBucket::Evening => "evening",
      ShiftBucket::Overnight => "overnight",
    }
  }

  /// Local (Istanbul) times on the delivery date for processing, shipped and delivered.
  ///
  /// `Overnight` shares the `Noon` shift.
  pub fn target_times(self) -> [NaiveTime; 3] {
    match self {
      ShiftBucket::Morning => [hm(9, 0), hm(10, 0), hm(14, 0)],
      ShiftBucket::Noon | ShiftBucket::Overnight => [hm(11, 0), hm(12, 0), hm(18, 0)],
      ShiftBucket::Evening => [hm(18, 0), hm(19, 0), hm(22, 30)],
    }
  }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
  NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

impl fmt::Display for ShiftBucket {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown shift bucket '{0}'")]
pub struct UnknownShiftBucket(pub String);

impl FromStr for ShiftBucket {
  type Err = UnknownShiftBucket;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s.trim().to_ascii_lowercase().as_str() {
      "morning" => Ok(ShiftBucket::Morning),
      "noon" => Ok(ShiftBucket::Noon),
      "evening" => Ok(ShiftBucket::Evening),
      "overnight" => Ok(ShiftBucket::Overnight),
      _ => Err(UnknownShiftBucket(s.to_string())),
    }
  }
}

/// Buckets an order by the Istanbul hour it was created in.
///
/// | local hour  | bucket    |
/// |-------------|-----------|
/// | 00:00–05:59 | overnight |
/// | 06:00–10:59 | morning   |
/// | 11:00–16:59 | noon      |
/// | 17:00–23:59 | evening   |
pub fn classify_created_at(created_at: DateTime<Utc>) -> ShiftBucket {
  match istanbul_hour(created_at) {
    0..=5 => ShiftBucket::Overnight,
    6..=10 => ShiftBucket::Morning,
    11..=16 => ShiftBucket::Noon,
    _ => ShiftBucket::Evening,
  }
}
