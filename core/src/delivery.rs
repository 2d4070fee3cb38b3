// florist/src/delivery.rs

//! Delivery-date rules applied at checkout.

use chrono::{Datelike, NaiveDate, Weekday};
use thiserror::Error;

/// How far ahead a delivery can be booked.
pub const MAX_DAYS_AHEAD: i64 = 60;

/// Reasons a delivery date is refused. Messages are shown to customers as-is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeliveryRejection {
  #[error("Geçersiz teslimat tarihi: '{0}'. Beklenen biçim YYYY-AA-GG.")]
  Malformed(String),

  #[error("Geçmiş bir tarih için teslimat seçilemez.")]
  InPast,

  #[error("Teslimat tarihi en fazla 60 gün sonrası olabilir.")]
  TooFarAhead,

  #[error("Pazar günleri teslimat yapılmamaktadır. Lütfen başka bir gün seçin.")]
  Sunday,

  #[error("Seçilen tarihte ({0}) teslimat yapılamamaktadır.")]
  Blackout(NaiveDate),
}

pub fn parse_delivery_date(raw: &str) -> Result<NaiveDate, DeliveryRejection> {
  NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| DeliveryRejection::Malformed(raw.to_string()))
}

/// Checks `date` against `today` (Istanbul calendar date) and the configured blackout days.
pub fn validate_delivery_date(date: NaiveDate, today: NaiveDate, blackout_dates: &[NaiveDate]) -> Result<(), DeliveryRejection> {
  if date < today {
    return Err(DeliveryRejection::InPast);
  }
  if (date - today).num_days() > MAX_DAYS_AHEAD {
    return Err(DeliveryRejection::TooFarAhead);
  }
  if date.weekday() == Weekday::Sun {
    return Err(DeliveryRejection::Sunday);
  }
  if blackout_dates.contains(&date) {
    return Err(DeliveryRejection::Blackout(date));
  }
  Ok(())
}

/// Parses a comma-separated list of `YYYY-MM-DD` dates, ignoring blanks.
pub fn parse_blackout_list(raw: &str) -> Result<Vec<NaiveDate>, DeliveryRejection> {
  raw
    .split(',')
    .map(str::trim)
    .filter(|s| !s.is_empty())
    .map(parse_delivery_date)
    .collect()
}
