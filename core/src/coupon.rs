// florist/src/coupon.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiscountKind {
  /// `value` is a whole percentage, 1..=100.
  Percentage,
  /// `value` is an amount in kuruş.
  Fixed,
}

impl DiscountKind {
  pub fn as_str(self) -> &'static str {
    match self {
      DiscountKind::Percentage => "percentage",
      DiscountKind::Fixed => "fixed",
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Coupon {
  pub code: String,
  pub kind: DiscountKind,
  pub value: i64,
  #[serde(default)]
  pub min_order: i64,
  #[serde(default)]
  pub max_discount: Option<i64>,
  #[serde(default)]
  pub usage_limit: Option<i32>,
  #[serde(default)]
  pub used_count: i32,
  #[serde(default)]
  pub starts_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub expires_at: Option<DateTime<Utc>>,
  pub active: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CouponRejection {
  #[error("Kupon bulunamadı.")]
  NotFound,

  #[error("Bu kupon artık geçerli değil.")]
  Inactive,

  #[error("Bu kupon henüz kullanıma açılmadı.")]
  NotStarted,

  #[error("Kuponun süresi dolmuş.")]
  Expired,

  #[error("Kupon kullanım limitine ulaşıldı.")]
  UsageLimitReached,

  #[error("Bu kupon için minimum sepet tutarı {min_order} kuruştur.")]
  MinimumNotMet { min_order: i64 },

  #[error("Kupon tanımı geçersiz: {0}")]
  Misconfigured(String),
}

/// Canonical form used for lookups and uniqueness: trimmed, upper-case.
pub fn normalize_code(code: &str) -> String {
  code.trim().to_uppercase()
}

impl Coupon {
  pub fn validate_definition(&self) -> Result<(), CouponRejection> {
    if normalize_code(&self.code).is_empty() {
      return Err(CouponRejection::Misconfigured("code is empty".to_string()));
    }
    match self.kind {
      DiscountKind::Percentage if !(1..=100).contains(&self.value) => Err(CouponRejection::Misconfigured(
        "percentage must be between 1 and 100".to_string(),
      )),
      DiscountKind::Fixed if self.value <= 0 => {
        Err(CouponRejection::Misconfigured("fixed amount must be positive".to_string()))
      }
      _ if self.min_order < 0 || self.max_discount.is_some_and(|m| m <= 0) => Err(CouponRejection::Misconfigured(
        "limits must be positive".to_string(),
      )),
      _ => Ok(()),
    }
  }

  /// Discount in kuruş this coupon grants on `subtotal` at `now`.
  pub fn quote(&self, subtotal: i64, now: DateTime<Utc>) -> Result<i64, CouponRejection> {
    if !self.active {
      return Err(CouponRejection::Inactive);
    }
    if self.starts_at.is_some_and(|starts| now < starts) {
      return Err(CouponRejection::NotStarted);
    }
    if self.expires_at.is_some_and(|expires| now >= expires) {
      return Err(CouponRejection::Expired);
    }
    if self.usage_limit.is_some_and(|limit| self.used_count >= limit) {
      return Err(CouponRejection::UsageLimitReached);
    }
    if subtotal < self.min_order {
      return Err(CouponRejection::MinimumNotMet {
        min_order: self.min_order,
      });
    }

    let raw = match self.kind {
      DiscountKind::Percentage => subtotal.saturating_mul(self.value) / 100,
      DiscountKind::Fixed => self.value,
    };
    let capped = match self.max_discount {
      Some(max) => raw.min(max),
      None => raw,
    };
    Ok(capped.clamp(0, subtotal.max(0)))
  }
}
