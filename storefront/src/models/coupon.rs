// storefront/src/models/coupon.rs

use chrono::{DateTime, Utc};
use florist::{normalize_code, Coupon, CouponRejection, DiscountKind};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const COUPON_COLUMNS: &str = "id, code, kind, value, min_order, max_discount, usage_limit, used_count, \
  starts_at, expires_at, active, created_at, updated_at";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CouponRow {
  pub id: Uuid,
  pub code: String,
  pub kind: String,
  pub value: i64,
  pub min_order: i64,
  pub max_discount: Option<i64>,
  pub usage_limit: Option<i32>,
  pub used_count: i32,
  pub starts_at: Option<DateTime<Utc>>,
  pub expires_at: Option<DateTime<Utc>>,
  pub active: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl TryFrom<&CouponRow> for Coupon {
  type Error = CouponRejection;

  fn try_from(row: &CouponRow) -> Result<Self, Self::Error> {
    let kind = match row.kind.as_str() {
      "percentage" => DiscountKind::Percentage,
      "fixed" => DiscountKind::Fixed,
      other => return Err(CouponRejection::Misconfigured(format!("unknown kind '{}'", other))),
    };
    Ok(Coupon {
      code: row.code.clone(),
      kind,
      value: row.value,
      min_order: row.min_order,
      max_discount: row.max_discount,
      usage_limit: row.usage_limit,
      used_count: row.used_count,
      starts_at: row.starts_at,
      expires_at: row.expires_at,
      active: row.active,
    })
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CouponInput {
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
  pub starts_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub expires_at: Option<DateTime<Utc>>,
  #[serde(default = "default_active")]
  pub active: bool,
}

fn default_active() -> bool {
  true
}

impl CouponInput {
  /// Validated domain coupon for this input; `used_count` is left at zero.
  pub fn to_coupon(&self) -> Result<Coupon, CouponRejection> {
    let coupon = Coupon {
      code: normalize_code(&self.code),
      kind: self.kind,
      value: self.value,
      min_order: self.min_order,
      max_discount: self.max_discount,
      usage_limit: self.usage_limit,
      used_count: 0,
      starts_at: self.starts_at,
      expires_at: self.expires_at,
      active: self.active,
    };
    coupon.validate_definition()?;
    if let (Some(starts), Some(expires)) = (coupon.starts_at, coupon.expires_at) {
      if expires <= starts {
        return Err(CouponRejection::Misconfigured(
          "expiry must be after the start date".to_string(),
        ));
      }
    }
    Ok(coupon)
  }
}
