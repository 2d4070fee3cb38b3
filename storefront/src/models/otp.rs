// storefront/src/models/otp.rs

use chrono::{DateTime, Utc};
use florist::{OtpRecord, OtpRejection};
use sqlx::FromRow;
use uuid::Uuid;

pub const OTP_COLUMNS: &str = "id, email, purpose, code_hash, attempts, created_at, last_sent_at, expires_at, consumed_at";

#[derive(Debug, Clone, FromRow)]
pub struct OtpRow {
  pub id: Uuid,
  pub email: String,
  pub purpose: String,
  pub code_hash: String,
  pub attempts: i32,
  pub created_at: DateTime<Utc>,
  pub last_sent_at: DateTime<Utc>,
  pub expires_at: DateTime<Utc>,
  pub consumed_at: Option<DateTime<Utc>>,
}

impl TryFrom<OtpRow> for OtpRecord {
  type Error = OtpRejection;

  fn try_from(row: OtpRow) -> Result<Self, Self::Error> {
    Ok(OtpRecord {
      id: row.id,
      email: row.email,
      purpose: row.purpose.parse()?,
      code_hash: row.code_hash,
      attempts: row.attempts,
      created_at: row.created_at,
      last_sent_at: row.last_sent_at,
      expires_at: row.expires_at,
      consumed_at: row.consumed_at,
    })
  }
}
