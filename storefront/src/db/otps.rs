// storefront/src/db/otps.rs

use crate::errors::{AppError, Result};
use crate::models::otp::{OtpRow, OTP_COLUMNS};
use florist::{OtpPurpose, OtpRecord};
use sqlx::{PgConnection, PgExecutor};

fn latest_open_sql(lock: bool) -> String {
  format!(
    "SELECT {} FROM otp_codes WHERE email = $1 AND purpose = $2 AND consumed_at IS NULL \
     ORDER BY created_at DESC LIMIT 1{}",
    OTP_COLUMNS,
    if lock { " FOR UPDATE" } else { "" }
  )
}

async fn fetch_latest_open<'e, E: PgExecutor<'e>>(
  executor: E,
  email: &str,
  purpose: OtpPurpose,
  lock: bool,
) -> Result<Option<OtpRecord>> {
  let sql = latest_open_sql(lock);
  let row: Option<OtpRow> = sqlx::query_as(&sql)
    .bind(email)
    .bind(purpose.as_str())
    .fetch_optional(executor)
    .await?;
  row
    .map(OtpRecord::try_from)
    .transpose()
    .map_err(|e| AppError::Internal(format!("Stored OTP record is invalid: {}", e)))
}

/// Most recent unconsumed code for `email` and `purpose`.
pub async fn latest_open<'e, E: PgExecutor<'e>>(executor: E, email: &str, purpose: OtpPurpose) -> Result<Option<OtpRecord>> {
  fetch_latest_open(executor, email, purpose, false).await
}

/// Same as [`latest_open`] but holds the row lock until the transaction ends,
/// so concurrent verifications of one code are counted one after another.
pub async fn lock_latest_open(conn: &mut PgConnection, email: &str, purpose: OtpPurpose) -> Result<Option<OtpRecord>> {
  fetch_latest_open(&mut *conn, email, purpose, true).await
}

/// Stores a fresh code, dropping older unconsumed codes for the same email and purpose.
pub async fn replace_open(conn: &mut PgConnection, record: &OtpRecord) -> Result<()> {
  sqlx::query("DELETE FROM otp_codes WHERE email = $1 AND purpose = $2 AND consumed_at IS NULL")
    .bind(&record.email)
    .bind(record.purpose.as_str())
    .execute(&mut *conn)
    .await?;
  sqlx::query(
    "INSERT INTO otp_codes (id, email, purpose, code_hash, attempts, created_at, last_sent_at, expires_at, consumed_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)",
  )
  .bind(record.id)
  .bind(&record.email)
  .bind(record.purpose.as_str())
  .bind(&record.code_hash)
  .bind(record.attempts)
  .bind(record.created_at)
  .bind(record.last_sent_at)
  .bind(record.expires_at)
  .bind(record.consumed_at)
  .execute(&mut *conn)
  .await?;
  Ok(())
}

const SAVE_VERIFICATION_SQL: &str = "UPDATE otp_codes SET attempts = $2, consumed_at = $3 \
   WHERE id = $1 AND consumed_at IS NULL AND attempts = $4";

/// Persists the attempt counter and consumption after a verification.
///
/// `loaded_attempts` is the counter as read before verifying. The write only
/// lands when the stored counter still has that value and the code is unconsumed;
/// returns `false` when another verification got there first.
pub async fn save_verification<'e, E: PgExecutor<'e>>(executor: E, record: &OtpRecord, loaded_attempts: i32) -> Result<bool> {
  let result = sqlx::query(SAVE_VERIFICATION_SQL)
    .bind(record.id)
    .bind(record.attempts)
    .bind(record.consumed_at)
    .bind(loaded_attempts)
    .execute(executor)
    .await?;
  Ok(result.rows_affected() == 1)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn verification_reads_lock_the_row() {
    assert!(latest_open_sql(true).ends_with("LIMIT 1 FOR UPDATE"));
    assert!(!latest_open_sql(false).contains("FOR UPDATE"));
  }

  #[test]
  fn stale_attempt_counters_are_not_written_back() {
    assert!(SAVE_VERIFICATION_SQL.contains("attempts = $4"));
    assert!(SAVE_VERIFICATION_SQL.contains("consumed_at IS NULL"));
  }
}
