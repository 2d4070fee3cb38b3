// storefront/src/db/coupons.rs

use crate::errors::Result;
use crate::models::coupon::{CouponRow, COUPON_COLUMNS};
use florist::normalize_code;
use sqlx::{PgConnection, PgExecutor};

pub async fn find_by_code<'e, E: PgExecutor<'e>>(executor: E, code: &str) -> Result<Option<CouponRow>> {
  let sql = format!("SELECT {} FROM coupons WHERE code = $1", COUPON_COLUMNS);
  let row = sqlx::query_as::<_, CouponRow>(&sql)
    .bind(normalize_code(code))
    .fetch_optional(executor)
    .await?;
  Ok(row)
}

/// Counts one use of the coupon. Returns `false` when the usage limit was
/// reached in the meantime or the coupon was deactivated.
pub async fn consume(conn: &mut PgConnection, code: &str) -> Result<bool> {
  let result = sqlx::query(
    "UPDATE coupons SET used_count = used_count + 1, updated_at = NOW() \
     WHERE code = $1 AND active AND (usage_limit IS NULL OR used_count < usage_limit)",
  )
  .bind(normalize_code(code))
  .execute(conn)
  .await?;
  Ok(result.rows_affected() == 1)
}
