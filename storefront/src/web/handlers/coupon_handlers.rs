// storefront/src/web/handlers/coupon_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use florist::{Coupon, FloristError};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::coupon::{CouponInput, CouponRow, COUPON_COLUMNS};
use crate::state::AppState;
use crate::web::extractors::AdminGuard;

#[instrument(name = "handler::list_coupons", skip(app_state), err(Display))]
pub async fn list_coupons_handler(_admin: AdminGuard, app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let sql = format!("SELECT {} FROM coupons ORDER BY created_at DESC", COUPON_COLUMNS);
  let coupons: Vec<CouponRow> = sqlx::query_as(&sql).fetch_all(&app_state.db_pool).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "coupons": coupons })))
}

fn validated(input: &CouponInput) -> Result<Coupon, AppError> {
  input.to_coupon().map_err(|r| FloristError::from(r).into())
}

#[instrument(name = "handler::create_coupon", skip(app_state, payload), fields(code = %payload.code), err(Display))]
pub async fn create_coupon_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  payload: web::Json<CouponInput>,
) -> Result<HttpResponse, AppError> {
  let coupon = validated(&payload)?;
  let sql = format!(
    "INSERT INTO coupons (id, code, kind, value, min_order, max_discount, usage_limit, used_count, \
       starts_at, expires_at, active, created_at, updated_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, 0, $8, $9, $10, $11, $11) RETURNING {}",
    COUPON_COLUMNS
  );
  let row: CouponRow = sqlx::query_as(&sql)
    .bind(Uuid::new_v4())
    .bind(&coupon.code)
    .bind(coupon.kind.as_str())
    .bind(coupon.value)
    .bind(coupon.min_order)
    .bind(coupon.max_discount)
    .bind(coupon.usage_limit)
    .bind(coupon.starts_at)
    .bind(coupon.expires_at)
    .bind(coupon.active)
    .bind(Utc::now())
    .fetch_one(&app_state.db_pool)
    .await?;
  info!(coupon_id = %row.id, "Coupon created.");
  Ok(HttpResponse::Created().json(json!({ "success": true, "coupon": row })))
}

/// Replaces the coupon definition; the usage counter is kept.
#[instrument(name = "handler::update_coupon", skip(app_state, payload), err(Display))]
pub async fn update_coupon_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<CouponInput>,
) -> Result<HttpResponse, AppError> {
  let coupon = validated(&payload)?;
  let sql = format!(
    "UPDATE coupons SET code = $2, kind = $3, value = $4, min_order = $5, max_discount = $6, usage_limit = $7, \
       starts_at = $8, expires_at = $9, active = $10, updated_at = $11 WHERE id = $1 RETURNING {}",
    COUPON_COLUMNS
  );
  let row: CouponRow = sqlx::query_as(&sql)
    .bind(path.into_inner())
    .bind(&coupon.code)
    .bind(coupon.kind.as_str())
    .bind(coupon.value)
    .bind(coupon.min_order)
    .bind(coupon.max_discount)
    .bind(coupon.usage_limit)
    .bind(coupon.starts_at)
    .bind(coupon.expires_at)
    .bind(coupon.active)
    .bind(Utc::now())
    .fetch_optional(&app_state.db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Kupon bulunamadı.".to_string()))?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "coupon": row })))
}

#[instrument(name = "handler::delete_coupon", skip(app_state), err(Display))]
pub async fn delete_coupon_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let result = sqlx::query("DELETE FROM coupons WHERE id = $1")
    .bind(path.into_inner())
    .execute(&app_state.db_pool)
    .await?;
  if result.rows_affected() == 0 {
    return Err(AppError::NotFound("Kupon bulunamadı.".to_string()));
  }
  Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ValidateCouponPayload {
  pub code: String,
  /// Cart subtotal in kuruş.
  pub subtotal: i64,
}

/// Quotes a coupon for a cart without consuming it.
#[instrument(name = "handler::validate_coupon", skip(app_state), err(Display))]
pub async fn validate_coupon_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<ValidateCouponPayload>,
) -> Result<HttpResponse, AppError> {
  if payload.subtotal < 0 {
    return Err(AppError::Validation("Sepet tutarı negatif olamaz.".to_string()));
  }
  let row = db::coupons::find_by_code(&app_state.db_pool, &payload.code)
    .await?
    .ok_or_else(|| AppError::NotFound("Kupon bulunamadı.".to_string()))?;
  let coupon = Coupon::try_from(&row).map_err(FloristError::from)?;
  let discount = coupon.quote(payload.subtotal, Utc::now()).map_err(FloristError::from)?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "code": coupon.code,
    "kind": coupon.kind,
    "discount": discount,
  })))
}
