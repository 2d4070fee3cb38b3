// storefront/src/web/handlers/review_handlers.rs

use actix_web::{web, HttpRequest, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use std::time::Instant;
use tracing::{debug, info, instrument};
use uuid::Uuid;

use crate::db;
use crate::errors::AppError;
use crate::models::review::{Review, ReviewInput, REVIEW_COLUMNS};
use crate::state::AppState;
use crate::web::extractors::{voter_key, AdminGuard, CustomerSession};

const MAX_COMMENT_CHARS: usize = 2000;

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ListReviewsQuery {
  pub product_id: Option<Uuid>,
  /// Admin only; everyone else sees approved reviews.
  pub approved: Option<bool>,
}

#[instrument(name = "handler::list_reviews", skip(app_state, admin), err(Display))]
pub async fn list_reviews_handler(
  admin: Option<AdminGuard>,
  app_state: web::Data<AppState>,
  query: web::Query<ListReviewsQuery>,
) -> Result<HttpResponse, AppError> {
  let approved = match admin {
    Some(_) => query.approved,
    None => Some(true),
  };
  if admin.is_none() && query.product_id.is_none() {
    return Err(AppError::Validation("productId parametresi zorunludur.".to_string()));
  }

  let sql = format!(
    "SELECT {} FROM reviews WHERE ($1::uuid IS NULL OR product_id = $1) \
     AND ($2::boolean IS NULL OR approved = $2) ORDER BY created_at DESC LIMIT 200",
    REVIEW_COLUMNS
  );
  let reviews: Vec<Review> = sqlx::query_as(&sql)
    .bind(query.product_id)
    .bind(approved)
    .fetch_all(&app_state.db_pool)
    .await?;

  let average_rating = if reviews.is_empty() {
    None
  } else {
    let sum: i64 = reviews.iter().map(|r| i64::from(r.rating)).sum();
    Some(((sum as f64 / reviews.len() as f64) * 10.0).round() / 10.0)
  };
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "reviews": reviews,
    "averageRating": average_rating,
  })))
}

pub(crate) fn validate_review(input: &ReviewInput) -> Result<String, AppError> {
  if !(1..=5).contains(&input.rating) {
    return Err(AppError::Validation("Puan 1 ile 5 arasında olmalıdır.".to_string()));
  }
  let comment = input.comment.trim();
  if comment.is_empty() {
    return Err(AppError::Validation("Yorum boş olamaz.".to_string()));
  }
  if comment.chars().count() > MAX_COMMENT_CHARS {
    return Err(AppError::Validation(format!(
      "Yorum en fazla {} karakter olabilir.",
      MAX_COMMENT_CHARS
    )));
  }
  Ok(comment.to_string())
}

/// New reviews wait for admin approval.
#[instrument(name = "handler::create_review", skip(app_state, session, payload), fields(customer_id = %session.customer_id), err(Display))]
pub async fn create_review_handler(
  session: CustomerSession,
  app_state: web::Data<AppState>,
  payload: web::Json<ReviewInput>,
) -> Result<HttpResponse, AppError> {
  let comment = validate_review(&payload)?;
  let customer = db::customers::find_by_id(&app_state.db_pool, session.customer_id)
    .await?
    .ok_or_else(|| AppError::Auth("Oturum geçersiz.".to_string()))?;

  let sql = format!(
    "INSERT INTO reviews (id, product_id, customer_id, author_name, rating, comment, approved, helpful_count, created_at) \
     VALUES ($1, $2, $3, $4, $5, $6, FALSE, 0, $7) RETURNING {}",
    REVIEW_COLUMNS
  );
  let review: Review = sqlx::query_as(&sql)
    .bind(Uuid::new_v4())
    .bind(payload.product_id)
    .bind(customer.id)
    .bind(&customer.name)
    .bind(payload.rating)
    .bind(&comment)
    .bind(Utc::now())
    .fetch_one(&app_state.db_pool)
    .await?;
  info!(review_id = %review.id, product_id = %review.product_id, "Review submitted.");
  Ok(HttpResponse::Created().json(json!({ "success": true, "review": review })))
}

/// One helpful vote per voter and review within the throttle window.
#[instrument(name = "handler::mark_review_helpful", skip(app_state, session, req), err(Display))]
pub async fn mark_review_helpful_handler(
  req: HttpRequest,
  session: Option<CustomerSession>,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let review_id = path.into_inner();
  let key = voter_key(&req, session.as_ref());
  if !app_state.vote_throttle.try_register(review_id, &key, Instant::now()) {
    debug!(%review_id, voter = %key, "Helpful vote throttled.");
    return Err(AppError::RateLimited {
      message: "Bu yorumu kısa süre önce zaten değerlendirdiniz.".to_string(),
      retry_after_secs: None,
    });
  }

  let helpful_count: i32 = sqlx::query_scalar(
    "UPDATE reviews SET helpful_count = helpful_count + 1 WHERE id = $1 AND approved RETURNING helpful_count",
  )
  .bind(review_id)
  .fetch_optional(&app_state.db_pool)
  .await?
  .ok_or_else(|| AppError::NotFound("Yorum bulunamadı.".to_string()))?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "helpfulCount": helpful_count })))
}

#[derive(Deserialize, Debug)]
pub struct ApprovePayload {
  #[serde(default = "default_approved")]
  pub approved: bool,
}

fn default_approved() -> bool {
  true
}

#[instrument(name = "handler::approve_review", skip(app_state), err(Display))]
pub async fn approve_review_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: Option<web::Json<ApprovePayload>>,
) -> Result<HttpResponse, AppError> {
  let approved = payload.map_or(true, |p| p.approved);
  let sql = format!("UPDATE reviews SET approved = $2 WHERE id = $1 RETURNING {}", REVIEW_COLUMNS);
  let review: Review = sqlx::query_as(&sql)
    .bind(path.into_inner())
    .bind(approved)
    .fetch_optional(&app_state.db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Yorum bulunamadı.".to_string()))?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "review": review })))
}

#[instrument(name = "handler::delete_review", skip(app_state), err(Display))]
pub async fn delete_review_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
    .bind(path.into_inner())
    .execute(&app_state.db_pool)
    .await?;
  if result.rows_affected() == 0 {
    return Err(AppError::NotFound("Yorum bulunamadı.".to_string()));
  }
  Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn input(rating: i16, comment: &str) -> ReviewInput {
    ReviewInput {
      product_id: Uuid::new_v4(),
      rating,
      comment: comment.to_string(),
    }
  }

  #[test]
  fn reviews_need_a_rating_in_range_and_a_comment() {
    assert_eq!(validate_review(&input(5, "  Çok taze geldi ")).expect("valid"), "Çok taze geldi");
    assert!(validate_review(&input(0, "ok")).is_err());
    assert!(validate_review(&input(6, "ok")).is_err());
    assert!(validate_review(&input(4, "   ")).is_err());
    assert!(validate_review(&input(4, &"a".repeat(MAX_COMMENT_CHARS + 1))).is_err());
  }
}
