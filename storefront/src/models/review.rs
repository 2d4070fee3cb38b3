// storefront/src/models/review.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub const REVIEW_COLUMNS: &str =
  "id, product_id, customer_id, author_name, rating, comment, approved, helpful_count, created_at";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Review {
  pub id: Uuid,
  pub product_id: Uuid,
  pub customer_id: Option<Uuid>,
  pub author_name: String,
  pub rating: i16,
  pub comment: String,
  pub approved: bool,
  pub helpful_count: i32,
  pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewInput {
  pub product_id: Uuid,
  pub rating: i16,
  pub comment: String,
}
