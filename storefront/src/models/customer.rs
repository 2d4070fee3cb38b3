// storefront/src/models/customer.rs

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

pub const CUSTOMER_COLUMNS: &str =
  "id, email, name, phone, password_hash, email_verified, last_login_at, created_at, updated_at";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
  pub id: Uuid,
  pub email: String,
  pub name: String,
  pub phone: Option<String>,
  #[serde(skip_serializing)]
  pub password_hash: Option<String>,
  pub email_verified: bool,
  pub last_login_at: Option<DateTime<Utc>>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}
