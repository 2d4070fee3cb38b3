// storefront/src/db/customers.rs

use crate::errors::Result;
use crate::models::customer::{Customer, CUSTOMER_COLUMNS};
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgExecutor};
use uuid::Uuid;

pub async fn find_by_email<'e, E: PgExecutor<'e>>(executor: E, email: &str) -> Result<Option<Customer>> {
  let sql = format!("SELECT {} FROM customers WHERE email = LOWER(TRIM($1))", CUSTOMER_COLUMNS);
  let customer = sqlx::query_as::<_, Customer>(&sql)
    .bind(email)
    .fetch_optional(executor)
    .await?;
  Ok(customer)
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<Option<Customer>> {
  let sql = format!("SELECT {} FROM customers WHERE id = $1", CUSTOMER_COLUMNS);
  let customer = sqlx::query_as::<_, Customer>(&sql).bind(id).fetch_optional(executor).await?;
  Ok(customer)
}

pub async fn email_exists<'e, E: PgExecutor<'e>>(executor: E, email: &str) -> Result<bool> {
  let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM customers WHERE email = LOWER(TRIM($1)))")
    .bind(email)
    .fetch_one(executor)
    .await?;
  Ok(exists)
}

pub struct NewCustomer<'a> {
  pub email: &'a str,
  pub name: &'a str,
  pub phone: Option<&'a str>,
  pub password_hash: Option<&'a str>,
  pub email_verified: bool,
}

/// Inserts a customer. A duplicate email surfaces as a unique violation (409).
pub async fn insert_customer(conn: &mut PgConnection, new: NewCustomer<'_>, now: DateTime<Utc>) -> Result<Customer> {
  let sql = format!(
    "INSERT INTO customers (id, email, name, phone, password_hash, email_verified, created_at, updated_at) \
     VALUES ($1, LOWER(TRIM($2)), $3, $4, $5, $6, $7, $7) RETURNING {}",
    CUSTOMER_COLUMNS
  );
  let customer = sqlx::query_as::<_, Customer>(&sql)
    .bind(Uuid::new_v4())
    .bind(new.email)
    .bind(new.name.trim())
    .bind(new.phone)
    .bind(new.password_hash)
    .bind(new.email_verified)
    .bind(now)
    .fetch_one(conn)
    .await?;
  Ok(customer)
}

pub async fn set_password_hash<'e, E: PgExecutor<'e>>(executor: E, id: Uuid, password_hash: &str) -> Result<bool> {
  let result = sqlx::query("UPDATE customers SET password_hash = $2, updated_at = NOW() WHERE id = $1")
    .bind(id)
    .bind(password_hash)
    .execute(executor)
    .await?;
  Ok(result.rows_affected() == 1)
}

/// Records a successful sign-in; an OTP sign-in also proves the email.
pub async fn record_login<'e, E: PgExecutor<'e>>(executor: E, id: Uuid, email_verified: bool, now: DateTime<Utc>) -> Result<()> {
  sqlx::query(
    "UPDATE customers SET last_login_at = $2, email_verified = email_verified OR $3, updated_at = $2 WHERE id = $1",
  )
  .bind(id)
  .bind(now)
  .bind(email_verified)
  .execute(executor)
  .await?;
  Ok(())
}

pub async fn list_customers<'e, E: PgExecutor<'e>>(executor: E, search: Option<&str>, limit: i64, offset: i64) -> Result<Vec<Customer>> {
  let sql = format!(
    "SELECT {} FROM customers \
     WHERE ($1::text IS NULL OR email ILIKE '%' || $1 || '%' OR name ILIKE '%' || $1 || '%') \
     ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    CUSTOMER_COLUMNS
  );
  let customers = sqlx::query_as::<_, Customer>(&sql)
    .bind(search)
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await?;
  Ok(customers)
}
