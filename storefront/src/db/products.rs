// storefront/src/db/products.rs

use crate::errors::Result;
use crate::models::product::{Product, ProductInput, PRODUCT_COLUMNS};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::PgExecutor;
use uuid::Uuid;

/// Inserts a product from an already-normalized name and slug.
pub async fn insert_product<'e, E: PgExecutor<'e>>(
  executor: E,
  input: &ProductInput,
  name: &str,
  slug: &str,
  now: DateTime<Utc>,
) -> Result<Product> {
  let sql = format!(
    "INSERT INTO products (id, name, slug, description, price, compare_at_price, category_id, image_urls, \
       stock, active, featured, created_at, updated_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $12) RETURNING {}",
    PRODUCT_COLUMNS
  );
  let product = sqlx::query_as::<_, Product>(&sql)
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(slug)
    .bind(&input.description)
    .bind(input.price)
    .bind(input.compare_at_price)
    .bind(input.category_id)
    .bind(Json(&input.image_urls))
    .bind(input.stock)
    .bind(input.active)
    .bind(input.featured)
    .bind(now)
    .fetch_one(executor)
    .await?;
  Ok(product)
}

pub async fn update_product<'e, E: PgExecutor<'e>>(
  executor: E,
  id: Uuid,
  input: &ProductInput,
  name: &str,
  slug: &str,
  now: DateTime<Utc>,
) -> Result<Option<Product>> {
  let sql = format!(
    "UPDATE products SET name = $2, slug = $3, description = $4, price = $5, compare_at_price = $6, \
       category_id = $7, image_urls = $8, stock = $9, active = $10, featured = $11, updated_at = $12 \
     WHERE id = $1 RETURNING {}",
    PRODUCT_COLUMNS
  );
  let product = sqlx::query_as::<_, Product>(&sql)
    .bind(id)
    .bind(name)
    .bind(slug)
    .bind(&input.description)
    .bind(input.price)
    .bind(input.compare_at_price)
    .bind(input.category_id)
    .bind(Json(&input.image_urls))
    .bind(input.stock)
    .bind(input.active)
    .bind(input.featured)
    .bind(now)
    .fetch_optional(executor)
    .await?;
  Ok(product)
}

pub async fn find_by_id<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<Option<Product>> {
  let sql = format!("SELECT {} FROM products WHERE id = $1", PRODUCT_COLUMNS);
  Ok(sqlx::query_as::<_, Product>(&sql).bind(id).fetch_optional(executor).await?)
}

pub async fn find_by_slug<'e, E: PgExecutor<'e>>(executor: E, slug: &str) -> Result<Option<Product>> {
  let sql = format!("SELECT {} FROM products WHERE slug = $1 AND active", PRODUCT_COLUMNS);
  Ok(sqlx::query_as::<_, Product>(&sql).bind(slug).fetch_optional(executor).await?)
}

/// Deletes the given products; returns how many rows went away.
pub async fn delete_many<'e, E: PgExecutor<'e>>(executor: E, ids: &[Uuid]) -> Result<u64> {
  let result = sqlx::query("DELETE FROM products WHERE id = ANY($1)")
    .bind(ids)
    .execute(executor)
    .await?;
  Ok(result.rows_affected())
}

/// Active products for the sitemap: slug and last update.
pub async fn active_slugs<'e, E: PgExecutor<'e>>(executor: E) -> Result<Vec<(String, DateTime<Utc>)>> {
  let rows = sqlx::query_as::<_, (String, DateTime<Utc>)>(
    "SELECT slug, updated_at FROM products WHERE active ORDER BY updated_at DESC",
  )
  .fetch_all(executor)
  .await?;
  Ok(rows)
}
