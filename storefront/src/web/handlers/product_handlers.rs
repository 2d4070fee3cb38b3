// storefront/src/web/handlers/product_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::{non_empty, PageQuery};
use crate::db;
use crate::errors::AppError;
use crate::models::product::{Product, ProductInput, PRODUCT_COLUMNS};
use crate::state::AppState;
use crate::web::extractors::AdminGuard;

/// Bulk operations run in independent chunks of this size.
pub const BULK_CHUNK_SIZE: usize = 100;

#[derive(Deserialize, Debug, Default)]
#[serde(rename_all = "camelCase")]
pub struct ListProductsQuery {
  /// Category slug.
  pub category: Option<String>,
  pub min_price: Option<i64>,
  pub max_price: Option<i64>,
  pub q: Option<String>,
  pub sort: Option<String>,
  pub featured: Option<bool>,
  pub page: Option<i64>,
  pub limit: Option<i64>,
}

impl ListProductsQuery {
  fn paging(&self) -> PageQuery {
    PageQuery {
      page: self.page,
      limit: self.limit,
    }
  }
}

fn order_clause(sort: Option<&str>) -> Result<&'static str, AppError> {
  match sort.unwrap_or("newest") {
    "newest" => Ok("created_at DESC"),
    "price_asc" => Ok("price ASC, created_at DESC"),
    "price_desc" => Ok("price DESC, created_at DESC"),
    "name" => Ok("name ASC"),
    other => Err(AppError::Validation(format!("Geçersiz sıralama: {}", other))),
  }
}

const LIST_FILTER: &str = "active \
  AND ($1::text IS NULL OR category_id = (SELECT id FROM categories WHERE slug = $1)) \
  AND ($2::bigint IS NULL OR price >= $2) \
  AND ($3::bigint IS NULL OR price <= $3) \
  AND ($4::text IS NULL OR name ILIKE '%' || $4 || '%' OR description ILIKE '%' || $4 || '%') \
  AND ($5::boolean IS NULL OR featured = $5)";

#[instrument(name = "handler::list_products", skip(app_state), err(Display))]
pub async fn list_products_handler(
  app_state: web::Data<AppState>,
  query: web::Query<ListProductsQuery>,
) -> Result<HttpResponse, AppError> {
  let order_by = order_clause(non_empty(&query.sort))?;
  let paging = query.paging();
  let (limit, offset) = (paging.limit(), paging.offset());
  let category = non_empty(&query.category);
  let search = non_empty(&query.q);

  let sql = format!(
    "SELECT {} FROM products WHERE {} ORDER BY {} LIMIT $6 OFFSET $7",
    PRODUCT_COLUMNS, LIST_FILTER, order_by
  );
  let products: Vec<Product> = sqlx::query_as(&sql)
    .bind(category)
    .bind(query.min_price)
    .bind(query.max_price)
    .bind(search)
    .bind(query.featured)
    .bind(limit)
    .bind(offset)
    .fetch_all(&app_state.db_pool)
    .await?;

  let total: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM products WHERE {}", LIST_FILTER))
    .bind(category)
    .bind(query.min_price)
    .bind(query.max_price)
    .bind(search)
    .bind(query.featured)
    .fetch_one(&app_state.db_pool)
    .await?;

  info!(count = products.len(), total, "Products listed.");
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "products": products,
    "total": total,
    "page": paging.page(),
    "limit": limit,
  })))
}

#[instrument(name = "handler::get_product", skip(app_state), err(Display))]
pub async fn get_product_handler(app_state: web::Data<AppState>, path: web::Path<Uuid>) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  match db::products::find_by_id(&app_state.db_pool, product_id).await? {
    Some(product) => Ok(HttpResponse::Ok().json(json!({ "success": true, "product": product }))),
    None => {
      warn!(%product_id, "Product not found.");
      Err(AppError::NotFound("Ürün bulunamadı.".to_string()))
    }
  }
}

#[instrument(name = "handler::get_product_by_slug", skip(app_state), err(Display))]
pub async fn get_product_by_slug_handler(
  app_state: web::Data<AppState>,
  path: web::Path<String>,
) -> Result<HttpResponse, AppError> {
  let slug = path.into_inner();
  let product = db::products::find_by_slug(&app_state.db_pool, &slug)
    .await?
    .ok_or_else(|| AppError::NotFound("Ürün bulunamadı.".to_string()))?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "product": product })))
}

#[instrument(name = "handler::create_product", skip(app_state, payload), fields(name = %payload.name), err(Display))]
pub async fn create_product_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  payload: web::Json<ProductInput>,
) -> Result<HttpResponse, AppError> {
  let (name, slug) = payload.normalized().map_err(AppError::Validation)?;
  let product = db::products::insert_product(&app_state.db_pool, &payload, &name, &slug, Utc::now()).await?;
  info!(product_id = %product.id, %slug, "Product created.");
  Ok(HttpResponse::Created().json(json!({ "success": true, "product": product })))
}

#[instrument(name = "handler::update_product", skip(app_state, payload), err(Display))]
pub async fn update_product_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<ProductInput>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  let (name, slug) = payload.normalized().map_err(AppError::Validation)?;
  let product = db::products::update_product(&app_state.db_pool, product_id, &payload, &name, &slug, Utc::now())
    .await?
    .ok_or_else(|| AppError::NotFound("Ürün bulunamadı.".to_string()))?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "product": product })))
}

#[instrument(name = "handler::delete_product", skip(app_state), err(Display))]
pub async fn delete_product_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let product_id = path.into_inner();
  if db::products::delete_many(&app_state.db_pool, &[product_id]).await? == 0 {
    return Err(AppError::NotFound("Ürün bulunamadı.".to_string()));
  }
  info!(%product_id, "Product deleted.");
  Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

// --- Bulk operations ---

#[derive(Deserialize, Debug)]
pub struct BulkImportPayload {
  pub products: Vec<ProductInput>,
}

#[derive(Deserialize, Debug)]
pub struct BulkDeletePayload {
  pub ids: Vec<Uuid>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct BulkError {
  pub chunk: usize,
  /// Position in the request array, when the error concerns a single item.
  #[serde(skip_serializing_if = "Option::is_none")]
  pub index: Option<usize>,
  pub message: String,
}

/// Splits `items` into chunks of [`BULK_CHUNK_SIZE`], keeping each item's
/// position in the original array.
pub fn chunked<T>(items: &[T]) -> Vec<Vec<(usize, &T)>> {
  items
    .iter()
    .enumerate()
    .collect::<Vec<_>>()
    .chunks(BULK_CHUNK_SIZE)
    .map(|chunk| chunk.to_vec())
    .collect()
}

/// Imports products chunk by chunk. A failing chunk is rolled back on its own;
/// earlier chunks stay committed.
#[instrument(name = "handler::bulk_import_products", skip(app_state, payload), fields(count = payload.products.len()), err(Display))]
pub async fn bulk_import_products_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  payload: web::Json<BulkImportPayload>,
) -> Result<HttpResponse, AppError> {
  if payload.products.is_empty() {
    return Err(AppError::Validation("İçe aktarılacak ürün yok.".to_string()));
  }
  let now = Utc::now();
  let mut imported = 0usize;
  let mut errors = Vec::new();

  for (chunk_idx, chunk) in chunked(&payload.products).into_iter().enumerate() {
    let mut valid = Vec::with_capacity(chunk.len());
    for (index, input) in chunk {
      match input.normalized() {
        Ok((name, slug)) => valid.push((index, input, name, slug)),
        Err(message) => errors.push(BulkError {
          chunk: chunk_idx,
          index: Some(index),
          message,
        }),
      }
    }
    if valid.is_empty() {
      continue;
    }

    let mut tx = app_state.db_pool.begin().await?;
    let mut chunk_error = None;
    for (index, input, name, slug) in &valid {
      if let Err(e) = db::products::insert_product(&mut *tx, input, name, slug, now).await {
        chunk_error = Some(BulkError {
          chunk: chunk_idx,
          index: Some(*index),
          message: e.to_string(),
        });
        break;
      }
    }
    match chunk_error {
      Some(err) => {
        error!(chunk = chunk_idx, error = %err.message, "Bulk import chunk failed; rolled back.");
        tx.rollback().await?;
        errors.push(err);
      }
      None => {
        tx.commit().await?;
        imported += valid.len();
      }
    }
  }

  info!(imported, errors = errors.len(), "Bulk import finished.");
  Ok(HttpResponse::Ok().json(json!({
    "success": errors.is_empty(),
    "imported": imported,
    "errors": errors,
  })))
}

#[instrument(name = "handler::bulk_delete_products", skip(app_state, payload), fields(count = payload.ids.len()), err(Display))]
pub async fn bulk_delete_products_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  payload: web::Json<BulkDeletePayload>,
) -> Result<HttpResponse, AppError> {
  let mut deleted = 0u64;
  let mut errors = Vec::new();
  for (chunk_idx, chunk) in payload.ids.chunks(BULK_CHUNK_SIZE).enumerate() {
    match db::products::delete_many(&app_state.db_pool, chunk).await {
      Ok(count) => deleted += count,
      Err(e) => {
        error!(chunk = chunk_idx, error = %e, "Bulk delete chunk failed.");
        errors.push(BulkError {
          chunk: chunk_idx,
          index: None,
          message: e.to_string(),
        });
      }
    }
  }
  Ok(HttpResponse::Ok().json(json!({
    "success": errors.is_empty(),
    "deleted": deleted,
    "errors": errors,
  })))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bulk_items_are_chunked_by_hundred_keeping_positions() {
    let items: Vec<u32> = (0..250).collect();
    let chunks = chunked(&items);
    assert_eq!(chunks.iter().map(Vec::len).collect::<Vec<_>>(), vec![100, 100, 50]);
    assert_eq!(chunks[2][0].0, 200);
  }

  #[test]
  fn sort_keys_map_to_fixed_clauses() {
    assert_eq!(order_clause(None).expect("default"), "created_at DESC");
    assert_eq!(order_clause(Some("price_asc")).expect("known"), "price ASC, created_at DESC");
    assert!(order_clause(Some("price; DROP TABLE products")).is_err());
  }
}
