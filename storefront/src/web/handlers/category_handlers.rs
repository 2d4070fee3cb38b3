// storefront/src/web/handlers/category_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use tracing::{info, instrument};
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::category::{Category, CategoryInput};
use crate::state::AppState;
use crate::web::extractors::AdminGuard;

const CATEGORY_COLUMNS: &str = "id, name, slug, description, image_url, sort_order, active, created_at, updated_at";

fn normalized(input: &CategoryInput) -> Result<(String, String), AppError> {
  let name = input.name.trim().to_string();
  if name.is_empty() {
    return Err(AppError::Validation("Kategori adı boş olamaz.".to_string()));
  }
  let slug = florist::slug::slugify(input.slug.as_deref().unwrap_or(&name));
  if slug.is_empty() {
    return Err(AppError::Validation("Geçerli bir kategori adresi (slug) üretilemedi.".to_string()));
  }
  Ok((name, slug))
}

#[instrument(name = "handler::list_categories", skip(app_state), err(Display))]
pub async fn list_categories_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let sql = format!(
    "SELECT {} FROM categories WHERE active ORDER BY sort_order ASC, name ASC",
    CATEGORY_COLUMNS
  );
  let categories: Vec<Category> = sqlx::query_as(&sql).fetch_all(&app_state.db_pool).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "categories": categories })))
}

#[instrument(name = "handler::create_category", skip(app_state, payload), err(Display))]
pub async fn create_category_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  payload: web::Json<CategoryInput>,
) -> Result<HttpResponse, AppError> {
  let (name, slug) = normalized(&payload)?;
  let sql = format!(
    "INSERT INTO categories (id, name, slug, description, image_url, sort_order, active, created_at, updated_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8) RETURNING {}",
    CATEGORY_COLUMNS
  );
  let category: Category = sqlx::query_as(&sql)
    .bind(Uuid::new_v4())
    .bind(&name)
    .bind(&slug)
    .bind(&payload.description)
    .bind(&payload.image_url)
    .bind(payload.sort_order)
    .bind(payload.active)
    .bind(Utc::now())
    .fetch_one(&app_state.db_pool)
    .await?;
  info!(category_id = %category.id, %slug, "Category created.");
  Ok(HttpResponse::Created().json(json!({ "success": true, "category": category })))
}

#[instrument(name = "handler::update_category", skip(app_state, payload), err(Display))]
pub async fn update_category_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<CategoryInput>,
) -> Result<HttpResponse, AppError> {
  let (name, slug) = normalized(&payload)?;
  let sql = format!(
    "UPDATE categories SET name = $2, slug = $3, description = $4, image_url = $5, sort_order = $6, \
       active = $7, updated_at = $8 WHERE id = $1 RETURNING {}",
    CATEGORY_COLUMNS
  );
  let category: Category = sqlx::query_as(&sql)
    .bind(path.into_inner())
    .bind(&name)
    .bind(&slug)
    .bind(&payload.description)
    .bind(&payload.image_url)
    .bind(payload.sort_order)
    .bind(payload.active)
    .bind(Utc::now())
    .fetch_optional(&app_state.db_pool)
    .await?
    .ok_or_else(|| AppError::NotFound("Kategori bulunamadı.".to_string()))?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "category": category })))
}

/// Products in a deleted category keep existing with no category.
#[instrument(name = "handler::delete_category", skip(app_state), err(Display))]
pub async fn delete_category_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let result = sqlx::query("DELETE FROM categories WHERE id = $1")
    .bind(path.into_inner())
    .execute(&app_state.db_pool)
    .await?;
  if result.rows_affected() == 0 {
    return Err(AppError::NotFound("Kategori bulunamadı.".to_string()));
  }
  Ok(HttpResponse::Ok().json(json!({ "success": true })))
}

/// Active category slugs and their last update, for the sitemap.
pub(crate) async fn active_category_slugs(
  app_state: &AppState,
) -> Result<Vec<(String, chrono::DateTime<Utc>)>, AppError> {
  let rows = sqlx::query_as::<_, (String, chrono::DateTime<Utc>)>(
    "SELECT slug, updated_at FROM categories WHERE active ORDER BY sort_order ASC",
  )
  .fetch_all(&app_state.db_pool)
  .await?;
  Ok(rows)
}
