// storefront/src/models/product.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

pub const PRODUCT_COLUMNS: &str = "id, name, slug, description, price, compare_at_price, category_id, image_urls, \
  stock, active, featured, created_at, updated_at";

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Product {
  pub id: Uuid,
  pub name: String,
  pub slug: String,
  pub description: Option<String>,
  /// Kuruş.
  pub price: i64,
  pub compare_at_price: Option<i64>,
  pub category_id: Option<Uuid>,
  pub image_urls: Json<Vec<String>>,
  pub stock: i32,
  pub active: bool,
  pub featured: bool,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductInput {
  pub name: String,
  /// Derived from `name` when absent.
  #[serde(default)]
  pub slug: Option<String>,
  #[serde(default)]
  pub description: Option<String>,
  pub price: i64,
  #[serde(default)]
  pub compare_at_price: Option<i64>,
  #[serde(default)]
  pub category_id: Option<Uuid>,
  #[serde(default)]
  pub image_urls: Vec<String>,
  #[serde(default)]
  pub stock: i32,
  #[serde(default = "default_true")]
  pub active: bool,
  #[serde(default)]
  pub featured: bool,
}

fn default_true() -> bool {
  true
}

impl ProductInput {
  /// Trimmed name and final slug, or a validation message.
  pub fn normalized(&self) -> Result<(String, String), String> {
    let name = self.name.trim().to_string();
    if name.is_empty() {
      return Err("Ürün adı boş olamaz.".to_string());
    }
    if self.price < 0 || self.compare_at_price.is_some_and(|p| p < 0) {
      return Err("Fiyat negatif olamaz.".to_string());
    }
    if self.stock < 0 {
      return Err("Stok negatif olamaz.".to_string());
    }
    let slug = florist::slug::slugify(self.slug.as_deref().unwrap_or(&name));
    if slug.is_empty() {
      return Err("Geçerli bir ürün adresi (slug) üretilemedi.".to_string());
    }
    Ok((name, slug))
  }
}
