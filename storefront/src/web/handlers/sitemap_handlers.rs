// storefront/src/web/handlers/sitemap_handlers.rs

use actix_web::{http::header::ContentType, web, HttpResponse};
use florist::sitemap::{render_sitemap, ChangeFreq, SitemapEntry};
use tracing::instrument;

use super::category_handlers::active_category_slugs;
use crate::db;
use crate::errors::AppError;
use crate::state::AppState;

/// Pages that exist regardless of catalogue content.
pub(crate) fn static_entries() -> Vec<SitemapEntry> {
  vec![
    SitemapEntry::new("/", ChangeFreq::Daily, 1.0),
    SitemapEntry::new("/urunler", ChangeFreq::Daily, 0.9),
    SitemapEntry::new("/hakkimizda", ChangeFreq::Monthly, 0.4),
    SitemapEntry::new("/iletisim", ChangeFreq::Monthly, 0.4),
    SitemapEntry::new("/siparis-takip", ChangeFreq::Monthly, 0.5),
  ]
}

#[instrument(name = "handler::sitemap", skip(app_state), err(Display))]
pub async fn sitemap_handler(app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let mut entries = static_entries();
  for (slug, updated_at) in active_category_slugs(&app_state).await? {
    entries.push(SitemapEntry::new(format!("/kategori/{}", slug), ChangeFreq::Weekly, 0.8).modified_at(updated_at));
  }
  for (slug, updated_at) in db::products::active_slugs(&app_state.db_pool).await? {
    entries.push(SitemapEntry::new(format!("/urun/{}", slug), ChangeFreq::Weekly, 0.7).modified_at(updated_at));
  }

  let xml = render_sitemap(&app_state.config.site_base_url, &entries);
  Ok(HttpResponse::Ok().content_type(ContentType::xml()).body(xml))
}
