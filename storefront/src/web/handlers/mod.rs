// storefront/src/web/handlers/mod.rs

pub mod auth_handlers;
pub mod category_handlers;
pub mod coupon_handlers;
pub mod cron_handlers;
pub mod customer_handlers;
pub mod order_handlers;
pub mod payment_handlers;
pub mod product_handlers;
pub mod report_handlers;
pub mod review_handlers;
pub mod sitemap_handlers;

use serde::Deserialize;

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// `page` (1-based) and `limit` query parameters.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct PageQuery {
  pub page: Option<i64>,
  pub limit: Option<i64>,
}

impl PageQuery {
  pub fn page(&self) -> i64 {
    self.page.unwrap_or(1).max(1)
  }

  pub fn limit(&self) -> i64 {
    self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
  }

  pub fn offset(&self) -> i64 {
    (self.page() - 1) * self.limit()
  }
}

/// Trims an optional query string and drops it when empty.
pub(crate) fn non_empty(value: &Option<String>) -> Option<&str> {
  value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn paging_is_clamped() {
    let q = PageQuery { page: Some(0), limit: Some(500) };
    assert_eq!((q.page(), q.limit(), q.offset()), (1, 100, 0));
    let q = PageQuery { page: Some(3), limit: None };
    assert_eq!(q.offset(), 40);
  }
}
