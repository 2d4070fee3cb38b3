// storefront/src/web/handlers/report_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use florist::report::build_sales_report;
use florist::time::{istanbul_date, istanbul_to_utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use super::non_empty;
use crate::db;
use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::AdminGuard;

const DEFAULT_RANGE_DAYS: i64 = 30;
const MAX_RANGE_DAYS: i64 = 366;
const TOP_PRODUCTS: usize = 10;

#[derive(Deserialize, Debug)]
pub struct SalesReportQuery {
  pub from: Option<String>,
  pub to: Option<String>,
}

fn parse_day(raw: &str, field: &str) -> Result<NaiveDate, AppError> {
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .map_err(|_| AppError::Validation(format!("'{}' tarihi YYYY-AA-GG biçiminde olmalıdır.", field)))
}

/// Inclusive Istanbul date range, defaulting to the last 30 days.
pub(crate) fn resolve_range(query: &SalesReportQuery, today: NaiveDate) -> Result<(NaiveDate, NaiveDate), AppError> {
  let to = match non_empty(&query.to) {
    Some(raw) => parse_day(raw, "to")?,
    None => today,
  };
  let from = match non_empty(&query.from) {
    Some(raw) => parse_day(raw, "from")?,
    None => to - Duration::days(DEFAULT_RANGE_DAYS - 1),
  };
  if from > to {
    return Err(AppError::Validation("Başlangıç tarihi bitiş tarihinden sonra olamaz.".to_string()));
  }
  if (to - from).num_days() >= MAX_RANGE_DAYS {
    return Err(AppError::Validation(format!(
      "Rapor aralığı en fazla {} gün olabilir.",
      MAX_RANGE_DAYS
    )));
  }
  Ok((from, to))
}

#[instrument(name = "handler::sales_report", skip(app_state), err(Display))]
pub async fn sales_report_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  query: web::Query<SalesReportQuery>,
) -> Result<HttpResponse, AppError> {
  let (from, to) = resolve_range(&query, istanbul_date(Utc::now()))?;
  let invalid_range = || AppError::Validation("Geçersiz tarih aralığı.".to_string());
  let start = istanbul_to_utc(from, NaiveTime::default()).ok_or_else(invalid_range)?;
  let end = to
    .succ_opt()
    .and_then(|next_day| istanbul_to_utc(next_day, NaiveTime::default()))
    .ok_or_else(invalid_range)?;

  let orders = db::orders::orders_created_between(&app_state.db_pool, start, end).await?;
  let report = build_sales_report(&orders, from, to, TOP_PRODUCTS);
  info!(%from, %to, orders = orders.len(), "Sales report built.");
  Ok(HttpResponse::Ok().json(json!({ "success": true, "report": report })))
}

#[cfg(test)]
mod tests {
  use super::*;

  fn query(from: Option<&str>, to: Option<&str>) -> SalesReportQuery {
    SalesReportQuery {
      from: from.map(str::to_string),
      to: to.map(str::to_string),
    }
  }

  #[test]
  fn range_defaults_to_last_thirty_days() {
    let today = NaiveDate::from_ymd_opt(2025, 3, 31).expect("valid date");
    let (from, to) = resolve_range(&query(None, None), today).expect("valid range");
    assert_eq!(to, today);
    assert_eq!(from, NaiveDate::from_ymd_opt(2025, 3, 2).expect("valid date"));
  }

  #[test]
  fn inverted_or_malformed_ranges_are_rejected() {
    let today = NaiveDate::from_ymd_opt(2025, 3, 31).expect("valid date");
    assert!(resolve_range(&query(Some("2025-03-10"), Some("2025-03-01")), today).is_err());
    assert!(resolve_range(&query(Some("10.03.2025"), None), today).is_err());
    assert!(resolve_range(&query(Some("2023-01-01"), Some("2025-01-01")), today).is_err());
  }
}
