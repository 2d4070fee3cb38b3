// storefront/src/web/handlers/customer_handlers.rs

use actix_web::{web, HttpResponse};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;

use super::{non_empty, PageQuery};
use crate::db;
use crate::errors::AppError;
use crate::models::order::OrderSummary;
use crate::state::AppState;
use crate::web::extractors::{AdminGuard, CustomerSession};

#[derive(Deserialize, Debug)]
pub struct ListCustomersQuery {
  pub q: Option<String>,
  pub page: Option<i64>,
  pub limit: Option<i64>,
}

#[instrument(name = "handler::list_customers", skip(app_state), err(Display))]
pub async fn list_customers_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  query: web::Query<ListCustomersQuery>,
) -> Result<HttpResponse, AppError> {
  let paging = PageQuery {
    page: query.page,
    limit: query.limit,
  };
  let customers =
    db::customers::list_customers(&app_state.db_pool, non_empty(&query.q), paging.limit(), paging.offset()).await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "customers": customers,
    "page": paging.page(),
    "limit": paging.limit(),
  })))
}

/// Orders of the signed-in customer, including guest orders placed with the same email.
#[instrument(name = "handler::my_orders", skip(app_state, session), fields(customer_id = %session.customer_id), err(Display))]
pub async fn my_orders_handler(session: CustomerSession, app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let orders = db::orders::orders_for_customer(&app_state.db_pool, session.customer_id, &session.email).await?;
  let summaries: Vec<OrderSummary> = orders.iter().map(OrderSummary::from).collect();
  Ok(HttpResponse::Ok().json(json!({ "success": true, "orders": summaries })))
}
