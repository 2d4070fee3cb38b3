// storefront/src/web/handlers/cron_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde_json::json;
use tracing::instrument;

use crate::automation::{run_order_automation, verify_pending_payments};
use crate::errors::AppError;
use crate::state::AppState;
use crate::web::extractors::CronGuard;

#[instrument(name = "handler::cron_order_automation", skip_all, err(Display))]
pub async fn order_automation_handler(_cron: CronGuard, app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let report = run_order_automation(&app_state, Utc::now()).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "report": report })))
}

#[instrument(name = "handler::cron_verify_payments", skip_all, err(Display))]
pub async fn verify_payments_handler(_cron: CronGuard, app_state: web::Data<AppState>) -> Result<HttpResponse, AppError> {
  let report = verify_pending_payments(&app_state, Utc::now()).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "report": report })))
}
