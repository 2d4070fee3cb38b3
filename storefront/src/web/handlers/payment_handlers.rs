// storefront/src/web/handlers/payment_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument};

use crate::automation::apply_gateway_status;
use crate::db;
use crate::errors::AppError;
use crate::pipelines::common_steps::notify_best_effort;
use crate::services::email;
use crate::state::AppState;

#[derive(Deserialize, Debug)]
pub struct PaymentCallbackPayload {
  pub token: String,
}

/// Gateway return / notification. Only the token is taken from the request;
/// the outcome comes from the gateway itself.
#[instrument(name = "handler::payment_callback", skip(app_state, payload), err(Display))]
pub async fn payment_callback_handler(
  app_state: web::Data<AppState>,
  payload: web::Json<PaymentCallbackPayload>,
) -> Result<HttpResponse, AppError> {
  let token = payload.token.trim();
  let order = db::orders::find_by_payment_token(&app_state.db_pool, token)
    .await?
    .ok_or_else(|| AppError::NotFound("Ödeme kaydı bulunamadı.".to_string()))?;

  let gateway_status = app_state
    .payments
    .fetch_status(token)
    .await
    .map_err(|e| AppError::Payment(format!("Ödeme durumu alınamadı: {}", e)))?;

  let current = match apply_gateway_status(&app_state, order.id, gateway_status, Utc::now()).await? {
    Some(updated) => {
      notify_best_effort(&app_state, email::status_update_email(&updated)).await;
      updated
    }
    None => order,
  };
  info!(order_id = %current.id, status = %current.status, "Payment callback handled.");
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "orderId": current.id,
    "orderNumber": current.order_number,
    "status": current.status,
    "paymentStatus": current.payment.status,
  })))
}
