// storefront/src/web/handlers/order_handlers.rs

use actix_web::{web, HttpResponse};
use chrono::Utc;
use florist::order::PaymentMethod;
use florist::{ContextData, OrderStatus, TimelineSource};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, instrument, warn};
use uuid::Uuid;

use super::{non_empty, PageQuery};
use crate::db;
use crate::errors::AppError;
use crate::models::order::OrderSummary;
use crate::pipelines::common_steps::notify_best_effort;
use crate::pipelines::contexts::{CancelActor, CancelCtxData, CheckoutCtxData, CheckoutRequest};
use crate::services::email;
use crate::state::AppState;
use crate::web::extractors::{AdminGuard, CustomerSession, Viewer};

fn order_not_found() -> AppError {
  AppError::NotFound("Sipariş bulunamadı.".to_string())
}

/// Places an order for a guest or a signed-in customer.
#[instrument(
  name = "handler::create_order",
  skip(app_state, session, payload),
  fields(items = payload.items.len(), payment_method = ?payload.payment_method),
  err(Display)
)]
pub async fn create_order_handler(
  app_state: web::Data<AppState>,
  session: Option<CustomerSession>,
  payload: web::Json<CheckoutRequest>,
) -> Result<HttpResponse, AppError> {
  let ctx_data = CheckoutCtxData::new(
    app_state.get_ref().clone(),
    payload.into_inner(),
    session.map(|s| s.customer_id),
    Utc::now(),
  );
  let ctx = ContextData::new(ctx_data);

  let outcome = app_state.workflows.checkout.run(ctx.clone()).await?;
  if !outcome.is_completed() {
    return Err(AppError::Internal("Checkout workflow stopped before completing.".to_string()));
  }

  let guard = ctx.read();
  let order = guard
    .order
    .clone()
    .ok_or_else(|| AppError::Internal("Checkout completed without an order.".to_string()))?;
  info!(order_id = %order.id, order_number = order.order_number, "Order placed.");
  Ok(HttpResponse::Created().json(json!({
    "success": true,
    "order": order,
    "paymentUrl": guard.payment_redirect_url,
    "confirmationEmailSent": guard.confirmation_email_sent,
  })))
}

#[derive(Deserialize, Debug)]
pub struct ListOrdersQuery {
  pub status: Option<String>,
  pub page: Option<i64>,
  pub limit: Option<i64>,
}

#[instrument(name = "handler::list_orders", skip(app_state), err(Display))]
pub async fn list_orders_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  query: web::Query<ListOrdersQuery>,
) -> Result<HttpResponse, AppError> {
  let status = non_empty(&query.status)
    .map(str::parse::<OrderStatus>)
    .transpose()?;
  let paging = PageQuery {
    page: query.page,
    limit: query.limit,
  };
  let orders = db::orders::list_orders(&app_state.db_pool, status, paging.limit(), paging.offset()).await?;
  let total = db::orders::count_orders(&app_state.db_pool, status).await?;
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "orders": orders,
    "total": total,
    "page": paging.page(),
    "limit": paging.limit(),
  })))
}

#[instrument(name = "handler::get_order", skip(app_state, viewer), err(Display))]
pub async fn get_order_handler(
  viewer: Viewer,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let order = db::orders::fetch_order(&app_state.db_pool, path.into_inner())
    .await?
    .ok_or_else(order_not_found)?;
  if let Viewer::Customer(session) = &viewer {
    let owns = match order.customer.customer_id {
      Some(owner) => owner == session.customer_id,
      None => order.customer.email.eq_ignore_ascii_case(&session.email),
    };
    if !owns {
      // Same answer as a missing order.
      return Err(order_not_found());
    }
  }
  Ok(HttpResponse::Ok().json(json!({ "success": true, "order": order })))
}

#[derive(Deserialize, Debug)]
pub struct StatusUpdatePayload {
  pub status: String,
  #[serde(default)]
  pub note: Option<String>,
}

/// Admin status change. Cancellation and refunds have their own routes.
#[instrument(name = "handler::update_order_status", skip(app_state), err(Display))]
pub async fn update_order_status_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: web::Json<StatusUpdatePayload>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let next: OrderStatus = payload.status.parse()?;
  match next {
    OrderStatus::Cancelled => {
      return Err(AppError::Validation(
        "İptal için /cancel uç noktasını kullanın.".to_string(),
      ))
    }
    OrderStatus::Refunded => {
      return Err(AppError::Validation(
        "İade için /refund uç noktasını kullanın.".to_string(),
      ))
    }
    _ => {}
  }

  let now = Utc::now();
  let mut tx = app_state.db_pool.begin().await?;
  let mut order = db::orders::fetch_order_for_update(&mut tx, order_id)
    .await?
    .ok_or_else(order_not_found)?;
  let previous = order.status;

  // Confirming a bank transfer means the money arrived.
  if previous == OrderStatus::Pending
    && next == OrderStatus::Confirmed
    && order.payment.method == PaymentMethod::BankTransfer
  {
    order.mark_paid(now)?;
  } else {
    let note = payload
      .note
      .clone()
      .unwrap_or_else(|| format!("Durum '{}' olarak güncellendi.", next));
    order.transition_to(next, note, TimelineSource::Admin, now)?;
  }

  if !db::orders::update_order_state(&mut tx, &order, previous).await? {
    tx.rollback().await?;
    return Err(AppError::Conflict(
      "Sipariş durumu değişti, lütfen tekrar deneyin.".to_string(),
    ));
  }
  tx.commit().await?;
  info!(%order_id, from = %previous, to = %order.status, "Order status updated by admin.");

  notify_best_effort(&app_state, email::status_update_email(&order)).await;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "order": order })))
}

#[derive(Deserialize, Debug, Default)]
pub struct CancelPayload {
  #[serde(default)]
  pub reason: Option<String>,
}

/// Cancels and archives an order. Customers may cancel their own orders
/// until preparation starts; admins may cancel any non-terminal order.
#[instrument(name = "handler::cancel_order", skip(app_state, viewer, payload), err(Display))]
pub async fn cancel_order_handler(
  viewer: Viewer,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: Option<web::Json<CancelPayload>>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let reason = payload
    .map(|p| p.into_inner())
    .unwrap_or_default()
    .reason
    .map(|r| r.trim().to_string())
    .filter(|r| !r.is_empty());
  let actor = match viewer {
    Viewer::Admin => CancelActor::Admin,
    Viewer::Customer(session) => CancelActor::Customer(session.customer_id),
  };

  let ctx = ContextData::new(CancelCtxData::new(
    app_state.get_ref().clone(),
    order_id,
    reason,
    actor,
    Utc::now(),
  ));
  app_state.workflows.cancel_order.run(ctx.clone()).await?;

  let guard = ctx.read();
  Ok(HttpResponse::Ok().json(json!({
    "success": true,
    "order": guard.order,
    "notificationSent": guard.notification_sent,
  })))
}

#[derive(Deserialize, Debug, Default)]
pub struct RefundPayload {
  #[serde(default)]
  pub note: Option<String>,
}

#[instrument(name = "handler::refund_order", skip(app_state, payload), err(Display))]
pub async fn refund_order_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
  payload: Option<web::Json<RefundPayload>>,
) -> Result<HttpResponse, AppError> {
  let order_id = path.into_inner();
  let note = payload
    .and_then(|p| p.into_inner().note)
    .unwrap_or_else(|| "Ödeme iade edildi.".to_string());

  let order = db::orders::fetch_order(&app_state.db_pool, order_id)
    .await?
    .ok_or_else(order_not_found)?;
  if !order.is_paid() || !order.status.can_transition_to(OrderStatus::Refunded) {
    return Err(AppError::Validation("Yalnızca ödemesi alınmış siparişler iade edilebilir.".to_string()));
  }
  if let Some(token) = order.payment.token.as_deref() {
    app_state
      .payments
      .refund(token, order.totals.total)
      .await
      .map_err(|e| AppError::Payment(format!("İade işlemi başarısız: {}", e)))?;
  }

  let now = Utc::now();
  let mut tx = app_state.db_pool.begin().await?;
  let mut locked = db::orders::fetch_order_for_update(&mut tx, order_id)
    .await?
    .ok_or_else(order_not_found)?;
  let previous = locked.status;
  locked.mark_refunded(note, now)?;
  if !db::orders::update_order_state(&mut tx, &locked, previous).await? {
    tx.rollback().await?;
    warn!(%order_id, "Refund issued at the gateway but the order changed concurrently.");
    return Err(AppError::Conflict(
      "Sipariş durumu değişti, lütfen tekrar deneyin.".to_string(),
    ));
  }
  tx.commit().await?;
  info!(%order_id, amount = locked.totals.total, "Order refunded.");

  notify_best_effort(&app_state, email::status_update_email(&locked)).await;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "order": locked })))
}

#[instrument(name = "handler::list_deleted_orders", skip(app_state), err(Display))]
pub async fn list_deleted_orders_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  query: web::Query<PageQuery>,
) -> Result<HttpResponse, AppError> {
  let deleted = db::orders::list_deleted(&app_state.db_pool, query.limit(), query.offset()).await?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "deletedOrders": deleted })))
}

/// Puts an archived order back into `orders` with the status it had before it was cancelled.
#[instrument(name = "handler::restore_deleted_order", skip(app_state), err(Display))]
pub async fn restore_deleted_order_handler(
  _admin: AdminGuard,
  app_state: web::Data<AppState>,
  path: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
  let deleted_id = path.into_inner();
  let now = Utc::now();

  let mut tx = app_state.db_pool.begin().await?;
  let record = db::orders::take_deleted(&mut tx, deleted_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Silinmiş sipariş kaydı bulunamadı.".to_string()))?;
  let mut order = record.snapshot.0;
  let restored_status = order.reopen_after_cancellation("Sipariş geri yüklendi.", now)?;
  db::orders::insert_order(&mut tx, &order).await?;
  tx.commit().await?;

  info!(order_id = %order.id, status = %restored_status, "Deleted order restored.");
  Ok(HttpResponse::Ok().json(json!({ "success": true, "order": order })))
}

#[derive(Deserialize, Debug)]
pub struct TrackQuery {
  pub email: String,
}

/// Public order tracking by order number plus the email used at checkout.
#[instrument(name = "handler::track_order", skip(app_state, query), err(Display))]
pub async fn track_order_handler(
  app_state: web::Data<AppState>,
  path: web::Path<i64>,
  query: web::Query<TrackQuery>,
) -> Result<HttpResponse, AppError> {
  if query.email.trim().is_empty() {
    return Err(AppError::Validation("E-posta adresi zorunludur.".to_string()));
  }
  let order = db::orders::find_for_tracking(&app_state.db_pool, path.into_inner(), &query.email)
    .await?
    .ok_or_else(order_not_found)?;
  Ok(HttpResponse::Ok().json(json!({ "success": true, "order": OrderSummary::from(&order) })))
}
