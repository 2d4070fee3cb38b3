// storefront/src/pipelines/cancel_pipeline.rs

use crate::db;
use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::common_steps;
use crate::pipelines::contexts::{CancelActor, CancelCtxData};
use crate::services::email;
use florist::{ContextData, Order, OrderStatus, Pipeline, StepControl, TimelineSource};
use tracing::{info, instrument, warn};

pub fn build_cancel_pipeline() -> Pipeline<CancelCtxData, AppError> {
  let mut p = Pipeline::<CancelCtxData, AppError>::new(
    "cancel_order",
    &[("load_order", false), ("archive_order", false), ("notify_customer", true)],
  );
  p.on("load_order", load_order);
  p.on("archive_order", archive_order);
  p.on("notify_customer", notify_customer);
  p
}

/// Customers may only cancel their own orders before preparation starts.
fn customer_may_cancel(status: OrderStatus) -> bool {
  matches!(status, OrderStatus::Pending | OrderStatus::Confirmed)
}

/// Paid orders go through the refund route so the payment is returned.
fn ensure_unpaid(order: &Order) -> AppResult<()> {
  if order.is_paid() {
    warn!(order_id = %order.id, "Cancellation refused for a paid order.");
    return Err(AppError::Conflict(
      "Ödemesi alınmış sipariş iptal edilemez; iade işlemini kullanın.".to_string(),
    ));
  }
  Ok(())
}

#[instrument(name = "cancel::load_order", skip_all, err(Display))]
async fn load_order(ctx: ContextData<CancelCtxData>) -> AppResult<StepControl> {
  let (order_id, actor, pool) = {
    let guard = ctx.read();
    (guard.order_id, guard.actor, guard.app_state.db_pool.clone())
  };

  let order = db::orders::fetch_order(&pool, order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Sipariş bulunamadı.".to_string()))?;

  if let CancelActor::Customer(customer_id) = actor {
    if order.customer.customer_id != Some(customer_id) {
      return Err(AppError::Forbidden("Bu sipariş size ait değil.".to_string()));
    }
    if !customer_may_cancel(order.status) {
      return Err(AppError::Validation(
        "Hazırlanmaya başlanan siparişler iptal edilemez. Lütfen bizimle iletişime geçin.".to_string(),
      ));
    }
  }
  if !order.status.can_transition_to(OrderStatus::Cancelled) {
    return Err(AppError::Validation(format!(
      "'{}' durumundaki sipariş iptal edilemez.",
      order.status
    )));
  }
  ensure_unpaid(&order)?;

  ctx.write().order = Some(order);
  Ok(StepControl::Continue)
}

/// Marks the order cancelled and moves it to `deleted_orders` in one transaction.
#[instrument(name = "cancel::archive_order", skip_all, err(Display))]
async fn archive_order(ctx: ContextData<CancelCtxData>) -> AppResult<StepControl> {
  let (order_id, actor, reason, now, pool) = {
    let guard = ctx.read();
    (
      guard.order_id,
      guard.actor,
      guard.reason.clone(),
      guard.now,
      guard.app_state.db_pool.clone(),
    )
  };

  let mut tx = pool.begin().await?;
  let mut order = db::orders::fetch_order_for_update(&mut tx, order_id)
    .await?
    .ok_or_else(|| AppError::NotFound("Sipariş bulunamadı.".to_string()))?;
  let previous = order.status;
  // Payment may have landed since the order was loaded.
  if let Err(e) = ensure_unpaid(&order) {
    tx.rollback().await?;
    return Err(e);
  }

  let source = match actor {
    CancelActor::Customer(_) => TimelineSource::Customer,
    CancelActor::Admin => TimelineSource::Admin,
  };
  let note = reason.clone().unwrap_or_else(|| "Sipariş iptal edildi.".to_string());
  order.transition_to(OrderStatus::Cancelled, note, source, now)?;

  if !db::orders::archive_order(&mut tx, &order, previous, reason.as_deref(), now).await? {
    tx.rollback().await?;
    return Err(AppError::Conflict(
      "Sipariş durumu değişti, lütfen tekrar deneyin.".to_string(),
    ));
  }
  tx.commit().await?;

  info!(%order_id, previous = %previous, "Order cancelled and archived.");
  ctx.write().order = Some(order);
  Ok(StepControl::Continue)
}

#[instrument(name = "cancel::notify_customer", skip_all, err(Display))]
async fn notify_customer(ctx: ContextData<CancelCtxData>) -> AppResult<StepControl> {
  let (app_state, order, reason) = {
    let guard = ctx.read();
    (guard.app_state.clone(), guard.order.clone(), guard.reason.clone())
  };
  let Some(order) = order else {
    return Ok(StepControl::Continue);
  };

  let message = email::cancellation_email(&order, reason.as_deref());
  common_steps::send_email(&app_state, &message).await?;
  ctx.write().notification_sent = true;
  Ok(StepControl::Continue)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn customers_cannot_cancel_orders_in_preparation() {
    assert!(customer_may_cancel(OrderStatus::Pending));
    assert!(customer_may_cancel(OrderStatus::Confirmed));
    assert!(!customer_may_cancel(OrderStatus::Processing));
    assert!(!customer_may_cancel(OrderStatus::Shipped));
  }

  #[test]
  fn paid_orders_are_sent_to_the_refund_route() {
    use crate::automation::runner::tests::sample_order;
    use chrono::Utc;
    use florist::order::PaymentMethod;

    let now = Utc::now();
    let mut order = sample_order(PaymentMethod::Card, now, "2025-03-12");
    assert!(ensure_unpaid(&order).is_ok());

    order.mark_paid(now).expect("pending card order can be paid");
    let err = ensure_unpaid(&order).unwrap_err();
    assert!(matches!(err, AppError::Conflict(msg) if msg.contains("iade")));
  }
}
