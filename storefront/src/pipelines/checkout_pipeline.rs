// storefront/src/pipelines/checkout_pipeline.rs

use crate::db;
use crate::errors::{AppError, Result as AppResult};
use crate::pipelines::common_steps;
use crate::pipelines::contexts::{CheckoutCtxData, CheckoutItemInput};
use crate::services::email;
use florist::coupon::CouponRejection;
use florist::delivery::{parse_delivery_date, validate_delivery_date};
use florist::order::{delivery_fee_for, price_order, CustomerContact, LineItem, Payment};
use florist::otp::normalize_email;
use florist::time::istanbul_date;
use florist::{Coupon, ContextData, Order, Pipeline, StepControl};
use sqlx::types::Json;
use std::collections::HashMap;
use tracing::{event, info, instrument, warn, Level};
use uuid::Uuid;

pub const MAX_LINE_ITEMS: usize = 50;
pub const MAX_QUANTITY: i32 = 99;
const MAX_CARD_MESSAGE_LEN: usize = 500;

pub fn build_checkout_pipeline() -> Pipeline<CheckoutCtxData, AppError> {
  let mut p = Pipeline::<CheckoutCtxData, AppError>::new(
    "checkout",
    &[
      ("validate_input", false),
      ("validate_delivery_date", false),
      ("price_items", false),
      ("apply_coupon", false),
      ("calculate_totals", false),
      ("assign_order_number", false),
      ("start_payment", false),
      ("persist_order", false),
      ("send_confirmation_email", true),
    ],
  );

  p.on("validate_input", validate_input);
  p.on("validate_delivery_date", validate_delivery);
  p.on("price_items", price_items);
  p.on("apply_coupon", apply_coupon);
  p.skip_if("apply_coupon", |data: &CheckoutCtxData| {
    data.request.coupon_code.as_deref().map_or(true, |c| c.trim().is_empty())
  });
  p.on("calculate_totals", calculate_totals);
  p.on("assign_order_number", assign_order_number);
  p.on("start_payment", start_payment);
  p.skip_if("start_payment", |data: &CheckoutCtxData| !data.request.payment_method.uses_gateway());
  p.on("persist_order", persist_order);
  p.on("send_confirmation_email", send_confirmation_email);
  p
}

fn require(value: &str, message: &str) -> AppResult<()> {
  if value.trim().is_empty() {
    return Err(AppError::Validation(message.to_string()));
  }
  Ok(())
}

#[instrument(name = "checkout::validate_input", skip_all, err(Display))]
async fn validate_input(ctx: ContextData<CheckoutCtxData>) -> AppResult<StepControl> {
  let request = ctx.read().request.clone();

  require(&request.customer.name, "Ad soyad zorunludur.")?;
  require(&request.customer.phone, "Telefon numarası zorunludur.")?;
  let email = normalize_email(&request.customer.email);
  if !email.contains('@') || email.starts_with('@') || email.ends_with('@') {
    return Err(AppError::Validation("Geçerli bir e-posta adresi girin.".to_string()));
  }

  if request.items.is_empty() {
    return Err(AppError::Validation("Sepetiniz boş.".to_string()));
  }
  if request.items.len() > MAX_LINE_ITEMS {
    return Err(AppError::Validation("Sepette çok fazla ürün var.".to_string()));
  }
  if request.items.iter().any(|i| !(1..=MAX_QUANTITY).contains(&i.quantity)) {
    return Err(quantity_error());
  }

  let delivery = &request.delivery;
  require(&delivery.address, "Teslimat adresi zorunludur.")?;
  require(&delivery.city, "Şehir zorunludur.")?;
  require(&delivery.time_slot, "Teslimat saat aralığı zorunludur.")?;
  require(&delivery.recipient_name, "Alıcı adı zorunludur.")?;
  require(&delivery.recipient_phone, "Alıcı telefonu zorunludur.")?;
  if delivery
    .card_message
    .as_deref()
    .is_some_and(|m| m.chars().count() > MAX_CARD_MESSAGE_LEN)
  {
    return Err(AppError::Validation(format!(
      "Kart mesajı en fazla {} karakter olabilir.",
      MAX_CARD_MESSAGE_LEN
    )));
  }

  ctx.write().request.customer.email = email;
  Ok(StepControl::Continue)
}

#[instrument(name = "checkout::validate_delivery_date", skip_all, err(Display))]
async fn validate_delivery(ctx: ContextData<CheckoutCtxData>) -> AppResult<StepControl> {
  let (raw_date, now, blackout) = {
    let guard = ctx.read();
    (
      guard.request.delivery.delivery_date.clone(),
      guard.now,
      guard.app_state.config.blackout_dates.clone(),
    )
  };

  let date = parse_delivery_date(&raw_date).map_err(florist::FloristError::from)?;
  validate_delivery_date(date, istanbul_date(now), &blackout).map_err(florist::FloristError::from)?;

  let mut guard = ctx.write();
  guard.delivery_date = Some(date);
  // Store the canonical form.
  guard.request.delivery.delivery_date = date.format("%Y-%m-%d").to_string();
  Ok(StepControl::Continue)
}

#[derive(sqlx::FromRow)]
struct PricedProduct {
  id: Uuid,
  name: String,
  price: i64,
  image_urls: Json<Vec<String>>,
  active: bool,
}

fn quantity_error() -> AppError {
  AppError::Validation(format!("Ürün adedi 1 ile {} arasında olmalıdır.", MAX_QUANTITY))
}

/// Builds priced lines, merging repeated lines for one product. The quantity
/// limit applies to the merged line.
fn merge_lines(requested: &[CheckoutItemInput], products: &HashMap<Uuid, PricedProduct>) -> AppResult<Vec<LineItem>> {
  let mut items: Vec<LineItem> = Vec::with_capacity(requested.len());
  for line in requested {
    let product = products
      .get(&line.product_id)
      .filter(|p| p.active)
      .ok_or_else(|| AppError::Validation("Sepetteki bir ürün artık satışta değil.".to_string()))?;
    match items.iter_mut().find(|i| i.product_id == product.id) {
      Some(existing) => {
        existing.quantity = existing
          .quantity
          .checked_add(line.quantity)
          .filter(|q| *q <= MAX_QUANTITY)
          .ok_or_else(quantity_error)?;
      }
      None => items.push(LineItem {
        product_id: product.id,
        name: product.name.clone(),
        unit_price: product.price,
        quantity: line.quantity,
        image_url: product.image_urls.0.first().cloned(),
      }),
    }
  }
  Ok(items)
}

/// Prices every line from the catalogue; client-sent prices are never used.
#[instrument(name = "checkout::price_items", skip_all, err(Display))]
async fn price_items(ctx: ContextData<CheckoutCtxData>) -> AppResult<StepControl> {
  let (requested, pool) = {
    let guard = ctx.read();
    (guard.request.items.clone(), guard.app_state.db_pool.clone())
  };

  let ids: Vec<Uuid> = requested.iter().map(|i| i.product_id).collect();
  let products: HashMap<Uuid, PricedProduct> =
    sqlx::query_as::<_, PricedProduct>("SELECT id, name, price, image_urls, active FROM products WHERE id = ANY($1)")
      .bind(&ids)
      .fetch_all(&pool)
      .await?
      .into_iter()
      .map(|p| (p.id, p))
      .collect();

  let items = merge_lines(&requested, &products)?;

  let subtotal = price_order(&items, 0, 0)?.subtotal;
  event!(Level::DEBUG, lines = items.len(), subtotal, "Items priced.");

  let mut guard = ctx.write();
  guard.items = items;
  guard.subtotal = subtotal;
  Ok(StepControl::Continue)
}

#[instrument(name = "checkout::apply_coupon", skip_all, err(Display))]
async fn apply_coupon(ctx: ContextData<CheckoutCtxData>) -> AppResult<StepControl> {
  let (code, subtotal, now, pool) = {
    let guard = ctx.read();
    (
      guard.request.coupon_code.clone().unwrap_or_default(),
      guard.subtotal,
      guard.now,
      guard.app_state.db_pool.clone(),
    )
  };

  let row = db::coupons::find_by_code(&pool, &code)
    .await?
    .ok_or_else(|| AppError::Validation(CouponRejection::NotFound.to_string()))?;
  let coupon = Coupon::try_from(&row).map_err(|e| AppError::Validation(e.to_string()))?;
  let discount = coupon.quote(subtotal, now).map_err(florist::FloristError::from)?;
  info!(code = %coupon.code, discount, "Coupon applied.");

  let mut guard = ctx.write();
  guard.coupon_code = Some(coupon.code);
  guard.discount = discount;
  Ok(StepControl::Continue)
}

#[instrument(name = "checkout::calculate_totals", skip_all, err(Display))]
async fn calculate_totals(ctx: ContextData<CheckoutCtxData>) -> AppResult<StepControl> {
  let mut guard = ctx.write();
  let config = guard.app_state.config.clone();
  let discounted = guard.subtotal - guard.discount.clamp(0, guard.subtotal);
  let fee = delivery_fee_for(discounted, config.delivery_fee, config.free_delivery_threshold);
  let totals = price_order(&guard.items, guard.discount, fee)?;
  guard.totals = Some(totals);
  Ok(StepControl::Continue)
}

#[instrument(name = "checkout::assign_order_number", skip_all, err(Display))]
async fn assign_order_number(ctx: ContextData<CheckoutCtxData>) -> AppResult<StepControl> {
  let pool = ctx.read().app_state.db_pool.clone();
  let number = db::orders::next_order_number(&pool).await?;
  ctx.write().order_number = Some(number);
  Ok(StepControl::Continue)
}

#[instrument(name = "checkout::start_payment", skip_all, err(Display))]
async fn start_payment(ctx: ContextData<CheckoutCtxData>) -> AppResult<StepControl> {
  let (gateway, order_id, total) = {
    let guard = ctx.read();
    (
      guard.app_state.payments.clone(),
      guard.order_id,
      guard.totals.map(|t| t.total).unwrap_or_default(),
    )
  };
  let payment = gateway
    .create_payment(order_id, total)
    .await
    .map_err(|e| AppError::Payment(format!("Ödeme başlatılamadı: {}", e)))?;

  let mut guard = ctx.write();
  guard.payment_token = Some(payment.token);
  guard.payment_redirect_url = payment.redirect_url;
  Ok(StepControl::Continue)
}

/// Inserts the order and counts the coupon use in one transaction.
#[instrument(name = "checkout::persist_order", skip_all, err(Display))]
async fn persist_order(ctx: ContextData<CheckoutCtxData>) -> AppResult<StepControl> {
  let (order, pool) = {
    let guard = ctx.read();
    let totals = guard
      .totals
      .ok_or_else(|| AppError::Internal("Totals missing before persisting the order.".to_string()))?;
    let order_number = guard
      .order_number
      .ok_or_else(|| AppError::Internal("Order number missing before persisting the order.".to_string()))?;
    let request = &guard.request;
    let mut payment = Payment::new(request.payment_method);
    payment.token = guard.payment_token.clone();

    let order = Order::place(
      guard.order_id,
      order_number,
      CustomerContact {
        customer_id: guard.customer_id,
        name: request.customer.name.trim().to_string(),
        email: request.customer.email.clone(),
        phone: request.customer.phone.trim().to_string(),
      },
      guard.items.clone(),
      request.delivery.clone(),
      payment,
      totals,
      guard.coupon_code.clone(),
      request.notes.clone().filter(|n| !n.trim().is_empty()),
      guard.now,
    );
    (order, guard.app_state.db_pool.clone())
  };

  let mut tx = pool.begin().await?;
  db::orders::insert_order(&mut tx, &order).await?;
  if let Some(code) = &order.coupon_code {
    if !db::coupons::consume(&mut tx, code).await? {
      warn!(%code, "Coupon could not be consumed; rolling back order.");
      tx.rollback().await?;
      return Err(AppError::Validation(CouponRejection::UsageLimitReached.to_string()));
    }
  }
  tx.commit().await?;

  info!(order_id = %order.id, order_number = order.order_number, status = %order.status, "Order placed.");
  ctx.write().order = Some(order);
  Ok(StepControl::Continue)
}

#[instrument(name = "checkout::send_confirmation_email", skip_all, err(Display))]
async fn send_confirmation_email(ctx: ContextData<CheckoutCtxData>) -> AppResult<StepControl> {
  let (app_state, order) = {
    let guard = ctx.read();
    (guard.app_state.clone(), guard.order.clone())
  };
  let Some(order) = order else {
    return Ok(StepControl::Continue);
  };

  let message = email::order_confirmation_email(&order, &app_state.config.site_base_url);
  common_steps::send_email(&app_state, &message).await?;
  ctx.write().confirmation_email_sent = true;
  Ok(StepControl::Continue)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn checkout_steps_are_declared_in_order() {
    let pipeline = build_checkout_pipeline();
    assert_eq!(
      pipeline.step_names(),
      vec![
        "validate_input",
        "validate_delivery_date",
        "price_items",
        "apply_coupon",
        "calculate_totals",
        "assign_order_number",
        "start_payment",
        "persist_order",
        "send_confirmation_email",
      ]
    );
  }

  fn rose(id: Uuid) -> PricedProduct {
    PricedProduct {
      id,
      name: "Kırmızı Gül Buketi".to_string(),
      price: 89_900,
      image_urls: Json(vec!["/img/gul.jpg".to_string()]),
      active: true,
    }
  }

  #[test]
  fn repeated_lines_merge_within_the_quantity_limit() {
    let id = Uuid::new_v4();
    let products = HashMap::from([(id, rose(id))]);
    let line = |quantity| CheckoutItemInput { product_id: id, quantity };

    let items = merge_lines(&[line(40), line(59)], &products).expect("within limit");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].quantity, MAX_QUANTITY);
    assert_eq!(items[0].image_url.as_deref(), Some("/img/gul.jpg"));

    let err = merge_lines(&[line(MAX_QUANTITY), line(MAX_QUANTITY)], &products).unwrap_err();
    assert!(matches!(err, AppError::Validation(msg) if msg.contains("99")));
  }

  #[test]
  fn inactive_or_unknown_products_are_refused() {
    let id = Uuid::new_v4();
    let mut retired = rose(id);
    retired.active = false;
    let products = HashMap::from([(id, retired)]);
    let unknown = CheckoutItemInput { product_id: Uuid::new_v4(), quantity: 1 };
    assert!(merge_lines(&[CheckoutItemInput { product_id: id, quantity: 1 }], &products).is_err());
    assert!(merge_lines(&[unknown], &products).is_err());
  }
}
