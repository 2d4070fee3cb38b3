// storefront/src/pipelines/contexts.rs

//! Data threaded through each workflow run, wrapped in `florist::ContextData`
//! by the handlers that start them.

use crate::models::Customer;
use crate::state::AppState;
use chrono::{DateTime, NaiveDate, Utc};
use florist::order::{Delivery, LineItem, PaymentMethod};
use florist::{Order, OrderTotals};
use serde::Deserialize;
use uuid::Uuid;

// --- Checkout ---

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactInput {
  pub name: String,
  pub email: String,
  pub phone: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutItemInput {
  pub product_id: Uuid,
  pub quantity: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutRequest {
  pub customer: ContactInput,
  pub items: Vec<CheckoutItemInput>,
  pub delivery: Delivery,
  pub payment_method: PaymentMethod,
  #[serde(default)]
  pub coupon_code: Option<String>,
  #[serde(default)]
  pub notes: Option<String>,
}

#[derive(Clone)]
pub struct CheckoutCtxData {
  pub app_state: AppState,
  pub request: CheckoutRequest,
  /// Set when the buyer is signed in.
  pub customer_id: Option<Uuid>,
  pub now: DateTime<Utc>,
  pub order_id: Uuid,

  // Populated by the pipeline:
  pub delivery_date: Option<NaiveDate>,
  pub items: Vec<LineItem>,
  pub subtotal: i64,
  pub coupon_code: Option<String>,
  pub discount: i64,
  pub totals: Option<OrderTotals>,
  pub order_number: Option<i64>,
  pub payment_token: Option<String>,
  pub payment_redirect_url: Option<String>,
  pub order: Option<Order>,
  pub confirmation_email_sent: bool,
}

impl CheckoutCtxData {
  pub fn new(app_state: AppState, request: CheckoutRequest, customer_id: Option<Uuid>, now: DateTime<Utc>) -> Self {
    Self {
      app_state,
      request,
      customer_id,
      now,
      order_id: Uuid::new_v4(),
      delivery_date: None,
      items: Vec::new(),
      subtotal: 0,
      coupon_code: None,
      discount: 0,
      totals: None,
      order_number: None,
      payment_token: None,
      payment_redirect_url: None,
      order: None,
      confirmation_email_sent: false,
    }
  }
}

// --- Cancellation ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelActor {
  Customer(Uuid),
  Admin,
}

#[derive(Clone)]
pub struct CancelCtxData {
  pub app_state: AppState,
  pub order_id: Uuid,
  pub reason: Option<String>,
  pub actor: CancelActor,
  pub now: DateTime<Utc>,

  pub order: Option<Order>,
  pub notification_sent: bool,
}

impl CancelCtxData {
  pub fn new(app_state: AppState, order_id: Uuid, reason: Option<String>, actor: CancelActor, now: DateTime<Utc>) -> Self {
    Self {
      app_state,
      order_id,
      reason,
      actor,
      now,
      order: None,
      notification_sent: false,
    }
  }
}

// --- Registration ---

#[derive(Clone)]
pub struct RegisterCtxData {
  pub app_state: AppState,
  pub email: String,
  pub name: String,
  pub phone: Option<String>,
  pub password: Option<String>,
  pub now: DateTime<Utc>,

  pub customer: Option<Customer>,
  pub welcome_email_sent: bool,
}

impl RegisterCtxData {
  pub fn new(
    app_state: AppState,
    email: String,
    name: String,
    phone: Option<String>,
    password: Option<String>,
    now: DateTime<Utc>,
  ) -> Self {
    Self {
      app_state,
      email,
      name,
      phone,
      password,
      now,
      customer: None,
      welcome_email_sent: false,
    }
  }
}
