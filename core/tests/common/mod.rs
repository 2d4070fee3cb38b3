// tests/common/mod.rs
#![allow(dead_code)] // Not every test binary uses every helper

use chrono::{DateTime, TimeZone, Utc};
use florist::order::{CustomerContact, Delivery, LineItem, Order, Payment, PaymentMethod};
use florist::order::price_order;
use florist::{ContextData, StepControl, WorkflowError};
use once_cell::sync::Lazy;
use tracing::Level;
use uuid::Uuid;

pub const OTP_SECRET: &[u8] = b"test-otp-secret";
pub const SESSION_SECRET: &[u8] = b"test-session-secret";

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
  Utc.with_ymd_and_hms(y, m, d, h, min, 0).single().expect("valid test timestamp")
}

// --- Workflow fixtures ---
#[derive(Clone, Debug, Default)]
pub struct TestContext {
  pub counter: i32,
  pub steps_executed: Vec<String>,
  pub should_stop_at: Option<String>,
}

#[derive(Debug, thiserror::Error, Clone, PartialEq, Eq)]
pub enum TestError {
  #[error("Workflow error: {0}")]
  Workflow(String),

  #[error("Test handler failed: {0}")]
  Handler(String),
}

impl From<WorkflowError> for TestError {
  fn from(err: WorkflowError) -> Self {
    TestError::Workflow(err.to_string())
  }
}

pub fn record_step(ctx: &ContextData<TestContext>, step_name: &str) -> StepControl {
  let mut guard = ctx.write();
  guard.counter += 1;
  guard.steps_executed.push(step_name.to_string());
  match &guard.should_stop_at {
    Some(stop_at) if stop_at == step_name => StepControl::Stop,
    _ => StepControl::Continue,
  }
}

// --- Order fixtures ---
pub fn sample_item(name: &str, unit_price: i64, quantity: i32) -> LineItem {
  LineItem {
    product_id: Uuid::new_v4(),
    name: name.to_string(),
    unit_price,
    quantity,
    image_url: None,
  }
}

pub fn sample_order(method: PaymentMethod, delivery_date: &str, created_at: DateTime<Utc>) -> Order {
  let items = vec![sample_item("Kırmızı Gül Buketi", 75_000, 1), sample_item("Vazo", 15_000, 2)];
  let totals = price_order(&items, 0, 4_990).expect("valid items");
  Order::place(
    Uuid::new_v4(),
    100_001,
    CustomerContact {
      customer_id: None,
      name: "Ayşe Yılmaz".to_string(),
      email: "ayse@example.com".to_string(),
      phone: "+905551112233".to_string(),
    },
    items,
    Delivery {
      delivery_date: delivery_date.to_string(),
      time_slot: "12:00-15:00".to_string(),
      address: "Bağdat Cd. No:1".to_string(),
      district: Some("Kadıköy".to_string()),
      city: "İstanbul".to_string(),
      recipient_name: "Mehmet Demir".to_string(),
      recipient_phone: "+905554445566".to_string(),
      card_message: Some("İyi ki doğdun!".to_string()),
    },
    Payment::new(method),
    totals,
    None,
    None,
    created_at,
  )
}

// --- Helper for Tracing Setup ---
static TRACING_INIT: Lazy<()> = Lazy::new(|| {
  tracing_subscriber::fmt()
    .with_max_level(Level::DEBUG)
    .with_test_writer()
    .try_init()
    .ok();
});

pub fn setup_tracing() {
  Lazy::force(&TRACING_INIT);
}
