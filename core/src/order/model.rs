// florist/src/order/model.rs
use super::pricing::OrderTotals;
use super::status::OrderStatus;
use super::timeline::{TimelineEntry, TimelineSource};
use crate::delivery::parse_delivery_date;
use crate::error::{FloristError, FloristResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineItem {
  pub product_id: Uuid,
  pub name: String,
  pub unit_price: i64,
  pub quantity: i32,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub image_url: Option<String>,
}

impl LineItem {
  pub fn line_total(&self) -> Option<i64> {
    self.unit_price.checked_mul(i64::from(self.quantity))
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerContact {
  #[serde(default)]
  pub customer_id: Option<Uuid>,
  pub name: String,
  pub email: String,
  pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
  /// `YYYY-MM-DD`, Istanbul calendar date.
  pub delivery_date: String,
  pub time_slot: String,
  pub address: String,
  #[serde(default)]
  pub district: Option<String>,
  pub city: String,
  pub recipient_name: String,
  pub recipient_phone: String,
  #[serde(default)]
  pub card_message: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
  Card,
  BankTransfer,
  CashOnDelivery,
}

impl PaymentMethod {
  /// Cash on delivery needs no payment confirmation, so those orders start confirmed.
  pub fn initial_order_status(self) -> OrderStatus {
    match self {
      PaymentMethod::CashOnDelivery => OrderStatus::Confirmed,
      PaymentMethod::Card | PaymentMethod::BankTransfer => OrderStatus::Pending,
    }
  }

  pub fn uses_gateway(self) -> bool {
    matches!(self, PaymentMethod::Card)
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
  Pending,
  Paid,
  Failed,
  Refunded,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Payment {
  pub method: PaymentMethod,
  pub status: PaymentStatus,
  #[serde(default)]
  pub token: Option<String>,
  #[serde(default)]
  pub paid_at: Option<DateTime<Utc>>,
  #[serde(default)]
  pub refunded_at: Option<DateTime<Utc>>,
}

impl Payment {
  pub fn new(method: PaymentMethod) -> Self {
    Self {
      method,
      status: PaymentStatus::Pending,
      token: None,
      paid_at: None,
      refunded_at: None,
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
  pub id: Uuid,
  pub order_number: i64,
  pub customer: CustomerContact,
  pub items: Vec<LineItem>,
  pub delivery: Delivery,
  pub payment: Payment,
  pub totals: OrderTotals,
  #[serde(default)]
  pub coupon_code: Option<String>,
  pub status: OrderStatus,
  #[serde(default)]
  pub timeline: Vec<TimelineEntry>,
  #[serde(default)]
  pub order_time_group: Option<String>,
  #[serde(default)]
  pub notes: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl Order {
  /// Builds a freshly placed order with its first timeline entry.
  #[allow(clippy::too_many_arguments)]
  pub fn place(
    id: Uuid,
    order_number: i64,
    customer: CustomerContact,
    items: Vec<LineItem>,
    delivery: Delivery,
    payment: Payment,
    totals: OrderTotals,
    coupon_code: Option<String>,
    notes: Option<String>,
    now: DateTime<Utc>,
  ) -> Self {
    let status = payment.method.initial_order_status();
    let first_note = match status {
      OrderStatus::Confirmed => "Sipariş alındı ve onaylandı.",
      _ => "Sipariş alındı, ödeme bekleniyor.",
    };
    Self {
      id,
      order_number,
      customer,
      items,
      delivery,
      payment,
      totals,
      coupon_code,
      status,
      timeline: vec![TimelineEntry::new(status, first_note, TimelineSource::Customer, now)],
      order_time_group: None,
      notes,
      created_at: now,
      updated_at: now,
    }
  }

  pub fn delivery_date(&self) -> FloristResult<NaiveDate> {
    Ok(parse_delivery_date(&self.delivery.delivery_date)?)
  }

  pub fn is_paid(&self) -> bool {
    self.payment.status == PaymentStatus::Paid
  }

  /// Moves the order to `next` and appends the matching timeline entry.
  pub fn transition_to(
    &mut self,
    next: OrderStatus,
    note: impl Into<String>,
    source: TimelineSource,
    now: DateTime<Utc>,
  ) -> FloristResult<()> {
    if !self.status.can_transition_to(next) {
      return Err(FloristError::InvalidTransition {
        from: self.status.to_string(),
        to: next.to_string(),
      });
    }
    self.status = next;
    self.timeline.push(TimelineEntry::new(next, note, source, now));
    self.updated_at = now;
    Ok(())
  }

  pub fn mark_paid(&mut self, now: DateTime<Utc>) -> FloristResult<()> {
    self.payment.status = PaymentStatus::Paid;
    self.payment.paid_at = Some(now);
    if self.status == OrderStatus::Pending {
      self.transition_to(OrderStatus::Confirmed, "Ödeme alındı.", TimelineSource::Payment, now)?;
    }
    self.updated_at = now;
    Ok(())
  }

  pub fn mark_payment_failed(&mut self, now: DateTime<Utc>) -> FloristResult<()> {
    self.payment.status = PaymentStatus::Failed;
    if !self.status.is_terminal() {
      self.transition_to(OrderStatus::Failed, "Ödeme başarısız.", TimelineSource::Payment, now)?;
    }
    self.updated_at = now;
    Ok(())
  }

  pub fn mark_refunded(&mut self, note: impl Into<String>, now: DateTime<Utc>) -> FloristResult<()> {
    if !self.is_paid() {
      return Err(FloristError::InvalidInput(
        "Only paid orders can be refunded.".to_string(),
      ));
    }
    self.transition_to(OrderStatus::Refunded, note, TimelineSource::Admin, now)?;
    self.payment.status = PaymentStatus::Refunded;
    self.payment.refunded_at = Some(now);
    Ok(())
  }

  /// Undoes a cancellation: the order returns to the status it held before it
  /// was cancelled, and the restore is recorded on the timeline.
  pub fn reopen_after_cancellation(&mut self, note: impl Into<String>, now: DateTime<Utc>) -> FloristResult<OrderStatus> {
    if self.status != OrderStatus::Cancelled {
      return Err(FloristError::InvalidTransition {
        from: self.status.to_string(),
        to: "restored".to_string(),
      });
    }
    let previous = self
      .timeline
      .iter()
      .rev()
      .map(|entry| entry.status)
      .find(|status| *status != OrderStatus::Cancelled)
      .unwrap_or_else(|| self.payment.method.initial_order_status());
    self.status = previous;
    self.timeline.push(TimelineEntry::new(previous, note, TimelineSource::Admin, now));
    self.updated_at = now;
    Ok(previous)
  }
}
