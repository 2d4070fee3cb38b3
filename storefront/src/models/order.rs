// storefront/src/models/order.rs

use chrono::{DateTime, Utc};
use florist::order::{CustomerContact, Delivery, LineItem, Payment};
use florist::{FloristError, Order, OrderTotals, TimelineEntry};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;
use uuid::Uuid;

/// Column list matching [`OrderRow`].
pub const ORDER_COLUMNS: &str = "id, order_number, customer_id, customer_name, customer_email, customer_phone, \
  items, delivery, payment, subtotal, discount, delivery_fee, total, coupon_code, status, timeline, \
  order_time_group, notes, created_at, updated_at";

#[derive(Debug, Clone, FromRow)]
pub struct OrderRow {
  pub id: Uuid,
  pub order_number: i64,
  pub customer_id: Option<Uuid>,
  pub customer_name: String,
  pub customer_email: String,
  pub customer_phone: String,
  pub items: Json<Vec<LineItem>>,
  pub delivery: Json<Delivery>,
  pub payment: Json<Payment>,
  pub subtotal: i64,
  pub discount: i64,
  pub delivery_fee: i64,
  pub total: i64,
  pub coupon_code: Option<String>,
  pub status: String,
  pub timeline: Json<Vec<TimelineEntry>>,
  pub order_time_group: Option<String>,
  pub notes: Option<String>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

impl TryFrom<OrderRow> for Order {
  type Error = FloristError;

  fn try_from(row: OrderRow) -> Result<Self, Self::Error> {
    Ok(Order {
      id: row.id,
      order_number: row.order_number,
      customer: CustomerContact {
        customer_id: row.customer_id,
        name: row.customer_name,
        email: row.customer_email,
        phone: row.customer_phone,
      },
      items: row.items.0,
      delivery: row.delivery.0,
      payment: row.payment.0,
      totals: OrderTotals {
        subtotal: row.subtotal,
        discount: row.discount,
        delivery_fee: row.delivery_fee,
        total: row.total,
      },
      coupon_code: row.coupon_code,
      status: row.status.parse()?,
      timeline: row.timeline.0,
      order_time_group: row.order_time_group,
      notes: row.notes,
      created_at: row.created_at,
      updated_at: row.updated_at,
    })
  }
}

/// Public view returned by order tracking; no contact details beyond the recipient's name.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderSummary {
  pub order_number: i64,
  pub status: String,
  pub delivery_date: String,
  pub time_slot: String,
  pub recipient_name: String,
  pub total: i64,
  pub timeline: Vec<TimelineEntry>,
  pub created_at: DateTime<Utc>,
}

impl From<&Order> for OrderSummary {
  fn from(order: &Order) -> Self {
    Self {
      order_number: order.order_number,
      status: order.status.to_string(),
      delivery_date: order.delivery.delivery_date.clone(),
      time_slot: order.delivery.time_slot.clone(),
      recipient_name: order.delivery.recipient_name.clone(),
      total: order.totals.total,
      timeline: order.timeline.clone(),
      created_at: order.created_at,
    }
  }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct DeletedOrderRow {
  pub id: Uuid,
  pub order_id: Uuid,
  pub order_number: i64,
  pub snapshot: Json<Order>,
  pub reason: Option<String>,
  pub deleted_at: DateTime<Utc>,
}
