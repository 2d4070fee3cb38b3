// storefront/src/db/orders.rs

use crate::errors::{AppError, Result};
use crate::models::order::{DeletedOrderRow, OrderRow, ORDER_COLUMNS};
use chrono::{DateTime, NaiveDate, Utc};
use florist::{Order, OrderStatus};
use sqlx::types::Json;
use sqlx::{PgConnection, PgExecutor};
use tracing::instrument;
use uuid::Uuid;

fn into_orders(rows: Vec<OrderRow>) -> Result<Vec<Order>> {
  rows
    .into_iter()
    .map(|row| Order::try_from(row).map_err(AppError::from))
    .collect()
}

pub async fn next_order_number<'e, E: PgExecutor<'e>>(executor: E) -> Result<i64> {
  let number: i64 = sqlx::query_scalar("SELECT nextval('order_number_seq')")
    .fetch_one(executor)
    .await?;
  Ok(number)
}

pub async fn fetch_order<'e, E: PgExecutor<'e>>(executor: E, id: Uuid) -> Result<Option<Order>> {
  let sql = format!("SELECT {} FROM orders WHERE id = $1", ORDER_COLUMNS);
  let row: Option<OrderRow> = sqlx::query_as(&sql).bind(id).fetch_optional(executor).await?;
  Ok(row.map(Order::try_from).transpose()?)
}

/// Same as [`fetch_order`] but locks the row until the transaction ends.
pub async fn fetch_order_for_update(conn: &mut PgConnection, id: Uuid) -> Result<Option<Order>> {
  let sql = format!("SELECT {} FROM orders WHERE id = $1 FOR UPDATE", ORDER_COLUMNS);
  let row: Option<OrderRow> = sqlx::query_as(&sql).bind(id).fetch_optional(conn).await?;
  Ok(row.map(Order::try_from).transpose()?)
}

#[instrument(skip(conn, order), fields(order_id = %order.id, order_number = order.order_number))]
pub async fn insert_order(conn: &mut PgConnection, order: &Order) -> Result<()> {
  sqlx::query(
    "INSERT INTO orders (id, order_number, customer_id, customer_name, customer_email, customer_phone, \
       items, delivery, payment, subtotal, discount, delivery_fee, total, coupon_code, status, timeline, \
       order_time_group, notes, created_at, updated_at) \
     VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16, $17, $18, $19, $20)",
  )
  .bind(order.id)
  .bind(order.order_number)
  .bind(order.customer.customer_id)
  .bind(&order.customer.name)
  .bind(&order.customer.email)
  .bind(&order.customer.phone)
  .bind(Json(&order.items))
  .bind(Json(&order.delivery))
  .bind(Json(&order.payment))
  .bind(order.totals.subtotal)
  .bind(order.totals.discount)
  .bind(order.totals.delivery_fee)
  .bind(order.totals.total)
  .bind(&order.coupon_code)
  .bind(order.status.as_str())
  .bind(Json(&order.timeline))
  .bind(&order.order_time_group)
  .bind(&order.notes)
  .bind(order.created_at)
  .bind(order.updated_at)
  .execute(conn)
  .await?;
  Ok(())
}

/// Writes status, timeline, payment and shift group, but only if the stored
/// status is still `expected`. Returns whether the row was updated.
#[instrument(skip(conn, order), fields(order_id = %order.id, expected = %expected, next = %order.status))]
pub async fn update_order_state(conn: &mut PgConnection, order: &Order, expected: OrderStatus) -> Result<bool> {
  let result = sqlx::query(
    "UPDATE orders SET status = $2, timeline = $3, payment = $4, order_time_group = $5, updated_at = $6 \
     WHERE id = $1 AND status = $7",
  )
  .bind(order.id)
  .bind(order.status.as_str())
  .bind(Json(&order.timeline))
  .bind(Json(&order.payment))
  .bind(&order.order_time_group)
  .bind(order.updated_at)
  .bind(expected.as_str())
  .execute(conn)
  .await?;
  Ok(result.rows_affected() == 1)
}

pub async fn list_orders<'e, E: PgExecutor<'e>>(
  executor: E,
  status: Option<OrderStatus>,
  limit: i64,
  offset: i64,
) -> Result<Vec<Order>> {
  let sql = format!(
    "SELECT {} FROM orders WHERE ($1::text IS NULL OR status = $1) ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    ORDER_COLUMNS
  );
  let rows: Vec<OrderRow> = sqlx::query_as(&sql)
    .bind(status.map(|s| s.as_str()))
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await?;
  into_orders(rows)
}

pub async fn count_orders<'e, E: PgExecutor<'e>>(executor: E, status: Option<OrderStatus>) -> Result<i64> {
  let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE ($1::text IS NULL OR status = $1)")
    .bind(status.map(|s| s.as_str()))
    .fetch_one(executor)
    .await?;
  Ok(total)
}

/// Orders placed under the customer's account, plus guest orders placed with the same email.
pub async fn orders_for_customer<'e, E: PgExecutor<'e>>(executor: E, customer_id: Uuid, email: &str) -> Result<Vec<Order>> {
  let sql = format!(
    "SELECT {} FROM orders WHERE customer_id = $1 OR (customer_id IS NULL AND LOWER(customer_email) = LOWER($2)) \
     ORDER BY created_at DESC",
    ORDER_COLUMNS
  );
  let rows: Vec<OrderRow> = sqlx::query_as(&sql).bind(customer_id).bind(email).fetch_all(executor).await?;
  into_orders(rows)
}

pub async fn find_for_tracking<'e, E: PgExecutor<'e>>(executor: E, order_number: i64, email: &str) -> Result<Option<Order>> {
  let sql = format!(
    "SELECT {} FROM orders WHERE order_number = $1 AND LOWER(customer_email) = LOWER($2)",
    ORDER_COLUMNS
  );
  let row: Option<OrderRow> = sqlx::query_as(&sql)
    .bind(order_number)
    .bind(email.trim())
    .fetch_optional(executor)
    .await?;
  Ok(row.map(Order::try_from).transpose()?)
}

/// Automatable status and a well-formed delivery date no later than `$1`
/// (every scheduled target falls on the delivery date).
pub(crate) const AUTOMATABLE_ORDERS_FILTER: &str = "status IN ('confirmed', 'processing', 'shipped') \
   AND delivery->>'deliveryDate' ~ '^[0-9]{4}-[0-9]{2}-[0-9]{2}$' \
   AND delivery->>'deliveryDate' <= $1";

/// Keyset position after the last automation candidate already read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AutomationCursor {
  pub delivery_date: String,
  pub created_at: DateTime<Utc>,
  pub id: Uuid,
}

impl AutomationCursor {
  pub fn after(order: &Order) -> Self {
    Self {
      delivery_date: order.delivery.delivery_date.clone(),
      created_at: order.created_at,
      id: order.id,
    }
  }
}

/// One page of orders the automation runner may advance, earliest delivery first.
pub async fn automatable_orders<'e, E: PgExecutor<'e>>(
  executor: E,
  today: NaiveDate,
  after: Option<&AutomationCursor>,
  limit: i64,
) -> Result<Vec<Order>> {
  let sql = format!(
    "SELECT {} FROM orders WHERE {} \
     AND ($2::text IS NULL OR (delivery->>'deliveryDate', created_at, id) > ($2::text, $3::timestamptz, $4::uuid)) \
     ORDER BY delivery->>'deliveryDate' ASC, created_at ASC, id ASC LIMIT $5",
    ORDER_COLUMNS, AUTOMATABLE_ORDERS_FILTER
  );
  let rows: Vec<OrderRow> = sqlx::query_as(&sql)
    .bind(today.format("%Y-%m-%d").to_string())
    .bind(after.map(|c| c.delivery_date.clone()))
    .bind(after.map(|c| c.created_at))
    .bind(after.map(|c| c.id))
    .bind(limit)
    .fetch_all(executor)
    .await?;
  into_orders(rows)
}

/// Pending card orders that have a gateway token, oldest first.
pub async fn pending_gateway_orders<'e, E: PgExecutor<'e>>(executor: E, limit: i64) -> Result<Vec<Order>> {
  let sql = format!(
    "SELECT {} FROM orders \
     WHERE status = 'pending' AND payment->>'method' = 'card' AND payment->>'token' IS NOT NULL \
     ORDER BY created_at ASC LIMIT $1",
    ORDER_COLUMNS
  );
  let rows: Vec<OrderRow> = sqlx::query_as(&sql).bind(limit).fetch_all(executor).await?;
  into_orders(rows)
}

pub async fn find_by_payment_token<'e, E: PgExecutor<'e>>(executor: E, token: &str) -> Result<Option<Order>> {
  let sql = format!("SELECT {} FROM orders WHERE payment->>'token' = $1", ORDER_COLUMNS);
  let row: Option<OrderRow> = sqlx::query_as(&sql).bind(token).fetch_optional(executor).await?;
  Ok(row.map(Order::try_from).transpose()?)
}

/// Moves an order into `deleted_orders`. `previous` guards the delete against
/// concurrent status changes.
#[instrument(skip(conn, snapshot, reason), fields(order_id = %snapshot.id))]
pub async fn archive_order(
  conn: &mut PgConnection,
  snapshot: &Order,
  previous: OrderStatus,
  reason: Option<&str>,
  now: DateTime<Utc>,
) -> Result<bool> {
  let deleted = sqlx::query("DELETE FROM orders WHERE id = $1 AND status = $2")
    .bind(snapshot.id)
    .bind(previous.as_str())
    .execute(&mut *conn)
    .await?;
  if deleted.rows_affected() != 1 {
    return Ok(false);
  }
  sqlx::query(
    "INSERT INTO deleted_orders (id, order_id, order_number, snapshot, reason, deleted_at) \
     VALUES ($1, $2, $3, $4, $5, $6)",
  )
  .bind(Uuid::new_v4())
  .bind(snapshot.id)
  .bind(snapshot.order_number)
  .bind(Json(snapshot))
  .bind(reason)
  .bind(now)
  .execute(&mut *conn)
  .await?;
  Ok(true)
}

pub async fn list_deleted<'e, E: PgExecutor<'e>>(executor: E, limit: i64, offset: i64) -> Result<Vec<DeletedOrderRow>> {
  let rows = sqlx::query_as::<_, DeletedOrderRow>(
    "SELECT id, order_id, order_number, snapshot, reason, deleted_at FROM deleted_orders \
     ORDER BY deleted_at DESC LIMIT $1 OFFSET $2",
  )
  .bind(limit)
  .bind(offset)
  .fetch_all(executor)
  .await?;
  Ok(rows)
}

/// Removes a `deleted_orders` record and returns it, locked for the transaction.
pub async fn take_deleted(conn: &mut PgConnection, deleted_id: Uuid) -> Result<Option<DeletedOrderRow>> {
  let row = sqlx::query_as::<_, DeletedOrderRow>(
    "DELETE FROM deleted_orders WHERE id = $1 \
     RETURNING id, order_id, order_number, snapshot, reason, deleted_at",
  )
  .bind(deleted_id)
  .fetch_optional(conn)
  .await?;
  Ok(row)
}

/// Orders created in `[start, end)`, oldest first; feeds the sales report.
pub async fn orders_created_between<'e, E: PgExecutor<'e>>(
  executor: E,
  start: DateTime<Utc>,
  end: DateTime<Utc>,
) -> Result<Vec<Order>> {
  let sql = format!(
    "SELECT {} FROM orders WHERE created_at >= $1 AND created_at < $2 ORDER BY created_at ASC",
    ORDER_COLUMNS
  );
  let rows: Vec<OrderRow> = sqlx::query_as(&sql).bind(start).bind(end).fetch_all(executor).await?;
  into_orders(rows)
}
