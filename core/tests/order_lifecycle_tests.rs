// tests/order_lifecycle_tests.rs
mod common;

use common::*;
use florist::order::{PaymentMethod, PaymentStatus};
use florist::report::build_sales_report;
use florist::{FloristError, OrderStatus, TimelineSource};

#[test]
fn placement_status_depends_on_payment_method() {
  let created = utc(2025, 3, 13, 9, 0);
  let card = sample_order(PaymentMethod::Card, "2025-03-14", created);
  assert_eq!(card.status, OrderStatus::Pending);
  assert_eq!(card.timeline.len(), 1);
  assert_eq!(card.totals.total, 109_990);

  let cash = sample_order(PaymentMethod::CashOnDelivery, "2025-03-14", created);
  assert_eq!(cash.status, OrderStatus::Confirmed);
}

#[test]
fn transitions_append_to_timeline() {
  let created = utc(2025, 3, 13, 9, 0);
  let mut order = sample_order(PaymentMethod::Card, "2025-03-14", created);

  order.mark_paid(utc(2025, 3, 13, 9, 5)).expect("paid");
  assert_eq!(order.status, OrderStatus::Confirmed);
  assert_eq!(order.payment.status, PaymentStatus::Paid);

  order
    .transition_to(OrderStatus::Shipped, "Kuryeye verildi.", TimelineSource::Admin, utc(2025, 3, 14, 9, 0))
    .expect("forward move");
  assert_eq!(order.timeline.len(), 3);
  assert_eq!(order.timeline.last().map(|e| e.status), Some(OrderStatus::Shipped));

  let err = order
    .transition_to(OrderStatus::Processing, "geri", TimelineSource::Admin, utc(2025, 3, 14, 9, 1))
    .unwrap_err();
  assert!(matches!(err, FloristError::InvalidTransition { .. }));
  assert_eq!(order.timeline.len(), 3, "rejected moves leave the timeline untouched");
}

#[test]
fn refunds_require_payment() {
  let created = utc(2025, 3, 13, 9, 0);
  let mut unpaid = sample_order(PaymentMethod::CashOnDelivery, "2025-03-14", created);
  assert!(unpaid.mark_refunded("iade", created).is_err());

  let mut paid = sample_order(PaymentMethod::Card, "2025-03-14", created);
  paid.mark_paid(created).expect("paid");
  paid.mark_refunded("Müşteri talebi", created).expect("refunded");
  assert_eq!(paid.status, OrderStatus::Refunded);
  assert_eq!(paid.payment.status, PaymentStatus::Refunded);
  assert!(paid.payment.refunded_at.is_some());
}

#[test]
fn status_transition_rules() {
  assert!(OrderStatus::Pending.can_transition_to(OrderStatus::Confirmed));
  assert!(OrderStatus::Confirmed.can_transition_to(OrderStatus::Delivered));
  assert!(OrderStatus::Shipped.can_transition_to(OrderStatus::Cancelled));
  assert!(OrderStatus::Delivered.can_transition_to(OrderStatus::Refunded));
  assert!(!OrderStatus::Pending.can_transition_to(OrderStatus::Refunded));
  assert!(!OrderStatus::Delivered.can_transition_to(OrderStatus::Cancelled));
  assert!(!OrderStatus::Cancelled.can_transition_to(OrderStatus::Confirmed));
  assert!(!OrderStatus::Confirmed.can_transition_to(OrderStatus::Confirmed));
  assert_eq!(" Shipped ".parse::<OrderStatus>().ok(), Some(OrderStatus::Shipped));
  assert!("lost".parse::<OrderStatus>().is_err());
}

#[test]
fn order_serializes_camel_case() {
  let order = sample_order(PaymentMethod::Card, "2025-03-14", utc(2025, 3, 13, 9, 0));
  let json = serde_json::to_value(&order).expect("serializable");
  assert_eq!(json["delivery"]["deliveryDate"], "2025-03-14");
  assert_eq!(json["orderNumber"], 100_001);
  assert_eq!(json["payment"]["method"], "card");
  assert_eq!(json["timeline"][0]["source"], "customer");
}

#[test]
fn sales_report_excludes_cancelled_orders() {
  let day1 = utc(2025, 3, 13, 9, 0);
  let day2 = utc(2025, 3, 14, 9, 0);
  let a = sample_order(PaymentMethod::CashOnDelivery, "2025-03-14", day1);
  let mut b = sample_order(PaymentMethod::CashOnDelivery, "2025-03-15", day2);
  b.items = a.items.clone();
  let mut c = sample_order(PaymentMethod::CashOnDelivery, "2025-03-15", day2);
  c.transition_to(OrderStatus::Cancelled, "iptal", TimelineSource::Admin, day2)
    .expect("cancel");
  let outside = sample_order(PaymentMethod::CashOnDelivery, "2025-03-20", utc(2025, 3, 19, 9, 0));

  let from = day1.date_naive();
  let to = day2.date_naive();
  let report = build_sales_report(&[a, b, c, outside], from, to, 5);

  assert_eq!(report.order_count, 2);
  assert_eq!(report.revenue, 2 * 109_990);
  assert_eq!(report.average_order_value, 109_990);
  assert_eq!(report.by_day.len(), 2);
  assert_eq!(report.status_breakdown.get("cancelled"), Some(&1));
  assert_eq!(report.status_breakdown.get("confirmed"), Some(&2));
  assert_eq!(report.top_products[0].name, "Vazo");
  assert_eq!(report.top_products[0].quantity, 4);
}

#[test]
fn restoring_a_cancelled_order_returns_it_to_its_previous_status() {
  let created = utc(2025, 3, 13, 9, 0);
  let mut order = sample_order(PaymentMethod::CashOnDelivery, "2025-03-14", created);
  order
    .transition_to(OrderStatus::Processing, "Hazırlanıyor.", TimelineSource::Automation, created)
    .expect("forward move");
  order
    .transition_to(OrderStatus::Cancelled, "Müşteri iptal etti.", TimelineSource::Customer, created)
    .expect("cancel");

  let restored = order
    .reopen_after_cancellation("Sipariş geri yüklendi.", utc(2025, 3, 13, 10, 0))
    .expect("restore");
  assert_eq!(restored, OrderStatus::Processing);
  assert_eq!(order.status, OrderStatus::Processing);
  assert_eq!(order.timeline.len(), 4);
  assert_eq!(order.timeline.last().map(|e| e.source), Some(TimelineSource::Admin));

  assert!(order.reopen_after_cancellation("again", created).is_err());
}
