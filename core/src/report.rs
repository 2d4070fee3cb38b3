// florist/src/report.rs

//! Sales aggregation for the admin dashboard.

use crate::order::{Order, OrderStatus};
use crate::time::istanbul_date;
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailySales {
  pub date: NaiveDate,
  pub order_count: usize,
  pub revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSales {
  pub product_id: Uuid,
  pub name: String,
  pub quantity: i64,
  pub revenue: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SalesReport {
  pub from: NaiveDate,
  pub to: NaiveDate,
  pub order_count: usize,
  pub revenue: i64,
  pub discount_total: i64,
  pub average_order_value: i64,
  pub by_day: Vec<DailySales>,
  pub top_products: Vec<ProductSales>,
  pub status_breakdown: BTreeMap<String, usize>,
}

/// Orders in these states never count towards revenue.
fn counts_as_sale(status: OrderStatus) -> bool {
  !matches!(status, OrderStatus::Cancelled | OrderStatus::Refunded | OrderStatus::Failed)
}

/// Aggregates orders created between `from` and `to` (inclusive, Istanbul dates).
pub fn build_sales_report(orders: &[Order], from: NaiveDate, to: NaiveDate, top_n: usize) -> SalesReport {
  let mut report = SalesReport {
    from,
    to,
    order_count: 0,
    revenue: 0,
    discount_total: 0,
    average_order_value: 0,
    by_day: Vec::new(),
    top_products: Vec::new(),
    status_breakdown: BTreeMap::new(),
  };
  let mut days: BTreeMap<NaiveDate, DailySales> = BTreeMap::new();
  let mut products: HashMap<Uuid, ProductSales> = HashMap::new();

  for order in orders {
    let day = istanbul_date(order.created_at);
    if day < from || day > to {
      continue;
    }
    *report.status_breakdown.entry(order.status.to_string()).or_insert(0) += 1;
    if !counts_as_sale(order.status) {
      continue;
    }

    report.order_count += 1;
    report.revenue += order.totals.total;
    report.discount_total += order.totals.discount;

    let daily = days.entry(day).or_insert(DailySales {
      date: day,
      order_count: 0,
      revenue: 0,
    });
    daily.order_count += 1;
    daily.revenue += order.totals.total;

    for item in &order.items {
      let entry = products.entry(item.product_id).or_insert_with(|| ProductSales {
        product_id: item.product_id,
        name: item.name.clone(),
        quantity: 0,
        revenue: 0,
      });
      entry.quantity += i64::from(item.quantity);
      entry.revenue += item.line_total().unwrap_or(0);
    }
  }

  if report.order_count > 0 {
    report.average_order_value = report.revenue / report.order_count as i64;
  }
  report.by_day = days.into_values().collect();

  let mut top: Vec<ProductSales> = products.into_values().collect();
  top.sort_by(|a, b| b.quantity.cmp(&a.quantity).then_with(|| b.revenue.cmp(&a.revenue)).then_with(|| a.name.cmp(&b.name)));
  top.truncate(top_n);
  report.top_products = top;

  report
}
