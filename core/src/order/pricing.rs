// florist/src/order/pricing.rs
use super::LineItem;
use crate::error::{FloristError, FloristResult};
use serde::{Deserialize, Serialize};

/// Money amounts in kuruş.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
  pub subtotal: i64,
  pub discount: i64,
  pub delivery_fee: i64,
  pub total: i64,
}

/// Delivery is free once the discounted basket reaches `free_threshold`.
pub fn delivery_fee_for(discounted_subtotal: i64, flat_fee: i64, free_threshold: i64) -> i64 {
  if discounted_subtotal >= free_threshold {
    0
  } else {
    flat_fee
  }
}

pub fn price_order(items: &[LineItem], discount: i64, delivery_fee: i64) -> FloristResult<OrderTotals> {
  if items.is_empty() {
    return Err(FloristError::InvalidInput("Order must contain at least one item.".to_string()));
  }
  let mut subtotal: i64 = 0;
  for item in items {
    if item.quantity <= 0 {
      return Err(FloristError::InvalidInput(format!(
        "Quantity for '{}' must be positive.",
        item.name
      )));
    }
    if item.unit_price < 0 {
      return Err(FloristError::InvalidInput(format!("Price for '{}' is negative.", item.name)));
    }
    subtotal = item
      .line_total()
      .and_then(|line| subtotal.checked_add(line))
      .ok_or_else(|| FloristError::InvalidInput("Order total is out of range.".to_string()))?;
  }

  let discount = discount.clamp(0, subtotal);
  let delivery_fee = delivery_fee.max(0);
  Ok(OrderTotals {
    subtotal,
    discount,
    delivery_fee,
    total: subtotal - discount + delivery_fee,
  })
}
