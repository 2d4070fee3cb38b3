// florist/src/order/status.rs
use crate::error::FloristError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
  Pending,
  Confirmed,
  Processing,
  Shipped,
  Delivered,
  Cancelled,
  Refunded,
  Failed,
}

impl OrderStatus {
  pub const ALL: [OrderStatus; 8] = [
    OrderStatus::Pending,
    OrderStatus::Confirmed,
    OrderStatus::Processing,
    OrderStatus::Shipped,
    OrderStatus::Delivered,
    OrderStatus::Cancelled,
    OrderStatus::Refunded,
    OrderStatus::Failed,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      OrderStatus::Pending => "pending",
      OrderStatus::Confirmed => "confirmed",
      OrderStatus::Processing => "processing",
      OrderStatus::Shipped => "shipped",
      OrderStatus::Delivered => "delivered",
      OrderStatus::Cancelled => "cancelled",
      OrderStatus::Refunded => "refunded",
      OrderStatus::Failed => "failed",
    }
  }

  /// Position on the main fulfilment chain; `None` for the branch states.
  pub fn progress_rank(self) -> Option<u8> {
    match self {
      OrderStatus::Pending => Some(0),
      OrderStatus::Confirmed => Some(1),
      OrderStatus::Processing => Some(2),
      OrderStatus::Shipped => Some(3),
      OrderStatus::Delivered => Some(4),
      OrderStatus::Cancelled | OrderStatus::Refunded | OrderStatus::Failed => None,
    }
  }

  pub fn is_terminal(self) -> bool {
    matches!(
      self,
      OrderStatus::Delivered | OrderStatus::Cancelled | OrderStatus::Refunded | OrderStatus::Failed
    )
  }

  /// Statuses the automation runner is allowed to move forward.
  pub fn is_automatable(self) -> bool {
    matches!(self, OrderStatus::Confirmed | OrderStatus::Processing | OrderStatus::Shipped)
  }

  /// Whether an admin (or a payment callback) may move an order from `self` to `next`.
  ///
  /// Forward moves along the main chain may skip stages. `cancelled` and `failed`
  /// are reachable from any non-terminal state; `refunded` from any state after
  /// payment was taken, including `delivered`.
  pub fn can_transition_to(self, next: OrderStatus) -> bool {
    if self == next {
      return false;
    }
    match next {
      OrderStatus::Cancelled | OrderStatus::Failed => !self.is_terminal(),
      OrderStatus::Refunded => matches!(
        self,
        OrderStatus::Confirmed | OrderStatus::Processing | OrderStatus::Shipped | OrderStatus::Delivered
      ),
      _ => match (self.progress_rank(), next.progress_rank()) {
        (Some(from), Some(to)) => to > from,
        _ => false,
      },
    }
  }
}

impl fmt::Display for OrderStatus {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

impl FromStr for OrderStatus {
  type Err = FloristError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let normalized = s.trim().to_ascii_lowercase();
    OrderStatus::ALL
      .into_iter()
      .find(|status| status.as_str() == normalized)
      .ok_or_else(|| FloristError::UnknownStatus(s.to_string()))
  }
}
