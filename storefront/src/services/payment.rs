// storefront/src/services/payment.rs

//! Payment gateway seam and an in-memory mock gateway.

use anyhow::{anyhow, bail};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use tracing::{info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayStatus {
  Pending,
  Paid,
  Failed,
  Refunded,
}

#[derive(Debug, Clone)]
pub struct GatewayPayment {
  pub token: String,
  /// Hosted payment page the customer is sent to.
  pub redirect_url: Option<String>,
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
  async fn create_payment(&self, order_id: Uuid, amount: i64) -> anyhow::Result<GatewayPayment>;

  /// Authoritative status for a payment token.
  async fn fetch_status(&self, token: &str) -> anyhow::Result<GatewayStatus>;

  async fn refund(&self, token: &str, amount: i64) -> anyhow::Result<()>;
}

#[derive(Debug, Clone)]
struct MockPayment {
  amount: i64,
  status: GatewayStatus,
}

/// Settles every payment on its first status lookup. Amounts ending in 1.23 TL fail.
pub struct MockPaymentGateway {
  checkout_base_url: String,
  payments: Mutex<HashMap<String, MockPayment>>,
}

impl MockPaymentGateway {
  pub fn new(checkout_base_url: impl Into<String>) -> Self {
    Self {
      checkout_base_url: checkout_base_url.into(),
      payments: Mutex::new(HashMap::new()),
    }
  }
}

#[async_trait]
impl PaymentGateway for MockPaymentGateway {
  #[instrument(name = "payment::create", skip(self), fields(%order_id, amount))]
  async fn create_payment(&self, order_id: Uuid, amount: i64) -> anyhow::Result<GatewayPayment> {
    if amount <= 0 {
      bail!("Amount must be greater than zero");
    }
    tokio::time::sleep(std::time::Duration::from_millis(50)).await; // Simulate network latency

    let token = format!("mock_pay_{}", Uuid::new_v4().simple());
    self.payments.lock().insert(
      token.clone(),
      MockPayment {
        amount,
        status: GatewayStatus::Pending,
      },
    );
    info!(%token, "Mock payment created.");
    Ok(GatewayPayment {
      redirect_url: Some(format!("{}/odeme/{}", self.checkout_base_url, token)),
      token,
    })
  }

  #[instrument(name = "payment::fetch_status", skip(self))]
  async fn fetch_status(&self, token: &str) -> anyhow::Result<GatewayStatus> {
    let mut payments = self.payments.lock();
    let payment = payments
      .get_mut(token)
      .ok_or_else(|| anyhow!("Unknown payment token '{}'", token))?;
    if payment.status == GatewayStatus::Pending {
      payment.status = if payment.amount % 1000 == 123 {
        GatewayStatus::Failed
      } else {
        GatewayStatus::Paid
      };
      info!(status = ?payment.status, "Mock payment settled.");
    }
    Ok(payment.status)
  }

  #[instrument(name = "payment::refund", skip(self))]
  async fn refund(&self, token: &str, amount: i64) -> anyhow::Result<()> {
    let mut payments = self.payments.lock();
    let payment = payments
      .get_mut(token)
      .ok_or_else(|| anyhow!("Unknown payment token '{}'", token))?;
    if payment.status != GatewayStatus::Paid {
      bail!("Payment is not in a refundable state ({:?})", payment.status);
    }
    if amount > payment.amount {
      bail!("Refund amount exceeds the captured amount");
    }
    payment.status = GatewayStatus::Refunded;
    info!("Mock payment refunded.");
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[actix_web::test]
  async fn mock_payments_settle_and_refund() {
    let gateway = MockPaymentGateway::new("http://localhost:8080");
    let paid = gateway.create_payment(Uuid::new_v4(), 109_990).await.expect("created");
    assert!(paid.redirect_url.as_deref().is_some_and(|u| u.ends_with(&paid.token)));
    assert_eq!(gateway.fetch_status(&paid.token).await.expect("status"), GatewayStatus::Paid);
    gateway.refund(&paid.token, 109_990).await.expect("refunded");
    assert_eq!(gateway.fetch_status(&paid.token).await.expect("status"), GatewayStatus::Refunded);
    assert!(gateway.refund(&paid.token, 1).await.is_err());

    let failing = gateway.create_payment(Uuid::new_v4(), 5_123).await.expect("created");
    assert_eq!(gateway.fetch_status(&failing.token).await.expect("status"), GatewayStatus::Failed);

    assert!(gateway.fetch_status("unknown").await.is_err());
    assert!(gateway.create_payment(Uuid::new_v4(), 0).await.is_err());
  }
}
