// storefront/src/state.rs
use crate::config::AppConfig;
use crate::pipelines::Workflows;
use crate::services::{EmailSender, PaymentGateway};
use florist::VoteThrottle;
use sqlx::PgPool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
  pub db_pool: PgPool,
  pub config: Arc<AppConfig>,
  pub workflows: Arc<Workflows>,
  pub email: Arc<dyn EmailSender>,
  pub payments: Arc<dyn PaymentGateway>,
  /// Process-local; resets on restart.
  pub vote_throttle: Arc<VoteThrottle>,
}

impl AppState {
  pub fn new(
    db_pool: PgPool,
    config: Arc<AppConfig>,
    email: Arc<dyn EmailSender>,
    payments: Arc<dyn PaymentGateway>,
  ) -> Self {
    let vote_throttle = Arc::new(VoteThrottle::new(config.vote_window));
    Self {
      db_pool,
      config,
      workflows: Arc::new(Workflows::new()),
      email,
      payments,
      vote_throttle,
    }
  }
}

#[cfg(test)]
pub(crate) mod tests {
  use super::*;
  use crate::config::tests::test_config;
  use crate::services::{LogEmailSender, MockPaymentGateway};
  use sqlx::postgres::PgPoolOptions;
  use std::time::Duration;

  /// State over a pool that never connects; for tests that must not reach the database.
  pub(crate) fn test_state() -> AppState {
    let config = Arc::new(test_config());
    let db_pool = PgPoolOptions::new()
      .acquire_timeout(Duration::from_millis(100))
      .connect_lazy(&config.database_url)
      .expect("lazy pool from a valid url");
    AppState::new(
      db_pool,
      config.clone(),
      Arc::new(LogEmailSender::new("test@florist.local")),
      Arc::new(MockPaymentGateway::new(config.site_base_url.clone())),
    )
  }
}
