// storefront/src/pipelines/mod.rs

//! Workflows run by HTTP handlers. Each is built once at startup and shared
//! through `AppState`.

use crate::errors::AppError;
use florist::Pipeline;

pub mod cancel_pipeline;
pub mod checkout_pipeline;
pub mod common_steps;
pub mod contexts;
pub mod register_pipeline;

use contexts::{CancelCtxData, CheckoutCtxData, RegisterCtxData};

pub struct Workflows {
  pub checkout: Pipeline<CheckoutCtxData, AppError>,
  pub cancel_order: Pipeline<CancelCtxData, AppError>,
  pub register_customer: Pipeline<RegisterCtxData, AppError>,
}

impl Workflows {
  pub fn new() -> Self {
    let workflows = Self {
      checkout: checkout_pipeline::build_checkout_pipeline(),
      cancel_order: cancel_pipeline::build_cancel_pipeline(),
      register_customer: register_pipeline::build_register_pipeline(),
    };
    tracing::info!("Storefront workflows built.");
    workflows
  }
}

impl Default for Workflows {
  fn default() -> Self {
    Self::new()
  }
}
