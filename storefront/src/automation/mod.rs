// storefront/src/automation/mod.rs

//! Jobs triggered by the external cron: the order status runner and the
//! pending-payment sweep.

pub mod payment_verification;
pub mod runner;

pub use payment_verification::{apply_gateway_status, verify_pending_payments, PaymentVerificationReport};
pub use runner::{run_order_automation, AutomationReport};
