// storefront/src/services/mod.rs

pub mod auth_service;
pub mod email;
pub mod payment;

pub use email::{EmailMessage, EmailSender, LogEmailSender};
pub use payment::{GatewayPayment, GatewayStatus, MockPaymentGateway, PaymentGateway};
