// florist/src/error.rs
use anyhow::Error as AnyhowError;
use thiserror::Error;

use crate::coupon::CouponRejection;
use crate::delivery::DeliveryRejection;
use crate::otp::OtpRejection;
use crate::session::SessionRejection;

#[derive(Debug, Error)]
pub enum FloristError {
  #[error("{0}")]
  Delivery(#[from] DeliveryRejection),

  #[error("{0}")]
  Coupon(#[from] CouponRejection),

  #[error("{0}")]
  Otp(#[from] OtpRejection),

  #[error("{0}")]
  Session(#[from] SessionRejection),

  #[error("Invalid status transition from '{from}' to '{to}'")]
  InvalidTransition { from: String, to: String },

  #[error("Unknown order status: {0}")]
  UnknownStatus(String),

  #[error("Invalid input: {0}")]
  InvalidInput(String),

  #[error("Signing key error: {0}")]
  Key(String),

  #[error("Error in workflow step or external operation. Source: {source}")]
  External {
    #[source]
    source: AnyhowError,
  },
}

impl From<AnyhowError> for FloristError {
  fn from(err: AnyhowError) -> Self {
    FloristError::External { source: err }
  }
}

pub type FloristResult<T, E = FloristError> = std::result::Result<T, E>;
