// storefront/src/models/mod.rs

//! Database row types and request payloads.

pub mod category;
pub mod coupon;
pub mod customer;
pub mod order;
pub mod otp;
pub mod product;
pub mod review;

pub use category::{Category, CategoryInput};
pub use coupon::{CouponInput, CouponRow};
pub use customer::Customer;
pub use order::{DeletedOrderRow, OrderRow, OrderSummary};
pub use otp::OtpRow;
pub use product::{Product, ProductInput};
pub use review::{Review, ReviewInput};
