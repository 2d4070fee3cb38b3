// florist/src/order/mod.rs

//! Order records, status lifecycle, timeline and pricing.

pub mod model;
pub mod pricing;
pub mod status;
pub mod timeline;

pub use model::{CustomerContact, Delivery, LineItem, Order, Payment, PaymentMethod, PaymentStatus};
pub use pricing::{delivery_fee_for, price_order, OrderTotals};
pub use status::OrderStatus;
pub use timeline::{TimelineEntry, TimelineSource};
