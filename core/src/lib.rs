// src/lib.rs

//! Florist: domain logic for a flower delivery storefront.
//!
//! This crate holds everything the storefront service decides without touching
//! the network or the database:
//!  - Shift-bucket classification and the automated status schedule for orders.
//!  - Order status lifecycle, append-only timeline and pricing.
//!  - One-time email codes (hashing, cooldown, attempt limits, expiry).
//!  - HMAC-signed, stateless session tokens.
//!  - Coupon and delivery-date validation.
//!  - Sales report aggregation and sitemap rendering.
//!  - A best-effort vote throttle and a small named-step workflow runner.

pub mod automation;
pub mod coupon;
pub mod delivery;
pub mod error;
pub mod order;
pub mod otp;
pub mod report;
pub mod secret;
pub mod session;
pub mod sitemap;
pub mod slug;
pub mod throttle;
pub mod time;
pub mod workflow;

// --- Re-exports for the Public API ---

pub use crate::automation::{
  calculate_automation_schedule, classify_created_at, due_transitions, AutomationSchedule, ScheduleInput,
  ScheduledTransition, ShiftBucket,
};
pub use crate::coupon::{normalize_code, Coupon, CouponRejection, DiscountKind};
pub use crate::delivery::{parse_delivery_date, validate_delivery_date, DeliveryRejection};
pub use crate::error::{FloristError, FloristResult};
pub use crate::order::{Order, OrderStatus, OrderTotals, TimelineEntry, TimelineSource};
pub use crate::otp::{can_resend, generate_code, hash_code, OtpPurpose, OtpRecord, OtpRejection, OtpState};
pub use crate::secret::secrets_match;
pub use crate::session::{sign_session, verify_session, SessionClaims, SessionRejection, SESSION_COOKIE_NAME};
pub use crate::throttle::VoteThrottle;
pub use crate::workflow::{ContextData, Pipeline, RunOutcome, RunStatus, StepControl, WorkflowError};
