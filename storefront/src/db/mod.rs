// storefront/src/db/mod.rs

//! Queries shared by handlers, workflows and cron jobs.
//!
//! Functions that must run inside a caller's transaction take `&mut PgConnection`;
//! read helpers accept any executor.

pub mod coupons;
pub mod customers;
pub mod orders;
pub mod otps;
pub mod products;
