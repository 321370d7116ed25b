//! HTTP handlers for the SECOP relay.

pub mod contracts;
pub mod docs;
pub mod health;

pub use contracts::{analyzed_contracts, filtered_contracts, raw_contracts};
pub use docs::index;
pub use health::{health_check, metrics_endpoint, readiness_check};
