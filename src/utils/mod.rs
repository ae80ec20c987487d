//! Utilities Module
//!
//! Common utilities used across the crate.

pub mod logging;

pub use logging::{redact_address, redact_value};
