//! Common utilities for integration tests

#![allow(dead_code)]

pub mod test_helpers;

// Re-export commonly used items
pub use test_helpers::{assert_fields_close, bump, relative_error, uniform_scenario};
