//! Test helper utilities
//!
//! Shared fixtures for the lineup-enrich integration tests

#![allow(dead_code)]

pub mod fixtures;
pub mod log_capture;
pub mod mock_provider;

pub use fixtures::{festival, row, table, tracker, MapSource};
pub use log_capture::LogCapture;
pub use mock_provider::MockProvider;
