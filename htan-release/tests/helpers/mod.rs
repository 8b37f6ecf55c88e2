//! Test Helper Utilities
//!
//! Shared fixtures and log capture for htan-release integration tests

#![allow(dead_code)]

pub mod fixtures;
pub mod log_capture;

pub use fixtures::{
    descriptor, provenance_row, scratch_warehouse, CENTER, snapshot, test_config, MemorySource, NoLookup,
};
pub use log_capture::{init_test_logging, LogCapture};
