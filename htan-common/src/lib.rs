//! # HTAN Common Library
//!
//! Shared code for the HTAN release tooling including:
//! - Error types
//! - Configuration loading and config file resolution
//! - Generic tabular model used by ingestion and the warehouse
//! - SQLite warehouse initialization

pub mod config;
#[cfg(feature = "sqlx")]
pub mod db;
pub mod error;
pub mod table;

pub use error::{Error, Result};
pub use table::Table;
