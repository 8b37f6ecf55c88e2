//! htan-release library interface
//!
//! Pre-release validation and cataloging for HTAN data releases. Exposes
//! the pipeline stages for the binary and for integration testing.

pub mod classifier;
pub mod error;
pub mod graph;
pub mod ingest;
pub mod models;
pub mod promote;
pub mod reference;
pub mod release_lists;
pub mod services;
pub mod sinks;
pub mod validators;
pub mod workflow;

pub use crate::error::{ReleaseError, ReleaseResult};
pub use crate::workflow::{load_snapshot, ReleaseOutcome, ReleaseRun, Snapshot};
