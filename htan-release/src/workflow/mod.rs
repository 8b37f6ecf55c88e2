//! Release run orchestration
//!
//! A run moves through fixed phases:
//! 1. Load the reference snapshot (data model, exclusions, fileview, provenance)
//! 2. Ingest the latest manifest per dataset
//! 3. Build the identifier graph and select candidates
//! 4. Run the checker battery
//! 5. Merge findings, partition candidates, enrich channel columns
//! 6. Build and publish the release lists
//!
//! A fatal schema violation in phase 2 aborts the run before anything is
//! published, leaving prior warehouse content untouched.

pub mod pipeline;

pub use pipeline::{load_snapshot, ReleaseOutcome, ReleaseRun, Snapshot};
