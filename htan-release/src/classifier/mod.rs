//! Release classifier
//!
//! Merges checker reports into per-entity findings, partitions candidates
//! into releasable and errored halves, and enriches releasable imaging files
//! with their channel metadata reference.

pub mod channel_enrichment;
pub mod merge;
pub mod partition;

pub use channel_enrichment::{enrich_channels, ChannelColumns, CHANNEL_NOT_FOUND};
pub use merge::{Finding, MergedErrors};
pub use partition::{partition, ErroredEntry, Partition};
