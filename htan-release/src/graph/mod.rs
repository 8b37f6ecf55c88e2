//! Identifier graph
//!
//! Two indexes derived from the ingested manifests: the flat file listing
//! (one row per releasable file entity) and the primary/parent edge table
//! spanning every component.

pub mod file_listing;
pub mod parent_ids;

pub use file_listing::build_file_listing;
pub use parent_ids::{build_parent_id_table, parent_tokens};

use crate::models::{FileEntry, IdentifierEdge, ManifestSet};
use tracing::info;

/// Both graph indexes for one run
#[derive(Debug, Clone, Default)]
pub struct IdentifierGraph {
    pub listing: Vec<FileEntry>,
    pub edges: Vec<IdentifierEdge>,
}

impl IdentifierGraph {
    pub fn build(manifests: &ManifestSet, file_components: &[String]) -> Self {
        let listing = build_file_listing(manifests, file_components);
        let edges = build_parent_id_table(manifests);
        info!(
            files = listing.len(),
            edges = edges.len(),
            "Identifier graph built"
        );
        Self { listing, edges }
    }
}
