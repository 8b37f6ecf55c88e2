//! Primary/parent identifier adjacency table

use crate::models::columns;
use crate::models::{IdentifierEdge, ManifestRecord, ManifestSet};
use std::collections::HashSet;

const PRIMARY_COLUMNS: [&str; 2] = [columns::DATA_FILE_ID, columns::BIOSPECIMEN_ID];

const PARENT_COLUMNS: [&str; 3] = [
    columns::PARENT_DATA_FILE_ID,
    columns::PARENT_BIOSPECIMEN_ID,
    columns::PARENT_ID,
];

/// Build the deduplicated edge table spanning every component
///
/// Each record contributes one edge per (primary id, parent token) pair.
/// Parent cells are split on `,` and `;`; tokens containing "not" in any
/// case ("Not Applicable") are dropped. Records without a primary id or
/// without any parent token contribute nothing.
pub fn build_parent_id_table(manifests: &ManifestSet) -> Vec<IdentifierEdge> {
    let mut seen = HashSet::new();
    let mut edges = Vec::new();

    for (_, records) in manifests.iter() {
        for record in records {
            for edge in record_edges(record) {
                if seen.insert(edge.clone()) {
                    edges.push(edge);
                }
            }
        }
    }
    edges
}

fn record_edges(record: &ManifestRecord) -> Vec<IdentifierEdge> {
    let primaries: Vec<&str> = PRIMARY_COLUMNS
        .iter()
        .filter_map(|c| record.get(c))
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .collect();

    let parents: Vec<&str> = PARENT_COLUMNS
        .iter()
        .filter_map(|c| record.get(c))
        .flat_map(parent_tokens)
        .collect();

    let mut edges = Vec::with_capacity(primaries.len() * parents.len());
    for primary in &primaries {
        for parent in &parents {
            edges.push(IdentifierEdge {
                primary_id: primary.to_string(),
                parent_id: parent.to_string(),
                entity_id: record.entity_id().map(str::to_string),
                component: record.component.clone(),
            });
        }
    }
    edges
}

/// Split one parent cell into trimmed tokens, dropping "not applicable" markers
pub fn parent_tokens(raw: &str) -> impl Iterator<Item = &str> {
    raw.split([',', ';'])
        .map(str::trim)
        .filter(|t| !t.is_empty() && !t.to_lowercase().contains("not"))
}
