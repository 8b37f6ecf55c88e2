//! Releasable / errored partition

use super::merge::{Finding, MergedErrors};
use crate::models::FileEntry;

/// A candidate withheld from release with its findings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErroredEntry {
    pub entry: FileEntry,
    pub findings: Vec<Finding>,
}

impl ErroredEntry {
    /// Messages joined for tabular output
    pub fn joined_messages(&self, separator: &str) -> String {
        self.findings
            .iter()
            .map(|f| f.message.as_str())
            .collect::<Vec<_>>()
            .join(separator)
    }
}

/// Release decision over a candidate set
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub releasable: Vec<FileEntry>,
    pub errored: Vec<ErroredEntry>,
}

impl Partition {
    pub fn len(&self) -> usize {
        self.releasable.len() + self.errored.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Split candidates by whether they carry any merged finding
///
/// Both halves are stably sorted by (center, component).
pub fn partition(candidates: &[FileEntry], merged: &MergedErrors) -> Partition {
    let mut result = Partition::default();
    for entry in candidates {
        if merged.has_errors(&entry.entity_id) {
            result.errored.push(ErroredEntry {
                entry: entry.clone(),
                findings: merged.findings(&entry.entity_id).to_vec(),
            });
        } else {
            result.releasable.push(entry.clone());
        }
    }

    result.releasable.sort_by(|a, b| listing_order(a).cmp(&listing_order(b)));
    result
        .errored
        .sort_by(|a, b| listing_order(&a.entry).cmp(&listing_order(&b.entry)));
    result
}

fn listing_order(entry: &FileEntry) -> (&str, &str) {
    (entry.center.as_str(), entry.component.as_str())
}
