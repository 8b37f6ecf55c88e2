//! Referential integrity of parent identifiers

use super::{CheckReport, CheckerKind};
use crate::models::{FileEntry, IdentifierEdge};
use std::collections::HashSet;

/// Flag candidate files naming a parent that is nobody's primary id
///
/// Parents are resolved against the whole edge table, so a parent recorded
/// by any center or component satisfies the check.
pub fn check_parents_exist(candidates: &[FileEntry], edges: &[IdentifierEdge]) -> CheckReport {
    let primaries: HashSet<&str> = edges.iter().map(|e| e.primary_id.as_str()).collect();
    let releasable_ids: HashSet<&str> = candidates
        .iter()
        .filter_map(|e| e.data_file_id.as_deref())
        .collect();

    let mut report = CheckReport::new(CheckerKind::ParentsExist);
    for edge in edges
        .iter()
        .filter(|e| !primaries.contains(e.parent_id.as_str()))
        .filter(|e| releasable_ids.contains(e.primary_id.as_str()))
    {
        if let Some(entity) = &edge.entity_id {
            report.flag(
                entity.clone(),
                format!("File {} is missing parent {}", edge.primary_id, edge.parent_id),
            );
        }
    }
    report
}
