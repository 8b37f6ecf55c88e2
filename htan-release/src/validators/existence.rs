//! Existence in the authoritative entity listing

use super::{CheckReport, CheckerKind};
use crate::models::{FileEntry, Fileview};

pub const MISSING_ENTITY_MESSAGE: &str = "entity does not exist in storage";

/// Flag candidate files absent from the fileview; accessory folders are skipped
pub fn check_entity_exists(fileview: &Fileview, candidates: &[FileEntry]) -> CheckReport {
    let mut report = CheckReport::new(CheckerKind::EntityExists);
    for entry in candidates
        .iter()
        .filter(|e| !e.component.is_accessory())
        .filter(|e| !fileview.contains(&e.entity_id))
    {
        report.flag(entry.entity_id.clone(), MISSING_ENTITY_MESSAGE);
    }
    report
}
