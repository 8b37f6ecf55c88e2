//! Errored entity tables

use super::entities::{entity_cells, ENTITY_COLUMNS};
use crate::classifier::ErroredEntry;
use crate::models::columns;
use crate::models::FileEntry;
use crate::validators::CheckReport;
use htan_common::Table;

pub const ERRORS_COLUMN: &str = "Errors";

/// Separator between the messages of one errored entity
pub const ERROR_SEPARATOR: &str = "; ";

/// Errored entities with their joined messages, in partition order
pub fn build_errors(errored: &[ErroredEntry]) -> Table {
    let mut header: Vec<&str> = ENTITY_COLUMNS.to_vec();
    header.push(ERRORS_COLUMN);

    let mut table = Table::new(header);
    for errored_entry in errored {
        let mut row = entity_cells(&errored_entry.entry);
        row.push(Some(errored_entry.joined_messages(ERROR_SEPARATOR)));
        table.push_row(row);
    }
    table.with_sanitized_columns()
}

/// (center, message) pairs of duplicate biospecimen/participant findings
/// that touch a candidate entity
pub fn build_clin_bio_errors(candidates: &[FileEntry], reports: &[&CheckReport]) -> Table {
    let mut table = Table::new([columns::CENTER, ERRORS_COLUMN]);
    for report in reports {
        for entry in candidates {
            if let Some(message) = report.message(&entry.entity_id) {
                table.push_row(vec![Some(entry.center.clone()), Some(message.to_string())]);
            }
        }
    }
    table.dedup_rows();
    table.with_sanitized_columns()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Finding;
    use crate::models::Component;
    use crate::validators::CheckerKind;

    fn entry(entity: &str) -> FileEntry {
        FileEntry {
            entity_id: entity.to_string(),
            data_file_id: Some("HTA1_1_1".to_string()),
            filename: Some("a.fq".to_string()),
            manifest_id: "syn9".to_string(),
            manifest_version: 1,
            center: "HTAN A".to_string(),
            component: Component::from("BulkWESLevel1"),
            id: None,
        }
    }

    #[test]
    fn test_errors_join_messages() {
        let errored = vec![ErroredEntry {
            entry: entry("syn1"),
            findings: vec![
                Finding {
                    checker: CheckerKind::UniqueFileId,
                    message: "dup".to_string(),
                },
                Finding {
                    checker: CheckerKind::EntityExists,
                    message: "missing".to_string(),
                },
            ],
        }];
        let table = build_errors(&errored);
        assert_eq!(table.cell(0, "Errors"), Some("dup; missing"));
        assert_eq!(table.cell(0, "HTAN_Center"), Some("HTAN A"));
        assert_eq!(table.cell(0, "entityId"), Some("syn1"));
    }

    #[test]
    fn test_clin_bio_errors_dedup_per_center() {
        let mut bios = CheckReport::new(CheckerKind::UniqueBiospecimen);
        bios.flag("syn1", "Multiple records found for parent biospecimen B1 in manifests ['a', 'b']");
        bios.flag("syn2", "Multiple records found for parent biospecimen B1 in manifests ['a', 'b']");
        bios.flag("syn9", "not a candidate");
        let demo = CheckReport::new(CheckerKind::UniqueDemographics);

        let table = build_clin_bio_errors(&[entry("syn1"), entry("syn2")], &[&bios, &demo]);
        assert_eq!(table.columns(), &["HTAN_Center", "Errors"]);
        assert_eq!(table.len(), 1);
    }
}
