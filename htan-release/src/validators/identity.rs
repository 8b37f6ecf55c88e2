//! Identifier uniqueness across the full file listing

use super::{quoted_list, CheckReport, CheckerKind};
use crate::models::FileEntry;
use std::collections::BTreeMap;

/// Flag every entity whose HTAN Data File ID is shared with another row
///
/// Groups the FULL listing, not only releasable candidates, so a candidate
/// colliding with an excluded or previously released file is still caught.
pub fn check_unique_file_id(listing: &[FileEntry]) -> CheckReport {
    let groups = group_entities(listing, |e| e.data_file_id.as_deref());

    let mut report = CheckReport::new(CheckerKind::UniqueFileId);
    for (id, entities) in groups.into_iter().filter(|(_, e)| e.len() > 1) {
        let message = format!("HTAN ID {} is used by entities {}", id, quoted_list(&entities));
        for entity in entities {
            report.flag(entity, message.clone());
        }
    }
    report
}

/// Flag every entity whose file basename is shared with another row
///
/// Advisory: reported for awareness, never merged into release decisions.
pub fn check_unique_filename(listing: &[FileEntry]) -> CheckReport {
    let groups = group_entities(listing, |e| e.basename().filter(|b| !b.is_empty()));

    let mut report = CheckReport::new(CheckerKind::UniqueFilename);
    for (name, entities) in groups.into_iter().filter(|(_, e)| e.len() > 1) {
        let message = format!("Filename {} is used by entities {}", name, quoted_list(&entities));
        for entity in entities {
            report.flag(entity, message.clone());
        }
    }
    report
}

fn group_entities<'a, K>(listing: &'a [FileEntry], key: K) -> BTreeMap<&'a str, Vec<&'a str>>
where
    K: Fn(&'a FileEntry) -> Option<&'a str>,
{
    let mut groups: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for entry in listing {
        if let Some(k) = key(entry) {
            groups.entry(k).or_default().push(entry.entity_id.as_str());
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Component;

    fn entry(entity: &str, file_id: Option<&str>, filename: &str) -> FileEntry {
        FileEntry {
            entity_id: entity.to_string(),
            data_file_id: file_id.map(str::to_string),
            filename: Some(filename.to_string()),
            manifest_id: "syn9".to_string(),
            manifest_version: 1,
            center: "HTAN A".to_string(),
            component: Component::from("ScRNA-seqLevel1"),
            id: None,
        }
    }

    #[test]
    fn test_duplicate_ids_flag_all_holders() {
        let listing = vec![
            entry("syn1", Some("HTA1_1_1"), "a.fq"),
            entry("syn2", Some("HTA1_1_1"), "b.fq"),
            entry("syn3", Some("HTA1_1_2"), "c.fq"),
            entry("syn4", None, "d.fq"),
            entry("syn5", None, "e.fq"),
        ];
        let report = check_unique_file_id(&listing);
        assert_eq!(report.len(), 2);
        assert_eq!(
            report.message("syn2"),
            Some("HTAN ID HTA1_1_1 is used by entities ['syn1', 'syn2']")
        );
        assert!(!report.contains("syn3"));
        assert!(!report.contains("syn4"));
    }

    #[test]
    fn test_duplicate_basenames_are_advisory() {
        let listing = vec![
            entry("syn1", Some("HTA1_1_1"), "x/a.fq"),
            entry("syn2", Some("HTA1_1_2"), "y/a.fq"),
            entry("syn3", Some("HTA1_1_3"), "y/b.fq"),
        ];
        let report = check_unique_filename(&listing);
        assert!(report.checker.is_advisory());
        assert_eq!(report.len(), 2);
        assert_eq!(
            report.message("syn1"),
            Some("Filename a.fq is used by entities ['syn1', 'syn2']")
        );
    }
}
