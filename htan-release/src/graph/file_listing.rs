//! Flat file listing

use crate::models::columns;
use crate::models::{Component, FileEntry, ManifestRecord, ManifestSet};
use std::collections::HashSet;
use tracing::debug;

/// Project every file-producing record into a `FileEntry`
///
/// Components are selected by substring match against `file_components`.
/// Accessory manifests describe folders: their entity comes from the
/// accessory id column and they carry no data file id or filename. Rows
/// without an entity are dropped; exact duplicate rows keep the first.
pub fn build_file_listing(manifests: &ManifestSet, file_components: &[String]) -> Vec<FileEntry> {
    let mut seen = HashSet::new();
    let mut listing = Vec::new();
    let mut missing_entity = 0usize;

    for (name, records) in manifests.iter() {
        let component = Component::from(name);
        if !component.matches_any(file_components) {
            continue;
        }
        for record in records {
            match project(&component, record) {
                Some(entry) => {
                    if seen.insert(entry.clone()) {
                        listing.push(entry);
                    }
                }
                None => missing_entity += 1,
            }
        }
    }

    if missing_entity > 0 {
        debug!(rows = missing_entity, "File listing rows without entity id dropped");
    }
    listing
}

fn project(component: &Component, record: &ManifestRecord) -> Option<FileEntry> {
    let (entity_id, data_file_id, filename) = if component.is_accessory() {
        (record.get(columns::ACCESSORY_ENTITY_ID)?, None, None)
    } else {
        (record.entity_id()?, record.data_file_id(), record.filename())
    };

    Some(FileEntry {
        entity_id: entity_id.to_string(),
        data_file_id: data_file_id.map(str::to_string),
        filename: filename.map(str::to_string),
        manifest_id: record.manifest_id.clone(),
        manifest_version: record.manifest_version,
        center: record.center.clone(),
        component: component.clone(),
        id: record
            .get(columns::ID)
            .or_else(|| record.get(columns::UUID))
            .map(str::to_string),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens() -> Vec<String> {
        vec!["Level".to_string(), "Accessory".to_string()]
    }

    fn file(entity: &str, file_id: &str) -> ManifestRecord {
        ManifestRecord::new(Component::from("ScRNA-seqLevel1"), "HTAN A", "syn9", 2)
            .with(columns::ENTITY_ID, entity)
            .with(columns::DATA_FILE_ID, file_id)
            .with(columns::FILENAME, "dir/a.fastq")
    }

    #[test]
    fn test_selects_file_components_only() {
        let mut set = ManifestSet::new();
        set.push_manifest(&Component::from("ScRNA-seqLevel1"), vec![file("syn1", "HTA1_1_1")]);
        set.push_manifest(
            &Component::Biospecimen,
            vec![ManifestRecord::new(Component::Biospecimen, "HTAN A", "syn8", 1)
                .with(columns::ENTITY_ID, "syn2")],
        );

        let listing = build_file_listing(&set, &tokens());
        assert_eq!(listing.len(), 1);
        assert_eq!(listing[0].entity_id, "syn1");
        assert_eq!(listing[0].manifest_version, 2);
        assert_eq!(listing[0].center, "HTAN A");
    }

    #[test]
    fn test_accessory_rows_are_folders() {
        let mut set = ManifestSet::new();
        let accessory = ManifestRecord::new(Component::AccessoryManifest, "HTAN A", "syn7", 1)
            .with(columns::ENTITY_ID, "syn100")
            .with(columns::ACCESSORY_ENTITY_ID, "syn200")
            .with(columns::DATA_FILE_ID, "HTA1_1_9")
            .with(columns::FILENAME, "folder");
        set.push_manifest(&Component::AccessoryManifest, vec![accessory]);

        let listing = build_file_listing(&set, &tokens());
        assert_eq!(listing[0].entity_id, "syn200");
        assert_eq!(listing[0].data_file_id, None);
        assert_eq!(listing[0].filename, None);
    }

    #[test]
    fn test_id_falls_back_to_uuid_and_duplicates_dropped() {
        let mut set = ManifestSet::new();
        let with_uuid = file("syn1", "HTA1_1_1").with(columns::UUID, "u-1");
        let with_id = file("syn2", "HTA1_1_2").with(columns::ID, "i-2").with(columns::UUID, "u-2");
        let no_entity = ManifestRecord::new(Component::from("ScRNA-seqLevel1"), "HTAN A", "syn9", 2)
            .with(columns::DATA_FILE_ID, "HTA1_1_3");
        set.push_manifest(
            &Component::from("ScRNA-seqLevel1"),
            vec![with_uuid.clone(), with_id, with_uuid, no_entity],
        );

        let listing = build_file_listing(&set, &tokens());
        assert_eq!(listing.len(), 2);
        assert_eq!(listing[0].id.as_deref(), Some("u-1"));
        assert_eq!(listing[1].id.as_deref(), Some("i-2"));
    }
}
