//! Manifest version list
//!
//! Manifests contributing to the release: those of releasable entities,
//! plus the clinical and biospecimen manifests describing the participants
//! and assayed biospecimens those entities derive from.

use crate::models::columns;
use crate::models::{FileEntry, Fileview, ManifestSet, ProvenanceTable};
use htan_common::Table;
use std::collections::{HashMap, HashSet};

/// Build `Manifest_Id, Manifest_Version` rows (versions from the fileview)
pub fn build_manifest_list(
    releasable: &[FileEntry],
    manifests: &ManifestSet,
    provenance: &ProvenanceTable,
    fileview: &Fileview,
    clinical_components: &[String],
    biospecimen_components: &[String],
) -> Table {
    let mut ordered: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    let mut add = |id: &str| {
        if seen.insert(id.to_string()) {
            ordered.push(id.to_string());
        }
    };

    for entry in releasable {
        add(entry.manifest_id.as_str());
    }

    let released_file_ids: HashSet<&str> = releasable
        .iter()
        .filter_map(|e| e.data_file_id.as_deref())
        .collect();
    let lineage: Vec<_> = provenance
        .rows()
        .iter()
        .filter(|r| {
            r.data_file_id
                .as_deref()
                .is_some_and(|id| released_file_ids.contains(id))
        })
        .collect();

    for component in clinical_components {
        let by_participant = manifests_by_key(manifests, component, columns::PARTICIPANT_ID);
        for row in &lineage {
            if let Some(ids) = row.participant_id.as_deref().and_then(|p| by_participant.get(p)) {
                ids.iter().for_each(|id| add(*id));
            }
        }
    }

    for component in biospecimen_components {
        let by_biospecimen = manifests_by_key(manifests, component, columns::BIOSPECIMEN_ID);
        for row in &lineage {
            if let Some(ids) = row
                .assayed_biospecimen_id
                .as_deref()
                .and_then(|b| by_biospecimen.get(b))
            {
                ids.iter().for_each(|id| add(*id));
            }
        }
    }

    let mut table = Table::new([columns::MANIFEST_ID, columns::MANIFEST_VERSION]);
    for id in ordered {
        let version = fileview.current_version(&id).map(|v| v.to_string());
        table.push_row(vec![Some(id), version]);
    }
    table
}

/// Key value -> distinct manifest ids of records carrying it
fn manifests_by_key<'a>(
    manifests: &'a ManifestSet,
    component: &str,
    key_column: &str,
) -> HashMap<&'a str, Vec<&'a str>> {
    let mut by_key: HashMap<&str, Vec<&str>> = HashMap::new();
    for record in manifests.records(component) {
        if let Some(key) = record.get(key_column) {
            let ids = by_key.entry(key).or_default();
            if !ids.contains(&record.manifest_id.as_str()) {
                ids.push(record.manifest_id.as_str());
            }
        }
    }
    by_key
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Component, ManifestRecord, ProvenanceRow};

    #[test]
    fn test_includes_clinical_and_biospecimen_manifests() {
        let releasable = vec![FileEntry {
            entity_id: "E1".to_string(),
            data_file_id: Some("HTA1_1_3".to_string()),
            filename: Some("a.fq".to_string()),
            manifest_id: "synFile".to_string(),
            manifest_version: 1,
            center: "HTAN A".to_string(),
            component: Component::from("BulkWESLevel1"),
            id: None,
        }];

        let mut set = ManifestSet::new();
        set.push_manifest(
            &Component::Demographics,
            vec![ManifestRecord::new(Component::Demographics, "HTAN A", "synDemo", 1)
                .with(columns::PARTICIPANT_ID, "HTA1_1")],
        );
        set.push_manifest(
            &Component::Biospecimen,
            vec![
                ManifestRecord::new(Component::Biospecimen, "HTAN A", "synBio", 1)
                    .with(columns::BIOSPECIMEN_ID, "HTA1_1_2"),
                ManifestRecord::new(Component::Biospecimen, "HTAN A", "synOther", 1)
                    .with(columns::BIOSPECIMEN_ID, "HTA1_1_9"),
            ],
        );

        let provenance = ProvenanceTable::new(vec![ProvenanceRow {
            entity_id: "E1".to_string(),
            biospecimen_path: Some("HTA1_1_2".to_string()),
            participant_id: Some("HTA1_1".to_string()),
            assayed_biospecimen_id: Some("HTA1_1_2".to_string()),
            data_file_id: Some("HTA1_1_3".to_string()),
        }]);

        let mut fileview = Fileview::new();
        fileview.insert("synFile", 5);
        fileview.insert("synBio", 2);

        let table = build_manifest_list(
            &releasable,
            &set,
            &provenance,
            &fileview,
            &["Demographics".to_string()],
            &["Biospecimen".to_string()],
        );

        let ids: Vec<Option<&str>> = table.column_values("Manifest_Id").unwrap();
        assert_eq!(ids, vec![Some("synFile"), Some("synDemo"), Some("synBio")]);
        assert_eq!(table.cell(0, "Manifest_Version"), Some("5"));
        assert_eq!(table.cell(1, "Manifest_Version"), None);
    }
}
