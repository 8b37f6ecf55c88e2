//! Channel metadata file resolution for imaging files
//!
//! Every distinct (center, channel metadata filename) pair among candidate
//! imaging files is resolved once. Backend ids are accepted as given; other
//! references are walked as paths below the center's storage root.

use super::{CheckReport, CheckerKind};
use crate::error::ReleaseResult;
use crate::models::columns;
use crate::models::{Component, FileEntry, ManifestRecord};
use crate::services::{resolve_reference, ChildrenLookup, Resolution};
use htan_common::config::CenterConfig;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tracing::{debug, warn};

/// Value meaning no channel file applies
pub const NOT_APPLICABLE: &str = "Not Applicable";

/// (center name, channel metadata filename)
pub type ChannelPair = (String, String);

/// Resolution results shared with release enrichment
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelResolution {
    pub resolved: BTreeMap<ChannelPair, String>,
    pub missing: BTreeSet<ChannelPair>,
    /// Auxiliary reference files pointed to by imaging files
    pub aux_files: BTreeSet<String>,
}

impl ChannelResolution {
    pub fn resolved_id(&self, center: &str, filename: &str) -> Option<&str> {
        self.resolved
            .get(&(center.to_string(), filename.to_string()))
            .map(String::as_str)
    }

    pub fn is_missing(&self, center: &str, filename: &str) -> bool {
        self.missing
            .contains(&(center.to_string(), filename.to_string()))
    }
}

/// Channel metadata filenames recorded for an imaging entity, in record
/// order without repeats
pub fn channel_references<'a>(
    imaging_by_entity: &HashMap<&str, Vec<&'a ManifestRecord>>,
    entity_id: &str,
) -> Vec<&'a str> {
    let mut references: Vec<&'a str> = Vec::new();
    for record in imaging_by_entity.get(entity_id).into_iter().flatten().copied() {
        if let Some(channel) = record.get(columns::CHANNEL_METADATA_FILENAME) {
            if !references.contains(&channel) {
                references.push(channel);
            }
        }
    }
    references
}

/// First channel metadata filename recorded for an imaging entity
pub fn channel_reference<'a>(
    imaging_by_entity: &HashMap<&str, Vec<&'a ManifestRecord>>,
    entity_id: &str,
) -> Option<&'a str> {
    channel_references(imaging_by_entity, entity_id).into_iter().next()
}

/// Every imaging record per entity id
pub fn index_imaging(imaging: &[ManifestRecord]) -> HashMap<&str, Vec<&ManifestRecord>> {
    let mut by_entity: HashMap<&str, Vec<&ManifestRecord>> = HashMap::new();
    for record in imaging {
        if let Some(entity) = record.entity_id() {
            by_entity.entry(entity).or_default().push(record);
        }
    }
    by_entity
}

/// Resolve channel files of candidate imaging entities and flag the
/// entities whose reference cannot be resolved
pub async fn check_channel_files(
    candidates: &[FileEntry],
    imaging: &[ManifestRecord],
    centers: &BTreeMap<String, CenterConfig>,
    lookup: &dyn ChildrenLookup,
) -> ReleaseResult<(CheckReport, ChannelResolution)> {
    let by_entity = index_imaging(imaging);
    let imaging_candidates: Vec<&FileEntry> = candidates
        .iter()
        .filter(|e| e.component == Component::ImagingLevel2)
        .collect();

    let mut resolution = ChannelResolution::default();
    let mut pairs: BTreeSet<ChannelPair> = BTreeSet::new();

    for entry in &imaging_candidates {
        let Some(records) = by_entity.get(entry.entity_id.as_str()) else {
            continue;
        };
        for record in records {
            for column in [columns::MERFISH_POSITIONS_FILE, columns::MERFISH_CODEBOOK_FILE] {
                if let Some(aux) = record.get(column) {
                    resolution.aux_files.insert(aux.to_string());
                }
            }
            if let Some(channel) = record.get(columns::CHANNEL_METADATA_FILENAME) {
                if channel != NOT_APPLICABLE {
                    pairs.insert((entry.center.clone(), channel.to_string()));
                }
            }
        }
    }

    for (center, channel) in pairs {
        let root = centers.get(&center).map(|c| c.storage_root_id.as_str());
        if root.is_none() {
            warn!(center = %center, "No storage root configured for center");
        }
        match resolve_reference(root, &channel, lookup).await? {
            Resolution::Resolved(id) => {
                debug!(center = %center, channel = %channel, id = %id, "Channel file resolved");
                resolution.aux_files.insert(id.clone());
                resolution.resolved.insert((center, channel), id);
            }
            Resolution::Missing { segment } => {
                warn!(
                    center = %center,
                    segment = %segment,
                    "Channel metadata file {} not found",
                    channel
                );
                resolution.missing.insert((center, channel));
            }
        }
    }

    let mut report = CheckReport::new(CheckerKind::ChannelFileResolution);
    for entry in imaging_candidates {
        let references = channel_references(&by_entity, &entry.entity_id);
        if let Some(channel) = references
            .into_iter()
            .find(|c| resolution.is_missing(&entry.center, c))
        {
            report.flag(
                entry.entity_id.clone(),
                format!("Channel metadata file \"{}\" not found", channel),
            );
        }
    }

    Ok((report, resolution))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{ChildEntry, TableChildrenLookup};
    use async_trait::async_trait;
    use htan_common::Table;

    struct NoLookup;

    #[async_trait]
    impl ChildrenLookup for NoLookup {
        async fn children(&self, parent_id: &str) -> ReleaseResult<Vec<ChildEntry>> {
            panic!("children lookup called for {parent_id}");
        }
    }

    fn centers() -> BTreeMap<String, CenterConfig> {
        BTreeMap::from([(
            "HTAN A".to_string(),
            CenterConfig {
                center_id: "hta1".to_string(),
                storage_root_id: "proj1".to_string(),
            },
        )])
    }

    fn imaging(entity: &str, channel: Option<&str>) -> (FileEntry, ManifestRecord) {
        let mut record = ManifestRecord::new(Component::ImagingLevel2, "HTAN A", "syn9", 1)
            .with(columns::ENTITY_ID, entity);
        record.set(columns::CHANNEL_METADATA_FILENAME, channel);
        let entry = FileEntry {
            entity_id: entity.to_string(),
            data_file_id: Some("HTA1_1_1".to_string()),
            filename: Some("img.ome.tiff".to_string()),
            manifest_id: "syn9".to_string(),
            manifest_version: 1,
            center: "HTAN A".to_string(),
            component: Component::ImagingLevel2,
            id: None,
        };
        (entry, record)
    }

    #[tokio::test]
    async fn test_direct_id_needs_no_lookup() {
        let (entry, record) = imaging("syn1", Some("syn00000001"));
        let (report, resolution) = check_channel_files(&[entry], &[record], &centers(), &NoLookup)
            .await
            .unwrap();
        assert!(report.is_empty());
        assert_eq!(resolution.resolved_id("HTAN A", "syn00000001"), Some("syn00000001"));
        assert!(resolution.aux_files.contains("syn00000001"));
    }

    #[tokio::test]
    async fn test_not_applicable_and_null_skipped() {
        let (a, ra) = imaging("syn1", Some(NOT_APPLICABLE));
        let (b, rb) = imaging("syn2", None);
        let (report, resolution) = check_channel_files(&[a, b], &[ra, rb], &centers(), &NoLookup)
            .await
            .unwrap();
        assert!(report.is_empty());
        assert!(resolution.resolved.is_empty());
    }

    #[tokio::test]
    async fn test_path_walk_resolves_and_flags_missing() {
        let children = TableChildrenLookup::from_table(
            &Table::from_csv_reader(
                "parentId,name,id,type\nproj1,channels,syn20000000,folder\nsyn20000000,ch.csv,syn30000000,file\n"
                    .as_bytes(),
            )
            .unwrap(),
        )
        .unwrap();

        let (a, ra) = imaging("syn1", Some("channels/ch.csv"));
        let (b, rb) = imaging("syn2", Some("channels/absent.csv"));
        let ra = ra.with(columns::MERFISH_CODEBOOK_FILE, "syn40000000");

        let (report, resolution) = check_channel_files(&[a, b], &[ra, rb], &centers(), &children)
            .await
            .unwrap();

        assert_eq!(resolution.resolved_id("HTAN A", "channels/ch.csv"), Some("syn30000000"));
        assert!(resolution.aux_files.contains("syn40000000"));
        assert_eq!(report.len(), 1);
        assert_eq!(
            report.message("syn2"),
            Some("Channel metadata file \"channels/absent.csv\" not found")
        );
    }

    #[tokio::test]
    async fn test_unknown_center_is_missing() {
        let (mut entry, record) = imaging("syn1", Some("channels/ch.csv"));
        entry.center = "HTAN Z".to_string();
        let (report, _) = check_channel_files(&[entry], &[record], &centers(), &NoLookup)
            .await
            .unwrap();
        assert!(report.contains("syn1"));
    }

    #[tokio::test]
    async fn test_every_imaging_record_of_an_entity_is_checked() {
        let children = TableChildrenLookup::from_table(
            &Table::from_csv_reader(
                "parentId,name,id,type\nproj1,ch.csv,syn30000000,file\n".as_bytes(),
            )
            .unwrap(),
        )
        .unwrap();

        let (entry, first) = imaging("syn1", Some("ch.csv"));
        let (_, second) = imaging("syn1", Some("gone.csv"));
        let second = second.with(columns::MERFISH_POSITIONS_FILE, "syn50000000");

        let (report, resolution) =
            check_channel_files(&[entry], &[first, second], &centers(), &children)
                .await
                .unwrap();

        assert_eq!(resolution.resolved_id("HTAN A", "ch.csv"), Some("syn30000000"));
        assert!(resolution.is_missing("HTAN A", "gone.csv"));
        assert!(resolution.aux_files.contains("syn50000000"));
        assert_eq!(
            report.message("syn1"),
            Some("Channel metadata file \"gone.csv\" not found")
        );
    }
}
