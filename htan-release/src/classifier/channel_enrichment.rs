//! Channel metadata columns for releasable imaging files
//!
//! Advisory enrichment: an unresolved channel never removes a row, it is
//! recorded with a sentinel value instead.

use crate::error::ReleaseResult;
use crate::models::{Component, FileEntry, Fileview, ManifestRecord};
use crate::services::{resolve_reference, ChildrenLookup, Resolution};
use crate::validators::channel::{channel_reference, index_imaging, ChannelResolution, NOT_APPLICABLE};
use htan_common::config::CenterConfig;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

/// Sentinel stored for a channel file that could not be resolved
pub const CHANNEL_NOT_FOUND: &str = "Channel file not found";

/// Channel metadata id and version attached to one entity
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelColumns {
    pub id: Option<String>,
    pub version: Option<String>,
}

/// Resolve channel columns for the releasable imaging subset
///
/// Pairs already resolved by validation are reused; any other pair goes
/// through the same path resolver.
pub async fn enrich_channels(
    releasable: &[FileEntry],
    imaging: &[ManifestRecord],
    known: &ChannelResolution,
    fileview: &Fileview,
    centers: &BTreeMap<String, CenterConfig>,
    lookup: &dyn ChildrenLookup,
) -> ReleaseResult<HashMap<String, ChannelColumns>> {
    let by_entity = index_imaging(imaging);
    let mut by_pair: HashMap<(String, String), ChannelColumns> = HashMap::new();
    let mut enriched = HashMap::new();

    for entry in releasable.iter().filter(|e| e.component == Component::ImagingLevel2) {
        let Some(channel) = channel_reference(&by_entity, &entry.entity_id) else {
            continue;
        };
        if channel == NOT_APPLICABLE {
            continue;
        }

        let pair = (entry.center.clone(), channel.to_string());
        if !by_pair.contains_key(&pair) {
            let resolved = match known.resolved_id(&entry.center, channel) {
                Some(id) => Some(id.to_string()),
                None if known.is_missing(&entry.center, channel) => None,
                None => {
                    let root = centers.get(&entry.center).map(|c| c.storage_root_id.as_str());
                    match resolve_reference(root, channel, lookup).await? {
                        Resolution::Resolved(id) => Some(id),
                        Resolution::Missing { .. } => None,
                    }
                }
            };
            by_pair.insert(pair.clone(), columns_for(resolved, channel, fileview));
        }

        if let Some(columns) = by_pair.get(&pair) {
            enriched.insert(entry.entity_id.clone(), columns.clone());
        }
    }
    Ok(enriched)
}

fn columns_for(resolved: Option<String>, channel: &str, fileview: &Fileview) -> ChannelColumns {
    match resolved {
        Some(id) => {
            let version = fileview.current_version(&id).map(|v| v.to_string());
            if version.is_none() {
                warn!(channel_id = %id, "Channel file {} has no fileview version", channel);
            }
            ChannelColumns {
                id: Some(id),
                version,
            }
        }
        None => {
            warn!("Channel metadata file {} not found", channel);
            ChannelColumns {
                id: Some(CHANNEL_NOT_FOUND.to_string()),
                version: Some(CHANNEL_NOT_FOUND.to_string()),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::columns;
    use crate::services::ChildEntry;
    use async_trait::async_trait;

    struct EmptyLookup;

    #[async_trait]
    impl ChildrenLookup for EmptyLookup {
        async fn children(&self, _parent_id: &str) -> ReleaseResult<Vec<ChildEntry>> {
            Ok(vec![])
        }
    }

    fn imaging(entity: &str, channel: &str) -> (FileEntry, ManifestRecord) {
        let record = ManifestRecord::new(Component::ImagingLevel2, "HTAN A", "syn9", 1)
            .with(columns::ENTITY_ID, entity)
            .with(columns::CHANNEL_METADATA_FILENAME, channel);
        let entry = FileEntry {
            entity_id: entity.to_string(),
            data_file_id: Some("HTA1_1_1".to_string()),
            filename: Some("img.tiff".to_string()),
            manifest_id: "syn9".to_string(),
            manifest_version: 1,
            center: "HTAN A".to_string(),
            component: Component::ImagingLevel2,
            id: None,
        };
        (entry, record)
    }

    #[tokio::test]
    async fn test_resolved_and_unresolved_channels() {
        let (a, ra) = imaging("syn1", "syn00000001");
        let (b, rb) = imaging("syn2", "channels/ch.csv");
        let (c, rc) = imaging("syn3", NOT_APPLICABLE);

        let mut fileview = Fileview::new();
        fileview.insert("syn00000001", 4);

        let known = ChannelResolution::default();
        let centers = BTreeMap::from([(
            "HTAN A".to_string(),
            CenterConfig {
                center_id: "hta1".to_string(),
                storage_root_id: "proj1".to_string(),
            },
        )]);

        let enriched = enrich_channels(&[a, b, c], &[ra, rb, rc], &known, &fileview, &centers, &EmptyLookup)
            .await
            .unwrap();

        assert_eq!(
            enriched.get("syn1"),
            Some(&ChannelColumns {
                id: Some("syn00000001".to_string()),
                version: Some("4".to_string()),
            })
        );
        assert_eq!(enriched["syn2"].id.as_deref(), Some(CHANNEL_NOT_FOUND));
        assert_eq!(enriched["syn2"].version.as_deref(), Some(CHANNEL_NOT_FOUND));
        assert!(!enriched.contains_key("syn3"));
    }

    #[tokio::test]
    async fn test_resolved_id_without_version_keeps_row() {
        let (a, ra) = imaging("syn1", "channels/ch.csv");
        let mut known = ChannelResolution::default();
        known.resolved.insert(
            ("HTAN A".to_string(), "channels/ch.csv".to_string()),
            "syn50000000".to_string(),
        );

        let enriched = enrich_channels(
            &[a],
            &[ra],
            &known,
            &Fileview::new(),
            &BTreeMap::new(),
            &EmptyLookup,
        )
        .await
        .unwrap();
        assert_eq!(enriched["syn1"].id.as_deref(), Some("syn50000000"));
        assert_eq!(enriched["syn1"].version, None);
    }
}
