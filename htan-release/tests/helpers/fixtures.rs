//! In-memory collaborators and fixture builders

use async_trait::async_trait;
use htan_common::config::{CenterConfig, TomlConfig};
use htan_common::Table;
use htan_release::ingest::{ManifestDescriptor, ManifestSource};
use htan_release::models::{Fileview, ProvenanceRow, ProvenanceTable};
use htan_release::reference::ReferenceData;
use htan_release::services::{ChildEntry, ChildrenLookup};
use htan_release::sinks::SqliteWarehouse;
use htan_release::{ReleaseError, ReleaseResult, Snapshot};
use std::collections::HashMap;
use tempfile::TempDir;

pub const CENTER: &str = "HTAN A";
pub const PROJECT: &str = "synP1";

/// One configured center, default component lists
pub fn test_config() -> TomlConfig {
    let mut config = TomlConfig::default();
    config.centers.insert(
        CENTER.to_string(),
        CenterConfig {
            center_id: "hta1".to_string(),
            storage_root_id: PROJECT.to_string(),
        },
    );
    config
}

pub fn descriptor(id: &str, dataset: &str, modified_on: i64) -> ManifestDescriptor {
    ManifestDescriptor {
        id: id.to_string(),
        name: format!("synapse_storage_manifest_{}.csv", id),
        parent_id: dataset.to_string(),
        project_id: PROJECT.to_string(),
        version: 1,
        modified_on,
        location: None,
    }
}

/// Manifest source serving CSV text from memory
#[derive(Default)]
pub struct MemorySource {
    descriptors: Vec<ManifestDescriptor>,
    content: HashMap<String, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a manifest in its own dataset folder
    pub fn with_manifest(mut self, id: &str, csv: &str) -> Self {
        let modified = self.descriptors.len() as i64 + 1;
        self.descriptors
            .push(descriptor(id, &format!("dataset_{}", id), modified));
        self.content.insert(id.to_string(), csv.to_string());
        self
    }
}

#[async_trait]
impl ManifestSource for MemorySource {
    async fn list_manifests(&self) -> ReleaseResult<Vec<ManifestDescriptor>> {
        Ok(self.descriptors.clone())
    }

    async fn fetch_manifest(&self, descriptor: &ManifestDescriptor) -> ReleaseResult<Table> {
        let csv = self
            .content
            .get(&descriptor.id)
            .ok_or_else(|| ReleaseError::Storage(format!("no content for {}", descriptor.id)))?;
        Ok(Table::from_csv_reader(csv.as_bytes())?)
    }
}

/// Children lookup that must never be consulted
pub struct NoLookup;

#[async_trait]
impl ChildrenLookup for NoLookup {
    async fn children(&self, parent_id: &str) -> ReleaseResult<Vec<ChildEntry>> {
        panic!("children lookup called for {}", parent_id);
    }
}

pub fn provenance_row(entity: &str, path: &str, participant: &str, assayed: &str, file: &str) -> ProvenanceRow {
    ProvenanceRow {
        entity_id: entity.to_string(),
        biospecimen_path: Some(path.to_string()),
        participant_id: Some(participant.to_string()),
        assayed_biospecimen_id: Some(assayed.to_string()),
        data_file_id: Some(file.to_string()),
    }
}

/// Snapshot with every listed entity at the given version
pub fn snapshot(entities: &[(&str, i64)], provenance: Vec<ProvenanceRow>) -> Snapshot {
    let mut fileview = Fileview::new();
    for (entity, version) in entities {
        fileview.insert(*entity, *version);
    }
    Snapshot {
        reference: ReferenceData::new()
            .with_model_attribute("Filename", "Name of a file")
            .with_model_attribute("Component", "Schema component"),
        fileview,
        provenance: ProvenanceTable::new(provenance),
    }
}

/// Warehouse in a scratch directory; keep the TempDir alive for the test
pub async fn scratch_warehouse() -> (TempDir, SqliteWarehouse) {
    let dir = TempDir::new().unwrap();
    let warehouse = SqliteWarehouse::open(&dir.path().join("warehouse.db")).await.unwrap();
    (dir, warehouse)
}
