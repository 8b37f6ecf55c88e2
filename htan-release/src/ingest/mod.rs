//! Manifest ingestion
//!
//! `ManifestSource` is the storage-side collaborator: it lists submitted
//! manifests and returns their raw tables. `ManifestStore` turns those tables
//! into a `ManifestSet`:
//!
//! 1. Keep storage manifests outside excluded projects
//! 2. Keep only the latest manifest per dataset folder
//! 3. Map each project to a configured center (unknown projects skipped)
//! 4. Drop BAI rows, read the component, check required attributes
//! 5. Collect non-data-model columns, stamp manifest id/version/center

pub mod local;
pub mod schema;

pub use local::LocalManifestSource;
pub use schema::{check_required_attributes, SchemaCheck};

use crate::error::ReleaseResult;
use crate::models::columns;
use crate::models::{Component, ManifestRecord, ManifestSet};
use crate::reference::ReferenceData;
use async_trait::async_trait;
use htan_common::config::TomlConfig;
use htan_common::Table;
use std::collections::BTreeMap;
use tracing::{debug, info, warn};

/// Name prefix of storage manifests
pub const MANIFEST_NAME_PREFIX: &str = "synapse_storage_manifest";

/// One submitted manifest as listed by the storage backend
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestDescriptor {
    pub id: String,
    pub name: String,
    /// Dataset folder holding the manifest
    pub parent_id: String,
    pub project_id: String,
    pub version: i64,
    /// Modification time (ms since epoch)
    pub modified_on: i64,
    /// Location of the manifest content, source-specific
    pub location: Option<String>,
}

/// Storage-side manifest collaborator
#[async_trait]
pub trait ManifestSource: Send + Sync {
    /// Every manifest-like file known to storage
    async fn list_manifests(&self) -> ReleaseResult<Vec<ManifestDescriptor>>;

    /// Raw content of one manifest
    async fn fetch_manifest(&self, descriptor: &ManifestDescriptor) -> ReleaseResult<Table>;
}

/// Ingestion summary counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub listed: usize,
    pub selected: usize,
    pub ingested: usize,
    pub skipped: usize,
    pub schema_warnings: usize,
}

/// Builds the component-grouped record set from a manifest source
pub struct ManifestStore<'a> {
    config: &'a TomlConfig,
    reference: &'a ReferenceData,
}

impl<'a> ManifestStore<'a> {
    pub fn new(config: &'a TomlConfig, reference: &'a ReferenceData) -> Self {
        Self { config, reference }
    }

    /// Ingest every current manifest
    ///
    /// # Errors
    /// `SchemaViolation` when a Level-1/Auxiliary manifest lacks a required
    /// column; nothing ingested so far is returned in that case.
    pub async fn ingest(
        &self,
        source: &dyn ManifestSource,
    ) -> ReleaseResult<(ManifestSet, IngestStats)> {
        let listed = source.list_manifests().await?;
        let mut stats = IngestStats {
            listed: listed.len(),
            ..Default::default()
        };

        let selected = self.select_latest(listed);
        stats.selected = selected.len();
        info!(
            listed = stats.listed,
            selected = stats.selected,
            "Selected latest manifest per dataset"
        );

        let mut set = ManifestSet::new();
        for descriptor in &selected {
            let Some((center, _)) = self.config.center_for_project(&descriptor.project_id) else {
                debug!(project_id = %descriptor.project_id, "Project is not a configured center, skipping");
                stats.skipped += 1;
                continue;
            };

            let table = match source.fetch_manifest(descriptor).await {
                Ok(table) => table,
                Err(e) => {
                    warn!(manifest_id = %descriptor.id, "Manifest could not be fetched: {}", e);
                    stats.skipped += 1;
                    continue;
                }
            };

            match self.ingest_table(&mut set, descriptor, center, table)? {
                Some(check) => {
                    stats.ingested += 1;
                    stats.schema_warnings += check.missing.len();
                }
                None => stats.skipped += 1,
            }
        }

        info!(
            components = set.component_count(),
            records = set.record_count(),
            ingested = stats.ingested,
            skipped = stats.skipped,
            "Manifest ingestion complete"
        );
        Ok((set, stats))
    }

    /// Filter storage manifests and keep the most recently modified one per
    /// dataset folder; output is ordered by project, then newest first
    pub fn select_latest(&self, listed: Vec<ManifestDescriptor>) -> Vec<ManifestDescriptor> {
        let mut latest: BTreeMap<String, ManifestDescriptor> = BTreeMap::new();
        for descriptor in listed {
            if !descriptor.name.starts_with(MANIFEST_NAME_PREFIX) {
                continue;
            }
            if self.config.excluded_projects.contains(&descriptor.project_id) {
                continue;
            }
            match latest.get(&descriptor.parent_id) {
                Some(current) if current.modified_on >= descriptor.modified_on => {}
                _ => {
                    latest.insert(descriptor.parent_id.clone(), descriptor);
                }
            }
        }

        let mut selected: Vec<ManifestDescriptor> = latest.into_values().collect();
        selected.sort_by(|a, b| {
            a.project_id
                .cmp(&b.project_id)
                .then(b.modified_on.cmp(&a.modified_on))
        });
        selected
    }

    /// Ingest one fetched table; `None` when the manifest is skipped
    fn ingest_table(
        &self,
        set: &mut ManifestSet,
        descriptor: &ManifestDescriptor,
        center: &str,
        mut table: Table,
    ) -> ReleaseResult<Option<SchemaCheck>> {
        // BAI index files are never released
        if let Some(format_idx) = table.column_index(columns::FILE_FORMAT) {
            table.retain_rows(|_, row| {
                !matches!(row[format_idx].as_deref().map(str::trim), Some("bai") | Some("BAI"))
            });
        }

        let component = match table.cell(0, columns::COMPONENT) {
            Some(name) => Component::from(name),
            None => {
                warn!("Component not found for manifest {}", descriptor.id);
                return Ok(None);
            }
        };

        let check = check_required_attributes(table.columns(), &component, &descriptor.id)?;

        set.record_extra_columns(&descriptor.id, self.reference.extra_columns(table.columns()));

        let records: Vec<ManifestRecord> = table
            .rows()
            .iter()
            .map(|row| {
                let mut record = ManifestRecord::new(
                    component.clone(),
                    center,
                    descriptor.id.clone(),
                    descriptor.version,
                );
                for (column, value) in table.columns().iter().zip(row) {
                    record.set(column, value.as_deref());
                }
                record.set(columns::MANIFEST_ID, Some(&descriptor.id));
                record.set(columns::CENTER, Some(center));
                record.set(columns::MANIFEST_VERSION, Some(&descriptor.version.to_string()));
                record
            })
            .collect();

        debug!(
            manifest_id = %descriptor.id,
            component = %component,
            rows = records.len(),
            "Manifest ingested"
        );
        set.push_manifest(&component, records);
        Ok(Some(check))
    }
}
