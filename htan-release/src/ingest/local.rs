//! Manifest source backed by a local snapshot directory
//!
//! The snapshot holds an index CSV (one row per storage manifest) and the
//! manifest CSVs themselves at paths relative to the snapshot directory.

use super::{ManifestDescriptor, ManifestSource};
use crate::error::{ReleaseError, ReleaseResult};
use crate::models::fileview::parse_version;
use async_trait::async_trait;
use htan_common::Table;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Reads manifests exported to the local filesystem
pub struct LocalManifestSource {
    dir: PathBuf,
    index_path: PathBuf,
}

impl LocalManifestSource {
    /// `index_file` is resolved relative to `dir` unless absolute
    pub fn new(dir: impl Into<PathBuf>, index_file: impl AsRef<Path>) -> Self {
        let dir = dir.into();
        let index_path = dir.join(index_file);
        Self { dir, index_path }
    }

    fn descriptors_from_index(&self, index: &Table) -> ReleaseResult<Vec<ManifestDescriptor>> {
        for required in ["id", "name", "parentId", "projectId"] {
            if !index.has_column(required) {
                return Err(ReleaseError::Storage(format!(
                    "manifest index {} is missing column '{}'",
                    self.index_path.display(),
                    required
                )));
            }
        }

        let mut descriptors = Vec::with_capacity(index.len());
        for row in 0..index.len() {
            let cell = |column: &str| index.cell(row, column).map(str::to_string);
            let (Some(id), Some(name), Some(parent_id), Some(project_id)) =
                (cell("id"), cell("name"), cell("parentId"), cell("projectId"))
            else {
                warn!(row = row, "Manifest index row is incomplete, skipping");
                continue;
            };
            descriptors.push(ManifestDescriptor {
                id,
                name,
                parent_id,
                project_id,
                version: index
                    .cell(row, "versionNumber")
                    .and_then(parse_version)
                    .unwrap_or(1),
                modified_on: index
                    .cell(row, "modifiedOn")
                    .and_then(parse_version)
                    .unwrap_or(0),
                location: cell("path"),
            });
        }
        Ok(descriptors)
    }
}

#[async_trait]
impl ManifestSource for LocalManifestSource {
    async fn list_manifests(&self) -> ReleaseResult<Vec<ManifestDescriptor>> {
        let bytes = tokio::fs::read(&self.index_path).await.map_err(|e| {
            ReleaseError::Storage(format!(
                "manifest index {} unreadable: {}",
                self.index_path.display(),
                e
            ))
        })?;
        let index = Table::from_csv_reader(bytes.as_slice())?;
        let descriptors = self.descriptors_from_index(&index)?;
        debug!(count = descriptors.len(), "Manifest index read");
        Ok(descriptors)
    }

    async fn fetch_manifest(&self, descriptor: &ManifestDescriptor) -> ReleaseResult<Table> {
        let location = descriptor
            .location
            .as_deref()
            .ok_or_else(|| ReleaseError::Storage(format!("manifest {} has no path", descriptor.id)))?;
        let path = self.dir.join(location);
        let bytes = tokio::fs::read(&path).await?;
        Ok(Table::from_csv_reader(bytes.as_slice())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_reads_index_and_manifest() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("index.csv"),
            "id,name,parentId,projectId,versionNumber,modifiedOn,path\n\
             syn1,synapse_storage_manifest_a.csv,ds1,proj1,3,1700000000000,manifests/a.csv\n\
             syn2,,ds2,proj1,1,1,\n",
        )
        .unwrap();
        std::fs::create_dir(dir.path().join("manifests")).unwrap();
        std::fs::write(
            dir.path().join("manifests/a.csv"),
            "Component,HTAN Biospecimen ID\nBiospecimen,HTA1_1_1\n",
        )
        .unwrap();

        let source = LocalManifestSource::new(dir.path(), "index.csv");
        let listed = source.list_manifests().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].version, 3);
        assert_eq!(listed[0].modified_on, 1_700_000_000_000);

        let table = source.fetch_manifest(&listed[0]).await.unwrap();
        assert_eq!(table.cell(0, "HTAN Biospecimen ID"), Some("HTA1_1_1"));
    }

    #[tokio::test]
    async fn test_missing_index_is_storage_error() {
        let dir = TempDir::new().unwrap();
        let source = LocalManifestSource::new(dir.path(), "index.csv");
        assert!(matches!(
            source.list_manifests().await,
            Err(ReleaseError::Storage(_))
        ));
    }
}
