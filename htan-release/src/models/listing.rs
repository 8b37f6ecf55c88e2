//! Flat file listing rows

use super::Component;
use serde::{Deserialize, Serialize};

/// One file-bearing (or accessory folder) entity projected from a manifest
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FileEntry {
    /// Storage-backend handle; never null
    pub entity_id: String,
    pub data_file_id: Option<String>,
    pub filename: Option<String>,
    pub manifest_id: String,
    pub manifest_version: i64,
    pub center: String,
    pub component: Component,
    /// Fallback identifier (Id, else Uuid)
    pub id: Option<String>,
}

impl FileEntry {
    /// Last path segment of the filename
    pub fn basename(&self) -> Option<&str> {
        self.filename
            .as_deref()
            .map(|f| f.rsplit('/').next().unwrap_or(f))
    }

    /// Data file id marks an externally sourced file
    pub fn has_external_id(&self) -> bool {
        self.data_file_id.as_deref().is_some_and(|id| id.contains("EXT"))
    }

    /// Filename marks an externally sourced file
    pub fn has_external_filename(&self) -> bool {
        self.filename.as_deref().is_some_and(|f| f.contains("EXT"))
    }
}
