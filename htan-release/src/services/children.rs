//! Children lookup collaborator
//!
//! Given a storage container id, list its child entries. Used by channel
//! metadata path resolution.

use crate::error::{ReleaseError, ReleaseResult};
use async_trait::async_trait;
use htan_common::Table;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tokio::sync::Mutex;
use tracing::debug;

/// Kind of a child entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    File,
    Folder,
    Other,
}

impl EntryKind {
    /// Parse a loose type string ("folder", "file", or a fully qualified
    /// backend type name)
    pub fn parse(raw: &str) -> Self {
        let lower = raw.to_ascii_lowercase();
        if lower.contains("folder") {
            EntryKind::Folder
        } else if lower.contains("file") {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}

/// One child of a storage container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChildEntry {
    pub name: String,
    pub id: String,
    pub kind: EntryKind,
}

/// Lists the files and folders directly below a container
#[async_trait]
pub trait ChildrenLookup: Send + Sync {
    async fn children(&self, parent_id: &str) -> ReleaseResult<Vec<ChildEntry>>;
}

/// Children listing exported to a local CSV (`parentId,name,id,type`)
#[derive(Debug, Clone, Default)]
pub struct TableChildrenLookup {
    by_parent: HashMap<String, Vec<ChildEntry>>,
}

impl TableChildrenLookup {
    pub fn from_table(table: &Table) -> ReleaseResult<Self> {
        for required in ["parentId", "name", "id"] {
            if !table.has_column(required) {
                return Err(ReleaseError::Storage(format!(
                    "children listing is missing column '{}'",
                    required
                )));
            }
        }

        let mut by_parent: HashMap<String, Vec<ChildEntry>> = HashMap::new();
        for row in 0..table.len() {
            let (Some(parent), Some(name), Some(id)) = (
                table.cell(row, "parentId"),
                table.cell(row, "name"),
                table.cell(row, "id"),
            ) else {
                continue;
            };
            let kind = table.cell(row, "type").map(EntryKind::parse).unwrap_or(EntryKind::File);
            if kind == EntryKind::Other {
                continue;
            }
            by_parent.entry(parent.to_string()).or_default().push(ChildEntry {
                name: name.to_string(),
                id: id.to_string(),
                kind,
            });
        }
        Ok(Self { by_parent })
    }

    pub fn load(path: &Path) -> ReleaseResult<Self> {
        Self::from_table(&Table::from_csv_path(path)?)
    }
}

#[async_trait]
impl ChildrenLookup for TableChildrenLookup {
    async fn children(&self, parent_id: &str) -> ReleaseResult<Vec<ChildEntry>> {
        Ok(self.by_parent.get(parent_id).cloned().unwrap_or_default())
    }
}

/// Memoizes another lookup for the lifetime of a run
pub struct CachedChildrenLookup<L> {
    inner: L,
    cache: Mutex<HashMap<String, Vec<ChildEntry>>>,
}

impl<L: ChildrenLookup> CachedChildrenLookup<L> {
    pub fn new(inner: L) -> Self {
        Self {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl<L: ChildrenLookup> ChildrenLookup for CachedChildrenLookup<L> {
    async fn children(&self, parent_id: &str) -> ReleaseResult<Vec<ChildEntry>> {
        if let Some(hit) = self.cache.lock().await.get(parent_id) {
            return Ok(hit.clone());
        }
        let children = self.inner.children(parent_id).await?;
        debug!(parent_id = parent_id, count = children.len(), "Children listed");
        self.cache
            .lock()
            .await
            .insert(parent_id.to_string(), children.clone());
        Ok(children)
    }
}
