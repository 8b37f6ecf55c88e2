//! Authoritative entity listing

use htan_common::{Error, Result, Table};
use std::collections::{HashMap, HashSet};

/// Entity id -> current version for every valid file/folder in storage
#[derive(Debug, Clone, Default)]
pub struct Fileview {
    versions: HashMap<String, i64>,
    /// Entities named `*.bai`, withheld from released listings
    bai_index_files: HashSet<String>,
}

impl Fileview {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, entity_id: impl Into<String>, current_version: i64) {
        self.versions.insert(entity_id.into(), current_version);
    }

    pub fn insert_bai_index(&mut self, entity_id: impl Into<String>) {
        self.bai_index_files.insert(entity_id.into());
    }

    /// Build from a table with `id` and `currentVersion` columns and an
    /// optional `name` column
    pub fn from_table(table: &Table) -> Result<Self> {
        let ids = table
            .column_values("id")
            .ok_or_else(|| Error::InvalidInput("fileview is missing column 'id'".to_string()))?;
        let versions = table.column_values("currentVersion").ok_or_else(|| {
            Error::InvalidInput("fileview is missing column 'currentVersion'".to_string())
        })?;

        let names = table
            .column_values("name")
            .unwrap_or_else(|| vec![None; ids.len()]);

        let mut fileview = Fileview::new();
        for ((id, version), name) in ids.into_iter().zip(versions).zip(names) {
            let (Some(id), Some(version)) = (id, version) else {
                continue;
            };
            if name.is_some_and(|n| n.ends_with(".bai")) {
                fileview.insert_bai_index(id);
            }
            let version = parse_version(version).ok_or_else(|| {
                Error::InvalidInput(format!("fileview version '{}' for {} is not a number", version, id))
            })?;
            fileview.insert(id, version);
        }
        Ok(fileview)
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.versions.contains_key(entity_id)
    }

    pub fn current_version(&self, entity_id: &str) -> Option<i64> {
        self.versions.get(entity_id).copied()
    }

    pub fn is_bai_index(&self, entity_id: &str) -> bool {
        self.bai_index_files.contains(entity_id)
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }
}

/// Versions exported through float columns arrive as "3.0"
pub(crate) fn parse_version(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    raw.parse::<i64>().ok().or_else(|| {
        raw.parse::<f64>()
            .ok()
            .filter(|v| v.fract() == 0.0)
            .map(|v| v as i64)
    })
}
