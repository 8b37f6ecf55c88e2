//! Ingested manifest records

use super::columns;
use super::Component;
use std::collections::BTreeMap;

/// One row of a center's submitted manifest
///
/// Only non-null cells are stored; absent columns and empty cells both read
/// as `None`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRecord {
    pub component: Component,
    pub center: String,
    pub manifest_id: String,
    pub manifest_version: i64,
    values: BTreeMap<String, String>,
}

impl ManifestRecord {
    pub fn new(
        component: Component,
        center: impl Into<String>,
        manifest_id: impl Into<String>,
        manifest_version: i64,
    ) -> Self {
        Self {
            component,
            center: center.into(),
            manifest_id: manifest_id.into(),
            manifest_version,
            values: BTreeMap::new(),
        }
    }

    /// Builder-style cell assignment
    pub fn with(mut self, column: &str, value: &str) -> Self {
        self.set(column, Some(value));
        self
    }

    /// Set or clear a cell; empty values are stored as null
    pub fn set(&mut self, column: &str, value: Option<&str>) {
        match value {
            Some(v) if !v.trim().is_empty() => {
                self.values.insert(column.to_string(), v.to_string());
            }
            _ => {
                self.values.remove(column);
            }
        }
    }

    /// Cell value by column name
    pub fn get(&self, column: &str) -> Option<&str> {
        self.values.get(column).map(String::as_str)
    }

    pub fn entity_id(&self) -> Option<&str> {
        self.get(columns::ENTITY_ID)
    }

    pub fn data_file_id(&self) -> Option<&str> {
        self.get(columns::DATA_FILE_ID)
    }

    pub fn filename(&self) -> Option<&str> {
        self.get(columns::FILENAME)
    }

    pub fn biospecimen_id(&self) -> Option<&str> {
        self.get(columns::BIOSPECIMEN_ID)
    }

    pub fn participant_id(&self) -> Option<&str> {
        self.get(columns::PARTICIPANT_ID)
    }
}

/// All ingested records grouped by component name
///
/// Record order within a component is the concatenation order of manifests
/// as they were ingested.
#[derive(Debug, Clone, Default)]
pub struct ManifestSet {
    components: BTreeMap<String, Vec<ManifestRecord>>,
    extra_columns: BTreeMap<String, Vec<String>>,
}

impl ManifestSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one manifest's records under its component
    pub fn push_manifest(&mut self, component: &Component, records: Vec<ManifestRecord>) {
        self.components
            .entry(component.as_str().to_string())
            .or_default()
            .extend(records);
    }

    /// Record non-data-model columns found in a manifest
    pub fn record_extra_columns(&mut self, manifest_id: &str, columns: Vec<String>) {
        if !columns.is_empty() {
            self.extra_columns.insert(manifest_id.to_string(), columns);
        }
    }

    /// Records of one component (empty when the component was never seen)
    pub fn records(&self, component: &str) -> &[ManifestRecord] {
        self.components
            .get(component)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Component names with their records, in name order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[ManifestRecord])> {
        self.components
            .iter()
            .map(|(name, records)| (name.as_str(), records.as_slice()))
    }

    /// Manifest id -> non-data-model column names
    pub fn extra_columns(&self) -> &BTreeMap<String, Vec<String>> {
        &self.extra_columns
    }

    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    pub fn record_count(&self) -> usize {
        self.components.values().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_values_read_as_null() {
        let mut record = ManifestRecord::new(Component::Biospecimen, "C", "syn1", 1)
            .with(columns::BIOSPECIMEN_ID, "HTA1_1_1");
        record.set(columns::FILENAME, Some("   "));

        assert_eq!(record.biospecimen_id(), Some("HTA1_1_1"));
        assert_eq!(record.filename(), None);
        assert_eq!(record.get("Unknown Column"), None);
    }

    #[test]
    fn test_manifests_concatenate_per_component() {
        let mut set = ManifestSet::new();
        let a = ManifestRecord::new(Component::Biospecimen, "A", "syn1", 1).with("k", "1");
        let b = ManifestRecord::new(Component::Biospecimen, "B", "syn2", 3).with("k", "2");
        set.push_manifest(&Component::Biospecimen, vec![a]);
        set.push_manifest(&Component::Biospecimen, vec![b]);

        let records = set.records("Biospecimen");
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].manifest_id, "syn1");
        assert_eq!(records[1].manifest_id, "syn2");
        assert!(set.records("Demographics").is_empty());
        assert_eq!(set.record_count(), 2);
    }

    #[test]
    fn test_empty_extra_columns_not_recorded() {
        let mut set = ManifestSet::new();
        set.record_extra_columns("syn1", vec![]);
        set.record_extra_columns("syn2", vec!["Notes".to_string()]);
        assert_eq!(set.extra_columns().len(), 1);
    }
}
