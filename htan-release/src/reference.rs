//! Read-only reference data
//!
//! Exclusion lists, the data model and supplementary attribute descriptions
//! are loaded once per run and passed explicitly to whoever needs them.

use htan_common::{Error, Result, Table};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;
use tracing::{debug, warn};

/// Maximum stored length of a column description
pub const MAX_DESCRIPTION_LEN: usize = 1024;

/// Text used when no description is known
pub const DESCRIPTION_UNAVAILABLE: &str =
    "Description unavailable. Contact DCC for more information";

/// Columns every manifest may carry without being part of the data model
const STORAGE_COLUMNS: [&str; 5] = ["entityId", "Uuid", "Id", "eTag", "index"];

/// Reference tables consumed by ingestion and release-list building
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    /// Data model attribute -> description
    model: BTreeMap<String, String>,
    /// Supplementary attribute -> description
    supplementary: BTreeMap<String, String>,
    excluded_files: HashSet<String>,
    excluded_manifests: HashSet<String>,
}

impl ReferenceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from local exports; absent optional files yield empty tables
    pub fn load(data_model: &Path, descriptions: &Path, exclusions: &Path) -> Result<Self> {
        let mut reference = ReferenceData::new();

        let model = Table::from_csv_path(data_model)?;
        reference.model = attribute_map(&model, "data model")?;

        if descriptions.exists() {
            let supplementary = Table::from_csv_path(descriptions)?;
            reference.supplementary = attribute_map(&supplementary, "descriptions")?;
        } else {
            warn!("No supplementary descriptions at {}", descriptions.display());
        }

        if exclusions.exists() {
            let table = Table::from_csv_path(exclusions)?;
            for value in table.column_values("file id").unwrap_or_default().into_iter().flatten() {
                reference.excluded_files.insert(value.trim().to_string());
            }
            for value in table
                .column_values("manifest id")
                .unwrap_or_default()
                .into_iter()
                .flatten()
            {
                reference.excluded_manifests.insert(value.trim().to_string());
            }
        } else {
            warn!("No exclusion list at {}", exclusions.display());
        }

        debug!(
            attributes = reference.model.len(),
            excluded_files = reference.excluded_files.len(),
            excluded_manifests = reference.excluded_manifests.len(),
            "Reference data loaded"
        );
        Ok(reference)
    }

    pub fn with_model_attribute(mut self, attribute: &str, description: &str) -> Self {
        self.model.insert(attribute.to_string(), description.to_string());
        self
    }

    pub fn with_supplementary(mut self, attribute: &str, description: &str) -> Self {
        self.supplementary
            .insert(attribute.to_string(), description.to_string());
        self
    }

    pub fn exclude_file(&mut self, entity_id: impl Into<String>) {
        self.excluded_files.insert(entity_id.into());
    }

    pub fn exclude_manifest(&mut self, manifest_id: impl Into<String>) {
        self.excluded_manifests.insert(manifest_id.into());
    }

    /// Withhold every previously released entity
    pub fn exclude_released<I: IntoIterator<Item = String>>(&mut self, entity_ids: I) {
        self.excluded_files.extend(entity_ids);
    }

    pub fn is_excluded_file(&self, entity_id: &str) -> bool {
        self.excluded_files.contains(entity_id)
    }

    pub fn is_excluded_manifest(&self, manifest_id: &str) -> bool {
        self.excluded_manifests.contains(manifest_id)
    }

    /// Columns of a manifest that are neither data-model attributes nor
    /// storage bookkeeping columns
    pub fn extra_columns<'a, I>(&self, columns: I) -> Vec<String>
    where
        I: IntoIterator<Item = &'a String>,
    {
        let mut extra: Vec<String> = columns
            .into_iter()
            .filter(|c| !STORAGE_COLUMNS.contains(&c.as_str()) && !self.model.contains_key(*c))
            .cloned()
            .collect();
        extra.sort();
        extra.dedup();
        extra
    }

    /// Description for a (possibly sanitized) column name
    ///
    /// Lookup order: data model by exact name, data model with underscores
    /// read as spaces, supplementary sheet, fallback text.
    pub fn description(&self, column: &str) -> String {
        let found = self
            .model
            .get(column)
            .or_else(|| self.model.get(&column.replace('_', " ")))
            .or_else(|| self.supplementary.get(column));

        match found {
            Some(description) => description.chars().take(MAX_DESCRIPTION_LEN).collect(),
            None => {
                debug!("{} attribute not found in data model", column);
                DESCRIPTION_UNAVAILABLE.to_string()
            }
        }
    }
}

fn attribute_map(table: &Table, what: &str) -> Result<BTreeMap<String, String>> {
    let attributes = table
        .column_values("Attribute")
        .ok_or_else(|| Error::InvalidInput(format!("{} is missing column 'Attribute'", what)))?;
    let descriptions = table
        .column_values("Description")
        .unwrap_or_else(|| vec![None; attributes.len()]);

    Ok(attributes
        .into_iter()
        .zip(descriptions)
        .filter_map(|(a, d)| a.map(|a| (a.to_string(), d.unwrap_or_default().to_string())))
        .collect())
}
