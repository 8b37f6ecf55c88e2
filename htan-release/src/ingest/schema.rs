//! Required-attribute check per component tier
//!
//! Level-1 and Auxiliary manifests missing a required column halt the run.
//! Level-2/3/4 manifests missing one are logged and ingested anyway.

use crate::error::{ReleaseError, ReleaseResult};
use crate::models::columns;
use crate::models::{Component, ComponentTier};
use tracing::warn;

const LEVEL1_REQUIRED: [&str; 5] = [
    columns::COMPONENT,
    columns::FILENAME,
    columns::FILE_FORMAT,
    columns::PARENT_BIOSPECIMEN_ID,
    columns::DATA_FILE_ID,
];

const DERIVED_REQUIRED: [&str; 5] = [
    columns::COMPONENT,
    columns::FILENAME,
    columns::FILE_FORMAT,
    columns::PARENT_DATA_FILE_ID,
    columns::DATA_FILE_ID,
];

/// Outcome of a non-fatal required-attribute check
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SchemaCheck {
    /// Required columns missing from a derived-level manifest
    pub missing: Vec<String>,
}

impl SchemaCheck {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Check a manifest's columns against its component's required attributes
///
/// Returns `SchemaViolation` for the first missing column of a
/// Level-1/Auxiliary manifest; otherwise returns the (possibly empty) list of
/// missing derived-level columns after logging each one.
pub fn check_required_attributes(
    present: &[String],
    component: &Component,
    manifest_id: &str,
) -> ReleaseResult<SchemaCheck> {
    let has = |name: &str| present.iter().any(|c| c == name);

    match component.tier() {
        ComponentTier::Level1OrAuxiliary => {
            if let Some(column) = LEVEL1_REQUIRED.iter().find(|c| !has(c)) {
                return Err(ReleaseError::SchemaViolation {
                    manifest_id: manifest_id.to_string(),
                    component: component.clone(),
                    column: column.to_string(),
                });
            }
            Ok(SchemaCheck::default())
        }
        ComponentTier::DerivedLevel => {
            let missing: Vec<String> = DERIVED_REQUIRED
                .iter()
                .filter(|c| !has(c))
                .filter(|c| !(component.exempt_from_parent_file() && **c == columns::PARENT_DATA_FILE_ID))
                .map(|c| c.to_string())
                .collect();
            for column in &missing {
                warn!(
                    manifest_id = manifest_id,
                    component = %component,
                    "{} is missing from DependsOn for manifest {}",
                    column,
                    manifest_id
                );
            }
            Ok(SchemaCheck { missing })
        }
        ComponentTier::Unchecked => Ok(SchemaCheck::default()),
    }
}
