//! Release list tables
//!
//! Every table published by a validation run is built here from the
//! partition, the manifests and the reference data. Column names are
//! sanitized for the warehouse before publishing.

pub mod entities;
pub mod errors;
pub mod manifests;
pub mod reports;

pub use entities::build_shortlist;
pub use errors::{build_clin_bio_errors, build_errors, ERROR_SEPARATOR};
pub use manifests::build_manifest_list;
pub use reports::{build_advisories, build_column_descriptions, build_extra_columns};

use htan_common::Table;

pub const SHORTLIST: &str = "shortlist";
pub const MANIFESTS: &str = "manifests";
pub const ERRORS: &str = "errors";
pub const CLIN_BIO_ERRORS: &str = "clin_bio_errors";
pub const EXTRA_COLS: &str = "extra_cols";
pub const ADVISORIES: &str = "advisories";
pub const COLUMN_DESCRIPTIONS: &str = "column_descriptions";

/// Named tables of one run, in publish order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReleaseLists {
    tables: Vec<(String, Table)>,
}

impl ReleaseLists {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a table
    pub fn insert(&mut self, name: &str, table: Table) {
        match self.tables.iter_mut().find(|(n, _)| n == name) {
            Some((_, existing)) => *existing = table,
            None => self.tables.push((name.to_string(), table)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Table> {
        self.tables.iter().find(|(n, _)| n == name).map(|(_, t)| t)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Table)> {
        self.tables.iter().map(|(n, t)| (n.as_str(), t))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}
