//! Versioned release promotion
//!
//! Folds the current run's shortlist and manifest list into the cumulative
//! `released_entities` / `released_metadata` tables, and writes a copy of
//! each under a release-specific name.

use crate::error::{ReleaseError, ReleaseResult};
use crate::models::columns;
use crate::models::Fileview;
use crate::release_lists::entities::{CDS_RELEASE, CHANNEL_ID, CHANNEL_VERSION, IDC_RELEASE, TYPE_COLUMN};
use crate::release_lists::{MANIFESTS, SHORTLIST};
use crate::sinks::ReleaseSink;
use htan_common::Table;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use tracing::info;

pub const RELEASED_ENTITIES: &str = "released_entities";
pub const RELEASED_METADATA: &str = "released_metadata";
pub const DATA_RELEASE: &str = "Data_Release";

static NON_IDENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-zA-Z0-9_]").unwrap());

/// "release5.0" -> "Release 5.0"
pub fn release_display_name(label: &str) -> String {
    label.replace("release", "Release ")
}

/// "released_entities", "release5.0" -> "released_entities_v5_0"
pub fn versioned_table_name(base: &str, label: &str) -> String {
    let display = release_display_name(label);
    let number = display.replace("Release ", "");
    format!("{}_v{}", base, NON_IDENT.replace_all(&number, "_").to_lowercase())
}

/// Tables a promotion would write
#[derive(Debug, Clone, PartialEq)]
pub struct Promotion {
    pub release: String,
    pub entities: Table,
    pub metadata: Table,
    entities_versioned: String,
    metadata_versioned: String,
}

impl Promotion {
    /// (table name, content) pairs in write order
    pub fn tables(&self) -> Vec<(&str, &Table)> {
        vec![
            (self.entities_versioned.as_str(), &self.entities),
            (RELEASED_ENTITIES, &self.entities),
            (self.metadata_versioned.as_str(), &self.metadata),
            (RELEASED_METADATA, &self.metadata),
        ]
    }
}

/// Compute the cumulative released tables from the last validation run
pub async fn plan_promotion(
    sink: &dyn ReleaseSink,
    fileview: &Fileview,
    release_label: &str,
) -> ReleaseResult<Promotion> {
    let release = release_display_name(release_label);

    let shortlist = require_table(sink, SHORTLIST).await?;
    let mut entities = project_shortlist(&shortlist, &release);
    if let Some(prior) = sink.read_table(RELEASED_ENTITIES).await? {
        entities.append(&prior);
    }
    let entity_column = entities.column_index(columns::ENTITY_ID);
    entities.retain_rows(|_, row| {
        let entity = entity_column.and_then(|i| row[i].as_deref());
        !entity.is_some_and(|e| fileview.is_bai_index(e))
    });
    entities.dedup_rows();

    let manifests = require_table(sink, MANIFESTS).await?;
    let mut manifest_ids: Vec<String> = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    if let Some(prior) = sink.read_table(RELEASED_METADATA).await? {
        for id in prior.column_values(columns::MANIFEST_ID).unwrap_or_default().into_iter().flatten() {
            if seen.insert(id.to_string()) {
                manifest_ids.push(id.to_string());
            }
        }
    }
    for row in 0..manifests.len() {
        if manifests.cell(row, columns::MANIFEST_VERSION).is_none() {
            continue;
        }
        if let Some(id) = manifests.cell(row, columns::MANIFEST_ID) {
            if seen.insert(id.to_string()) {
                manifest_ids.push(id.to_string());
            }
        }
    }

    let mut metadata = Table::new([columns::MANIFEST_ID, columns::MANIFEST_VERSION]);
    for id in manifest_ids {
        let version = fileview.current_version(&id).map(|v| v.to_string());
        metadata.push_row(vec![Some(id), version]);
    }

    Ok(Promotion {
        release,
        entities,
        metadata,
        entities_versioned: versioned_table_name(RELEASED_ENTITIES, release_label),
        metadata_versioned: versioned_table_name(RELEASED_METADATA, release_label),
    })
}

/// Write every table of a promotion
pub async fn publish_promotion(sink: &dyn ReleaseSink, promotion: &Promotion) -> ReleaseResult<()> {
    for (name, table) in promotion.tables() {
        sink.write_table(name, table).await?;
    }
    info!(
        release = %promotion.release,
        entities = promotion.entities.len(),
        manifests = promotion.metadata.len(),
        "Release promoted"
    );
    Ok(())
}

async fn require_table(sink: &dyn ReleaseSink, name: &str) -> ReleaseResult<Table> {
    sink.read_table(name).await?.ok_or_else(|| {
        ReleaseError::Common(htan_common::Error::NotFound(format!(
            "table '{}' (run validation first)",
            name
        )))
    })
}

/// Shortlist columns carried into the released listing, with the release name
fn project_shortlist(shortlist: &Table, release: &str) -> Table {
    let carried = [
        columns::ENTITY_ID,
        DATA_RELEASE,
        columns::ID,
        TYPE_COLUMN,
        CDS_RELEASE,
        IDC_RELEASE,
        columns::COMPONENT,
        CHANNEL_VERSION,
        CHANNEL_ID,
    ];
    let mut table = Table::new(carried);
    for row in 0..shortlist.len() {
        let cells = carried
            .iter()
            .map(|&column| match column {
                DATA_RELEASE => Some(release.to_string()),
                other => shortlist.cell(row, other).map(str::to_string),
            })
            .collect();
        table.push_row(cells);
    }
    table
}
