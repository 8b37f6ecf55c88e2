//! Entity shortlist

use crate::classifier::ChannelColumns;
use crate::models::columns;
use crate::models::FileEntry;
use htan_common::Table;
use std::collections::HashMap;

pub const TYPE_COLUMN: &str = "type";
pub const CDS_RELEASE: &str = "CDS_Release";
pub const IDC_RELEASE: &str = "IDC_Release";
pub const CHANNEL_VERSION: &str = "channel_metadata_version";
pub const CHANNEL_ID: &str = "channel_metadata_id";

/// Columns describing one listed entity
pub(crate) const ENTITY_COLUMNS: [&str; 8] = [
    columns::DATA_FILE_ID,
    columns::FILENAME,
    columns::ENTITY_ID,
    columns::MANIFEST_ID,
    columns::MANIFEST_VERSION,
    columns::CENTER,
    columns::COMPONENT,
    columns::ID,
];

pub(crate) fn entity_cells(entry: &FileEntry) -> Vec<Option<String>> {
    vec![
        entry.data_file_id.clone(),
        entry.filename.clone(),
        Some(entry.entity_id.clone()),
        Some(entry.manifest_id.clone()),
        Some(entry.manifest_version.to_string()),
        Some(entry.center.clone()),
        Some(entry.component.to_string()),
        entry.id.clone(),
    ]
}

/// Releasable entities with release bookkeeping and channel columns
///
/// Accessory entities are folders, everything else is a file. The output
/// keeps the partition order, drops exact duplicates and uses sanitized
/// column names.
pub fn build_shortlist(releasable: &[FileEntry], channels: &HashMap<String, ChannelColumns>) -> Table {
    let mut header: Vec<&str> = ENTITY_COLUMNS.to_vec();
    header.extend([TYPE_COLUMN, CDS_RELEASE, IDC_RELEASE, CHANNEL_VERSION, CHANNEL_ID]);

    let mut table = Table::new(header);
    for entry in releasable {
        let kind = if entry.component.is_accessory() { "folder" } else { "file" };
        let channel = channels.get(&entry.entity_id).cloned().unwrap_or_default();

        let mut row = entity_cells(entry);
        row.extend([
            Some(kind.to_string()),
            None,
            None,
            channel.version,
            channel.id,
        ]);
        table.push_row(row);
    }
    table.dedup_rows();
    table.with_sanitized_columns()
}
