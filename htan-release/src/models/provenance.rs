//! Precomputed lineage table

use htan_common::{Error, Result, Table};

/// One provenance row linking a downstream file to its ancestry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProvenanceRow {
    pub entity_id: String,
    /// Serialized ancestry string of biospecimen ids
    pub biospecimen_path: Option<String>,
    pub participant_id: Option<String>,
    pub assayed_biospecimen_id: Option<String>,
    pub data_file_id: Option<String>,
}

/// Provenance table
#[derive(Debug, Clone, Default)]
pub struct ProvenanceTable {
    rows: Vec<ProvenanceRow>,
}

impl ProvenanceTable {
    pub fn new(rows: Vec<ProvenanceRow>) -> Self {
        Self { rows }
    }

    /// Build from the warehouse export (sanitized column names)
    pub fn from_table(table: &Table) -> Result<Self> {
        let entity_idx = table
            .column_index("entityId")
            .ok_or_else(|| Error::InvalidInput("provenance is missing column 'entityId'".to_string()))?;
        let col = |name: &str| table.column_index(name);
        let path_idx = col("Biospecimen_Path");
        let participant_idx = col("HTAN_Participant_ID");
        let assayed_idx = col("HTAN_Assayed_Biospecimen_ID");
        let file_idx = col("HTAN_Data_File_ID");

        let get = |row: &[Option<String>], idx: Option<usize>| idx.and_then(|i| row[i].clone());

        let rows = table
            .rows()
            .iter()
            .filter_map(|row| {
                let entity_id = row[entity_idx].clone()?;
                Some(ProvenanceRow {
                    entity_id,
                    biospecimen_path: get(row, path_idx),
                    participant_id: get(row, participant_idx),
                    assayed_biospecimen_id: get(row, assayed_idx),
                    data_file_id: get(row, file_idx),
                })
            })
            .collect();
        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[ProvenanceRow] {
        &self.rows
    }

    /// Entity ids of files whose biospecimen path mentions `id`
    ///
    /// This is a substring test on the serialized path, not a segment match:
    /// an id that is a prefix of another id also matches the longer one.
    pub fn downstream_files(&self, id: &str) -> Vec<&str> {
        self.rows
            .iter()
            .filter(|r| r.biospecimen_path.as_deref().is_some_and(|p| p.contains(id)))
            .map(|r| r.entity_id.as_str())
            .collect()
    }
}
