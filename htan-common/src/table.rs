//! Generic tabular model
//!
//! Manifests, the fileview, provenance exports and every published release
//! list are plain tables of nullable strings. `Table` is the shape shared by
//! ingestion (CSV in) and the warehouse (rows + column list out).
//!
//! Empty and whitespace-only cells are normalized to `None` on read.

use crate::{Error, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

static NON_ALNUM_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^0-9a-zA-Z]+").unwrap());

/// Rectangular table of nullable string cells
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    /// Create an empty table with the given column list
    pub fn new<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    /// Read a CSV file with a header row
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path).map_err(|e| {
            Error::Io(std::io::Error::new(
                e.kind(),
                format!("Failed to open {}: {}", path.display(), e),
            ))
        })?;
        Self::from_csv_reader(file)
    }

    /// Read CSV from any reader with a header row
    ///
    /// Ragged records are accepted: short rows are padded with nulls and
    /// surplus cells are dropped.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        let mut table = Table::new(columns);
        for record in csv_reader.records() {
            let record = record?;
            let row = record.iter().map(normalize_cell).collect();
            table.push_row(row);
        }
        Ok(table)
    }

    /// Column names in order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Row data
    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Whether a column with this exact name exists
    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Position of a column by exact name
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Append a row, padding or truncating it to the column count
    pub fn push_row(&mut self, mut row: Vec<Option<String>>) {
        row.resize(self.columns.len(), None);
        self.rows.push(row);
    }

    /// Cell value by row position and column name
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)?.as_deref()
    }

    /// All values of one column (None when the column is absent)
    pub fn column_values(&self, column: &str) -> Option<Vec<Option<&str>>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(|r| r[idx].as_deref()).collect())
    }

    /// Keep only rows for which the predicate returns true
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[String], &[Option<String>]) -> bool,
    {
        let columns = &self.columns;
        self.rows.retain(|row| keep(columns, row));
    }

    /// Drop exact duplicate rows, keeping the first occurrence
    pub fn dedup_rows(&mut self) {
        let mut seen = HashSet::new();
        self.rows.retain(|row| seen.insert(row.clone()));
    }

    /// Append every row of `other`, aligning on column names
    ///
    /// Columns present only in `other` are added to this table.
    pub fn append(&mut self, other: &Table) {
        for column in &other.columns {
            if !self.has_column(column) {
                self.columns.push(column.clone());
                for row in &mut self.rows {
                    row.push(None);
                }
            }
        }
        let mapping: Vec<Option<usize>> = self
            .columns
            .iter()
            .map(|c| other.column_index(c))
            .collect();
        for other_row in &other.rows {
            let row = mapping
                .iter()
                .map(|idx| idx.and_then(|i| other_row[i].clone()))
                .collect();
            self.rows.push(row);
        }
    }

    /// Copy of this table with warehouse-safe column names
    pub fn with_sanitized_columns(&self) -> Table {
        Table {
            columns: self.columns.iter().map(|c| sanitize_column_name(c)).collect(),
            rows: self.rows.clone(),
        }
    }

    /// Copy of this table without the named columns
    pub fn without_columns(&self, drop: &[&str]) -> Table {
        let keep: Vec<usize> = (0..self.columns.len())
            .filter(|&i| !drop.contains(&self.columns[i].as_str()))
            .collect();
        Table {
            columns: keep.iter().map(|&i| self.columns[i].clone()).collect(),
            rows: self
                .rows
                .iter()
                .map(|row| keep.iter().map(|&i| row[i].clone()).collect())
                .collect(),
        }
    }

    /// Serialize as CSV with a header row; nulls become empty cells
    pub fn to_csv_string(&self) -> Result<String> {
        let mut writer = csv::Writer::from_writer(Vec::new());
        writer.write_record(&self.columns)?;
        for row in &self.rows {
            writer.write_record(row.iter().map(|c| c.as_deref().unwrap_or_default()))?;
        }
        let bytes = writer
            .into_inner()
            .map_err(|e| Error::Internal(format!("CSV buffer flush failed: {}", e)))?;
        String::from_utf8(bytes).map_err(|e| Error::Internal(format!("CSV output is not UTF-8: {}", e)))
    }
}

/// Replace every run of non-alphanumeric characters with `_`
///
/// "HTAN Data File ID" becomes "HTAN_Data_File_ID".
pub fn sanitize_column_name(name: &str) -> String {
    NON_ALNUM_RUN.replace_all(name, "_").into_owned()
}

fn normalize_cell(cell: &str) -> Option<String> {
    if cell.trim().is_empty() {
        None
    } else {
        Some(cell.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s(v: &str) -> Option<String> {
        Some(v.to_string())
    }

    #[test]
    fn test_csv_read_normalizes_empty_cells() {
        let data = "entityId,Filename,Id\nsyn1,a.txt,\nsyn2,  ,x\n";
        let table = Table::from_csv_reader(data.as_bytes()).unwrap();

        assert_eq!(table.columns(), &["entityId", "Filename", "Id"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.cell(0, "Id"), None);
        assert_eq!(table.cell(1, "Filename"), None);
        assert_eq!(table.cell(1, "Id"), Some("x"));
    }

    #[test]
    fn test_csv_read_accepts_ragged_rows() {
        let data = "a,b,c\n1\n1,2,3,4\n";
        let table = Table::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(table.rows()[0], vec![s("1"), None, None]);
        assert_eq!(table.rows()[1], vec![s("1"), s("2"), s("3")]);
    }

    #[test]
    fn test_embedded_newlines_survive() {
        let data = "id,note\nsyn1,\"line one\nline two\"\n";
        let table = Table::from_csv_reader(data.as_bytes()).unwrap();
        assert_eq!(table.cell(0, "note"), Some("line one\nline two"));
    }

    #[test]
    fn test_csv_output_and_column_drop() {
        let mut table = Table::new(["entityId", "Id", "Errors"]);
        table.push_row(vec![s("syn1"), None, s("a, b")]);
        let trimmed = table.without_columns(&["Id"]);
        assert_eq!(trimmed.columns(), &["entityId", "Errors"]);
        assert_eq!(
            trimmed.to_csv_string().unwrap(),
            "entityId,Errors\nsyn1,\"a, b\"\n"
        );
    }

    #[test]
    fn test_dedup_rows_keeps_first() {
        let mut table = Table::new(["a", "b"]);
        table.push_row(vec![s("1"), s("x")]);
        table.push_row(vec![s("2"), None]);
        table.push_row(vec![s("1"), s("x")]);
        table.push_row(vec![s("1"), None]);
        table.dedup_rows();
        assert_eq!(table.len(), 3);
        assert_eq!(table.rows()[2], vec![s("1"), None]);
    }

    #[test]
    fn test_append_aligns_columns() {
        let mut left = Table::new(["a", "b"]);
        left.push_row(vec![s("1"), s("2")]);
        let mut right = Table::new(["b", "c"]);
        right.push_row(vec![s("3"), s("4")]);

        left.append(&right);
        assert_eq!(left.columns(), &["a", "b", "c"]);
        assert_eq!(left.rows()[0], vec![s("1"), s("2"), None]);
        assert_eq!(left.rows()[1], vec![None, s("3"), s("4")]);
    }

    #[test]
    fn test_sanitize_column_name() {
        assert_eq!(sanitize_column_name("HTAN Data File ID"), "HTAN_Data_File_ID");
        assert_eq!(sanitize_column_name("Manifest_Version"), "Manifest_Version");
        assert_eq!(sanitize_column_name("a -- b"), "a_b");
    }
}
