//! Operator-facing report tables

use crate::reference::ReferenceData;
use crate::validators::CheckReport;
use htan_common::Table;
use std::collections::BTreeMap;

/// `Manifest_Id, column_name` for every non-data-model column
pub fn build_extra_columns(extra: &BTreeMap<String, Vec<String>>) -> Table {
    let mut table = Table::new(["Manifest_Id", "column_name"]);
    for (manifest_id, names) in extra {
        for name in names {
            table.push_row(vec![Some(manifest_id.clone()), Some(name.clone())]);
        }
    }
    table
}

/// `entityId, checker, message` for every advisory finding
pub fn build_advisories(advisories: &[CheckReport]) -> Table {
    let mut table = Table::new(["entityId", "checker", "message"]);
    for report in advisories {
        for (entity, message) in report.findings() {
            table.push_row(vec![
                Some(entity.clone()),
                Some(report.checker.to_string()),
                Some(message.clone()),
            ]);
        }
    }
    table
}

/// `table_name, column_name, description` for every published column
pub fn build_column_descriptions<'a, I>(tables: I, reference: &ReferenceData) -> Table
where
    I: IntoIterator<Item = (&'a str, &'a Table)>,
{
    let mut out = Table::new(["table_name", "column_name", "description"]);
    for (name, table) in tables {
        for column in table.columns() {
            out.push_row(vec![
                Some(name.to_string()),
                Some(column.clone()),
                Some(reference.description(column)),
            ]);
        }
    }
    out
}
