//! Identifier and filename format conformance
//!
//! Accessory rows (folders) are skipped by both checks. Externally sourced
//! files are skipped per field: the id check looks for "EXT" in the data file
//! id only, the basename check in the filename only.

use super::{CheckReport, CheckerKind};
use crate::models::FileEntry;
use once_cell::sync::Lazy;
use regex::Regex;

static HTAN_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"^HTA\d{1,2}_\d+_\d+$").unwrap());
static BASENAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9\-._/]+$").unwrap());

pub const ID_FORMAT_MESSAGE: &str = "HTAN ID does not match specified format";

pub const BASENAME_MESSAGE: &str = "File basename contains unsupported characters (supported: alphanumeric (a-z,A-Z,0-9), dashes(-), periods(.), and underscores(_))";

/// Whether a data file id has the `HTA<center>_<participant>_<item>` shape
pub fn is_valid_htan_id(id: &str) -> bool {
    HTAN_ID.is_match(id)
}

/// Flag candidates whose HTAN Data File ID is malformed (a missing id counts)
pub fn check_id_format(candidates: &[FileEntry]) -> CheckReport {
    let mut report = CheckReport::new(CheckerKind::IdRegexFormat);
    for entry in candidates
        .iter()
        .filter(|e| !e.component.is_accessory() && !e.has_external_id())
    {
        if !is_valid_htan_id(entry.data_file_id.as_deref().unwrap_or_default()) {
            report.flag(entry.entity_id.clone(), ID_FORMAT_MESSAGE);
        }
    }
    report
}

/// Flag candidates whose file basename uses characters outside the allowed set
pub fn check_basename_format(candidates: &[FileEntry]) -> CheckReport {
    let mut report = CheckReport::new(CheckerKind::BasenameFormat);
    for entry in candidates
        .iter()
        .filter(|e| !e.component.is_accessory() && !e.has_external_filename())
    {
        if !BASENAME.is_match(entry.basename().unwrap_or_default()) {
            report.flag(entry.entity_id.clone(), BASENAME_MESSAGE);
        }
    }
    report
}
