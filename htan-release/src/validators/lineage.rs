//! Biospecimen and participant checks propagated to downstream files
//!
//! Findings are keyed on the files downstream of the offending biospecimen or
//! participant, found by substring search of the provenance ancestry path.

use super::{quoted_list, CheckReport, CheckerKind};
use crate::models::columns;
use crate::models::{ManifestRecord, ProvenanceTable};
use std::collections::{BTreeMap, HashSet};

/// Split an adjacent-biospecimen cell: `;` and `,` separate ids, spaces are
/// ignored entirely
fn adjacent_ids(raw: &str) -> Vec<String> {
    raw.replace(';', ",")
        .replace(' ', "")
        .split(',')
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Every adjacent biospecimen listed on a biospecimen row must itself exist
pub fn check_adjacent_biospecimens(
    biospecimens: &[ManifestRecord],
    provenance: &ProvenanceTable,
) -> CheckReport {
    let known: HashSet<&str> = biospecimens.iter().filter_map(|r| r.biospecimen_id()).collect();

    let mut report = CheckReport::new(CheckerKind::AdjacentBiospecimenExists);
    for record in biospecimens {
        let Some(adjacent) = record.get(columns::ADJACENT_BIOSPECIMEN_IDS) else {
            continue;
        };
        let Some(source) = record.biospecimen_id() else {
            continue;
        };
        for missing in adjacent_ids(adjacent).iter().filter(|id| !known.contains(id.as_str())) {
            let message = format!(
                "Upstream biospecimen {} is missing adjacent biospecimen {}",
                source, missing
            );
            for entity in provenance.downstream_files(source) {
                report.flag(entity, message.clone());
            }
        }
    }
    report
}

/// A biospecimen id recorded on more than one row flags its downstream files
pub fn check_unique_biospecimen(
    biospecimens: &[ManifestRecord],
    provenance: &ProvenanceTable,
) -> CheckReport {
    flag_duplicates(
        CheckerKind::UniqueBiospecimen,
        biospecimens,
        ManifestRecord::biospecimen_id,
        provenance,
        |id, manifests| {
            format!(
                "Multiple records found for parent biospecimen {} in manifests {}",
                id, manifests
            )
        },
    )
}

/// A participant with more than one demographics row flags its downstream files
pub fn check_unique_demographics(
    demographics: &[ManifestRecord],
    provenance: &ProvenanceTable,
) -> CheckReport {
    flag_duplicates(
        CheckerKind::UniqueDemographics,
        demographics,
        ManifestRecord::participant_id,
        provenance,
        |id, manifests| {
            format!(
                "Multiple demographics records found for participant {} in manifests {}",
                id, manifests
            )
        },
    )
}

fn flag_duplicates<K, M>(
    checker: CheckerKind,
    records: &[ManifestRecord],
    key: K,
    provenance: &ProvenanceTable,
    message: M,
) -> CheckReport
where
    K: Fn(&ManifestRecord) -> Option<&str>,
    M: Fn(&str, &str) -> String,
{
    // id -> manifest ids of every row carrying it, in row order
    let mut manifests_by_id: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for record in records {
        if let Some(id) = key(record) {
            manifests_by_id
                .entry(id)
                .or_default()
                .push(record.manifest_id.as_str());
        }
    }

    let mut report = CheckReport::new(checker);
    for (id, manifests) in manifests_by_id.into_iter().filter(|(_, m)| m.len() > 1) {
        let text = message(id, &quoted_list(&manifests));
        for entity in provenance.downstream_files(id) {
            report.flag(entity, text.clone());
        }
    }
    report
}
