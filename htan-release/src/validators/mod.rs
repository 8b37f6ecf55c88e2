//! Validation engine
//!
//! Each checker takes read-only slices of the identifier graph, manifests
//! and reference tables and returns a `CheckReport`: entity id -> message.
//! Checkers share no mutable state. The pure ones run concurrently on the
//! blocking pool; channel resolution awaits the children lookup. Reports
//! are always returned in battery order, whatever order tasks finish in.

pub mod channel;
pub mod existence;
pub mod format;
pub mod identity;
pub mod lineage;
pub mod parents;

pub use channel::{check_channel_files, ChannelPair, ChannelResolution};
pub use existence::check_entity_exists;
pub use format::{check_basename_format, check_id_format};
pub use identity::{check_unique_file_id, check_unique_filename};
pub use lineage::{check_adjacent_biospecimens, check_unique_biospecimen, check_unique_demographics};
pub use parents::check_parents_exist;

use crate::error::{ReleaseError, ReleaseResult};
use crate::models::{FileEntry, Fileview, IdentifierEdge, ManifestRecord, ProvenanceTable};
use crate::services::ChildrenLookup;
use htan_common::config::CenterConfig;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

/// Error taxonomy for recorded (non-fatal) findings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ViolationClass {
    /// Duplicate or malformed identifiers
    Identity,
    /// Missing parent, adjacent biospecimen or channel file
    Referential,
    /// Entity absent from the authoritative listing
    Existence,
}

/// Checker identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub enum CheckerKind {
    UniqueFileId,
    IdRegexFormat,
    BasenameFormat,
    EntityExists,
    AdjacentBiospecimenExists,
    UniqueBiospecimen,
    UniqueDemographics,
    ParentsExist,
    ChannelFileResolution,
    /// Advisory only, never blocks a release
    UniqueFilename,
}

impl CheckerKind {
    /// Release-blocking checkers in evaluation order
    pub const BATTERY: [CheckerKind; 9] = [
        CheckerKind::UniqueFileId,
        CheckerKind::IdRegexFormat,
        CheckerKind::BasenameFormat,
        CheckerKind::EntityExists,
        CheckerKind::AdjacentBiospecimenExists,
        CheckerKind::UniqueBiospecimen,
        CheckerKind::UniqueDemographics,
        CheckerKind::ParentsExist,
        CheckerKind::ChannelFileResolution,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            CheckerKind::UniqueFileId => "UniqueFileId",
            CheckerKind::IdRegexFormat => "IdRegexFormat",
            CheckerKind::BasenameFormat => "BasenameFormat",
            CheckerKind::EntityExists => "EntityExists",
            CheckerKind::AdjacentBiospecimenExists => "AdjacentBiospecimenExists",
            CheckerKind::UniqueBiospecimen => "UniqueBiospecimen",
            CheckerKind::UniqueDemographics => "UniqueDemographics",
            CheckerKind::ParentsExist => "ParentsExist",
            CheckerKind::ChannelFileResolution => "ChannelFileResolution",
            CheckerKind::UniqueFilename => "UniqueFilename",
        }
    }

    pub fn violation_class(&self) -> ViolationClass {
        match self {
            CheckerKind::UniqueFileId
            | CheckerKind::IdRegexFormat
            | CheckerKind::BasenameFormat
            | CheckerKind::UniqueBiospecimen
            | CheckerKind::UniqueDemographics
            | CheckerKind::UniqueFilename => ViolationClass::Identity,
            CheckerKind::AdjacentBiospecimenExists
            | CheckerKind::ParentsExist
            | CheckerKind::ChannelFileResolution => ViolationClass::Referential,
            CheckerKind::EntityExists => ViolationClass::Existence,
        }
    }

    pub fn is_advisory(&self) -> bool {
        matches!(self, CheckerKind::UniqueFilename)
    }
}

impl fmt::Display for CheckerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Output of one checker: at most one message per entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckReport {
    pub checker: CheckerKind,
    findings: BTreeMap<String, String>,
}

impl CheckReport {
    pub fn new(checker: CheckerKind) -> Self {
        Self {
            checker,
            findings: BTreeMap::new(),
        }
    }

    /// Record a finding; a later finding for the same entity replaces it
    pub fn flag(&mut self, entity_id: impl Into<String>, message: impl Into<String>) {
        self.findings.insert(entity_id.into(), message.into());
    }

    pub fn message(&self, entity_id: &str) -> Option<&str> {
        self.findings.get(entity_id).map(String::as_str)
    }

    pub fn contains(&self, entity_id: &str) -> bool {
        self.findings.contains_key(entity_id)
    }

    pub fn findings(&self) -> &BTreeMap<String, String> {
        &self.findings
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }
}

/// Read-only inputs shared by every checker
#[derive(Debug, Clone, Default)]
pub struct ValidationInputs {
    /// Full file listing
    pub listing: Vec<FileEntry>,
    /// Releasable candidates (listing minus exclusions)
    pub candidates: Vec<FileEntry>,
    pub edges: Vec<IdentifierEdge>,
    pub biospecimens: Vec<ManifestRecord>,
    pub demographics: Vec<ManifestRecord>,
    pub imaging: Vec<ManifestRecord>,
    pub fileview: Fileview,
    pub provenance: ProvenanceTable,
}

/// Everything the battery produced
#[derive(Debug, Clone)]
pub struct BatteryOutcome {
    /// Release-blocking reports in battery order
    pub reports: Vec<CheckReport>,
    /// Non-blocking findings
    pub advisories: Vec<CheckReport>,
    pub channels: ChannelResolution,
}

impl BatteryOutcome {
    pub fn report(&self, checker: CheckerKind) -> Option<&CheckReport> {
        self.reports
            .iter()
            .chain(self.advisories.iter())
            .find(|r| r.checker == checker)
    }

    /// Auxiliary reference files (resolved channel ids, MERFISH files)
    pub fn aux_files(&self) -> &BTreeSet<String> {
        &self.channels.aux_files
    }
}

/// Runs the checker battery
pub struct ValidationEngine<'a> {
    centers: &'a BTreeMap<String, CenterConfig>,
    lookup: &'a dyn ChildrenLookup,
}

impl<'a> ValidationEngine<'a> {
    pub fn new(centers: &'a BTreeMap<String, CenterConfig>, lookup: &'a dyn ChildrenLookup) -> Self {
        Self { centers, lookup }
    }

    /// Run every checker and join the outputs in battery order
    pub async fn run(&self, inputs: Arc<ValidationInputs>) -> ReleaseResult<BatteryOutcome> {
        info!(
            files = inputs.listing.len(),
            candidates = inputs.candidates.len(),
            "Running validation checks"
        );

        let unique_file_id = spawn_check(&inputs, |i| check_unique_file_id(&i.listing));
        let id_format = spawn_check(&inputs, |i| check_id_format(&i.candidates));
        let basename = spawn_check(&inputs, |i| check_basename_format(&i.candidates));
        let exists = spawn_check(&inputs, |i| check_entity_exists(&i.fileview, &i.candidates));
        let adjacent = spawn_check(&inputs, |i| {
            check_adjacent_biospecimens(&i.biospecimens, &i.provenance)
        });
        let unique_bios = spawn_check(&inputs, |i| {
            check_unique_biospecimen(&i.biospecimens, &i.provenance)
        });
        let unique_demo = spawn_check(&inputs, |i| {
            check_unique_demographics(&i.demographics, &i.provenance)
        });
        let parents = spawn_check(&inputs, |i| check_parents_exist(&i.candidates, &i.edges));
        let unique_filename = spawn_check(&inputs, |i| check_unique_filename(&i.listing));

        // Runs on this task while the pure checkers occupy the blocking pool
        let (channel_report, channels) =
            check_channel_files(&inputs.candidates, &inputs.imaging, self.centers, self.lookup).await?;

        let mut reports = Vec::with_capacity(CheckerKind::BATTERY.len());
        for handle in [
            unique_file_id,
            id_format,
            basename,
            exists,
            adjacent,
            unique_bios,
            unique_demo,
            parents,
        ] {
            reports.push(join_check(handle).await?);
        }
        reports.push(channel_report);

        let advisories = vec![join_check(unique_filename).await?];

        for report in reports.iter().chain(advisories.iter()) {
            debug!(checker = %report.checker, flagged = report.len(), "Checker finished");
        }

        Ok(BatteryOutcome {
            reports,
            advisories,
            channels,
        })
    }
}

fn spawn_check<F>(inputs: &Arc<ValidationInputs>, check: F) -> JoinHandle<CheckReport>
where
    F: FnOnce(&ValidationInputs) -> CheckReport + Send + 'static,
{
    let inputs = Arc::clone(inputs);
    tokio::task::spawn_blocking(move || check(&inputs))
}

async fn join_check(handle: JoinHandle<CheckReport>) -> ReleaseResult<CheckReport> {
    handle.await.map_err(|e| {
        ReleaseError::Common(htan_common::Error::Internal(format!(
            "Checker task failed: {}",
            e
        )))
    })
}

/// Render ids the way operators read them in ticket text: `['a', 'b']`
pub(crate) fn quoted_list<I, S>(items: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let quoted: Vec<String> = items
        .into_iter()
        .map(|s| format!("'{}'", s.as_ref()))
        .collect();
    format!("[{}]", quoted.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_battery_order_and_classes() {
        assert_eq!(CheckerKind::BATTERY[0], CheckerKind::UniqueFileId);
        assert_eq!(CheckerKind::BATTERY[8], CheckerKind::ChannelFileResolution);
        assert!(!CheckerKind::BATTERY.contains(&CheckerKind::UniqueFilename));
        assert_eq!(CheckerKind::EntityExists.violation_class(), ViolationClass::Existence);
        assert_eq!(CheckerKind::ParentsExist.violation_class(), ViolationClass::Referential);
        assert!(CheckerKind::UniqueFilename.is_advisory());
    }

    #[test]
    fn test_report_last_write_wins() {
        let mut report = CheckReport::new(CheckerKind::UniqueBiospecimen);
        report.flag("syn1", "first");
        report.flag("syn1", "second");
        assert_eq!(report.len(), 1);
        assert_eq!(report.message("syn1"), Some("second"));
    }

    #[test]
    fn test_quoted_list() {
        assert_eq!(quoted_list(["syn1", "syn2"]), "['syn1', 'syn2']");
        assert_eq!(quoted_list(Vec::<String>::new()), "[]");
    }
}
