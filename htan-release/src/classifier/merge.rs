//! Typed accumulation of checker findings

use crate::validators::{CheckReport, CheckerKind, ViolationClass};
use std::collections::BTreeMap;

/// One recorded finding against an entity
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Finding {
    pub checker: CheckerKind,
    pub message: String,
}

impl Finding {
    pub fn class(&self) -> ViolationClass {
        self.checker.violation_class()
    }
}

/// Entity id -> findings, one per checker that flagged it, in battery order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergedErrors {
    by_entity: BTreeMap<String, Vec<Finding>>,
}

impl MergedErrors {
    /// Merge a fixed list of reports; advisory reports are ignored
    ///
    /// Pure function of its input: merging the same reports twice yields
    /// equal values.
    pub fn merge(reports: &[CheckReport]) -> Self {
        let mut by_entity: BTreeMap<String, Vec<Finding>> = BTreeMap::new();
        for report in reports.iter().filter(|r| !r.checker.is_advisory()) {
            for (entity, message) in report.findings() {
                by_entity.entry(entity.clone()).or_default().push(Finding {
                    checker: report.checker,
                    message: message.clone(),
                });
            }
        }
        Self { by_entity }
    }

    pub fn findings(&self, entity_id: &str) -> &[Finding] {
        self.by_entity
            .get(entity_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_errors(&self, entity_id: &str) -> bool {
        self.by_entity.contains_key(entity_id)
    }

    /// Messages for an entity in evaluation order
    pub fn messages(&self, entity_id: &str) -> Vec<&str> {
        self.findings(entity_id)
            .iter()
            .map(|f| f.message.as_str())
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[Finding])> {
        self.by_entity
            .iter()
            .map(|(entity, findings)| (entity.as_str(), findings.as_slice()))
    }

    /// Flagged entities per violation class
    pub fn class_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts = BTreeMap::new();
        for findings in self.by_entity.values() {
            for finding in findings {
                let key = match finding.class() {
                    ViolationClass::Identity => "identity",
                    ViolationClass::Referential => "referential",
                    ViolationClass::Existence => "existence",
                };
                *counts.entry(key).or_insert(0) += 1;
            }
        }
        counts
    }

    pub fn len(&self) -> usize {
        self.by_entity.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_entity.is_empty()
    }
}
