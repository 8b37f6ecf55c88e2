//! Release pipeline
//!
//! Wires the collaborators (manifest source, children lookup, warehouse)
//! through ingestion, validation and classification. Collaborators are
//! passed in, so tests drive the whole run with in-memory doubles.

use crate::classifier::{enrich_channels, partition, MergedErrors, Partition};
use crate::error::ReleaseResult;
use crate::graph::IdentifierGraph;
use crate::ingest::{IngestStats, ManifestSource, ManifestStore};
use crate::models::columns;
use crate::models::{Component, FileEntry, Fileview, ProvenanceTable};
use crate::promote::RELEASED_ENTITIES;
use crate::reference::ReferenceData;
use crate::release_lists::{self, ReleaseLists};
use crate::services::ChildrenLookup;
use crate::sinks::ReleaseSink;
use crate::validators::{CheckerKind, ValidationEngine, ValidationInputs};
use htan_common::config::TomlConfig;
use htan_common::Table;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

/// Reference tables read once per run
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub reference: ReferenceData,
    pub fileview: Fileview,
    pub provenance: ProvenanceTable,
}

/// Load the reference snapshot from the configured inputs directory
///
/// The data model, fileview and provenance exports are required; the
/// exclusion list and supplementary descriptions may be absent.
pub fn load_snapshot(config: &TomlConfig) -> ReleaseResult<Snapshot> {
    let inputs = &config.inputs;
    let reference = ReferenceData::load(
        &inputs.path_of(&inputs.data_model),
        &inputs.path_of(&inputs.descriptions),
        &inputs.path_of(&inputs.exclusions),
    )?;
    let fileview = Fileview::from_table(&Table::from_csv_path(&inputs.path_of(&inputs.fileview))?)?;
    let provenance =
        ProvenanceTable::from_table(&Table::from_csv_path(&inputs.path_of(&inputs.provenance))?)?;

    info!(
        fileview = fileview.len(),
        provenance = provenance.rows().len(),
        "Reference snapshot loaded"
    );
    Ok(Snapshot {
        reference,
        fileview,
        provenance,
    })
}

/// Result of one validation run
#[derive(Debug, Clone)]
pub struct ReleaseOutcome {
    pub run_id: Uuid,
    pub ingest: IngestStats,
    pub partition: Partition,
    /// Flagged entity count per violation class
    pub class_counts: BTreeMap<&'static str, usize>,
    /// Auxiliary reference files discovered during channel resolution
    pub aux_files: BTreeSet<String>,
    pub lists: ReleaseLists,
    /// False for dry runs
    pub published: bool,
}

/// One validation run over injected collaborators
pub struct ReleaseRun<'a> {
    config: &'a TomlConfig,
    source: &'a dyn ManifestSource,
    lookup: &'a dyn ChildrenLookup,
    sink: &'a dyn ReleaseSink,
    dry_run: bool,
}

impl<'a> ReleaseRun<'a> {
    pub fn new(
        config: &'a TomlConfig,
        source: &'a dyn ManifestSource,
        lookup: &'a dyn ChildrenLookup,
        sink: &'a dyn ReleaseSink,
    ) -> Self {
        Self {
            config,
            source,
            lookup,
            sink,
            dry_run: false,
        }
    }

    /// Build every table but write none
    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub async fn execute(&self, snapshot: Snapshot) -> ReleaseResult<ReleaseOutcome> {
        let run_id = Uuid::new_v4();
        info!(run_id = %run_id, dry_run = self.dry_run, "Release run started");

        let Snapshot {
            mut reference,
            fileview,
            provenance,
        } = snapshot;

        let released = self.released_entities().await?;
        if !released.is_empty() {
            info!(count = released.len(), "Withholding previously released entities");
        }
        reference.exclude_released(released);

        // Phase 2: a schema violation returns here, before any write
        let (manifests, ingest) = ManifestStore::new(self.config, &reference)
            .ingest(self.source)
            .await?;

        // Phase 3
        let graph = IdentifierGraph::build(&manifests, &self.config.file_components);
        let candidates = select_candidates(&graph.listing, &reference);
        info!(
            listed = graph.listing.len(),
            candidates = candidates.len(),
            "Candidates selected"
        );

        // Phase 4
        let inputs = Arc::new(ValidationInputs {
            listing: graph.listing,
            candidates,
            edges: graph.edges,
            biospecimens: manifests.records(Component::Biospecimen.as_str()).to_vec(),
            demographics: manifests.records(Component::Demographics.as_str()).to_vec(),
            imaging: manifests.records(Component::ImagingLevel2.as_str()).to_vec(),
            fileview,
            provenance,
        });
        let battery = ValidationEngine::new(&self.config.centers, self.lookup)
            .run(Arc::clone(&inputs))
            .await?;

        // Phase 5
        let merged = MergedErrors::merge(&battery.reports);
        let split = partition(&inputs.candidates, &merged);
        let class_counts = merged.class_counts();
        info!(
            releasable = split.releasable.len(),
            errored = split.errored.len(),
            "Candidates partitioned"
        );

        let channels = enrich_channels(
            &split.releasable,
            &inputs.imaging,
            &battery.channels,
            &inputs.fileview,
            &self.config.centers,
            self.lookup,
        )
        .await?;

        // Phase 6
        let clin_bio_reports: Vec<_> = [CheckerKind::UniqueBiospecimen, CheckerKind::UniqueDemographics]
            .into_iter()
            .filter_map(|kind| battery.report(kind))
            .collect();

        let mut lists = ReleaseLists::new();
        lists.insert(
            release_lists::SHORTLIST,
            release_lists::build_shortlist(&split.releasable, &channels),
        );
        lists.insert(
            release_lists::MANIFESTS,
            release_lists::build_manifest_list(
                &split.releasable,
                &manifests,
                &inputs.provenance,
                &inputs.fileview,
                &self.config.clinical_components,
                &self.config.biospecimen_components,
            ),
        );
        lists.insert(release_lists::ERRORS, release_lists::build_errors(&split.errored));
        lists.insert(
            release_lists::CLIN_BIO_ERRORS,
            release_lists::build_clin_bio_errors(&inputs.candidates, &clin_bio_reports),
        );
        lists.insert(
            release_lists::EXTRA_COLS,
            release_lists::build_extra_columns(manifests.extra_columns()),
        );
        lists.insert(
            release_lists::ADVISORIES,
            release_lists::build_advisories(&battery.advisories),
        );
        let descriptions = release_lists::build_column_descriptions(lists.iter(), &reference);
        lists.insert(release_lists::COLUMN_DESCRIPTIONS, descriptions);

        let published = if self.dry_run {
            info!(tables = lists.len(), "Dry run, nothing published");
            false
        } else {
            for (name, table) in lists.iter() {
                self.sink.write_table(name, table).await?;
            }
            true
        };

        info!(
            run_id = %run_id,
            releasable = split.releasable.len(),
            errored = split.errored.len(),
            aux_files = battery.aux_files().len(),
            "Release run complete"
        );

        Ok(ReleaseOutcome {
            run_id,
            ingest,
            partition: split,
            class_counts,
            aux_files: battery.channels.aux_files,
            lists,
            published,
        })
    }

    async fn released_entities(&self) -> ReleaseResult<Vec<String>> {
        let Some(table) = self.sink.read_table(RELEASED_ENTITIES).await? else {
            return Ok(Vec::new());
        };
        match table.column_values(columns::ENTITY_ID) {
            Some(values) => Ok(values.into_iter().flatten().map(str::to_string).collect()),
            None => {
                warn!("{} has no entityId column, nothing withheld", RELEASED_ENTITIES);
                Ok(Vec::new())
            }
        }
    }
}

/// Listing minus excluded or released entities and excluded manifests
fn select_candidates(listing: &[FileEntry], reference: &ReferenceData) -> Vec<FileEntry> {
    listing
        .iter()
        .filter(|e| !reference.is_excluded_file(&e.entity_id))
        .filter(|e| !reference.is_excluded_manifest(&e.manifest_id))
        .cloned()
        .collect()
}
