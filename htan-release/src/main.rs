//! htan-release - pre-release validation for HTAN data releases
//!
//! Subcommands:
//! - `validate`: ingest manifests, run the checker battery, publish release lists
//! - `promote`: fold the last validation run into the versioned released tables
//! - `tickets`: file operator tickets from the published error tables

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use htan_common::config::{ConfigResolver, TomlConfig};
use htan_common::Table;
use htan_release::ingest::LocalManifestSource;
use htan_release::models::Fileview;
use htan_release::promote::{plan_promotion, publish_promotion};
use htan_release::release_lists::{CLIN_BIO_ERRORS, ERRORS};
use htan_release::services::{CachedChildrenLookup, ChildrenLookup, StorageClient, TableChildrenLookup};
use htan_release::sinks::{file_tickets, plan_tickets, OutboxTicketSink, ReleaseSink, SqliteWarehouse};
use htan_release::{load_snapshot, ReleaseRun};
use std::path::PathBuf;
use tracing::{error, info, warn};

/// Command-line arguments for htan-release
#[derive(Parser, Debug)]
#[command(name = "htan-release")]
#[command(about = "Pre-release validation and cataloging for HTAN data releases")]
#[command(version)]
struct Args {
    /// Config file (overrides HTAN_RELEASE_CONFIG and the default locations)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Snapshot directory holding the collaborator exports
    #[arg(long, global = true, env = "HTAN_RELEASE_INPUTS")]
    inputs: Option<PathBuf>,

    /// SQLite warehouse file
    #[arg(long, global = true, env = "HTAN_RELEASE_WAREHOUSE")]
    warehouse: Option<PathBuf>,

    /// Build everything but write nothing
    #[arg(long, global = true)]
    dry_run: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate manifests and publish the release lists
    Validate,
    /// Publish the cumulative and versioned released tables
    Promote {
        /// Release label, e.g. "release5.0"
        #[arg(short, long)]
        release: String,
    },
    /// File tickets for the errors of the last validation run
    Tickets {
        /// Release label, e.g. "release5.0"
        #[arg(short, long)]
        release: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Config is resolved before tracing starts so its log level applies
    let resolver = ConfigResolver::new(args.config.clone());
    let mut config = resolver.load().context("Failed to load configuration")?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.logging.level.as_str().into()),
        )
        .init();

    info!(
        "Starting htan-release v{} [{}] built {} ({})",
        env!("CARGO_PKG_VERSION"),
        env!("GIT_HASH"),
        env!("BUILD_TIMESTAMP"),
        env!("BUILD_PROFILE")
    );
    match resolver.resolve_path() {
        Some(path) => info!("Configuration: {}", path.display()),
        None => warn!("No config file found, using compiled defaults"),
    }

    if let Some(inputs) = args.inputs {
        config.inputs.dir = inputs;
    }
    if let Some(warehouse) = args.warehouse {
        config.warehouse.path = warehouse;
    }
    info!("Inputs: {}", config.inputs.dir.display());
    info!("Warehouse: {}", config.warehouse.path.display());

    let warehouse = SqliteWarehouse::open(&config.warehouse.path)
        .await
        .context("Failed to open warehouse")?;

    let result = match args.command {
        Command::Validate => validate(&config, &warehouse, args.dry_run).await,
        Command::Promote { release } => promote(&config, &warehouse, &release, args.dry_run).await,
        Command::Tickets { release } => tickets(&config, &warehouse, &release, args.dry_run).await,
    };

    if let Err(e) = &result {
        error!("Run failed: {:#}", e);
    }
    result
}

async fn validate(config: &TomlConfig, warehouse: &SqliteWarehouse, dry_run: bool) -> Result<()> {
    let snapshot = load_snapshot(config).context("Failed to load reference snapshot")?;
    let source = LocalManifestSource::new(&config.inputs.dir, &config.inputs.manifest_index);
    let lookup = children_lookup(config)?;

    let outcome = ReleaseRun::new(config, &source, lookup.as_ref(), warehouse)
        .dry_run(dry_run)
        .execute(snapshot)
        .await?;

    info!(
        "Run {}: {} releasable, {} errored, {} tables{}",
        outcome.run_id,
        outcome.partition.releasable.len(),
        outcome.partition.errored.len(),
        outcome.lists.len(),
        if outcome.published { " published" } else { " (dry run)" }
    );
    for (class, count) in &outcome.class_counts {
        info!("  {} violations: {}", class, count);
    }
    if !outcome.aux_files.is_empty() {
        info!("  auxiliary files: {}", outcome.aux_files.len());
    }
    Ok(())
}

async fn promote(config: &TomlConfig, warehouse: &SqliteWarehouse, release: &str, dry_run: bool) -> Result<()> {
    let fileview_path = config.inputs.path_of(&config.inputs.fileview);
    let fileview = Fileview::from_table(&Table::from_csv_path(&fileview_path)?)?;

    let promotion = plan_promotion(warehouse, &fileview, release).await?;
    if dry_run {
        for (name, table) in promotion.tables() {
            info!("Would write {} ({} rows)", name, table.len());
        }
        return Ok(());
    }
    publish_promotion(warehouse, &promotion).await?;
    Ok(())
}

async fn tickets(config: &TomlConfig, warehouse: &SqliteWarehouse, release: &str, dry_run: bool) -> Result<()> {
    let errors = warehouse
        .read_table(ERRORS)
        .await?
        .context("No errors table, run validate first")?;
    let clin_bio = warehouse
        .read_table(CLIN_BIO_ERRORS)
        .await?
        .context("No clin_bio_errors table, run validate first")?;

    let plan = plan_tickets(&errors, &clin_bio, release)?;
    if dry_run || plan.is_empty() {
        for ticket in &plan.manifest_tickets {
            info!("Would file: {}", ticket.request.title);
        }
        for request in &plan.clin_bio_tickets {
            info!("Would file: {}", request.title);
        }
        return Ok(());
    }

    let sink = OutboxTicketSink::open(&config.tickets.outbox).await?;
    let filed = file_tickets(&plan, &sink).await?;
    info!(
        "Filed {} manifest, {} master and {} clinical/biospecimen tickets to {}",
        filed.manifest.len(),
        filed.master.len(),
        filed.clin_bio.len(),
        config.tickets.outbox.display()
    );
    Ok(())
}

/// REST lookup when a storage endpoint is configured, else the local export
fn children_lookup(config: &TomlConfig) -> Result<Box<dyn ChildrenLookup>> {
    if let Some(endpoint) = &config.storage.endpoint {
        info!("Children lookup: {}", endpoint);
        let client = StorageClient::from_env(endpoint, config.storage.auth_token_env.as_deref())?;
        return Ok(Box::new(CachedChildrenLookup::new(client)));
    }

    let path = config.inputs.path_of(&config.inputs.children);
    let local = if path.exists() {
        TableChildrenLookup::load(&path)?
    } else {
        warn!("No children listing at {}, channel paths will not resolve", path.display());
        TableChildrenLookup::default()
    };
    Ok(Box::new(CachedChildrenLookup::new(local)))
}
