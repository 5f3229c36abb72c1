//! Hubtrail: Hugging Face Hub ingestion with lineage tracking.
//!
//! Hubtrail lists models for a task on the Hugging Face Hub, downloads the
//! licensed ones that have not been seen before, and records each model and
//! the datasets its card references as provenance events in a local SQLite
//! metadata store.
//!
//! # Modules
//!
//! - [`record`]: Schema-less catalog records and their known keys
//! - [`normalize`]: ASCII-safe property values
//! - [`hub`]: Hub API client and snapshot downloads
//! - [`catalog`]: Task-filtered listings and spreadsheet export
//! - [`lineage`]: The lineage store and recording sessions
//! - [`ingest`]: The license/dedup gate and the ingestion pipeline
//! - [`error`]: Error types for hubtrail operations

pub mod catalog;
pub mod error;
pub mod hub;
pub mod ingest;
pub mod lineage;
pub mod normalize;
pub mod record;

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use tracing::info;

pub use error::HubtrailError;

use catalog::export::{write_catalog_csv, DATASETS_EXPORT, MODELS_EXPORT};
use catalog::{CatalogTable, FilterParams, ModelListing};
use hub::{DatasetQuery, HfHub, Hub, HubConfig, ModelQuery, RepoKind, DEFAULT_ENDPOINT};
use ingest::{IngestConfig, Ingestor};
use lineage::LineageStore;

/// The hubtrail CLI application.
#[derive(Parser)]
#[command(name = "hubtrail")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Options shared by every subcommand.
#[derive(clap::Args)]
struct GlobalArgs {
    /// Lineage store (SQLite file).
    #[arg(long, global = true, env = "HUBTRAIL_STORE", default_value = "mlmd.sqlite")]
    store: PathBuf,

    /// Hub endpoint (can point at a private hub).
    #[arg(long, global = true, env = "HF_ENDPOINT", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Access token sent as a bearer token.
    #[arg(long, global = true, env = "HF_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Directory model snapshots are written to.
    #[arg(long, global = true, env = "HUBTRAIL_MODELS_DIR", default_value = "models")]
    models_dir: PathBuf,

    /// Directory dataset snapshots are written to.
    #[arg(long, global = true, env = "HUBTRAIL_DATASETS_DIR", default_value = "datasets")]
    datasets_dir: PathBuf,

    /// Download cache used before files are copied into place.
    #[arg(long, global = true, env = "HUBTRAIL_CACHE_DIR")]
    cache_dir: Option<PathBuf>,

    /// Per-request timeout in seconds.
    #[arg(long, global = true, default_value_t = 30)]
    timeout: u64,
}

impl GlobalArgs {
    fn hub_config(&self) -> HubConfig {
        HubConfig {
            endpoint: self.endpoint.clone(),
            token: self.token.clone(),
            cache_dir: self.cache_dir.clone(),
            timeout: Duration::from_secs(self.timeout),
        }
    }

    fn ingest_config(&self, task: &str) -> IngestConfig {
        IngestConfig {
            task: task.to_string(),
            models_dir: self.models_dir.clone(),
            datasets_dir: self.datasets_dir.clone(),
        }
    }
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Ingest every licensed, not yet recorded model for a task.
    Ingest(IngestArgs),
    /// Ingest a single model and the datasets its card references.
    IngestModel(IngestModelArgs),
    /// Export catalog snapshots of models and datasets as CSV.
    Catalog(CatalogArgs),
    /// List artifacts recorded in the lineage store.
    Artifacts(ArtifactsArgs),
}

/// Arguments for the ingest subcommand.
#[derive(clap::Args)]
struct IngestArgs {
    /// Hub task, e.g. 'text-classification'.
    task: String,

    /// Maximum number of catalog rows to consider.
    #[arg(long)]
    limit: Option<usize>,

    /// Output format for the report ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Arguments for the ingest-model subcommand.
#[derive(clap::Args)]
struct IngestModelArgs {
    /// Hub task, used as the lineage pipeline name.
    task: String,

    /// Model id or hub URL (a `/tree/<rev>` URL pins that revision).
    model: String,

    /// Git revision (branch, tag or commit) to snapshot.
    #[arg(long)]
    revision: Option<String>,
}

/// Arguments for the catalog subcommand.
#[derive(clap::Args)]
struct CatalogArgs {
    /// Task to list (repeatable). Defaults to the built-in task list.
    #[arg(long = "task")]
    tasks: Vec<String>,

    /// List without any task or size filter.
    #[arg(long, conflicts_with = "tasks")]
    unfiltered: bool,

    /// Maximum number of rows per listing.
    #[arg(long)]
    limit: Option<usize>,

    /// Skip the dataset snapshot.
    #[arg(long)]
    skip_datasets: bool,

    /// Directory the CSV files are written to.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,
}

/// Arguments for the artifacts subcommand.
#[derive(clap::Args)]
struct ArtifactsArgs {
    /// Output format ('text' or 'json').
    #[arg(long, default_value = "text")]
    output: String,
}

/// Run the hubtrail CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), HubtrailError> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Ingest(args)) => run_ingest(&cli.global, args),
        Some(Commands::IngestModel(args)) => run_ingest_model(&cli.global, args),
        Some(Commands::Catalog(args)) => run_catalog(&cli.global, args),
        Some(Commands::Artifacts(args)) => run_artifacts(&cli.global, args),
        None => {
            println!("hubtrail {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Hugging Face Hub ingestion with lineage tracking.");
            println!();
            println!("Run 'hubtrail --help' for usage information.");
            Ok(())
        }
    }
}

fn check_output_format(output: &str) -> Result<(), HubtrailError> {
    match output {
        "text" | "json" => Ok(()),
        other => Err(HubtrailError::UnsupportedFormat(format!(
            "'{}' (supported: text, json)",
            other
        ))),
    }
}

/// Execute the ingest subcommand.
fn run_ingest(global: &GlobalArgs, args: IngestArgs) -> Result<(), HubtrailError> {
    check_output_format(&args.output)?;

    let store = LineageStore::open(&global.store)?;
    let hub = HfHub::new(global.hub_config());
    let ingestor = Ingestor::new(hub, &store, global.ingest_config(&args.task));

    let report = ingestor.run_task(args.limit)?;

    if args.output == "json" {
        let json = serde_json::to_string_pretty(&report).map_err(HubtrailError::Json)?;
        println!("{json}");
    } else {
        print!("{}", report);
    }
    Ok(())
}

/// Execute the ingest-model subcommand.
fn run_ingest_model(global: &GlobalArgs, args: IngestModelArgs) -> Result<(), HubtrailError> {
    let repo =
        hub::resolve::parse_repo_input(&args.model, RepoKind::Model, args.revision.as_deref())?;
    if repo.kind != RepoKind::Model {
        return Err(HubtrailError::HubResolveError {
            input: args.model,
            message: "expected a model reference, found a dataset".to_string(),
        });
    }

    let store = LineageStore::open(&global.store)?;
    let hub = HfHub::new(global.hub_config());
    let ingestor = Ingestor::new(hub, &store, global.ingest_config(&args.task));

    let outcome = ingestor.ingest_model(&repo)?;
    println!("{}", outcome);
    Ok(())
}

/// Execute the catalog subcommand.
fn run_catalog(global: &GlobalArgs, args: CatalogArgs) -> Result<(), HubtrailError> {
    let hub = HfHub::new(global.hub_config());
    let filters = FilterParams::default();
    std::fs::create_dir_all(&args.output_dir)?;

    let models = if args.unfiltered {
        hub.list_models(&ModelQuery {
            limit: args.limit,
            ..Default::default()
        })?
    } else {
        let tasks = if args.tasks.is_empty() {
            filters.model_tasks.clone()
        } else {
            args.tasks.clone()
        };
        let listing = ModelListing {
            limit: args.limit,
            ..Default::default()
        };
        catalog::models_for_tasks(&hub, &tasks, &listing)?
    };

    let models_path = args.output_dir.join(MODELS_EXPORT);
    write_catalog_csv(&models_path, &CatalogTable::from_records(&models))?;
    info!(path = %models_path.display(), "wrote model catalog");
    println!("{} model(s) -> {}", models.len(), models_path.display());

    if args.skip_datasets {
        return Ok(());
    }

    let datasets = if args.unfiltered {
        hub.list_datasets(&DatasetQuery {
            limit: args.limit,
            ..Default::default()
        })?
    } else {
        let filters = if args.tasks.is_empty() {
            filters
        } else {
            FilterParams {
                dataset_tasks: args.tasks.clone(),
                ..filters
            }
        };
        catalog::datasets_info(&hub, &filters, args.limit)?
    };

    let datasets_path = args.output_dir.join(DATASETS_EXPORT);
    write_catalog_csv(&datasets_path, &CatalogTable::from_records(&datasets))?;
    info!(path = %datasets_path.display(), "wrote dataset catalog");
    println!("{} dataset(s) -> {}", datasets.len(), datasets_path.display());

    Ok(())
}

/// Execute the artifacts subcommand.
fn run_artifacts(global: &GlobalArgs, args: ArtifactsArgs) -> Result<(), HubtrailError> {
    check_output_format(&args.output)?;

    let store = LineageStore::open(&global.store)?;
    let artifacts = store.artifacts()?;

    if args.output == "json" {
        let json =
            serde_json::to_string_pretty(&artifacts).map_err(HubtrailError::Json)?;
        println!("{json}");
        return Ok(());
    }

    if artifacts.is_empty() {
        println!("No artifacts recorded in {}", global.store.display());
        return Ok(());
    }

    for artifact in &artifacts {
        println!(
            "{:<8} {}  ({} event(s), updated {})",
            artifact.kind, artifact.uri, artifact.event_count, artifact.updated_at
        );
    }
    println!("{} artifact(s)", artifacts.len());
    Ok(())
}
