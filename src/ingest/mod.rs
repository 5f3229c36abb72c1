//! Catalog ingestion with lineage recording.
//!
//! For every catalog row the [`Gate`] decides whether to go ahead; accepted
//! models are downloaded, recorded as an `OUTPUT` artifact, and each dataset
//! named in their card is downloaded and recorded as an `INPUT`. A failure
//! while ingesting one model is reported and the run moves on.

pub mod gate;
pub mod report;

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde_json::Value;
use tracing::{error, info, warn};

use crate::catalog::{models_for_tasks, ModelListing};
use crate::error::HubtrailError;
use crate::hub::{ArtifactReference, Hub, RepoRef};
use crate::lineage::{Direction, LineageStore};
use crate::normalize::{normalize_properties, normalize_properties_excluding, normalize_value};
use crate::record::{CatalogRecord, DESCRIPTION_KEY};

pub use gate::{Gate, GateDecision, SkipReason};
pub use report::{IngestReport, ModelOutcome, OutcomeStatus};

/// Model artifact property holding the pinned revision, when one was asked for.
pub const REVISION_PROPERTY: &str = "revision";

/// Where ingestion writes snapshots and how it labels lineage.
#[derive(Clone, Debug)]
pub struct IngestConfig {
    /// Pipeline name in the lineage store (the hub task).
    pub task: String,
    pub models_dir: PathBuf,
    pub datasets_dir: PathBuf,
}

impl IngestConfig {
    pub fn new(task: impl Into<String>) -> Self {
        Self {
            task: task.into(),
            models_dir: PathBuf::from("models"),
            datasets_dir: PathBuf::from("datasets"),
        }
    }

    /// Local directory (and lineage uri) for a model.
    pub fn model_path(&self, model_id: &str) -> PathBuf {
        self.models_dir.join(model_id)
    }

    /// Local directory (and lineage uri) for a dataset.
    pub fn dataset_path(&self, dataset_id: &str) -> PathBuf {
        self.datasets_dir.join(dataset_id)
    }
}

/// Drives ingestion of hub models into a lineage store.
pub struct Ingestor<'a, H: Hub> {
    hub: H,
    store: &'a LineageStore,
    config: IngestConfig,
}

impl<'a, H: Hub> Ingestor<'a, H> {
    pub fn new(hub: H, store: &'a LineageStore, config: IngestConfig) -> Self {
        Self { hub, store, config }
    }

    /// Lists the models for the configured task and ingests them.
    pub fn run_task(&self, limit: Option<usize>) -> Result<IngestReport, HubtrailError> {
        let listing = ModelListing {
            fetch_config: false,
            limit,
            ..Default::default()
        };
        let catalog = models_for_tasks(&self.hub, std::slice::from_ref(&self.config.task), &listing)?;
        info!(task = %self.config.task, models = catalog.len(), "catalog fetched");

        let gate = Gate::from_store(self.store)?;
        Ok(self.run(&catalog, &gate))
    }

    /// Ingests every record accepted by `gate`, in catalog order.
    ///
    /// Errors for a single model are captured in the report; they never stop
    /// the run.
    pub fn run(&self, catalog: &[CatalogRecord], gate: &Gate) -> IngestReport {
        let mut report = IngestReport::new(self.config.task.clone(), catalog.len());
        let mut seen: HashSet<String> = HashSet::new();

        for record in catalog {
            let model_id = match gate.check(record) {
                GateDecision::Proceed(model_id) => model_id,
                GateDecision::Skip { model, reason } => {
                    info!(
                        model = model.as_deref().unwrap_or("<unnamed>"),
                        reason = reason.describe(),
                        "skipping model"
                    );
                    report.add(ModelOutcome::skipped(model, reason));
                    continue;
                }
            };

            if !seen.insert(model_id.clone()) {
                info!(model = %model_id, "model listed twice, skipping repeat");
                report.add(ModelOutcome::skipped(
                    Some(model_id),
                    SkipReason::AlreadyIngested,
                ));
                continue;
            }

            match self.ingest_model(&RepoRef::model(model_id.as_str())) {
                Ok(outcome) => report.add(outcome),
                Err(err) => {
                    error!(model = %model_id, error = %err, "error while ingesting model");
                    report.add(ModelOutcome::failed(model_id, err.to_string()));
                }
            }
        }

        report
    }

    /// Ingests one model and the datasets its card references.
    ///
    /// The snapshot is taken at `repo.revision` when one is given, and the
    /// revision is recorded on the model artifact. A model the hub does not
    /// know is reported as skipped without touching the lineage store.
    /// Dataset failures are logged and reported as unavailable; model lookup
    /// and store failures are returned.
    pub fn ingest_model(&self, repo: &RepoRef) -> Result<ModelOutcome, HubtrailError> {
        let model_id = repo.repo_id.as_str();
        info!(
            model = %model_id,
            revision = repo.revision.as_deref().unwrap_or("main"),
            "getting model"
        );

        let Some(model) = self.fetch_model(repo)? else {
            return Ok(ModelOutcome::skipped(
                Some(model_id.to_string()),
                SkipReason::NotFound,
            ));
        };

        let session = self
            .store
            .create_session(&self.config.task, model_id, model_id)?;

        let mut model_props = normalize_properties(&model);
        if let Some(revision) = repo.revision.as_deref() {
            model_props.insert(
                REVISION_PROPERTY.to_string(),
                normalize_value(&Value::from(revision)),
            );
        }
        let model_uri = uri_string(&self.config.model_path(model_id));
        session.log_model(&model_uri, Direction::Output, &model_props)?;

        let mut datasets = Vec::new();
        let mut missing = Vec::new();
        for dataset_id in model.card_datasets() {
            info!(model = %model_id, dataset = %dataset_id, "getting dataset");
            let Some(dataset) = self.fetch_dataset(&dataset_id) else {
                missing.push(dataset_id);
                continue;
            };

            let props = normalize_properties_excluding(&dataset, &[DESCRIPTION_KEY]);
            let dataset_uri = uri_string(&self.config.dataset_path(&dataset_id));
            session.log_dataset(&dataset_uri, Direction::Input, &props)?;
            datasets.push(dataset_id);
        }

        session.finalize()?;
        info!(model = %model_id, datasets = datasets.len(), "ingested");

        Ok(ModelOutcome::ingested(model_id, datasets, missing))
    }

    /// Looks up a model and, when the hub has it, downloads its snapshot.
    pub fn fetch_model(&self, repo: &RepoRef) -> Result<Option<CatalogRecord>, HubtrailError> {
        let Some(model) = self.hub.model_info(&repo.repo_id)? else {
            info!(model = %repo.repo_id, "model not in hub");
            return Ok(None);
        };

        self.pull(repo, &self.config.model_path(&repo.repo_id))?;
        Ok(Some(model))
    }

    /// Looks up and downloads a dataset; any failure yields `None`.
    pub fn fetch_dataset(&self, dataset_id: &str) -> Option<CatalogRecord> {
        let lookup = self.hub.dataset_info(dataset_id).and_then(|found| match found {
            Some(dataset) => {
                self.pull(&RepoRef::dataset(dataset_id), &self.config.dataset_path(dataset_id))?;
                Ok(Some(dataset))
            }
            None => Ok(None),
        });

        match lookup {
            Ok(Some(dataset)) => Some(dataset),
            Ok(None) => {
                warn!(dataset = %dataset_id, "dataset not in hub");
                None
            }
            Err(err) => {
                warn!(dataset = %dataset_id, error = %err, "failed to get dataset");
                None
            }
        }
    }

    fn pull(&self, repo: &RepoRef, local_dir: &Path) -> Result<ArtifactReference, HubtrailError> {
        self.hub.snapshot(repo, local_dir)
    }
}

fn uri_string(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}
