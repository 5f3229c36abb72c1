//! Hugging Face Hub access.
//!
//! This module owns remote-specific concerns: reference resolution
//! ([`resolve`]), metadata API calls ([`api`]), and snapshot downloads
//! ([`acquire`]). The ingestion pipeline only talks to the [`Hub`] trait so
//! it can run against an in-memory hub in tests.

pub mod acquire;
pub mod api;
pub mod resolve;

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Serialize;

use crate::error::HubtrailError;
use crate::record::CatalogRecord;

pub use api::HfHub;

/// Default public hub endpoint.
pub const DEFAULT_ENDPOINT: &str = "https://huggingface.co";

/// Kind of repository hosted on the hub.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RepoKind {
    Model,
    Dataset,
}

impl RepoKind {
    /// Path segment used by the hub REST API (`/api/<segment>`).
    pub fn api_segment(self) -> &'static str {
        match self {
            RepoKind::Model => "models",
            RepoKind::Dataset => "datasets",
        }
    }
}

impl fmt::Display for RepoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepoKind::Model => write!(f, "model"),
            RepoKind::Dataset => write!(f, "dataset"),
        }
    }
}

/// Canonical reference to a hub repository.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoRef {
    pub repo_id: String,
    pub kind: RepoKind,
    pub revision: Option<String>,
}

impl RepoRef {
    pub fn model(repo_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            kind: RepoKind::Model,
            revision: None,
        }
    }

    pub fn dataset(repo_id: impl Into<String>) -> Self {
        Self {
            repo_id: repo_id.into(),
            kind: RepoKind::Dataset,
            revision: None,
        }
    }
}

/// Files materialized locally for one repository snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArtifactReference {
    pub repo_id: String,
    pub kind: RepoKind,
    pub local_dir: PathBuf,
    pub files: Vec<PathBuf>,
}

/// Connection settings for [`HfHub`].
#[derive(Clone, Debug)]
pub struct HubConfig {
    pub endpoint: String,
    pub token: Option<String>,
    pub cache_dir: Option<PathBuf>,
    pub timeout: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            token: None,
            cache_dir: None,
            timeout: Duration::from_secs(30),
        }
    }
}

/// Listing query for models.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelQuery {
    /// Pipeline task tag, e.g. `text-classification`.
    pub task: Option<String>,
    /// Exact or partial model name to search for.
    pub search: Option<String>,
    pub card_data: bool,
    pub fetch_config: bool,
    pub sort: String,
    pub limit: Option<usize>,
}

impl Default for ModelQuery {
    fn default() -> Self {
        Self {
            task: None,
            search: None,
            card_data: true,
            fetch_config: true,
            sort: "downloads".to_string(),
            limit: None,
        }
    }
}

/// Listing query for datasets.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetQuery {
    pub task_category: Option<String>,
    pub size_category: Option<String>,
    pub search: Option<String>,
    pub card_data: bool,
    pub full: bool,
    pub limit: Option<usize>,
}

impl Default for DatasetQuery {
    fn default() -> Self {
        Self {
            task_category: None,
            size_category: None,
            search: None,
            card_data: true,
            full: true,
            limit: None,
        }
    }
}

/// Operations the ingestion pipeline needs from a model hub.
pub trait Hub {
    /// Lists models matching `query`, most downloaded first.
    fn list_models(&self, query: &ModelQuery) -> Result<Vec<CatalogRecord>, HubtrailError>;

    /// Lists datasets matching `query`.
    fn list_datasets(&self, query: &DatasetQuery) -> Result<Vec<CatalogRecord>, HubtrailError>;

    /// Full metadata for one model, or `None` when the hub has no such repo.
    fn model_info(&self, repo_id: &str) -> Result<Option<CatalogRecord>, HubtrailError>;

    /// Full metadata for one dataset, or `None` when the hub has no such repo.
    fn dataset_info(&self, repo_id: &str) -> Result<Option<CatalogRecord>, HubtrailError>;

    /// Downloads every file of `repo` into `local_dir`.
    fn snapshot(&self, repo: &RepoRef, local_dir: &Path)
        -> Result<ArtifactReference, HubtrailError>;
}

impl<H: Hub + ?Sized> Hub for &H {
    fn list_models(&self, query: &ModelQuery) -> Result<Vec<CatalogRecord>, HubtrailError> {
        (**self).list_models(query)
    }

    fn list_datasets(&self, query: &DatasetQuery) -> Result<Vec<CatalogRecord>, HubtrailError> {
        (**self).list_datasets(query)
    }

    fn model_info(&self, repo_id: &str) -> Result<Option<CatalogRecord>, HubtrailError> {
        (**self).model_info(repo_id)
    }

    fn dataset_info(&self, repo_id: &str) -> Result<Option<CatalogRecord>, HubtrailError> {
        (**self).dataset_info(repo_id)
    }

    fn snapshot(
        &self,
        repo: &RepoRef,
        local_dir: &Path,
    ) -> Result<ArtifactReference, HubtrailError> {
        (**self).snapshot(repo, local_dir)
    }
}
