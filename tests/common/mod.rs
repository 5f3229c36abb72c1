#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::path::Path;

use hubtrail::hub::{ArtifactReference, DatasetQuery, Hub, ModelQuery, RepoRef};
use hubtrail::record::CatalogRecord;
use hubtrail::HubtrailError;
use serde_json::Value;

/// In-memory hub used by the integration tests.
#[derive(Default)]
pub struct FakeHub {
    pub catalog: Vec<CatalogRecord>,
    pub dataset_catalog: Vec<CatalogRecord>,
    pub models: HashMap<String, CatalogRecord>,
    pub datasets: HashMap<String, CatalogRecord>,
    pub failing_models: HashSet<String>,
    pub failing_datasets: HashSet<String>,
    pub model_queries: RefCell<Vec<ModelQuery>>,
    pub dataset_queries: RefCell<Vec<DatasetQuery>>,
    pub snapshots: RefCell<Vec<RepoRef>>,
}

impl FakeHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a model both to the catalog listing and to the info lookup.
    pub fn with_model(mut self, value: Value) -> Self {
        let record = record(value);
        let id = record.model_id().expect("model id").to_string();
        self.catalog.push(record.clone());
        self.models.insert(id, record);
        self
    }

    /// Adds a catalog row that has no info entry behind it.
    pub fn with_listing_only(mut self, value: Value) -> Self {
        self.catalog.push(record(value));
        self
    }

    pub fn with_dataset(mut self, value: Value) -> Self {
        let record = record(value);
        let id = record.dataset_id().expect("dataset id").to_string();
        self.dataset_catalog.push(record.clone());
        self.datasets.insert(id, record);
        self
    }

    pub fn failing_model(mut self, id: &str) -> Self {
        self.failing_models.insert(id.to_string());
        self
    }

    pub fn failing_dataset(mut self, id: &str) -> Self {
        self.failing_datasets.insert(id.to_string());
        self
    }

    pub fn snapshot_ids(&self) -> Vec<String> {
        self.snapshots
            .borrow()
            .iter()
            .map(|repo| repo.repo_id.clone())
            .collect()
    }
}

impl Hub for FakeHub {
    fn list_models(&self, query: &ModelQuery) -> Result<Vec<CatalogRecord>, HubtrailError> {
        self.model_queries.borrow_mut().push(query.clone());
        let mut records = self.catalog.clone();
        if let Some(limit) = query.limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    fn list_datasets(&self, query: &DatasetQuery) -> Result<Vec<CatalogRecord>, HubtrailError> {
        self.dataset_queries.borrow_mut().push(query.clone());
        let mut records = self.dataset_catalog.clone();
        if let Some(limit) = query.limit {
            records.truncate(limit);
        }
        Ok(records)
    }

    fn model_info(&self, repo_id: &str) -> Result<Option<CatalogRecord>, HubtrailError> {
        if self.failing_models.contains(repo_id) {
            return Err(HubtrailError::HubApiError {
                repo_id: repo_id.to_string(),
                message: "simulated outage".to_string(),
            });
        }
        Ok(self.models.get(repo_id).cloned())
    }

    fn dataset_info(&self, repo_id: &str) -> Result<Option<CatalogRecord>, HubtrailError> {
        if self.failing_datasets.contains(repo_id) {
            return Err(HubtrailError::HubApiError {
                repo_id: repo_id.to_string(),
                message: "simulated outage".to_string(),
            });
        }
        Ok(self.datasets.get(repo_id).cloned())
    }

    fn snapshot(
        &self,
        repo: &RepoRef,
        local_dir: &Path,
    ) -> Result<ArtifactReference, HubtrailError> {
        self.snapshots.borrow_mut().push(repo.clone());
        Ok(ArtifactReference {
            repo_id: repo.repo_id.clone(),
            kind: repo.kind,
            local_dir: local_dir.to_path_buf(),
            files: Vec::new(),
        })
    }
}

pub fn record(value: Value) -> CatalogRecord {
    CatalogRecord::from_value(value).expect("record must be a JSON object")
}
