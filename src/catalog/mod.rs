//! Catalog snapshots of the hub.
//!
//! Fetches task-filtered model and dataset listings and flattens them into
//! a [`CatalogTable`] that can be exported as a spreadsheet.

pub mod export;

use serde_json::Value;
use tracing::info;

use crate::error::HubtrailError;
use crate::hub::{DatasetQuery, Hub, ModelQuery};
use crate::normalize::render_value;
use crate::record::CatalogRecord;

/// Default task and size filters used for catalog snapshots.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FilterParams {
    pub model_tasks: Vec<String>,
    pub dataset_tasks: Vec<String>,
    pub dataset_sizes: Vec<String>,
}

impl Default for FilterParams {
    fn default() -> Self {
        let model_tasks = [
            "text-classification",
            "question-answering",
            "summarization",
            "conversational",
            "text-generation",
        ];
        let dataset_tasks = model_tasks.iter().copied().chain(["text-retrieval"]);

        Self {
            model_tasks: model_tasks.iter().map(|t| t.to_string()).collect(),
            dataset_tasks: dataset_tasks.map(str::to_string).collect(),
            dataset_sizes: vec!["100M<n<1B".to_string(), "1B<n<10B".to_string()],
        }
    }
}

/// Options shared by per-task model listings.
#[derive(Clone, Debug)]
pub struct ModelListing {
    pub card_data: bool,
    pub fetch_config: bool,
    pub sort: String,
    /// Maximum number of records per task.
    pub limit: Option<usize>,
}

impl Default for ModelListing {
    fn default() -> Self {
        Self {
            card_data: true,
            fetch_config: true,
            sort: "downloads".to_string(),
            limit: None,
        }
    }
}

/// Lists models for each task in `tasks`, concatenated in task order.
pub fn models_for_tasks<H: Hub>(
    hub: &H,
    tasks: &[String],
    listing: &ModelListing,
) -> Result<Vec<CatalogRecord>, HubtrailError> {
    let mut records = Vec::new();
    for task in tasks {
        let query = ModelQuery {
            task: Some(task.clone()),
            search: None,
            card_data: listing.card_data,
            fetch_config: listing.fetch_config,
            sort: listing.sort.clone(),
            limit: listing.limit,
        };
        let batch = hub.list_models(&query)?;
        info!(task = %task, count = batch.len(), "listed models");
        records.extend(batch);
    }
    Ok(records)
}

/// Lists datasets for every task/size combination in `filters`.
pub fn datasets_info<H: Hub>(
    hub: &H,
    filters: &FilterParams,
    limit: Option<usize>,
) -> Result<Vec<CatalogRecord>, HubtrailError> {
    let mut records = Vec::new();
    for task in &filters.dataset_tasks {
        for size in &filters.dataset_sizes {
            let query = DatasetQuery {
                task_category: Some(task.clone()),
                size_category: Some(size.clone()),
                limit,
                ..Default::default()
            };
            let batch = hub.list_datasets(&query)?;
            info!(task = %task, size = %size, count = batch.len(), "listed datasets");
            records.extend(batch);
        }
    }
    Ok(records)
}

/// Flattens nested objects into `parent_child` columns.
///
/// Arrays and scalars are leaves; an empty object becomes a leaf too so the
/// column is not lost.
pub fn flatten_record(record: &CatalogRecord) -> Vec<(String, Value)> {
    let mut out = Vec::new();
    for (key, value) in record.iter() {
        flatten_into(key, value, &mut out);
    }
    out
}

fn flatten_into(prefix: &str, value: &Value, out: &mut Vec<(String, Value)>) {
    match value {
        Value::Object(map) if !map.is_empty() => {
            for (key, child) in map {
                flatten_into(&format!("{prefix}_{key}"), child, out);
            }
        }
        other => out.push((prefix.to_string(), other.clone())),
    }
}

/// Rectangular view of a set of flattened records.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CatalogTable {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl CatalogTable {
    /// Builds a table whose columns are the union of all flattened keys,
    /// in first-seen order. Missing and null cells are empty strings.
    pub fn from_records(records: &[CatalogRecord]) -> Self {
        let flattened: Vec<Vec<(String, Value)>> = records.iter().map(flatten_record).collect();

        let mut columns: Vec<String> = Vec::new();
        let mut index = std::collections::HashMap::new();
        for row in &flattened {
            for (key, _) in row {
                if !index.contains_key(key) {
                    index.insert(key.clone(), columns.len());
                    columns.push(key.clone());
                }
            }
        }

        let rows = flattened
            .into_iter()
            .map(|row| {
                let mut cells = vec![String::new(); columns.len()];
                for (key, value) in row {
                    if let Some(&idx) = index.get(&key) {
                        cells[idx] = match value {
                            Value::Null => String::new(),
                            other => render_value(&other),
                        };
                    }
                }
                cells
            })
            .collect();

        Self { columns, rows }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Cell value by row index and column name.
    pub fn cell(&self, row: usize, column: &str) -> Option<&str> {
        let idx = self.columns.iter().position(|c| c == column)?;
        self.rows.get(row).map(|cells| cells[idx].as_str())
    }
}
