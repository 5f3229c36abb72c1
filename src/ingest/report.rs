//! Ingestion run reports.
//!
//! An [`IngestReport`] lists one [`ModelOutcome`] per catalog row, in the order
//! the rows were processed, and renders either as text or JSON.

use serde::Serialize;
use std::fmt;

use super::gate::SkipReason;

/// What happened to a single model.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Ingested {
        /// Datasets recorded as inputs.
        datasets: Vec<String>,
        /// Referenced datasets the hub could not provide.
        missing_datasets: Vec<String>,
    },
    Skipped {
        reason: SkipReason,
    },
    Failed {
        error: String,
    },
}

/// Per-model entry of an [`IngestReport`].
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ModelOutcome {
    pub model: Option<String>,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl ModelOutcome {
    pub fn ingested(model: impl Into<String>, datasets: Vec<String>, missing: Vec<String>) -> Self {
        Self {
            model: Some(model.into()),
            status: OutcomeStatus::Ingested {
                datasets,
                missing_datasets: missing,
            },
        }
    }

    pub fn skipped(model: Option<String>, reason: SkipReason) -> Self {
        Self {
            model,
            status: OutcomeStatus::Skipped { reason },
        }
    }

    pub fn failed(model: impl Into<String>, error: impl Into<String>) -> Self {
        Self {
            model: Some(model.into()),
            status: OutcomeStatus::Failed {
                error: error.into(),
            },
        }
    }

    pub fn is_ingested(&self) -> bool {
        matches!(self.status, OutcomeStatus::Ingested { .. })
    }

    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self.status {
            OutcomeStatus::Skipped { reason } => Some(reason),
            _ => None,
        }
    }
}

impl fmt::Display for ModelOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let model = self.model.as_deref().unwrap_or("<unnamed>");
        match &self.status {
            OutcomeStatus::Ingested {
                datasets,
                missing_datasets,
            } => {
                write!(f, "ingested {model}")?;
                if !datasets.is_empty() {
                    write!(f, " (datasets: {})", datasets.join(", "))?;
                }
                if !missing_datasets.is_empty() {
                    write!(f, " (unavailable: {})", missing_datasets.join(", "))?;
                }
                Ok(())
            }
            OutcomeStatus::Skipped { reason } => {
                write!(f, "skipped {model}: {}", reason.describe())
            }
            OutcomeStatus::Failed { error } => write!(f, "failed {model}: {error}"),
        }
    }
}

/// Result of an ingestion run over a catalog.
#[derive(Clone, Debug, Default, Serialize)]
pub struct IngestReport {
    pub task: String,
    /// Number of catalog rows returned by the hub.
    pub catalog_size: usize,
    pub outcomes: Vec<ModelOutcome>,
}

impl IngestReport {
    pub fn new(task: impl Into<String>, catalog_size: usize) -> Self {
        Self {
            task: task.into(),
            catalog_size,
            outcomes: Vec::new(),
        }
    }

    pub fn add(&mut self, outcome: ModelOutcome) {
        self.outcomes.push(outcome);
    }

    pub fn ingested_count(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_ingested()).count()
    }

    pub fn skipped_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.skip_reason().is_some())
            .count()
    }

    pub fn failed_count(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, OutcomeStatus::Failed { .. }))
            .count()
    }

    pub fn count_skipped(&self, reason: SkipReason) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.skip_reason() == Some(reason))
            .count()
    }
}

impl fmt::Display for IngestReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Task '{}': {} model(s) in catalog",
            self.task, self.catalog_size
        )?;
        for outcome in &self.outcomes {
            writeln!(f, "  {}", outcome)?;
        }
        writeln!(
            f,
            "{} ingested, {} skipped, {} failed",
            self.ingested_count(),
            self.skipped_count(),
            self.failed_count()
        )
    }
}
