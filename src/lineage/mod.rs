//! Lineage (provenance) recording.
//!
//! Ingestion events are written to a SQLite metadata store organised the way
//! ML metadata trackers usually are:
//!
//! - a **pipeline** per task (e.g. `text-classification`)
//! - a **context** per ingested model inside that pipeline
//! - an **execution** per ingestion run of that model
//! - **artifacts** (models and datasets) keyed by uri, linked to executions
//!   by **events** that say whether the artifact was an input or an output
//!
//! Writes happen through a [`LineageSession`]. Its artifacts and events
//! commit together when it is finalized; a session dropped early rolls them
//! back and still marks its execution finished.

mod store;

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::HubtrailError;
use crate::normalize::Properties;

pub use store::{LineageSession, LineageStore};

/// Whether an artifact was consumed or produced by an execution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Input,
    Output,
}

impl Direction {
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Input => "INPUT",
            Direction::Output => "OUTPUT",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = HubtrailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "INPUT" => Ok(Direction::Input),
            "OUTPUT" => Ok(Direction::Output),
            other => Err(HubtrailError::UnknownDirection(other.to_string())),
        }
    }
}

/// Type of artifact stored in the lineage store.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactKind {
    Model,
    Dataset,
}

impl ArtifactKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ArtifactKind::Model => "model",
            ArtifactKind::Dataset => "dataset",
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s {
            "model" => Some(ArtifactKind::Model),
            "dataset" => Some(ArtifactKind::Dataset),
            _ => None,
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// One recorded input/output event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct LineageEvent {
    pub direction: Direction,
    pub kind: ArtifactKind,
    pub uri: String,
    /// Property values as they were when the event was recorded.
    pub properties: Properties,
}

/// Summary row for an artifact known to the store.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ArtifactSummary {
    pub kind: ArtifactKind,
    pub uri: String,
    pub event_count: usize,
    pub updated_at: String,
}
