//! License and prior-ingestion gate.

use serde::Serialize;

use crate::error::HubtrailError;
use crate::lineage::LineageStore;
use crate::record::CatalogRecord;

/// Why a catalog record was not ingested.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// The record has no usable identifier.
    MissingIdentifier,
    /// `cardData.license` is absent or empty.
    NoLicense,
    /// The identifier already appears in the lineage store.
    AlreadyIngested,
    /// The hub has no metadata for the identifier.
    NotFound,
}

impl SkipReason {
    pub fn describe(self) -> &'static str {
        match self {
            SkipReason::MissingIdentifier => "no identifier",
            SkipReason::NoLicense => "no license",
            SkipReason::AlreadyIngested => "already ingested",
            SkipReason::NotFound => "not found on hub",
        }
    }
}

/// Outcome of [`Gate::check`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GateDecision {
    Proceed(String),
    Skip {
        model: Option<String>,
        reason: SkipReason,
    },
}

/// Decides per catalog record whether ingestion should go ahead.
///
/// The set of already-recorded artifacts is captured once, when the gate is
/// built, and never refreshed.
#[derive(Clone, Debug, Default)]
pub struct Gate {
    ingested: Vec<String>,
}

impl Gate {
    pub fn new(ingested: Vec<String>) -> Self {
        Self { ingested }
    }

    /// Builds a gate from every artifact currently in `store`.
    pub fn from_store(store: &LineageStore) -> Result<Self, HubtrailError> {
        Ok(Self::new(store.get_all_artifacts()?))
    }

    /// True when any recorded artifact contains `model_id`.
    ///
    /// This is substring containment, not equality: `bert` matches a recorded
    /// `models/bert-large`.
    pub fn already_ingested(&self, model_id: &str) -> bool {
        self.ingested.iter().any(|uri| uri.contains(model_id))
    }

    pub fn check(&self, record: &CatalogRecord) -> GateDecision {
        let Some(model_id) = record.model_id() else {
            return GateDecision::Skip {
                model: None,
                reason: SkipReason::MissingIdentifier,
            };
        };

        let reason = if !record.has_license() {
            SkipReason::NoLicense
        } else if self.already_ingested(model_id) {
            SkipReason::AlreadyIngested
        } else {
            return GateDecision::Proceed(model_id.to_string());
        };

        GateDecision::Skip {
            model: Some(model_id.to_string()),
            reason,
        }
    }
}
