//! Schema-less catalog records as returned by the hub.
//!
//! Hub responses drift over time, so a [`CatalogRecord`] keeps the raw JSON
//! object and only offers typed accessors for the handful of keys the
//! ingestion pipeline relies on:
//!
//! - `modelId` / `id`: the repository identifier
//! - `cardData.license`: the license declared in the model card
//! - `cardData.datasets`: dataset ids referenced by the model card
//! - `description`: free-text description (datasets)

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::HubtrailError;

/// Key holding the model identifier in hub model listings.
pub const MODEL_ID_KEY: &str = "modelId";
/// Key holding the repository identifier for any repo type.
pub const ID_KEY: &str = "id";
/// Key holding the free-form model/dataset card metadata.
pub const CARD_DATA_KEY: &str = "cardData";
/// Free-text field dropped from dataset events.
pub const DESCRIPTION_KEY: &str = "description";

/// One model or dataset entry from the hub.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CatalogRecord {
    fields: Map<String, Value>,
}

impl CatalogRecord {
    /// Builds a record from a JSON value, returning `None` for non-objects.
    pub fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Object(fields) => Some(Self { fields }),
            _ => None,
        }
    }

    /// Parses a record from raw JSON bytes.
    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, HubtrailError> {
        serde_json::from_slice(bytes).map_err(HubtrailError::RecordParse)
    }

    /// Top-level field by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// Follows a chain of object keys, e.g. `["cardData", "license"]`.
    pub fn get_path(&self, path: &[&str]) -> Option<&Value> {
        let (first, rest) = path.split_first()?;
        let mut current = self.fields.get(*first)?;
        for key in rest {
            current = current.as_object()?.get(*key)?;
        }
        Some(current)
    }

    /// Number of top-level fields.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    /// True when the record has no fields.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Top-level fields in hub order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.fields.iter()
    }

    /// Identifier of a model record: `modelId`, falling back to `id`.
    ///
    /// Returns `None` when neither key holds a non-blank string.
    pub fn model_id(&self) -> Option<&str> {
        self.string_field(MODEL_ID_KEY)
            .or_else(|| self.string_field(ID_KEY))
    }

    /// Identifier of a dataset record (`id`).
    pub fn dataset_id(&self) -> Option<&str> {
        self.string_field(ID_KEY)
    }

    /// The `cardData.license` value, if present.
    pub fn license(&self) -> Option<&Value> {
        self.get_path(&[CARD_DATA_KEY, "license"])
    }

    /// Whether the card declares a license that counts as set.
    pub fn has_license(&self) -> bool {
        self.license().is_some_and(is_truthy)
    }

    /// Dataset ids referenced by `cardData.datasets`.
    ///
    /// Cards use either a single string or a list of strings; non-string
    /// list entries are ignored.
    pub fn card_datasets(&self) -> Vec<String> {
        match self.get_path(&[CARD_DATA_KEY, "datasets"]) {
            Some(Value::String(id)) if !id.trim().is_empty() => vec![id.clone()],
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .filter(|id| !id.trim().is_empty())
                .map(str::to_string)
                .collect(),
            _ => Vec::new(),
        }
    }

    fn string_field(&self, key: &str) -> Option<&str> {
        self.fields
            .get(key)
            .and_then(Value::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}

/// Truthiness of a JSON value: null, `false`, zero, and empty
/// strings/arrays/objects are falsy.
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
