//! The reference NDVI dataset.
//!
//! An ordered, immutable sequence of records loaded from a JSON file. The
//! dataset is the only context the extraction model is allowed to use; it is
//! serialized verbatim (pretty-printed) into the extraction prompt.

use std::path::Path;

use anyhow::{Context, Result};

use crate::models::NdviRecord;

/// Immutable reference dataset consumed by `QueryExtractor`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    records: Vec<NdviRecord>,
}

impl Dataset {
    /// Wraps an in-memory record list, preserving order.
    pub fn from_records(records: Vec<NdviRecord>) -> Self {
        Self { records }
    }

    /// Loads the dataset from a JSON file containing an array of records.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read dataset file: {}", path.display()))?;
        let records: Vec<NdviRecord> = serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse dataset JSON: {}", path.display()))?;
        Ok(Self { records })
    }

    /// Returns the records in their original order.
    pub fn records(&self) -> &[NdviRecord] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Canonical textual representation used as prompt context.
    pub fn to_context_json(&self) -> String {
        serde_json::to_string_pretty(&self.records).unwrap_or_else(|_| "[]".to_string())
    }

    /// Exact-match lookup after normalizing the state key the same way the
    /// store does (strip spaces, lowercase).
    pub fn find(&self, state: &str, month: &str, year: i64) -> Option<&NdviRecord> {
        let state = state.replace(' ', "").to_lowercase();
        self.records
            .iter()
            .find(|r| r.state == state && r.month == month && r.year == year)
    }
}
