//! Per-session bookkeeping carried alongside the form value.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::ConformError;

/// Identity keys and validation marks, keyed by field name.
///
/// Round-trips through the reserved state field as
/// `{"key": {...}, "validated": {...}}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmissionState {
    /// Opaque identity token per list item, keyed by the item's current name.
    #[serde(default)]
    pub key: IndexMap<String, String>,
    /// Fields that have gone through at least one validation pass.
    #[serde(default)]
    pub validated: IndexMap<String, bool>,
}

impl SubmissionState {
    pub fn from_json(raw: &str) -> Result<Self, ConformError> {
        serde_json::from_str(raw).map_err(ConformError::InvalidState)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| String::from("{}"))
    }

    pub fn is_validated(&self, name: &str) -> bool {
        self.validated.get(name).copied().unwrap_or(false)
    }

    pub fn mark_validated(&mut self, name: impl Into<String>) {
        self.validated.insert(name.into(), true);
    }
}
