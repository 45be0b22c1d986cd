//! Immutable snapshots of a form.

use std::cell::OnceCell;
use std::sync::Arc;

use conform_path::is_name_within;
use conform_util::Memo;
use conform_value::{deep_equal, flatten, FormValue};
use indexmap::IndexMap;

use crate::reducer::{ErrorMap, SubmissionStatus};
use crate::simplify::simplify;
use crate::state::SubmissionState;

/// The raw data of a snapshot.
///
/// Maps are behind `Arc` so a transition that leaves one untouched hands the
/// same allocation to the next snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContextData {
    pub default_value: FormValue,
    pub initial_value: FormValue,
    pub value: FormValue,
    pub error: Arc<ErrorMap>,
    pub state: Arc<SubmissionState>,
    pub status: Option<SubmissionStatus>,
}

/// One state of a form, with lazily derived per-name views.
///
/// Flattened views are built on first use; `valid` and `dirty` are cached
/// per name for the lifetime of the snapshot.
#[derive(Debug)]
pub struct FormContext {
    data: ContextData,
    flat_value: OnceCell<IndexMap<String, FormValue>>,
    flat_default: OnceCell<IndexMap<String, FormValue>>,
    valid: Memo<String, bool>,
    dirty: Memo<String, bool>,
}

impl FormContext {
    pub fn new(data: ContextData) -> Self {
        Self {
            data,
            flat_value: OnceCell::new(),
            flat_default: OnceCell::new(),
            valid: Memo::new(),
            dirty: Memo::new(),
        }
    }

    pub fn data(&self) -> &ContextData {
        &self.data
    }

    pub fn default_value(&self) -> &FormValue {
        &self.data.default_value
    }

    pub fn initial_value(&self) -> &FormValue {
        &self.data.initial_value
    }

    pub fn value(&self) -> &FormValue {
        &self.data.value
    }

    pub fn errors(&self) -> &ErrorMap {
        &self.data.error
    }

    pub fn state(&self) -> &SubmissionState {
        &self.data.state
    }

    pub fn status(&self) -> Option<SubmissionStatus> {
        self.data.status
    }

    /// Messages for exactly `name`.
    pub fn error(&self, name: &str) -> Option<&[String]> {
        self.data
            .error
            .get(name)
            .map(Vec::as_slice)
            .filter(|messages| !messages.is_empty())
    }

    pub fn key(&self, name: &str) -> Option<&str> {
        self.data.state.key.get(name).map(String::as_str)
    }

    pub fn is_validated(&self, name: &str) -> bool {
        self.data.state.is_validated(name)
    }

    pub(crate) fn flat_value(&self) -> &IndexMap<String, FormValue> {
        self.flat_value.get_or_init(|| flatten(&self.data.value))
    }

    pub(crate) fn flat_default(&self) -> &IndexMap<String, FormValue> {
        self.flat_default.get_or_init(|| flatten(&self.data.default_value))
    }

    /// Current value at `name`; `""` is the whole value.
    pub fn value_at(&self, name: &str) -> Option<&FormValue> {
        if name.is_empty() {
            return Some(&self.data.value);
        }
        self.flat_value().get(name)
    }

    pub fn default_value_at(&self, name: &str) -> Option<&FormValue> {
        if name.is_empty() {
            return Some(&self.data.default_value);
        }
        self.flat_default().get(name)
    }

    /// `true` if neither `name` nor anything below it has messages.
    pub fn valid(&self, name: &str) -> bool {
        self.valid.get_or_insert_with(name.to_string(), || {
            !self
                .data
                .error
                .iter()
                .any(|(field, messages)| !messages.is_empty() && is_name_within(field, name))
        })
    }

    /// `true` if the value at `name` differs from its default, ignoring
    /// differences [`simplify`] considers empty.
    pub fn dirty(&self, name: &str) -> bool {
        self.dirty.get_or_insert_with(name.to_string(), || {
            let current = self.value_at(name).and_then(simplify);
            let default = self.default_value_at(name).and_then(simplify);
            match (current, default) {
                (Some(a), Some(b)) => !deep_equal(&a, &b),
                (None, None) => false,
                _ => true,
            }
        })
    }
}
