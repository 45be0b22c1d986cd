//! Turning a processed submission into the result sent back to the form.

use conform_value::FormValue;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::intent::Intent;
use crate::simplify::{collapse_leaf_arrays, simplify, simplify_errors};
use crate::state::SubmissionState;

/// Messages per field name. Form-level messages live under `""`.
pub type ErrorMap = IndexMap<String, Vec<String>>;

/// Validation failures, as reported by a validator. Never an `Err`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormError {
    #[serde(default)]
    pub form_errors: Vec<String>,
    #[serde(default)]
    pub field_errors: ErrorMap,
}

impl FormError {
    pub fn is_empty(&self) -> bool {
        self.form_errors.is_empty() && self.field_errors.values().all(Vec::is_empty)
    }

    /// Names that carry at least one message, `""` for form-level messages.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        let form = (!self.form_errors.is_empty()).then_some("");
        form.into_iter().chain(
            self.field_errors
                .iter()
                .filter(|(_, messages)| !messages.is_empty())
                .map(|(name, _)| name.as_str()),
        )
    }

    /// Fold into a single map keyed by field name.
    pub fn to_error_map(&self) -> ErrorMap {
        let mut map = ErrorMap::with_capacity(self.field_errors.len() + 1);
        if !self.form_errors.is_empty() {
            map.insert(String::new(), self.form_errors.clone());
        }
        for (name, messages) in &self.field_errors {
            map.insert(name.clone(), messages.clone());
        }
        map
    }

    pub fn from_error_map(map: &ErrorMap) -> Self {
        let mut error = FormError::default();
        for (name, messages) in map {
            if name.is_empty() {
                error.form_errors = messages.clone();
            } else {
                error.field_errors.insert(name.clone(), messages.clone());
            }
        }
        error
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SubmissionStatus {
    Success,
    Error,
    Updated,
}

/// What the server hands back to the form after a submission.
///
/// A `Success` without `initial_value` asks the form to reset to its
/// defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionResult {
    pub status: SubmissionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_value: Option<FormValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<FormError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<SubmissionState>,
}

impl SubmissionResult {
    pub fn is_reset(&self) -> bool {
        self.status == SubmissionStatus::Success && self.initial_value.is_none() && self.state.is_none()
    }
}

/// Everything the reducer needs to know about a processed submission.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SubmissionContext {
    pub intent: Option<Intent>,
    /// Payload after any structural intent was applied.
    pub initial_value: FormValue,
    pub error: ErrorMap,
    pub state: SubmissionState,
    pub collapse_leaf_arrays: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AcceptOptions {
    pub reset_form: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RejectOptions {
    /// Replaces the form-level messages when given.
    pub form_errors: Option<Vec<String>>,
    /// Merged over the validator's field messages.
    pub field_errors: Option<ErrorMap>,
}

impl SubmissionContext {
    fn wire_value(&self) -> Option<FormValue> {
        let value = simplify(&self.initial_value)?;
        if self.collapse_leaf_arrays {
            Some(collapse_leaf_arrays(&value))
        } else {
            Some(value)
        }
    }
}

/// Report a successful submission.
///
/// With `reset_form` the result carries nothing but the status, which tells
/// the form to go back to its defaults.
pub fn accept_submission(context: &SubmissionContext, options: AcceptOptions) -> SubmissionResult {
    if options.reset_form {
        return SubmissionResult {
            status: SubmissionStatus::Success,
            initial_value: None,
            error: None,
            state: None,
        };
    }
    SubmissionResult {
        status: SubmissionStatus::Success,
        initial_value: context.wire_value(),
        error: simplify_errors(&context.error).map(|map| FormError::from_error_map(&map)),
        state: Some(context.state.clone()),
    }
}

/// Report a submission that did not go through.
///
/// Caller supplied messages are merged over the validator's. When the
/// submission carried an intent, only fields already marked validated keep
/// their messages, so a structural edit does not flag fields the user has
/// not reached yet.
///
/// ```
/// use conform::{intent, reject_submission, RejectOptions, SubmissionContext, SubmissionStatus};
///
/// let mut context = SubmissionContext {
///     intent: Some(intent::validate("a")),
///     ..SubmissionContext::default()
/// };
/// context.error.insert("a".into(), vec!["bad".into()]);
/// context.error.insert("b".into(), vec!["bad".into()]);
/// context.state.mark_validated("a");
///
/// let result = reject_submission(&context, RejectOptions::default());
/// assert_eq!(result.status, SubmissionStatus::Updated);
/// let error = result.error.unwrap();
/// assert_eq!(error.field_errors.keys().collect::<Vec<_>>(), ["a"]);
/// ```
pub fn reject_submission(context: &SubmissionContext, options: RejectOptions) -> SubmissionResult {
    let mut error = context.error.clone();
    if let Some(form_errors) = options.form_errors {
        error.insert(String::new(), form_errors);
    }
    if let Some(field_errors) = options.field_errors {
        error.extend(field_errors);
    }
    if context.intent.is_some() {
        error.retain(|name, _| context.state.is_validated(name));
    }

    let status = if context.intent.is_some() {
        SubmissionStatus::Updated
    } else {
        SubmissionStatus::Error
    };
    SubmissionResult {
        status,
        initial_value: context.wire_value(),
        error: simplify_errors(&error).map(|map| FormError::from_error_map(&map)),
        state: Some(context.state.clone()),
    }
}
