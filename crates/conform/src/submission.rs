//! Flat payload to structured submission.

use conform_path::parse_path;
use conform_value::{set_value, FormValue, SetOptions};
use tracing::trace;

use crate::config::{FormConfig, DEFAULT_INTENT_NAME, DEFAULT_STATE_NAME};
use crate::error::ConformError;
use crate::form_data::{FormData, FormDataEntry};
use crate::state::SubmissionState;

/// One parsed submission. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct Submission {
    /// Structured value assembled from every non-reserved field.
    pub payload: FormValue,
    /// Field names in the order they first appear, reserved names excluded.
    pub fields: Vec<String>,
    /// Raw intent string from the reserved intent field.
    pub intent: Option<String>,
    /// State decoded from the reserved state field.
    pub state: SubmissionState,
}

#[derive(Default)]
pub struct ParseOptions<'a> {
    pub intent_name: Option<&'a str>,
    pub state_name: Option<&'a str>,
    /// Return `true` to leave a field out of the payload and `fields`.
    pub skip_entry: Option<&'a dyn Fn(&str) -> bool>,
}

impl<'a> ParseOptions<'a> {
    pub fn from_config(config: &'a FormConfig) -> Self {
        Self {
            intent_name: Some(&config.intent_name),
            state_name: Some(&config.state_name),
            skip_entry: None,
        }
    }
}

/// Convert a flat payload into a [`Submission`].
///
/// Names are visited once each, in order of first appearance. A name
/// submitted several times (checkbox groups, multi-selects, repeated
/// inputs) becomes an array of its values; a name submitted once becomes a
/// scalar. The intent is taken only from a text entry, a file in the intent
/// slot counts as no intent.
///
/// # Errors
///
/// - [`ConformError::Path`] / [`ConformError::Value`] for field names that
///   do not parse or that conflict with each other
/// - [`ConformError::InvalidState`] if the state field is not valid JSON
///
/// # Example
///
/// ```
/// use conform::{parse_submission, FormData, ParseOptions};
/// use serde_json::json;
///
/// let data = FormData::from_urlencoded("email=a%40b.com&tags=x&tags=y&__intent__=validate%2Femail");
/// let submission = parse_submission(&data, &ParseOptions::default()).unwrap();
///
/// assert_eq!(submission.payload.to_json(), json!({"email": "a@b.com", "tags": ["x", "y"]}));
/// assert_eq!(submission.fields, ["email", "tags"]);
/// assert_eq!(submission.intent.as_deref(), Some("validate/email"));
/// ```
pub fn parse_submission(form_data: &FormData, options: &ParseOptions<'_>) -> Result<Submission, ConformError> {
    let intent_name = options.intent_name.unwrap_or(DEFAULT_INTENT_NAME);
    let state_name = options.state_name.unwrap_or(DEFAULT_STATE_NAME);

    let mut payload = FormValue::empty_object();
    let mut fields = Vec::new();

    for (name, entries) in form_data.grouped() {
        if name == intent_name || name == state_name {
            continue;
        }
        if options.skip_entry.is_some_and(|skip| skip(name)) {
            trace!(name, "skipping entry");
            continue;
        }
        let path = parse_path(name)?;
        if path.is_empty() {
            continue;
        }
        let mut values: Vec<FormValue> = entries.into_iter().cloned().map(FormValue::from).collect();
        let value = if values.len() > 1 {
            FormValue::array(values)
        } else {
            values.pop().unwrap_or_default()
        };
        set_value(&mut payload, &path, value, SetOptions::default())?;
        fields.push(name.to_string());
    }

    let intent = match form_data.get(intent_name) {
        Some(FormDataEntry::Text(raw)) => Some(raw.clone()),
        _ => None,
    };

    let state = match form_data.get(state_name) {
        Some(FormDataEntry::Text(raw)) => SubmissionState::from_json(raw)?,
        _ => SubmissionState::default(),
    };

    Ok(Submission {
        payload,
        fields,
        intent,
        state,
    })
}
