//! Intents: structural operations carried inside an ordinary submission.
//!
//! An intent travels as one string under the reserved intent field:
//! `${type}/${payload}`. The `validate` payload is the bare field name; the
//! `list` payload is a JSON object.
//!
//! ```
//! use conform::intent::{self, Intent};
//!
//! let raw = intent::remove("tasks", 1).serialize();
//! assert_eq!(raw, r#"list/{"name":"tasks","operation":"remove","index":1}"#);
//! assert_eq!(Intent::parse(&raw).unwrap(), intent::remove("tasks", 1));
//! ```

use std::fmt;

use conform_path::is_name_within;
use conform_util::KeyGenerator;
use conform_value::FormValue;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::ConformError;
use crate::state::SubmissionState;

pub mod list;

pub use list::{
    apply_list_intent, rekey_entries, ListChange, ListIntent, ListOperation, LIST_OPERATIONS, MAX_TRAILING_ITEMS,
};

/// Type prefix of the validate intent.
pub const VALIDATE: &str = "validate";

/// Type prefix of list intents.
pub const LIST: &str = "list";

#[derive(Debug, Clone, PartialEq)]
pub enum Intent {
    /// Validate one field (or, with an empty name, the whole form).
    Validate(String),
    List(ListIntent),
}

/// Registered intent kinds, in the order the dispatcher tries them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentKind {
    Validate,
    List,
}

impl IntentKind {
    pub const REGISTRY: [IntentKind; 2] = [IntentKind::Validate, IntentKind::List];

    pub fn type_name(self) -> &'static str {
        match self {
            IntentKind::Validate => VALIDATE,
            IntentKind::List => LIST,
        }
    }

    /// Decode `raw` as this kind.
    ///
    /// Returns `Ok(None)` when the type prefix belongs to another kind or the
    /// payload is malformed, so the caller can try the next kind.
    ///
    /// # Errors
    ///
    /// [`ConformError::UnknownListOperation`] for a well-formed list payload
    /// naming an operation this engine does not know.
    pub fn decode(self, raw: &str) -> Result<Option<Intent>, ConformError> {
        let Some((type_name, payload)) = raw.split_once('/') else {
            return Ok(None);
        };
        if type_name != self.type_name() {
            return Ok(None);
        }
        match self {
            IntentKind::Validate => Ok(Some(Intent::Validate(payload.to_string()))),
            IntentKind::List => {
                let Ok(value) = serde_json::from_str::<Value>(payload) else {
                    return Ok(None);
                };
                let Some(operation) = value.get("operation").and_then(Value::as_str) else {
                    return Ok(None);
                };
                if !LIST_OPERATIONS.contains(&operation) {
                    return Err(ConformError::UnknownListOperation(operation.to_string()));
                }
                Ok(serde_json::from_value::<ListIntent>(value).ok().map(Intent::List))
            }
        }
    }
}

impl Intent {
    pub fn kind(&self) -> IntentKind {
        match self {
            Intent::Validate(_) => IntentKind::Validate,
            Intent::List(_) => IntentKind::List,
        }
    }

    /// The wire string for the reserved intent field.
    pub fn serialize(&self) -> String {
        self.to_string()
    }

    /// Decode a wire string by probing every registered kind in order.
    ///
    /// # Errors
    ///
    /// - [`ConformError::UnknownIntent`] if no kind accepts `raw`
    /// - [`ConformError::UnknownListOperation`], see [`IntentKind::decode`]
    pub fn parse(raw: &str) -> Result<Intent, ConformError> {
        for kind in IntentKind::REGISTRY {
            if let Some(intent) = kind.decode(raw)? {
                return Ok(intent);
            }
        }
        warn!(intent = raw, "no registered intent accepts the submitted value");
        Err(ConformError::UnknownIntent(raw.to_string()))
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intent::Validate(name) => write!(f, "{VALIDATE}/{name}"),
            Intent::List(list) => {
                let payload = serde_json::to_string(list).map_err(|_| fmt::Error)?;
                write!(f, "{LIST}/{payload}")
            }
        }
    }
}

// ── Builders ──────────────────────────────────────────────────────────────

pub fn validate(name: impl Into<String>) -> Intent {
    Intent::Validate(name.into())
}

fn list(name: impl Into<String>, operation: ListOperation) -> Intent {
    Intent::List(ListIntent {
        name: name.into(),
        operation,
    })
}

pub fn prepend(name: impl Into<String>, default_value: Option<FormValue>) -> Intent {
    list(name, ListOperation::Prepend { default_value })
}

pub fn append(name: impl Into<String>, default_value: Option<FormValue>) -> Intent {
    list(name, ListOperation::Append { default_value })
}

pub fn insert(name: impl Into<String>, default_value: Option<FormValue>, index: Option<usize>) -> Intent {
    list(name, ListOperation::Insert { default_value, index })
}

pub fn replace(name: impl Into<String>, default_value: FormValue, index: usize) -> Intent {
    list(name, ListOperation::Replace { default_value, index })
}

pub fn remove(name: impl Into<String>, index: usize) -> Intent {
    list(name, ListOperation::Remove { index })
}

pub fn reorder(name: impl Into<String>, from: usize, to: usize) -> Intent {
    list(name, ListOperation::Reorder { from, to })
}

// ── Dispatch ──────────────────────────────────────────────────────────────

/// What a submission asks the engine to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    /// Ordinary submit, no intent.
    Submit,
    Intent(Intent),
}

/// Pick the handler for a submission's raw intent.
///
/// # Errors
///
/// [`ConformError::UnknownIntent`] when an intent is present but no
/// registered kind accepts it. That is a client/server mismatch, not a user
/// error.
pub fn get_intent_handler(intent: Option<&str>) -> Result<Dispatch, ConformError> {
    match intent {
        None => Ok(Dispatch::Submit),
        Some(raw) => {
            let intent = Intent::parse(raw)?;
            debug!(kind = intent.kind().type_name(), "intent decoded");
            Ok(Dispatch::Intent(intent))
        }
    }
}

impl Dispatch {
    pub fn intent(&self) -> Option<&Intent> {
        match self {
            Dispatch::Submit => None,
            Dispatch::Intent(intent) => Some(intent),
        }
    }

    /// Apply the structural part of the intent, before validation runs.
    ///
    /// Only list intents change the payload; they also re-key `state` and
    /// mark the list itself validated.
    pub fn apply_structure(
        &self,
        payload: &mut FormValue,
        state: &mut SubmissionState,
        keys: &mut dyn KeyGenerator,
    ) -> Result<Option<ListChange>, ConformError> {
        match self {
            Dispatch::Intent(Intent::List(list)) => {
                apply_list_intent(payload, state, list, keys).map(Some)
            }
            _ => Ok(None),
        }
    }

    /// Record which fields have now been validated.
    ///
    /// - submit: every submitted field plus every field reporting an error
    /// - validate: the named field and the submitted fields below it
    /// - list: nothing further, see [`Dispatch::apply_structure`]
    pub fn update_validated<'a>(
        &self,
        state: &mut SubmissionState,
        fields: &[String],
        error_names: impl IntoIterator<Item = &'a str>,
    ) {
        match self {
            Dispatch::Submit => {
                for name in fields {
                    state.mark_validated(name.as_str());
                }
                for name in error_names {
                    state.mark_validated(name);
                }
            }
            Dispatch::Intent(Intent::Validate(name)) => {
                state.mark_validated(name.as_str());
                for field in fields.iter().filter(|f| is_name_within(f, name)) {
                    state.mark_validated(field.as_str());
                }
            }
            Dispatch::Intent(Intent::List(_)) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_roundtrip() {
        let raw = validate("tasks[0].title").serialize();
        assert_eq!(raw, "validate/tasks[0].title");
        assert_eq!(Intent::parse(&raw).unwrap(), validate("tasks[0].title"));
    }

    #[test]
    fn test_validate_name_may_contain_slash() {
        assert_eq!(
            Intent::parse("validate/a/b").unwrap(),
            validate("a/b")
        );
    }

    #[test]
    fn test_decode_other_prefix_is_none() {
        let raw = validate("a").serialize();
        assert_eq!(IntentKind::List.decode(&raw).unwrap(), None);
        let raw = remove("a", 0).serialize();
        assert_eq!(IntentKind::Validate.decode(&raw).unwrap(), None);
    }

    #[test]
    fn test_malformed_list_payload_is_none() {
        assert_eq!(IntentKind::List.decode("list/{oops").unwrap(), None);
        assert_eq!(IntentKind::List.decode(r#"list/{"name":"a"}"#).unwrap(), None);
        assert_eq!(
            IntentKind::List.decode(r#"list/{"name":"a","operation":"replace","index":0}"#).unwrap(),
            None
        );
    }

    #[test]
    fn test_unknown_list_operation_is_fatal() {
        let err = Intent::parse(r#"list/{"name":"a","operation":"shuffle"}"#).unwrap_err();
        assert!(matches!(err, ConformError::UnknownListOperation(op) if op == "shuffle"));
    }

    #[test]
    fn test_unknown_intent_is_fatal() {
        assert!(matches!(
            get_intent_handler(Some("reset/")),
            Err(ConformError::UnknownIntent(_))
        ));
        assert!(matches!(
            get_intent_handler(Some("no-separator")),
            Err(ConformError::UnknownIntent(_))
        ));
    }

    #[test]
    fn test_no_intent_is_submit() {
        assert_eq!(get_intent_handler(None).unwrap(), Dispatch::Submit);
    }

    #[test]
    fn test_list_intent_wire_shape() {
        let raw = insert("tasks", Some(FormValue::from(json!({"title": ""}))), Some(0)).serialize();
        let (prefix, payload) = raw.split_once('/').unwrap();
        assert_eq!(prefix, "list");
        assert_eq!(
            serde_json::from_str::<Value>(payload).unwrap(),
            json!({"name": "tasks", "operation": "insert", "defaultValue": {"title": ""}, "index": 0})
        );
    }

    #[test]
    fn test_submit_marks_fields_and_error_names() {
        let mut state = SubmissionState::default();
        Dispatch::Submit.update_validated(
            &mut state,
            &["a".to_string(), "b".to_string()],
            ["c"],
        );
        assert!(state.is_validated("a") && state.is_validated("b") && state.is_validated("c"));
    }

    #[test]
    fn test_validate_marks_field_and_descendants() {
        let mut state = SubmissionState::default();
        let fields = ["tasks[0].title".to_string(), "email".to_string()];
        Dispatch::Intent(validate("tasks")).update_validated(&mut state, &fields, []);
        assert!(state.is_validated("tasks"));
        assert!(state.is_validated("tasks[0].title"));
        assert!(!state.is_validated("email"));
    }
}
