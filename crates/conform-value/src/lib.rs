//! Structured form values.
//!
//! A [`FormValue`] is the nested tree a flat form submission decodes into:
//! objects and arrays as inner nodes, strings and files as leaves. Inner
//! nodes are reference counted, so writing through a clone only copies the
//! nodes along the written path and untouched siblings stay shared.
//!
//! # Example
//!
//! ```
//! use conform_path::parse_path;
//! use conform_value::{get_value, set_value, FormValue, SetOptions};
//!
//! let mut root = FormValue::default();
//! let path = parse_path("task[1].stage[0]").unwrap();
//! set_value(&mut root, &path, FormValue::from("y"), SetOptions::default()).unwrap();
//!
//! assert_eq!(get_value(&root, &path).unwrap(), Some(&FormValue::from("y")));
//! assert_eq!(
//!     root.to_json(),
//!     serde_json::json!({"task": [null, {"stage": ["y"]}]})
//! );
//! ```

use std::sync::Arc;

use conform_path::{PathError, Segment};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use thiserror::Error;

pub mod equal;
pub mod flatten;
pub mod get;
pub mod set;

pub use equal::deep_equal;
pub use flatten::{flatten, walk};
pub use get::{get_value, get_value_by_name};
pub use set::{set_value, set_value_cloned, update_value, update_value_cloned, SetOptions};

/// Ordered string-keyed map used for object nodes.
pub type FormObject = IndexMap<String, FormValue>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValueError {
    #[error("segment {segment} at depth {depth} of {path:?} does not match the node it addresses")]
    InvalidPath {
        path: String,
        depth: usize,
        segment: Segment,
    },
    #[error("index {index} of {path:?} exceeds the maximum list index")]
    IndexTooLarge { path: String, index: usize },
    #[error("cannot assign to the root path")]
    RootAssignment,
    #[error(transparent)]
    Path(#[from] PathError),
}

/// A file entry from a multipart submission.
///
/// Only the metadata travels through the value tree; contents stay with
/// whatever transport delivered them.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FileEntry {
    pub name: String,
    #[serde(rename = "type")]
    pub content_type: String,
    pub size: u64,
}

impl FileEntry {
    pub fn new(name: impl Into<String>, content_type: impl Into<String>, size: u64) -> Self {
        Self {
            name: name.into(),
            content_type: content_type.into(),
            size,
        }
    }

    /// An unselected file input submits a nameless, empty file.
    pub fn is_empty(&self) -> bool {
        self.name.is_empty() && self.size == 0
    }
}

/// A node in a structured form value.
///
/// `Null` doubles as the placeholder for array holes, so indices stay
/// stable until a list is explicitly mutated.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(from = "Value", into = "Value")]
pub enum FormValue {
    #[default]
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    File(FileEntry),
    Array(Arc<Vec<FormValue>>),
    Object(Arc<FormObject>),
}

impl FormValue {
    pub fn array(items: Vec<FormValue>) -> Self {
        FormValue::Array(Arc::new(items))
    }

    pub fn object(entries: impl IntoIterator<Item = (String, FormValue)>) -> Self {
        FormValue::Object(Arc::new(entries.into_iter().collect()))
    }

    pub fn empty_object() -> Self {
        FormValue::Object(Arc::new(FormObject::new()))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, FormValue::Null)
    }

    /// Leaves are everything except objects and arrays.
    pub fn is_leaf(&self) -> bool {
        !matches!(self, FormValue::Array(_) | FormValue::Object(_))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            FormValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[FormValue]> {
        match self {
            FormValue::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&FormObject> {
        match self {
            FormValue::Object(map) => Some(map),
            _ => None,
        }
    }

    /// Returns `true` if both values are the same shared node.
    ///
    /// Scalars are never shared, so two scalars are never `ptr_eq`.
    pub fn ptr_eq(&self, other: &FormValue) -> bool {
        match (self, other) {
            (FormValue::Array(a), FormValue::Array(b)) => Arc::ptr_eq(a, b),
            (FormValue::Object(a), FormValue::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    pub fn to_json(&self) -> Value {
        Value::from(self.clone())
    }
}

impl From<&str> for FormValue {
    fn from(s: &str) -> Self {
        FormValue::String(s.to_string())
    }
}

impl From<String> for FormValue {
    fn from(s: String) -> Self {
        FormValue::String(s)
    }
}

impl From<bool> for FormValue {
    fn from(b: bool) -> Self {
        FormValue::Bool(b)
    }
}

impl From<FileEntry> for FormValue {
    fn from(file: FileEntry) -> Self {
        FormValue::File(file)
    }
}

impl From<Vec<FormValue>> for FormValue {
    fn from(items: Vec<FormValue>) -> Self {
        FormValue::array(items)
    }
}

impl From<Value> for FormValue {
    fn from(value: Value) -> Self {
        match value {
            Value::Null => FormValue::Null,
            Value::Bool(b) => FormValue::Bool(b),
            Value::Number(n) => FormValue::Number(n),
            Value::String(s) => FormValue::String(s),
            Value::Array(arr) => FormValue::array(arr.into_iter().map(FormValue::from).collect()),
            Value::Object(map) => {
                FormValue::object(map.into_iter().map(|(k, v)| (k, FormValue::from(v))))
            }
        }
    }
}

impl From<FormValue> for Value {
    fn from(value: FormValue) -> Self {
        match value {
            FormValue::Null => Value::Null,
            FormValue::Bool(b) => Value::Bool(b),
            FormValue::Number(n) => Value::Number(n),
            FormValue::String(s) => Value::String(s),
            FormValue::File(file) => serde_json::json!({
                "name": file.name,
                "type": file.content_type,
                "size": file.size,
            }),
            FormValue::Array(items) => {
                Value::Array(items.iter().cloned().map(Value::from).collect())
            }
            FormValue::Object(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), Value::from(v.clone())))
                    .collect(),
            ),
        }
    }
}
