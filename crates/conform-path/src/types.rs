//! Type definitions for form field paths.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A single step in a field path.
///
/// A field name such as `tasks[1].title` is made of a key (`tasks`), an
/// index (`1`) and another key (`title`). The empty bracket group `[]`
/// addresses "any index" and is used to append to lists.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    /// Object key: `name`, `.name`.
    Key(String),
    /// Array index: `[3]`, `.3`.
    Index(usize),
    /// Empty bracket group: `[]`.
    Append,
}

impl Segment {
    pub fn key(k: impl Into<String>) -> Self {
        Segment::Key(k.into())
    }

    pub fn index(i: usize) -> Self {
        Segment::Index(i)
    }

    /// Returns `true` for segments rendered in bracket form (`[n]`, `[]`).
    pub fn is_bracket(&self) -> bool {
        !matches!(self, Segment::Key(_))
    }

    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(k) => Some(k),
            _ => None,
        }
    }

    pub fn as_index(&self) -> Option<usize> {
        match self {
            Segment::Index(i) => Some(*i),
            _ => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Key(k) => f.write_str(k),
            Segment::Index(i) => write!(f, "[{i}]"),
            Segment::Append => f.write_str("[]"),
        }
    }
}

impl From<&str> for Segment {
    fn from(s: &str) -> Self {
        Segment::Key(s.to_owned())
    }
}

impl From<String> for Segment {
    fn from(s: String) -> Self {
        Segment::Key(s)
    }
}

impl From<usize> for Segment {
    fn from(i: usize) -> Self {
        Segment::Index(i)
    }
}

/// A field path: the ordered segments of a field name.
pub type Path = Vec<Segment>;
