//! Form field name paths.
//!
//! A flat form submission addresses nested data through field names such as
//! `email`, `tasks[0]` or `tasks[1].stage[0]`. This crate converts those
//! names into ordered [`Segment`] lists and back, and answers the ancestry
//! questions the rest of the form engine asks about them.
//!
//! # Example
//!
//! ```
//! use conform_path::{format_path, parse_path, Segment};
//!
//! let path = parse_path("tasks[1].title").unwrap();
//! assert_eq!(
//!     path,
//!     vec![Segment::key("tasks"), Segment::index(1), Segment::key("title")]
//! );
//! assert_eq!(format_path(&path), "tasks[1].title");
//!
//! // The looser input grammar always formats back to the canonical form.
//! assert_eq!(format_path(&parse_path("tasks.1.title").unwrap()), "tasks[1].title");
//! ```

use std::fmt::Write;
use thiserror::Error;

pub mod types;
pub use types::{Path, Segment};

pub mod validate;
pub use validate::{is_blocked, is_index_allowed, validate_path, BLOCKED_KEYS, MAX_LIST_INDEX, MAX_PATH_LENGTH};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("invalid field name {input:?}: unexpected {character:?} at offset {offset}")]
    Syntax {
        input: String,
        offset: usize,
        character: char,
    },
    #[error("invalid field name {input:?}: unexpected end of input at offset {offset}")]
    UnexpectedEnd { input: String, offset: usize },
    #[error("field name {0:?} exceeds the maximum path depth")]
    TooLong(String),
    #[error("invalid field name {input:?}: index at offset {offset} exceeds {max}", max = MAX_LIST_INDEX)]
    IndexTooLarge { input: String, offset: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Start,
    Key,
    Bracket,
    Dot,
}

fn syntax(input: &str, offset: usize, character: char) -> PathError {
    PathError::Syntax {
        input: input.to_string(),
        offset,
        character,
    }
}

/// Parse the digits of an index that starts at `offset`.
fn index(input: &str, offset: usize, digits: &str) -> Result<usize, PathError> {
    match digits.parse::<usize>() {
        Ok(idx) if is_index_allowed(idx) => Ok(idx),
        _ => Err(PathError::IndexTooLarge {
            input: input.to_string(),
            offset,
        }),
    }
}

fn unexpected_end(input: &str, offset: usize) -> PathError {
    PathError::UnexpectedEnd {
        input: input.to_string(),
        offset,
    }
}

/// Check if a string consists only of ASCII digits.
pub fn is_integer(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

/// Parse a field name into path segments.
///
/// Accepts `a.b`, `a[0]`, `a.0`, `[0].a` and `a[]`. Blocked keys
/// (`__proto__`, `constructor`, `prototype`) are dropped rather than
/// rejected. Offsets in errors count characters, not bytes.
///
/// # Errors
///
/// - a leading, trailing or doubled `.`
/// - a bracket group holding anything but digits, or left unclosed
/// - a stray `]`
/// - an index above [`MAX_LIST_INDEX`]
///
/// # Example
///
/// ```
/// use conform_path::{parse_path, PathError, Segment};
///
/// assert_eq!(parse_path("").unwrap(), Vec::<Segment>::new());
/// assert_eq!(parse_path("[0]").unwrap(), vec![Segment::index(0)]);
/// assert_eq!(parse_path("tags[]").unwrap(), vec![Segment::key("tags"), Segment::Append]);
/// assert_eq!(parse_path("a.__proto__.b").unwrap(), vec![Segment::key("a"), Segment::key("b")]);
///
/// assert!(matches!(
///     parse_path("a..b"),
///     Err(PathError::Syntax { offset: 2, character: '.', .. })
/// ));
/// ```
pub fn parse_path(name: &str) -> Result<Path, PathError> {
    let chars: Vec<char> = name.chars().collect();
    let mut segments = Vec::new();
    let mut state = State::Start;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        match c {
            '.' => {
                if matches!(state, State::Start | State::Dot) {
                    return Err(syntax(name, i, c));
                }
                state = State::Dot;
                i += 1;
            }
            '[' => {
                if state == State::Dot {
                    return Err(syntax(name, i, c));
                }
                i += 1;
                let start = i;
                loop {
                    match chars.get(i) {
                        None => return Err(unexpected_end(name, chars.len())),
                        Some(']') => break,
                        Some(d) if d.is_ascii_digit() => i += 1,
                        Some(&other) => return Err(syntax(name, i, other)),
                    }
                }
                let digits: String = chars[start..i].iter().collect();
                if digits.is_empty() {
                    segments.push(Segment::Append);
                } else {
                    segments.push(Segment::Index(index(name, start, &digits)?));
                }
                i += 1;
                state = State::Bracket;
            }
            ']' => return Err(syntax(name, i, c)),
            _ => {
                let start = i;
                while i < chars.len() && !matches!(chars[i], '.' | '[' | ']') {
                    i += 1;
                }
                let key: String = chars[start..i].iter().collect();
                if state == State::Dot && is_integer(&key) {
                    segments.push(Segment::Index(index(name, start, &key)?));
                } else {
                    segments.push(Segment::Key(key));
                }
                state = State::Key;
            }
        }
    }

    if state == State::Dot {
        return Err(unexpected_end(name, chars.len()));
    }

    segments.retain(|segment| !is_blocked(segment));
    if !validate_path(&segments) {
        return Err(PathError::TooLong(name.to_string()));
    }
    Ok(segments)
}

/// Format path segments into the canonical field name.
///
/// Indices render as `[n]`, the append marker as `[]`, and keys are joined
/// with `.` unless they open the name.
///
/// A digit-only key anywhere but first has no canonical form: `[a, "5"]`
/// formats as `a.5`, which [`parse_path`] reads back as `a[5]`. Such keys
/// only arise from hand-built paths, never from a parsed name.
///
/// # Example
///
/// ```
/// use conform_path::{format_path, Segment};
///
/// assert_eq!(format_path(&[]), "");
/// assert_eq!(format_path(&[Segment::index(0), Segment::key("a")]), "[0].a");
/// assert_eq!(
///     format_path(&[Segment::key("task"), Segment::index(1), Segment::key("stage"), Segment::Append]),
///     "task[1].stage[]"
/// );
/// ```
pub fn format_path(path: &[Segment]) -> String {
    let mut out = String::new();
    for segment in path {
        push_segment(&mut out, segment);
    }
    out
}

/// Append one segment to an already formatted field name.
///
/// ```
/// use conform_path::{child_name, Segment};
///
/// assert_eq!(child_name("", &Segment::key("a")), "a");
/// assert_eq!(child_name("a", &Segment::index(2)), "a[2]");
/// assert_eq!(child_name("a[2]", &Segment::key("b")), "a[2].b");
/// ```
pub fn child_name(parent: &str, segment: &Segment) -> String {
    let mut out = String::with_capacity(parent.len() + 8);
    out.push_str(parent);
    push_segment(&mut out, segment);
    out
}

fn push_segment(out: &mut String, segment: &Segment) {
    match segment {
        Segment::Key(key) => {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(key);
        }
        Segment::Index(idx) => {
            let _ = write!(out, "[{idx}]");
        }
        Segment::Append => out.push_str("[]"),
    }
}

/// Returns `true` if `ancestor` equals `candidate` or is a strict prefix of it.
///
/// ```
/// use conform_path::{is_prefix_of, parse_path};
///
/// let items = parse_path("items").unwrap();
/// assert!(is_prefix_of(&parse_path("items[0].title").unwrap(), &items));
/// assert!(is_prefix_of(&items, &items));
/// assert!(!is_prefix_of(&parse_path("itemsCount").unwrap(), &items));
/// ```
pub fn is_prefix_of(candidate: &[Segment], ancestor: &[Segment]) -> bool {
    ancestor.len() <= candidate.len() && candidate[..ancestor.len()] == *ancestor
}

/// Returns the part of `full` below `base`, or `None` if `base` is not a
/// prefix of `full`.
///
/// ```
/// use conform_path::{parse_path, relative_path, Segment};
///
/// let full = parse_path("items[2].title").unwrap();
/// let base = parse_path("items").unwrap();
/// assert_eq!(
///     relative_path(&full, &base),
///     Some(vec![Segment::index(2), Segment::key("title")])
/// );
/// assert_eq!(relative_path(&base, &full), None);
/// ```
pub fn relative_path(full: &[Segment], base: &[Segment]) -> Option<Path> {
    if is_prefix_of(full, base) {
        Some(full[base.len()..].to_vec())
    } else {
        None
    }
}

/// String-level form of [`is_prefix_of`] for canonical names.
///
/// The empty name is the root and contains every name. Comparing formatted
/// names avoids re-parsing on hot paths such as subscription matching.
///
/// ```
/// use conform_path::is_name_within;
///
/// assert!(is_name_within("items[0].title", "items"));
/// assert!(is_name_within("items", "items"));
/// assert!(is_name_within("anything", ""));
/// assert!(!is_name_within("itemsCount", "items"));
/// ```
pub fn is_name_within(name: &str, parent: &str) -> bool {
    if parent.is_empty() || name == parent {
        return true;
    }
    match name.strip_prefix(parent) {
        Some(rest) => rest.starts_with('.') || rest.starts_with('['),
        None => false,
    }
}
