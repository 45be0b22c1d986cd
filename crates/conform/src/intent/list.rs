//! List intents and the engine that applies them.
//!
//! A list intent mutates the array at `name` and, in the same step, replays
//! the mutation on every piece of per-item state (identity keys, validation
//! marks) so that state follows the item rather than the index.

use conform_path::{format_path, parse_path, relative_path, Path, Segment};
use conform_util::KeyGenerator;
use conform_value::{get_value, set_value, FormValue, SetOptions};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::ConformError;
use crate::state::SubmissionState;

/// How far past the submitted items carried state may reach. Entries
/// further out are dropped.
pub const MAX_TRAILING_ITEMS: usize = 16;

/// Operation tags accepted on the wire.
pub const LIST_OPERATIONS: [&str; 6] = ["prepend", "append", "insert", "replace", "remove", "reorder"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListIntent {
    /// Field name of the list.
    pub name: String,
    #[serde(flatten)]
    pub operation: ListOperation,
}

/// A list mutation. Indices are 0-based.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "lowercase")]
pub enum ListOperation {
    Prepend {
        #[serde(rename = "defaultValue", default, skip_serializing_if = "Option::is_none")]
        default_value: Option<FormValue>,
    },
    Append {
        #[serde(rename = "defaultValue", default, skip_serializing_if = "Option::is_none")]
        default_value: Option<FormValue>,
    },
    /// Insert at `index`, or at the end when no index is given.
    Insert {
        #[serde(rename = "defaultValue", default, skip_serializing_if = "Option::is_none")]
        default_value: Option<FormValue>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        index: Option<usize>,
    },
    Replace {
        #[serde(rename = "defaultValue")]
        default_value: FormValue,
        index: usize,
    },
    Remove {
        index: usize,
    },
    /// Move the item at `from` so that it ends up at `to`.
    Reorder {
        from: usize,
        to: usize,
    },
}

impl ListOperation {
    pub fn name(&self) -> &'static str {
        match self {
            ListOperation::Prepend { .. } => "prepend",
            ListOperation::Append { .. } => "append",
            ListOperation::Insert { .. } => "insert",
            ListOperation::Replace { .. } => "replace",
            ListOperation::Remove { .. } => "remove",
            ListOperation::Reorder { .. } => "reorder",
        }
    }

    pub fn default_value(&self) -> Option<&FormValue> {
        match self {
            ListOperation::Prepend { default_value }
            | ListOperation::Append { default_value }
            | ListOperation::Insert { default_value, .. } => default_value.as_ref(),
            ListOperation::Replace { default_value, .. } => Some(default_value),
            ListOperation::Remove { .. } | ListOperation::Reorder { .. } => None,
        }
    }

    /// Index at which the operation places a new item in a list of `len`
    /// items, or `None` for purely positional operations.
    pub fn introduced_index(&self, len: usize) -> Option<usize> {
        match self {
            ListOperation::Prepend { .. } => Some(0),
            ListOperation::Append { .. } => Some(len),
            ListOperation::Insert { index, .. } => Some(index.unwrap_or(len).min(len)),
            ListOperation::Replace { index, .. } => Some((*index).min(len)),
            ListOperation::Remove { .. } | ListOperation::Reorder { .. } => None,
        }
    }

    /// Apply the operation to `list`, building a new item with `make` when
    /// the operation introduces one.
    ///
    /// Out-of-range indices follow splice semantics: insertion points clamp
    /// to the end, removals and moves of missing items do nothing.
    ///
    /// ```
    /// use conform::intent::ListOperation;
    ///
    /// let mut list = vec!["k0", "k1", "k2"];
    /// ListOperation::Reorder { from: 0, to: 2 }.apply(&mut list, || "new");
    /// assert_eq!(list, ["k1", "k2", "k0"]);
    ///
    /// ListOperation::Insert { default_value: None, index: Some(1) }.apply(&mut list, || "new");
    /// assert_eq!(list, ["k1", "new", "k2", "k0"]);
    /// ```
    pub fn apply<T, F>(&self, list: &mut Vec<T>, make: F)
    where
        F: FnOnce() -> T,
    {
        match self {
            ListOperation::Prepend { .. } => list.insert(0, make()),
            ListOperation::Append { .. } => list.push(make()),
            ListOperation::Insert { index, .. } => {
                let at = index.unwrap_or(list.len()).min(list.len());
                list.insert(at, make());
            }
            ListOperation::Replace { index, .. } => {
                if *index < list.len() {
                    list[*index] = make();
                } else {
                    list.push(make());
                }
            }
            ListOperation::Remove { index } => {
                if *index < list.len() {
                    list.remove(*index);
                }
            }
            ListOperation::Reorder { from, to } => {
                if *from < list.len() {
                    let item = list.remove(*from);
                    let at = (*to).min(list.len());
                    list.insert(at, item);
                }
            }
        }
    }
}

/// Summary of an applied list intent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListChange {
    /// Length of the list before the operation, state entries included.
    pub len: usize,
    /// Index of the newly introduced item, if any.
    pub introduced: Option<usize>,
}

/// State of one list item, lifted out of a flat name-keyed map.
///
/// `root` holds the entry for the item itself (`items[2]`), `children`
/// the entries below it (`items[2].title`) relative to the item.
struct ItemState<V> {
    root: Option<V>,
    children: Vec<(Path, V)>,
}

impl<V> Default for ItemState<V> {
    fn default() -> Self {
        Self {
            root: None,
            children: Vec::new(),
        }
    }
}

impl<V> ItemState<V> {
    fn with_root(value: V) -> Self {
        Self {
            root: Some(value),
            children: Vec::new(),
        }
    }
}

/// Move every entry below `base[i]` out of `map` into per-index slots.
/// Entries at `limit` or beyond are discarded.
fn hoist<V>(
    map: &mut IndexMap<String, V>,
    base: &[Segment],
    limit: usize,
) -> Result<Vec<ItemState<V>>, ConformError> {
    let mut items: Vec<ItemState<V>> = Vec::new();
    let mut kept = IndexMap::with_capacity(map.len());
    for (name, value) in map.drain(..) {
        let path = parse_path(&name)?;
        match relative_path(&path, base).as_deref() {
            Some([Segment::Index(idx), ..]) if *idx >= limit => {
                warn!(name = %name, limit, "dropping entry beyond the list");
            }
            Some([Segment::Index(idx), rest @ ..]) => {
                if *idx >= items.len() {
                    items.resize_with(idx + 1, ItemState::default);
                }
                let item = &mut items[*idx];
                if rest.is_empty() {
                    item.root = Some(value);
                } else {
                    item.children.push((rest.to_vec(), value));
                }
            }
            _ => {
                kept.insert(name, value);
            }
        }
    }
    *map = kept;
    Ok(items)
}

/// Flatten per-index slots back into `map` under `base`.
fn restore<V>(map: &mut IndexMap<String, V>, base: &[Segment], items: Vec<ItemState<V>>) {
    for (idx, item) in items.into_iter().enumerate() {
        let mut item_path = base.to_vec();
        item_path.push(Segment::Index(idx));
        if let Some(value) = item.root {
            map.insert(format_path(&item_path), value);
        }
        for (rest, value) in item.children {
            let mut path = item_path.clone();
            path.extend(rest);
            map.insert(format_path(&path), value);
        }
    }
}

fn list_items(payload: &FormValue, path: &[Segment], name: &str) -> Result<Vec<FormValue>, ConformError> {
    match get_value(payload, path)? {
        None | Some(FormValue::Null) => Ok(Vec::new()),
        Some(FormValue::Array(items)) => Ok(items.to_vec()),
        Some(FormValue::Object(_)) => Err(ConformError::NotAList(name.to_string())),
        Some(leaf) => Ok(vec![leaf.clone()]),
    }
}

/// Apply a list intent to the payload and to the submission state.
///
/// Identity keys and validation marks of existing items move with their
/// item. An item introduced by the operation starts unvalidated and gets a
/// fresh key from `keys`. The list field itself is marked validated.
///
/// A list shorter than the state it carries (trailing items whose inputs
/// submitted nothing) is padded with holes first, so every index keeps
/// meaning the same item across value and state. State more than
/// [`MAX_TRAILING_ITEMS`] past the submitted items is dropped.
///
/// # Errors
///
/// - [`ConformError::Path`] if `intent.name` or a state name is malformed
/// - [`ConformError::NotAList`] if `intent.name` addresses an object
/// - [`ConformError::Value`] if `intent.name` is the root or crosses a leaf
pub fn apply_list_intent(
    payload: &mut FormValue,
    state: &mut SubmissionState,
    intent: &ListIntent,
    keys: &mut dyn KeyGenerator,
) -> Result<ListChange, ConformError> {
    let path = parse_path(&intent.name)?;
    let operation = &intent.operation;

    let mut items = list_items(payload, &path, &intent.name)?;
    let limit = items.len() + MAX_TRAILING_ITEMS;
    let mut keyed = hoist(&mut state.key, &path, limit)?;
    let mut validated = hoist(&mut state.validated, &path, limit)?;

    let len = items.len().max(keyed.len()).max(validated.len());
    items.resize(len, FormValue::Null);
    keyed.resize_with(len, ItemState::default);
    validated.resize_with(len, ItemState::default);

    let default_value = operation.default_value().cloned().unwrap_or_default();
    operation.apply(&mut items, || default_value);
    operation.apply(&mut validated, ItemState::default);
    operation.apply(&mut keyed, || ItemState::with_root(keys.next_key()));

    set_value(payload, &path, FormValue::array(items), SetOptions::default())?;
    restore(&mut state.key, &path, keyed);
    restore(&mut state.validated, &path, validated);
    state.mark_validated(intent.name.as_str());

    let change = ListChange {
        len,
        introduced: operation.introduced_index(len),
    };
    debug!(
        name = %intent.name,
        operation = operation.name(),
        len,
        introduced = ?change.introduced,
        "list intent applied"
    );
    Ok(change)
}

/// Replay a list intent on any other name-keyed map, such as an error map.
///
/// Entries follow their item; an introduced item starts with no entries.
/// `len` is the list length reported by [`apply_list_intent`].
pub fn rekey_entries<V>(map: &mut IndexMap<String, V>, intent: &ListIntent, len: usize) -> Result<(), ConformError> {
    let path = parse_path(&intent.name)?;
    let mut items = hoist(map, &path, len + MAX_TRAILING_ITEMS)?;
    let len = len.max(items.len());
    items.resize_with(len, ItemState::default);
    intent.operation.apply(&mut items, ItemState::default);
    restore(map, &path, items);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use conform_util::SequentialKeys;
    use serde_json::json;

    fn apply(op: ListOperation, list: &[i32]) -> Vec<i32> {
        let mut list = list.to_vec();
        op.apply(&mut list, || 9);
        list
    }

    #[test]
    fn test_positional_semantics() {
        assert_eq!(apply(ListOperation::Prepend { default_value: None }, &[1, 2]), [9, 1, 2]);
        assert_eq!(apply(ListOperation::Append { default_value: None }, &[1, 2]), [1, 2, 9]);
        assert_eq!(
            apply(ListOperation::Insert { default_value: None, index: None }, &[1, 2]),
            [1, 2, 9]
        );
        assert_eq!(
            apply(ListOperation::Replace { default_value: FormValue::Null, index: 1 }, &[1, 2]),
            [1, 9]
        );
        assert_eq!(apply(ListOperation::Remove { index: 0 }, &[1, 2, 3]), [2, 3]);
        assert_eq!(apply(ListOperation::Reorder { from: 2, to: 0 }, &[1, 2, 3]), [3, 1, 2]);
    }

    #[test]
    fn test_out_of_range_follows_splice() {
        assert_eq!(
            apply(ListOperation::Insert { default_value: None, index: Some(10) }, &[1]),
            [1, 9]
        );
        assert_eq!(
            apply(ListOperation::Replace { default_value: FormValue::Null, index: 5 }, &[1]),
            [1, 9]
        );
        assert_eq!(apply(ListOperation::Remove { index: 3 }, &[1]), [1]);
        assert_eq!(apply(ListOperation::Reorder { from: 3, to: 0 }, &[1, 2]), [1, 2]);
        assert_eq!(apply(ListOperation::Reorder { from: 0, to: 9 }, &[1, 2]), [2, 1]);
    }

    #[test]
    fn test_introduced_index() {
        assert_eq!(ListOperation::Append { default_value: None }.introduced_index(3), Some(3));
        assert_eq!(
            ListOperation::Insert { default_value: None, index: Some(7) }.introduced_index(3),
            Some(3)
        );
        assert_eq!(ListOperation::Remove { index: 0 }.introduced_index(3), None);
    }

    #[test]
    fn test_scalar_list_is_treated_as_single_item() {
        let mut payload = FormValue::from(json!({"tags": "a"}));
        let mut state = SubmissionState::default();
        let intent = ListIntent {
            name: "tags".into(),
            operation: ListOperation::Append {
                default_value: Some("b".into()),
            },
        };
        apply_list_intent(&mut payload, &mut state, &intent, &mut SequentialKeys::new("k")).unwrap();
        assert_eq!(payload.to_json(), json!({"tags": ["a", "b"]}));
        assert_eq!(state.key.get("tags[1]").map(String::as_str), Some("k0"));
        assert!(state.is_validated("tags"));
    }

    #[test]
    fn test_object_is_not_a_list() {
        let mut payload = FormValue::from(json!({"profile": {"name": "x"}}));
        let intent = ListIntent {
            name: "profile".into(),
            operation: ListOperation::Remove { index: 0 },
        };
        let err = apply_list_intent(
            &mut payload,
            &mut SubmissionState::default(),
            &intent,
            &mut SequentialKeys::new("k"),
        )
        .unwrap_err();
        assert!(matches!(err, ConformError::NotAList(name) if name == "profile"));
    }

    #[test]
    fn test_state_beyond_value_pads_with_holes() {
        let mut payload = FormValue::from(json!({"items": ["a"]}));
        let mut state = SubmissionState::default();
        state.key.insert("items[0]".into(), "k0".into());
        state.key.insert("items[1]".into(), "k1".into());
        let intent = ListIntent {
            name: "items".into(),
            operation: ListOperation::Append { default_value: None },
        };
        let change =
            apply_list_intent(&mut payload, &mut state, &intent, &mut SequentialKeys::new("n")).unwrap();
        assert_eq!(change, ListChange { len: 2, introduced: Some(2) });
        assert_eq!(payload.to_json(), json!({"items": ["a", null, null]}));
        assert_eq!(state.key.get("items[2]").map(String::as_str), Some("n0"));
    }

    #[test]
    fn test_rekey_entries_moves_errors_with_items() {
        let mut errors: IndexMap<String, Vec<String>> = IndexMap::new();
        errors.insert("items[1].title".into(), vec!["required".into()]);
        errors.insert("email".into(), vec!["invalid".into()]);
        let intent = ListIntent {
            name: "items".into(),
            operation: ListOperation::Remove { index: 0 },
        };
        rekey_entries(&mut errors, &intent, 2).unwrap();
        assert_eq!(errors.get("items[0].title"), Some(&vec!["required".to_string()]));
        assert!(!errors.contains_key("items[1].title"));
        assert!(errors.contains_key("email"));
    }
}
