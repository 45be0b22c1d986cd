use std::sync::Arc;

use conform_path::{format_path, is_index_allowed, Segment};

use crate::{FormObject, FormValue, ValueError};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SetOptions {
    /// Turn an assignment to the root path into a no-op instead of an error.
    pub silent: bool,
}

impl SetOptions {
    pub fn silent() -> Self {
        Self { silent: true }
    }
}

/// Set the value at `path`, creating missing intermediate nodes.
///
/// A missing node becomes an array when the segment addressing into it is an
/// index (or `[]`), and an object otherwise. Arrays grow with `Null` holes to
/// reach the requested index; `[]` appends.
///
/// Nodes are written through [`Arc::make_mut`]: nodes owned only by `root`
/// are mutated in place, nodes shared with another handle are copied first.
///
/// # Errors
///
/// - [`ValueError::RootAssignment`] for an empty path, unless `options.silent`
/// - [`ValueError::InvalidPath`] when a segment kind does not match an
///   existing node, including descending into a leaf
/// - [`ValueError::IndexTooLarge`] for an index above
///   [`MAX_LIST_INDEX`](conform_path::MAX_LIST_INDEX)
pub fn set_value(
    root: &mut FormValue,
    path: &[Segment],
    value: FormValue,
    options: SetOptions,
) -> Result<(), ValueError> {
    update_value(root, path, |_| value, options)
}

/// Read-modify-write the value at `path`.
///
/// `updater` receives the previous value, or `None` if there was none.
///
/// ```
/// use conform_path::parse_path;
/// use conform_value::{update_value, FormValue, SetOptions};
///
/// let mut root = FormValue::default();
/// let path = parse_path("file").unwrap();
/// for name in ["a", "b"] {
///     update_value(&mut root, &path, |prev| match prev {
///         None => FormValue::from(name),
///         Some(FormValue::Array(items)) => {
///             let mut items = (*items).clone();
///             items.push(FormValue::from(name));
///             FormValue::array(items)
///         }
///         Some(other) => FormValue::array(vec![other, FormValue::from(name)]),
///     }, SetOptions::default()).unwrap();
/// }
/// assert_eq!(root.to_json(), serde_json::json!({"file": ["a", "b"]}));
/// ```
pub fn update_value<F>(
    root: &mut FormValue,
    path: &[Segment],
    updater: F,
    options: SetOptions,
) -> Result<(), ValueError>
where
    F: FnOnce(Option<FormValue>) -> FormValue,
{
    if path.is_empty() {
        return if options.silent {
            Ok(())
        } else {
            Err(ValueError::RootAssignment)
        };
    }
    let (slot, existed) = slot_mut(root, path)?;
    let previous = std::mem::take(slot);
    *slot = updater(existed.then_some(previous));
    Ok(())
}

/// Copy-on-write form of [`set_value`]: `root` is left untouched and only
/// the nodes along `path` are new in the returned value.
///
/// ```
/// use conform_path::parse_path;
/// use conform_value::{get_value, set_value_cloned, FormValue, SetOptions};
/// use serde_json::json;
///
/// let root = FormValue::from(json!({"a": {"x": "1"}, "b": {"y": "2"}}));
/// let next = set_value_cloned(&root, &parse_path("a.x").unwrap(), "3".into(), SetOptions::default()).unwrap();
///
/// let b = parse_path("b").unwrap();
/// assert!(get_value(&next, &b).unwrap().unwrap().ptr_eq(get_value(&root, &b).unwrap().unwrap()));
/// assert_eq!(root.to_json(), json!({"a": {"x": "1"}, "b": {"y": "2"}}));
/// ```
pub fn set_value_cloned(
    root: &FormValue,
    path: &[Segment],
    value: FormValue,
    options: SetOptions,
) -> Result<FormValue, ValueError> {
    update_value_cloned(root, path, |_| value, options)
}

/// Copy-on-write form of [`update_value`].
pub fn update_value_cloned<F>(
    root: &FormValue,
    path: &[Segment],
    updater: F,
    options: SetOptions,
) -> Result<FormValue, ValueError>
where
    F: FnOnce(Option<FormValue>) -> FormValue,
{
    let mut next = root.clone();
    update_value(&mut next, path, updater, options)?;
    Ok(next)
}

fn invalid(path: &[Segment], depth: usize) -> ValueError {
    ValueError::InvalidPath {
        path: format_path(path),
        depth,
        segment: path[depth].clone(),
    }
}

/// Walk to the slot addressed by a non-empty `path`, synthesizing
/// containers on the way. The flag reports whether the slot existed.
fn slot_mut<'a>(root: &'a mut FormValue, path: &[Segment]) -> Result<(&'a mut FormValue, bool), ValueError> {
    let mut current = root;
    let mut existed = true;
    for (depth, segment) in path.iter().enumerate() {
        if current.is_null() {
            *current = match segment {
                Segment::Key(_) => FormValue::Object(Arc::new(FormObject::new())),
                Segment::Index(_) | Segment::Append => FormValue::Array(Arc::new(Vec::new())),
            };
        }
        current = match (segment, current) {
            (Segment::Key(key), FormValue::Object(map)) => {
                let map = Arc::make_mut(map);
                existed = map.contains_key(key.as_str());
                map.entry(key.clone()).or_insert(FormValue::Null)
            }
            (Segment::Index(idx), FormValue::Array(items)) => {
                let len = idx.checked_add(1).filter(|_| is_index_allowed(*idx)).ok_or_else(|| {
                    ValueError::IndexTooLarge {
                        path: format_path(path),
                        index: *idx,
                    }
                })?;
                let items = Arc::make_mut(items);
                existed = *idx < items.len();
                if !existed {
                    items.resize(len, FormValue::Null);
                }
                &mut items[*idx]
            }
            (Segment::Append, FormValue::Array(items)) => {
                let items = Arc::make_mut(items);
                existed = false;
                let idx = items.len();
                items.push(FormValue::Null);
                &mut items[idx]
            }
            _ => return Err(invalid(path, depth)),
        };
    }
    Ok((current, existed))
}
