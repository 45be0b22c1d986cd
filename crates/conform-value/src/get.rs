use conform_path::{format_path, parse_path, Segment};

use crate::{FormValue, ValueError};

/// Get the value at `path`.
///
/// Returns `Ok(None)` when a key or index is missing, or when the path runs
/// into a leaf. An index applied to an object, or a key applied to an array,
/// is a naming error and fails with [`ValueError::InvalidPath`]. The root
/// path returns `root` itself.
///
/// # Example
///
/// ```
/// use conform_path::parse_path;
/// use conform_value::{get_value, FormValue};
/// use serde_json::json;
///
/// let doc = FormValue::from(json!({"task": ["x", {"stage": ["y"]}]}));
/// let stage = get_value(&doc, &parse_path("task[1].stage[0]").unwrap()).unwrap();
/// assert_eq!(stage, Some(&FormValue::from("y")));
///
/// assert_eq!(get_value(&doc, &parse_path("missing").unwrap()).unwrap(), None);
/// assert!(get_value(&doc, &parse_path("task.name").unwrap()).is_err());
/// ```
pub fn get_value<'a>(root: &'a FormValue, path: &[Segment]) -> Result<Option<&'a FormValue>, ValueError> {
    let mut current = root;
    for (depth, segment) in path.iter().enumerate() {
        current = match (segment, current) {
            (Segment::Key(key), FormValue::Object(map)) => match map.get(key) {
                Some(v) => v,
                None => return Ok(None),
            },
            (Segment::Index(idx), FormValue::Array(items)) => match items.get(*idx) {
                Some(v) => v,
                None => return Ok(None),
            },
            (Segment::Append, FormValue::Array(_)) => return Ok(None),
            (Segment::Key(_), FormValue::Array(_))
            | (Segment::Index(_) | Segment::Append, FormValue::Object(_)) => {
                return Err(ValueError::InvalidPath {
                    path: format_path(path),
                    depth,
                    segment: segment.clone(),
                });
            }
            _ => return Ok(None),
        };
    }
    Ok(Some(current))
}

/// Parse `name` and get the value it addresses.
pub fn get_value_by_name<'a>(root: &'a FormValue, name: &str) -> Result<Option<&'a FormValue>, ValueError> {
    let path = parse_path(name)?;
    get_value(root, &path)
}
