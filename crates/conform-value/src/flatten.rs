use conform_path::{child_name, Segment};
use indexmap::IndexMap;

use crate::FormValue;

/// Visit every node below `value` together with its canonical field name.
///
/// Parents are visited before their children. The root itself is not
/// visited.
pub fn walk<F>(value: &FormValue, prefix: &str, visit: &mut F)
where
    F: FnMut(&str, &FormValue),
{
    match value {
        FormValue::Object(map) => {
            for (key, child) in map.iter() {
                let name = child_name(prefix, &Segment::Key(key.clone()));
                visit(&name, child);
                walk(child, &name, visit);
            }
        }
        FormValue::Array(items) => {
            for (idx, child) in items.iter().enumerate() {
                let name = child_name(prefix, &Segment::Index(idx));
                visit(&name, child);
                walk(child, &name, visit);
            }
        }
        _ => {}
    }
}

/// Flatten a value into a map from field name to node.
///
/// Inner nodes are included alongside leaves, so `items` and `items[0].title`
/// both appear for `{"items": [{"title": "a"}]}`. Nodes are cheap clones that
/// share structure with `value`.
///
/// ```
/// use conform_value::{flatten, FormValue};
/// use serde_json::json;
///
/// let flat = flatten(&FormValue::from(json!({"items": [{"title": "a"}]})));
/// let names: Vec<&str> = flat.keys().map(String::as_str).collect();
/// assert_eq!(names, ["items", "items[0]", "items[0].title"]);
/// ```
pub fn flatten(value: &FormValue) -> IndexMap<String, FormValue> {
    let mut out = IndexMap::new();
    walk(value, "", &mut |name, node| {
        out.insert(name.to_string(), node.clone());
    });
    out
}
