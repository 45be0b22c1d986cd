//! Trimming trees for the wire.

use conform_value::FormValue;

use crate::reducer::ErrorMap;

/// Strip a value down to what carries information.
///
/// Empty strings, `Null` and unselected files count as absent. An object
/// loses its absent children and is itself absent once nothing is left.
/// An array is absent when every item is; otherwise absent items stay as
/// `Null` holes so indices keep addressing the same items.
///
/// ```
/// use conform::simplify;
/// use conform_value::FormValue;
/// use serde_json::json;
///
/// let value = FormValue::from(json!({"a": "", "b": {"c": null}, "d": ["", "x"]}));
/// assert_eq!(simplify(&value).unwrap().to_json(), json!({"d": [null, "x"]}));
/// assert_eq!(simplify(&FormValue::from(json!({"a": [""]}))), None);
/// ```
pub fn simplify(value: &FormValue) -> Option<FormValue> {
    match value {
        FormValue::Null => None,
        FormValue::String(s) if s.is_empty() => None,
        FormValue::File(file) if file.is_empty() => None,
        FormValue::Object(map) => {
            let kept: Vec<(String, FormValue)> = map
                .iter()
                .filter_map(|(k, v)| simplify(v).map(|v| (k.clone(), v)))
                .collect();
            if kept.is_empty() {
                None
            } else {
                Some(FormValue::object(kept))
            }
        }
        FormValue::Array(items) => {
            let items: Vec<Option<FormValue>> = items.iter().map(simplify).collect();
            if items.iter().all(Option::is_none) {
                None
            } else {
                Some(FormValue::array(
                    items.into_iter().map(Option::unwrap_or_default).collect(),
                ))
            }
        }
        leaf => Some(leaf.clone()),
    }
}

/// Collapse every single-item array whose item is a leaf into that item.
///
/// A lone checkbox or a one-option multi-select submits one value, which the
/// parser records as a scalar; this brings a result built from arrays back
/// to that shape. Arrays of containers are left alone, they address items.
///
/// ```
/// use conform::collapse_leaf_arrays;
/// use conform_value::FormValue;
/// use serde_json::json;
///
/// let value = FormValue::from(json!({"tags": ["x"], "items": [{"a": ["y"]}]}));
/// assert_eq!(
///     collapse_leaf_arrays(&value).to_json(),
///     json!({"tags": "x", "items": [{"a": "y"}]})
/// );
/// ```
pub fn collapse_leaf_arrays(value: &FormValue) -> FormValue {
    match value {
        FormValue::Array(items) => match items.as_slice() {
            [only] if only.is_leaf() => only.clone(),
            _ => FormValue::array(items.iter().map(collapse_leaf_arrays).collect()),
        },
        FormValue::Object(map) => {
            FormValue::object(map.iter().map(|(k, v)| (k.clone(), collapse_leaf_arrays(v))))
        }
        leaf => leaf.clone(),
    }
}

/// Drop names without messages; `None` when no name is left.
pub fn simplify_errors(errors: &ErrorMap) -> Option<ErrorMap> {
    let kept: ErrorMap = errors
        .iter()
        .filter(|(_, messages)| !messages.is_empty())
        .map(|(name, messages)| (name.clone(), messages.clone()))
        .collect();
    (!kept.is_empty()).then_some(kept)
}

#[cfg(test)]
mod tests {
    use super::*;
    use conform_value::FileEntry;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn test_leaves() {
        assert_eq!(simplify(&FormValue::Null), None);
        assert_eq!(simplify(&FormValue::from("")), None);
        assert_eq!(simplify(&FormValue::from(FileEntry::default())), None);
        assert_eq!(simplify(&FormValue::from("x")), Some(FormValue::from("x")));
        assert_eq!(simplify(&FormValue::from(false)), Some(FormValue::from(false)));
    }

    #[test]
    fn test_empty_containers_vanish() {
        assert_eq!(simplify(&FormValue::empty_object()), None);
        assert_eq!(simplify(&FormValue::array(vec![])), None);
        assert_eq!(simplify(&FormValue::from(json!({"a": {"b": [null, ""]}}))), None);
    }

    #[test]
    fn test_holes_keep_indices() {
        let value = FormValue::from(json!({"items": [{"t": ""}, {"t": "b"}]}));
        assert_eq!(
            simplify(&value).map(|v| v.to_json()),
            Some(json!({"items": [null, {"t": "b"}]}))
        );
    }

    #[test]
    fn test_simplify_does_not_collapse() {
        let value = FormValue::from(json!({"tags": ["x"]}));
        assert_eq!(simplify(&value), Some(value));
    }

    #[test]
    fn test_collapse_keeps_longer_arrays() {
        let value = FormValue::from(json!({"tags": ["x", "y"], "one": [["z"]]}));
        assert_eq!(
            collapse_leaf_arrays(&value).to_json(),
            json!({"tags": ["x", "y"], "one": ["z"]})
        );
    }

    #[test]
    fn test_simplify_errors() {
        let mut errors = ErrorMap::new();
        errors.insert("a".into(), vec![]);
        assert_eq!(simplify_errors(&errors), None);
        errors.insert("b".into(), vec!["bad".into()]);
        let kept = simplify_errors(&errors).unwrap();
        assert_eq!(kept.keys().collect::<Vec<_>>(), ["b"]);
    }
}
