use crate::FormValue;

/// Performs a deep equality check between two form values.
///
/// Shared nodes are equal without being walked, so comparing two snapshots
/// that differ in one branch only descends into that branch.
///
/// # Examples
///
/// ```
/// use conform_value::{deep_equal, FormValue};
/// use serde_json::json;
///
/// let a = FormValue::from(json!({"foo": ["1", "2"]}));
/// let b = FormValue::from(json!({"foo": ["1", "2"]}));
/// let c = FormValue::from(json!({"foo": ["1", "3"]}));
///
/// assert!(deep_equal(&a, &b));
/// assert!(!deep_equal(&a, &c));
/// ```
pub fn deep_equal(a: &FormValue, b: &FormValue) -> bool {
    if a.ptr_eq(b) {
        return true;
    }
    match (a, b) {
        (FormValue::Null, FormValue::Null) => true,
        (FormValue::Bool(a), FormValue::Bool(b)) => a == b,
        (FormValue::Number(a), FormValue::Number(b)) => a == b,
        (FormValue::String(a), FormValue::String(b)) => a == b,
        (FormValue::File(a), FormValue::File(b)) => a == b,
        (FormValue::Array(arr_a), FormValue::Array(arr_b)) => {
            arr_a.len() == arr_b.len()
                && arr_a.iter().zip(arr_b.iter()).all(|(x, y)| deep_equal(x, y))
        }
        (FormValue::Object(obj_a), FormValue::Object(obj_b)) => {
            if obj_a.len() != obj_b.len() {
                return false;
            }
            obj_a.iter().all(|(key, val_a)| match obj_b.get(key) {
                Some(val_b) => deep_equal(val_a, val_b),
                None => false,
            })
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FileEntry;
    use serde_json::json;

    fn v(value: serde_json::Value) -> FormValue {
        FormValue::from(value)
    }

    #[test]
    fn test_null_and_empty_string_not_equal() {
        assert!(!deep_equal(&v(json!(null)), &v(json!(""))));
    }

    #[test]
    fn test_array_length_mismatch() {
        assert!(!deep_equal(&v(json!(["a"])), &v(json!(["a", "b"]))));
    }

    #[test]
    fn test_object_key_order_irrelevant() {
        assert!(deep_equal(&v(json!({"a": "1", "b": "2"})), &v(json!({"b": "2", "a": "1"}))));
    }

    #[test]
    fn test_object_missing_key() {
        assert!(!deep_equal(&v(json!({"a": "1"})), &v(json!({"b": "1"}))));
    }

    #[test]
    fn test_files_compare_by_metadata() {
        let a = FormValue::from(FileEntry::new("a.png", "image/png", 10));
        let b = FormValue::from(FileEntry::new("a.png", "image/png", 10));
        let c = FormValue::from(FileEntry::new("a.png", "image/png", 11));
        assert!(deep_equal(&a, &b));
        assert!(!deep_equal(&a, &c));
    }

    #[test]
    fn test_shared_nodes_equal() {
        let a = v(json!({"deep": {"x": ["1"]}}));
        let b = a.clone();
        assert!(deep_equal(&a, &b));
    }
}
