//! Safety rules applied while parsing field names.

use crate::types::Segment;

/// Maximum allowed path depth.
pub const MAX_PATH_LENGTH: usize = 256;

/// Largest list index a field name may address.
///
/// Writing to `a[n]` grows the list to `n + 1` items, so the bound also caps
/// what a single submitted name can allocate.
pub const MAX_LIST_INDEX: usize = 10_000;

/// Keys that are silently dropped from parsed paths.
///
/// Field names come from untrusted submissions; a key like `__proto__` must
/// never become a structural step in the value tree.
pub const BLOCKED_KEYS: [&str; 3] = ["__proto__", "constructor", "prototype"];

/// Returns `true` if the segment is one of the [`BLOCKED_KEYS`].
pub fn is_blocked(segment: &Segment) -> bool {
    match segment {
        Segment::Key(k) => BLOCKED_KEYS.contains(&k.as_str()),
        _ => false,
    }
}

/// Check a path against the depth limit.
pub fn validate_path(path: &[Segment]) -> bool {
    path.len() <= MAX_PATH_LENGTH
}

/// Check a list index against [`MAX_LIST_INDEX`].
pub fn is_index_allowed(idx: usize) -> bool {
    idx <= MAX_LIST_INDEX
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blocked_keys() {
        assert!(is_blocked(&Segment::key("__proto__")));
        assert!(is_blocked(&Segment::key("constructor")));
        assert!(is_blocked(&Segment::key("prototype")));
        assert!(!is_blocked(&Segment::key("proto")));
        assert!(!is_blocked(&Segment::index(0)));
    }

    #[test]
    fn test_validate_max_length_path() {
        let path: Vec<Segment> = (0..MAX_PATH_LENGTH).map(Segment::Index).collect();
        assert!(validate_path(&path));
        let path: Vec<Segment> = (0..=MAX_PATH_LENGTH).map(Segment::Index).collect();
        assert!(!validate_path(&path));
    }

    #[test]
    fn test_index_bound() {
        assert!(is_index_allowed(0));
        assert!(is_index_allowed(MAX_LIST_INDEX));
        assert!(!is_index_allowed(MAX_LIST_INDEX + 1));
        assert!(!is_index_allowed(usize::MAX));
    }
}
