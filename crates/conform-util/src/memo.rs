use std::cell::RefCell;
use std::collections::HashMap;
use std::hash::Hash;

/// A memoizing accessor: a cache keyed by `K`, populated on first read.
///
/// This is the explicit counterpart of a lazily computed map. Reads go
/// through [`Memo::get_or_insert_with`]; the factory runs at most once per
/// key for the lifetime of the memo.
///
/// # Examples
///
/// ```
/// use std::cell::Cell;
/// use conform_util::Memo;
///
/// let calls = Cell::new(0);
/// let memo: Memo<String, usize> = Memo::new();
///
/// let len = |name: &str| memo.get_or_insert_with(name.to_string(), || {
///     calls.set(calls.get() + 1);
///     name.len()
/// });
///
/// assert_eq!(len("title"), 5);
/// assert_eq!(len("title"), 5);
/// assert_eq!(calls.get(), 1);
/// ```
#[derive(Debug)]
pub struct Memo<K, V> {
    cache: RefCell<HashMap<K, V>>,
}

impl<K, V> Default for Memo<K, V> {
    fn default() -> Self {
        Self {
            cache: RefCell::new(HashMap::new()),
        }
    }
}

impl<K, V> Memo<K, V>
where
    K: Eq + Hash,
    V: Clone,
{
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached value for `key`, computing it with `init` on the
    /// first read.
    ///
    /// `init` may itself read other keys of the same memo.
    pub fn get_or_insert_with<F>(&self, key: K, init: F) -> V
    where
        F: FnOnce() -> V,
    {
        if let Some(v) = self.cache.borrow().get(&key) {
            return v.clone();
        }
        let value = init();
        self.cache.borrow_mut().entry(key).or_insert(value).clone()
    }

    /// Cached value for `key`, if it has been computed.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.cache.borrow().get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.cache.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.borrow().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_peek_before_and_after() {
        let memo: Memo<&str, bool> = Memo::new();
        assert_eq!(memo.peek(&"a"), None);
        assert!(memo.get_or_insert_with("a", || true));
        assert_eq!(memo.peek(&"a"), Some(true));
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn test_recursive_init() {
        let memo: Memo<u32, u64> = Memo::new();
        fn fib(memo: &Memo<u32, u64>, n: u32) -> u64 {
            memo.get_or_insert_with(n, || if n < 2 { n as u64 } else { fib(memo, n - 1) + fib(memo, n - 2) })
        }
        assert_eq!(fib(&memo, 30), 832_040);
        assert_eq!(memo.len(), 31);
    }
}
