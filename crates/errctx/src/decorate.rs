//! Immutable error decoration.
//!
//! [`set`] wraps an error together with an opaque-keyed store of values.
//! Decorated errors render exactly like the error they wrap, unwrap to it
//! through [`base`] and [`Error::source`](std::error::Error::source), and are
//! never mutated once returned: every [`set`] copies the ancestor's store
//! into a fresh wrapper.
//!
//! ```rust
//! use errctx::{base, get, msg, set};
//! use std::sync::Arc;
//!
//! #[derive(Debug, PartialEq, Eq, Hash)]
//! struct Tenant;
//!
//! let err = msg("ERR");
//! assert!(get::<_, String>(&err, &Tenant).is_none());
//!
//! let err2 = set(&err, Tenant, "a".to_string());
//! let err3 = set(&err2, Tenant, "b".to_string());
//! assert_eq!(get::<_, String>(&err2, &Tenant).unwrap(), "a");
//! assert_eq!(get::<_, String>(&err3, &Tenant).unwrap(), "b");
//! assert_eq!(err3.to_string(), "ERR");
//! assert!(Arc::ptr_eq(&base(&err3), &err));
//! ```

use std::any::Any;
use std::error::Error as StdError;
use std::fmt;
use std::ptr;
use std::sync::Arc;

use tracing::debug;

use crate::error::SharedError;
use crate::store::{AnyValue, ContextKey, Lookup, Store, StoreKey};

/// An error wrapped with a store of context values.
///
/// Only ever constructed by [`set`] and [`set_pairs`]; the wrapped error is
/// always an undecorated base, so wrappers never nest.
#[derive(Clone)]
pub struct Decorated {
    err: SharedError,
    store: Store,
}

impl Decorated {
    /// The wrapped base error.
    pub fn inner(&self) -> &SharedError {
        &self.err
    }

    /// Number of context values carried.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.len() == 0
    }

    /// Returns `true` if a value is set under `key`, whatever its type.
    pub fn contains_key<K: ContextKey>(&self, key: &K) -> bool {
        self.store.contains(key)
    }

    /// Returns `true` if `candidate` is the wrapped error, or unwraps (via
    /// [`base`]) to the wrapped error.
    ///
    /// This is the hook [`chain::is`](crate::chain::is) consults, so a
    /// decoration matches its base and every other decoration of that base.
    pub fn is(&self, candidate: &(dyn StdError + 'static)) -> bool {
        same_error(candidate, &*self.err) || same_error(base_ref(candidate), &*self.err)
    }
}

impl fmt::Display for Decorated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&*self.err, f)
    }
}

impl fmt::Debug for Decorated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<String> = self.store.keys().map(|k| format!("{k:?}")).collect();
        keys.sort();
        f.debug_struct("Decorated")
            .field("err", &self.err)
            .field("keys", &keys)
            .finish()
    }
}

impl StdError for Decorated {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&*self.err)
    }
}

/// An ordered list of key/value pairs for [`set_pairs`].
///
/// Pairs apply left to right; a later pair overwrites an earlier one with the
/// same key.
#[derive(Default)]
pub struct Pairs {
    entries: Vec<(StoreKey, AnyValue)>,
}

impl Pairs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pair<K, V>(mut self, key: K, value: V) -> Self
    where
        K: ContextKey,
        V: Any + Send + Sync,
    {
        self.entries.push((StoreKey::new(key), Arc::new(value)));
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl fmt::Debug for Pairs {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.entries.iter().map(|(k, _)| k))
            .finish()
    }
}

/// Returns the error originally passed to [`set`], or `err` itself if it was
/// never decorated.
pub fn base(err: &SharedError) -> SharedError {
    match err.downcast_ref::<Decorated>() {
        Some(decorated) => decorated.err.clone(),
        None => err.clone(),
    }
}

/// Returns a new error that carries `value` under `key`, plus every value
/// already set on `err`.
///
/// `err` itself is left untouched.
pub fn set<K, V>(err: &SharedError, key: K, value: V) -> SharedError
where
    K: ContextKey,
    V: Any + Send + Sync,
{
    set_pairs(err, Pairs::new().pair(key, value))
}

/// Like [`set`] for several pairs at once.
pub fn set_pairs(err: &SharedError, pairs: Pairs) -> SharedError {
    let mut store = match err.downcast_ref::<Decorated>() {
        Some(decorated) => decorated.store.clone(),
        None => Store::default(),
    };
    for (key, value) in pairs.entries {
        store.insert(key, value);
    }
    Arc::new(Decorated {
        err: base(err),
        store,
    })
}

/// Retrieves the value set under `key` by a previous [`set`].
///
/// Returns `None` if the key is absent, if it holds a value of a type other
/// than `V`, or if `err` was never decorated.
pub fn get<'a, K, V>(err: &'a SharedError, key: &K) -> Option<&'a V>
where
    K: ContextKey,
    V: Any,
{
    let decorated = err.downcast_ref::<Decorated>()?;
    match decorated.store.lookup::<K, V>(key) {
        Lookup::Found(value) => Some(value),
        Lookup::WrongType => {
            debug!(
                key = ?key,
                expected = std::any::type_name::<V>(),
                "context value has a different type"
            );
            None
        }
        Lookup::Missing => None,
    }
}

/// [`base`] over a borrowed error.
pub(crate) fn base_ref<'a>(err: &'a (dyn StdError + 'static)) -> &'a (dyn StdError + 'static) {
    match err.downcast_ref::<Decorated>() {
        Some(decorated) => &*decorated.err,
        None => err,
    }
}

/// Identity comparison: same allocation, ignoring vtables.
pub(crate) fn same_error(a: &(dyn StdError + 'static), b: &(dyn StdError + 'static)) -> bool {
    ptr::addr_eq(a as *const dyn StdError, b as *const dyn StdError)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::msg;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct Key(u8);

    fn get_str<'a>(err: &'a SharedError, k: u8) -> Option<&'a str> {
        get::<_, String>(err, &Key(k)).map(String::as_str)
    }

    fn decorated(err: &SharedError) -> &Decorated {
        err.downcast_ref::<Decorated>().unwrap()
    }

    // ---- Base ----

    #[test]
    fn base_of_plain_error_is_itself() {
        let err = msg("foo");
        assert!(Arc::ptr_eq(&base(&err), &err));
        assert!(Arc::ptr_eq(&base(&base(&err)), &err));
    }

    #[test]
    fn base_survives_any_depth() {
        let err = msg("foo");
        let mut current = err.clone();
        for i in 0..5u8 {
            current = set(&current, Key(i), i.to_string());
        }
        assert!(Arc::ptr_eq(&base(&current), &err));
        assert!(Arc::ptr_eq(&base(&base(&current)), &err));
    }

    // ---- Set / Get ----

    #[test]
    fn set_and_get() {
        let err = msg("foo");

        let err1 = set(&err, Key(0), "a".to_string());
        assert_eq!(err.to_string(), err1.to_string());
        assert!(Arc::ptr_eq(&base(&err1), &err));
        assert_eq!(get_str(&err, 0), None);
        assert_eq!(get_str(&err1, 0), Some("a"));
    }

    #[test]
    fn siblings_do_not_leak() {
        let err = msg("foo");
        let err1 = set(&err, Key(0), "a".to_string());
        let err2 = set(&err, Key(1), "b".to_string());

        assert!(!Arc::ptr_eq(&err1, &err2));
        assert_eq!(err2.to_string(), "foo");
        assert_eq!(get_str(&err1, 1), None);
        assert_eq!(get_str(&err2, 0), None);
        assert_eq!(get_str(&err2, 1), Some("b"));
    }

    #[test]
    fn redecoration_accumulates_without_touching_ancestor() {
        let err = msg("foo");
        let err2 = set(&err, Key(1), "b".to_string());
        let err3 = set(&err2, Key(2), "c".to_string());

        assert_eq!(err3.to_string(), "foo");
        assert!(Arc::ptr_eq(&base(&err3), &err));
        assert_eq!(get_str(&err3, 0), None);
        assert_eq!(get_str(&err2, 2), None);
        assert_eq!(get_str(&err3, 1), Some("b"));
        assert_eq!(get_str(&err3, 2), Some("c"));
    }

    #[test]
    fn overwriting_a_key_keeps_the_old_value_on_the_ancestor() {
        let err = msg("ERR");
        let err2 = set(&err, Key(0), "a".to_string());
        let err3 = set(&err2, Key(0), "b".to_string());
        assert_eq!(get_str(&err2, 0), Some("a"));
        assert_eq!(get_str(&err3, 0), Some("b"));
    }

    #[test]
    fn decorations_never_nest() {
        let err = msg("foo");
        let err3 = set(&set(&err, Key(1), 1u32), Key(2), 2u32);
        let inner = decorated(&err3).inner();
        assert!(inner.downcast_ref::<Decorated>().is_none());
        assert!(Arc::ptr_eq(inner, &err));
        assert_eq!(decorated(&err3).len(), 2);
    }

    #[test]
    fn set_pairs_apply_left_to_right() {
        let err = msg("foo");
        let err1 = set_pairs(
            &err,
            Pairs::new()
                .pair(Key(0), "first".to_string())
                .pair(Key(1), "other".to_string())
                .pair(Key(0), "second".to_string()),
        );
        assert_eq!(get_str(&err1, 0), Some("second"));
        assert_eq!(get_str(&err1, 1), Some("other"));
    }

    #[test]
    fn set_with_no_pairs_still_wraps() {
        let err = msg("foo");
        let err1 = set_pairs(&err, Pairs::new());
        assert!(decorated(&err1).is_empty());
        assert!(Arc::ptr_eq(&base(&err1), &err));
    }

    #[test]
    fn get_with_wrong_value_type_is_none() {
        let err = set(&msg("foo"), Key(0), 7u64);
        assert_eq!(get::<_, u64>(&err, &Key(0)), Some(&7));
        assert_eq!(get::<_, String>(&err, &Key(0)), None);
    }

    #[test]
    fn contains_key_ignores_value_type() {
        let err = set(&msg("foo"), Key(0), 7u64);
        assert!(decorated(&err).contains_key(&Key(0)));
        assert!(!decorated(&err).contains_key(&Key(1)));
    }

    #[test]
    fn keys_of_different_types_coexist() {
        #[derive(Debug, PartialEq, Eq, Hash)]
        struct Other(u8);

        let err = set(&set(&msg("foo"), Key(0), 1i32), Other(0), 2i32);
        assert_eq!(get::<_, i32>(&err, &Key(0)), Some(&1));
        assert_eq!(get::<_, i32>(&err, &Other(0)), Some(&2));
    }

    #[test]
    fn foreign_errors_are_opaque_bases() {
        let io: SharedError = Arc::new(std::io::Error::other("disk full"));
        assert_eq!(get_str(&io, 0), None);
        let wrapped = set(&io, Key(0), "x".to_string());
        assert_eq!(wrapped.to_string(), "disk full");
        assert!(base(&wrapped).downcast_ref::<std::io::Error>().is_some());
    }

    // ---- Is ----

    #[test]
    fn is_matches_base_and_related_decorations() {
        let err = msg("foo");
        let err2 = set(&err, Key(1), "b".to_string());
        let err3 = set(&err2, Key(2), "c".to_string());

        let d3 = decorated(&err3);
        assert!(d3.is(&*err3));
        assert!(d3.is(&*err2));
        assert!(d3.is(&*err));
        assert!(d3.is(&**decorated(&err2).inner()));
    }

    #[test]
    fn is_rejects_unrelated_errors() {
        let err = set(&msg("foo"), Key(0), 0u8);
        let other = msg("foo");
        assert!(!decorated(&err).is(&*other));
        assert!(!decorated(&err).is(&*set(&other, Key(0), 0u8)));
    }

    // ---- Formatting ----

    #[test]
    fn source_is_the_base() {
        let err = msg("foo");
        let err1 = set(&err, Key(0), 0u8);
        let source = err1.source().unwrap();
        assert!(same_error(source, &*err));
    }

    #[test]
    fn debug_lists_keys() {
        let err = set(&msg("foo"), Key(3), 0u8);
        let rendered = format!("{err:?}");
        assert!(rendered.contains("Decorated"), "got: {rendered}");
        assert!(rendered.contains("Key(3)"), "got: {rendered}");
    }
}
