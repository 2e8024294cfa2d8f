//! Opaque-keyed value store shared by decorated errors and contexts.
//!
//! Keys may be any `Eq + Hash + Debug + Send + Sync + 'static` value. Two
//! keys only compare equal when they have the same Rust type *and* compare
//! equal as values, so every feature can reserve a private unit struct as
//! its key without any chance of colliding with keys chosen by callers.

use std::any::{Any, TypeId};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Bound satisfied by every type usable as a context key.
pub trait ContextKey: Any + Eq + Hash + fmt::Debug + Send + Sync {}

impl<T> ContextKey for T where T: Any + Eq + Hash + fmt::Debug + Send + Sync {}

/// Type-erased value stored under a key.
pub(crate) type AnyValue = Arc<dyn Any + Send + Sync>;

/// Object-safe view of a [`ContextKey`].
pub(crate) trait DynKey: Send + Sync {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn DynKey) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
    fn dyn_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<T: ContextKey> DynKey for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn DynKey) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }

    fn dyn_fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl PartialEq for dyn DynKey {
    fn eq(&self, other: &Self) -> bool {
        self.dyn_eq(other)
    }
}

impl Eq for dyn DynKey {}

impl Hash for dyn DynKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.dyn_hash(state);
    }
}

/// A type-erased, cheaply clonable key.
#[derive(Clone)]
pub(crate) struct StoreKey(Arc<dyn DynKey>);

impl StoreKey {
    pub(crate) fn new<K: ContextKey>(key: K) -> Self {
        Self(Arc::new(key))
    }

    /// Returns `true` if this key is `key` (same type, equal value).
    pub(crate) fn matches<K: ContextKey>(&self, key: &K) -> bool {
        (*self.0).as_any().downcast_ref::<K>() == Some(key)
    }
}

impl PartialEq for StoreKey {
    fn eq(&self, other: &Self) -> bool {
        *self.0 == *other.0
    }
}

impl Eq for StoreKey {}

impl Hash for StoreKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (*self.0).hash(state);
    }
}

impl Borrow<dyn DynKey> for StoreKey {
    fn borrow(&self) -> &(dyn DynKey + 'static) {
        &*self.0
    }
}

impl fmt::Debug for StoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        (*self.0).dyn_fmt(f)
    }
}

/// Outcome of a typed lookup.
pub(crate) enum Lookup<'a, V> {
    Found(&'a V),
    /// The key is bound, but to a value of another type.
    WrongType,
    Missing,
}

/// Flat map from opaque keys to type-erased values.
///
/// Cloning copies the map structure; values are shared behind `Arc` and are
/// never mutated, so a clone is fully isolated from its source.
#[derive(Clone, Default)]
pub(crate) struct Store {
    entries: HashMap<StoreKey, AnyValue>,
}

impl Store {
    pub(crate) fn insert(&mut self, key: StoreKey, value: AnyValue) {
        self.entries.insert(key, value);
    }

    pub(crate) fn lookup<K: ContextKey, V: Any>(&self, key: &K) -> Lookup<'_, V> {
        let probe: &(dyn DynKey + 'static) = key;
        match self.entries.get(probe) {
            Some(value) => match (**value).downcast_ref::<V>() {
                Some(v) => Lookup::Found(v),
                None => Lookup::WrongType,
            },
            None => Lookup::Missing,
        }
    }

    pub(crate) fn contains<K: ContextKey>(&self, key: &K) -> bool {
        let probe: &(dyn DynKey + 'static) = key;
        self.entries.contains_key(probe)
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn keys(&self) -> impl Iterator<Item = &StoreKey> {
        self.entries.keys()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct KeyA(u8);

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    struct KeyB(u8);

    fn value<V: Any + Send + Sync>(v: V) -> AnyValue {
        Arc::new(v)
    }

    impl<'a, V> Lookup<'a, V> {
        fn found(self) -> Option<&'a V> {
            match self {
                Lookup::Found(v) => Some(v),
                Lookup::WrongType | Lookup::Missing => None,
            }
        }
    }

    #[test]
    fn same_type_same_value_is_same_key() {
        let mut store = Store::default();
        store.insert(StoreKey::new(KeyA(1)), value("one".to_string()));
        assert_eq!(
            store.lookup::<_, String>(&KeyA(1)).found().map(String::as_str),
            Some("one")
        );
        assert!(store.lookup::<_, String>(&KeyA(2)).found().is_none());
    }

    #[test]
    fn distinct_types_never_collide() {
        let mut store = Store::default();
        store.insert(StoreKey::new(KeyA(0)), value(1u32));
        store.insert(StoreKey::new(KeyB(0)), value(2u32));
        store.insert(StoreKey::new(0u8), value(3u32));

        assert_eq!(store.len(), 3);
        assert_eq!(store.lookup::<_, u32>(&KeyA(0)).found(), Some(&1));
        assert_eq!(store.lookup::<_, u32>(&KeyB(0)).found(), Some(&2));
        assert_eq!(store.lookup::<_, u32>(&0u8).found(), Some(&3));
    }

    #[test]
    fn wrong_value_type_is_reported() {
        let mut store = Store::default();
        store.insert(StoreKey::new(KeyA(0)), value(1u32));
        assert!(matches!(
            store.lookup::<_, String>(&KeyA(0)),
            Lookup::WrongType
        ));
        assert!(matches!(
            store.lookup::<_, String>(&KeyA(9)),
            Lookup::Missing
        ));
    }

    #[test]
    fn later_insert_overwrites() {
        let mut store = Store::default();
        store.insert(StoreKey::new("k"), value(1i32));
        store.insert(StoreKey::new("k"), value(2i32));
        assert_eq!(store.len(), 1);
        assert_eq!(store.lookup::<_, i32>(&"k").found(), Some(&2));
    }

    #[test]
    fn clone_is_isolated() {
        let mut original = Store::default();
        original.insert(StoreKey::new(KeyA(0)), value(1i32));
        let mut copy = original.clone();
        copy.insert(StoreKey::new(KeyA(1)), value(2i32));

        assert!(!original.contains(&KeyA(1)));
        assert!(copy.contains(&KeyA(0)));
        assert!(copy.contains(&KeyA(1)));
    }

    #[test]
    fn key_matches_by_type_and_value() {
        let key = StoreKey::new(KeyA(3));
        assert!(key.matches(&KeyA(3)));
        assert!(!key.matches(&KeyA(4)));
        assert!(!key.matches(&KeyB(3)));
    }

    #[test]
    fn key_debug_shows_inner_value() {
        assert_eq!(format!("{:?}", StoreKey::new(KeyA(7))), "KeyA(7)");
    }
}
