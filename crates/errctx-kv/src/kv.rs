use std::collections::btree_map::{self, BTreeMap};
use std::fmt;
use std::ops::Index;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{KvError, Result};
use crate::render;

/// A dynamic bag of key/value pairs attached to a log entry, an error, or a
/// request context.
///
/// Every "modifying" method that takes `&self` ([`set`](KV::set),
/// [`set_serialized`](KV::set_serialized)) and the free function [`merge`]
/// return a fresh bag; the receiver is never touched. [`insert`](KV::insert)
/// and [`remove`](KV::remove) mutate a bag you own. Consumers always store
/// their own copy.
///
/// Keys are kept sorted, so iteration and [`string_pairs`](KV::string_pairs)
/// are deterministic.
#[derive(Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KV(BTreeMap<String, Value>);

impl KV {
    /// Create an empty bag.
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// A shallow duplicate of this bag. Never fails, never shares storage.
    pub fn copy(&self) -> Self {
        self.clone()
    }

    /// Returns a copy of this bag with `key` bound to `value`.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let mut next = self.copy();
        next.0.insert(key.into(), value.into());
        next
    }

    /// Like [`set`](KV::set) for any `Serialize` value.
    pub fn set_serialized<T>(&self, key: impl Into<String>, value: &T) -> Result<Self>
    where
        T: Serialize + ?Sized,
    {
        let key = key.into();
        let value = serde_json::to_value(value).map_err(|source| KvError::Encode {
            key: key.clone(),
            source,
        })?;
        Ok(self.set(key, value))
    }

    /// Bind `key` in place, returning the previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    /// Remove `key` in place, returning its value.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.0.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Decode the value stored under `key` into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T> {
        let value = self.0.get(key).ok_or_else(|| KvError::MissingKey {
            key: key.to_string(),
        })?;
        T::deserialize(value).map_err(|source| KvError::Decode {
            key: key.to_string(),
            source,
        })
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate entries in ascending key order.
    pub fn iter(&self) -> btree_map::Iter<'_, String, Value> {
        self.0.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    /// Render every entry as `(key, text)`, sorted ascending by key.
    ///
    /// String values render bare, everything else as compact JSON, and any
    /// double quote in the text is replaced with a single quote.
    pub fn string_pairs(&self) -> Vec<(String, String)> {
        // BTreeMap iteration is already key-ordered.
        self.0
            .iter()
            .map(|(k, v)| (k.clone(), render::pair_value(v)))
            .collect()
    }
}

/// Union any number of bags into a new one.
///
/// Bags are applied left to right, so on conflicting keys the rightmost bag
/// wins. An empty input yields an empty bag.
pub fn merge<'a, I>(kvs: I) -> KV
where
    I: IntoIterator<Item = &'a KV>,
{
    let mut out = KV::new();
    for kv in kvs {
        for (k, v) in kv.iter() {
            out.0.insert(k.clone(), v.clone());
        }
    }
    out
}

impl fmt::Debug for KV {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

impl Index<&str> for KV {
    type Output = Value;

    /// Panics if `key` is absent, like `BTreeMap`'s index.
    fn index(&self, key: &str) -> &Value {
        &self.0[key]
    }
}

impl<K, V> FromIterator<(K, V)> for KV
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

impl<K, V> Extend<(K, V)> for KV
where
    K: Into<String>,
    V: Into<Value>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.0.insert(k.into(), v.into());
        }
    }
}

impl IntoIterator for KV {
    type Item = (String, Value);
    type IntoIter = btree_map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a KV {
    type Item = (&'a String, &'a Value);
    type IntoIter = btree_map::Iter<'a, String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

impl From<BTreeMap<String, Value>> for KV {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

impl From<KV> for Value {
    fn from(kv: KV) -> Self {
        Value::Object(kv.0.into_iter().collect())
    }
}
