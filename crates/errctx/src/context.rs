//! Request-scoped, immutable context values.
//!
//! A [`Context`] is a chain of links, each binding one key to one value.
//! Attaching a value returns a new context whose parent is the old one;
//! nothing is ever written through an existing link, so a context can be
//! cloned into as many tasks as needed.
//!
//! [`ctx_with_kv`] and [`ctx_kv`] carry a [`KV`] bag along the chain the same
//! way [`err_with_kv`](crate::err_with_kv) does for errors.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use errctx_kv::{merge, KV};

use crate::store::{AnyValue, ContextKey, StoreKey};

struct Link {
    key: StoreKey,
    value: AnyValue,
    parent: Option<Arc<Link>>,
}

/// An immutable, chained bag of request-scoped values.
#[derive(Clone, Default)]
pub struct Context {
    head: Option<Arc<Link>>,
}

impl Context {
    /// The empty root context.
    pub fn background() -> Self {
        Self::default()
    }

    /// Returns a child context binding `key` to `value`.
    pub fn with_value<K, V>(&self, key: K, value: V) -> Self
    where
        K: ContextKey,
        V: Any + Send + Sync,
    {
        Self {
            head: Some(Arc::new(Link {
                key: StoreKey::new(key),
                value: Arc::new(value),
                parent: self.head.clone(),
            })),
        }
    }

    /// The value bound to `key` by the nearest link, if it has type `V`.
    pub fn value<K, V>(&self, key: &K) -> Option<&V>
    where
        K: ContextKey,
        V: Any,
    {
        let mut link = self.head.as_deref();
        while let Some(current) = link {
            if current.key.matches(key) {
                return (*current.value).downcast_ref::<V>();
            }
            link = current.parent.as_deref();
        }
        None
    }

    /// Number of links between this context and the root.
    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut link = self.head.as_deref();
        while let Some(current) = link {
            depth += 1;
            link = current.parent.as_deref();
        }
        depth
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys = Vec::new();
        let mut link = self.head.as_deref();
        while let Some(current) = link {
            keys.push(&current.key);
            link = current.parent.as_deref();
        }
        f.debug_struct("Context").field("keys", &keys).finish()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct KvKey;

/// Returns a child context carrying the merge of the existing bag (if any)
/// and `kvs`, with `kvs` winning on conflicts.
pub fn ctx_with_kv<'a, I>(ctx: &Context, kvs: I) -> Context
where
    I: IntoIterator<Item = &'a KV>,
{
    let incoming = merge(kvs);
    let kv = match ctx.value::<_, KV>(&KvKey) {
        Some(existing) => merge([existing, &incoming]),
        None => incoming,
    };
    ctx.with_value(KvKey, kv)
}

/// The bag attached by [`ctx_with_kv`], or an empty bag.
pub fn ctx_kv(ctx: &Context) -> KV {
    ctx.value::<_, KV>(&KvKey).cloned().unwrap_or_default()
}
