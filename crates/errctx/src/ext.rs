//! Decoration on values that may not hold an error.
//!
//! The free functions in this crate always take an error. Code that
//! propagates `Result`s (or holds an `Option<SharedError>`) uses [`Annotate`]
//! instead: every method is a no-op when there is no error, so an `Ok` or a
//! `None` passes through untouched and never gets marked.
//!
//! ```rust
//! use errctx::{kv, msg, Annotate, SharedError};
//!
//! fn load(id: u64) -> Result<String, SharedError> {
//!     Err(msg("not found")).with_kv(&kv! { "id" => id })
//! }
//!
//! let kv = load(7).err_kv();
//! assert_eq!(kv["err"], "not found");
//! assert_eq!(kv["id"], 7);
//!
//! let ok: Result<u8, SharedError> = Ok(1);
//! assert!(ok.with_kv(&kv! { "id" => 1 }).err_kv().is_empty());
//! ```

use std::any::Any;
use std::panic::Location;

use errctx_kv::KV;

use crate::bridge::{err_kv, err_with_kv_at};
use crate::decorate::set;
use crate::error::SharedError;
use crate::mark::{line, mark_at, mark_resolved};
use crate::site;
use crate::store::ContextKey;

/// Extension methods for `Result<T, SharedError>` and `Option<SharedError>`.
pub trait Annotate: Sized {
    /// [`mark`](crate::mark()) the error, if any, at the caller's location.
    fn mark(self) -> Self;

    /// [`mark_skip`](crate::mark_skip) the error, if any. `skip` counts
    /// frames above the caller of this method.
    fn mark_skip(self, skip: usize) -> Self;

    /// [`err_with_kv`](crate::err_with_kv) the error, if any, marking the
    /// caller's location.
    fn with_kv(self, kv: &KV) -> Self;

    /// [`set`](crate::set) a context value on the error, if any.
    fn set_ctx<K, V>(self, key: K, value: V) -> Self
    where
        K: ContextKey,
        V: Any + Send + Sync;

    /// [`err_kv`](crate::err_kv) of the error, or an empty bag when there is
    /// no error.
    fn err_kv(&self) -> KV;
}

impl<T> Annotate for Result<T, SharedError> {
    #[track_caller]
    fn mark(self) -> Self {
        let location = Location::caller();
        self.map_err(|err| mark_at(&err, location))
    }

    #[track_caller]
    #[inline(never)]
    fn mark_skip(self, skip: usize) -> Self {
        let err = match self {
            Ok(value) => return Ok(value),
            Err(err) => err,
        };
        if skip == 0 || line(&err).is_some() {
            return Err(mark_at(&err, Location::caller()));
        }
        Err(mark_resolved(&err, skip, site::resolve(skip)))
    }

    #[track_caller]
    fn with_kv(self, kv: &KV) -> Self {
        let location = Location::caller();
        self.map_err(|err| err_with_kv_at(&err, [kv], location))
    }

    fn set_ctx<K, V>(self, key: K, value: V) -> Self
    where
        K: ContextKey,
        V: Any + Send + Sync,
    {
        self.map_err(|err| set(&err, key, value))
    }

    fn err_kv(&self) -> KV {
        match self {
            Ok(_) => KV::new(),
            Err(err) => err_kv(err),
        }
    }
}

impl Annotate for Option<SharedError> {
    #[track_caller]
    fn mark(self) -> Self {
        let location = Location::caller();
        self.map(|err| mark_at(&err, location))
    }

    #[track_caller]
    #[inline(never)]
    fn mark_skip(self, skip: usize) -> Self {
        let err = self?;
        if skip == 0 || line(&err).is_some() {
            return Some(mark_at(&err, Location::caller()));
        }
        Some(mark_resolved(&err, skip, site::resolve(skip)))
    }

    #[track_caller]
    fn with_kv(self, kv: &KV) -> Self {
        let location = Location::caller();
        self.map(|err| err_with_kv_at(&err, [kv], location))
    }

    fn set_ctx<K, V>(self, key: K, value: V) -> Self
    where
        K: ContextKey,
        V: Any + Send + Sync,
    {
        self.map(|err| set(&err, key, value))
    }

    fn err_kv(&self) -> KV {
        self.as_ref().map(err_kv).unwrap_or_default()
    }
}
