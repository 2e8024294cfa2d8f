//! Attaching [`KV`] bags to errors.
//!
//! [`err_with_kv`] merges bags onto an error (and marks it), [`err_kv`]
//! reads back everything a log sink needs: the merged bag, the error message
//! under `"err"` and the first marked line under `"source"`.

use std::panic::Location;

use errctx_kv::{merge, Value, KV};

use crate::decorate::{get, set};
use crate::error::SharedError;
use crate::mark::{line, mark_at};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct KvKey;

/// Key under which [`err_kv`] reports the error message.
pub const ERR_KEY: &str = "err";

/// Key under which [`err_kv`] reports the marked line.
pub const SOURCE_KEY: &str = "source";

/// Embed the merge of `kvs` into the error and mark the caller's location.
///
/// If the error already carries a bag, the result carries the merge of the
/// existing bag and the new ones, with the new ones winning on conflicts.
/// The caller's bags are copied; mutating them afterwards does not affect
/// the returned error.
#[track_caller]
pub fn err_with_kv<'a, I>(err: &SharedError, kvs: I) -> SharedError
where
    I: IntoIterator<Item = &'a KV>,
{
    err_with_kv_at(err, kvs, Location::caller())
}

pub(crate) fn err_with_kv_at<'a, I>(
    err: &SharedError,
    kvs: I,
    location: &Location<'_>,
) -> SharedError
where
    I: IntoIterator<Item = &'a KV>,
{
    let incoming = merge(kvs);
    let kv = match attached(err) {
        Some(existing) => merge([existing, &incoming]),
        None => incoming,
    };
    mark_at(&set(err, KvKey, kv), location)
}

/// The bag embedded by [`err_with_kv`], plus `"err"` and `"source"`.
///
/// `"err"` is always the error's current message, replacing any `"err"` the
/// bag carried. `"source"` is the marked line, unless the bag already defines
/// `"source"`. An error with no bag yields just those two keys (or only
/// `"err"` if it was never marked).
pub fn err_kv(err: &SharedError) -> KV {
    let mut kv = attached(err).cloned().unwrap_or_default();
    kv.insert(ERR_KEY, err.to_string());
    if kv.get(SOURCE_KEY).map_or(true, Value::is_null) {
        if let Some(line) = line(err) {
            kv.insert(SOURCE_KEY, line);
        }
    }
    kv
}

/// The bag embedded by [`err_with_kv`], without the derived keys.
pub fn attached(err: &SharedError) -> Option<&KV> {
    get::<_, KV>(err, &KvKey)
}
