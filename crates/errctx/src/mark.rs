//! Recording where an error was first noticed.
//!
//! Marking stores a `"<file>:<line>"` string on the error under a private
//! key. The first mark wins; marking an already-marked error returns it
//! unchanged.

use std::panic::Location;

use tracing::trace;

use crate::decorate::{get, set};
use crate::error::SharedError;
use crate::site::{self, CallSite};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct SourceKey;

/// Record the file and line that called `mark` on the error.
///
/// Later calls to `mark` (or any other marking function) on the returned
/// error do not overwrite the recorded line.
#[track_caller]
pub fn mark(err: &SharedError) -> SharedError {
    mark_at(err, Location::caller())
}

/// Like [`mark`], skipping `skip` additional frames.
///
/// `skip == 0` records the caller of `mark_skip` (through `#[track_caller]`
/// chains). A non-zero skip walks the real stack: `1` records the caller of
/// the function that called `mark_skip`, and so on. The walk needs the
/// `backtrace` feature and line tables in the binary (`debug =
/// "line-tables-only"` or more, symbols not stripped). If the stack cannot be
/// resolved the error is returned unmarked.
#[track_caller]
#[inline(never)]
pub fn mark_skip(err: &SharedError, skip: usize) -> SharedError {
    if skip == 0 || line(err).is_some() {
        return mark_at(err, Location::caller());
    }
    mark_resolved(err, skip, site::resolve(skip))
}

/// Record a site found by `site::resolve`, or leave `err` unmarked.
pub(crate) fn mark_resolved(err: &SharedError, skip: usize, site: Option<CallSite>) -> SharedError {
    match site {
        Some(site) => record(err, site),
        None => {
            trace!(skip, "call site could not be resolved, leaving error unmarked");
            err.clone()
        }
    }
}

/// Mark the error with an explicit location.
///
/// This is what `#[track_caller]` wrappers use to forward their caller's
/// location.
pub fn mark_at(err: &SharedError, location: &Location<'_>) -> SharedError {
    if line(err).is_some() {
        return err.clone();
    }
    record(err, CallSite::from_location(location))
}

/// The `"<file>:<line>"` recorded by the first mark, if any.
pub fn line(err: &SharedError) -> Option<&str> {
    get::<_, String>(err, &SourceKey).map(String::as_str)
}

fn record(err: &SharedError, site: CallSite) -> SharedError {
    set(err, SourceKey, site.to_string())
}
