//! Shared error handle and the plain message error.

use std::error::Error as StdError;
use std::sync::Arc;

use thiserror::Error;

/// A shared, immutable handle to any error.
///
/// Every operation in this crate takes and returns `SharedError`. Identity is
/// the `Arc` allocation: two handles refer to "the same error" when they
/// point at the same allocation.
pub type SharedError = Arc<dyn StdError + Send + Sync + 'static>;

/// An error that is nothing but a message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct Message(String);

impl Message {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Create a new base error carrying only `text`.
///
/// Each call allocates a distinct error: `msg("x")` and `msg("x")` render
/// the same text but are not the same error.
pub fn msg(text: impl Into<String>) -> SharedError {
    Arc::new(Message::new(text))
}

/// Move any error behind a [`SharedError`] handle.
pub fn share<E>(err: E) -> SharedError
where
    E: StdError + Send + Sync + 'static,
{
    Arc::new(err)
}
