//! Structured context for errors and requests.
//!
//! `errctx` lets code attach key/value context to errors as they travel up
//! the call stack, without changing how those errors render or compare. A
//! log sink at the top then pulls everything back out as one flat [`KV`] bag.
//!
//! Every operation is immutable: decorating an error or a [`Context`] returns
//! a new handle and leaves the input untouched, so handles can be shared
//! freely across threads.
//!
//! # Modules
//!
//! - [`error`]: The [`SharedError`] handle and the plain [`Message`] error
//! - [`decorate`]: Opaque-keyed values on errors: [`set`], [`get`], [`base`]
//! - [`chain`]: Walking `source()` chains and identity checks with [`is`]
//! - [`site`]: [`CallSite`] capture for marking
//! - [`mark`](mod@mark): Recording where an error was first noticed
//! - [`bridge`]: [`KV`] bags on errors: [`err_with_kv`], [`err_kv`]
//! - [`context`]: Request-scoped [`Context`] and [`ctx_with_kv`], [`ctx_kv`]
//! - [`ext`]: The [`Annotate`] extension trait for `Result` and `Option`
//!
//! # Example
//!
//! ```rust
//! use errctx::{err_kv, err_with_kv, is, kv, msg};
//!
//! let not_found = msg("not found");
//! let err = err_with_kv(&not_found, [&kv! { "user" => "ann" }]);
//!
//! assert_eq!(err.to_string(), "not found");
//! assert!(is(&*err, &*not_found));
//!
//! let fields = err_kv(&err);
//! assert_eq!(fields["user"], "ann");
//! assert_eq!(fields["err"], "not found");
//! assert!(fields.contains_key("source"));
//! ```

pub mod bridge;
pub mod chain;
pub mod context;
pub mod decorate;
pub mod error;
pub mod ext;
pub mod mark;
pub mod site;
mod store;

pub use bridge::{attached, err_kv, err_with_kv, ERR_KEY, SOURCE_KEY};
pub use chain::is;
pub use context::{ctx_kv, ctx_with_kv, Context};
pub use decorate::{base, get, set, set_pairs, Decorated, Pairs};
pub use error::{msg, share, Message, SharedError};
pub use ext::Annotate;
pub use mark::{line, mark, mark_at, mark_skip};
pub use site::CallSite;
pub use store::ContextKey;

pub use errctx_kv::{kv, merge, Value, KV};
