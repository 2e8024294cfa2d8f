//! Copy-on-write key/value bags for error and request context.
//!
//! A [`KV`] is a small, sorted map from string keys to JSON-like values. It
//! is the unit of structured context in `errctx`: bags are attached to
//! errors and request contexts, merged as they travel up the call stack, and
//! finally rendered into string pairs for a structured log sink.
//!
//! # Modules
//!
//! - [`kv`]: The [`KV`] type and [`merge`]
//! - [`render`]: Textual rendering of values for log sinks
//! - [`error`]: Conversion errors for typed access
//!
//! # Example
//!
//! ```rust
//! use errctx_kv::{kv, merge};
//!
//! let base = kv! { "user" => "ann", "attempt" => 1 };
//! let retry = kv! { "attempt" => 2 };
//!
//! let merged = merge([&base, &retry]);
//! assert_eq!(merged["attempt"], 2);
//! assert_eq!(
//!     merged.string_pairs(),
//!     vec![
//!         ("attempt".to_string(), "2".to_string()),
//!         ("user".to_string(), "ann".to_string()),
//!     ]
//! );
//! ```

pub mod error;
pub mod kv;
pub mod render;

pub use error::{KvError, Result};
pub use kv::{merge, KV};
pub use serde_json::Value;

/// Build a [`KV`] from `key => value` pairs.
///
/// ```rust
/// use errctx_kv::kv;
///
/// let bag = kv! { "a" => "a", "n" => 3 };
/// assert_eq!(bag.len(), 2);
/// assert!(kv! {}.is_empty());
/// ```
#[macro_export]
macro_rules! kv {
    () => {
        $crate::KV::new()
    };
    ($($key:expr => $value:expr),+ $(,)?) => {{
        let mut kv = $crate::KV::new();
        $(
            kv.insert($key, $value);
        )+
        kv
    }};
}
