//! Structured logging for `errctx` context.
//!
//! A [`Logger`] pulls the [`KV`](errctx_kv::KV) bag out of a request
//! [`Context`](errctx::Context) and out of an error, merges them and hands
//! one flat [`LogRecord`] to a [`LogSink`].
//!
//! # Modules
//!
//! - [`config`]: [`LogConfig`] and [`Level`]
//! - [`sink`]: The [`LogSink`] trait, [`TracingSink`] and [`MemorySink`]
//! - [`logger`]: [`Logger`] and [`init_tracing`]
//! - [`error`]: Error types for configuration
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//!
//! use errctx::{ctx_with_kv, err_with_kv, kv, msg, Context};
//! use errctx_log::{LogConfig, Logger, MemorySink};
//!
//! let sink = Arc::new(MemorySink::new());
//! let logger = Logger::new(LogConfig::default(), sink.clone());
//!
//! let ctx = ctx_with_kv(&Context::background(), [&kv! { "req" => "r1" }]);
//! let err = err_with_kv(&msg("timeout"), [&kv! { "peer" => "db" }]);
//! logger.error(&ctx, &err);
//!
//! let record = &sink.records().unwrap()[0];
//! assert_eq!(record.kv["req"], "r1");
//! assert_eq!(record.kv["peer"], "db");
//! assert_eq!(record.kv["err"], "timeout");
//! ```

pub mod config;
pub mod error;
pub mod logger;
pub mod sink;

pub use config::{Level, LogConfig};
pub use error::{LogError, Result};
pub use logger::{init_tracing, Logger};
pub use sink::{LogRecord, LogSink, MemorySink, TracingSink};
