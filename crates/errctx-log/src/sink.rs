//! Destinations for flattened log records.
//!
//! A [`LogSink`] receives fully assembled [`LogRecord`]s. [`TracingSink`]
//! forwards them as `tracing` events; [`MemorySink`] keeps them in memory
//! for assertions in tests.

use std::sync::RwLock;

use errctx_kv::KV;

use crate::config::Level;
use crate::error::{LogError, Result};

/// One structured log line.
#[derive(Clone, Debug, PartialEq)]
pub struct LogRecord {
    pub level: Level,
    pub message: String,
    pub kv: KV,
}

impl LogRecord {
    pub fn new(level: Level, message: impl Into<String>, kv: KV) -> Self {
        Self {
            level,
            message: message.into(),
            kv,
        }
    }

    /// The record's pairs as `key=value` separated by spaces, sorted by key.
    pub fn render_pairs(&self) -> String {
        self.kv
            .string_pairs()
            .into_iter()
            .map(|(k, v)| format!("{k}=\"{v}\""))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A destination for log records.
pub trait LogSink: Send + Sync {
    fn emit(&self, record: &LogRecord);
}

/// Forwards records to the current `tracing` subscriber.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn emit(&self, record: &LogRecord) {
        let kv = record.render_pairs();
        let message = record.message.as_str();
        match record.level {
            Level::Error => tracing::error!(kv = %kv, "{message}"),
            Level::Warn => tracing::warn!(kv = %kv, "{message}"),
            Level::Info => tracing::info!(kv = %kv, "{message}"),
            Level::Debug => tracing::debug!(kv = %kv, "{message}"),
            Level::Trace => tracing::trace!(kv = %kv, "{message}"),
        }
    }
}

/// Collects records in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: RwLock<Vec<LogRecord>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A snapshot of every record emitted so far.
    pub fn records(&self) -> Result<Vec<LogRecord>> {
        let records = self
            .records
            .read()
            .map_err(|e| LogError::Poisoned(e.to_string()))?;
        Ok(records.clone())
    }

    pub fn len(&self) -> usize {
        match self.records.read() {
            Ok(records) => records.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every collected record.
    pub fn clear(&self) -> Result<()> {
        self.records
            .write()
            .map_err(|e| LogError::Poisoned(e.to_string()))?
            .clear();
        Ok(())
    }
}

impl LogSink for MemorySink {
    fn emit(&self, record: &LogRecord) {
        match self.records.write() {
            Ok(mut records) => records.push(record.clone()),
            Err(poisoned) => poisoned.into_inner().push(record.clone()),
        }
    }
}
