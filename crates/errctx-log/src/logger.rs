use std::sync::Arc;

use errctx::{ctx_kv, err_kv, Context, SharedError, ERR_KEY, SOURCE_KEY};
use errctx_kv::{merge, KV};

use crate::config::{Level, LogConfig};
use crate::error::{LogError, Result};
use crate::sink::{LogRecord, LogSink, TracingSink};

/// Flattens request context and error context into records for a sink.
#[derive(Clone)]
pub struct Logger {
    config: LogConfig,
    sink: Arc<dyn LogSink>,
}

impl Logger {
    pub fn new(config: LogConfig, sink: Arc<dyn LogSink>) -> Self {
        Self { config, sink }
    }

    /// A logger writing to [`TracingSink`].
    pub fn tracing(config: LogConfig) -> Self {
        Self::new(config, Arc::new(TracingSink))
    }

    pub fn config(&self) -> &LogConfig {
        &self.config
    }

    /// Log `err` at error level.
    ///
    /// The record carries `ctx_kv(ctx)` merged with `err_kv(err)`; pairs
    /// from the error win. The message is reported under the configured
    /// message key.
    pub fn error(&self, ctx: &Context, err: &SharedError) {
        self.log_err(Level::Error, ctx, err);
    }

    /// Log `err` at warn level.
    pub fn warn(&self, ctx: &Context, err: &SharedError) {
        self.log_err(Level::Warn, ctx, err);
    }

    /// Log a plain message with the context's pairs plus `extra`.
    pub fn log(&self, level: Level, ctx: &Context, message: &str, extra: &KV) {
        if !self.config.enabled(level) {
            return;
        }
        let kv = merge([&ctx_kv(ctx), extra]);
        self.sink.emit(&LogRecord::new(level, message, kv));
    }

    fn log_err(&self, level: Level, ctx: &Context, err: &SharedError) {
        if !self.config.enabled(level) {
            return;
        }
        let mut kv = merge([&ctx_kv(ctx), &err_kv(err)]);
        let message = err.to_string();
        if self.config.message_key != ERR_KEY {
            kv.remove(ERR_KEY);
            kv.insert(self.config.message_key.as_str(), message.as_str());
        }
        if !self.config.include_source {
            kv.remove(SOURCE_KEY);
        }
        self.sink.emit(&LogRecord::new(level, message, kv));
    }
}

impl std::fmt::Debug for Logger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Logger")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Install a global `tracing-subscriber` fmt subscriber at the configured
/// level.
///
/// Fails if a global subscriber is already set.
pub fn init_tracing(config: &LogConfig) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::from(config.level))
        .try_init()
        .map_err(|e| LogError::Subscriber(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use errctx::{ctx_with_kv, err_with_kv, kv, mark, msg};

    fn logger(config: LogConfig) -> (Logger, Arc<crate::sink::MemorySink>) {
        let sink = Arc::new(crate::sink::MemorySink::new());
        (Logger::new(config, sink.clone()), sink)
    }

    #[test]
    fn error_merges_context_and_error_pairs() {
        let (logger, sink) = logger(LogConfig::default());
        let ctx = ctx_with_kv(&Context::background(), [&kv! { "req" => "r1", "user" => "ctx" }]);
        let (err, ln) = (err_with_kv(&msg("boom"), [&kv! { "user" => "err" }]), line!());

        logger.error(&ctx, &err);

        let records = sink.records().unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].level, Level::Error);
        assert_eq!(records[0].message, "boom");
        assert_eq!(
            records[0].kv,
            kv! {
                "req" => "r1",
                "user" => "err",
                "err" => "boom",
                "source" => format!("logger.rs:{ln}"),
            }
        );
    }

    #[test]
    fn custom_message_key_replaces_err() {
        let (logger, sink) = logger(LogConfig {
            message_key: "error".into(),
            ..Default::default()
        });
        logger.error(&Context::background(), &msg("boom"));

        let kv = &sink.records().unwrap()[0].kv;
        assert!(!kv.contains_key("err"));
        assert_eq!(kv["error"], "boom");
    }

    #[test]
    fn source_can_be_dropped() {
        let (logger, sink) = logger(LogConfig {
            include_source: false,
            ..Default::default()
        });
        logger.error(&Context::background(), &mark(&msg("boom")));

        assert_eq!(sink.records().unwrap()[0].kv, kv! { "err" => "boom" });
    }

    #[test]
    fn records_below_level_are_dropped() {
        let (logger, sink) = logger(LogConfig {
            level: Level::Error,
            ..Default::default()
        });
        let ctx = Context::background();
        logger.warn(&ctx, &msg("minor"));
        logger.log(Level::Info, &ctx, "hello", &KV::new());
        assert!(sink.is_empty());

        logger.error(&ctx, &msg("major"));
        assert_eq!(sink.len(), 1);
    }

    #[test]
    fn log_merges_extra_over_context() {
        let (logger, sink) = logger(LogConfig::default());
        let ctx = ctx_with_kv(&Context::background(), [&kv! { "req" => "r1", "step" => 1 }]);
        logger.log(Level::Info, &ctx, "progress", &kv! { "step" => 2 });

        let record = &sink.records().unwrap()[0];
        assert_eq!(record.message, "progress");
        assert_eq!(record.kv, kv! { "req" => "r1", "step" => 2 });
    }

    #[test]
    fn init_tracing_installs_once() {
        let config = LogConfig::default();
        init_tracing(&config).unwrap();
        assert!(matches!(
            init_tracing(&config),
            Err(LogError::Subscriber(_))
        ));
        Logger::tracing(config).error(&Context::background(), &msg("visible"));
    }
}
