/// Errors raised while configuring logging.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    /// The configuration text is not valid TOML for [`LogConfig`](crate::LogConfig).
    #[error("invalid log config: {0}")]
    Config(#[from] toml::de::Error),

    /// A level name outside `error`, `warn`, `info`, `debug`, `trace`.
    #[error("unknown log level: {0:?}")]
    InvalidLevel(String),

    /// A global subscriber could not be installed.
    #[error("tracing subscriber: {0}")]
    Subscriber(String),

    /// A sink's lock was poisoned by a panicking writer.
    #[error("sink lock poisoned: {0}")]
    Poisoned(String),
}

/// Convenience result type for logging operations.
pub type Result<T> = std::result::Result<T, LogError>;
