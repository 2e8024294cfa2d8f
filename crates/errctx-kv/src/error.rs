use thiserror::Error;

/// Errors produced when converting values in and out of a [`KV`](crate::KV).
#[derive(Debug, Error)]
pub enum KvError {
    /// The key is not present in the bag.
    #[error("key not found: {key}")]
    MissingKey { key: String },

    /// The stored value could not be decoded into the requested type.
    #[error("value for key {key} has unexpected shape: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    /// The value could not be encoded into a [`Value`](crate::Value).
    #[error("value for key {key} could not be encoded: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Convenience type alias for KV conversions.
pub type Result<T> = std::result::Result<T, KvError>;
