//! Error types
//!
//! Extraction itself never fails: a miss is an empty string. These errors cover
//! the collaborators around the engine (record store, export, configuration).

use thiserror::Error;

/// Errors reported by a [`crate::store::RecordStore`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// No record carries the requested id.
    #[error("record with id {0} not found")]
    NotFound(u64),

    /// The backing storage is unusable (poisoned lock, closed database, ...).
    #[error("record store unavailable: {0}")]
    Unavailable(String),
}

/// Errors raised while exporting records.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to serialize records: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("failed to write CSV: {0}")]
    Csv(#[from] csv::Error),

    #[error("export is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),

    #[error("failed to write export file: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised while loading an [`crate::config::EngineConfig`].
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    /// A value parsed but is outside its allowed range.
    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}
