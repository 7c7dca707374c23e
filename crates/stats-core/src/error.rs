use std::path::PathBuf;
use thiserror::Error;

/// All errors produced by the access-log statistics crates.
///
/// A line that does not match the log grammar is not an error; the parser
/// reports it as `None` and the line is skipped.
#[derive(Error, Debug)]
pub enum StatsError {
    /// The input log could not be opened or a line could not be read.
    #[error("Failed to read log source {path}: {source}")]
    SourceUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No line of the input matched the grammar, so no summary exists.
    #[error("No valid log entries found")]
    EmptyResult,

    /// A parsed record could not be written to the record store.
    #[error("Failed to write record store {path}: {source}")]
    Sink {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The report file could not be written.
    #[error("Failed to write report {path}: {source}")]
    Report {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value could not be serialized to JSON.
    #[error("Failed to serialize JSON: {0}")]
    Serialize(#[from] serde_json::Error),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Pass-through for any raw I/O error that does not carry a path.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenience alias used throughout the stats crates.
pub type Result<T> = std::result::Result<T, StatsError>;
