//! Error types for scenario configuration and server lifecycle.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while configuring or running the mock server.
///
/// Per-request failures are not represented here: they resolve to a
/// [`MockResult`](crate::MockResult) with a `400`/`404` status instead.
#[derive(Debug, Error)]
pub enum MockServerError {
    /// The configuration defines no scenarios at all.
    #[error("No scenarios defined")]
    NoScenarios,

    /// Two scenarios share the same id.
    #[error("Scenario id \"{0}\" is defined more than once")]
    DuplicateScenario(String),

    /// Following `extend` from a scenario revisits a scenario already in its chain.
    #[error("Scenario \"{scenario}\" has a cyclic extend chain through \"{repeated}\"")]
    ExtendCycle { scenario: String, repeated: String },

    /// The context cache was asked for a capacity of zero.
    #[error("size must be a positive integer")]
    InvalidCapacity,

    /// A mock path could not be compiled into a matcher.
    #[error("Invalid path pattern '{pattern}': {source}")]
    InvalidPath {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// The scenario file could not be read.
    #[error("Failed to read scenario file '{path}': {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The scenario file is not valid.
    #[error("Failed to parse scenario file: {0}")]
    ConfigParse(#[from] serde_json::Error),

    /// Binding or serving the HTTP listener failed.
    #[error("Server I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for mock server operations.
pub type Result<T> = core::result::Result<T, MockServerError>;
