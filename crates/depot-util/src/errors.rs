use miette::Diagnostic;
use thiserror::Error;

/// Unified error type for all depot operations.
#[derive(Debug, Error, Diagnostic)]
pub enum DepotError {
    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A requested or reachable coordinate does not exist in the store.
    #[error("Dependency not found: {coordinate}")]
    #[diagnostic(help("The coordinate may still be ingesting; retry once it is available"))]
    NotFound { coordinate: String },

    /// A coordinate was explicitly excluded; any closure reaching it is invalid.
    #[error("Coordinate {coordinate} is excluded: {reason}")]
    Excluded { coordinate: String, reason: String },

    /// The coordinate is evicted and a restore has been requested.
    #[error("Coordinate {coordinate} is temporarily unavailable")]
    #[diagnostic(help("A restore has been requested; retry later"))]
    TransientUnavailable { coordinate: String },

    /// A stored transitive dependency report is marked invalid.
    #[error("Transitive dependency report for {coordinate} is invalid")]
    InvalidClosure { coordinate: String },

    /// Reading or writing the coordinate store failed.
    #[error("Store error: {message}")]
    Store { message: String },

    /// Invalid or unreadable configuration.
    #[error("Configuration error: {message}")]
    #[diagnostic(help("Check ~/.depot/config.toml for syntax errors"))]
    Config { message: String },

    /// Catch-all for miscellaneous errors.
    #[error("{message}")]
    Generic { message: String },
}

impl DepotError {
    pub fn not_found(coordinate: impl ToString) -> Self {
        Self::NotFound {
            coordinate: coordinate.to_string(),
        }
    }

    /// Whether the caller may succeed by retrying once external state changes.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::TransientUnavailable { .. }
        )
    }
}

/// Convenience alias for `miette::Result<T>`.
pub type DepotResult<T> = miette::Result<T>;
