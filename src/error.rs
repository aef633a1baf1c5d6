//! Error types for persona-rates

use thiserror::Error;

/// Result type alias for persona-rates operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for persona-rates
#[derive(Debug, Error)]
pub enum Error {
    /// The completion service answered with an error or an unusable body
    #[error("Completion service error: {0}")]
    Completion(String),

    /// HTTP request error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Error while loading layered configuration
    #[error("Configuration source error: {0}")]
    ConfigSource(#[from] config::ConfigError),

    /// A table file could not be read back
    #[error("Malformed table {path} at line {line}: {reason}")]
    MalformedTable {
        /// File being read
        path: String,
        /// 1-based line where the bad row starts
        line: usize,
        /// What was wrong with the row
        reason: String,
    },

    /// Storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a completion service error
    pub fn completion(msg: impl Into<String>) -> Self {
        Self::Completion(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a malformed table error
    pub fn malformed_table(
        path: impl Into<String>,
        line: usize,
        reason: impl Into<String>,
    ) -> Self {
        Self::MalformedTable {
            path: path.into(),
            line,
            reason: reason.into(),
        }
    }

    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_malformed_table_message() {
        let err = Error::malformed_table("profiles.csv", 7, "invalid Age \"old\"");
        assert_eq!(
            err.to_string(),
            "Malformed table profiles.csv at line 7: invalid Age \"old\""
        );
        assert!(matches!(err, Error::MalformedTable { line: 7, .. }));
    }
}
