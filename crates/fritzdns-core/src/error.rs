//! Error types for the fritzdns core
//!
//! None of these ever reach a query client: fetch failures stay inside the
//! poller, and the responder only ever answers or delegates.

use thiserror::Error;

/// Result type alias for fritzdns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type
#[derive(Error, Debug)]
pub enum Error {
    /// The inventory backend could not be reached or queried
    #[error("Inventory error ({address}): {message}")]
    Inventory {
        /// Address of the source that failed
        address: String,
        /// Underlying cause
        message: String,
    },

    /// A fetch did not complete within the configured bound
    #[error("Inventory fetch timed out after {0}s")]
    Timeout(u64),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O errors (file-backed inventories)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an inventory (fetch) error for the given source address
    pub fn inventory(address: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Inventory {
            address: address.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether this error came from talking to an inventory backend
    pub fn is_fetch_failure(&self) -> bool {
        matches!(self, Self::Inventory { .. } | Self::Timeout(_) | Self::Io(_) | Self::Json(_))
    }
}

/// Inventory clients written against anyhow can hand their errors straight back
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inventory_error_names_address() {
        let err = Error::inventory("192.168.178.1", "connection refused");
        assert_eq!(
            err.to_string(),
            "Inventory error (192.168.178.1): connection refused"
        );
        assert!(err.is_fetch_failure());
        assert!(!Error::config("bad").is_fetch_failure());
    }
}
