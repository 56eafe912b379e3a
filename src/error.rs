// error.rs - Error taxonomy shared by the model, centroid and statistics engines

use std::path::PathBuf;
use thiserror::Error;

/// Unified error type for all babelkit operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid parameter, rejected at construction time
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Frequency vector length does not match the model state count
    #[error("dimension mismatch: expected {expected} values, found {found}")]
    DimensionMismatch { expected: usize, found: usize },

    /// Eigensystem construction failed for the current generator
    #[error("numerical error: {0}")]
    Numerical(String),

    /// Malformed or empty alignment / tree input
    #[error("input format error: {0}")]
    InputFormat(String),

    /// File I/O failure, reported with the offending path
    #[error("failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Configuration(msg.into())
    }

    pub fn numerical(msg: impl Into<String>) -> Self {
        Error::Numerical(msg.into())
    }

    pub fn input(msg: impl Into<String>) -> Self {
        Error::InputFormat(msg.into())
    }

    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }

    /// True for errors raised while validating model or tool configuration.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Configuration(_) | Error::DimensionMismatch { .. }
        )
    }
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_is_configuration() {
        let err = Error::DimensionMismatch {
            expected: 4,
            found: 3,
        };
        assert!(err.is_configuration());
        assert_eq!(
            err.to_string(),
            "dimension mismatch: expected 4 values, found 3"
        );
        assert!(!Error::numerical("singular").is_configuration());
    }

    #[test]
    fn test_io_error_names_path() {
        let err = Error::io(
            "/no/such/trees.nex",
            std::io::Error::new(std::io::ErrorKind::NotFound, "missing"),
        );
        assert!(err.to_string().contains("/no/such/trees.nex"));
    }
}
