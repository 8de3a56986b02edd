//! Error types for the Sedge library.
//!
//! All fallible operations return [`Result`], whose error type is the
//! [`SedgeError`] enum. The variants form the engine's error taxonomy:
//! recoverable index-lifecycle conditions ([`SedgeError::EmptyIndex`]),
//! programmer errors at API boundaries ([`SedgeError::InvalidArgument`],
//! [`SedgeError::Immutable`], [`SedgeError::UnknownId`]), pipeline invariant
//! violations ([`SedgeError::Logic`]) and unclassified backend failures
//! ([`SedgeError::Unknown`]).
//!
//! # Examples
//!
//! ```
//! use sedge::error::{Result, SedgeError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(SedgeError::invalid_argument("bad criteria shape"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Sedge operations.
#[derive(Error, Debug)]
pub enum SedgeError {
    /// Programmer error at an API boundary (unknown table key, bad criteria shape).
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Mutation attempted on a frozen result set.
    #[error("Result set is frozen: {0}")]
    Immutable(String),

    /// External id missing from the index or from a result set.
    #[error("Unknown id: {0}")]
    UnknownId(String),

    /// The index schema is absent or has an outdated shape.
    ///
    /// Signalled by "unknown table" / "unknown column" conditions from the
    /// storage backend. The indexer recovers from this by erasing and
    /// retrying once when auto-erase is enabled.
    #[error("Index schema is missing or stale: {0}")]
    EmptyIndex(String),

    /// Pipeline invariant violation: a programming mistake, not a
    /// recoverable condition.
    #[error("Logic error: {0}")]
    Logic(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Any backend error not matched by a domain kind.
    #[error("Unknown error: {0}")]
    Unknown(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with [`SedgeError`].
pub type Result<T> = std::result::Result<T, SedgeError>;

impl SedgeError {
    /// Create a new invalid-argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        SedgeError::InvalidArgument(msg.into())
    }

    /// Create a new immutable-result-set error.
    pub fn immutable<S: Into<String>>(msg: S) -> Self {
        SedgeError::Immutable(msg.into())
    }

    /// Create a new unknown-id error.
    pub fn unknown_id<S: Into<String>>(msg: S) -> Self {
        SedgeError::UnknownId(msg.into())
    }

    /// Create a new empty-index error.
    pub fn empty_index<S: Into<String>>(msg: S) -> Self {
        SedgeError::EmptyIndex(msg.into())
    }

    /// Create a new logic error.
    pub fn logic<S: Into<String>>(msg: S) -> Self {
        SedgeError::Logic(msg.into())
    }

    /// Create a new unknown error from a plain message.
    pub fn unknown<S: Into<String>>(msg: S) -> Self {
        SedgeError::Unknown(anyhow::anyhow!(msg.into()))
    }

    /// Whether this error indicates a missing or stale schema.
    pub fn is_empty_index(&self) -> bool {
        matches!(self, SedgeError::EmptyIndex(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = SedgeError::invalid_argument("bad key");
        assert_eq!(error.to_string(), "Invalid argument: bad key");

        let error = SedgeError::empty_index("no such table: toc");
        assert!(error.is_empty_index());

        let error = SedgeError::immutable("add_word_weight after freeze");
        assert_eq!(
            error.to_string(),
            "Result set is frozen: add_word_weight after freeze"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error = SedgeError::from(io_error);

        match error {
            SedgeError::Io(_) => {}
            _ => panic!("Expected IO error variant"),
        }
    }

    #[test]
    fn test_unknown_wraps_anyhow() {
        let error = SedgeError::unknown("driver exploded");
        assert!(!error.is_empty_index());
        assert!(error.to_string().contains("driver exploded"));
    }
}
