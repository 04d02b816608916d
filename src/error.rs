//! Error types for sqlweave.

use thiserror::Error;

/// The main error type for mapping operations.
#[derive(Debug, Error)]
pub enum MapperError {
    /// Invalid statement definition: unsupported tag, missing required
    /// attribute, duplicate or missing statement id. Surfaced at
    /// registration time, never per invocation.
    #[error("invalid statement definition: {0}")]
    Definition(String),

    /// Template compile or execute failure (unresolved variable, malformed
    /// test or iteration expression). Propagated verbatim.
    #[error("template error: {0}")]
    Template(#[from] minijinja::Error),

    /// Destination value's shape does not match the declared result type.
    #[error("destination shape mismatch: expected {expected}, {actual}")]
    ShapeMismatch {
        expected: &'static str,
        actual: String,
    },

    /// A singular result shape received more than one row.
    #[error("query returned {0} rows, singular result shapes accept at most one")]
    TooManyRows(usize),

    /// A scalar result received more than one column.
    #[error("query returned {0} columns, a scalar result accepts exactly one")]
    TooManyColumns(usize),

    /// Failure surfaced by the underlying driver, passed through unchanged.
    #[error("driver error: {0}")]
    Driver(#[from] sqlx::Error),

    /// Row or destination (de)serialization failure.
    #[error("decode error: {0}")]
    Decode(String),
}

impl MapperError {
    /// Create a statement definition error.
    pub fn definition(message: impl Into<String>) -> Self {
        Self::Definition(message.into())
    }
}

/// Result type alias for mapping operations.
pub type MapperResult<T> = Result<T, MapperError>;
