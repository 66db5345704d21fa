//! Error types for cigarmap
//!
//! Defines all error types used throughout the library. An unmapped query is
//! not an error; it is reported as `None` by the mapper.

use thiserror::Error;

/// Main error type for cigarmap operations
#[derive(Debug, Error)]
pub enum Error {
    /// Alignment construction errors
    #[error("Alignment error: {0}")]
    Cigar(#[from] CigarMapError),

    /// Table adapter errors
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors that can occur while building an alignment mapper
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CigarMapError {
    /// Direction must be 'F' or 'R'
    #[error("Invalid direction '{0}': valid values are 'F' or 'R'")]
    InvalidDirection(String),

    /// Axis selector must be 'read' or 'reference'
    #[error("Invalid axis '{0}': valid values are 'read' or 'reference'")]
    InvalidAxis(String),
}

/// Errors that can occur while reading alignment and query tables
#[derive(Debug, Error)]
pub enum TableError {
    /// Row has fewer columns than the table requires
    #[error("Too few fields at line {line}: expected at least {expected}, found {found}")]
    TooFewFields {
        line: usize,
        expected: usize,
        found: usize,
    },

    /// Failed to parse an integer column
    #[error("Invalid integer '{value}' for {field} at line {line}")]
    InvalidNumber {
        line: usize,
        field: &'static str,
        value: String,
    },

    /// Failed to parse a boolean column
    #[error("Invalid boolean '{value}' at line {line}")]
    InvalidBool { line: usize, value: String },

    /// Invalid UTF-8 in a row
    #[error("Invalid UTF-8 at line {0}")]
    InvalidUtf8(usize),

    /// Alignment id appears twice in the alignments table
    #[error("Duplicate alignment id '{id}' at line {line}")]
    DuplicateId { line: usize, id: String },

    /// Direction or axis error raised while building a mapper
    #[error(transparent)]
    Cigar(#[from] CigarMapError),

    /// Thread pool construction failed
    #[error("Failed to create thread pool: {0}")]
    ThreadPool(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for cigarmap operations
pub type Result<T> = std::result::Result<T, Error>;

/// Result type alias for mapper construction
pub type CigarResult<T> = std::result::Result<T, CigarMapError>;

/// Result type alias for table operations
pub type TableResult<T> = std::result::Result<T, TableError>;
