//! Error handling for cohort creation, comparison and concept hierarchies.

pub mod util;

use std::io;

use arrow::error::ArrowError;
use parquet::errors::ParquetError;

use crate::models::ConceptId;

/// Errors raised by the cohort pipeline and its collaborators
#[derive(Debug, thiserror::Error)]
pub enum CohortError {
    /// The read query against the clinical source failed
    #[error("Source query error: {0}")]
    SourceQuery(String),

    /// An insert into the analytic store failed
    #[error("Store write error: {0}")]
    StoreWrite(String),

    /// A read from the analytic store failed
    #[error("Store read error: {0}")]
    StoreRead(String),

    /// A source row lacks one of the columns the creation path requires
    #[error("Column '{column}' missing from source row {row}")]
    MissingColumn { column: String, row: usize },

    /// A source value could not be coerced to the expected type
    #[error("Invalid value in column '{column}': {message}")]
    InvalidValue { column: String, message: String },

    /// No cohort definition exists for the id
    #[error("Cohort {0} not found")]
    CohortNotFound(i64),

    /// Statistics requested for a variable outside the supported set
    #[error("Unsupported statistics variable: '{0}'")]
    UnsupportedVariable(String),

    /// Degenerate probability vectors passed to a distance computation
    #[error("Distance input error: {0}")]
    DistanceInput(String),

    /// The concept edge set is not acyclic
    #[error("Concept hierarchy contains a cycle through concept {0}")]
    HierarchyCycle(ConceptId),

    /// Arrow error
    #[error("Arrow error: {0}")]
    Arrow(#[from] ArrowError),

    /// Parquet error
    #[error("Parquet error: {0}")]
    Parquet(#[from] ParquetError),

    /// Error opening or reading a file
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error converting records to or from Arrow/JSON
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_arrow::Error> for CohortError {
    fn from(error: serde_arrow::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

impl From<serde_json::Error> for CohortError {
    fn from(error: serde_json::Error) -> Self {
        Self::Serialization(error.to_string())
    }
}

/// Result type for cohort operations
pub type Result<T> = std::result::Result<T, CohortError>;
