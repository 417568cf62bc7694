//! Error types for project analysis

use thiserror::Error;

/// Result type for analysis operations
pub type Result<T> = std::result::Result<T, AnalysisError>;

/// Project analysis errors
///
/// Only top-level input problems are errors. Missing optional fields,
/// dangling dependency references, unparsable dates, and dependency cycles
/// are corrected to documented defaults instead of failing the analysis.
#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("No tasks found in project document")]
    EmptyTaskList,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
