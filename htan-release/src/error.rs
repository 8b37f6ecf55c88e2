//! Error types for htan-release
//!
//! Checker findings are data, not errors. `ReleaseError` covers what stops a
//! run: fatal schema violations, unreadable inputs and failing collaborators.

use crate::models::Component;
use thiserror::Error;

/// Run-level error type
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// Required column absent from a Level-1/Auxiliary manifest
    #[error("{column} is missing from DependsOn for manifest {manifest_id} ({component})")]
    SchemaViolation {
        manifest_id: String,
        component: Component,
        column: String,
    },

    /// Storage backend failure (children lookup, listing)
    #[error("Storage error: {0}")]
    Storage(String),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Ticket sink failure
    #[error("Ticket error: {0}")]
    Ticket(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// htan-common error
    #[error("Common error: {0}")]
    Common(#[from] htan_common::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReleaseError {
    /// Whether the error aborts the run before anything is published
    pub fn is_schema_violation(&self) -> bool {
        matches!(self, ReleaseError::SchemaViolation { .. })
    }
}

impl From<sqlx::Error> for ReleaseError {
    fn from(err: sqlx::Error) -> Self {
        ReleaseError::Common(htan_common::Error::Database(err))
    }
}

/// Result type for release operations
pub type ReleaseResult<T> = Result<T, ReleaseError>;
