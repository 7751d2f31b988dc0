//! Backend collaborator errors.

use thiserror::Error;

/// Failure reported by a backend collaborator (document store, notification service).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RepositoryError {
    /// The requested document does not exist.
    #[error("document not found")]
    NotFound,

    /// The backend refused the request.
    #[error("request rejected: {0}")]
    Rejected(String),

    /// The backend could not be reached.
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}
