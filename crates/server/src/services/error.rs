//! Service error types.

use thiserror::Error;

use campus_core::ReferenceError;

use crate::db::RepositoryError;

/// Errors returned by the user, course and enrollment services.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Malformed input or an unresolved reference on a write.
    #[error("{0}")]
    Validation(String),

    /// The actor may not perform this action.
    #[error("{0}")]
    Authorization(String),

    /// A referenced entity does not exist.
    #[error("{0}")]
    NotFound(String),

    /// The student already has an enrollment in the course.
    #[error("student is already enrolled in this course")]
    AlreadyEnrolled,

    /// A uniqueness rule other than the enrollment pair was violated.
    #[error("{0}")]
    Conflict(String),

    /// Store failure.
    #[error("repository error: {0}")]
    Repository(#[from] RepositoryError),

    /// Password hashing failed.
    #[error("password hashing error")]
    PasswordHash,
}

impl From<ReferenceError> for ServiceError {
    fn from(err: ReferenceError) -> Self {
        Self::Validation(err.to_string())
    }
}

/// Result type alias for services.
pub type ServiceResult<T> = Result<T, ServiceError>;
