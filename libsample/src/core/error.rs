//! Objects related to reporting errors from this library

use std::time::Duration;

/// The closed set of error categories that callers of this library need to
/// distinguish when deciding what to report to a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The requested entity does not exist or has been deleted
    NotFound,
    /// A uniqueness or referential constraint was violated
    Conflict,
    /// The input was rejected before or by the database
    Validation,
    /// Any other failure. Details should not be shown to clients.
    Internal,
}

/// A list of error types that can occur within this library
#[derive(thiserror::Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("resource '{resource}' with id {id} was not found")]
    ResourceNotFound { id: i64, resource: String },

    #[error("invalid data: {0}")]
    InvalidData(String),

    #[error("can't insert the object, it already exists in the database with id = {}", .0)]
    InvalidInsertObjectAlreadyExists(i64),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("operation did not complete within {0:?}")]
    Timeout(Duration),

    #[error("Database error: row not found")]
    DatabaseRowNotFound(#[source] sqlx::Error),

    #[error("Database error: conflicting data")]
    DatabaseConflict(#[source] sqlx::Error),

    #[error("Database error: constraint violation")]
    DatabaseConstraint(#[source] sqlx::Error),

    #[error("Database error: unspecified")]
    DatabaseUnspecified(#[source] sqlx::Error),
}

impl Error {
    /// Construct a not-found error for a specific resource
    pub fn not_found(id: i64, resource: impl Into<String>) -> Self {
        Self::ResourceNotFound {
            id,
            resource: resource.into(),
        }
    }

    /// Classify this error into one of the domain error kinds
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::ResourceNotFound { .. } | Error::DatabaseRowNotFound(_) => ErrorKind::NotFound,
            Error::DatabaseConflict(_) => ErrorKind::Conflict,
            Error::InvalidData(_)
            | Error::InvalidInsertObjectAlreadyExists(_)
            | Error::DatabaseConstraint(_) => ErrorKind::Validation,
            Error::InvalidState(_) | Error::Timeout(_) | Error::DatabaseUnspecified(_) => {
                ErrorKind::Internal
            }
        }
    }
}

// The generic normalizer. Call sites that can attach more context (e.g. the
// id of a missing row) must check for that case before falling back to this.
impl std::convert::From<sqlx::Error> for Error {
    fn from(value: sqlx::Error) -> Self {
        use sqlx::error::ErrorKind as DbKind;

        let dbkind = match &value {
            sqlx::Error::RowNotFound => return Self::DatabaseRowNotFound(value),
            sqlx::Error::Database(dberr) => dberr.kind(),
            _ => return Self::DatabaseUnspecified(value),
        };
        match dbkind {
            DbKind::UniqueViolation | DbKind::ForeignKeyViolation => Self::DatabaseConflict(value),
            DbKind::NotNullViolation | DbKind::CheckViolation => Self::DatabaseConstraint(value),
            _ => Self::DatabaseUnspecified(value),
        }
    }
}

/// A convenience type alias for a [Result] with [Error] as its error type
pub type Result<T, E = Error> = std::result::Result<T, E>;
