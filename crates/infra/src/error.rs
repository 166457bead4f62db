//! Infrastructure and service error types.

use thiserror::Error;

use stockroom_auth::AuthzError;
use stockroom_core::{DomainError, Resource};

pub type StoreResult<T> = Result<T, StoreError>;

/// Failure reported by a storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    /// The row changed since it was read (stale version or status).
    #[error("concurrent modification: {0}")]
    Conflict(String),
    /// A unique key is already taken.
    #[error("duplicate: {0}")]
    Duplicate(String),
    #[error("{0} not found")]
    NotFound(Resource),
    /// Connection, lock, or decoding failure.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Error returned by every service operation.
///
/// Each variant is a value the caller is expected to surface to the user;
/// nothing in the service layer panics or swallows a refused operation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ServiceError {
    /// A referenced request, item or user does not exist.
    #[error("{0} not found")]
    NotFound(Resource),
    /// The request is not in a status that allows the operation.
    #[error("{0}")]
    InvalidTransition(String),
    /// Approval with nothing left on the shelf.
    #[error("'{0}' is out of stock")]
    InsufficientQuantity(String),
    /// The caller's token does not map to a registered user.
    #[error("identity could not be resolved")]
    IdentityUnresolved,
    /// Lost a race with another writer (or a duplicate key); nothing was written.
    #[error("conflict: {0}")]
    Conflict(String),
    /// Input failed validation.
    #[error("validation failed: {0}")]
    Validation(String),
    /// A domain invariant would be broken.
    #[error("invariant violated: {0}")]
    InvariantViolation(String),
    /// The caller lacks the permission for this operation.
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),
    /// Backend failure.
    #[error(transparent)]
    Store(StoreError),
}

impl From<DomainError> for ServiceError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::Validation(msg) => ServiceError::Validation(msg),
            DomainError::InvalidId(msg) => ServiceError::Validation(msg),
            DomainError::InvariantViolation(msg) => ServiceError::InvariantViolation(msg),
            DomainError::NotFound(resource) => ServiceError::NotFound(resource),
            DomainError::InvalidTransition(msg) => ServiceError::InvalidTransition(msg),
            DomainError::InsufficientQuantity(title) => ServiceError::InsufficientQuantity(title),
            DomainError::IdentityUnresolved => ServiceError::IdentityUnresolved,
            DomainError::Conflict(msg) => ServiceError::Conflict(msg),
        }
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(msg) | StoreError::Duplicate(msg) => ServiceError::Conflict(msg),
            StoreError::NotFound(resource) => ServiceError::NotFound(resource),
            other @ StoreError::Storage(_) => ServiceError::Store(other),
        }
    }
}

impl From<AuthzError> for ServiceError {
    fn from(value: AuthzError) -> Self {
        match value {
            AuthzError::Forbidden(perm) => ServiceError::Forbidden(perm),
        }
    }
}
