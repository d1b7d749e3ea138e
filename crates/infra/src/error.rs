//! Coarse error classification shared by the service layer.

use bazaar_core::DomainError;

/// How a service failure should be surfaced to a caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad input; retrying the same request cannot succeed.
    Validation,
    NotFound,
    /// Conflicts with current state (stock, order status).
    Conflict,
    /// Transient contention; the same request may succeed later.
    Unavailable,
    /// Store or backend failure.
    Internal,
}

impl ErrorKind {
    pub fn of_domain(e: &DomainError) -> Self {
        match e {
            DomainError::Validation(_) | DomainError::InvalidId(_) => ErrorKind::Validation,
            DomainError::NotFound(_) => ErrorKind::NotFound,
            DomainError::Conflict(_) | DomainError::InvariantViolation(_) => ErrorKind::Conflict,
        }
    }
}
