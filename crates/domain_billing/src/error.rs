//! Billing domain errors

use std::fmt;

use serde::Serialize;
use thiserror::Error;

use core_kernel::{CoreError, PortError};
use domain_access::AccessError;

/// Coarse classification of a [`BillingError`]
///
/// Callers branch on the kind to decide between surfacing the error and
/// retrying the operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    InvalidState,
    NotFound,
    ConcurrencyConflict,
    Unavailable,
    AccessDenied,
    Storage,
}

/// Errors that can occur in the billing domain
#[derive(Debug, Error)]
pub enum BillingError {
    /// Malformed or missing input
    #[error("Validation error: {0}")]
    Validation(String),

    /// The entity's current state does not permit the operation
    #[error("Invalid state: cannot {action} {entity} in status {current}")]
    InvalidState {
        entity: String,
        current: String,
        action: String,
    },

    /// Referenced entity does not exist
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// A competing writer won the compare-and-swap
    #[error("Concurrency conflict: {0}")]
    ConcurrencyConflict(String),

    /// The document store could not be reached
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    /// The principal is not allowed to perform the operation
    #[error("Access denied: {0}")]
    AccessDenied(String),

    /// Non-transient store or serialization fault
    #[error("Storage error: {0}")]
    Storage(String),
}

impl BillingError {
    pub fn validation(message: impl Into<String>) -> Self {
        BillingError::Validation(message.into())
    }

    pub fn invalid_state(
        entity: impl Into<String>,
        current: impl fmt::Debug,
        action: impl Into<String>,
    ) -> Self {
        BillingError::InvalidState {
            entity: entity.into(),
            current: format!("{:?}", current),
            action: action.into(),
        }
    }

    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        BillingError::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    pub fn access_denied(message: impl Into<String>) -> Self {
        BillingError::AccessDenied(message.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            BillingError::Validation(_) => ErrorKind::Validation,
            BillingError::InvalidState { .. } => ErrorKind::InvalidState,
            BillingError::NotFound { .. } => ErrorKind::NotFound,
            BillingError::ConcurrencyConflict(_) => ErrorKind::ConcurrencyConflict,
            BillingError::Unavailable(_) => ErrorKind::Unavailable,
            BillingError::AccessDenied(_) => ErrorKind::AccessDenied,
            BillingError::Storage(_) => ErrorKind::Storage,
        }
    }

    /// True for the kinds a caller should retry with backoff
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::ConcurrencyConflict | ErrorKind::Unavailable
        )
    }
}

impl From<PortError> for BillingError {
    fn from(err: PortError) -> Self {
        match err {
            PortError::NotFound { entity_type, id } => BillingError::NotFound {
                entity: entity_type,
                id,
            },
            PortError::Conflict { message } => BillingError::ConcurrencyConflict(message),
            PortError::Validation { message, .. } => BillingError::Validation(message),
            err if err.is_transient() => BillingError::Unavailable(err.to_string()),
            err => BillingError::Storage(err.to_string()),
        }
    }
}

impl From<AccessError> for BillingError {
    fn from(err: AccessError) -> Self {
        BillingError::AccessDenied(err.to_string())
    }
}

impl From<CoreError> for BillingError {
    fn from(err: CoreError) -> Self {
        BillingError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_port_error_mapping() {
        let conflict: BillingError = PortError::conflict("version moved").into();
        assert_eq!(conflict.kind(), ErrorKind::ConcurrencyConflict);
        assert!(conflict.is_retryable());

        let down: BillingError = PortError::connection("refused").into();
        assert_eq!(down.kind(), ErrorKind::Unavailable);
        assert!(down.is_retryable());

        let busy: BillingError = PortError::timeout("acquire pooled connection").into();
        assert_eq!(busy.kind(), ErrorKind::Unavailable);
        assert!(busy.is_retryable());

        let missing: BillingError = PortError::not_found("Invoice", "42").into();
        assert_eq!(missing.kind(), ErrorKind::NotFound);
        assert!(!missing.is_retryable());

        let corrupt: BillingError = PortError::transformation("bad json").into();
        assert_eq!(corrupt.kind(), ErrorKind::Storage);
    }

    #[test]
    fn test_invalid_state_message() {
        #[derive(Debug)]
        enum Status {
            Draft,
        }

        let err = BillingError::invalid_state("Quotation", Status::Draft, "convert");
        assert_eq!(
            err.to_string(),
            "Invalid state: cannot convert Quotation in status Draft"
        );
    }
}
