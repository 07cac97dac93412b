//! # Service Error Types
//!
//! What a failed operation surfaces to the UI: a conflict, a validation
//! failure, a missing row, or a store failure. Every variant carries a
//! message fit for a dismissible notification; none of them take the
//! process down.

use thiserror::Error;

use cabina_core::ValidationError;
use cabina_db::StoreError;

/// Errors surfaced by the business operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// The seat was not available: another terminal opened or moved a
    /// session onto it first, or it is under maintenance.
    #[error("a session is already active for seat {seat}")]
    SeatUnavailable { seat: String },

    /// The session is not active anymore (closed or deleted under us).
    #[error("session {id} is not active")]
    SessionNotActive { id: String },

    /// The consumption line is already paid; paid lines are frozen.
    #[error("consumption line {id} is already paid")]
    LinePaid { id: String },

    /// The debt is settled; settled is terminal.
    #[error("debt {id} is already settled")]
    DebtSettled { id: String },

    /// A referenced row does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Input failed validation before anything was written.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The store failed underneath us.
    #[error(transparent)]
    Store(StoreError),
}

impl ServiceError {
    /// Creates a NotFound error.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        ServiceError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Store errors map through, except the two that are business outcomes
/// in disguise: a missing row, and the active-session unique index
/// firing on an open/open race.
impl From<StoreError> for ServiceError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound { entity, id } => ServiceError::NotFound { entity, id },
            other if other.is_active_session_conflict() => ServiceError::SeatUnavailable {
                seat: "unknown".to_string(),
            },
            other => ServiceError::Store(other),
        }
    }
}

/// Result type for service operations.
pub type ServiceResult<T> = Result<T, ServiceError>;

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_store_not_found_maps_to_service_not_found() {
        let err: ServiceError = StoreError::not_found("Session", "abc").into();
        assert!(matches!(err, ServiceError::NotFound { .. }));
        assert_eq!(err.to_string(), "Session not found: abc");
    }

    #[test]
    fn test_active_session_unique_violation_maps_to_conflict() {
        let err: ServiceError = StoreError::UniqueViolation {
            index: "sessions.seat_id".to_string(),
        }
        .into();
        assert!(matches!(err, ServiceError::SeatUnavailable { .. }));
    }

    #[test]
    fn test_validation_error_passes_through() {
        let err: ServiceError = ValidationError::MustBePositive {
            field: "quantity".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "quantity must be positive");
    }
}
