use backend_domain::LedgerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("unauthorized")]
    Unauthorized,
    /// Rejected before any state mutation.
    #[error("validation failed: {0}")]
    Validation(String),
    #[error("not found: {0}")]
    NotFound(String),
    /// Reservation refused; callers may retry after inventory changes.
    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { requested: u32, available: u32 },
    /// Out-of-order workflow transition. Duplicate and late events never
    /// surface as this; they are absorbed as idempotent no-ops.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),
    /// The per-alert guard could not be acquired in time; retry with
    /// backoff.
    #[error("concurrent update in progress, retry")]
    ConcurrencyConflict,
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientStock {
                requested,
                available,
            } => AppError::InsufficientStock {
                requested,
                available,
            },
            LedgerError::UnknownReservation => {
                AppError::NotFound("reservation token".to_string())
            }
            LedgerError::UnknownEntry {
                blood_type,
                component,
            } => AppError::NotFound(format!("inventory entry {} {}", blood_type, component)),
        }
    }
}
