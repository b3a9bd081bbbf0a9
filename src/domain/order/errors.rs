use uuid::Uuid;

use super::value_objects::OrderState;

// ============================================================================
// Order Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum OrderError {
    #[error("Order not found: {0}")]
    NotFound(Uuid),

    #[error("Shipment not found: {0}")]
    ShipmentNotFound(Uuid),

    #[error("Cannot {action} an order in state '{state}'")]
    InvalidTransition {
        action: &'static str,
        state: OrderState,
    },

    #[error("Order can no longer be cancelled: fulfilment has already started")]
    CancellationLocked,

    #[error("A cancellation note is required when the reason is 'other'")]
    MissingCancelNote,

    #[error("Required consent not given: {0}")]
    MissingConsent(&'static str),

    #[error("Invalid package dimensions: {0}")]
    InvalidDimensions(&'static str),

    #[error("Shipment pickup already in progress or completed")]
    ShipmentAlreadyMoving,

    #[error("Courier scheduling failed: {0}")]
    Courier(String),

    #[error("Order was modified concurrently, please re-fetch and retry")]
    VersionConflict,

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
