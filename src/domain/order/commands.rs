use crate::collaborators::courier::PickupRequest;

use super::value_objects::CancelReason;

// ============================================================================
// Order Commands - Represent user intent
// ============================================================================
//
// Vendor commands drive the explicit lifecycle
// new -> preparing -> confirmed -> fulfilled (cancelled from any non-terminal
// state). Admin commands are overrides; note the admin cancel deliberately
// carries no reason code, mirroring the vendor/admin asymmetry in the
// product.
//
// ============================================================================

#[derive(Debug, Clone)]
pub enum OrderCommand {
    /// Vendor: new -> preparing.
    MarkPreparing,
    /// Vendor: preparing/confirmed -> confirmed; books a courier pickup,
    /// which must succeed before the transition commits.
    Confirm { pickup: PickupRequest },
    /// Vendor: confirmed -> fulfilled.
    MarkFulfilled,
    /// Vendor: cancel with a closed reason vocabulary; `note` is mandatory
    /// when the reason is `other`.
    Cancel {
        reason: CancelReason,
        note: Option<String>,
    },
    /// Admin override: cancel without a reason code.
    AdminCancel,
    /// Admin override: force fulfilled.
    AdminMarkFulfilled,
}

impl OrderCommand {
    /// Short label used in conflict error messages and logs.
    pub fn action(&self) -> &'static str {
        match self {
            OrderCommand::MarkPreparing => "mark in preparation",
            OrderCommand::Confirm { .. } => "confirm & schedule courier",
            OrderCommand::MarkFulfilled => "mark finalized",
            OrderCommand::Cancel { .. } => "cancel",
            OrderCommand::AdminCancel => "cancel",
            OrderCommand::AdminMarkFulfilled => "mark fulfilled",
        }
    }
}
