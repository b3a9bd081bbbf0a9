use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::order::value_objects::CancelReason;

// ============================================================================
// Notification Collaborator
// ============================================================================
//
// Outbound customer/vendor messaging. Notification runs AFTER a transition
// has committed and is fail-soft: a delivery failure is logged, never
// propagated, and never rolls back the transition.
//
// ============================================================================

#[async_trait]
pub trait Notifier: Send + Sync {
    async fn order_cancelled(
        &self,
        order_id: Uuid,
        reason: Option<CancelReason>,
        note: Option<&str>,
    ) -> Result<()>;
}

/// Dev/demo implementation: logs instead of sending.
pub struct LoggingNotifier;

#[async_trait]
impl Notifier for LoggingNotifier {
    async fn order_cancelled(
        &self,
        order_id: Uuid,
        reason: Option<CancelReason>,
        note: Option<&str>,
    ) -> Result<()> {
        tracing::info!(
            order_id = %order_id,
            reason = ?reason,
            note = ?note,
            "Cancellation notification (logging stub)"
        );
        Ok(())
    }
}
