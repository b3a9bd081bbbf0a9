use std::sync::Arc;

use uuid::Uuid;

use crate::collaborators::courier::{CourierScheduling, PickupRequest};
use crate::collaborators::notify::Notifier;
use crate::store::{OrderStore, StoreError};

use super::commands::OrderCommand;
use super::errors::OrderError;
use super::lifecycle::{handle_command, Effect};
use super::model::{Order, Shipment};
use super::value_objects::ShipmentStatus;

// ============================================================================
// Order Lifecycle Controller
// ============================================================================
//
// Orchestrates: load order -> pure transition validation -> gating side
// effect -> compare-and-swap persist -> post-commit notification.
//
// The courier call runs BEFORE the state write: if scheduling fails the
// order is left exactly as it was and the collaborator error is surfaced.
// Notification runs AFTER the commit and is fail-soft. The expected-version
// write is what serializes two racing transitions on the same order; the
// loser gets a conflict and should re-fetch.
//
// ============================================================================

pub struct OrderLifecycleController {
    store: Arc<dyn OrderStore>,
    courier: Arc<dyn CourierScheduling>,
    notifier: Arc<dyn Notifier>,
}

impl OrderLifecycleController {
    pub fn new(
        store: Arc<dyn OrderStore>,
        courier: Arc<dyn CourierScheduling>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            store,
            courier,
            notifier,
        }
    }

    pub async fn get_order(&self, order_id: Uuid) -> Result<Order, OrderError> {
        self.store
            .get_order(order_id)
            .await
            .map_err(|e| store_err(e, order_id))?
            .ok_or(OrderError::NotFound(order_id))
    }

    /// Execute a lifecycle command against an order.
    pub async fn execute(
        &self,
        order_id: Uuid,
        command: OrderCommand,
    ) -> Result<Order, OrderError> {
        let order = self.get_order(order_id).await?;
        let transition = handle_command(&order, &command)?;

        let mut updated = order.clone();
        updated.state = transition.next;
        updated.cancel_reason = transition.cancel_reason.or(order.cancel_reason);
        updated.cancel_reason_note = transition
            .cancel_reason_note
            .clone()
            .or_else(|| order.cancel_reason_note.clone());

        // Gating side effect: must succeed before anything is written.
        if let Effect::SchedulePickup(request) = &transition.effect {
            let scheduled = self
                .courier
                .schedule_pickup(order_id, request)
                .await
                .map_err(|e| OrderError::Courier(e.to_string()))?;

            updated.awb = Some(scheduled.awb);
            updated.pickup_date = Some(request.pickup.date);
            updated.pickup_slot = Some(request.pickup.slot.clone());
        }

        let committed = self
            .store
            .update_order(&updated, order.version)
            .await
            .map_err(|e| store_err(e, order_id))?;

        tracing::info!(
            order_id = %order_id,
            action = command.action(),
            from = %order.state,
            to = %committed.state,
            version = committed.version,
            "✅ Order transition committed"
        );

        // Post-commit, fail-soft.
        if matches!(transition.effect, Effect::NotifyCancellation) {
            if let Err(e) = self
                .notifier
                .order_cancelled(
                    order_id,
                    committed.cancel_reason,
                    committed.cancel_reason_note.as_deref(),
                )
                .await
            {
                tracing::warn!(order_id = %order_id, error = %e, "Cancellation notification failed");
            }
        }

        Ok(committed)
    }

    /// Admin notes live outside the lifecycle and can change at any time.
    pub async fn update_admin_notes(
        &self,
        order_id: Uuid,
        notes: &str,
    ) -> Result<Order, OrderError> {
        let order = self
            .store
            .update_admin_notes(order_id, notes)
            .await
            .map_err(|e| store_err(e, order_id))?;

        tracing::debug!(order_id = %order_id, "Admin notes updated");
        Ok(order)
    }

    /// Book a courier pickup for a single shipment. Valid only while the
    /// shipment has not started moving; the courier call gates the status
    /// write, exactly like the order-level confirm.
    pub async fn schedule_shipment_pickup(
        &self,
        shipment_id: Uuid,
        request: PickupRequest,
    ) -> Result<Shipment, OrderError> {
        let shipment = self
            .store
            .get_shipment(shipment_id)
            .await
            .map_err(|e| store_err(e, shipment_id))?
            .ok_or(OrderError::ShipmentNotFound(shipment_id))?;

        match shipment.status {
            ShipmentStatus::Pending
            | ShipmentStatus::Preparing
            | ShipmentStatus::ReadyForPickup => {}
            _ => return Err(OrderError::ShipmentAlreadyMoving),
        }

        let scheduled = self
            .courier
            .schedule_pickup(shipment.order_id, &request)
            .await
            .map_err(|e| OrderError::Courier(e.to_string()))?;

        // Status-CAS: if the shipment started moving during the courier
        // call, the write loses instead of regressing the status.
        let updated = self
            .store
            .update_shipment_status(
                shipment_id,
                shipment.status,
                ShipmentStatus::PickupScheduled,
                Some(&scheduled.awb),
            )
            .await
            .map_err(|e| store_err(e, shipment_id))?;

        tracing::info!(
            shipment_id = %shipment_id,
            order_id = %shipment.order_id,
            awb = %scheduled.awb,
            "✅ Shipment pickup scheduled"
        );

        Ok(updated)
    }
}

fn store_err(e: StoreError, id: Uuid) -> OrderError {
    match e {
        StoreError::NotFound => OrderError::NotFound(id),
        StoreError::VersionConflict { .. } => OrderError::VersionConflict,
        StoreError::StatusConflict { .. } => OrderError::ShipmentAlreadyMoving,
        StoreError::Backend(e) => OrderError::Storage(e),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
