use super::model::Order;
use super::value_objects::{DisplayStatus, OrderState, ShipmentStatus};

// ============================================================================
// Order Status Resolver & Cancellability Policy
// ============================================================================
//
// Both functions are pure projections over `order.state` and the shipment
// statuses. The display status is recomputed on every read and is never
// persisted, so it can never drift from the shipment records.
//
// Resolution is a strict priority waterfall: order-level cancellation always
// wins; once shipments exist they become the source of truth; full delivery
// requires every shipment to be delivered, while returns and transit are
// sticky signals that dominate mere preparation.
//
// ============================================================================

/// Derive the user-facing lifecycle label for an order.
///
/// First matching rule wins:
/// 1. cancelled order -> CANCELED, regardless of shipments
/// 2. with shipments: all DELIVERED -> DELIVERED; any RETURNED -> RETURNED;
///    any IN_TRANSIT/AWB/PICKUP_SCHEDULED -> SHIPPED; any
///    PREPARING/READY_FOR_PICKUP -> PROCESSING; any PENDING -> PENDING
/// 3. otherwise fall back on the order state alone
///
/// Unrecognized shipment statuses match none of the rules and fall through;
/// the function never fails.
pub fn resolve_display_status(order: &Order) -> DisplayStatus {
    if order.state == OrderState::Cancelled {
        return DisplayStatus::Canceled;
    }

    if !order.shipments.is_empty() {
        let statuses: Vec<ShipmentStatus> = order.shipments.iter().map(|s| s.status).collect();

        if statuses.iter().all(|s| *s == ShipmentStatus::Delivered) {
            return DisplayStatus::Delivered;
        }
        if statuses.iter().any(|s| *s == ShipmentStatus::Returned) {
            return DisplayStatus::Returned;
        }
        if statuses.iter().any(|s| {
            matches!(
                s,
                ShipmentStatus::InTransit | ShipmentStatus::Awb | ShipmentStatus::PickupScheduled
            )
        }) {
            return DisplayStatus::Shipped;
        }
        if statuses
            .iter()
            .any(|s| matches!(s, ShipmentStatus::Preparing | ShipmentStatus::ReadyForPickup))
        {
            return DisplayStatus::Processing;
        }
        if statuses.iter().any(|s| *s == ShipmentStatus::Pending) {
            return DisplayStatus::Pending;
        }
        // Every shipment carried an unrecognized status; fall back on the
        // order state as if no shipments were present.
    }

    match order.state {
        OrderState::Pending => DisplayStatus::Pending,
        OrderState::Placed | OrderState::Preparing | OrderState::Confirmed => {
            DisplayStatus::Processing
        }
        OrderState::Fulfilled => DisplayStatus::Delivered,
        // Safe default; Cancelled is unreachable here.
        OrderState::Cancelled => DisplayStatus::Canceled,
    }
}

/// Whether the order may still be cancelled (by admin or customer).
///
/// Cancellation is all-or-nothing at the order level: the moment any vendor
/// has started work on any shipment, the whole order is frozen. This is
/// one-directional; shipment statuses do not regress, so a `false` here
/// never becomes `true` again.
pub fn is_cancellable(order: &Order) -> bool {
    if matches!(order.state, OrderState::Cancelled | OrderState::Fulfilled) {
        return false;
    }

    !order.shipments.iter().any(|s| s.status.has_started())
}

// ============================================================================
// Unit Tests
// ============================================================================
