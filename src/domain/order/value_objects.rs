use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ============================================================================
// Order Value Objects - Status Vocabularies
// ============================================================================
//
// The marketplace historically grew two parallel status vocabularies for the
// same order entity:
// - admin/customer wire vocabulary: PENDING / PAID / CANCELLED / FULFILLED
// - vendor wire vocabulary:         new / preparing / confirmed / fulfilled /
//                                   cancelled
//
// Internally there is exactly ONE canonical state enum (`OrderState`); the
// two wire vocabularies are projections of it, mapped explicitly at each
// external boundary so they can never drift apart again.
//
// ============================================================================

/// Canonical order lifecycle state. This is the only status that is
/// persisted; both external vocabularies are derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderState {
    /// Checkout started, payment not captured.
    Pending,
    /// Paid; no vendor has started work. Admin `PAID`, vendor `new`.
    Placed,
    /// A vendor marked the order "in preparation".
    Preparing,
    /// Vendor confirmed and scheduled a courier pickup.
    Confirmed,
    /// Terminal happy path.
    Fulfilled,
    /// Terminal.
    Cancelled,
}

impl OrderState {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderState::Pending => "pending",
            OrderState::Placed => "placed",
            OrderState::Preparing => "preparing",
            OrderState::Confirmed => "confirmed",
            OrderState::Fulfilled => "fulfilled",
            OrderState::Cancelled => "cancelled",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderState::Fulfilled | OrderState::Cancelled)
    }

    /// Projection onto the admin/customer wire vocabulary.
    pub fn to_admin(&self) -> AdminOrderStatus {
        match self {
            OrderState::Pending => AdminOrderStatus::Pending,
            OrderState::Placed | OrderState::Preparing | OrderState::Confirmed => {
                AdminOrderStatus::Paid
            }
            OrderState::Fulfilled => AdminOrderStatus::Fulfilled,
            OrderState::Cancelled => AdminOrderStatus::Cancelled,
        }
    }

    /// Projection onto the vendor wire vocabulary. An order the vendor has
    /// not touched yet always reads as `new`, paid or not.
    pub fn to_vendor(&self) -> VendorOrderStatus {
        match self {
            OrderState::Pending | OrderState::Placed => VendorOrderStatus::New,
            OrderState::Preparing => VendorOrderStatus::Preparing,
            OrderState::Confirmed => VendorOrderStatus::Confirmed,
            OrderState::Fulfilled => VendorOrderStatus::Fulfilled,
            OrderState::Cancelled => VendorOrderStatus::Cancelled,
        }
    }
}

impl fmt::Display for OrderState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OrderState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderState::Pending),
            "placed" => Ok(OrderState::Placed),
            "preparing" => Ok(OrderState::Preparing),
            "confirmed" => Ok(OrderState::Confirmed),
            "fulfilled" => Ok(OrderState::Fulfilled),
            "cancelled" => Ok(OrderState::Cancelled),
            other => Err(format!("unknown order state: {other}")),
        }
    }
}

/// Admin/customer wire vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdminOrderStatus {
    Pending,
    Paid,
    Cancelled,
    Fulfilled,
}

/// Vendor wire vocabulary (lowercase on the wire).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VendorOrderStatus {
    New,
    Preparing,
    Confirmed,
    Fulfilled,
    Cancelled,
}

/// Per-shipment fulfilment status reported by vendors and couriers.
///
/// `Unknown` absorbs unrecognized wire values: the status resolver must
/// tolerate values this build has never heard of without failing, so they
/// deserialize into a variant that matches none of the resolution rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ShipmentStatus {
    Pending,
    Preparing,
    ReadyForPickup,
    Awb,
    InTransit,
    PickupScheduled,
    Delivered,
    Returned,
    #[serde(other)]
    Unknown,
}

impl ShipmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShipmentStatus::Pending => "PENDING",
            ShipmentStatus::Preparing => "PREPARING",
            ShipmentStatus::ReadyForPickup => "READY_FOR_PICKUP",
            ShipmentStatus::Awb => "AWB",
            ShipmentStatus::InTransit => "IN_TRANSIT",
            ShipmentStatus::PickupScheduled => "PICKUP_SCHEDULED",
            ShipmentStatus::Delivered => "DELIVERED",
            ShipmentStatus::Returned => "RETURNED",
            ShipmentStatus::Unknown => "UNKNOWN",
        }
    }

    /// "Started or beyond": fulfilment work has begun on this shipment, so
    /// the owning order can no longer be cancelled.
    pub fn has_started(&self) -> bool {
        matches!(
            self,
            ShipmentStatus::Preparing
                | ShipmentStatus::ReadyForPickup
                | ShipmentStatus::Awb
                | ShipmentStatus::InTransit
                | ShipmentStatus::PickupScheduled
                | ShipmentStatus::Delivered
                | ShipmentStatus::Returned
        )
    }
}

impl fmt::Display for ShipmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShipmentStatus {
    type Err = std::convert::Infallible;

    // Tolerant: unknown values load as Unknown, never error.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "PENDING" => ShipmentStatus::Pending,
            "PREPARING" => ShipmentStatus::Preparing,
            "READY_FOR_PICKUP" => ShipmentStatus::ReadyForPickup,
            "AWB" => ShipmentStatus::Awb,
            "IN_TRANSIT" => ShipmentStatus::InTransit,
            "PICKUP_SCHEDULED" => ShipmentStatus::PickupScheduled,
            "DELIVERED" => ShipmentStatus::Delivered,
            "RETURNED" => ShipmentStatus::Returned,
            _ => ShipmentStatus::Unknown,
        })
    }
}

/// User-facing lifecycle label. Computed on every read, never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DisplayStatus {
    Pending,
    Processing,
    Shipped,
    Delivered,
    Returned,
    // Single L, matching the customer-facing wire spelling.
    Canceled,
}

/// Closed reason vocabulary for vendor-initiated cancellation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CancelReason {
    ClientNoAnswer,
    ClientRequest,
    StockIssue,
    AddressIssue,
    PaymentIssue,
    Other,
}

impl CancelReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            CancelReason::ClientNoAnswer => "client_no_answer",
            CancelReason::ClientRequest => "client_request",
            CancelReason::StockIssue => "stock_issue",
            CancelReason::AddressIssue => "address_issue",
            CancelReason::PaymentIssue => "payment_issue",
            CancelReason::Other => "other",
        }
    }
}

impl FromStr for CancelReason {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "client_no_answer" => Ok(CancelReason::ClientNoAnswer),
            "client_request" => Ok(CancelReason::ClientRequest),
            "stock_issue" => Ok(CancelReason::StockIssue),
            "address_issue" => Ok(CancelReason::AddressIssue),
            "payment_issue" => Ok(CancelReason::PaymentIssue),
            "other" => Ok(CancelReason::Other),
            other => Err(format!("unknown cancel reason: {other}")),
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_projection_collapses_in_flight_states_to_paid() {
        assert_eq!(OrderState::Placed.to_admin(), AdminOrderStatus::Paid);
        assert_eq!(OrderState::Preparing.to_admin(), AdminOrderStatus::Paid);
        assert_eq!(OrderState::Confirmed.to_admin(), AdminOrderStatus::Paid);
        assert_eq!(OrderState::Pending.to_admin(), AdminOrderStatus::Pending);
        assert_eq!(OrderState::Fulfilled.to_admin(), AdminOrderStatus::Fulfilled);
        assert_eq!(OrderState::Cancelled.to_admin(), AdminOrderStatus::Cancelled);
    }

    #[test]
    fn test_vendor_projection_reads_untouched_orders_as_new() {
        assert_eq!(OrderState::Pending.to_vendor(), VendorOrderStatus::New);
        assert_eq!(OrderState::Placed.to_vendor(), VendorOrderStatus::New);
        assert_eq!(OrderState::Preparing.to_vendor(), VendorOrderStatus::Preparing);
        assert_eq!(OrderState::Confirmed.to_vendor(), VendorOrderStatus::Confirmed);
        assert_eq!(OrderState::Fulfilled.to_vendor(), VendorOrderStatus::Fulfilled);
        assert_eq!(OrderState::Cancelled.to_vendor(), VendorOrderStatus::Cancelled);
    }

    #[test]
    fn test_admin_status_wire_spelling() {
        let json = serde_json::to_string(&AdminOrderStatus::Fulfilled).unwrap();
        assert_eq!(json, "\"FULFILLED\"");
        let json = serde_json::to_string(&AdminOrderStatus::Cancelled).unwrap();
        assert_eq!(json, "\"CANCELLED\"");
    }

    #[test]
    fn test_vendor_status_wire_spelling() {
        let json = serde_json::to_string(&VendorOrderStatus::New).unwrap();
        assert_eq!(json, "\"new\"");
        let parsed: VendorOrderStatus = serde_json::from_str("\"preparing\"").unwrap();
        assert_eq!(parsed, VendorOrderStatus::Preparing);
    }

    #[test]
    fn test_display_status_uses_single_l_canceled() {
        let json = serde_json::to_string(&DisplayStatus::Canceled).unwrap();
        assert_eq!(json, "\"CANCELED\"");
    }

    #[test]
    fn test_shipment_status_round_trip() {
        let statuses = vec![
            ShipmentStatus::Pending,
            ShipmentStatus::Preparing,
            ShipmentStatus::ReadyForPickup,
            ShipmentStatus::Awb,
            ShipmentStatus::InTransit,
            ShipmentStatus::PickupScheduled,
            ShipmentStatus::Delivered,
            ShipmentStatus::Returned,
        ];

        for status in statuses {
            let json = serde_json::to_string(&status).unwrap();
            let back: ShipmentStatus = serde_json::from_str(&json).unwrap();
            assert_eq!(status, back);

            let text: ShipmentStatus = status.as_str().parse().unwrap();
            assert_eq!(status, text);
        }
    }

    #[test]
    fn test_unrecognized_shipment_status_never_fails() {
        let parsed: ShipmentStatus = serde_json::from_str("\"TELEPORTED\"").unwrap();
        assert_eq!(parsed, ShipmentStatus::Unknown);
        assert!(!parsed.has_started());

        let parsed: ShipmentStatus = "TELEPORTED".parse().unwrap();
        assert_eq!(parsed, ShipmentStatus::Unknown);
    }

    #[test]
    fn test_order_state_text_round_trip() {
        let states = vec![
            OrderState::Pending,
            OrderState::Placed,
            OrderState::Preparing,
            OrderState::Confirmed,
            OrderState::Fulfilled,
            OrderState::Cancelled,
        ];

        for state in states {
            let back: OrderState = state.as_str().parse().unwrap();
            assert_eq!(state, back);
        }
    }

    #[test]
    fn test_cancel_reason_wire_spelling() {
        let json = serde_json::to_string(&CancelReason::ClientNoAnswer).unwrap();
        assert_eq!(json, "\"client_no_answer\"");
        let parsed: CancelReason = "other".parse().unwrap();
        assert_eq!(parsed, CancelReason::Other);
        assert!("refund_denied".parse::<CancelReason>().is_err());
    }
}
