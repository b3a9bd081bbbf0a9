use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::value_objects::{CancelReason, OrderState, ShipmentStatus};

// ============================================================================
// Order & Shipment Records
// ============================================================================
//
// One order fans out to one shipment per distinct vendor in the cart.
// Shipments have no existence outside their order. Neither record is ever
// deleted; both only move toward terminal states.
//
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub state: OrderState,
    pub shipments: Vec<Shipment>,

    // Set only when state becomes Cancelled through the vendor path; the
    // admin override path writes no reason (known asymmetry, kept as-is).
    pub cancel_reason: Option<CancelReason>,
    pub cancel_reason_note: Option<String>,

    pub created_at: DateTime<Utc>,

    /// Minor currency units.
    pub subtotal: i64,
    pub shipping_total: i64,

    pub admin_notes: Option<String>,

    // Written back by the invoicing capability, immutable once set.
    pub invoice_number: Option<i64>,
    pub invoice_date: Option<NaiveDate>,

    // Courier scheduling metadata.
    pub awb: Option<String>,
    pub pickup_date: Option<NaiveDate>,
    pub pickup_slot: Option<String>,

    /// Optimistic-concurrency counter; every committed mutation bumps it.
    pub version: i64,
}

impl Order {
    /// Derived, never stored independently.
    pub fn total(&self) -> i64 {
        self.subtotal + self.shipping_total
    }

    /// Shipment items belonging to one vendor, used to seed invoice lines.
    pub fn items_for_vendor(&self, vendor_id: Uuid) -> Vec<ShipmentItem> {
        self.shipments
            .iter()
            .filter(|s| s.vendor_id == vendor_id)
            .flat_map(|s| s.items.iter().cloned())
            .collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shipment {
    pub id: Uuid,
    pub order_id: Uuid,
    pub vendor_id: Uuid,
    pub status: ShipmentStatus,
    pub items: Vec<ShipmentItem>,
    pub awb: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShipmentItem {
    pub title: String,
    pub quantity: i32,
    /// Minor currency units.
    pub unit_price: i64,
}

// ============================================================================
// Unit Tests
// ============================================================================
