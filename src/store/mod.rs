use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::invoice::model::Invoice;
use crate::domain::order::model::{Order, Shipment};
use crate::domain::order::value_objects::ShipmentStatus;

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::PgStore;

// ============================================================================
// Storage Layer
// ============================================================================
//
// The order/shipment record is the only shared mutable resource in the
// system. Lifecycle writes go through `update_order` with an expected
// version: the store commits only if the row still carries that version
// (compare-and-swap), which is what makes the controller's from-state
// validation safe under concurrent requests.
//
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found")]
    NotFound,

    #[error("version conflict: expected {expected}")]
    VersionConflict { expected: i64 },

    #[error("status conflict: shipment no longer '{expected}'")]
    StatusConflict { expected: ShipmentStatus },

    #[error(transparent)]
    Backend(#[from] anyhow::Error),
}

#[async_trait]
pub trait OrderStore: Send + Sync {
    /// Order creation happens at checkout, outside this core; the store
    /// still exposes an insert for seeding and tests.
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError>;

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError>;

    /// Compare-and-swap write of the full order row (shipments excluded).
    /// Commits only if the stored version equals `expected_version` and
    /// returns the order with its version bumped.
    async fn update_order(&self, order: &Order, expected_version: i64)
        -> Result<Order, StoreError>;

    /// Admin notes are mutable at any time, independent of the lifecycle;
    /// a plain last-write-wins update, no version check.
    async fn update_admin_notes(&self, id: Uuid, notes: &str) -> Result<Order, StoreError>;

    async fn get_shipment(&self, id: Uuid) -> Result<Option<Shipment>, StoreError>;

    /// Compare-and-swap on the shipment status: commits only if the stored
    /// status still equals `from`. Shipment statuses never regress, so a
    /// mismatch means a concurrent writer moved the shipment first.
    async fn update_shipment_status(
        &self,
        id: Uuid,
        from: ShipmentStatus,
        to: ShipmentStatus,
        awb: Option<&str>,
    ) -> Result<Shipment, StoreError>;
}

#[async_trait]
pub trait InvoiceStore: Send + Sync {
    async fn upsert_invoice(&self, invoice: &Invoice) -> Result<(), StoreError>;

    async fn get_invoice_for_order(&self, order_id: Uuid) -> Result<Option<Invoice>, StoreError>;

    /// The number most recently issued for this vendor; manual overrides
    /// land here too, so they seed subsequent auto-increments.
    async fn last_issued_number(&self, vendor_id: Uuid) -> Result<Option<i64>, StoreError>;

    async fn record_issued_number(&self, vendor_id: Uuid, number: i64) -> Result<(), StoreError>;
}
