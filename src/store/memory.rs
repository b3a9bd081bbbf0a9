use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::invoice::model::Invoice;
use crate::domain::order::model::{Order, Shipment};
use crate::domain::order::value_objects::ShipmentStatus;

use super::{InvoiceStore, OrderStore, StoreError};

// ============================================================================
// In-Memory Store
// ============================================================================
//
// Backs local runs without a database and every controller/service test.
// Same compare-and-swap semantics as the Postgres store: a lifecycle write
// with a stale expected version is rejected.
//
// ============================================================================

#[derive(Default)]
struct Inner {
    orders: HashMap<Uuid, Order>,
    invoices: HashMap<Uuid, Invoice>,
    last_numbers: HashMap<Uuid, i64>,
}

#[derive(Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl OrderStore for MemoryStore {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.orders.insert(order.id, order.clone());
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.orders.get(&id).cloned())
    }

    async fn update_order(
        &self,
        order: &Order,
        expected_version: i64,
    ) -> Result<Order, StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner.orders.get_mut(&order.id).ok_or(StoreError::NotFound)?;

        if stored.version != expected_version {
            return Err(StoreError::VersionConflict {
                expected: expected_version,
            });
        }

        let shipments = stored.shipments.clone();
        *stored = Order {
            shipments,
            version: expected_version + 1,
            ..order.clone()
        };

        Ok(stored.clone())
    }

    async fn update_admin_notes(&self, id: Uuid, notes: &str) -> Result<Order, StoreError> {
        let mut inner = self.inner.write().await;
        let stored = inner.orders.get_mut(&id).ok_or(StoreError::NotFound)?;
        stored.admin_notes = Some(notes.to_owned());
        Ok(stored.clone())
    }

    async fn get_shipment(&self, id: Uuid) -> Result<Option<Shipment>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .orders
            .values()
            .flat_map(|o| o.shipments.iter())
            .find(|s| s.id == id)
            .cloned())
    }

    async fn update_shipment_status(
        &self,
        id: Uuid,
        from: ShipmentStatus,
        to: ShipmentStatus,
        awb: Option<&str>,
    ) -> Result<Shipment, StoreError> {
        let mut inner = self.inner.write().await;
        for order in inner.orders.values_mut() {
            if let Some(shipment) = order.shipments.iter_mut().find(|s| s.id == id) {
                if shipment.status != from {
                    return Err(StoreError::StatusConflict { expected: from });
                }
                shipment.status = to;
                if let Some(awb) = awb {
                    shipment.awb = Some(awb.to_owned());
                }
                return Ok(shipment.clone());
            }
        }
        Err(StoreError::NotFound)
    }
}

#[async_trait]
impl InvoiceStore for MemoryStore {
    async fn upsert_invoice(&self, invoice: &Invoice) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.invoices.insert(invoice.id, invoice.clone());
        Ok(())
    }

    async fn get_invoice_for_order(&self, order_id: Uuid) -> Result<Option<Invoice>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .invoices
            .values()
            .find(|i| i.order_id == order_id)
            .cloned())
    }

    async fn last_issued_number(&self, vendor_id: Uuid) -> Result<Option<i64>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner.last_numbers.get(&vendor_id).copied())
    }

    async fn record_issued_number(&self, vendor_id: Uuid, number: i64) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.last_numbers.insert(vendor_id, number);
        Ok(())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
