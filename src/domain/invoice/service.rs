use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::collaborators::billing::BillingProfiles;
use crate::domain::order::model::Order;
use crate::domain::order::value_objects::OrderState;
use crate::store::{InvoiceStore, OrderStore, StoreError};

use super::errors::InvoiceError;
use super::model::{Invoice, InvoiceLine, InvoiceStatus};

// ============================================================================
// Invoice Service
// ============================================================================
//
// Drafting and sending invoices, independent of the order lifecycle. Gates:
// the order must not be cancelled, and the vendor must have a complete
// billing profile on file.
//
// Numbering: assigned at send time. Auto-increments from the last issued
// number for the vendor unless the draft carries a manual override; the
// assigned number (override included) becomes the new sequence seed.
//
// ============================================================================

pub struct InvoiceService {
    orders: Arc<dyn OrderStore>,
    invoices: Arc<dyn InvoiceStore>,
    billing: Arc<dyn BillingProfiles>,
}

impl InvoiceService {
    pub fn new(
        orders: Arc<dyn OrderStore>,
        invoices: Arc<dyn InvoiceStore>,
        billing: Arc<dyn BillingProfiles>,
    ) -> Self {
        Self {
            orders,
            invoices,
            billing,
        }
    }

    async fn load_order(&self, order_id: Uuid) -> Result<Order, InvoiceError> {
        self.orders
            .get_order(order_id)
            .await
            .map_err(store_err)?
            .ok_or(InvoiceError::OrderNotFound(order_id))
    }

    async fn check_gates(&self, order: &Order, vendor_id: Uuid) -> Result<(), InvoiceError> {
        if order.state == OrderState::Cancelled {
            return Err(InvoiceError::OrderCancelled);
        }

        let complete = self
            .billing
            .is_complete(vendor_id)
            .await
            .map_err(|e| InvoiceError::Billing(e.to_string()))?;
        if !complete {
            return Err(InvoiceError::BillingIncomplete);
        }

        Ok(())
    }

    /// Create or update the draft for an order. `lines` replaces the draft
    /// lines when given, otherwise new drafts default from the vendor's
    /// shipment items. `number_override` pre-seats a manual invoice number.
    pub async fn draft(
        &self,
        order_id: Uuid,
        vendor_id: Uuid,
        lines: Option<Vec<InvoiceLine>>,
        number_override: Option<i64>,
    ) -> Result<Invoice, InvoiceError> {
        let order = self.load_order(order_id).await?;
        self.check_gates(&order, vendor_id).await?;

        if let Some(n) = number_override {
            if n <= 0 {
                return Err(InvoiceError::InvalidNumber(n));
            }
        }

        let existing = self
            .invoices
            .get_invoice_for_order(order_id)
            .await
            .map_err(store_err)?;

        let mut invoice = match existing {
            Some(invoice) if invoice.status == InvoiceStatus::Sent => {
                return Err(InvoiceError::AlreadySent)
            }
            Some(invoice) => invoice,
            None => {
                let default_lines: Vec<InvoiceLine> = order
                    .items_for_vendor(vendor_id)
                    .into_iter()
                    .map(InvoiceLine::from)
                    .collect();
                if default_lines.is_empty() && lines.is_none() {
                    return Err(InvoiceError::VendorNotOnOrder(vendor_id));
                }

                Invoice {
                    id: Uuid::new_v4(),
                    order_id,
                    vendor_id,
                    number: None,
                    status: InvoiceStatus::Draft,
                    lines: default_lines,
                    issued_at: None,
                    created_at: Utc::now(),
                }
            }
        };

        if let Some(lines) = lines {
            if lines.is_empty() {
                return Err(InvoiceError::EmptyLines);
            }
            invoice.lines = lines;
        }
        if number_override.is_some() {
            invoice.number = number_override;
        }

        self.invoices
            .upsert_invoice(&invoice)
            .await
            .map_err(store_err)?;

        tracing::debug!(
            order_id = %order_id,
            vendor_id = %vendor_id,
            invoice_id = %invoice.id,
            "Invoice draft saved"
        );

        Ok(invoice)
    }

    pub async fn get_for_order(&self, order_id: Uuid) -> Result<Invoice, InvoiceError> {
        self.invoices
            .get_invoice_for_order(order_id)
            .await
            .map_err(store_err)?
            .ok_or(InvoiceError::NotFound(order_id))
    }

    /// Issue the invoice: assign the number, stamp the date, mark it sent,
    /// and write the number back onto the order. Rendering/delivery of the
    /// PDF is the external invoicing provider's job.
    pub async fn send(&self, order_id: Uuid) -> Result<Invoice, InvoiceError> {
        let order = self.load_order(order_id).await?;

        let mut invoice = self.get_for_order(order_id).await?;
        if invoice.status == InvoiceStatus::Sent {
            return Err(InvoiceError::AlreadySent);
        }

        self.check_gates(&order, invoice.vendor_id).await?;
        if invoice.lines.is_empty() {
            return Err(InvoiceError::EmptyLines);
        }

        let number = match invoice.number {
            // Manual override staged on the draft.
            Some(n) => n,
            None => {
                let last = self
                    .invoices
                    .last_issued_number(invoice.vendor_id)
                    .await
                    .map_err(store_err)?
                    .unwrap_or(0);
                last + 1
            }
        };

        invoice.number = Some(number);
        invoice.status = InvoiceStatus::Sent;
        invoice.issued_at = Some(Utc::now().date_naive());

        self.invoices
            .upsert_invoice(&invoice)
            .await
            .map_err(store_err)?;
        // The assigned number seeds the sequence, override or not.
        self.invoices
            .record_issued_number(invoice.vendor_id, number)
            .await
            .map_err(store_err)?;

        // Write-back onto the order; immutable once set. The invoice is
        // already committed as sent, so a lifecycle transition bumping the
        // order version in between must not strand the order without its
        // number: re-read the fresh row and retry with only the invoice
        // fields applied.
        let mut attempts = 0;
        loop {
            let current = self.load_order(order_id).await?;
            if current.invoice_number.is_some() {
                break;
            }

            let mut updated = current.clone();
            updated.invoice_number = Some(number);
            updated.invoice_date = invoice.issued_at;

            match self.orders.update_order(&updated, current.version).await {
                Ok(_) => break,
                Err(StoreError::VersionConflict { .. }) if attempts < 5 => attempts += 1,
                Err(e) => return Err(store_err(e)),
            }
        }

        tracing::info!(
            order_id = %order_id,
            vendor_id = %invoice.vendor_id,
            invoice_number = number,
            "✅ Invoice issued"
        );

        Ok(invoice)
    }
}

fn store_err(e: StoreError) -> InvoiceError {
    match e {
        StoreError::NotFound => InvoiceError::Storage(anyhow::anyhow!("record vanished mid-flight")),
        StoreError::VersionConflict { .. } => {
            InvoiceError::Storage(anyhow::anyhow!("order changed concurrently, retry"))
        }
        StoreError::StatusConflict { .. } => {
            InvoiceError::Storage(anyhow::anyhow!("shipment changed concurrently, retry"))
        }
        StoreError::Backend(e) => InvoiceError::Storage(e),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::model::{Shipment, ShipmentItem};
    use crate::domain::order::value_objects::ShipmentStatus;
    use crate::store::MemoryStore;
    use anyhow::Result;
    use async_trait::async_trait;

    struct RejectingBilling;

    #[async_trait]
    impl BillingProfiles for RejectingBilling {
        async fn is_complete(&self, _vendor_id: Uuid) -> Result<bool> {
            Ok(false)
        }
    }

    struct AcceptingBilling;

    #[async_trait]
    impl BillingProfiles for AcceptingBilling {
        async fn is_complete(&self, _vendor_id: Uuid) -> Result<bool> {
            Ok(true)
        }
    }

    fn order_for(vendor_id: Uuid, state: OrderState) -> Order {
        let id = Uuid::new_v4();
        Order {
            id,
            state,
            shipments: vec![Shipment {
                id: Uuid::new_v4(),
                order_id: id,
                vendor_id,
                status: ShipmentStatus::Pending,
                items: vec![ShipmentItem {
                    title: "Ceramic mug".into(),
                    quantity: 2,
                    unit_price: 4_00,
                }],
                awb: None,
            }],
            cancel_reason: None,
            cancel_reason_note: None,
            created_at: Utc::now(),
            subtotal: 8_00,
            shipping_total: 2_00,
            admin_notes: None,
            invoice_number: None,
            invoice_date: None,
            awb: None,
            pickup_date: None,
            pickup_slot: None,
            version: 1,
        }
    }

    async fn service_with(
        order: &Order,
        billing: Arc<dyn BillingProfiles>,
    ) -> (InvoiceService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        store.insert_order(order).await.unwrap();
        let service = InvoiceService::new(store.clone(), store.clone(), billing);
        (service, store)
    }

    #[tokio::test]
    async fn test_draft_defaults_lines_from_vendor_items() {
        let vendor_id = Uuid::new_v4();
        let order = order_for(vendor_id, OrderState::Placed);
        let (service, _) = service_with(&order, Arc::new(AcceptingBilling)).await;

        let invoice = service.draft(order.id, vendor_id, None, None).await.unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.lines.len(), 1);
        assert_eq!(invoice.lines[0].title, "Ceramic mug");
        assert_eq!(invoice.number, None);
    }

    #[tokio::test]
    async fn test_draft_lines_are_editable_before_send() {
        let vendor_id = Uuid::new_v4();
        let order = order_for(vendor_id, OrderState::Placed);
        let (service, _) = service_with(&order, Arc::new(AcceptingBilling)).await;

        service.draft(order.id, vendor_id, None, None).await.unwrap();
        let edited = service
            .draft(
                order.id,
                vendor_id,
                Some(vec![InvoiceLine {
                    title: "Ceramic mug (discounted)".into(),
                    quantity: 2,
                    unit_price: 3_50,
                }]),
                None,
            )
            .await
            .unwrap();

        assert_eq!(edited.lines[0].unit_price, 3_50);
    }

    #[tokio::test]
    async fn test_cancelled_orders_cannot_be_invoiced() {
        let vendor_id = Uuid::new_v4();
        let order = order_for(vendor_id, OrderState::Cancelled);
        let (service, _) = service_with(&order, Arc::new(AcceptingBilling)).await;

        let err = service.draft(order.id, vendor_id, None, None).await.unwrap_err();
        assert!(matches!(err, InvoiceError::OrderCancelled));
    }

    #[tokio::test]
    async fn test_incomplete_billing_profile_blocks_drafting() {
        let vendor_id = Uuid::new_v4();
        let order = order_for(vendor_id, OrderState::Placed);
        let (service, _) = service_with(&order, Arc::new(RejectingBilling)).await;

        let err = service.draft(order.id, vendor_id, None, None).await.unwrap_err();
        assert!(matches!(err, InvoiceError::BillingIncomplete));
    }

    #[tokio::test]
    async fn test_send_assigns_sequential_numbers() {
        let vendor_id = Uuid::new_v4();
        let first = order_for(vendor_id, OrderState::Confirmed);
        let (service, store) = service_with(&first, Arc::new(AcceptingBilling)).await;

        service.draft(first.id, vendor_id, None, None).await.unwrap();
        let sent = service.send(first.id).await.unwrap();
        assert_eq!(sent.number, Some(1));
        assert_eq!(sent.status, InvoiceStatus::Sent);

        let second = order_for(vendor_id, OrderState::Confirmed);
        store.insert_order(&second).await.unwrap();
        service.draft(second.id, vendor_id, None, None).await.unwrap();
        let sent = service.send(second.id).await.unwrap();
        assert_eq!(sent.number, Some(2));
    }

    #[tokio::test]
    async fn test_manual_override_seeds_subsequent_numbers() {
        let vendor_id = Uuid::new_v4();
        let first = order_for(vendor_id, OrderState::Confirmed);
        let (service, store) = service_with(&first, Arc::new(AcceptingBilling)).await;

        service
            .draft(first.id, vendor_id, None, Some(500))
            .await
            .unwrap();
        let sent = service.send(first.id).await.unwrap();
        assert_eq!(sent.number, Some(500));

        let second = order_for(vendor_id, OrderState::Confirmed);
        store.insert_order(&second).await.unwrap();
        service.draft(second.id, vendor_id, None, None).await.unwrap();
        let sent = service.send(second.id).await.unwrap();
        assert_eq!(sent.number, Some(501));
    }

    /// Delegates to an in-memory store but fails the first `conflicts`
    /// order writes with a version conflict.
    struct ContendedOrders {
        inner: Arc<MemoryStore>,
        conflicts: std::sync::atomic::AtomicUsize,
    }

    #[async_trait]
    impl crate::store::OrderStore for ContendedOrders {
        async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
            self.inner.insert_order(order).await
        }

        async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
            self.inner.get_order(id).await
        }

        async fn update_order(
            &self,
            order: &Order,
            expected_version: i64,
        ) -> Result<Order, StoreError> {
            use std::sync::atomic::Ordering;
            if self.conflicts.load(Ordering::SeqCst) > 0 {
                self.conflicts.fetch_sub(1, Ordering::SeqCst);
                return Err(StoreError::VersionConflict {
                    expected: expected_version,
                });
            }
            self.inner.update_order(order, expected_version).await
        }

        async fn update_admin_notes(&self, id: Uuid, notes: &str) -> Result<Order, StoreError> {
            self.inner.update_admin_notes(id, notes).await
        }

        async fn get_shipment(&self, id: Uuid) -> Result<Option<Shipment>, StoreError> {
            self.inner.get_shipment(id).await
        }

        async fn update_shipment_status(
            &self,
            id: Uuid,
            from: ShipmentStatus,
            to: ShipmentStatus,
            awb: Option<&str>,
        ) -> Result<Shipment, StoreError> {
            self.inner.update_shipment_status(id, from, to, awb).await
        }
    }

    #[tokio::test]
    async fn test_send_retries_order_writeback_past_version_conflict() {
        let vendor_id = Uuid::new_v4();
        let order = order_for(vendor_id, OrderState::Confirmed);

        let store = Arc::new(MemoryStore::new());
        store.insert_order(&order).await.unwrap();
        let contended = Arc::new(ContendedOrders {
            inner: store.clone(),
            conflicts: std::sync::atomic::AtomicUsize::new(1),
        });
        let service = InvoiceService::new(contended, store.clone(), Arc::new(AcceptingBilling));

        service.draft(order.id, vendor_id, None, None).await.unwrap();

        // The invoice commits as sent even though the first order write
        // loses a version race; the write-back lands on the fresh row
        // instead of stranding the order without its number.
        let sent = service.send(order.id).await.unwrap();
        assert_eq!(sent.number, Some(1));
        assert_eq!(sent.status, InvoiceStatus::Sent);

        let stored = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.invoice_number, Some(1));
        assert!(stored.invoice_date.is_some());
    }

    #[tokio::test]
    async fn test_send_writes_number_back_onto_order() {
        let vendor_id = Uuid::new_v4();
        let order = order_for(vendor_id, OrderState::Confirmed);
        let (service, store) = service_with(&order, Arc::new(AcceptingBilling)).await;

        service.draft(order.id, vendor_id, None, None).await.unwrap();
        service.send(order.id).await.unwrap();

        let stored = store.get_order(order.id).await.unwrap().unwrap();
        assert_eq!(stored.invoice_number, Some(1));
        assert!(stored.invoice_date.is_some());
    }

    #[tokio::test]
    async fn test_sent_invoices_are_frozen() {
        let vendor_id = Uuid::new_v4();
        let order = order_for(vendor_id, OrderState::Confirmed);
        let (service, _) = service_with(&order, Arc::new(AcceptingBilling)).await;

        service.draft(order.id, vendor_id, None, None).await.unwrap();
        service.send(order.id).await.unwrap();

        let err = service.draft(order.id, vendor_id, None, None).await.unwrap_err();
        assert!(matches!(err, InvoiceError::AlreadySent));

        let err = service.send(order.id).await.unwrap_err();
        assert!(matches!(err, InvoiceError::AlreadySent));
    }

    #[tokio::test]
    async fn test_vendor_without_shipment_cannot_draft_empty_invoice() {
        let vendor_id = Uuid::new_v4();
        let order = order_for(vendor_id, OrderState::Placed);
        let (service, _) = service_with(&order, Arc::new(AcceptingBilling)).await;

        let stranger = Uuid::new_v4();
        let err = service.draft(order.id, stranger, None, None).await.unwrap_err();
        assert!(matches!(err, InvoiceError::VendorNotOnOrder(_)));
    }
}
