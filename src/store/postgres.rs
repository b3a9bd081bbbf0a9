use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::PgPoolOptions;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use crate::domain::invoice::model::{Invoice, InvoiceLine, InvoiceStatus};
use crate::domain::order::model::{Order, Shipment, ShipmentItem};
use crate::domain::order::value_objects::{CancelReason, OrderState, ShipmentStatus};

use super::{InvoiceStore, OrderStore, StoreError};

// ============================================================================
// Postgres Store
// ============================================================================
//
// Statuses are persisted as text columns (the canonical spellings from the
// value objects), shipment items and invoice lines as JSON text. Lifecycle
// writes use `UPDATE ... WHERE id = $1 AND version = $n`: the row-level
// atomicity of that statement is the compare-and-swap that serializes
// transitions per order.
//
// ============================================================================

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS orders (
    id                 UUID PRIMARY KEY,
    state              TEXT NOT NULL,
    cancel_reason      TEXT,
    cancel_reason_note TEXT,
    created_at         TIMESTAMPTZ NOT NULL,
    subtotal           BIGINT NOT NULL,
    shipping_total     BIGINT NOT NULL,
    admin_notes        TEXT,
    invoice_number     BIGINT,
    invoice_date       DATE,
    awb                TEXT,
    pickup_date        DATE,
    pickup_slot        TEXT,
    version            BIGINT NOT NULL
);

CREATE TABLE IF NOT EXISTS shipments (
    id        UUID PRIMARY KEY,
    order_id  UUID NOT NULL REFERENCES orders(id),
    vendor_id UUID NOT NULL,
    status    TEXT NOT NULL,
    items     TEXT NOT NULL,
    awb       TEXT
);

CREATE TABLE IF NOT EXISTS invoices (
    id         UUID PRIMARY KEY,
    order_id   UUID NOT NULL,
    vendor_id  UUID NOT NULL,
    number     BIGINT,
    status     TEXT NOT NULL,
    lines      TEXT NOT NULL,
    issued_at  DATE,
    created_at TIMESTAMPTZ NOT NULL
);

CREATE TABLE IF NOT EXISTS invoice_sequences (
    vendor_id   UUID PRIMARY KEY,
    last_number BIGINT NOT NULL
);
"#;

pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Connect and make sure the tables exist.
    pub async fn connect(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await
            .context("connecting to Postgres")?;

        for statement in SCHEMA.split(';').filter(|s| !s.trim().is_empty()) {
            sqlx::query(statement).execute(&pool).await?;
        }

        Ok(Self { pool })
    }

    async fn load_shipments(&self, order_id: Uuid) -> Result<Vec<Shipment>, StoreError> {
        let rows = sqlx::query(
            "SELECT id, order_id, vendor_id, status, items, awb
             FROM shipments WHERE order_id = $1 ORDER BY id",
        )
        .bind(order_id)
        .fetch_all(&self.pool)
        .await
        .map_err(backend)?;

        rows.into_iter().map(shipment_from_row).collect()
    }
}

fn backend(e: sqlx::Error) -> StoreError {
    StoreError::Backend(e.into())
}

fn order_from_row(row: sqlx::postgres::PgRow, shipments: Vec<Shipment>) -> Result<Order, StoreError> {
    let state_text: String = row.try_get("state").map_err(backend)?;
    let state: OrderState = state_text
        .parse()
        .map_err(|e: String| StoreError::Backend(anyhow::anyhow!(e)))?;

    let cancel_reason = row
        .try_get::<Option<String>, _>("cancel_reason")
        .map_err(backend)?
        .map(|r| r.parse::<CancelReason>())
        .transpose()
        .map_err(|e| StoreError::Backend(anyhow::anyhow!(e)))?;

    Ok(Order {
        id: row.try_get("id").map_err(backend)?,
        state,
        shipments,
        cancel_reason,
        cancel_reason_note: row.try_get("cancel_reason_note").map_err(backend)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(backend)?,
        subtotal: row.try_get("subtotal").map_err(backend)?,
        shipping_total: row.try_get("shipping_total").map_err(backend)?,
        admin_notes: row.try_get("admin_notes").map_err(backend)?,
        invoice_number: row.try_get("invoice_number").map_err(backend)?,
        invoice_date: row.try_get::<Option<NaiveDate>, _>("invoice_date").map_err(backend)?,
        awb: row.try_get("awb").map_err(backend)?,
        pickup_date: row.try_get::<Option<NaiveDate>, _>("pickup_date").map_err(backend)?,
        pickup_slot: row.try_get("pickup_slot").map_err(backend)?,
        version: row.try_get("version").map_err(backend)?,
    })
}

fn shipment_from_row(row: sqlx::postgres::PgRow) -> Result<Shipment, StoreError> {
    let status_text: String = row.try_get("status").map_err(backend)?;
    // Infallible: unrecognized statuses load as Unknown.
    let status: ShipmentStatus = status_text.parse().unwrap_or(ShipmentStatus::Unknown);

    let items_json: String = row.try_get("items").map_err(backend)?;
    let items: Vec<ShipmentItem> =
        serde_json::from_str(&items_json).map_err(|e| StoreError::Backend(e.into()))?;

    Ok(Shipment {
        id: row.try_get("id").map_err(backend)?,
        order_id: row.try_get("order_id").map_err(backend)?,
        vendor_id: row.try_get("vendor_id").map_err(backend)?,
        status,
        items,
        awb: row.try_get("awb").map_err(backend)?,
    })
}

fn invoice_from_row(row: sqlx::postgres::PgRow) -> Result<Invoice, StoreError> {
    let status_text: String = row.try_get("status").map_err(backend)?;
    let status: InvoiceStatus = status_text
        .parse()
        .map_err(|e: String| StoreError::Backend(anyhow::anyhow!(e)))?;

    let lines_json: String = row.try_get("lines").map_err(backend)?;
    let lines: Vec<InvoiceLine> =
        serde_json::from_str(&lines_json).map_err(|e| StoreError::Backend(e.into()))?;

    Ok(Invoice {
        id: row.try_get("id").map_err(backend)?,
        order_id: row.try_get("order_id").map_err(backend)?,
        vendor_id: row.try_get("vendor_id").map_err(backend)?,
        number: row.try_get("number").map_err(backend)?,
        status,
        lines,
        issued_at: row.try_get::<Option<NaiveDate>, _>("issued_at").map_err(backend)?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at").map_err(backend)?,
    })
}

#[async_trait]
impl OrderStore for PgStore {
    async fn insert_order(&self, order: &Order) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await.map_err(backend)?;

        sqlx::query(
            "INSERT INTO orders (id, state, cancel_reason, cancel_reason_note, created_at,
                                 subtotal, shipping_total, admin_notes, invoice_number,
                                 invoice_date, awb, pickup_date, pickup_slot, version)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
        )
        .bind(order.id)
        .bind(order.state.as_str())
        .bind(order.cancel_reason.map(|r| r.as_str()))
        .bind(&order.cancel_reason_note)
        .bind(order.created_at)
        .bind(order.subtotal)
        .bind(order.shipping_total)
        .bind(&order.admin_notes)
        .bind(order.invoice_number)
        .bind(order.invoice_date)
        .bind(&order.awb)
        .bind(order.pickup_date)
        .bind(&order.pickup_slot)
        .bind(order.version)
        .execute(&mut *tx)
        .await
        .map_err(backend)?;

        for shipment in &order.shipments {
            let items_json =
                serde_json::to_string(&shipment.items).map_err(|e| StoreError::Backend(e.into()))?;

            sqlx::query(
                "INSERT INTO shipments (id, order_id, vendor_id, status, items, awb)
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(shipment.id)
            .bind(shipment.order_id)
            .bind(shipment.vendor_id)
            .bind(shipment.status.as_str())
            .bind(items_json)
            .bind(&shipment.awb)
            .execute(&mut *tx)
            .await
            .map_err(backend)?;
        }

        tx.commit().await.map_err(backend)?;
        Ok(())
    }

    async fn get_order(&self, id: Uuid) -> Result<Option<Order>, StoreError> {
        let row = sqlx::query("SELECT * FROM orders WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        match row {
            Some(row) => {
                let shipments = self.load_shipments(id).await?;
                Ok(Some(order_from_row(row, shipments)?))
            }
            None => Ok(None),
        }
    }

    async fn update_order(
        &self,
        order: &Order,
        expected_version: i64,
    ) -> Result<Order, StoreError> {
        let result = sqlx::query(
            "UPDATE orders
             SET state = $2, cancel_reason = $3, cancel_reason_note = $4,
                 invoice_number = $5, invoice_date = $6, awb = $7,
                 pickup_date = $8, pickup_slot = $9, version = version + 1
             WHERE id = $1 AND version = $10",
        )
        .bind(order.id)
        .bind(order.state.as_str())
        .bind(order.cancel_reason.map(|r| r.as_str()))
        .bind(&order.cancel_reason_note)
        .bind(order.invoice_number)
        .bind(order.invoice_date)
        .bind(&order.awb)
        .bind(order.pickup_date)
        .bind(&order.pickup_slot)
        .bind(expected_version)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            // Distinguish a missing row from a lost race.
            return match self.get_order(order.id).await? {
                None => Err(StoreError::NotFound),
                Some(_) => Err(StoreError::VersionConflict {
                    expected: expected_version,
                }),
            };
        }

        self.get_order(order.id).await?.ok_or(StoreError::NotFound)
    }

    async fn update_admin_notes(&self, id: Uuid, notes: &str) -> Result<Order, StoreError> {
        let result = sqlx::query("UPDATE orders SET admin_notes = $2 WHERE id = $1")
            .bind(id)
            .bind(notes)
            .execute(&self.pool)
            .await
            .map_err(backend)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound);
        }

        self.get_order(id).await?.ok_or(StoreError::NotFound)
    }

    async fn get_shipment(&self, id: Uuid) -> Result<Option<Shipment>, StoreError> {
        let row = sqlx::query(
            "SELECT id, order_id, vendor_id, status, items, awb FROM shipments WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(shipment_from_row).transpose()
    }

    async fn update_shipment_status(
        &self,
        id: Uuid,
        from: ShipmentStatus,
        to: ShipmentStatus,
        awb: Option<&str>,
    ) -> Result<Shipment, StoreError> {
        let result = sqlx::query(
            "UPDATE shipments SET status = $2, awb = COALESCE($3, awb)
             WHERE id = $1 AND status = $4",
        )
        .bind(id)
        .bind(to.as_str())
        .bind(awb)
        .bind(from.as_str())
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        if result.rows_affected() == 0 {
            // Distinguish a missing row from a shipment that moved on.
            return match self.get_shipment(id).await? {
                None => Err(StoreError::NotFound),
                Some(_) => Err(StoreError::StatusConflict { expected: from }),
            };
        }

        self.get_shipment(id).await?.ok_or(StoreError::NotFound)
    }
}

#[async_trait]
impl InvoiceStore for PgStore {
    async fn upsert_invoice(&self, invoice: &Invoice) -> Result<(), StoreError> {
        let lines_json =
            serde_json::to_string(&invoice.lines).map_err(|e| StoreError::Backend(e.into()))?;

        sqlx::query(
            "INSERT INTO invoices (id, order_id, vendor_id, number, status, lines, issued_at, created_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             ON CONFLICT (id) DO UPDATE
             SET number = EXCLUDED.number, status = EXCLUDED.status,
                 lines = EXCLUDED.lines, issued_at = EXCLUDED.issued_at",
        )
        .bind(invoice.id)
        .bind(invoice.order_id)
        .bind(invoice.vendor_id)
        .bind(invoice.number)
        .bind(invoice.status.as_str())
        .bind(lines_json)
        .bind(invoice.issued_at)
        .bind(invoice.created_at)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }

    async fn get_invoice_for_order(&self, order_id: Uuid) -> Result<Option<Invoice>, StoreError> {
        let row = sqlx::query(
            "SELECT id, order_id, vendor_id, number, status, lines, issued_at, created_at
             FROM invoices WHERE order_id = $1
             ORDER BY created_at DESC LIMIT 1",
        )
        .bind(order_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend)?;

        row.map(invoice_from_row).transpose()
    }

    async fn last_issued_number(&self, vendor_id: Uuid) -> Result<Option<i64>, StoreError> {
        let row = sqlx::query("SELECT last_number FROM invoice_sequences WHERE vendor_id = $1")
            .bind(vendor_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend)?;

        row.map(|r| r.try_get::<i64, _>("last_number").map_err(backend))
            .transpose()
    }

    async fn record_issued_number(&self, vendor_id: Uuid, number: i64) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO invoice_sequences (vendor_id, last_number) VALUES ($1, $2)
             ON CONFLICT (vendor_id) DO UPDATE SET last_number = EXCLUDED.last_number",
        )
        .bind(vendor_id)
        .bind(number)
        .execute(&self.pool)
        .await
        .map_err(backend)?;

        Ok(())
    }
}
