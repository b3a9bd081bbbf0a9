use std::sync::Arc;

use chrono::Utc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};
use uuid::Uuid;

mod collaborators;
mod domain;
mod http;
mod store;

use collaborators::{AlwaysCompleteBilling, LoggingCourier, LoggingNotifier};
use domain::invoice::service::InvoiceService;
use domain::order::controller::OrderLifecycleController;
use domain::order::model::{Order, Shipment, ShipmentItem};
use domain::order::value_objects::{OrderState, ShipmentStatus};
use store::{InvoiceStore, MemoryStore, OrderStore, PgStore};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    // Structured logging with environment-based filtering; override with
    // RUST_LOG, e.g. RUST_LOG=debug cargo run
    tracing_subscriber::registry()
        .with(fmt::layer().with_target(true))
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,marketplace_orders=debug")),
        )
        .init();

    tracing::info!("🚀 Starting marketplace order lifecycle service");

    // === 1. Pick the storage backend ===
    let (orders, invoices): (Arc<dyn OrderStore>, Arc<dyn InvoiceStore>) =
        match std::env::var("DATABASE_URL") {
            Ok(url) => {
                tracing::info!("Connecting to Postgres...");
                let pg = Arc::new(PgStore::connect(&url).await?);
                (pg.clone(), pg)
            }
            Err(_) => {
                tracing::warn!("DATABASE_URL not set, using in-memory store (dev mode)");
                let mem = Arc::new(MemoryStore::new());
                seed_demo_order(mem.as_ref()).await?;
                (mem.clone(), mem)
            }
        };

    // === 2. Wire collaborators (dev stubs; deployments plug in real clients) ===
    let courier = Arc::new(LoggingCourier);
    let notifier = Arc::new(LoggingNotifier);
    let billing = Arc::new(AlwaysCompleteBilling);

    // === 3. Build the domain services ===
    let controller = Arc::new(OrderLifecycleController::new(
        orders.clone(),
        courier,
        notifier,
    ));
    let invoice_service = Arc::new(InvoiceService::new(orders, invoices, billing));

    // === 4. Serve ===
    let bind_addr = std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8080".to_string());

    http::run_server(
        http::AppState {
            controller,
            invoices: invoice_service,
        },
        &bind_addr,
    )
    .await?;

    Ok(())
}

/// Dev-mode convenience: seed one two-vendor order so the API has something
/// to serve out of the box.
async fn seed_demo_order(store: &MemoryStore) -> anyhow::Result<()> {
    let order_id = Uuid::new_v4();
    let vendor_a = Uuid::new_v4();
    let vendor_b = Uuid::new_v4();

    let order = Order {
        id: order_id,
        state: OrderState::Placed,
        shipments: vec![
            Shipment {
                id: Uuid::new_v4(),
                order_id,
                vendor_id: vendor_a,
                status: ShipmentStatus::Pending,
                items: vec![ShipmentItem {
                    title: "Ceramic mug".into(),
                    quantity: 2,
                    unit_price: 4_00,
                }],
                awb: None,
            },
            Shipment {
                id: Uuid::new_v4(),
                order_id,
                vendor_id: vendor_b,
                status: ShipmentStatus::Pending,
                items: vec![ShipmentItem {
                    title: "Walnut serving board".into(),
                    quantity: 1,
                    unit_price: 30_00,
                }],
                awb: None,
            },
        ],
        cancel_reason: None,
        cancel_reason_note: None,
        created_at: Utc::now(),
        subtotal: 38_00,
        shipping_total: 9_00,
        admin_notes: None,
        invoice_number: None,
        invoice_date: None,
        awb: None,
        pickup_date: None,
        pickup_slot: None,
        version: 1,
    };

    store.insert_order(&order).await?;
    tracing::info!(order_id = %order_id, "✅ Seeded demo order");

    Ok(())
}
