use actix_web::{web, HttpResponse, Responder};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::collaborators::courier::PickupRequest;
use crate::domain::invoice::model::InvoiceLine;
use crate::domain::order::commands::OrderCommand;
use crate::domain::order::model::{Order, Shipment};
use crate::domain::order::status::{is_cancellable, resolve_display_status};
use crate::domain::order::value_objects::{
    AdminOrderStatus, CancelReason, DisplayStatus, ShipmentStatus, VendorOrderStatus,
};

use super::{ApiError, AppState};

// ============================================================================
// Request / Response Types
// ============================================================================

/// Outbound order representation. `display_status` and `cancellable` are
/// derived per read; clients never send them back.
#[derive(Debug, Serialize)]
pub struct OrderView {
    pub id: Uuid,
    pub status: AdminOrderStatus,
    pub vendor_status: VendorOrderStatus,
    pub display_status: DisplayStatus,
    pub cancellable: bool,
    pub shipments: Vec<ShipmentView>,
    pub cancel_reason: Option<CancelReason>,
    pub cancel_reason_note: Option<String>,
    pub created_at: DateTime<Utc>,
    pub subtotal: i64,
    pub shipping_total: i64,
    pub total: i64,
    pub admin_notes: Option<String>,
    pub invoice_number: Option<i64>,
    pub invoice_date: Option<NaiveDate>,
    pub awb: Option<String>,
    pub pickup_date: Option<NaiveDate>,
    pub pickup_slot: Option<String>,
    pub version: i64,
}

impl From<Order> for OrderView {
    fn from(order: Order) -> Self {
        let display_status = resolve_display_status(&order);
        let cancellable = is_cancellable(&order);
        let total = order.total();

        Self {
            id: order.id,
            status: order.state.to_admin(),
            vendor_status: order.state.to_vendor(),
            display_status,
            cancellable,
            shipments: order.shipments.into_iter().map(ShipmentView::from).collect(),
            cancel_reason: order.cancel_reason,
            cancel_reason_note: order.cancel_reason_note,
            created_at: order.created_at,
            subtotal: order.subtotal,
            shipping_total: order.shipping_total,
            total,
            admin_notes: order.admin_notes,
            invoice_number: order.invoice_number,
            invoice_date: order.invoice_date,
            awb: order.awb,
            pickup_date: order.pickup_date,
            pickup_slot: order.pickup_slot,
            version: order.version,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ShipmentView {
    pub id: Uuid,
    pub vendor_id: Uuid,
    pub status: ShipmentStatus,
    pub awb: Option<String>,
}

impl From<Shipment> for ShipmentView {
    fn from(s: Shipment) -> Self {
        Self {
            id: s.id,
            vendor_id: s.vendor_id,
            status: s.status,
            awb: s.awb,
        }
    }
}

/// Body of `PATCH /vendor/orders/{id}/status`.
#[derive(Debug, Deserialize)]
pub struct VendorStatusPatch {
    pub status: VendorOrderStatus,
    pub cancel_reason: Option<CancelReason>,
    pub cancel_reason_note: Option<String>,
    /// Required when `status` is `confirmed`.
    pub pickup: Option<PickupRequest>,
}

#[derive(Debug, Deserialize)]
pub struct NotesPatch {
    pub admin_notes: String,
}

#[derive(Debug, Deserialize)]
pub struct InvoiceDraftBody {
    /// Needed only when the order spans several vendors.
    pub vendor_id: Option<Uuid>,
    pub lines: Option<Vec<InvoiceLine>>,
    pub number: Option<i64>,
}

// ============================================================================
// Handlers
// ============================================================================

pub async fn health() -> impl Responder {
    HttpResponse::Ok().json(serde_json::json!({
        "status": "healthy",
        "service": "marketplace-orders",
    }))
}

pub async fn get_order(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order = state.controller.get_order(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(OrderView::from(order)))
}

pub async fn patch_vendor_status(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<VendorStatusPatch>,
) -> Result<HttpResponse, ApiError> {
    let body = body.into_inner();

    let command = match body.status {
        VendorOrderStatus::Preparing => OrderCommand::MarkPreparing,
        VendorOrderStatus::Confirmed => {
            let pickup = body.pickup.ok_or_else(|| {
                ApiError::Validation(
                    "confirming requires pickup details (consents, window, dimensions)".into(),
                )
            })?;
            OrderCommand::Confirm { pickup }
        }
        VendorOrderStatus::Fulfilled => OrderCommand::MarkFulfilled,
        VendorOrderStatus::Cancelled => {
            let reason = body.cancel_reason.ok_or_else(|| {
                ApiError::Validation("cancellation requires a cancel_reason".into())
            })?;
            OrderCommand::Cancel {
                reason,
                note: body.cancel_reason_note,
            }
        }
        VendorOrderStatus::New => {
            return Err(ApiError::Validation(
                "orders cannot transition back to 'new'".into(),
            ))
        }
    };

    let order = state.controller.execute(path.into_inner(), command).await?;
    Ok(HttpResponse::Ok().json(OrderView::from(order)))
}

pub async fn admin_cancel(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order = state
        .controller
        .execute(path.into_inner(), OrderCommand::AdminCancel)
        .await?;
    Ok(HttpResponse::Ok().json(OrderView::from(order)))
}

pub async fn admin_mark_fulfilled(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let order = state
        .controller
        .execute(path.into_inner(), OrderCommand::AdminMarkFulfilled)
        .await?;
    Ok(HttpResponse::Ok().json(OrderView::from(order)))
}

pub async fn patch_admin_notes(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<NotesPatch>,
) -> Result<HttpResponse, ApiError> {
    let order = state
        .controller
        .update_admin_notes(path.into_inner(), &body.admin_notes)
        .await?;
    Ok(HttpResponse::Ok().json(OrderView::from(order)))
}

pub async fn schedule_shipment_pickup(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<PickupRequest>,
) -> Result<HttpResponse, ApiError> {
    let shipment = state
        .controller
        .schedule_shipment_pickup(path.into_inner(), body.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(ShipmentView::from(shipment)))
}

pub async fn get_invoice(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let invoice = state.invoices.get_for_order(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(invoice))
}

pub async fn post_invoice(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
    body: web::Json<InvoiceDraftBody>,
) -> Result<HttpResponse, ApiError> {
    let order_id = path.into_inner();
    let body = body.into_inner();

    let vendor_id = match body.vendor_id {
        Some(v) => v,
        None => sole_vendor(&state, order_id).await?,
    };

    let invoice = state
        .invoices
        .draft(order_id, vendor_id, body.lines, body.number)
        .await?;
    Ok(HttpResponse::Ok().json(invoice))
}

pub async fn send_invoice(
    state: web::Data<AppState>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ApiError> {
    let invoice = state.invoices.send(path.into_inner()).await?;
    Ok(HttpResponse::Ok().json(invoice))
}

/// Resolve the acting vendor when the caller did not name one: unambiguous
/// only for single-vendor orders.
async fn sole_vendor(state: &AppState, order_id: Uuid) -> Result<Uuid, ApiError> {
    let order = state.controller.get_order(order_id).await?;

    let mut vendors: Vec<Uuid> = order.shipments.iter().map(|s| s.vendor_id).collect();
    vendors.sort();
    vendors.dedup();

    match vendors.as_slice() {
        [single] => Ok(*single),
        [] => Err(ApiError::Validation("order has no shipments to invoice".into())),
        _ => Err(ApiError::Validation(
            "order spans multiple vendors, vendor_id is required".into(),
        )),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collaborators::{AlwaysCompleteBilling, LoggingCourier, LoggingNotifier};
    use crate::domain::invoice::service::InvoiceService;
    use crate::domain::order::controller::OrderLifecycleController;
    use crate::domain::order::model::ShipmentItem;
    use crate::domain::order::value_objects::OrderState;
    use crate::store::{MemoryStore, OrderStore};
    use actix_web::{test, App};
    use std::sync::Arc;

    fn sample_order() -> Order {
        let id = Uuid::new_v4();
        Order {
            id,
            state: OrderState::Placed,
            shipments: vec![Shipment {
                id: Uuid::new_v4(),
                order_id: id,
                vendor_id: Uuid::new_v4(),
                status: ShipmentStatus::Pending,
                items: vec![ShipmentItem {
                    title: "Walnut board".into(),
                    quantity: 1,
                    unit_price: 30_00,
                }],
                awb: None,
            }],
            cancel_reason: None,
            cancel_reason_note: None,
            created_at: Utc::now(),
            subtotal: 30_00,
            shipping_total: 4_00,
            admin_notes: None,
            invoice_number: None,
            invoice_date: None,
            awb: None,
            pickup_date: None,
            pickup_slot: None,
            version: 1,
        }
    }

    async fn state_with(order: &Order) -> AppState {
        let store = Arc::new(MemoryStore::new());
        store.insert_order(order).await.unwrap();

        AppState {
            controller: Arc::new(OrderLifecycleController::new(
                store.clone(),
                Arc::new(LoggingCourier),
                Arc::new(LoggingNotifier),
            )),
            invoices: Arc::new(InvoiceService::new(
                store.clone(),
                store,
                Arc::new(AlwaysCompleteBilling),
            )),
        }
    }

    #[actix_web::test]
    async fn test_get_order_exposes_derived_fields() {
        let order = sample_order();
        let state = state_with(&order).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::http::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/orders/{}", order.id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["status"], "PAID");
        assert_eq!(body["vendor_status"], "new");
        assert_eq!(body["display_status"], "PENDING");
        assert_eq!(body["cancellable"], true);
        assert_eq!(body["total"], 34_00);
    }

    #[actix_web::test]
    async fn test_vendor_patch_moves_order_to_preparing() {
        let order = sample_order();
        let state = state_with(&order).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::http::configure),
        )
        .await;

        let req = test::TestRequest::patch()
            .uri(&format!("/vendor/orders/{}/status", order.id))
            .set_json(serde_json::json!({ "status": "preparing" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body["vendor_status"], "preparing");
        assert_eq!(body["status"], "PAID");
    }

    #[actix_web::test]
    async fn test_cancel_other_without_note_is_400() {
        let order = sample_order();
        let state = state_with(&order).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::http::configure),
        )
        .await;

        let req = test::TestRequest::patch()
            .uri(&format!("/vendor/orders/{}/status", order.id))
            .set_json(serde_json::json!({
                "status": "cancelled",
                "cancel_reason": "other"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_confirm_without_pickup_is_400() {
        let order = sample_order();
        let state = state_with(&order).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::http::configure),
        )
        .await;

        let req = test::TestRequest::patch()
            .uri(&format!("/vendor/orders/{}/status", order.id))
            .set_json(serde_json::json!({ "status": "confirmed" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_admin_cancel_then_fulfil_is_conflict() {
        let order = sample_order();
        let state = state_with(&order).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::http::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri(&format!("/admin/orders/{}/cancel", order.id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "CANCELLED");
        assert_eq!(body["display_status"], "CANCELED");

        let req = test::TestRequest::post()
            .uri(&format!("/admin/orders/{}/mark-fulfilled", order.id))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::CONFLICT);
    }

    #[actix_web::test]
    async fn test_unknown_order_is_404() {
        let order = sample_order();
        let state = state_with(&order).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::http::configure),
        )
        .await;

        let req = test::TestRequest::get()
            .uri(&format!("/orders/{}", Uuid::new_v4()))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn test_invoice_draft_and_send_round_trip() {
        let order = sample_order();
        let state = state_with(&order).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::http::configure),
        )
        .await;

        // Single-vendor order: vendor_id can be omitted.
        let req = test::TestRequest::post()
            .uri(&format!("/vendor/orders/{}/invoice", order.id))
            .set_json(serde_json::json!({}))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "draft");
        assert_eq!(body["lines"][0]["title"], "Walnut board");

        let req = test::TestRequest::post()
            .uri(&format!("/vendor/orders/{}/invoice/send", order.id))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "sent");
        assert_eq!(body["number"], 1);
    }

    #[actix_web::test]
    async fn test_admin_notes_patch_is_lifecycle_independent() {
        let order = sample_order();
        let state = state_with(&order).await;

        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state))
                .configure(crate::http::configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri(&format!("/admin/orders/{}/cancel", order.id))
            .to_request();
        test::call_service(&app, req).await;

        // Notes still writable on a cancelled order.
        let req = test::TestRequest::patch()
            .uri(&format!("/admin/orders/{}/notes", order.id))
            .set_json(serde_json::json!({ "admin_notes": "refund issued manually" }))
            .to_request();
        let body: serde_json::Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["admin_notes"], "refund issued manually");
    }
}
