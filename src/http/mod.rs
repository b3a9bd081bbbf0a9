use std::sync::Arc;

use actix_web::http::StatusCode;
use actix_web::{web, App, HttpResponse, HttpServer, ResponseError};

use crate::domain::invoice::errors::InvoiceError;
use crate::domain::invoice::service::InvoiceService;
use crate::domain::order::controller::OrderLifecycleController;
use crate::domain::order::errors::OrderError;

pub mod handlers;

// ============================================================================
// HTTP Layer
// ============================================================================
//
// Request/response only; every mutation is a single server-authoritative
// call. Status and cancellability never travel inbound on the wire - they
// are derived on every read from the persisted order + shipment records.
//
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub controller: Arc<OrderLifecycleController>,
    pub invoices: Arc<InvoiceService>,
}

/// Error envelope every handler funnels into; maps the domain taxonomy onto
/// HTTP statuses. Bodies are `{"error": "<message>"}`.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error(transparent)]
    Order(#[from] OrderError),

    #[error(transparent)]
    Invoice(#[from] InvoiceError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,

            ApiError::Order(err) => match err {
                OrderError::NotFound(_) | OrderError::ShipmentNotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                OrderError::InvalidTransition { .. }
                | OrderError::CancellationLocked
                | OrderError::ShipmentAlreadyMoving
                | OrderError::VersionConflict => StatusCode::CONFLICT,
                OrderError::MissingCancelNote
                | OrderError::MissingConsent(_)
                | OrderError::InvalidDimensions(_) => StatusCode::BAD_REQUEST,
                OrderError::Courier(_) => StatusCode::BAD_GATEWAY,
                OrderError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },

            ApiError::Invoice(err) => match err {
                InvoiceError::OrderNotFound(_) | InvoiceError::NotFound(_) => {
                    StatusCode::NOT_FOUND
                }
                InvoiceError::OrderCancelled
                | InvoiceError::AlreadySent
                | InvoiceError::BillingIncomplete => StatusCode::CONFLICT,
                InvoiceError::VendorNotOnOrder(_)
                | InvoiceError::EmptyLines
                | InvoiceError::InvalidNumber(_) => StatusCode::BAD_REQUEST,
                InvoiceError::Billing(_) => StatusCode::BAD_GATEWAY,
                InvoiceError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        self.status()
    }

    fn error_response(&self) -> HttpResponse {
        if self.status().is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        HttpResponse::build(self.status()).json(serde_json::json!({
            "error": self.to_string(),
        }))
    }
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/health", web::get().to(handlers::health))
        .route("/orders/{id}", web::get().to(handlers::get_order))
        .route(
            "/vendor/orders/{id}/status",
            web::patch().to(handlers::patch_vendor_status),
        )
        .route(
            "/admin/orders/{id}/cancel",
            web::post().to(handlers::admin_cancel),
        )
        .route(
            "/admin/orders/{id}/mark-fulfilled",
            web::post().to(handlers::admin_mark_fulfilled),
        )
        .route(
            "/admin/orders/{id}/notes",
            web::patch().to(handlers::patch_admin_notes),
        )
        .route(
            "/vendor/shipments/{id}/schedule-pickup",
            web::post().to(handlers::schedule_shipment_pickup),
        )
        .route(
            "/vendor/orders/{id}/invoice",
            web::get().to(handlers::get_invoice),
        )
        .route(
            "/vendor/orders/{id}/invoice",
            web::post().to(handlers::post_invoice),
        )
        .route(
            "/vendor/orders/{id}/invoice/send",
            web::post().to(handlers::send_invoice),
        );
}

/// Serve the API until shutdown.
pub async fn run_server(state: AppState, bind_addr: &str) -> std::io::Result<()> {
    tracing::info!("📡 Serving marketplace order API on http://{}", bind_addr);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(state.clone()))
            .configure(configure)
    })
    .bind(bind_addr)?
    .run()
    .await
}
