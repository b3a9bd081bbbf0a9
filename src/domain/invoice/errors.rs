use uuid::Uuid;

// ============================================================================
// Invoice Business Rule Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum InvoiceError {
    #[error("Order not found: {0}")]
    OrderNotFound(Uuid),

    #[error("No invoice exists for order {0}")]
    NotFound(Uuid),

    #[error("Cancelled orders cannot be invoiced")]
    OrderCancelled,

    #[error("Order has no shipment for vendor {0}")]
    VendorNotOnOrder(Uuid),

    #[error("Vendor billing profile is incomplete")]
    BillingIncomplete,

    #[error("Invoice has already been sent and cannot be modified")]
    AlreadySent,

    #[error("Invoice lines cannot be empty")]
    EmptyLines,

    #[error("Invoice number must be positive, got {0}")]
    InvalidNumber(i64),

    #[error("Billing profile lookup failed: {0}")]
    Billing(String),

    #[error(transparent)]
    Storage(#[from] anyhow::Error),
}
