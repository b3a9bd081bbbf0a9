// ============================================================================
// Invoice Domain
// ============================================================================
//
// Invoicing runs parallel to the order lifecycle: any non-cancelled order
// can be invoiced at any time, gated only on the vendor's billing profile.
//
// ============================================================================

pub mod errors;
pub mod model;
pub mod service;
