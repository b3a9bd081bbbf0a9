// ============================================================================
// Domain Layer - Business Logic
// ============================================================================
//
// Each capability has its own subdirectory:
// - order:   status resolution, cancellability, lifecycle transitions
// - invoice: drafting/sending invoices, numbering
//
// This layer is separate from storage, HTTP, and collaborator plumbing.
//
// ============================================================================

pub mod invoice;
pub mod order;
