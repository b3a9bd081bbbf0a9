// ============================================================================
// Order Domain
// ============================================================================
//
// ALL order-specific code lives here:
// - Value objects (status vocabularies, cancel reasons)
// - Records (Order, Shipment)
// - Status resolver & cancellability policy (pure)
// - Commands and transition validation (pure)
// - Errors (OrderError enum)
// - Lifecycle controller (orchestration)
//
// ============================================================================

pub mod commands;
pub mod controller;
pub mod errors;
pub mod lifecycle;
pub mod model;
pub mod status;
pub mod value_objects;
