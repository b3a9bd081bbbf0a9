// ============================================================================
// External Collaborators
// ============================================================================
//
// Narrow interfaces over services this core consumes but does not implement:
// courier pickup scheduling, customer/vendor notification, and vendor billing
// profiles. Each trait is object-safe and Arc-shared; real deployments plug
// in HTTP-backed clients, local runs and tests use the stub implementations
// defined alongside the traits.
//
// ============================================================================

pub mod billing;
pub mod courier;
pub mod notify;

pub use billing::{AlwaysCompleteBilling, BillingProfiles};
pub use courier::{
    Consents, CourierScheduling, LoggingCourier, PackageDimensions, PickupRequest, PickupWindow,
    ScheduledPickup,
};
pub use notify::{LoggingNotifier, Notifier};
