use anyhow::Result;
use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ============================================================================
// Courier Scheduling Collaborator
// ============================================================================
//
// The courier provider is an external HTTP service. A pickup must be
// scheduled successfully BEFORE the order transition that depends on it is
// allowed to commit; a failure here leaves the order untouched and is
// surfaced to the caller, never retried silently.
//
// ============================================================================

/// Consent flags the courier requires before a pickup can be booked.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Consents {
    pub gdpr_processing: bool,
    pub packaging_confirmed: bool,
    pub fragile: bool,
    pub declared_value_accepted: bool,
    pub return_policy_ack: bool,
    pub driver_contact_consent: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupWindow {
    pub date: NaiveDate,
    /// e.g. "09:00-12:00"
    pub slot: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PackageDimensions {
    pub parcel_count: u32,
    pub weight_kg: f64,
    pub length_cm: f64,
    pub width_cm: f64,
    pub height_cm: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PickupRequest {
    pub consents: Consents,
    pub pickup: PickupWindow,
    pub dimensions: PackageDimensions,
}

/// Booking confirmation returned by the provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledPickup {
    pub awb: String,
}

#[async_trait]
pub trait CourierScheduling: Send + Sync {
    async fn schedule_pickup(
        &self,
        order_id: Uuid,
        request: &PickupRequest,
    ) -> Result<ScheduledPickup>;
}

/// Dev/demo implementation: books nothing, fabricates an AWB, logs the call.
pub struct LoggingCourier;

#[async_trait]
impl CourierScheduling for LoggingCourier {
    async fn schedule_pickup(
        &self,
        order_id: Uuid,
        request: &PickupRequest,
    ) -> Result<ScheduledPickup> {
        let awb = format!("DEV-{}", &order_id.simple().to_string()[..12]);

        tracing::info!(
            order_id = %order_id,
            pickup_date = %request.pickup.date,
            pickup_slot = %request.pickup.slot,
            parcel_count = request.dimensions.parcel_count,
            awb = %awb,
            "Courier pickup scheduled (logging stub)"
        );

        Ok(ScheduledPickup { awb })
    }
}
