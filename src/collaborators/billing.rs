use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

// ============================================================================
// Billing Profile Collaborator
// ============================================================================
//
// Invoicing is gated on the vendor having complete billing details on file.
// The profile data itself lives in a separate service; this core only asks
// whether the profile is complete.
//
// ============================================================================

#[async_trait]
pub trait BillingProfiles: Send + Sync {
    async fn is_complete(&self, vendor_id: Uuid) -> Result<bool>;
}

/// Dev/demo implementation: every vendor passes the billing gate.
pub struct AlwaysCompleteBilling;

#[async_trait]
impl BillingProfiles for AlwaysCompleteBilling {
    async fn is_complete(&self, _vendor_id: Uuid) -> Result<bool> {
        Ok(true)
    }
}
