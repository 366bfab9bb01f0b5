use {
    crate::domain::{
        error::EngineError, gateway::GatewayClient, ids::CustomerId, store::LedgerStore,
    },
    std::sync::Arc,
    uuid::Uuid,
};

/// Keeps donors registered as gateway customers. Called from the
/// donation-create flow before a first payment so the mandate and the
/// recurring schedule have a payer identity to hang off.
pub struct DonorSync {
    store: Arc<dyn LedgerStore>,
    gateway: Arc<dyn GatewayClient>,
}

impl DonorSync {
    pub fn new(store: Arc<dyn LedgerStore>, gateway: Arc<dyn GatewayClient>) -> Self {
        Self { store, gateway }
    }

    /// Return the donor's gateway customer id, creating the gateway
    /// customer and patching the donor record when it has none yet.
    pub async fn ensure_customer(&self, donor_id: Uuid) -> Result<CustomerId, EngineError> {
        let donor = self
            .store
            .get_donor(donor_id)
            .await?
            .ok_or_else(|| EngineError::Validation(format!("unknown donor: {donor_id}")))?;

        if let Some(customer_id) = donor.vendor_customer_id {
            // Confirm the customer still exists gateway-side; a stale id
            // would make every later schedule call fail opaquely.
            self.gateway.get_customer(&customer_id).await?;
            return Ok(customer_id);
        }

        let customer = self
            .gateway
            .create_customer(&donor.email, &donor.name)
            .await?;
        self.store
            .patch_donor_customer(donor.id, &customer.id)
            .await?;
        tracing::info!(%donor_id, customer_id = %customer.id, "donor registered with gateway");
        Ok(customer.id)
    }
}
