use {
    crate::domain::{
        gateway::GatewayClient,
        ids::{CustomerId, MandateId},
    },
    std::sync::Arc,
};

/// Checks whether a customer holds a usable recurring-payment
/// authorization. Fails closed: any gateway error counts as not usable.
pub struct MandateValidator {
    gateway: Arc<dyn GatewayClient>,
}

impl MandateValidator {
    pub fn new(gateway: Arc<dyn GatewayClient>) -> Self {
        Self { gateway }
    }

    pub async fn is_usable(&self, customer_id: &CustomerId, mandate_id: &MandateId) -> bool {
        match self.gateway.get_mandate(customer_id, mandate_id).await {
            Ok(mandate) => mandate.is_valid() || mandate.is_pending(),
            Err(e) => {
                tracing::error!(
                    customer_id = %customer_id,
                    mandate_id = %mandate_id,
                    error = %e,
                    "mandate lookup failed, treating as not usable"
                );
                false
            }
        }
    }
}
