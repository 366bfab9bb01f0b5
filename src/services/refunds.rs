use {
    crate::domain::{
        gateway::{GatewayClient, GatewayRefundStatus},
        store::LedgerStore,
    },
    std::sync::Arc,
    uuid::Uuid,
};

/// Issues full-value refunds against settled transactions. Refunds are
/// asynchronous on the gateway side: "pending" confirms the request was
/// accepted, settlement arrives later through the webhook.
pub struct RefundService {
    store: Arc<dyn LedgerStore>,
    gateway: Arc<dyn GatewayClient>,
}

impl RefundService {
    pub fn new(store: Arc<dyn LedgerStore>, gateway: Arc<dyn GatewayClient>) -> Self {
        Self { store, gateway }
    }

    /// True only when the gateway reports the refund request as pending.
    /// Any other outcome, or any error, is false.
    pub async fn refund(&self, transaction_id: Uuid) -> bool {
        let transaction = match self.store.get_transaction(transaction_id).await {
            Ok(Some(t)) => t,
            Ok(None) => {
                tracing::warn!(%transaction_id, "refund requested for unknown transaction");
                return false;
            }
            Err(e) => {
                tracing::error!(%transaction_id, error = %e, "refund lookup failed");
                return false;
            }
        };

        let Some(payment_id) = transaction.vendor_payment_id.as_ref() else {
            tracing::warn!(%transaction_id, "transaction has no gateway payment to refund");
            return false;
        };

        match self.gateway.create_refund(payment_id, &transaction.value).await {
            Ok(refund) if refund.status == GatewayRefundStatus::Pending => {
                tracing::info!(
                    %transaction_id,
                    payment_id = %payment_id,
                    refund_id = %refund.id,
                    "refund request accepted"
                );
                true
            }
            Ok(refund) => {
                tracing::warn!(
                    %transaction_id,
                    refund_id = %refund.id,
                    status = ?refund.status,
                    "gateway did not confirm refund request"
                );
                false
            }
            Err(e) => {
                tracing::error!(%transaction_id, error = %e, "refund request failed");
                false
            }
        }
    }
}
