use {
    super::money::Money,
    super::transaction::TransactionStatus,
    serde::Serialize,
    uuid::Uuid,
};

/// Outbound events for out-of-scope listeners (email receipts, invoicing).
/// Published on a broadcast channel after a successful state transition;
/// the engine never blocks on, or fails because of, a subscriber.
#[derive(Debug, Clone, Serialize)]
pub enum DomainEvent {
    TransactionStatusChanged {
        transaction_id: Uuid,
        status: TransactionStatus,
    },
    PaymentRefunded {
        transaction_id: Uuid,
        refunded: Money,
        remaining: Money,
    },
}

impl DomainEvent {
    pub fn topic(&self) -> String {
        match self {
            Self::TransactionStatusChanged { status, .. } => {
                format!("transaction.status.{status}")
            }
            Self::PaymentRefunded { .. } => "payment.refunded".to_string(),
        }
    }
}
