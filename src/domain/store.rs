use {
    super::campaign::Campaign,
    super::donor::Donor,
    super::ids::{CustomerId, PaymentId, VendorSubscriptionId},
    super::subscription::{Subscription, SubscriptionStatus},
    super::transaction::Transaction,
    async_trait::async_trait,
    thiserror::Error,
    uuid::Uuid,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("corrupt record: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Persistence contract for the ledger. Row-level atomicity per call is
/// assumed; there are no cross-record transactions, so every multi-step
/// write sequence in the services layer must leave valid state behind at
/// any interruption point.
#[async_trait]
pub trait LedgerStore: Send + Sync {
    // ── transactions ──────────────────────────────────────────────────

    async fn get_transaction(&self, id: Uuid) -> Result<Option<Transaction>, StoreError>;

    async fn find_transaction_by_vendor_payment_id(
        &self,
        vendor_payment_id: &PaymentId,
    ) -> Result<Option<Transaction>, StoreError>;

    async fn insert_transaction(&self, transaction: &Transaction) -> Result<Uuid, StoreError>;

    async fn update_transaction(&self, transaction: &Transaction) -> Result<bool, StoreError>;

    // ── donors ────────────────────────────────────────────────────────

    async fn get_donor(&self, id: Uuid) -> Result<Option<Donor>, StoreError>;

    async fn find_donor_by_vendor_customer_id(
        &self,
        vendor_customer_id: &CustomerId,
    ) -> Result<Option<Donor>, StoreError>;

    async fn insert_donor(&self, donor: &Donor) -> Result<Uuid, StoreError>;

    async fn patch_donor_customer(
        &self,
        id: Uuid,
        vendor_customer_id: &CustomerId,
    ) -> Result<bool, StoreError>;

    // ── subscriptions ─────────────────────────────────────────────────

    async fn get_subscription(&self, id: Uuid) -> Result<Option<Subscription>, StoreError>;

    async fn find_subscription_by_vendor_subscription_id(
        &self,
        vendor_subscription_id: &VendorSubscriptionId,
    ) -> Result<Option<Subscription>, StoreError>;

    async fn insert_subscription(&self, subscription: &Subscription) -> Result<Uuid, StoreError>;

    async fn patch_subscription_vendor(
        &self,
        id: Uuid,
        vendor_subscription_id: &VendorSubscriptionId,
        status: SubscriptionStatus,
    ) -> Result<bool, StoreError>;

    async fn patch_subscription_status(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<bool, StoreError>;

    // ── campaigns ─────────────────────────────────────────────────────

    async fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>, StoreError>;

    async fn find_campaign_by_slug(&self, slug: &str) -> Result<Option<Campaign>, StoreError>;
}
