use {
    crate::domain::{
        error::EngineError,
        gateway::{CreateSubscriptionParams, GatewayClient, GatewayError, SubscriptionMetadata},
        ids::MandateId,
        interval::Interval,
        store::{LedgerStore, StoreError},
        subscription::{Subscription, SubscriptionStatus},
        transaction::{Mode, Transaction},
    },
    chrono::Utc,
    std::sync::Arc,
    thiserror::Error,
    uuid::Uuid,
};

use super::mandate::MandateValidator;

#[derive(Debug, Error)]
pub enum ProvisionError {
    /// The transaction has no resolvable donor; a schedule needs a payer.
    #[error("transaction {0} has no donor")]
    MissingDonor(Uuid),

    /// The donor was never registered with the gateway.
    #[error("donor {0} has no gateway customer id")]
    MissingCustomerId(Uuid),

    /// Terminal: the donor must re-authorize before any retry can work.
    #[error("no usable mandate for donor {donor_id}")]
    NoUsableMandate { donor_id: Uuid },

    #[error("store: {0}")]
    Store(#[from] StoreError),

    /// The local row was already inserted and stays Pending; retrying the
    /// gateway call risks a duplicate schedule, so this is terminal too.
    #[error("gateway: {0}")]
    Gateway(#[from] GatewayError),
}

/// Creates a local subscription record and the corresponding gateway
/// recurring schedule from a paid first payment.
pub struct SubscriptionProvisioner {
    store: Arc<dyn LedgerStore>,
    gateway: Arc<dyn GatewayClient>,
    mandates: MandateValidator,
    webhook_url: String,
}

impl SubscriptionProvisioner {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        gateway: Arc<dyn GatewayClient>,
        webhook_url: impl Into<String>,
    ) -> Self {
        let mandates = MandateValidator::new(gateway.clone());
        Self {
            store,
            gateway,
            mandates,
            webhook_url: webhook_url.into(),
        }
    }

    /// Returns the local subscription id. The local row is inserted before
    /// the gateway call so its id can travel in the gateway metadata; a
    /// gateway failure leaves that row Pending and unbilled, which is the
    /// operator-visible symptom rather than a silent retry.
    pub async fn provision(
        &self,
        transaction: &Transaction,
        mandate_id: &MandateId,
        interval: Interval,
        years: u32,
    ) -> Result<Uuid, ProvisionError> {
        let donor_id = transaction
            .donor_id
            .ok_or(ProvisionError::MissingDonor(transaction.id))?;
        let donor = self
            .store
            .get_donor(donor_id)
            .await?
            .ok_or(ProvisionError::MissingDonor(transaction.id))?;
        let customer_id = donor
            .vendor_customer_id
            .clone()
            .ok_or(ProvisionError::MissingCustomerId(donor.id))?;

        if !self.mandates.is_usable(&customer_id, mandate_id).await {
            return Err(ProvisionError::NoUsableMandate { donor_id: donor.id });
        }

        let subscription = Subscription::pending(
            transaction.value.clone(),
            interval,
            years,
            transaction.id,
            donor.id,
            transaction.campaign_id,
            customer_id.clone(),
        );
        let local_id = self.store.insert_subscription(&subscription).await?;

        // Sandbox schedules must start immediately; live ones one interval
        // after the first payment that just settled.
        let start_date = match transaction.mode {
            Mode::Test => None,
            Mode::Live => Some(interval.next_date(Utc::now().date_naive())),
        };

        let params = CreateSubscriptionParams {
            amount: transaction.value.clone(),
            interval,
            start_date,
            times: interval.charges_over_years(years),
            description: format!(
                "Recurring donation of {} every {interval}",
                transaction.value
            ),
            mandate_id: mandate_id.clone(),
            webhook_url: self.webhook_url.clone(),
            metadata: SubscriptionMetadata {
                subscription_id: Some(local_id),
                donor_id: Some(donor.id),
                campaign_id: transaction.campaign_id.map(|id| id.to_string()),
            },
        };

        let created = match self.gateway.create_subscription(&customer_id, params).await {
            Ok(created) => created,
            Err(e) => {
                tracing::error!(
                    subscription_id = %local_id,
                    customer_id = %customer_id,
                    error = %e,
                    "gateway schedule creation failed, local row left pending"
                );
                return Err(e.into());
            }
        };

        self.store
            .patch_subscription_vendor(local_id, &created.id, created.status)
            .await?;

        tracing::info!(
            subscription_id = %local_id,
            vendor_subscription_id = %created.id,
            status = %created.status,
            "recurring schedule provisioned"
        );
        Ok(local_id)
    }

    /// Cancel a schedule on the gateway and mirror the state locally.
    /// Returns false when there is nothing cancelable or the gateway did
    /// not confirm the cancellation.
    pub async fn cancel(&self, subscription_id: Uuid) -> Result<bool, EngineError> {
        let Some(subscription) = self.store.get_subscription(subscription_id).await? else {
            tracing::warn!(%subscription_id, "cancel requested for unknown subscription");
            return Ok(false);
        };
        let Some(vendor_id) = subscription.vendor_subscription_id.as_ref() else {
            tracing::warn!(%subscription_id, "subscription has no gateway schedule to cancel");
            return Ok(false);
        };

        let canceled = match self
            .gateway
            .cancel_subscription(&subscription.vendor_customer_id, vendor_id)
            .await
        {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(%subscription_id, error = %e, "gateway cancel failed");
                return Ok(false);
            }
        };

        if canceled.status != SubscriptionStatus::Canceled {
            tracing::warn!(
                %subscription_id,
                status = %canceled.status,
                "gateway did not confirm cancellation"
            );
            return Ok(false);
        }

        self.store
            .patch_subscription_status(subscription_id, SubscriptionStatus::Canceled)
            .await?;
        Ok(true)
    }
}
