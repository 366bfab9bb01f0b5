use {
    crate::domain::{
        error::EngineError,
        event::DomainEvent,
        gateway::{GatewayClient, GatewayPayment, SubscriptionMetadata},
        ids::PaymentId,
        interval::Interval,
        store::LedgerStore,
        transaction::{RefundTotals, SequenceType, Transaction, TransactionStatus},
    },
    std::sync::Arc,
    tokio::sync::broadcast,
    uuid::Uuid,
};

use super::{lock::KeyedLock, provisioner::SubscriptionProvisioner};

#[derive(Debug)]
pub enum ReconcileOutcome {
    /// The notification maps to no local transaction — absorbed silently.
    Unknown,
    /// The transaction already left its open window; duplicate delivery.
    Duplicate(Uuid),
    /// Status copied through from the gateway.
    Updated(Uuid),
    /// First payment settled and a recurring schedule was registered.
    Provisioned {
        transaction_id: Uuid,
        subscription_id: Uuid,
    },
    /// Payment is paid but schedule registration failed; the transaction
    /// keeps its paid state and the failure is operator-visible.
    ProvisioningFailed(Uuid),
    /// Refund amounts recorded from the gateway's totals.
    Refunded(Uuid),
}

/// The webhook-triggered state machine: fetches the gateway's
/// authoritative view of a payment and drives the local transaction to
/// match it, provisioning a subscription when a first payment settles.
pub struct PaymentStatusReconciler {
    store: Arc<dyn LedgerStore>,
    gateway: Arc<dyn GatewayClient>,
    provisioner: SubscriptionProvisioner,
    events: broadcast::Sender<DomainEvent>,
    locks: KeyedLock,
}

impl PaymentStatusReconciler {
    pub fn new(
        store: Arc<dyn LedgerStore>,
        gateway: Arc<dyn GatewayClient>,
        provisioner: SubscriptionProvisioner,
    ) -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            store,
            gateway,
            provisioner,
            events,
            locks: KeyedLock::new(),
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }

    pub async fn reconcile(
        &self,
        payment_id: &PaymentId,
    ) -> Result<ReconcileOutcome, EngineError> {
        // Nothing local has been touched up to here, so a failed fetch is
        // safe to hand back to the queue for retry.
        let payment = self.gateway.get_payment(payment_id).await?;

        // Everything from resolution to the final write runs under the
        // per-payment lock; the duplicate guard below is a read-then-write.
        self.locks.sweep().await;
        let _guard = self.locks.acquire(payment_id.as_str()).await;

        let Some(mut transaction) = self.resolve_transaction(&payment).await? else {
            tracing::warn!(payment_id = %payment_id, "notification maps to no local transaction");
            return Ok(ReconcileOutcome::Unknown);
        };

        // Duplicate guard. Status leaves the open window exactly once,
        // here. The only transition allowed afterwards is a refund
        // arriving against a paid transaction.
        let refund_on_paid =
            payment.has_refunds() && transaction.status == Some(TransactionStatus::Paid);
        if transaction.is_settled() && !refund_on_paid {
            tracing::debug!(
                transaction_id = %transaction.id,
                status = ?transaction.status,
                "duplicate notification, already processed"
            );
            return Ok(ReconcileOutcome::Duplicate(transaction.id));
        }

        let outcome = if payment.is_paid() && !payment.has_refunds() && !payment.has_chargebacks()
        {
            self.apply_paid(&mut transaction, &payment).await?
        } else if payment.has_refunds() {
            self.apply_refund(&mut transaction, &payment).await?
        } else {
            self.apply_passthrough(&mut transaction, &payment).await?
        };

        if let Some(status) = transaction.status {
            self.emit(DomainEvent::TransactionStatusChanged {
                transaction_id: transaction.id,
                status,
            });
        }

        Ok(outcome)
    }

    // ── branches ──────────────────────────────────────────────────────

    async fn apply_paid(
        &self,
        transaction: &mut Transaction,
        payment: &GatewayPayment,
    ) -> Result<ReconcileOutcome, EngineError> {
        copy_gateway_state(transaction, payment);
        self.store.update_transaction(transaction).await?;
        tracing::info!(
            transaction_id = %transaction.id,
            payment_id = %payment.id,
            sequence_type = %payment.sequence_type,
            "transaction marked paid"
        );

        if payment.sequence_type != SequenceType::First {
            return Ok(ReconcileOutcome::Updated(transaction.id));
        }

        match self.provision_first(transaction, payment).await {
            Ok(subscription_id) => {
                transaction.subscription_id = Some(subscription_id);
                self.store.update_transaction(transaction).await?;
                Ok(ReconcileOutcome::Provisioned {
                    transaction_id: transaction.id,
                    subscription_id,
                })
            }
            Err(e) => {
                // The payment stays paid; a human resolves the schedule.
                tracing::error!(
                    transaction_id = %transaction.id,
                    payment_id = %payment.id,
                    error = %e,
                    "subscription provisioning failed"
                );
                Ok(ReconcileOutcome::ProvisioningFailed(transaction.id))
            }
        }
    }

    async fn provision_first(
        &self,
        transaction: &Transaction,
        payment: &GatewayPayment,
    ) -> Result<Uuid, EngineError> {
        let mandate_id = payment.mandate_id.as_ref().ok_or_else(|| {
            EngineError::Validation(format!(
                "first payment {} carries no mandate id",
                payment.id
            ))
        })?;
        let frequency = payment.metadata.frequency.as_deref().ok_or_else(|| {
            EngineError::Validation(format!(
                "first payment {} carries no recurrence frequency",
                payment.id
            ))
        })?;
        let interval = Interval::parse(frequency)?;
        let years = payment.metadata.years.unwrap_or(0);

        self.provisioner
            .provision(transaction, mandate_id, interval, years)
            .await
            .map_err(|e| EngineError::Validation(e.to_string()))
    }

    async fn apply_refund(
        &self,
        transaction: &mut Transaction,
        payment: &GatewayPayment,
    ) -> Result<ReconcileOutcome, EngineError> {
        let refunded = payment.amount_refunded.clone().ok_or_else(|| {
            EngineError::Validation(format!("payment {} reports refunds without totals", payment.id))
        })?;
        let remaining = payment
            .amount_remaining
            .clone()
            .unwrap_or_else(|| payment.amount.clone());

        transaction.status = Some(payment.status);
        transaction.vendor_payment_id = Some(payment.id.clone());
        transaction.refunds = Some(RefundTotals {
            refunded: refunded.clone(),
            remaining: remaining.clone(),
        });
        self.store.update_transaction(transaction).await?;

        tracing::info!(
            transaction_id = %transaction.id,
            refunded = %refunded,
            remaining = %remaining,
            "refund recorded"
        );
        self.emit(DomainEvent::PaymentRefunded {
            transaction_id: transaction.id,
            refunded,
            remaining,
        });
        Ok(ReconcileOutcome::Refunded(transaction.id))
    }

    async fn apply_passthrough(
        &self,
        transaction: &mut Transaction,
        payment: &GatewayPayment,
    ) -> Result<ReconcileOutcome, EngineError> {
        copy_gateway_state(transaction, payment);
        self.store.update_transaction(transaction).await?;
        tracing::info!(
            transaction_id = %transaction.id,
            status = %payment.status,
            "transaction status copied from gateway"
        );
        Ok(ReconcileOutcome::Updated(transaction.id))
    }

    // ── resolution ────────────────────────────────────────────────────

    /// Locate the local transaction for a gateway payment, creating one
    /// for recurring follow-up charges that have no local row yet.
    async fn resolve_transaction(
        &self,
        payment: &GatewayPayment,
    ) -> Result<Option<Transaction>, EngineError> {
        if payment.sequence_type == SequenceType::Recurring {
            return self.resolve_recurring(payment).await;
        }

        // One-off and first payments are created by the donor-facing flow
        // with their local id planted in the gateway metadata. Payments
        // created before that metadata existed fall back to the vendor id.
        if let Some(transaction_id) = payment.metadata.transaction_id
            && let Some(transaction) = self.store.get_transaction(transaction_id).await?
        {
            return Ok(Some(transaction));
        }
        Ok(self
            .store
            .find_transaction_by_vendor_payment_id(&payment.id)
            .await?)
    }

    async fn resolve_recurring(
        &self,
        payment: &GatewayPayment,
    ) -> Result<Option<Transaction>, EngineError> {
        // A retried delivery may already have created the row.
        if let Some(existing) = self
            .store
            .find_transaction_by_vendor_payment_id(&payment.id)
            .await?
        {
            return Ok(Some(existing));
        }

        let schedule_metadata = self.fetch_schedule_metadata(payment).await?;

        let campaign_id = self
            .resolve_campaign(payment, &schedule_metadata)
            .await?;
        let subscription_id = self
            .resolve_subscription(payment, &schedule_metadata)
            .await?;
        let donor_id = self.resolve_donor(payment, &schedule_metadata).await?;

        // A recurring charge only makes sense against a known schedule.
        // Creating a row here would let anyone probing the endpoint with
        // a fabricated payment id grow the ledger.
        let Some(subscription_id) = subscription_id else {
            tracing::warn!(
                payment_id = %payment.id,
                "recurring charge resolves to no local subscription"
            );
            return Ok(None);
        };

        let mut transaction = Transaction::new(
            payment.amount.clone(),
            SequenceType::Recurring,
            payment.mode,
        );
        transaction.vendor_payment_id = Some(payment.id.clone());
        transaction.donor_id = donor_id;
        transaction.campaign_id = campaign_id;
        transaction.subscription_id = Some(subscription_id);

        let id = self.store.insert_transaction(&transaction).await?;
        tracing::info!(
            transaction_id = %id,
            payment_id = %payment.id,
            "created transaction for recurring charge"
        );
        Ok(self.store.get_transaction(id).await?)
    }

    /// The gateway schedule's metadata supplements the payment's own; for
    /// schedules created before payments carried correlation ids it is
    /// the only source. A transient fetch failure propagates so the queue
    /// retries; a definitive one degrades to empty metadata.
    async fn fetch_schedule_metadata(
        &self,
        payment: &GatewayPayment,
    ) -> Result<SubscriptionMetadata, EngineError> {
        let (Some(customer_id), Some(subscription_id)) =
            (payment.customer_id.as_ref(), payment.subscription_id.as_ref())
        else {
            return Ok(SubscriptionMetadata::default());
        };

        match self
            .gateway
            .get_subscription(customer_id, subscription_id)
            .await
        {
            Ok(schedule) => Ok(schedule.metadata),
            Err(e) if e.is_transient() => Err(e.into()),
            Err(e) => {
                tracing::warn!(
                    payment_id = %payment.id,
                    subscription_id = %subscription_id,
                    error = %e,
                    "gateway schedule not readable, resolving from payment metadata only"
                );
                Ok(SubscriptionMetadata::default())
            }
        }
    }

    /// Prefer the local campaign id in metadata; fall back to a slug
    /// lookup. Compatibility shim for pre-migration data: resolving
    /// nothing leaves the campaign reference absent, never errors.
    async fn resolve_campaign(
        &self,
        payment: &GatewayPayment,
        schedule: &SubscriptionMetadata,
    ) -> Result<Option<Uuid>, EngineError> {
        let reference = payment
            .metadata
            .campaign_id
            .as_deref()
            .or(schedule.campaign_id.as_deref());
        let Some(reference) = reference else {
            return Ok(None);
        };

        if let Ok(id) = reference.parse::<Uuid>()
            && let Some(campaign) = self.store.get_campaign(id).await?
        {
            return Ok(Some(campaign.id));
        }
        Ok(self
            .store
            .find_campaign_by_slug(reference)
            .await?
            .map(|c| c.id))
    }

    async fn resolve_subscription(
        &self,
        payment: &GatewayPayment,
        schedule: &SubscriptionMetadata,
    ) -> Result<Option<Uuid>, EngineError> {
        if let Some(id) = payment.metadata.subscription_id.or(schedule.subscription_id) {
            return Ok(Some(id));
        }
        // Schedules created before metadata carried the local id.
        let Some(vendor_id) = payment.subscription_id.as_ref() else {
            return Ok(None);
        };
        Ok(self
            .store
            .find_subscription_by_vendor_subscription_id(vendor_id)
            .await?
            .map(|s| s.id))
    }

    async fn resolve_donor(
        &self,
        payment: &GatewayPayment,
        schedule: &SubscriptionMetadata,
    ) -> Result<Option<Uuid>, EngineError> {
        if let Some(id) = payment.metadata.donor_id.or(schedule.donor_id) {
            return Ok(Some(id));
        }
        // Legacy records: resolve through the gateway customer id.
        let Some(customer_id) = payment.customer_id.as_ref() else {
            return Ok(None);
        };
        Ok(self
            .store
            .find_donor_by_vendor_customer_id(customer_id)
            .await?
            .map(|d| d.id))
    }

    fn emit(&self, event: DomainEvent) {
        // No subscribers is fine; listeners are optional collaborators.
        let _ = self.events.send(event);
    }
}

/// The paid and passthrough branches copy the same authoritative fields.
fn copy_gateway_state(transaction: &mut Transaction, payment: &GatewayPayment) {
    transaction.status = Some(payment.status);
    transaction.vendor_payment_id = Some(payment.id.clone());
    transaction.value = payment.amount.clone();
    transaction.sequence_type = payment.sequence_type;
    transaction.method = payment.method.clone();
    transaction.mode = payment.mode;
}
