#![allow(dead_code)]

use give_sync::domain::campaign::Campaign;
use give_sync::domain::donor::Donor;
use give_sync::domain::gateway::{
    CreateSubscriptionParams, GatewayClient, GatewayCustomer, GatewayError, GatewayMandate,
    GatewayPayment, GatewayRefund, GatewayRefundStatus, GatewaySubscription, MandateStatus,
    PaymentMetadata, SubscriptionMetadata,
};
use give_sync::domain::ids::{CustomerId, MandateId, PaymentId, RefundId, VendorSubscriptionId};
use give_sync::domain::money::Money;
use give_sync::domain::store::{LedgerStore, StoreError};
use give_sync::domain::subscription::{Subscription, SubscriptionStatus};
use give_sync::domain::transaction::{Mode, SequenceType, Transaction, TransactionStatus};
use give_sync::services::provisioner::SubscriptionProvisioner;
use give_sync::services::reconciler::PaymentStatusReconciler;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use uuid::Uuid;

pub const WEBHOOK_URL: &str = "https://donations.example.org/payment/webhook";

pub fn eur(value: &str) -> Money {
    Money::parse(value, "EUR").unwrap()
}

/// A gateway payment with sensible defaults; tests override what matters.
pub fn make_payment(id: &str, status: TransactionStatus, sequence_type: SequenceType) -> GatewayPayment {
    GatewayPayment {
        id: PaymentId::new(id).unwrap(),
        status,
        sequence_type,
        amount: eur("10.00"),
        method: Some("ideal".to_string()),
        mode: Mode::Test,
        customer_id: None,
        subscription_id: None,
        mandate_id: None,
        metadata: PaymentMetadata::default(),
        amount_refunded: None,
        amount_remaining: None,
        amount_charged_back: None,
    }
}

// ── mock gateway ───────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockGateway {
    pub payments: Mutex<HashMap<String, GatewayPayment>>,
    pub customers: Mutex<HashMap<String, GatewayCustomer>>,
    pub mandates: Mutex<HashMap<String, GatewayMandate>>,
    pub schedules: Mutex<HashMap<String, GatewaySubscription>>,
    /// Every create_subscription call, recorded for assertions.
    pub created_schedules: Mutex<Vec<(CustomerId, CreateSubscriptionParams)>>,
    pub refund_calls: Mutex<Vec<(PaymentId, Money)>>,
    pub fail_get_payment: AtomicBool,
    pub fail_create_subscription: AtomicBool,
    pub fail_get_mandate: AtomicBool,
    pub fail_create_refund: AtomicBool,
    pub refund_status: Mutex<Option<GatewayRefundStatus>>,
    pub cancel_status: Mutex<Option<SubscriptionStatus>>,
    counter: AtomicU32,
}

impl MockGateway {
    pub fn new() -> Self {
        Self::default()
    }

    fn next(&self) -> u32 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    pub fn put_payment(&self, payment: GatewayPayment) {
        self.payments
            .lock()
            .unwrap()
            .insert(payment.id.as_str().to_string(), payment);
    }

    pub fn put_mandate(&self, id: &str, status: MandateStatus) {
        let mandate = GatewayMandate {
            id: MandateId::new(id).unwrap(),
            status,
            method: Some("directdebit".to_string()),
        };
        self.mandates
            .lock()
            .unwrap()
            .insert(id.to_string(), mandate);
    }

    pub fn put_customer(&self, id: &str, email: &str, name: &str) -> CustomerId {
        let customer_id = CustomerId::new(id).unwrap();
        let customer = GatewayCustomer {
            id: customer_id.clone(),
            email: email.to_string(),
            name: name.to_string(),
            mode: Mode::Test,
        };
        self.customers
            .lock()
            .unwrap()
            .insert(id.to_string(), customer);
        customer_id
    }

    pub fn put_schedule(&self, id: &str, customer_id: &str, metadata: SubscriptionMetadata) {
        let schedule = GatewaySubscription {
            id: VendorSubscriptionId::new(id).unwrap(),
            status: SubscriptionStatus::Active,
            customer_id: CustomerId::new(customer_id).unwrap(),
            metadata,
        };
        self.schedules
            .lock()
            .unwrap()
            .insert(id.to_string(), schedule);
    }

    pub fn created_schedule_count(&self) -> usize {
        self.created_schedules.lock().unwrap().len()
    }
}

fn not_found(what: &str) -> GatewayError {
    GatewayError::Api {
        status: 404,
        detail: format!("{what} not found"),
    }
}

#[async_trait]
impl GatewayClient for MockGateway {
    async fn get_payment(&self, id: &PaymentId) -> Result<GatewayPayment, GatewayError> {
        if self.fail_get_payment.load(Ordering::SeqCst) {
            return Err(GatewayError::Transport("connection reset".to_string()));
        }
        self.payments
            .lock()
            .unwrap()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| not_found("payment"))
    }

    async fn get_customer(&self, id: &CustomerId) -> Result<GatewayCustomer, GatewayError> {
        self.customers
            .lock()
            .unwrap()
            .get(id.as_str())
            .cloned()
            .ok_or_else(|| not_found("customer"))
    }

    async fn create_customer(
        &self,
        email: &str,
        name: &str,
    ) -> Result<GatewayCustomer, GatewayError> {
        let id = format!("cst_mock{}", self.next());
        let customer = GatewayCustomer {
            id: CustomerId::new(&id).unwrap(),
            email: email.to_string(),
            name: name.to_string(),
            mode: Mode::Test,
        };
        self.customers
            .lock()
            .unwrap()
            .insert(id, customer.clone());
        Ok(customer)
    }

    async fn get_mandate(
        &self,
        _customer_id: &CustomerId,
        mandate_id: &MandateId,
    ) -> Result<GatewayMandate, GatewayError> {
        if self.fail_get_mandate.load(Ordering::SeqCst) {
            return Err(GatewayError::Transport("connection reset".to_string()));
        }
        self.mandates
            .lock()
            .unwrap()
            .get(mandate_id.as_str())
            .cloned()
            .ok_or_else(|| not_found("mandate"))
    }

    async fn get_subscription(
        &self,
        _customer_id: &CustomerId,
        subscription_id: &VendorSubscriptionId,
    ) -> Result<GatewaySubscription, GatewayError> {
        self.schedules
            .lock()
            .unwrap()
            .get(subscription_id.as_str())
            .cloned()
            .ok_or_else(|| not_found("subscription"))
    }

    async fn create_subscription(
        &self,
        customer_id: &CustomerId,
        params: CreateSubscriptionParams,
    ) -> Result<GatewaySubscription, GatewayError> {
        if self.fail_create_subscription.load(Ordering::SeqCst) {
            self.created_schedules
                .lock()
                .unwrap()
                .push((customer_id.clone(), params));
            return Err(GatewayError::Transport("timed out".to_string()));
        }
        let id = format!("sub_mock{}", self.next());
        let schedule = GatewaySubscription {
            id: VendorSubscriptionId::new(&id).unwrap(),
            status: SubscriptionStatus::Active,
            customer_id: customer_id.clone(),
            metadata: params.metadata.clone(),
        };
        self.created_schedules
            .lock()
            .unwrap()
            .push((customer_id.clone(), params));
        self.schedules
            .lock()
            .unwrap()
            .insert(id, schedule.clone());
        Ok(schedule)
    }

    async fn cancel_subscription(
        &self,
        customer_id: &CustomerId,
        subscription_id: &VendorSubscriptionId,
    ) -> Result<GatewaySubscription, GatewayError> {
        let mut schedules = self.schedules.lock().unwrap();
        let schedule = schedules
            .get_mut(subscription_id.as_str())
            .ok_or_else(|| not_found("subscription"))?;
        let status = self
            .cancel_status
            .lock()
            .unwrap()
            .unwrap_or(SubscriptionStatus::Canceled);
        schedule.status = status;
        let mut out = schedule.clone();
        out.customer_id = customer_id.clone();
        Ok(out)
    }

    async fn create_refund(
        &self,
        payment_id: &PaymentId,
        amount: &Money,
    ) -> Result<GatewayRefund, GatewayError> {
        if self.fail_create_refund.load(Ordering::SeqCst) {
            return Err(GatewayError::Transport("connection reset".to_string()));
        }
        self.refund_calls
            .lock()
            .unwrap()
            .push((payment_id.clone(), amount.clone()));
        let status = self
            .refund_status
            .lock()
            .unwrap()
            .unwrap_or(GatewayRefundStatus::Pending);
        Ok(GatewayRefund {
            id: RefundId::new(format!("re_mock{}", self.next())).unwrap(),
            status,
            amount: amount.clone(),
        })
    }
}

// ── in-memory ledger store ─────────────────────────────────────────────

#[derive(Default)]
pub struct MemoryStore {
    pub transactions: Mutex<HashMap<Uuid, Transaction>>,
    pub donors: Mutex<HashMap<Uuid, Donor>>,
    pub subscriptions: Mutex<HashMap<Uuid, Subscription>>,
    pub campaigns: Mutex<HashMap<Uuid, Campaign>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed_transaction(&self, transaction: Transaction) -> Uuid {
        let id = transaction.id;
        self.transactions.lock().unwrap().insert(id, transaction);
        id
    }

    pub fn seed_donor(&self, donor: Donor) -> Uuid {
        let id = donor.id;
        self.donors.lock().unwrap().insert(id, donor);
        id
    }

    pub fn seed_subscription(&self, subscription: Subscription) -> Uuid {
        let id = subscription.id;
        self.subscriptions.lock().unwrap().insert(id, subscription);
        id
    }

    pub fn seed_campaign(&self, campaign: Campaign) -> Uuid {
        let id = campaign.id;
        self.campaigns.lock().unwrap().insert(id, campaign);
        id
    }

    pub fn transaction(&self, id: Uuid) -> Transaction {
        self.transactions.lock().unwrap().get(&id).unwrap().clone()
    }

    pub fn transaction_count(&self) -> usize {
        self.transactions.lock().unwrap().len()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.lock().unwrap().len()
    }

    pub fn subscriptions_vec(&self) -> Vec<Subscription> {
        self.subscriptions.lock().unwrap().values().cloned().collect()
    }

    pub fn only_transaction(&self) -> Transaction {
        let map = self.transactions.lock().unwrap();
        assert_eq!(map.len(), 1, "expected exactly one transaction");
        map.values().next().unwrap().clone()
    }

    pub fn only_subscription(&self) -> Subscription {
        let map = self.subscriptions.lock().unwrap();
        assert_eq!(map.len(), 1, "expected exactly one subscription");
        map.values().next().unwrap().clone()
    }
}

#[async_trait]
impl LedgerStore for MemoryStore {
    async fn get_transaction(&self, id: Uuid) -> Result<Option<Transaction>, StoreError> {
        Ok(self.transactions.lock().unwrap().get(&id).cloned())
    }

    async fn find_transaction_by_vendor_payment_id(
        &self,
        vendor_payment_id: &PaymentId,
    ) -> Result<Option<Transaction>, StoreError> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .values()
            .find(|t| t.vendor_payment_id.as_ref() == Some(vendor_payment_id))
            .cloned())
    }

    async fn insert_transaction(&self, transaction: &Transaction) -> Result<Uuid, StoreError> {
        self.transactions
            .lock()
            .unwrap()
            .insert(transaction.id, transaction.clone());
        Ok(transaction.id)
    }

    async fn update_transaction(&self, transaction: &Transaction) -> Result<bool, StoreError> {
        Ok(self
            .transactions
            .lock()
            .unwrap()
            .insert(transaction.id, transaction.clone())
            .is_some())
    }

    async fn get_donor(&self, id: Uuid) -> Result<Option<Donor>, StoreError> {
        Ok(self.donors.lock().unwrap().get(&id).cloned())
    }

    async fn find_donor_by_vendor_customer_id(
        &self,
        vendor_customer_id: &CustomerId,
    ) -> Result<Option<Donor>, StoreError> {
        Ok(self
            .donors
            .lock()
            .unwrap()
            .values()
            .find(|d| d.vendor_customer_id.as_ref() == Some(vendor_customer_id))
            .cloned())
    }

    async fn insert_donor(&self, donor: &Donor) -> Result<Uuid, StoreError> {
        self.donors.lock().unwrap().insert(donor.id, donor.clone());
        Ok(donor.id)
    }

    async fn patch_donor_customer(
        &self,
        id: Uuid,
        vendor_customer_id: &CustomerId,
    ) -> Result<bool, StoreError> {
        let mut donors = self.donors.lock().unwrap();
        match donors.get_mut(&id) {
            Some(donor) => {
                donor.vendor_customer_id = Some(vendor_customer_id.clone());
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_subscription(&self, id: Uuid) -> Result<Option<Subscription>, StoreError> {
        Ok(self.subscriptions.lock().unwrap().get(&id).cloned())
    }

    async fn find_subscription_by_vendor_subscription_id(
        &self,
        vendor_subscription_id: &VendorSubscriptionId,
    ) -> Result<Option<Subscription>, StoreError> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .find(|s| s.vendor_subscription_id.as_ref() == Some(vendor_subscription_id))
            .cloned())
    }

    async fn insert_subscription(&self, subscription: &Subscription) -> Result<Uuid, StoreError> {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(subscription.id, subscription.clone());
        Ok(subscription.id)
    }

    async fn patch_subscription_vendor(
        &self,
        id: Uuid,
        vendor_subscription_id: &VendorSubscriptionId,
        status: SubscriptionStatus,
    ) -> Result<bool, StoreError> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        match subscriptions.get_mut(&id) {
            Some(subscription) => {
                subscription.vendor_subscription_id = Some(vendor_subscription_id.clone());
                subscription.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn patch_subscription_status(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<bool, StoreError> {
        let mut subscriptions = self.subscriptions.lock().unwrap();
        match subscriptions.get_mut(&id) {
            Some(subscription) => {
                subscription.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>, StoreError> {
        Ok(self.campaigns.lock().unwrap().get(&id).cloned())
    }

    async fn find_campaign_by_slug(&self, slug: &str) -> Result<Option<Campaign>, StoreError> {
        Ok(self
            .campaigns
            .lock()
            .unwrap()
            .values()
            .find(|c| c.slug == slug)
            .cloned())
    }
}

// ── wiring ─────────────────────────────────────────────────────────────

use std::sync::Arc;

pub fn make_reconciler(
    store: Arc<MemoryStore>,
    gateway: Arc<MockGateway>,
) -> PaymentStatusReconciler {
    let provisioner = SubscriptionProvisioner::new(store.clone(), gateway.clone(), WEBHOOK_URL);
    PaymentStatusReconciler::new(store, gateway, provisioner)
}

pub fn make_provisioner(
    store: Arc<MemoryStore>,
    gateway: Arc<MockGateway>,
) -> SubscriptionProvisioner {
    SubscriptionProvisioner::new(store, gateway, WEBHOOK_URL)
}

/// Donor with a gateway customer id, registered in both fakes.
pub fn seed_linked_donor(store: &MemoryStore, gateway: &MockGateway, customer: &str) -> Uuid {
    let customer_id = gateway.put_customer(customer, "donor@example.org", "A. Donor");
    let mut donor = Donor::new("donor@example.org", "A. Donor", Mode::Test);
    donor.vendor_customer_id = Some(customer_id);
    store.seed_donor(donor)
}
