use {
    super::ids::{CustomerId, MandateId, PaymentId, RefundId, VendorSubscriptionId},
    super::interval::Interval,
    super::money::Money,
    super::subscription::SubscriptionStatus,
    super::transaction::{Mode, SequenceType, TransactionStatus},
    async_trait::async_trait,
    chrono::NaiveDate,
    serde::{Deserialize, Serialize},
    thiserror::Error,
    uuid::Uuid,
};

#[derive(Debug, Error)]
pub enum GatewayError {
    /// Network-level failure, including timeouts.
    #[error("transport: {0}")]
    Transport(String),

    /// The gateway answered with an error status.
    #[error("api ({status}): {detail}")]
    Api { status: u16, detail: String },

    /// The gateway answered 2xx with a body we could not interpret.
    #[error("decode: {0}")]
    Decode(String),
}

impl GatewayError {
    /// Transport failures and gateway-side 5xx are worth retrying;
    /// 4xx means the request itself is wrong and never will succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Api { status, .. } => *status >= 500,
            Self::Decode(_) => false,
        }
    }
}

/// Correlation ids we plant in gateway payment metadata at creation time
/// and read back when a notification arrives. All optional: payments
/// created by older versions of the system carry none of them.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transaction_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor_id: Option<Uuid>,
    /// Local campaign id as a uuid string, or a legacy slug.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
    /// Recurrence cadence for first payments, e.g. "1 month".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frequency: Option<String>,
    /// Recurrence duration cap in years; 0 or absent = unlimited.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub years: Option<u32>,
}

/// Metadata attached to gateway recurring schedules; the local
/// subscription id is always present so the schedule can be correlated
/// even if the gateway reports it through another channel.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SubscriptionMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor_id: Option<Uuid>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub campaign_id: Option<String>,
}

/// The gateway's authoritative view of one payment.
#[derive(Debug, Clone)]
pub struct GatewayPayment {
    pub id: PaymentId,
    pub status: TransactionStatus,
    pub sequence_type: SequenceType,
    pub amount: Money,
    pub method: Option<String>,
    pub mode: Mode,
    pub customer_id: Option<CustomerId>,
    pub subscription_id: Option<VendorSubscriptionId>,
    pub mandate_id: Option<MandateId>,
    pub metadata: PaymentMetadata,
    pub amount_refunded: Option<Money>,
    pub amount_remaining: Option<Money>,
    pub amount_charged_back: Option<Money>,
}

impl GatewayPayment {
    pub fn is_paid(&self) -> bool {
        self.status == TransactionStatus::Paid
    }

    pub fn has_refunds(&self) -> bool {
        self.amount_refunded.as_ref().is_some_and(|m| !m.is_zero())
    }

    pub fn has_chargebacks(&self) -> bool {
        self.amount_charged_back
            .as_ref()
            .is_some_and(|m| !m.is_zero())
    }
}

#[derive(Debug, Clone)]
pub struct GatewayCustomer {
    pub id: CustomerId,
    pub email: String,
    pub name: String,
    pub mode: Mode,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MandateStatus {
    Valid,
    Pending,
    Invalid,
}

#[derive(Debug, Clone)]
pub struct GatewayMandate {
    pub id: MandateId,
    pub status: MandateStatus,
    pub method: Option<String>,
}

impl GatewayMandate {
    pub fn is_valid(&self) -> bool {
        self.status == MandateStatus::Valid
    }

    pub fn is_pending(&self) -> bool {
        self.status == MandateStatus::Pending
    }
}

#[derive(Debug, Clone)]
pub struct GatewaySubscription {
    pub id: VendorSubscriptionId,
    pub status: SubscriptionStatus,
    pub customer_id: CustomerId,
    pub metadata: SubscriptionMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GatewayRefundStatus {
    Queued,
    Pending,
    Processing,
    Refunded,
    Failed,
}

#[derive(Debug, Clone)]
pub struct GatewayRefund {
    pub id: RefundId,
    pub status: GatewayRefundStatus,
    pub amount: Money,
}

pub struct CreateSubscriptionParams {
    pub amount: Money,
    pub interval: Interval,
    /// None in test mode — sandbox schedules must start immediately.
    pub start_date: Option<NaiveDate>,
    /// Total charge cap; None = unbounded.
    pub times: Option<u32>,
    pub description: String,
    pub mandate_id: MandateId,
    pub webhook_url: String,
    pub metadata: SubscriptionMetadata,
}

/// Typed client for the payment provider. Every call returns a typed
/// error on transport or API failure; nothing is null-on-error.
#[async_trait]
pub trait GatewayClient: Send + Sync {
    async fn get_payment(&self, id: &PaymentId) -> Result<GatewayPayment, GatewayError>;

    async fn get_customer(&self, id: &CustomerId) -> Result<GatewayCustomer, GatewayError>;

    async fn create_customer(
        &self,
        email: &str,
        name: &str,
    ) -> Result<GatewayCustomer, GatewayError>;

    async fn get_mandate(
        &self,
        customer_id: &CustomerId,
        mandate_id: &MandateId,
    ) -> Result<GatewayMandate, GatewayError>;

    async fn get_subscription(
        &self,
        customer_id: &CustomerId,
        subscription_id: &VendorSubscriptionId,
    ) -> Result<GatewaySubscription, GatewayError>;

    async fn create_subscription(
        &self,
        customer_id: &CustomerId,
        params: CreateSubscriptionParams,
    ) -> Result<GatewaySubscription, GatewayError>;

    async fn cancel_subscription(
        &self,
        customer_id: &CustomerId,
        subscription_id: &VendorSubscriptionId,
    ) -> Result<GatewaySubscription, GatewayError>;

    async fn create_refund(
        &self,
        payment_id: &PaymentId,
        amount: &Money,
    ) -> Result<GatewayRefund, GatewayError>;
}
