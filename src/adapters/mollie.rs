use {
    crate::domain::{
        gateway::{
            CreateSubscriptionParams, GatewayClient, GatewayCustomer, GatewayError,
            GatewayMandate, GatewayPayment, GatewayRefund, GatewayRefundStatus,
            GatewaySubscription, MandateStatus, PaymentMetadata, SubscriptionMetadata,
        },
        ids::{CustomerId, MandateId, PaymentId, RefundId, VendorSubscriptionId},
        money::Money,
        subscription::SubscriptionStatus,
        transaction::{Mode, SequenceType, TransactionStatus},
    },
    async_trait::async_trait,
    serde::{Deserialize, Serialize, de::DeserializeOwned},
    std::time::Duration,
};

const DEFAULT_BASE_URL: &str = "https://api.mollie.com/v2";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Mollie v2 REST client. One instance per API mode; the key decides
/// test vs live on the gateway side.
pub struct MollieGateway {
    http: reqwest::Client,
    api_key: String,
    base_url: String,
    mode: Mode,
}

impl MollieGateway {
    pub fn new(api_key: impl Into<String>, mode: Mode) -> Self {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_default();
        Self {
            http,
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            mode,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }


    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let resp = self
            .http
            .get(format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Self::decode(resp).await
    }

    async fn post_json<T: DeserializeOwned>(
        &self,
        path: &str,
        body: &impl Serialize,
    ) -> Result<T, GatewayError> {
        let resp = self
            .http
            .post(format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Self::decode(resp).await
    }

    async fn delete_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let resp = self
            .http
            .delete(format!("{}{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .send()
            .await
            .map_err(|e| GatewayError::Transport(e.to_string()))?;
        Self::decode(resp).await
    }

    async fn decode<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, GatewayError> {
        let status = resp.status();
        if !status.is_success() {
            let detail = match resp.json::<WireError>().await {
                Ok(err) => err.detail.or(err.title).unwrap_or_default(),
                Err(_) => String::new(),
            };
            return Err(GatewayError::Api {
                status: status.as_u16(),
                detail,
            });
        }
        resp.json::<T>()
            .await
            .map_err(|e| GatewayError::Decode(e.to_string()))
    }
}

#[async_trait]
impl GatewayClient for MollieGateway {
    async fn get_payment(&self, id: &PaymentId) -> Result<GatewayPayment, GatewayError> {
        let wire: WirePayment = self.get_json(&format!("/payments/{id}")).await?;
        let payment = convert_payment(wire)?;
        if payment.mode != self.mode {
            // A test webhook pointed at a live deployment, or vice versa.
            tracing::warn!(
                payment_id = %payment.id,
                payment_mode = %payment.mode,
                client_mode = %self.mode,
                "payment mode differs from configured mode"
            );
        }
        Ok(payment)
    }

    async fn get_customer(&self, id: &CustomerId) -> Result<GatewayCustomer, GatewayError> {
        let wire: WireCustomer = self.get_json(&format!("/customers/{id}")).await?;
        convert_customer(wire)
    }

    async fn create_customer(
        &self,
        email: &str,
        name: &str,
    ) -> Result<GatewayCustomer, GatewayError> {
        let body = serde_json::json!({ "email": email, "name": name });
        let wire: WireCustomer = self.post_json("/customers", &body).await?;
        convert_customer(wire)
    }

    async fn get_mandate(
        &self,
        customer_id: &CustomerId,
        mandate_id: &MandateId,
    ) -> Result<GatewayMandate, GatewayError> {
        let wire: WireMandate = self
            .get_json(&format!("/customers/{customer_id}/mandates/{mandate_id}"))
            .await?;
        convert_mandate(wire)
    }

    async fn get_subscription(
        &self,
        customer_id: &CustomerId,
        subscription_id: &VendorSubscriptionId,
    ) -> Result<GatewaySubscription, GatewayError> {
        let wire: WireSubscription = self
            .get_json(&format!(
                "/customers/{customer_id}/subscriptions/{subscription_id}"
            ))
            .await?;
        convert_subscription(wire)
    }

    async fn create_subscription(
        &self,
        customer_id: &CustomerId,
        params: CreateSubscriptionParams,
    ) -> Result<GatewaySubscription, GatewayError> {
        let body = WireCreateSubscription::from_params(&params);
        let wire: WireSubscription = self
            .post_json(&format!("/customers/{customer_id}/subscriptions"), &body)
            .await?;
        convert_subscription(wire)
    }

    async fn cancel_subscription(
        &self,
        customer_id: &CustomerId,
        subscription_id: &VendorSubscriptionId,
    ) -> Result<GatewaySubscription, GatewayError> {
        let wire: WireSubscription = self
            .delete_json(&format!(
                "/customers/{customer_id}/subscriptions/{subscription_id}"
            ))
            .await?;
        convert_subscription(wire)
    }

    async fn create_refund(
        &self,
        payment_id: &PaymentId,
        amount: &Money,
    ) -> Result<GatewayRefund, GatewayError> {
        let body = serde_json::json!({ "amount": WireAmount::from_money(amount) });
        let wire: WireRefund = self
            .post_json(&format!("/payments/{payment_id}/refunds"), &body)
            .await?;
        convert_refund(wire)
    }
}

// ── wire types ──────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct WireError {
    title: Option<String>,
    detail: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
struct WireAmount {
    currency: String,
    value: String,
}

impl WireAmount {
    fn from_money(money: &Money) -> Self {
        Self {
            currency: money.currency().as_str().to_string(),
            value: money.to_decimal_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WirePayment {
    id: String,
    status: String,
    sequence_type: Option<String>,
    amount: WireAmount,
    method: Option<String>,
    mode: String,
    customer_id: Option<String>,
    subscription_id: Option<String>,
    mandate_id: Option<String>,
    metadata: Option<serde_json::Value>,
    amount_refunded: Option<WireAmount>,
    amount_remaining: Option<WireAmount>,
    amount_charged_back: Option<WireAmount>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireCustomer {
    id: String,
    email: Option<String>,
    name: Option<String>,
    mode: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMandate {
    id: String,
    status: String,
    method: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSubscription {
    id: String,
    status: String,
    customer_id: String,
    metadata: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRefund {
    id: String,
    status: String,
    amount: WireAmount,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireCreateSubscription {
    amount: WireAmount,
    interval: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    start_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    times: Option<u32>,
    description: String,
    mandate_id: String,
    webhook_url: String,
    metadata: SubscriptionMetadata,
}

impl WireCreateSubscription {
    fn from_params(params: &CreateSubscriptionParams) -> Self {
        Self {
            amount: WireAmount::from_money(&params.amount),
            interval: params.interval.to_string(),
            start_date: params.start_date.map(|d| d.format("%Y-%m-%d").to_string()),
            times: params.times,
            description: params.description.clone(),
            mandate_id: params.mandate_id.as_str().to_string(),
            webhook_url: params.webhook_url.clone(),
            metadata: params.metadata.clone(),
        }
    }
}

// ── conversion helpers ──────────────────────────────────────────────────

fn convert_money(amount: &WireAmount) -> Result<Money, GatewayError> {
    Money::parse(&amount.value, &amount.currency)
        .map_err(|e| GatewayError::Decode(e.to_string()))
}

fn convert_mode(mode: &str) -> Result<Mode, GatewayError> {
    Mode::try_from(mode).map_err(|e| GatewayError::Decode(e.to_string()))
}

/// Metadata is a free-form bag on the gateway side; anything we cannot
/// interpret is treated as absent, never as an error.
fn convert_payment_metadata(metadata: Option<serde_json::Value>) -> PaymentMetadata {
    match metadata {
        Some(value) => serde_json::from_value(value).unwrap_or_default(),
        None => PaymentMetadata::default(),
    }
}

fn convert_subscription_metadata(metadata: Option<serde_json::Value>) -> SubscriptionMetadata {
    match metadata {
        Some(value) => serde_json::from_value(value).unwrap_or_default(),
        None => SubscriptionMetadata::default(),
    }
}

fn convert_payment(wire: WirePayment) -> Result<GatewayPayment, GatewayError> {
    let id = PaymentId::new(wire.id).map_err(|e| GatewayError::Decode(e.to_string()))?;
    let status = TransactionStatus::try_from(wire.status.as_str())
        .map_err(|e| GatewayError::Decode(e.to_string()))?;
    let sequence_type = match wire.sequence_type.as_deref() {
        Some(s) => {
            SequenceType::try_from(s).map_err(|e| GatewayError::Decode(e.to_string()))?
        }
        None => SequenceType::Oneoff,
    };
    let customer_id = wire
        .customer_id
        .map(CustomerId::new)
        .transpose()
        .map_err(|e| GatewayError::Decode(e.to_string()))?;
    let subscription_id = wire
        .subscription_id
        .map(VendorSubscriptionId::new)
        .transpose()
        .map_err(|e| GatewayError::Decode(e.to_string()))?;
    let mandate_id = wire
        .mandate_id
        .map(MandateId::new)
        .transpose()
        .map_err(|e| GatewayError::Decode(e.to_string()))?;

    Ok(GatewayPayment {
        id,
        status,
        sequence_type,
        amount: convert_money(&wire.amount)?,
        method: wire.method,
        mode: convert_mode(&wire.mode)?,
        customer_id,
        subscription_id,
        mandate_id,
        metadata: convert_payment_metadata(wire.metadata),
        amount_refunded: wire.amount_refunded.as_ref().map(convert_money).transpose()?,
        amount_remaining: wire.amount_remaining.as_ref().map(convert_money).transpose()?,
        amount_charged_back: wire
            .amount_charged_back
            .as_ref()
            .map(convert_money)
            .transpose()?,
    })
}

fn convert_customer(wire: WireCustomer) -> Result<GatewayCustomer, GatewayError> {
    Ok(GatewayCustomer {
        id: CustomerId::new(wire.id).map_err(|e| GatewayError::Decode(e.to_string()))?,
        email: wire.email.unwrap_or_default(),
        name: wire.name.unwrap_or_default(),
        mode: convert_mode(&wire.mode)?,
    })
}

fn convert_mandate(wire: WireMandate) -> Result<GatewayMandate, GatewayError> {
    let status = match wire.status.as_str() {
        "valid" => MandateStatus::Valid,
        "pending" => MandateStatus::Pending,
        _ => MandateStatus::Invalid,
    };
    Ok(GatewayMandate {
        id: MandateId::new(wire.id).map_err(|e| GatewayError::Decode(e.to_string()))?,
        status,
        method: wire.method,
    })
}

fn convert_subscription(wire: WireSubscription) -> Result<GatewaySubscription, GatewayError> {
    Ok(GatewaySubscription {
        id: VendorSubscriptionId::new(wire.id)
            .map_err(|e| GatewayError::Decode(e.to_string()))?,
        status: SubscriptionStatus::try_from(wire.status.as_str())
            .map_err(|e| GatewayError::Decode(e.to_string()))?,
        customer_id: CustomerId::new(wire.customer_id)
            .map_err(|e| GatewayError::Decode(e.to_string()))?,
        metadata: convert_subscription_metadata(wire.metadata),
    })
}

fn convert_refund(wire: WireRefund) -> Result<GatewayRefund, GatewayError> {
    let status = match wire.status.as_str() {
        "queued" => GatewayRefundStatus::Queued,
        "pending" => GatewayRefundStatus::Pending,
        "processing" => GatewayRefundStatus::Processing,
        "refunded" => GatewayRefundStatus::Refunded,
        _ => GatewayRefundStatus::Failed,
    };
    Ok(GatewayRefund {
        id: RefundId::new(wire.id).map_err(|e| GatewayError::Decode(e.to_string()))?,
        status,
        amount: convert_money(&wire.amount)?,
    })
}
