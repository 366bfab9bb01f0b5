use {
    super::error::EngineError,
    super::ids::{CustomerId, VendorSubscriptionId},
    super::interval::Interval,
    super::money::Money,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Pending,
    Active,
    Canceled,
    Suspended,
    Completed,
}

impl SubscriptionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Active => "active",
            Self::Canceled => "canceled",
            Self::Suspended => "suspended",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for SubscriptionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for SubscriptionStatus {
    type Error = EngineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "pending" => Ok(Self::Pending),
            "active" => Ok(Self::Active),
            "canceled" => Ok(Self::Canceled),
            "suspended" => Ok(Self::Suspended),
            "completed" => Ok(Self::Completed),
            other => Err(EngineError::Validation(format!(
                "unknown subscription status: {other}"
            ))),
        }
    }
}

/// A recurring payment schedule. The row is inserted locally (Pending,
/// no vendor id) before the gateway call, so the local id can travel in
/// the gateway metadata for correlation; rows without a
/// `vendor_subscription_id` never bill.
#[derive(Debug, Clone, Serialize)]
pub struct Subscription {
    pub id: Uuid,
    pub value: Money,
    pub frequency: Interval,
    /// Duration cap in years; 0 = unlimited.
    pub years: u32,
    pub status: SubscriptionStatus,
    pub transaction_id: Uuid,
    pub donor_id: Uuid,
    pub campaign_id: Option<Uuid>,
    pub vendor_customer_id: CustomerId,
    pub vendor_subscription_id: Option<VendorSubscriptionId>,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    #[allow(clippy::too_many_arguments)]
    pub fn pending(
        value: Money,
        frequency: Interval,
        years: u32,
        transaction_id: Uuid,
        donor_id: Uuid,
        campaign_id: Option<Uuid>,
        vendor_customer_id: CustomerId,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            value,
            frequency,
            years,
            status: SubscriptionStatus::Pending,
            transaction_id,
            donor_id,
            campaign_id,
            vendor_customer_id,
            vendor_subscription_id: None,
            created_at: Utc::now(),
        }
    }
}
