use {
    super::error::EngineError,
    super::ids::PaymentId,
    super::money::Money,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    std::fmt,
    uuid::Uuid,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionStatus {
    Open,
    Pending,
    Paid,
    Failed,
    Expired,
    Canceled,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Open => "open",
            Self::Pending => "pending",
            Self::Paid => "paid",
            Self::Failed => "failed",
            Self::Expired => "expired",
            Self::Canceled => "canceled",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for TransactionStatus {
    type Error = EngineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "open" => Ok(Self::Open),
            "pending" => Ok(Self::Pending),
            "paid" => Ok(Self::Paid),
            "failed" => Ok(Self::Failed),
            "expired" => Ok(Self::Expired),
            "canceled" => Ok(Self::Canceled),
            other => Err(EngineError::Validation(format!(
                "unknown transaction status: {other}"
            ))),
        }
    }
}

/// Gateway classification of a payment within a recurring sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceType {
    Oneoff,
    First,
    Recurring,
}

impl SequenceType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Oneoff => "oneoff",
            Self::First => "first",
            Self::Recurring => "recurring",
        }
    }
}

impl fmt::Display for SequenceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for SequenceType {
    type Error = EngineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "oneoff" => Ok(Self::Oneoff),
            "first" => Ok(Self::First),
            "recurring" => Ok(Self::Recurring),
            other => Err(EngineError::Validation(format!(
                "unknown sequence type: {other}"
            ))),
        }
    }
}

/// Test vs live gateway environment. One configured client per mode —
/// never a global toggle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Test,
    Live,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Test => "test",
            Self::Live => "live",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl TryFrom<&str> for Mode {
    type Error = EngineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "test" => Ok(Self::Test),
            "live" => Ok(Self::Live),
            other => Err(EngineError::Validation(format!("unknown mode: {other}"))),
        }
    }
}

/// Refund totals as reported by the gateway, serialized onto the
/// transaction once a refund occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefundTotals {
    pub refunded: Money,
    pub remaining: Money,
}

/// One attempted or completed donation.
#[derive(Debug, Clone, Serialize)]
pub struct Transaction {
    pub id: Uuid,
    pub vendor_payment_id: Option<PaymentId>,
    pub value: Money,
    pub status: Option<TransactionStatus>,
    pub sequence_type: SequenceType,
    pub method: Option<String>,
    pub mode: Mode,
    pub donor_id: Option<Uuid>,
    pub campaign_id: Option<Uuid>,
    pub subscription_id: Option<Uuid>,
    pub refunds: Option<RefundTotals>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    /// A transaction freshly created by the donor-facing flow: no status
    /// until the first reconciliation runs.
    pub fn new(value: Money, sequence_type: SequenceType, mode: Mode) -> Self {
        Self {
            id: Uuid::now_v7(),
            vendor_payment_id: None,
            value,
            status: None,
            sequence_type,
            method: None,
            mode,
            donor_id: None,
            campaign_id: None,
            subscription_id: None,
            refunds: None,
            created_at: Utc::now(),
        }
    }

    /// Duplicate-notification guard: true once the transaction has been
    /// driven out of its initial open window. Refund notifications against
    /// a paid transaction are the one allowed late transition.
    pub fn is_settled(&self) -> bool {
        !matches!(self.status, None | Some(TransactionStatus::Open))
    }
}
