use {
    super::error::EngineError,
    serde::{Deserialize, Serialize},
    std::fmt,
};

/// ISO 4217 currency code, stored uppercase.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Currency(String);

impl Currency {
    pub fn new(code: impl Into<String>) -> Result<Self, EngineError> {
        let code: String = code.into();
        if code.len() != 3 || !code.chars().all(|c| c.is_ascii_uppercase()) {
            return Err(EngineError::Validation(format!(
                "currency must be a 3-letter uppercase ISO 4217 code, got: {code}"
            )));
        }
        Ok(Self(code))
    }

    pub fn eur() -> Self {
        Self("EUR".to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for Currency {
    type Error = EngineError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

/// An amount in minor units (cents) plus its currency. The gateway speaks
/// decimal strings with exactly two fraction digits ("10.00"); parsing and
/// formatting round-trip through that representation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    minor: i64,
    currency: Currency,
}

impl Money {
    pub fn from_minor(minor: i64, currency: Currency) -> Result<Self, EngineError> {
        if minor < 0 {
            return Err(EngineError::Validation(format!(
                "amount cannot be negative, got: {minor}"
            )));
        }
        Ok(Self { minor, currency })
    }

    /// Parse a gateway decimal string, e.g. ("10.00", "EUR").
    pub fn parse(value: &str, currency: &str) -> Result<Self, EngineError> {
        let currency = Currency::new(currency)?;
        let (units, cents) = value.split_once('.').ok_or_else(|| {
            EngineError::Validation(format!("amount must carry two decimals, got: {value}"))
        })?;
        if cents.len() != 2 || !cents.chars().all(|c| c.is_ascii_digit()) {
            return Err(EngineError::Validation(format!(
                "amount must carry exactly two decimals, got: {value}"
            )));
        }
        let units: i64 = units
            .parse()
            .map_err(|_| EngineError::Validation(format!("malformed amount: {value}")))?;
        if units < 0 {
            return Err(EngineError::Validation(format!(
                "amount cannot be negative, got: {value}"
            )));
        }
        let cents: i64 = cents
            .parse()
            .map_err(|_| EngineError::Validation(format!("malformed amount: {value}")))?;
        let minor = units
            .checked_mul(100)
            .and_then(|v| v.checked_add(cents))
            .ok_or_else(|| EngineError::Validation(format!("amount overflow: {value}")))?;
        Self::from_minor(minor, currency)
    }

    pub fn minor(&self) -> i64 {
        self.minor
    }

    pub fn currency(&self) -> &Currency {
        &self.currency
    }

    pub fn is_zero(&self) -> bool {
        self.minor == 0
    }

    /// Gateway wire format: "10.00".
    pub fn to_decimal_string(&self) -> String {
        format!("{}.{:02}", self.minor / 100, self.minor % 100)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.to_decimal_string(), self.currency)
    }
}
