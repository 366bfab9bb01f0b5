use {
    super::error::EngineError,
    chrono::{Days, Months, NaiveDate},
    serde::{Deserialize, Serialize},
    std::fmt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalUnit {
    Days,
    Weeks,
    Months,
}

impl IntervalUnit {
    /// Periods in one year for a single unit, used to cap charge counts.
    fn per_year(&self) -> u32 {
        match self {
            Self::Days => 365,
            Self::Weeks => 52,
            Self::Months => 12,
        }
    }
}

/// Recurring-charge cadence in the gateway's interval grammar
/// ("1 month", "14 days", "3 months").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    count: u32,
    unit: IntervalUnit,
}

impl Interval {
    pub fn new(count: u32, unit: IntervalUnit) -> Result<Self, EngineError> {
        if count == 0 {
            return Err(EngineError::Validation(
                "interval count must be positive".to_string(),
            ));
        }
        Ok(Self { count, unit })
    }

    pub fn months(count: u32) -> Result<Self, EngineError> {
        Self::new(count, IntervalUnit::Months)
    }

    pub fn parse(s: &str) -> Result<Self, EngineError> {
        let (count, unit) = s.trim().split_once(' ').ok_or_else(|| {
            EngineError::Validation(format!("malformed interval: {s}"))
        })?;
        let count: u32 = count
            .parse()
            .map_err(|_| EngineError::Validation(format!("malformed interval: {s}")))?;
        let unit = match unit {
            "day" | "days" => IntervalUnit::Days,
            "week" | "weeks" => IntervalUnit::Weeks,
            "month" | "months" => IntervalUnit::Months,
            other => {
                return Err(EngineError::Validation(format!(
                    "unknown interval unit: {other}"
                )));
            }
        };
        Self::new(count, unit)
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn unit(&self) -> IntervalUnit {
        self.unit
    }

    /// Total number of charges over `years` (2 years at "1 month" = 24).
    /// `years = 0` means unbounded: no cap is sent to the gateway.
    pub fn charges_over_years(&self, years: u32) -> Option<u32> {
        if years == 0 {
            return None;
        }
        // `years` comes from untrusted gateway metadata; saturate rather
        // than overflow on garbage values.
        Some(years.saturating_mul(self.unit.per_year()) / self.count)
    }

    /// First charge date for a schedule whose initial payment settled on
    /// `from`: one interval later.
    pub fn next_date(&self, from: NaiveDate) -> NaiveDate {
        match self.unit {
            IntervalUnit::Days => from
                .checked_add_days(Days::new(u64::from(self.count)))
                .unwrap_or(from),
            IntervalUnit::Weeks => from
                .checked_add_days(Days::new(u64::from(self.count) * 7))
                .unwrap_or(from),
            IntervalUnit::Months => from
                .checked_add_months(Months::new(self.count))
                .unwrap_or(from),
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = match (self.unit, self.count) {
            (IntervalUnit::Days, 1) => "day",
            (IntervalUnit::Days, _) => "days",
            (IntervalUnit::Weeks, 1) => "week",
            (IntervalUnit::Weeks, _) => "weeks",
            (IntervalUnit::Months, 1) => "month",
            (IntervalUnit::Months, _) => "months",
        };
        write!(f, "{} {unit}", self.count)
    }
}
