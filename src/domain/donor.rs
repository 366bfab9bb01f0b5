use {
    super::ids::CustomerId,
    super::transaction::Mode,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

/// Identity of a payer. `vendor_customer_id` links the donor to the
/// gateway customer it was registered as; absent until first registered.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Donor {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub street: Option<String>,
    pub postcode: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub vendor_customer_id: Option<CustomerId>,
    pub mode: Mode,
    pub created_at: DateTime<Utc>,
}

impl Donor {
    pub fn new(email: impl Into<String>, name: impl Into<String>, mode: Mode) -> Self {
        Self {
            id: Uuid::now_v7(),
            email: email.into(),
            name: name.into(),
            street: None,
            postcode: None,
            city: None,
            country: None,
            vendor_customer_id: None,
            mode,
            created_at: Utc::now(),
        }
    }
}
