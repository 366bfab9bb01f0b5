use {
    super::money::Currency,
    chrono::{DateTime, Utc},
    serde::{Deserialize, Serialize},
    uuid::Uuid,
};

/// Donation target configuration. Only the fields the reconciliation
/// engine consumes; campaign CRUD lives elsewhere.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: Uuid,
    /// Legacy slug-style identifier; pre-migration gateway metadata refers
    /// to campaigns by slug instead of id.
    pub slug: String,
    pub title: String,
    pub currency: Currency,
    pub show_return_message: bool,
    pub created_at: DateTime<Utc>,
}

impl Campaign {
    pub fn new(slug: impl Into<String>, title: impl Into<String>, currency: Currency) -> Self {
        Self {
            id: Uuid::now_v7(),
            slug: slug.into(),
            title: title.into(),
            currency,
            show_return_message: false,
            created_at: Utc::now(),
        }
    }
}
