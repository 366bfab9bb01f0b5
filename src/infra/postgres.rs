use {
    crate::domain::{
        campaign::Campaign,
        donor::Donor,
        ids::{CustomerId, PaymentId, VendorSubscriptionId},
        interval::Interval,
        money::{Currency, Money},
        store::{LedgerStore, StoreError},
        subscription::{Subscription, SubscriptionStatus},
        transaction::{Mode, SequenceType, Transaction, TransactionStatus},
    },
    async_trait::async_trait,
    sqlx::{PgPool, Row, postgres::PgRow},
    uuid::Uuid,
};

/// Ledger persistence on Postgres. Queries are runtime-bound; each call
/// is one statement, so row-level atomicity holds per operation and the
/// services layer is designed to be interruptible between them.
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn corrupt(e: impl std::fmt::Display) -> StoreError {
    StoreError::Corrupt(e.to_string())
}

fn money_from_row(row: &PgRow) -> Result<Money, StoreError> {
    let minor: i64 = row.try_get("value_minor")?;
    let currency: String = row.try_get("currency")?;
    Money::from_minor(minor, Currency::new(currency).map_err(corrupt)?).map_err(corrupt)
}

fn transaction_from_row(row: &PgRow) -> Result<Transaction, StoreError> {
    let vendor_payment_id: Option<String> = row.try_get("vendor_payment_id")?;
    let status: Option<String> = row.try_get("status")?;
    let sequence_type: String = row.try_get("sequence_type")?;
    let mode: String = row.try_get("mode")?;
    let refunds: Option<serde_json::Value> = row.try_get("refunds")?;

    Ok(Transaction {
        id: row.try_get("id")?,
        vendor_payment_id: vendor_payment_id
            .map(PaymentId::new)
            .transpose()
            .map_err(corrupt)?,
        value: money_from_row(row)?,
        status: status
            .as_deref()
            .map(TransactionStatus::try_from)
            .transpose()
            .map_err(corrupt)?,
        sequence_type: SequenceType::try_from(sequence_type.as_str()).map_err(corrupt)?,
        method: row.try_get("method")?,
        mode: Mode::try_from(mode.as_str()).map_err(corrupt)?,
        donor_id: row.try_get("donor_id")?,
        campaign_id: row.try_get("campaign_id")?,
        subscription_id: row.try_get("subscription_id")?,
        refunds: refunds.map(serde_json::from_value).transpose()?,
        created_at: row.try_get("created_at")?,
    })
}

fn donor_from_row(row: &PgRow) -> Result<Donor, StoreError> {
    let vendor_customer_id: Option<String> = row.try_get("vendor_customer_id")?;
    let mode: String = row.try_get("mode")?;

    Ok(Donor {
        id: row.try_get("id")?,
        email: row.try_get("email")?,
        name: row.try_get("name")?,
        street: row.try_get("street")?,
        postcode: row.try_get("postcode")?,
        city: row.try_get("city")?,
        country: row.try_get("country")?,
        vendor_customer_id: vendor_customer_id
            .map(CustomerId::new)
            .transpose()
            .map_err(corrupt)?,
        mode: Mode::try_from(mode.as_str()).map_err(corrupt)?,
        created_at: row.try_get("created_at")?,
    })
}

fn subscription_from_row(row: &PgRow) -> Result<Subscription, StoreError> {
    let frequency: String = row.try_get("frequency")?;
    let years: i32 = row.try_get("years")?;
    let status: String = row.try_get("status")?;
    let vendor_customer_id: String = row.try_get("vendor_customer_id")?;
    let vendor_subscription_id: Option<String> = row.try_get("vendor_subscription_id")?;

    Ok(Subscription {
        id: row.try_get("id")?,
        value: money_from_row(row)?,
        frequency: Interval::parse(&frequency).map_err(corrupt)?,
        years: u32::try_from(years).map_err(corrupt)?,
        status: SubscriptionStatus::try_from(status.as_str()).map_err(corrupt)?,
        transaction_id: row.try_get("transaction_id")?,
        donor_id: row.try_get("donor_id")?,
        campaign_id: row.try_get("campaign_id")?,
        vendor_customer_id: CustomerId::new(vendor_customer_id).map_err(corrupt)?,
        vendor_subscription_id: vendor_subscription_id
            .map(VendorSubscriptionId::new)
            .transpose()
            .map_err(corrupt)?,
        created_at: row.try_get("created_at")?,
    })
}

fn campaign_from_row(row: &PgRow) -> Result<Campaign, StoreError> {
    let currency: String = row.try_get("currency")?;

    Ok(Campaign {
        id: row.try_get("id")?,
        slug: row.try_get("slug")?,
        title: row.try_get("title")?,
        currency: Currency::new(currency).map_err(corrupt)?,
        show_return_message: row.try_get("show_return_message")?,
        created_at: row.try_get("created_at")?,
    })
}

const TRANSACTION_COLUMNS: &str = "id, vendor_payment_id, value_minor, currency, status, \
     sequence_type, method, mode, donor_id, campaign_id, subscription_id, refunds, created_at";

const DONOR_COLUMNS: &str =
    "id, email, name, street, postcode, city, country, vendor_customer_id, mode, created_at";

const SUBSCRIPTION_COLUMNS: &str = "id, value_minor, currency, frequency, years, status, \
     transaction_id, donor_id, campaign_id, vendor_customer_id, vendor_subscription_id, created_at";

const CAMPAIGN_COLUMNS: &str = "id, slug, title, currency, show_return_message, created_at";

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn get_transaction(&self, id: Uuid) -> Result<Option<Transaction>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(transaction_from_row).transpose()
    }

    async fn find_transaction_by_vendor_payment_id(
        &self,
        vendor_payment_id: &PaymentId,
    ) -> Result<Option<Transaction>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE vendor_payment_id = $1"
        ))
        .bind(vendor_payment_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(transaction_from_row).transpose()
    }

    async fn insert_transaction(&self, transaction: &Transaction) -> Result<Uuid, StoreError> {
        let refunds = transaction
            .refunds
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        sqlx::query(
            "INSERT INTO transactions \
                 (id, vendor_payment_id, value_minor, currency, status, sequence_type, \
                  method, mode, donor_id, campaign_id, subscription_id, refunds, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)",
        )
        .bind(transaction.id)
        .bind(transaction.vendor_payment_id.as_ref().map(|id| id.as_str()))
        .bind(transaction.value.minor())
        .bind(transaction.value.currency().as_str())
        .bind(transaction.status.map(|s| s.as_str()))
        .bind(transaction.sequence_type.as_str())
        .bind(transaction.method.as_deref())
        .bind(transaction.mode.as_str())
        .bind(transaction.donor_id)
        .bind(transaction.campaign_id)
        .bind(transaction.subscription_id)
        .bind(refunds)
        .bind(transaction.created_at)
        .execute(&self.pool)
        .await?;
        Ok(transaction.id)
    }

    async fn update_transaction(&self, transaction: &Transaction) -> Result<bool, StoreError> {
        let refunds = transaction
            .refunds
            .as_ref()
            .map(serde_json::to_value)
            .transpose()?;
        let result = sqlx::query(
            "UPDATE transactions \
             SET vendor_payment_id = $2, value_minor = $3, currency = $4, status = $5, \
                 sequence_type = $6, method = $7, mode = $8, donor_id = $9, \
                 campaign_id = $10, subscription_id = $11, refunds = $12 \
             WHERE id = $1",
        )
        .bind(transaction.id)
        .bind(transaction.vendor_payment_id.as_ref().map(|id| id.as_str()))
        .bind(transaction.value.minor())
        .bind(transaction.value.currency().as_str())
        .bind(transaction.status.map(|s| s.as_str()))
        .bind(transaction.sequence_type.as_str())
        .bind(transaction.method.as_deref())
        .bind(transaction.mode.as_str())
        .bind(transaction.donor_id)
        .bind(transaction.campaign_id)
        .bind(transaction.subscription_id)
        .bind(refunds)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_donor(&self, id: Uuid) -> Result<Option<Donor>, StoreError> {
        let row = sqlx::query(&format!("SELECT {DONOR_COLUMNS} FROM donors WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(donor_from_row).transpose()
    }

    async fn find_donor_by_vendor_customer_id(
        &self,
        vendor_customer_id: &CustomerId,
    ) -> Result<Option<Donor>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {DONOR_COLUMNS} FROM donors WHERE vendor_customer_id = $1"
        ))
        .bind(vendor_customer_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(donor_from_row).transpose()
    }

    async fn insert_donor(&self, donor: &Donor) -> Result<Uuid, StoreError> {
        sqlx::query(
            "INSERT INTO donors \
                 (id, email, name, street, postcode, city, country, \
                  vendor_customer_id, mode, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
        )
        .bind(donor.id)
        .bind(&donor.email)
        .bind(&donor.name)
        .bind(donor.street.as_deref())
        .bind(donor.postcode.as_deref())
        .bind(donor.city.as_deref())
        .bind(donor.country.as_deref())
        .bind(donor.vendor_customer_id.as_ref().map(|id| id.as_str()))
        .bind(donor.mode.as_str())
        .bind(donor.created_at)
        .execute(&self.pool)
        .await?;
        Ok(donor.id)
    }

    async fn patch_donor_customer(
        &self,
        id: Uuid,
        vendor_customer_id: &CustomerId,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE donors SET vendor_customer_id = $2 WHERE id = $1")
            .bind(id)
            .bind(vendor_customer_id.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_subscription(&self, id: Uuid) -> Result<Option<Subscription>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(subscription_from_row).transpose()
    }

    async fn find_subscription_by_vendor_subscription_id(
        &self,
        vendor_subscription_id: &VendorSubscriptionId,
    ) -> Result<Option<Subscription>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {SUBSCRIPTION_COLUMNS} FROM subscriptions WHERE vendor_subscription_id = $1"
        ))
        .bind(vendor_subscription_id.as_str())
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(subscription_from_row).transpose()
    }

    async fn insert_subscription(&self, subscription: &Subscription) -> Result<Uuid, StoreError> {
        sqlx::query(
            "INSERT INTO subscriptions \
                 (id, value_minor, currency, frequency, years, status, transaction_id, \
                  donor_id, campaign_id, vendor_customer_id, vendor_subscription_id, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)",
        )
        .bind(subscription.id)
        .bind(subscription.value.minor())
        .bind(subscription.value.currency().as_str())
        .bind(subscription.frequency.to_string())
        .bind(i32::try_from(subscription.years).map_err(corrupt)?)
        .bind(subscription.status.as_str())
        .bind(subscription.transaction_id)
        .bind(subscription.donor_id)
        .bind(subscription.campaign_id)
        .bind(subscription.vendor_customer_id.as_str())
        .bind(
            subscription
                .vendor_subscription_id
                .as_ref()
                .map(|id| id.as_str()),
        )
        .bind(subscription.created_at)
        .execute(&self.pool)
        .await?;
        Ok(subscription.id)
    }

    async fn patch_subscription_vendor(
        &self,
        id: Uuid,
        vendor_subscription_id: &VendorSubscriptionId,
        status: SubscriptionStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE subscriptions SET vendor_subscription_id = $2, status = $3 WHERE id = $1",
        )
        .bind(id)
        .bind(vendor_subscription_id.as_str())
        .bind(status.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn patch_subscription_status(
        &self,
        id: Uuid,
        status: SubscriptionStatus,
    ) -> Result<bool, StoreError> {
        let result = sqlx::query("UPDATE subscriptions SET status = $2 WHERE id = $1")
            .bind(id)
            .bind(status.as_str())
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn get_campaign(&self, id: Uuid) -> Result<Option<Campaign>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(campaign_from_row).transpose()
    }

    async fn find_campaign_by_slug(&self, slug: &str) -> Result<Option<Campaign>, StoreError> {
        let row = sqlx::query(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE slug = $1"
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        row.as_ref().map(campaign_from_row).transpose()
    }
}
