use crate::domain::card::{Card, FraudFlag, Settlement};
use crate::domain::payment::{PaymentRecord, PaymentStatus};
use crate::domain::token::TokenRecord;
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;

#[async_trait]
pub trait PaymentStore: Send + Sync {
    async fn insert(&self, payment: &PaymentRecord) -> Result<()>;

    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<PaymentRecord>>;

    async fn set_status(&self, payment_id: &str, status: PaymentStatus) -> Result<()>;

    /// Debits `amount` from the card and marks the payment `Success` as one unit.
    /// Anything other than `Settlement::Settled` leaves both rows untouched.
    async fn settle(&self, payment_id: &str, card_number: &str, amount: Decimal) -> Result<Settlement>;

    async fn ping(&self) -> Result<()>;
}

#[async_trait]
pub trait CardStore: Send + Sync {
    async fn find_card(&self, card_number: &str) -> Result<Option<Card>>;
}

#[async_trait]
pub trait FraudStore: Send + Sync {
    /// First flag on this card and currency whose threshold is at or below `amount`.
    async fn find_matching(&self, card_number: &str, amount: Decimal, currency: &str) -> Result<Option<FraudFlag>>;
}

#[async_trait]
pub trait TokenStore: Send + Sync {
    async fn insert(&self, token: &TokenRecord) -> Result<()>;

    /// All-or-nothing insert.
    async fn insert_all(&self, tokens: &[TokenRecord]) -> Result<()>;

    async fn find_by_id(&self, id: &str) -> Result<Option<TokenRecord>>;

    /// Returns false when no row had that id.
    async fn delete_by_id(&self, id: &str) -> Result<bool>;

    async fn set_blacklisted(&self, id: &str, blacklisted: bool) -> Result<bool>;

    /// Deletes `consumed_id` and inserts `tokens` as one unit. Returns false, and
    /// changes nothing, when `consumed_id` was already gone.
    async fn rotate(&self, consumed_id: &str, tokens: &[TokenRecord]) -> Result<bool>;
}
