use crate::domain::payment::PaymentResponse;
use anyhow::Result;
use async_trait::async_trait;

pub mod memory;
pub mod store_redis;

/// Advisory read-through cache for completed payment lookups. Entries expire by TTL only.
#[async_trait]
pub trait PaymentCache: Send + Sync {
    async fn get(&self, payment_id: &str) -> Result<Option<PaymentResponse>>;

    async fn set(&self, payment_id: &str, response: &PaymentResponse) -> Result<()>;

    async fn ping(&self) -> Result<()>;
}

pub fn payment_cache_key(payment_id: &str) -> String {
    format!("req:cache:payment:{}", payment_id)
}
