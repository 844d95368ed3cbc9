use crate::cache::{payment_cache_key, PaymentCache};
use crate::domain::payment::PaymentResponse;
use anyhow::Result;
use async_trait::async_trait;
use redis::AsyncCommands;
use std::time::Duration;

#[derive(Clone)]
pub struct RedisPaymentCache {
    pub client: redis::Client,
    pub ttl: Duration,
}

impl RedisPaymentCache {
    pub fn new(redis_url: &str, ttl: Duration) -> Result<Self> {
        Ok(Self {
            client: redis::Client::open(redis_url)?,
            ttl,
        })
    }
}

#[async_trait]
impl PaymentCache for RedisPaymentCache {
    async fn get(&self, payment_id: &str) -> Result<Option<PaymentResponse>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload: Option<String> = conn.get(payment_cache_key(payment_id)).await?;
        match payload {
            Some(p) => Ok(Some(serde_json::from_str::<PaymentResponse>(&p)?)),
            None => Ok(None),
        }
    }

    async fn set(&self, payment_id: &str, response: &PaymentResponse) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let payload = serde_json::to_string(response)?;
        let ttl = self.ttl.as_secs().max(1);
        let _: () = conn.set_ex(payment_cache_key(payment_id), payload, ttl).await?;
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
