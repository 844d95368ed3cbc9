use crate::cache::PaymentCache;
use crate::domain::payment::PaymentResponse;
use anyhow::{bail, Result};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

/// Process-local TTL cache. Also used as the test double for the redis cache.
#[derive(Clone)]
pub struct InMemoryPaymentCache {
    inner: Arc<RwLock<HashMap<String, (Instant, PaymentResponse)>>>,
    ttl: Duration,
    hits: Arc<AtomicUsize>,
    unavailable: Arc<AtomicBool>,
}

impl InMemoryPaymentCache {
    pub fn new(ttl: Duration) -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
            ttl,
            hits: Arc::new(AtomicUsize::new(0)),
            unavailable: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Makes every call fail, as an unreachable backend would.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("cache backend unreachable");
        }
        Ok(())
    }
}

#[async_trait]
impl PaymentCache for InMemoryPaymentCache {
    async fn get(&self, payment_id: &str) -> Result<Option<PaymentResponse>> {
        self.check_available()?;
        let read = self.inner.read().await;
        if let Some((stored_at, response)) = read.get(payment_id) {
            if stored_at.elapsed() <= self.ttl {
                self.hits.fetch_add(1, Ordering::SeqCst);
                return Ok(Some(response.clone()));
            }
        }
        Ok(None)
    }

    async fn set(&self, payment_id: &str, response: &PaymentResponse) -> Result<()> {
        self.check_available()?;
        let mut write = self.inner.write().await;
        write.retain(|_, (stored_at, _)| stored_at.elapsed() <= self.ttl);
        write.insert(payment_id.to_string(), (Instant::now(), response.clone()));
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.check_available()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::PaymentStatus;
    use rust_decimal_macros::dec;

    fn response() -> PaymentResponse {
        PaymentResponse {
            payment_id: "p1".to_string(),
            masked_card_number: "**** **** **** 3457".to_string(),
            amount: dec!(34.00),
            currency: "EUR".to_string(),
            status: PaymentStatus::Success,
        }
    }

    #[tokio::test]
    async fn entries_expire_after_ttl() {
        let cache = InMemoryPaymentCache::new(Duration::from_millis(20));
        cache.set("p1", &response()).await.unwrap();
        assert!(cache.get("p1").await.unwrap().is_some());
        tokio::time::sleep(Duration::from_millis(40)).await;
        assert!(cache.get("p1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn unavailable_backend_errors() {
        let cache = InMemoryPaymentCache::new(Duration::from_secs(60));
        cache.set_unavailable(true);
        assert!(cache.get("p1").await.is_err());
        assert!(cache.set("p1", &response()).await.is_err());
    }
}
