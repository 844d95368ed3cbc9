use crate::domain::card::{Card, FraudFlag, Settlement};
use crate::domain::payment::{PaymentRecord, PaymentStatus};
use crate::domain::token::{TokenRecord, TokenType};
use crate::repo::ports::{CardStore, FraudStore, PaymentStore, TokenStore};
use anyhow::{bail, Result};
use async_trait::async_trait;
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Switches for simulating a misbehaving backend.
#[derive(Debug, Default, Clone)]
pub struct Faults {
    pub payment_writes: bool,
    pub payment_reads: bool,
    pub fraud_lookups: bool,
    pub rejected_token_type: Option<TokenType>,
}

#[derive(Default)]
struct Tables {
    payments: HashMap<String, PaymentRecord>,
    cards: HashMap<String, Card>,
    frauds: Vec<FraudFlag>,
    tokens: HashMap<String, TokenRecord>,
    faults: Faults,
}

/// All four tables behind one lock, so `settle` and `insert_all` are atomic.
#[derive(Default, Clone)]
pub struct MemoryStore {
    tables: Arc<RwLock<Tables>>,
    payment_reads: Arc<AtomicUsize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put_card(&self, card_number: &str, balance: Decimal) {
        let mut t = self.tables.write().await;
        t.cards.insert(
            card_number.to_string(),
            Card {
                card_number: card_number.to_string(),
                balance,
            },
        );
    }

    pub async fn put_fraud_flag(&self, flag: FraudFlag) {
        self.tables.write().await.frauds.push(flag);
    }

    pub async fn put_payment(&self, payment: PaymentRecord) {
        let mut t = self.tables.write().await;
        t.payments.insert(payment.payment_id.clone(), payment);
    }

    pub async fn set_faults(&self, faults: Faults) {
        self.tables.write().await.faults = faults;
    }

    pub async fn card_balance(&self, card_number: &str) -> Option<Decimal> {
        self.tables.read().await.cards.get(card_number).map(|c| c.balance)
    }

    pub async fn payment_count(&self) -> usize {
        self.tables.read().await.payments.len()
    }

    pub async fn token_count(&self) -> usize {
        self.tables.read().await.tokens.len()
    }

    /// Number of `find_by_payment_id` calls served so far.
    pub fn payment_reads(&self) -> usize {
        self.payment_reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PaymentStore for MemoryStore {
    async fn insert(&self, payment: &PaymentRecord) -> Result<()> {
        let mut t = self.tables.write().await;
        if t.faults.payment_writes {
            bail!("payments table unavailable");
        }
        if t.payments.contains_key(&payment.payment_id) {
            bail!("duplicate payment id {}", payment.payment_id);
        }
        t.payments.insert(payment.payment_id.clone(), payment.clone());
        Ok(())
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<PaymentRecord>> {
        self.payment_reads.fetch_add(1, Ordering::SeqCst);
        let t = self.tables.read().await;
        if t.faults.payment_reads {
            bail!("payments table unavailable");
        }
        Ok(t.payments.get(payment_id).cloned())
    }

    async fn set_status(&self, payment_id: &str, status: PaymentStatus) -> Result<()> {
        let mut t = self.tables.write().await;
        if t.faults.payment_writes {
            bail!("payments table unavailable");
        }
        if let Some(p) = t.payments.get_mut(payment_id) {
            if !p.status.is_terminal() {
                p.status = status;
            }
        }
        Ok(())
    }

    async fn settle(&self, payment_id: &str, card_number: &str, amount: Decimal) -> Result<Settlement> {
        let mut t = self.tables.write().await;
        if t.faults.payment_writes {
            bail!("payments table unavailable");
        }
        match t.payments.get(payment_id) {
            Some(p) if p.status == PaymentStatus::InProgress => {}
            _ => bail!("payment {} is not in progress", payment_id),
        }
        let Some(card) = t.cards.get_mut(card_number) else {
            return Ok(Settlement::CardMissing);
        };
        if card.balance < amount {
            return Ok(Settlement::InsufficientFunds);
        }
        card.balance -= amount;
        if let Some(p) = t.payments.get_mut(payment_id) {
            p.status = PaymentStatus::Success;
        }
        Ok(Settlement::Settled)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

#[async_trait]
impl CardStore for MemoryStore {
    async fn find_card(&self, card_number: &str) -> Result<Option<Card>> {
        Ok(self.tables.read().await.cards.get(card_number).cloned())
    }
}

#[async_trait]
impl FraudStore for MemoryStore {
    async fn find_matching(&self, card_number: &str, amount: Decimal, currency: &str) -> Result<Option<FraudFlag>> {
        let t = self.tables.read().await;
        if t.faults.fraud_lookups {
            bail!("frauds table unavailable");
        }
        Ok(t
            .frauds
            .iter()
            .find(|f| f.card_number == card_number && f.currency == currency && f.amount <= amount)
            .cloned())
    }
}

#[async_trait]
impl TokenStore for MemoryStore {
    async fn insert(&self, token: &TokenRecord) -> Result<()> {
        self.insert_all(std::slice::from_ref(token)).await
    }

    async fn insert_all(&self, tokens: &[TokenRecord]) -> Result<()> {
        let mut t = self.tables.write().await;
        check_token_batch(&t, tokens)?;
        for token in tokens {
            t.tokens.insert(token.id.clone(), token.clone());
        }
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<TokenRecord>> {
        Ok(self.tables.read().await.tokens.get(id).cloned())
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        Ok(self.tables.write().await.tokens.remove(id).is_some())
    }

    async fn set_blacklisted(&self, id: &str, blacklisted: bool) -> Result<bool> {
        let mut t = self.tables.write().await;
        match t.tokens.get_mut(id) {
            Some(token) => {
                token.blacklisted = blacklisted;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn rotate(&self, consumed_id: &str, tokens: &[TokenRecord]) -> Result<bool> {
        let mut t = self.tables.write().await;
        if !t.tokens.contains_key(consumed_id) {
            return Ok(false);
        }
        check_token_batch(&t, tokens)?;
        t.tokens.remove(consumed_id);
        for token in tokens {
            t.tokens.insert(token.id.clone(), token.clone());
        }
        Ok(true)
    }
}

fn check_token_batch(t: &Tables, tokens: &[TokenRecord]) -> Result<()> {
    for token in tokens {
        if t.faults.rejected_token_type == Some(token.token_type) {
            bail!("tokens table rejected {} token", token.token_type.as_str());
        }
        if t.tokens.contains_key(&token.id) {
            bail!("duplicate token id");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn payment(id: &str, card: &str, amount: Decimal) -> PaymentRecord {
        PaymentRecord {
            payment_id: id.to_string(),
            card_number: card.to_string(),
            expiry_month: 12,
            expiry_year: 2099,
            amount,
            currency: "USD".to_string(),
            cvv: "123".to_string(),
            status: PaymentStatus::InProgress,
        }
    }

    #[tokio::test]
    async fn settle_never_overdraws() {
        let store = MemoryStore::new();
        store.put_card("4000000000000002", dec!(15)).await;
        store.put_payment(payment("a", "4000000000000002", dec!(10))).await;
        store.put_payment(payment("b", "4000000000000002", dec!(10))).await;

        let first = store.settle("a", "4000000000000002", dec!(10)).await.unwrap();
        let second = store.settle("b", "4000000000000002", dec!(10)).await.unwrap();

        assert_eq!(first, Settlement::Settled);
        assert_eq!(second, Settlement::InsufficientFunds);
        assert_eq!(store.card_balance("4000000000000002").await, Some(dec!(5)));
        let b = store.find_by_payment_id("b").await.unwrap().unwrap();
        assert_eq!(b.status, PaymentStatus::InProgress);
    }

    #[tokio::test]
    async fn terminal_status_is_not_overwritten() {
        let store = MemoryStore::new();
        let mut p = payment("a", "4000000000000002", dec!(1));
        p.status = PaymentStatus::Success;
        store.put_payment(p).await;
        store.set_status("a", PaymentStatus::Failure).await.unwrap();
        let got = store.find_by_payment_id("a").await.unwrap().unwrap();
        assert_eq!(got.status, PaymentStatus::Success);
    }

    #[tokio::test]
    async fn fraud_flag_matches_at_or_above_threshold() {
        let store = MemoryStore::new();
        store
            .put_fraud_flag(FraudFlag {
                card_number: "4000000000000002".to_string(),
                amount: dec!(50),
                currency: "USD".to_string(),
            })
            .await;
        assert!(store.find_matching("4000000000000002", dec!(50), "USD").await.unwrap().is_some());
        assert!(store.find_matching("4000000000000002", dec!(49.99), "USD").await.unwrap().is_none());
        assert!(store.find_matching("4000000000000002", dec!(80), "EUR").await.unwrap().is_none());
    }

    fn token(id: &str, token_type: TokenType) -> TokenRecord {
        TokenRecord {
            id: id.to_string(),
            token: format!("credential-{}", id),
            token_type,
            expires_at: chrono::Utc::now() + chrono::Duration::minutes(5),
            blacklisted: false,
        }
    }

    #[tokio::test]
    async fn rotate_is_all_or_nothing() {
        let store = MemoryStore::new();
        store.insert_all(&[token("old", TokenType::Refresh)]).await.unwrap();
        let fresh = [token("a2", TokenType::Access), token("r2", TokenType::Refresh)];

        store
            .set_faults(Faults {
                rejected_token_type: Some(TokenType::Refresh),
                ..Faults::default()
            })
            .await;
        assert!(store.rotate("old", &fresh).await.is_err());
        assert!(store.find_by_id("old").await.unwrap().is_some());
        assert_eq!(store.token_count().await, 1);

        store.set_faults(Faults::default()).await;
        assert!(store.rotate("old", &fresh).await.unwrap());
        assert!(store.find_by_id("old").await.unwrap().is_none());
        assert_eq!(store.token_count().await, 2);

        // Already consumed.
        assert!(!store.rotate("old", &[token("a3", TokenType::Access)]).await.unwrap());
        assert_eq!(store.token_count().await, 2);
    }
}
