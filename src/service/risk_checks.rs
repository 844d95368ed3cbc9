//! Funds, fraud and approval predicates used by the payment pipeline.
//!
//! Lookups fail closed: when the store cannot answer, the payment is treated as
//! unfunded or fraudulent rather than let through.

use crate::domain::card::Settlement;
use crate::repo::ports::{CardStore, FraudStore, PaymentStore};
use rust_decimal::Decimal;

pub async fn check_funds(cards: &dyn CardStore, card_number: &str, amount: Decimal) -> bool {
    match cards.find_card(card_number).await {
        Ok(Some(card)) => card.balance >= amount,
        Ok(None) => false,
        Err(e) => {
            tracing::error!(error = %e, "card lookup failed during funds check");
            false
        }
    }
}

/// True means block.
pub async fn check_for_fraud(fraud: &dyn FraudStore, card_number: &str, amount: Decimal, currency: &str) -> bool {
    match fraud.find_matching(card_number, amount, currency).await {
        Ok(None) => false,
        Ok(Some(_)) => true,
        Err(e) => {
            tracing::error!(error = %e, "fraud lookup failed, treating as fraud");
            true
        }
    }
}

/// Debits the card and finalizes the payment in one step. Store errors propagate.
pub async fn approve_payment(
    payments: &dyn PaymentStore,
    payment_id: &str,
    card_number: &str,
    amount: Decimal,
) -> anyhow::Result<Settlement> {
    payments.settle(payment_id, card_number, amount).await
}
