use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Card {
    pub card_number: String,
    pub balance: Decimal,
}

/// Denylist rule: requests on `card_number` in `currency` at or above `amount` are blocked.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FraudFlag {
    pub card_number: String,
    pub amount: Decimal,
    pub currency: String,
}

/// Outcome of the atomic debit-and-finalize step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    Settled,
    InsufficientFunds,
    CardMissing,
}

/// Cards are keyed by their digits only.
pub fn normalize_card_number(card_number: &str) -> String {
    card_number.chars().filter(|c| !c.is_whitespace()).collect()
}
