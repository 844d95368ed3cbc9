use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub card_number: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub amount: Decimal,
    pub currency: String,
    pub cvv: String,
}

/// Persisted lifecycle of a payment row.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PaymentStatus {
    #[serde(rename = "In-Progress")]
    InProgress,
    Success,
    Failure,
}

impl PaymentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentStatus::InProgress => "In-Progress",
            PaymentStatus::Success => "Success",
            PaymentStatus::Failure => "Failure",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "In-Progress" => Some(PaymentStatus::InProgress),
            "Success" => Some(PaymentStatus::Success),
            "Failure" => Some(PaymentStatus::Failure),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        !matches!(self, PaymentStatus::InProgress)
    }
}

/// Result of one pass through the acquiring pipeline, as reported to the caller.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Success,
    Failure,
}

impl Decision {
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Success => "success",
            Decision::Failure => "failure",
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DeclineReason {
    InvalidCardDetails,
    InsufficientFunds,
    SuspectedFraud,
    CardMissing,
}

impl DeclineReason {
    pub fn message(&self) -> &'static str {
        match self {
            DeclineReason::InvalidCardDetails => "payment failed due to invalid card details",
            DeclineReason::InsufficientFunds => "payment failed due to insufficient funds",
            DeclineReason::SuspectedFraud => "payment failed due to potential fraud",
            DeclineReason::CardMissing => "payment failed while approving payment",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcessOutcome {
    pub payment_id: String,
    pub status: Decision,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub decline_reason: Option<DeclineReason>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PaymentRecord {
    pub payment_id: String,
    pub card_number: String,
    pub expiry_month: u32,
    pub expiry_year: i32,
    pub amount: Decimal,
    pub currency: String,
    pub cvv: String,
    pub status: PaymentStatus,
}

impl PaymentRecord {
    pub fn in_progress(payment_id: String, req: &PaymentRequest) -> Self {
        Self {
            payment_id,
            card_number: req.card_number.clone(),
            expiry_month: req.expiry_month,
            expiry_year: req.expiry_year,
            amount: req.amount,
            currency: req.currency.clone(),
            cvv: req.cvv.clone(),
            status: PaymentStatus::InProgress,
        }
    }
}

/// Display form of a stored payment. Never carries the raw card number or CVV.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PaymentResponse {
    pub payment_id: String,
    pub masked_card_number: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub currency: String,
    pub status: PaymentStatus,
}

impl PaymentResponse {
    pub fn from_record(record: &PaymentRecord) -> Self {
        Self {
            payment_id: record.payment_id.clone(),
            masked_card_number: mask_card_number(&record.card_number),
            amount: record.amount,
            currency: record.currency.clone(),
            status: record.status,
        }
    }
}

pub fn mask_card_number(card_number: &str) -> String {
    let trimmed = card_number.trim();
    let chars: Vec<char> = trimmed.chars().collect();
    if chars.len() > 4 {
        let last_four: String = chars[chars.len() - 4..].iter().collect();
        format!("**** **** **** {}", last_four)
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn masks_all_but_last_four() {
        assert_eq!(mask_card_number("1234123412343457"), "**** **** **** 3457");
        assert_eq!(mask_card_number("1234 1234 1234 3457"), "**** **** **** 3457");
    }

    #[test]
    fn masking_is_idempotent() {
        let once = mask_card_number("9876543210123457");
        assert_eq!(mask_card_number(&once), once);
    }

    #[test]
    fn short_values_pass_through() {
        assert_eq!(mask_card_number("3457"), "3457");
    }

    #[test]
    fn response_drops_sensitive_fields() {
        let req = PaymentRequest {
            card_number: "1234123412343457".to_string(),
            expiry_month: 12,
            expiry_year: 2099,
            amount: dec!(34.00),
            currency: "EUR".to_string(),
            cvv: "123".to_string(),
        };
        let record = PaymentRecord::in_progress("p1".to_string(), &req);
        let json = serde_json::to_string(&PaymentResponse::from_record(&record)).unwrap();
        assert!(!json.contains("1234123412343457"));
        assert!(!json.contains("cvv"));
        assert!(json.contains("\"status\":\"In-Progress\""));
    }

    #[test]
    fn status_round_trips_through_text() {
        for s in [PaymentStatus::InProgress, PaymentStatus::Success, PaymentStatus::Failure] {
            assert_eq!(PaymentStatus::parse(s.as_str()), Some(s));
        }
        assert!(!PaymentStatus::InProgress.is_terminal());
    }
}
