use crate::domain::card::normalize_card_number;
use crate::domain::payment::PaymentRequest;
use crate::error::EngineError;
use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;

#[derive(Debug, Clone)]
pub struct PaymentLimits {
    pub max_amount: Decimal,
    pub supported_currencies: Vec<String>,
}

impl Default for PaymentLimits {
    fn default() -> Self {
        Self {
            max_amount: Decimal::from(1000),
            supported_currencies: vec!["USD".to_string(), "EUR".to_string(), "GBP".to_string()],
        }
    }
}

pub fn validate_card_number(card_number: &str) -> bool {
    let digits = normalize_card_number(card_number);
    digits.len() == 16 && digits.chars().all(|c| c.is_ascii_digit())
}

/// A card stays valid through the last day of its expiry month.
pub fn validate_expiry_date(month: u32, year: i32, today: NaiveDate) -> bool {
    if !(1..=12).contains(&month) {
        return false;
    }
    year > today.year() || (year == today.year() && month >= today.month())
}

/// Amounts are stored as `NUMERIC(12, 2)`; anything finer than a cent would be rounded.
const MAX_AMOUNT_SCALE: u32 = 2;

pub fn validate_amount(amount: Decimal, max_amount: Decimal) -> bool {
    amount > Decimal::ZERO && amount <= max_amount && amount.normalize().scale() <= MAX_AMOUNT_SCALE
}

pub fn validate_currency(currency: &str, supported: &[String]) -> bool {
    supported.iter().any(|c| c == currency)
}

pub fn validate_cvv(cvv: &str) -> bool {
    (3..=4).contains(&cvv.len()) && cvv.chars().all(|c| c.is_ascii_digit())
}

/// Structural re-check the engine runs before touching funds.
pub fn structurally_valid(req: &PaymentRequest, limits: &PaymentLimits, today: NaiveDate) -> bool {
    validate_card_number(&req.card_number)
        && validate_expiry_date(req.expiry_month, req.expiry_year, today)
        && validate_amount(req.amount, limits.max_amount)
        && validate_currency(&req.currency, &limits.supported_currencies)
        && validate_cvv(&req.cvv)
}

/// Request-level validation with caller-facing messages, run before the engine.
pub fn validate_payment_request(
    req: &PaymentRequest,
    limits: &PaymentLimits,
    today: NaiveDate,
) -> Result<(), EngineError> {
    if !validate_card_number(&req.card_number) {
        return Err(EngineError::Validation("invalid card number".to_string()));
    }
    if !validate_expiry_date(req.expiry_month, req.expiry_year, today) {
        return Err(EngineError::Validation("expired card".to_string()));
    }
    if !validate_amount(req.amount, limits.max_amount) {
        return Err(EngineError::Validation("invalid amount".to_string()));
    }
    if !validate_currency(&req.currency, &limits.supported_currencies) {
        return Err(EngineError::Validation("unsupported currency".to_string()));
    }
    if !validate_cvv(&req.cvv) {
        return Err(EngineError::Validation("invalid CVV".to_string()));
    }
    Ok(())
}

pub fn validate_email(email: &str) -> Result<(), EngineError> {
    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");
    let ok = !local.is_empty()
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
        && !email.chars().any(char::is_whitespace);
    if ok {
        Ok(())
    } else {
        Err(EngineError::Validation("email: must be a valid email address".to_string()))
    }
}

pub fn validate_refresh_token(token: &str) -> Result<(), EngineError> {
    if token.is_empty() {
        return Err(EngineError::Validation("token: cannot be blank".to_string()));
    }
    if token.chars().any(char::is_whitespace) {
        return Err(EngineError::Validation("token: cannot contain whitespaces".to_string()));
    }
    Ok(())
}
