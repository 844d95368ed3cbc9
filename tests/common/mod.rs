#![allow(dead_code)]

use checkout_engine::cache::memory::InMemoryPaymentCache;
use checkout_engine::cache::PaymentCache;
use checkout_engine::circuit::breaker::CircuitBreaker;
use checkout_engine::circuit::state::CircuitThresholds;
use checkout_engine::domain::payment::PaymentRequest;
use checkout_engine::service::payment_service::PaymentService;
use checkout_engine::service::token_service::{TokenService, TokenSettings};
use checkout_engine::validation::PaymentLimits;
use checkout_engine::AppState;
use chrono::Datelike;
use rust_decimal::Decimal;
use std::sync::Arc;
use std::time::Duration;

pub use checkout_engine::repo::memory::{Faults, MemoryStore};

pub const SECRET: &str = "integration-test-secret";
pub const CARD: &str = "4111111111111111";

pub struct Harness {
    pub store: MemoryStore,
    pub cache: InMemoryPaymentCache,
    pub state: AppState,
}

pub struct Options {
    pub cache_enabled: bool,
    pub finalize_declines: bool,
    pub thresholds: CircuitThresholds,
    pub access_ttl: chrono::Duration,
    pub leeway_seconds: u64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            cache_enabled: true,
            finalize_declines: false,
            thresholds: CircuitThresholds::default(),
            access_ttl: chrono::Duration::minutes(15),
            leeway_seconds: 0,
        }
    }
}

pub fn harness() -> Harness {
    harness_with(Options::default())
}

pub fn harness_with(opts: Options) -> Harness {
    let store = MemoryStore::new();
    let cache = InMemoryPaymentCache::new(Duration::from_secs(60));
    let shared = Arc::new(store.clone());

    let payment_service = PaymentService {
        payments: shared.clone(),
        cards: shared.clone(),
        fraud: shared.clone(),
        cache: opts
            .cache_enabled
            .then(|| Arc::new(cache.clone()) as Arc<dyn PaymentCache>),
        breaker: CircuitBreaker::new("payment-engine", opts.thresholds),
        limits: PaymentLimits::default(),
        finalize_declines: opts.finalize_declines,
    };
    let token_service = TokenService::new(
        shared,
        TokenSettings {
            secret: SECRET.to_string(),
            access_ttl: opts.access_ttl,
            refresh_ttl: chrono::Duration::days(7),
            leeway_seconds: opts.leeway_seconds,
        },
    );

    Harness {
        store,
        cache,
        state: AppState {
            payment_service,
            token_service,
        },
    }
}

pub fn next_year() -> i32 {
    chrono::Utc::now().year() + 1
}

pub fn request(card_number: &str, amount: Decimal, currency: &str) -> PaymentRequest {
    PaymentRequest {
        card_number: card_number.to_string(),
        expiry_month: 12,
        expiry_year: next_year(),
        amount,
        currency: currency.to_string(),
        cvv: "123".to_string(),
    }
}
