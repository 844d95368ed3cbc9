pub mod cache;
pub mod circuit;
pub mod config;
pub mod domain {
    pub mod card;
    pub mod envelope;
    pub mod payment;
    pub mod token;
}
pub mod error;
pub mod http {
    pub mod handlers {
        pub mod auth;
        pub mod circuit_breaker;
        pub mod ops;
        pub mod payments;
    }
    pub mod middleware {
        pub mod bearer_auth;
    }
    pub mod routes;
}
pub mod repo {
    pub mod cards_repo;
    pub mod fraud_repo;
    pub mod memory;
    pub mod payments_repo;
    pub mod ports;
    pub mod tokens_repo;
}
pub mod service {
    pub mod payment_service;
    pub mod risk_checks;
    pub mod token_service;
}
pub mod validation;

#[derive(Clone)]
pub struct AppState {
    pub payment_service: service::payment_service::PaymentService,
    pub token_service: service::token_service::TokenService,
}
