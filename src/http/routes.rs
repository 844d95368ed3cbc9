use crate::http::handlers::{auth, circuit_breaker, ops, payments};
use crate::http::middleware::bearer_auth::require_access_token;
use crate::AppState;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;

pub fn build_router(state: AppState) -> Router {
    let protected = Router::new()
        .route("/v1/process-payment", post(payments::process_payment))
        .route("/v1/get-payment", get(payments::get_payment))
        .layer(from_fn_with_state(state.token_service.clone(), require_access_token));

    Router::new()
        .route("/health", get(ops::health))
        .route("/ops/liveness", get(ops::liveness))
        .route("/ops/readiness", get(ops::readiness))
        .route("/circuit-breaker/status", get(circuit_breaker::status))
        .route("/v1/auth/generate_access_token", post(auth::generate_access_token))
        .route("/v1/auth/refresh", post(auth::refresh))
        .merge(protected)
        .with_state(state)
}
