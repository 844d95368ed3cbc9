use crate::domain::envelope::ApiResponse;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub async fn status(State(state): State<AppState>) -> Response {
    let breaker = &state.payment_service.breaker;
    let snapshot = breaker.snapshot();
    let (total, failed) = snapshot.window_counts(breaker.thresholds(), chrono::Utc::now());

    ApiResponse::ok(
        StatusCode::OK,
        serde_json::json!({
            "name": snapshot.name,
            "state": snapshot.state,
            "window": {"total": total, "failed": failed},
            "consecutive_failures": snapshot.consecutive_failures,
            "probes_in_flight": snapshot.probes_in_flight,
            "opened_at": snapshot.opened_at,
            "cooldown_until": snapshot.cooldown_until,
        }),
    )
    .into_response()
}
