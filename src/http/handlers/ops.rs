use crate::domain::envelope::ApiResponse;
use crate::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

pub async fn health() -> Response {
    ApiResponse::ok(StatusCode::OK, serde_json::json!({"status": "ok"})).into_response()
}

pub async fn liveness() -> Response {
    ApiResponse::ok(StatusCode::OK, serde_json::json!({"alive": true})).into_response()
}

pub async fn readiness(State(state): State<AppState>) -> Response {
    let db_ok = match state.payment_service.payments.ping().await {
        Ok(()) => true,
        Err(e) => {
            tracing::warn!(error = %e, "readiness: store ping failed");
            false
        }
    };

    // A disabled cache never blocks readiness; an unreachable one does.
    let cache = match &state.payment_service.cache {
        None => "disabled",
        Some(cache) => match cache.ping().await {
            Ok(()) => "ok",
            Err(e) => {
                tracing::warn!(error = %e, "readiness: cache ping failed");
                "unreachable"
            }
        },
    };

    let ok = db_ok && cache != "unreachable";
    let status = if ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    let data = serde_json::json!({
        "ready": ok,
        "db": db_ok,
        "cache": cache,
    });

    if ok {
        ApiResponse::ok(status, data).into_response()
    } else {
        ApiResponse::fail(status, "service not ready").with_data(data).into_response()
    }
}
