use crate::domain::envelope::ApiResponse;
use crate::domain::payment::{Decision, PaymentRequest};
use crate::error::EngineError;
use crate::validation::validate_payment_request;
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GetPaymentQuery {
    pub payment_id: Option<String>,
}

pub async fn process_payment(
    State(state): State<AppState>,
    body: Result<Json<PaymentRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return EngineError::Validation(rejection.body_text()).into_response(),
    };
    let today = chrono::Utc::now().date_naive();
    if let Err(e) = validate_payment_request(&req, &state.payment_service.limits, today) {
        return e.into_response();
    }

    match state.payment_service.process_payment(req).await {
        Ok(outcome) => match outcome.status {
            Decision::Success => ApiResponse::ok(
                StatusCode::CREATED,
                serde_json::json!({
                    "status": outcome.status.as_str(),
                    "payment_id": outcome.payment_id,
                }),
            )
            .into_response(),
            Decision::Failure => {
                let message = outcome
                    .decline_reason
                    .map(|r| r.message())
                    .unwrap_or("payment failed");
                ApiResponse::fail(StatusCode::BAD_REQUEST, message)
                    .with_data(serde_json::json!({
                        "status": outcome.status.as_str(),
                        "message": message,
                        "payment_id": outcome.payment_id,
                    }))
                    .into_response()
            }
        },
        Err(e) => e.into_response(),
    }
}

pub async fn get_payment(State(state): State<AppState>, Query(query): Query<GetPaymentQuery>) -> Response {
    let payment_id = query.payment_id.unwrap_or_default();
    let payment_id = payment_id.trim();
    if payment_id.is_empty() {
        return EngineError::Validation("payment_id: cannot be blank".to_string()).into_response();
    }

    match state.payment_service.retrieve_payment(payment_id).await {
        Ok(payment) => ApiResponse::ok_serialized(StatusCode::OK, &payment).into_response(),
        Err(e) => e.into_response(),
    }
}
