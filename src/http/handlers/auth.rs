use crate::domain::envelope::ApiResponse;
use crate::error::EngineError;
use crate::validation::{validate_email, validate_refresh_token};
use crate::AppState;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct GenerateTokenRequest {
    #[serde(default)]
    pub email: String,
}

#[derive(Debug, Deserialize)]
pub struct RefreshTokenRequest {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub email: String,
}

pub async fn generate_access_token(
    State(state): State<AppState>,
    body: Result<Json<GenerateTokenRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return EngineError::Validation(rejection.body_text()).into_response(),
    };
    if let Err(e) = validate_email(req.email.trim()) {
        return e.into_response();
    }

    match state.token_service.generate_access_tokens(req.email.trim()).await {
        Ok(pair) => ApiResponse::ok_serialized(StatusCode::OK, &pair.view()).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn refresh(
    State(state): State<AppState>,
    body: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return EngineError::Validation(rejection.body_text()).into_response(),
    };
    if let Err(e) = validate_refresh_token(&req.token) {
        return e.into_response();
    }

    match state.token_service.refresh(&req.token, req.email.trim()).await {
        Ok(pair) => ApiResponse::ok_serialized(StatusCode::OK, &pair.view()).into_response(),
        Err(e) => e.into_response(),
    }
}
