use crate::domain::token::TokenType;
use crate::error::{AuthError, EngineError};
use crate::service::token_service::TokenService;
use axum::body::Body;
use axum::extract::State;
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

/// `Bearer-Token: <t>` wins over `Authorization: Bearer <t>`.
pub fn bearer_credential(headers: &HeaderMap) -> Option<String> {
    let direct = headers
        .get("Bearer-Token")
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = direct {
        return Some(token.to_string());
    }

    headers
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.trim().strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

pub async fn require_access_token(
    State(tokens): State<TokenService>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let Some(credential) = bearer_credential(request.headers()) else {
        return EngineError::from(AuthError::InvalidToken).into_response();
    };

    match tokens.verify_token(&credential, TokenType::Access).await {
        Ok(record) => {
            request.extensions_mut().insert(record);
            next.run(request).await
        }
        Err(e) => {
            tracing::warn!(error = %e, "rejected bearer token");
            e.into_response()
        }
    }
}
