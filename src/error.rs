use crate::domain::envelope::ApiResponse;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    #[error("not valid token")]
    InvalidToken,
    #[error("token is expired")]
    TokenExpired,
    #[error("cannot find token")]
    TokenNotFound,
    #[error("token is blacklisted")]
    TokenBlacklisted,
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    Validation(String),

    #[error("failed to retrieve payment details")]
    PaymentNotFound,

    /// Display never includes `source`; it is only logged.
    #[error("{context}")]
    Infrastructure {
        context: &'static str,
        #[source]
        source: anyhow::Error,
    },

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("service unavailable, circuit open")]
    CircuitOpen,
}

impl EngineError {
    pub fn infrastructure(context: &'static str, source: impl Into<anyhow::Error>) -> Self {
        EngineError::Infrastructure {
            context,
            source: source.into(),
        }
    }

    /// Only these count against the circuit breaker.
    pub fn is_infrastructure(&self) -> bool {
        matches!(self, EngineError::Infrastructure { .. })
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            EngineError::Validation(_) => StatusCode::BAD_REQUEST,
            EngineError::PaymentNotFound => StatusCode::NOT_FOUND,
            EngineError::Infrastructure { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            EngineError::Auth(_) => StatusCode::UNAUTHORIZED,
            EngineError::CircuitOpen => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    pub fn to_envelope(&self) -> ApiResponse {
        ApiResponse::fail(self.status_code(), self.to_string())
    }
}

impl IntoResponse for EngineError {
    fn into_response(self) -> Response {
        self.to_envelope().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn infrastructure_message_hides_cause() {
        let err = EngineError::infrastructure(
            "failed to store payment details",
            anyhow::anyhow!("connection refused to 10.0.0.7:5432"),
        );
        assert_eq!(err.to_string(), "failed to store payment details");
        assert!(err.is_infrastructure());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn auth_errors_map_to_unauthorized() {
        let err: EngineError = AuthError::TokenExpired.into();
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_string(), "token is expired");
        assert!(!err.is_infrastructure());
    }

    #[test]
    fn envelope_carries_status_and_message() {
        let env = EngineError::PaymentNotFound.to_envelope();
        assert!(!env.success);
        assert_eq!(env.status_code, 404);
        assert_eq!(env.message.as_deref(), Some("failed to retrieve payment details"));
    }
}
