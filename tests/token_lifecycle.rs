mod common;

use checkout_engine::domain::token::{TokenClaims, TokenType};
use checkout_engine::error::{AuthError, EngineError};
use checkout_engine::repo::ports::TokenStore;
use common::{harness, harness_with, Faults, Options, SECRET};
use jsonwebtoken::{encode, EncodingKey, Header};

const EMAIL: &str = "buyer@example.com";

fn auth_error(result: Result<impl std::fmt::Debug, EngineError>) -> AuthError {
    match result {
        Err(EngineError::Auth(e)) => e,
        other => panic!("expected auth error, got {:?}", other),
    }
}

#[tokio::test]
async fn issued_pair_verifies_for_its_own_type_only() {
    let h = harness();
    let tokens = &h.state.token_service;

    let pair = tokens.generate_access_tokens(EMAIL).await.unwrap();
    assert_eq!(h.store.token_count().await, 2);
    assert_ne!(pair.access.id, pair.refresh.id);

    let access = tokens.verify_token(&pair.access.token, TokenType::Access).await.unwrap();
    assert_eq!(access.id, pair.access.id);
    tokens.verify_token(&pair.refresh.token, TokenType::Refresh).await.unwrap();

    assert_eq!(
        auth_error(tokens.verify_token(&pair.refresh.token, TokenType::Access).await),
        AuthError::InvalidToken
    );
    assert_eq!(
        auth_error(tokens.verify_token(&pair.access.token, TokenType::Refresh).await),
        AuthError::InvalidToken
    );
}

#[tokio::test]
async fn expired_token_is_rejected() {
    let h = harness();
    let tokens = &h.state.token_service;

    let live = tokens
        .create_token(EMAIL, TokenType::Access, chrono::Utc::now() + chrono::Duration::minutes(1))
        .await
        .unwrap();
    tokens.verify_token(&live.token, TokenType::Access).await.unwrap();

    let stale = tokens
        .create_token(EMAIL, TokenType::Access, chrono::Utc::now() - chrono::Duration::minutes(1))
        .await
        .unwrap();
    assert_eq!(
        auth_error(tokens.verify_token(&stale.token, TokenType::Access).await),
        AuthError::TokenExpired
    );
}

#[tokio::test]
async fn leeway_tolerates_small_clock_skew() {
    let h = harness_with(Options {
        leeway_seconds: 120,
        ..Options::default()
    });
    let tokens = &h.state.token_service;

    let just_expired = tokens
        .create_token(EMAIL, TokenType::Access, chrono::Utc::now() - chrono::Duration::seconds(30))
        .await
        .unwrap();
    tokens.verify_token(&just_expired.token, TokenType::Access).await.unwrap();
}

#[tokio::test]
async fn deleted_token_is_not_found_even_if_signature_is_valid() {
    let h = harness();
    let tokens = &h.state.token_service;
    let pair = tokens.generate_access_tokens(EMAIL).await.unwrap();

    tokens.delete_token_by_id(&pair.access.id).await.unwrap();

    assert_eq!(
        auth_error(tokens.verify_token(&pair.access.token, TokenType::Access).await),
        AuthError::TokenNotFound
    );
    assert_eq!(
        auth_error(tokens.delete_token_by_id(&pair.access.id).await),
        AuthError::TokenNotFound
    );
}

#[tokio::test]
async fn blacklisted_token_is_rejected() {
    let h = harness();
    let tokens = &h.state.token_service;
    let pair = tokens.generate_access_tokens(EMAIL).await.unwrap();

    tokens.blacklist_token(&pair.access.id).await.unwrap();

    assert_eq!(
        auth_error(tokens.verify_token(&pair.access.token, TokenType::Access).await),
        AuthError::TokenBlacklisted
    );
}

#[tokio::test]
async fn tampered_or_foreign_tokens_are_invalid() {
    let h = harness();
    let tokens = &h.state.token_service;
    let pair = tokens.generate_access_tokens(EMAIL).await.unwrap();

    let mut tampered = pair.access.token.clone();
    tampered.push('x');
    assert_eq!(
        auth_error(tokens.verify_token(&tampered, TokenType::Access).await),
        AuthError::InvalidToken
    );

    let claims = TokenClaims {
        email: EMAIL.to_string(),
        token_type: TokenType::Access,
        iat: chrono::Utc::now().timestamp(),
        exp: (chrono::Utc::now() + chrono::Duration::minutes(5)).timestamp(),
        sub: pair.access.id.clone(),
    };
    let foreign = encode(&Header::default(), &claims, &EncodingKey::from_secret(b"other-secret")).unwrap();
    assert_eq!(
        auth_error(tokens.verify_token(&foreign, TokenType::Access).await),
        AuthError::InvalidToken
    );

    // Correct key and subject, but not the credential that was issued for that row.
    let reissued = encode(&Header::default(), &claims, &EncodingKey::from_secret(SECRET.as_bytes())).unwrap();
    assert_eq!(
        auth_error(tokens.verify_token(&reissued, TokenType::Access).await),
        AuthError::InvalidToken
    );

    assert_eq!(
        auth_error(tokens.verify_token("not-a-jwt", TokenType::Access).await),
        AuthError::InvalidToken
    );
}

#[tokio::test]
async fn refresh_rotates_by_deleting_the_old_token() {
    let h = harness();
    let tokens = &h.state.token_service;
    let pair = tokens.generate_access_tokens(EMAIL).await.unwrap();

    let rotated = tokens.refresh(&pair.refresh.token, EMAIL).await.unwrap();

    assert_ne!(rotated.refresh.id, pair.refresh.id);
    assert!(h.store.find_by_id(&pair.refresh.id).await.unwrap().is_none());
    tokens.verify_token(&rotated.access.token, TokenType::Access).await.unwrap();

    assert_eq!(
        auth_error(tokens.refresh(&pair.refresh.token, EMAIL).await),
        AuthError::TokenNotFound
    );
}

#[tokio::test]
async fn refresh_rejects_access_tokens_and_other_principals() {
    let h = harness();
    let tokens = &h.state.token_service;
    let pair = tokens.generate_access_tokens(EMAIL).await.unwrap();

    assert_eq!(
        auth_error(tokens.refresh(&pair.access.token, EMAIL).await),
        AuthError::InvalidToken
    );
    assert_eq!(
        auth_error(tokens.refresh(&pair.refresh.token, "someone@else.com").await),
        AuthError::InvalidToken
    );
    // Neither failed attempt consumed the refresh token.
    tokens.verify_token(&pair.refresh.token, TokenType::Refresh).await.unwrap();
}

#[tokio::test]
async fn pair_is_stored_atomically() {
    let h = harness();
    h.store
        .set_faults(Faults {
            rejected_token_type: Some(TokenType::Refresh),
            ..Faults::default()
        })
        .await;

    let err = h.state.token_service.generate_access_tokens(EMAIL).await.unwrap_err();

    assert!(err.is_infrastructure());
    assert_eq!(err.to_string(), "cannot save access token");
    assert_eq!(h.store.token_count().await, 0);
}

#[tokio::test]
async fn failed_rotation_keeps_the_refresh_token_usable() {
    let h = harness();
    let tokens = &h.state.token_service;
    let pair = tokens.generate_access_tokens(EMAIL).await.unwrap();

    h.store
        .set_faults(Faults {
            rejected_token_type: Some(TokenType::Refresh),
            ..Faults::default()
        })
        .await;
    let err = tokens.refresh(&pair.refresh.token, EMAIL).await.unwrap_err();
    assert!(err.is_infrastructure());
    assert_eq!(h.store.token_count().await, 2);

    h.store.set_faults(Faults::default()).await;
    tokens.verify_token(&pair.refresh.token, TokenType::Refresh).await.unwrap();
    tokens.refresh(&pair.refresh.token, EMAIL).await.unwrap();
}
