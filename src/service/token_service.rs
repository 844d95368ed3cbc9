//! Issuance, verification and rotation of short-lived bearer tokens.
//!
//! Every issued token has a row keyed by its subject. A token is accepted only
//! while both the signed `exp` claim and the row agree it is live.

use crate::domain::token::{TokenClaims, TokenPair, TokenRecord, TokenType};
use crate::error::{AuthError, EngineError};
use crate::repo::ports::TokenStore;
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::distributions::Alphanumeric;
use rand::rngs::OsRng;
use rand::Rng;
use std::sync::Arc;

const SUBJECT_LEN: usize = 32;
const MAX_LEEWAY_SECONDS: u64 = 86_400;

#[derive(Debug, Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
    /// Clock-skew grace applied to expiry checks.
    pub leeway_seconds: u64,
}

#[derive(Clone)]
pub struct TokenService {
    pub store: Arc<dyn TokenStore>,
    pub settings: Arc<TokenSettings>,
}

/// Random subject from the OS CSPRNG.
fn new_subject() -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(SUBJECT_LEN)
        .map(char::from)
        .collect()
}

impl TokenService {
    pub fn new(store: Arc<dyn TokenStore>, settings: TokenSettings) -> Self {
        Self {
            store,
            settings: Arc::new(settings),
        }
    }

    fn sign(&self, email: &str, token_type: TokenType, expires_at: DateTime<Utc>) -> Result<TokenRecord, EngineError> {
        let id = new_subject();
        let claims = TokenClaims {
            email: email.to_string(),
            token_type,
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
            sub: id.clone(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.settings.secret.as_bytes()),
        )
        .map_err(|e| EngineError::infrastructure("cannot create access token", e))?;

        Ok(TokenRecord {
            id,
            token,
            token_type,
            expires_at,
            blacklisted: false,
        })
    }

    pub async fn create_token(
        &self,
        email: &str,
        token_type: TokenType,
        expires_at: DateTime<Utc>,
    ) -> Result<TokenRecord, EngineError> {
        let record = self.sign(email, token_type, expires_at)?;
        self.store
            .insert(&record)
            .await
            .map_err(|e| EngineError::infrastructure("cannot save access token", e))?;
        tracing::info!(token_id = %record.id, token_type = token_type.as_str(), "token issued");
        Ok(record)
    }

    fn sign_pair(&self, email: &str) -> Result<TokenPair, EngineError> {
        let now = Utc::now();
        Ok(TokenPair {
            access: self.sign(email, TokenType::Access, now + self.settings.access_ttl)?,
            refresh: self.sign(email, TokenType::Refresh, now + self.settings.refresh_ttl)?,
        })
    }

    /// Issues an access/refresh pair. Both rows are stored or neither is.
    pub async fn generate_access_tokens(&self, email: &str) -> Result<TokenPair, EngineError> {
        let TokenPair { access, refresh } = self.sign_pair(email)?;

        self.store
            .insert_all(&[access.clone(), refresh.clone()])
            .await
            .map_err(|e| {
                tracing::error!(error = %e, "failed to persist token pair");
                EngineError::infrastructure("cannot save access token", e)
            })?;

        tracing::info!(access_id = %access.id, refresh_id = %refresh.id, "token pair issued");
        Ok(TokenPair { access, refresh })
    }

    pub async fn verify_token(&self, credential: &str, required: TokenType) -> Result<TokenRecord, EngineError> {
        self.verify_with_claims(credential, required).await.map(|(record, _)| record)
    }

    async fn verify_with_claims(
        &self,
        credential: &str,
        required: TokenType,
    ) -> Result<(TokenRecord, TokenClaims), EngineError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.settings.leeway_seconds;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<TokenClaims>(
            credential,
            &DecodingKey::from_secret(self.settings.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::InvalidToken,
        })?;

        if claims.token_type != required {
            return Err(AuthError::InvalidToken.into());
        }

        let record = self
            .store
            .find_by_id(&claims.sub)
            .await
            .map_err(|e| EngineError::infrastructure("cannot find token", e))?
            .ok_or(AuthError::TokenNotFound)?;

        if record.token_type != required || record.token != credential {
            return Err(AuthError::InvalidToken.into());
        }
        if record.blacklisted {
            return Err(AuthError::TokenBlacklisted.into());
        }
        let leeway = Duration::seconds(self.settings.leeway_seconds.min(MAX_LEEWAY_SECONDS) as i64);
        if record.expires_at + leeway < Utc::now() {
            return Err(AuthError::TokenExpired.into());
        }

        Ok((record, claims))
    }

    pub async fn delete_token_by_id(&self, id: &str) -> Result<(), EngineError> {
        let deleted = self
            .store
            .delete_by_id(id)
            .await
            .map_err(|e| EngineError::infrastructure("cannot delete token", e))?;
        if !deleted {
            return Err(AuthError::TokenNotFound.into());
        }
        tracing::info!(token_id = %id, "token deleted");
        Ok(())
    }

    /// Consumes a refresh token and issues a fresh pair for the same principal.
    /// The old token is deleted only if the new pair is stored.
    pub async fn refresh(&self, credential: &str, email: &str) -> Result<TokenPair, EngineError> {
        let (record, claims) = self.verify_with_claims(credential, TokenType::Refresh).await?;
        if !email.is_empty() && email != claims.email {
            tracing::warn!(token_id = %record.id, "refresh attempted for a different principal");
            return Err(AuthError::InvalidToken.into());
        }

        let pair = self.sign_pair(&claims.email)?;
        let rotated = self
            .store
            .rotate(&record.id, &[pair.access.clone(), pair.refresh.clone()])
            .await
            .map_err(|e| {
                tracing::error!(token_id = %record.id, error = %e, "failed to rotate refresh token");
                EngineError::infrastructure("cannot save access token", e)
            })?;
        // Losing a concurrent refresh race.
        if !rotated {
            return Err(AuthError::TokenNotFound.into());
        }

        tracing::info!(
            consumed_id = %record.id,
            access_id = %pair.access.id,
            refresh_id = %pair.refresh.id,
            "refresh token rotated"
        );
        Ok(pair)
    }

    pub async fn blacklist_token(&self, id: &str) -> Result<(), EngineError> {
        let updated = self
            .store
            .set_blacklisted(id, true)
            .await
            .map_err(|e| EngineError::infrastructure("cannot update token", e))?;
        if !updated {
            return Err(AuthError::TokenNotFound.into());
        }
        tracing::info!(token_id = %id, "token blacklisted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn subjects_are_long_and_distinct() {
        let ids: HashSet<String> = (0..1000).map(|_| new_subject()).collect();
        assert_eq!(ids.len(), 1000);
        assert!(ids.iter().all(|id| id.len() == SUBJECT_LEN && id.chars().all(|c| c.is_ascii_alphanumeric())));
    }
}
