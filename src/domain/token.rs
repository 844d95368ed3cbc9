use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    Access,
    Refresh,
}

impl TokenType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenType::Access => "access",
            TokenType::Refresh => "refresh",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "access" => Some(TokenType::Access),
            "refresh" => Some(TokenType::Refresh),
            _ => None,
        }
    }
}

/// Signed payload. `sub` is the token row id.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenClaims {
    pub email: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    pub iat: i64,
    pub exp: i64,
    pub sub: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TokenRecord {
    pub id: String,
    pub token: String,
    pub token_type: TokenType,
    pub expires_at: DateTime<Utc>,
    pub blacklisted: bool,
}

impl TokenRecord {
    pub fn view(&self) -> TokenView {
        TokenView {
            token: self.token.clone(),
            expires: self.expires_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct TokenView {
    pub token: String,
    pub expires: String,
}

#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access: TokenRecord,
    pub refresh: TokenRecord,
}

#[derive(Debug, Clone, Serialize)]
pub struct TokenPairView {
    pub access: TokenView,
    pub refresh: TokenView,
}

impl TokenPair {
    pub fn view(&self) -> TokenPairView {
        TokenPairView {
            access: self.access.view(),
            refresh: self.refresh.view(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn view_formats_expiry_without_timezone() {
        let record = TokenRecord {
            id: "abc".to_string(),
            token: "jwt".to_string(),
            token_type: TokenType::Access,
            expires_at: Utc.with_ymd_and_hms(2030, 1, 2, 3, 4, 5).unwrap(),
            blacklisted: false,
        };
        assert_eq!(record.view().expires, "2030-01-02 03:04:05");
    }

    #[test]
    fn claims_use_type_key() {
        let claims = TokenClaims {
            email: "a@b.io".to_string(),
            token_type: TokenType::Refresh,
            iat: 1,
            exp: 2,
            sub: "s".to_string(),
        };
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["type"], "refresh");
    }
}
