use crate::domain::token::{TokenRecord, TokenType};
use crate::repo::ports::TokenStore;
use anyhow::Result;
use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};

#[derive(Clone)]
pub struct TokensRepo {
    pub pool: PgPool,
}

fn map_row(r: PgRow) -> Result<TokenRecord> {
    let token_type: String = r.get("type");
    Ok(TokenRecord {
        id: r.get("id"),
        token: r.get("token"),
        token_type: TokenType::parse(&token_type)
            .ok_or_else(|| anyhow::anyhow!("unknown token type {}", token_type))?,
        expires_at: r.get("expires_at"),
        blacklisted: r.get("blacklisted"),
    })
}

impl TokensRepo {
    async fn insert_tx(tx: &mut Transaction<'_, Postgres>, token: &TokenRecord) -> Result<()> {
        sqlx::query(
            "INSERT INTO tokens (id, token, type, expires_at, blacklisted) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(&token.id)
        .bind(&token.token)
        .bind(token.token_type.as_str())
        .bind(token.expires_at)
        .bind(token.blacklisted)
        .execute(&mut **tx)
        .await?;
        Ok(())
    }
}

#[async_trait]
impl TokenStore for TokensRepo {
    async fn insert(&self, token: &TokenRecord) -> Result<()> {
        self.insert_all(std::slice::from_ref(token)).await
    }

    async fn insert_all(&self, tokens: &[TokenRecord]) -> Result<()> {
        let mut tx = self.pool.begin().await?;
        for token in tokens {
            Self::insert_tx(&mut tx, token).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<TokenRecord>> {
        let row = sqlx::query("SELECT id, token, type, expires_at, blacklisted FROM tokens WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        row.map(map_row).transpose()
    }

    async fn delete_by_id(&self, id: &str) -> Result<bool> {
        let res = sqlx::query("DELETE FROM tokens WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn set_blacklisted(&self, id: &str, blacklisted: bool) -> Result<bool> {
        let res = sqlx::query("UPDATE tokens SET blacklisted = $2 WHERE id = $1")
            .bind(id)
            .bind(blacklisted)
            .execute(&self.pool)
            .await?;
        Ok(res.rows_affected() > 0)
    }

    async fn rotate(&self, consumed_id: &str, tokens: &[TokenRecord]) -> Result<bool> {
        let mut tx = self.pool.begin().await?;

        let res = sqlx::query("DELETE FROM tokens WHERE id = $1")
            .bind(consumed_id)
            .execute(&mut *tx)
            .await?;
        if res.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        for token in tokens {
            Self::insert_tx(&mut tx, token).await?;
        }
        tx.commit().await?;
        Ok(true)
    }
}
