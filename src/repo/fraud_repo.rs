use crate::domain::card::FraudFlag;
use crate::repo::ports::FraudStore;
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Row};

#[derive(Clone)]
pub struct FraudRepo {
    pub pool: PgPool,
}

#[async_trait]
impl FraudStore for FraudRepo {
    async fn find_matching(&self, card_number: &str, amount: Decimal, currency: &str) -> Result<Option<FraudFlag>> {
        let row = sqlx::query(
            r#"
            SELECT card_number, amount, currency
            FROM frauds
            WHERE card_number = $1 AND amount <= $2 AND currency = $3
            ORDER BY amount ASC
            LIMIT 1
            "#,
        )
        .bind(card_number)
        .bind(amount)
        .bind(currency)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| FraudFlag {
            card_number: r.get("card_number"),
            amount: r.get("amount"),
            currency: r.get("currency"),
        }))
    }
}
