use crate::domain::card::Card;
use crate::repo::ports::CardStore;
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Row, Transaction};

#[derive(Clone)]
pub struct CardsRepo {
    pub pool: PgPool,
}

impl CardsRepo {
    /// Conditional decrement; concurrent debits on one card cannot take the balance below zero.
    pub async fn debit_tx(
        tx: &mut Transaction<'_, Postgres>,
        card_number: &str,
        amount: Decimal,
    ) -> Result<bool> {
        let res = sqlx::query(
            "UPDATE cards SET balance = balance - $2, updated_at = now() WHERE card_number = $1 AND balance >= $2",
        )
        .bind(card_number)
        .bind(amount)
        .execute(&mut **tx)
        .await?;

        Ok(res.rows_affected() == 1)
    }

    pub async fn exists_tx(tx: &mut Transaction<'_, Postgres>, card_number: &str) -> Result<bool> {
        let row = sqlx::query("SELECT 1 AS one FROM cards WHERE card_number = $1")
            .bind(card_number)
            .fetch_optional(&mut **tx)
            .await?;
        Ok(row.is_some())
    }
}

#[async_trait]
impl CardStore for CardsRepo {
    async fn find_card(&self, card_number: &str) -> Result<Option<Card>> {
        let row = sqlx::query("SELECT card_number, balance FROM cards WHERE card_number = $1")
            .bind(card_number)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|r| Card {
            card_number: r.get("card_number"),
            balance: r.get("balance"),
        }))
    }
}
