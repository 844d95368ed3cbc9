use crate::domain::card::Settlement;
use crate::domain::payment::{PaymentRecord, PaymentStatus};
use crate::repo::cards_repo::CardsRepo;
use crate::repo::ports::PaymentStore;
use anyhow::Result;
use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

#[derive(Clone)]
pub struct PaymentsRepo {
    pub pool: PgPool,
}

fn map_row(r: PgRow) -> Result<PaymentRecord> {
    let status: String = r.get("status");
    let expiry_month: i64 = r.get("exp_month");
    Ok(PaymentRecord {
        payment_id: r.get("payment_id"),
        card_number: r.get("card_number"),
        expiry_month: u32::try_from(expiry_month)?,
        expiry_year: r.get("exp_year"),
        amount: r.get("amount"),
        currency: r.get("currency"),
        cvv: r.get("cvv"),
        status: PaymentStatus::parse(&status)
            .ok_or_else(|| anyhow::anyhow!("unknown payment status {}", status))?,
    })
}

#[async_trait]
impl PaymentStore for PaymentsRepo {
    async fn insert(&self, payment: &PaymentRecord) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO payments (
                payment_id, card_number, exp_month, exp_year, amount, currency, cvv, status
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(&payment.payment_id)
        .bind(&payment.card_number)
        .bind(i64::from(payment.expiry_month))
        .bind(payment.expiry_year)
        .bind(payment.amount)
        .bind(&payment.currency)
        .bind(&payment.cvv)
        .bind(payment.status.as_str())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> Result<Option<PaymentRecord>> {
        let row = sqlx::query(
            r#"
            SELECT payment_id, card_number, exp_month, exp_year, amount, currency, cvv, status
            FROM payments
            WHERE payment_id = $1
            "#,
        )
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(map_row).transpose()
    }

    async fn set_status(&self, payment_id: &str, status: PaymentStatus) -> Result<()> {
        sqlx::query("UPDATE payments SET status = $2, updated_at = now() WHERE payment_id = $1 AND status = $3")
            .bind(payment_id)
            .bind(status.as_str())
            .bind(PaymentStatus::InProgress.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn settle(&self, payment_id: &str, card_number: &str, amount: Decimal) -> Result<Settlement> {
        let mut tx = self.pool.begin().await?;

        let debited = CardsRepo::debit_tx(&mut tx, card_number, amount).await?;
        if !debited {
            let exists = CardsRepo::exists_tx(&mut tx, card_number).await?;
            tx.rollback().await?;
            return Ok(if exists {
                Settlement::InsufficientFunds
            } else {
                Settlement::CardMissing
            });
        }

        let updated = sqlx::query(
            "UPDATE payments SET status = $2, updated_at = now() WHERE payment_id = $1 AND status = $3",
        )
        .bind(payment_id)
        .bind(PaymentStatus::Success.as_str())
        .bind(PaymentStatus::InProgress.as_str())
        .execute(&mut *tx)
        .await?;

        if updated.rows_affected() != 1 {
            tx.rollback().await?;
            anyhow::bail!("payment {} is not in progress", payment_id);
        }

        tx.commit().await?;
        Ok(Settlement::Settled)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
