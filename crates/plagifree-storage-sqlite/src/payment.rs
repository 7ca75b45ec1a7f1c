use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Row, SqlitePool};

use plagifree_core::{
    OwnerPayoutConfig, PaymentStore, PaymentTransaction, PlagiError, PlagiResult, Settlement,
    TransactionStatus,
};

use crate::{db_err, format_datetime, parse_datetime};

#[derive(Clone)]
pub struct SqlitePaymentStore {
    pool: SqlitePool,
}

fn row_to_transaction(row: &sqlx::sqlite::SqliteRow) -> PlagiResult<PaymentTransaction> {
    let status: String = row.try_get("status").map_err(db_err)?;
    let created_at: String = row.try_get("created_at").map_err(db_err)?;
    let updated_at: String = row.try_get("updated_at").map_err(db_err)?;

    Ok(PaymentTransaction {
        id: row.try_get("id").map_err(db_err)?,
        account_id: row.try_get("account_id").map_err(db_err)?,
        session_id: row.try_get("session_id").map_err(db_err)?,
        package_id: row.try_get("package_id").map_err(db_err)?,
        credits: row.try_get("credits").map_err(db_err)?,
        amount_cents: row.try_get("amount_cents").map_err(db_err)?,
        currency: row.try_get("currency").map_err(db_err)?,
        status: status.parse()?,
        created_at: parse_datetime(&created_at)?,
        updated_at: parse_datetime(&updated_at)?,
    })
}

impl SqlitePaymentStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PaymentStore for SqlitePaymentStore {
    async fn create_transaction(&self, transaction: &PaymentTransaction) -> PlagiResult<()> {
        sqlx::query(
            r#"
            INSERT INTO payment_transaction (
                id, account_id, session_id, package_id, credits, amount_cents,
                currency, status, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&transaction.id)
        .bind(&transaction.account_id)
        .bind(&transaction.session_id)
        .bind(&transaction.package_id)
        .bind(transaction.credits)
        .bind(transaction.amount_cents)
        .bind(&transaction.currency)
        .bind(transaction.status.as_str())
        .bind(format_datetime(&transaction.created_at))
        .bind(format_datetime(&transaction.updated_at))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_transaction_by_session(
        &self,
        session_id: &str,
    ) -> PlagiResult<Option<PaymentTransaction>> {
        let row = sqlx::query(
            "SELECT id, account_id, session_id, package_id, credits, amount_cents, currency, \
             status, created_at, updated_at FROM payment_transaction WHERE session_id = ?",
        )
        .bind(session_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        row.as_ref().map(row_to_transaction).transpose()
    }

    async fn settle_paid(&self, session_id: &str) -> PlagiResult<Settlement> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        let flipped = sqlx::query(
            "UPDATE payment_transaction SET status = 'paid', updated_at = ? \
             WHERE session_id = ? AND status = 'pending' \
             RETURNING account_id, credits",
        )
        .bind(format_datetime(&Utc::now()))
        .bind(session_id)
        .fetch_optional(&mut *tx)
        .await
        .map_err(db_err)?;

        let Some(row) = flipped else {
            let current = sqlx::query("SELECT status FROM payment_transaction WHERE session_id = ?")
                .bind(session_id)
                .fetch_optional(&mut *tx)
                .await
                .map_err(db_err)?;
            tx.rollback().await.map_err(db_err)?;

            let Some(current) = current else {
                return Err(PlagiError::NotFound(format!(
                    "unknown checkout session: {session_id}"
                )));
            };
            let status: String = current.try_get("status").map_err(db_err)?;
            return match status.parse::<TransactionStatus>()? {
                TransactionStatus::Paid => Ok(Settlement::AlreadyCredited),
                other => Ok(Settlement::Closed(other)),
            };
        };

        let account_id: String = row.try_get("account_id").map_err(db_err)?;
        let credits: i64 = row.try_get("credits").map_err(db_err)?;

        sqlx::query("UPDATE account SET credits = credits + ? WHERE id = ?")
            .bind(credits)
            .bind(&account_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(Settlement::Credited {
            account_id,
            credits,
        })
    }

    async fn close_transaction(
        &self,
        session_id: &str,
        status: TransactionStatus,
    ) -> PlagiResult<bool> {
        if !matches!(status, TransactionStatus::Expired | TransactionStatus::Failed) {
            return Err(PlagiError::InternalError(format!(
                "cannot close a transaction as {status}"
            )));
        }

        let result = sqlx::query(
            "UPDATE payment_transaction SET status = ?, updated_at = ? \
             WHERE session_id = ? AND status = 'pending'",
        )
        .bind(status.as_str())
        .bind(format_datetime(&Utc::now()))
        .bind(session_id)
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn get_owner_payout(&self) -> PlagiResult<Option<OwnerPayoutConfig>> {
        let row = sqlx::query(
            "SELECT payout_email, business_name, stripe_account_id, currency, updated_at \
             FROM owner_payout WHERE id = 1",
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(ref r) => {
                let updated_at: String = r.try_get("updated_at").map_err(db_err)?;
                Ok(Some(OwnerPayoutConfig {
                    payout_email: r.try_get("payout_email").map_err(db_err)?,
                    business_name: r.try_get("business_name").map_err(db_err)?,
                    stripe_account_id: r.try_get("stripe_account_id").map_err(db_err)?,
                    currency: r.try_get("currency").map_err(db_err)?,
                    updated_at: parse_datetime(&updated_at)?,
                }))
            }
            None => Ok(None),
        }
    }

    async fn upsert_owner_payout(&self, config: &OwnerPayoutConfig) -> PlagiResult<()> {
        sqlx::query(
            r#"
            INSERT INTO owner_payout (id, payout_email, business_name, stripe_account_id, currency, updated_at)
            VALUES (1, ?, ?, ?, ?, ?)
            ON CONFLICT (id) DO UPDATE SET
                payout_email = excluded.payout_email,
                business_name = excluded.business_name,
                stripe_account_id = excluded.stripe_account_id,
                currency = excluded.currency,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&config.payout_email)
        .bind(&config.business_name)
        .bind(&config.stripe_account_id)
        .bind(&config.currency)
        .bind(format_datetime(&config.updated_at))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }
}
