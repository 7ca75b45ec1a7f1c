use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};

use plagifree_core::{Account, AccountStore, CreateAccountInput, PlagiError, PlagiResult};

use crate::{db_err, format_datetime, parse_datetime};

#[derive(Clone)]
pub struct SqliteAccountStore {
    pool: SqlitePool,
}

const ACCOUNT_SELECT: &str = r#"
    SELECT
        id,
        email,
        password_hash,
        daily_limit,
        rewrites_today,
        credits,
        reset_date,
        email_verified,
        is_admin,
        created_at
    FROM account
"#;

pub(crate) fn row_to_account(row: &sqlx::sqlite::SqliteRow) -> PlagiResult<Account> {
    let reset_date: String = row.try_get("reset_date").map_err(db_err)?;
    let created_at: String = row.try_get("created_at").map_err(db_err)?;

    Ok(Account {
        id: row.try_get("id").map_err(db_err)?,
        email: row.try_get("email").map_err(db_err)?,
        password_hash: row.try_get("password_hash").map_err(db_err)?,
        daily_limit: row.try_get("daily_limit").map_err(db_err)?,
        rewrites_today: row.try_get("rewrites_today").map_err(db_err)?,
        credits: row.try_get("credits").map_err(db_err)?,
        reset_date: parse_datetime(&reset_date)?,
        email_verified: row.try_get("email_verified").map_err(db_err)?,
        is_admin: row.try_get("is_admin").map_err(db_err)?,
        created_at: parse_datetime(&created_at)?,
    })
}

impl SqliteAccountStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    async fn get_account_where(
        &self,
        where_clause: &str,
        bind_value: &str,
    ) -> PlagiResult<Option<Account>> {
        let sql = format!("{ACCOUNT_SELECT} WHERE {where_clause}");
        let row = sqlx::query(&sql)
            .bind(bind_value)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(row_to_account).transpose()
    }
}

#[async_trait]
impl AccountStore for SqliteAccountStore {
    async fn create_account(&self, input: &CreateAccountInput) -> PlagiResult<Account> {
        // The admin flag is decided inside the INSERT so two concurrent first
        // registrations cannot both become admin.
        let result = sqlx::query(
            r#"
            INSERT INTO account (id, email, password_hash, daily_limit, reset_date, is_admin)
            SELECT ?, ?, ?, ?, ?, NOT EXISTS (SELECT 1 FROM account)
            "#,
        )
        .bind(&input.id)
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(input.daily_limit)
        .bind(format_datetime(&input.reset_date))
        .execute(&self.pool)
        .await;

        match result {
            Ok(_) => {}
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                return Err(PlagiError::EmailAlreadyRegistered);
            }
            Err(e) => return Err(db_err(e)),
        }

        self.get_account_by_id(&input.id).await?.ok_or_else(|| {
            PlagiError::Storage("failed to retrieve account after creation".to_string())
        })
    }

    async fn get_account_by_id(&self, id: &str) -> PlagiResult<Option<Account>> {
        self.get_account_where("id = ?", id).await
    }

    async fn get_account_by_email(&self, email: &str) -> PlagiResult<Option<Account>> {
        self.get_account_where("email = ?", email).await
    }

    async fn reset_daily_usage(
        &self,
        id: &str,
        observed_reset: DateTime<Utc>,
        next_reset: DateTime<Utc>,
    ) -> PlagiResult<bool> {
        let result = sqlx::query(
            "UPDATE account SET rewrites_today = 0, reset_date = ? WHERE id = ? AND reset_date = ?",
        )
        .bind(format_datetime(&next_reset))
        .bind(id)
        .bind(format_datetime(&observed_reset))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(result.rows_affected() == 1)
    }

    async fn set_email_verified(&self, id: &str) -> PlagiResult<()> {
        sqlx::query("UPDATE account SET email_verified = 1 WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }

    async fn create_email_token(
        &self,
        purpose: &str,
        account_id: &str,
        token: &str,
    ) -> PlagiResult<()> {
        sqlx::query(
            "INSERT OR REPLACE INTO email_token (purpose, account_id, token, requested_at) \
             VALUES (?, ?, ?, ?)",
        )
        .bind(purpose)
        .bind(account_id)
        .bind(token)
        .bind(format_datetime(&Utc::now()))
        .execute(&self.pool)
        .await
        .map_err(db_err)?;
        Ok(())
    }

    async fn get_email_token_by_token(
        &self,
        purpose: &str,
        token: &str,
    ) -> PlagiResult<Option<(String, DateTime<Utc>)>> {
        let row = sqlx::query(
            "SELECT account_id, requested_at FROM email_token WHERE purpose = ? AND token = ?",
        )
        .bind(purpose)
        .bind(token)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_err)?;

        match row {
            Some(ref r) => {
                let account_id: String = r.try_get("account_id").map_err(db_err)?;
                let requested_at: String = r.try_get("requested_at").map_err(db_err)?;
                Ok(Some((account_id, parse_datetime(&requested_at)?)))
            }
            None => Ok(None),
        }
    }

    async fn delete_email_token(&self, purpose: &str, account_id: &str) -> PlagiResult<()> {
        sqlx::query("DELETE FROM email_token WHERE purpose = ? AND account_id = ?")
            .bind(purpose)
            .bind(account_id)
            .execute(&self.pool)
            .await
            .map_err(db_err)?;
        Ok(())
    }
}
