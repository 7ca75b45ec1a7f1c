use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use plagifree_core::{DebitBucket, HistoryRecord, HistoryStore, PlagiError, PlagiResult};

use crate::{db_err, format_datetime, parse_datetime};

#[derive(Clone)]
pub struct SqliteHistoryStore {
    pool: SqlitePool,
}

const HISTORY_SELECT: &str = r#"
    SELECT
        id,
        account_id,
        original_text,
        rewritten_text,
        mode,
        tone,
        original_word_count,
        rewritten_word_count,
        uniqueness_score,
        created_at
    FROM rewrite_history
"#;

fn row_to_history(row: &sqlx::sqlite::SqliteRow) -> PlagiResult<HistoryRecord> {
    let mode: String = row.try_get("mode").map_err(db_err)?;
    let tone: String = row.try_get("tone").map_err(db_err)?;
    let created_at: String = row.try_get("created_at").map_err(db_err)?;

    Ok(HistoryRecord {
        id: row.try_get("id").map_err(db_err)?,
        account_id: row.try_get("account_id").map_err(db_err)?,
        original_text: row.try_get("original_text").map_err(db_err)?,
        rewritten_text: row.try_get("rewritten_text").map_err(db_err)?,
        mode: mode
            .parse()
            .map_err(|_| PlagiError::Storage(format!("unknown rewrite mode: {mode}")))?,
        tone: tone
            .parse()
            .map_err(|_| PlagiError::Storage(format!("unknown rewrite tone: {tone}")))?,
        original_word_count: row.try_get("original_word_count").map_err(db_err)?,
        rewritten_word_count: row.try_get("rewritten_word_count").map_err(db_err)?,
        uniqueness_score: row.try_get("uniqueness_score").map_err(db_err)?,
        created_at: parse_datetime(&created_at)?,
    })
}

impl SqliteHistoryStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn record_rewrite(&self, record: &HistoryRecord) -> PlagiResult<Option<DebitBucket>> {
        let mut tx = self.pool.begin().await.map_err(db_err)?;

        // Each charge is a single conditional UPDATE; the first one also takes
        // the write lock, so the pair cannot interleave with another debit.
        let quota = sqlx::query(
            "UPDATE account SET rewrites_today = rewrites_today + 1 \
             WHERE id = ? AND rewrites_today < daily_limit",
        )
        .bind(&record.account_id)
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        let bucket = if quota.rows_affected() == 1 {
            DebitBucket::Quota
        } else {
            let credit = sqlx::query(
                "UPDATE account SET credits = credits - 1 \
                 WHERE id = ? AND rewrites_today >= daily_limit AND credits > 0",
            )
            .bind(&record.account_id)
            .execute(&mut *tx)
            .await
            .map_err(db_err)?;

            if credit.rows_affected() == 0 {
                tx.rollback().await.map_err(db_err)?;
                return Ok(None);
            }
            DebitBucket::Credit
        };

        sqlx::query(
            r#"
            INSERT INTO rewrite_history (
                id, account_id, original_text, rewritten_text, mode, tone,
                original_word_count, rewritten_word_count, uniqueness_score, created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&record.id)
        .bind(&record.account_id)
        .bind(&record.original_text)
        .bind(&record.rewritten_text)
        .bind(record.mode.as_str())
        .bind(record.tone.as_str())
        .bind(record.original_word_count)
        .bind(record.rewritten_word_count)
        .bind(record.uniqueness_score)
        .bind(format_datetime(&record.created_at))
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        Ok(Some(bucket))
    }

    async fn list_history(&self, account_id: &str, limit: usize) -> PlagiResult<Vec<HistoryRecord>> {
        let sql = format!(
            "{HISTORY_SELECT} WHERE account_id = ? ORDER BY created_at DESC, rowid DESC LIMIT ?"
        );
        let rows = sqlx::query(&sql)
            .bind(account_id)
            .bind(limit as i64)
            .fetch_all(&self.pool)
            .await
            .map_err(db_err)?;

        rows.iter().map(row_to_history).collect()
    }

    async fn get_history(&self, account_id: &str, id: &str) -> PlagiResult<Option<HistoryRecord>> {
        let sql = format!("{HISTORY_SELECT} WHERE id = ? AND account_id = ?");
        let row = sqlx::query(&sql)
            .bind(id)
            .bind(account_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(db_err)?;

        row.as_ref().map(row_to_history).transpose()
    }
}
