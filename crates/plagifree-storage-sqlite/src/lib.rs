pub mod account;
pub mod history;
pub mod payment;

pub use account::SqliteAccountStore;
pub use history::SqliteHistoryStore;
pub use payment::SqlitePaymentStore;

use chrono::{NaiveDateTime, TimeZone, Utc};
use plagifree_core::{PlagiError, PlagiResult};
use sqlx::SqlitePool;

/// Open the shared connection pool and bring the schema up to date.
///
/// Every store in this crate is built from the returned pool; close it at
/// shutdown with [`SqlitePool::close`].
pub async fn open_pool(url: &str) -> PlagiResult<SqlitePool> {
    let pool = SqlitePool::connect(url).await.map_err(db_err)?;

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .map_err(|e| PlagiError::Storage(e.to_string()))?;

    tracing::debug!("sqlite schema migrated");
    Ok(pool)
}

pub(crate) fn db_err(e: sqlx::Error) -> PlagiError {
    PlagiError::Storage(e.to_string())
}

/// Timestamps written by this crate: fixed-width RFC 3339 with microseconds,
/// so text comparison matches time order.
pub(crate) fn format_datetime(dt: &chrono::DateTime<Utc>) -> String {
    dt.format("%Y-%m-%dT%H:%M:%S%.6fZ").to_string()
}

/// Parse a stored timestamp, either one written by [`format_datetime`] or a
/// column default produced by `strftime('%Y-%m-%dT%H:%M:%fZ', 'now')`.
pub(crate) fn parse_datetime(s: &str) -> PlagiResult<chrono::DateTime<Utc>> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.fZ") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    Err(PlagiError::Storage(format!("failed to parse datetime: {s}")))
}
