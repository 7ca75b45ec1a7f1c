use async_trait::async_trait;

use crate::error::PlagiResult;
use crate::types::{DebitBucket, HistoryRecord};

#[async_trait]
pub trait HistoryStore: Send + Sync + 'static {
    /// Persist a rewrite and charge the owning account in one transaction.
    ///
    /// The charge takes the daily quota while `rewrites_today < daily_limit`,
    /// otherwise one credit while `credits > 0`. Returns `None` without
    /// writing anything when neither bucket can pay.
    async fn record_rewrite(&self, record: &HistoryRecord) -> PlagiResult<Option<DebitBucket>>;

    /// Most recent first.
    async fn list_history(&self, account_id: &str, limit: usize) -> PlagiResult<Vec<HistoryRecord>>;

    /// Only returns records owned by `account_id`.
    async fn get_history(&self, account_id: &str, id: &str) -> PlagiResult<Option<HistoryRecord>>;
}
