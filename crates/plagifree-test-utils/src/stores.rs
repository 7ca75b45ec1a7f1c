use sqlx::SqlitePool;
use tempfile::TempDir;

use plagifree_storage_sqlite::{
    SqliteAccountStore, SqliteHistoryStore, SqlitePaymentStore, open_pool,
};

pub struct TestStores {
    pub account_store: SqliteAccountStore,
    pub history_store: SqliteHistoryStore,
    pub payment_store: SqlitePaymentStore,
    /// Direct handle for tests that need to rewind counters or timestamps.
    pub pool: SqlitePool,
    /// Hold the TempDir to keep it alive for the test's duration.
    pub _tempdir: TempDir,
}

/// Create a fresh set of test stores backed by a migrated database in a tempdir.
pub async fn create_test_stores() -> TestStores {
    let tempdir = TempDir::new().expect("failed to create tempdir");
    let db_path = tempdir.path().join("test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let pool = open_pool(&db_url).await.expect("failed to open pool");

    TestStores {
        account_store: SqliteAccountStore::new(pool.clone()),
        history_store: SqliteHistoryStore::new(pool.clone()),
        payment_store: SqlitePaymentStore::new(pool.clone()),
        pool,
        _tempdir: tempdir,
    }
}
