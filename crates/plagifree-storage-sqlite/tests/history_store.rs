use chrono::{Duration, Utc};
use plagifree_core::{
    AccountStore, CreateAccountInput, DebitBucket, HistoryRecord, HistoryStore, RewriteMode,
    RewriteTone,
};
use plagifree_storage_sqlite::{SqliteAccountStore, SqliteHistoryStore, open_pool};
use sqlx::SqlitePool;
use tempfile::TempDir;

struct Fixture {
    pool: SqlitePool,
    accounts: SqliteAccountStore,
    history: SqliteHistoryStore,
    _dir: TempDir,
}

async fn setup() -> Fixture {
    let dir = TempDir::new().unwrap();
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
    let pool = open_pool(&db_url).await.unwrap();
    Fixture {
        accounts: SqliteAccountStore::new(pool.clone()),
        history: SqliteHistoryStore::new(pool.clone()),
        pool,
        _dir: dir,
    }
}

async fn account_with(fx: &Fixture, email: &str, rewrites_today: i64, credits: i64) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    fx.accounts
        .create_account(&CreateAccountInput {
            id: id.clone(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            daily_limit: 10,
            reset_date: Utc::now() + Duration::hours(12),
        })
        .await
        .unwrap();
    sqlx::query("UPDATE account SET rewrites_today = ?, credits = ? WHERE id = ?")
        .bind(rewrites_today)
        .bind(credits)
        .bind(&id)
        .execute(&fx.pool)
        .await
        .unwrap();
    id
}

fn record(account_id: &str, text: &str) -> HistoryRecord {
    HistoryRecord {
        id: uuid::Uuid::new_v4().to_string(),
        account_id: account_id.to_string(),
        original_text: text.to_string(),
        rewritten_text: format!("{text} (rewritten)"),
        mode: RewriteMode::Standard,
        tone: RewriteTone::Academic,
        original_word_count: 2,
        rewritten_word_count: 3,
        uniqueness_score: 33.3,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn quota_is_charged_before_credits() {
    let fx = setup().await;
    let id = account_with(&fx, "order@test.com", 9, 5).await;

    let first = fx.history.record_rewrite(&record(&id, "one")).await.unwrap();
    assert_eq!(first, Some(DebitBucket::Quota));
    let account = fx.accounts.get_account_by_id(&id).await.unwrap().unwrap();
    assert_eq!((account.rewrites_today, account.credits), (10, 5));

    let second = fx.history.record_rewrite(&record(&id, "two")).await.unwrap();
    assert_eq!(second, Some(DebitBucket::Credit));
    let account = fx.accounts.get_account_by_id(&id).await.unwrap().unwrap();
    assert_eq!((account.rewrites_today, account.credits), (10, 4));
}

#[tokio::test]
async fn exhausted_account_writes_nothing() {
    let fx = setup().await;
    let id = account_with(&fx, "empty@test.com", 10, 0).await;

    let outcome = fx.history.record_rewrite(&record(&id, "denied")).await.unwrap();
    assert_eq!(outcome, None);
    assert!(fx.history.list_history(&id, 50).await.unwrap().is_empty());

    let account = fx.accounts.get_account_by_id(&id).await.unwrap().unwrap();
    assert_eq!((account.rewrites_today, account.credits), (10, 0));
}

#[tokio::test]
async fn concurrent_debits_never_overdraw() {
    let fx = setup().await;
    let id = account_with(&fx, "race@test.com", 10, 1).await;

    let left = record(&id, "left");
    let right = record(&id, "right");
    let (a, b) = tokio::join!(
        fx.history.record_rewrite(&left),
        fx.history.record_rewrite(&right),
    );
    let charged = [a.unwrap(), b.unwrap()].iter().filter(|o| o.is_some()).count();
    assert_eq!(charged, 1);

    let account = fx.accounts.get_account_by_id(&id).await.unwrap().unwrap();
    assert_eq!(account.credits, 0);
    assert_eq!(fx.history.list_history(&id, 50).await.unwrap().len(), 1);
}

#[tokio::test]
async fn negative_credit_balance_is_refused_by_schema() {
    let fx = setup().await;
    let id = account_with(&fx, "floor@test.com", 0, 0).await;

    let result = sqlx::query("UPDATE account SET credits = -1 WHERE id = ?")
        .bind(&id)
        .execute(&fx.pool)
        .await;
    assert!(result.is_err());

    let account = fx.accounts.get_account_by_id(&id).await.unwrap().unwrap();
    assert_eq!(account.credits, 0);
}

#[tokio::test]
async fn history_is_newest_first_and_capped() {
    let fx = setup().await;
    let id = account_with(&fx, "many@test.com", 0, 100).await;

    for i in 0..5 {
        let mut r = record(&id, &format!("text {i}"));
        r.created_at = Utc::now() + Duration::seconds(i);
        fx.history.record_rewrite(&r).await.unwrap();
    }

    let items = fx.history.list_history(&id, 3).await.unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[0].original_text, "text 4");
    assert_eq!(items[2].original_text, "text 2");
}

#[tokio::test]
async fn history_items_are_private_to_their_owner() {
    let fx = setup().await;
    let owner = account_with(&fx, "owner@test.com", 0, 0).await;
    let other = account_with(&fx, "other@test.com", 0, 0).await;

    let r = record(&owner, "mine");
    fx.history.record_rewrite(&r).await.unwrap();

    let fetched = fx.history.get_history(&owner, &r.id).await.unwrap().unwrap();
    assert_eq!(fetched.mode, RewriteMode::Standard);
    assert_eq!(fetched.tone, RewriteTone::Academic);
    assert_eq!(fetched.uniqueness_score, 33.3);

    assert!(fx.history.get_history(&other, &r.id).await.unwrap().is_none());
    assert!(fx.history.list_history(&other, 50).await.unwrap().is_empty());
}
