use chrono::{Duration, TimeZone, Utc};
use plagifree_core::{AccountStore, CreateAccountInput, PlagiError};
use plagifree_storage_sqlite::{SqliteAccountStore, open_pool};
use tempfile::TempDir;

async fn setup() -> (SqliteAccountStore, TempDir) {
    let tempdir = TempDir::new().unwrap();
    let db_path = tempdir.path().join("test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = open_pool(&db_url).await.unwrap();
    (SqliteAccountStore::new(pool), tempdir)
}

fn test_input(email: &str) -> CreateAccountInput {
    CreateAccountInput {
        id: uuid::Uuid::new_v4().to_string(),
        email: email.to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$fakesalt$fakehash".to_string(),
        daily_limit: 10,
        reset_date: Utc.with_ymd_and_hms(2030, 1, 2, 0, 0, 0).unwrap(),
    }
}

// ── Account CRUD ────────────────────────────────────────────────────────

#[tokio::test]
async fn create_sets_initial_ledger_state() {
    let (store, _dir) = setup().await;
    let input = test_input("alice@test.com");
    let account = store.create_account(&input).await.unwrap();

    assert_eq!(account.id, input.id);
    assert_eq!(account.daily_limit, 10);
    assert_eq!(account.rewrites_today, 0);
    assert_eq!(account.credits, 0);
    assert_eq!(account.reset_date, input.reset_date);
    assert!(!account.email_verified);
}

#[tokio::test]
async fn only_first_account_is_admin() {
    let (store, _dir) = setup().await;
    let first = store.create_account(&test_input("owner@test.com")).await.unwrap();
    let second = store.create_account(&test_input("user@test.com")).await.unwrap();
    assert!(first.is_admin);
    assert!(!second.is_admin);
}

#[tokio::test]
async fn duplicate_email_rejected_case_insensitively() {
    let (store, _dir) = setup().await;
    store.create_account(&test_input("bob@test.com")).await.unwrap();
    let err = store
        .create_account(&test_input("BOB@test.com"))
        .await
        .unwrap_err();
    assert!(matches!(err, PlagiError::EmailAlreadyRegistered), "got {err:?}");
}

#[tokio::test]
async fn lookup_by_id_and_email() {
    let (store, _dir) = setup().await;
    let created = store.create_account(&test_input("carol@test.com")).await.unwrap();

    let by_id = store.get_account_by_id(&created.id).await.unwrap().unwrap();
    assert_eq!(by_id.email, "carol@test.com");
    let by_email = store.get_account_by_email("carol@test.com").await.unwrap().unwrap();
    assert_eq!(by_email.id, created.id);

    assert!(store.get_account_by_id("nope").await.unwrap().is_none());
    assert!(store.get_account_by_email("nope@test.com").await.unwrap().is_none());
}

// ── Daily reset ─────────────────────────────────────────────────────────

#[tokio::test]
async fn reset_is_compare_and_set_on_reset_date() {
    let (store, _dir) = setup().await;
    let input = test_input("reset@test.com");
    let account = store.create_account(&input).await.unwrap();
    let next = input.reset_date + Duration::days(1);

    assert!(store.reset_daily_usage(&account.id, input.reset_date, next).await.unwrap());
    // A second caller that observed the old boundary loses the race.
    assert!(!store.reset_daily_usage(&account.id, input.reset_date, next).await.unwrap());

    let account = store.get_account_by_id(&account.id).await.unwrap().unwrap();
    assert_eq!(account.reset_date, next);
    assert_eq!(account.rewrites_today, 0);
}

// ── Email verification ──────────────────────────────────────────────────

#[tokio::test]
async fn email_token_lifecycle() {
    let (store, _dir) = setup().await;
    let account = store.create_account(&test_input("verify@test.com")).await.unwrap();

    store.create_email_token("confirm_email", &account.id, "tok-1").await.unwrap();
    let (owner, requested_at) = store
        .get_email_token_by_token("confirm_email", "tok-1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(owner, account.id);
    assert!(Utc::now() - requested_at < Duration::minutes(1));

    // Re-issuing replaces the previous token.
    store.create_email_token("confirm_email", &account.id, "tok-2").await.unwrap();
    assert!(store.get_email_token_by_token("confirm_email", "tok-1").await.unwrap().is_none());

    store.set_email_verified(&account.id).await.unwrap();
    store.delete_email_token("confirm_email", &account.id).await.unwrap();
    assert!(store.get_email_token_by_token("confirm_email", "tok-2").await.unwrap().is_none());

    let account = store.get_account_by_id(&account.id).await.unwrap().unwrap();
    assert!(account.email_verified);
}
