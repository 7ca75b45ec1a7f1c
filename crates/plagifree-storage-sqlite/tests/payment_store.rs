use chrono::{Duration, Utc};
use plagifree_core::{
    AccountStore, CreateAccountInput, OwnerPayoutConfig, PaymentStore, PaymentTransaction,
    PlagiError, Settlement, TransactionStatus,
};
use plagifree_storage_sqlite::{SqliteAccountStore, SqlitePaymentStore, open_pool};
use tempfile::TempDir;

async fn setup() -> (SqliteAccountStore, SqlitePaymentStore, TempDir) {
    let dir = TempDir::new().unwrap();
    let db_url = format!("sqlite://{}?mode=rwc", dir.path().join("test.db").display());
    let pool = open_pool(&db_url).await.unwrap();
    (
        SqliteAccountStore::new(pool.clone()),
        SqlitePaymentStore::new(pool),
        dir,
    )
}

async fn buyer(accounts: &SqliteAccountStore) -> String {
    let id = uuid::Uuid::new_v4().to_string();
    accounts
        .create_account(&CreateAccountInput {
            id: id.clone(),
            email: format!("{id}@test.com"),
            password_hash: "hash".to_string(),
            daily_limit: 10,
            reset_date: Utc::now() + Duration::hours(1),
        })
        .await
        .unwrap();
    id
}

fn pending(account_id: &str, session_id: &str) -> PaymentTransaction {
    PaymentTransaction {
        id: uuid::Uuid::new_v4().to_string(),
        account_id: account_id.to_string(),
        session_id: session_id.to_string(),
        package_id: "standard".to_string(),
        credits: 50,
        amount_cents: 1999,
        currency: "usd".to_string(),
        status: TransactionStatus::Pending,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

#[tokio::test]
async fn settling_twice_credits_once() {
    let (accounts, payments, _dir) = setup().await;
    let id = buyer(&accounts).await;
    payments.create_transaction(&pending(&id, "cs_1")).await.unwrap();

    let first = payments.settle_paid("cs_1").await.unwrap();
    assert_eq!(
        first,
        Settlement::Credited {
            account_id: id.clone(),
            credits: 50
        }
    );
    let second = payments.settle_paid("cs_1").await.unwrap();
    assert_eq!(second, Settlement::AlreadyCredited);

    let account = accounts.get_account_by_id(&id).await.unwrap().unwrap();
    assert_eq!(account.credits, 50);
    let tx = payments.get_transaction_by_session("cs_1").await.unwrap().unwrap();
    assert_eq!(tx.status, TransactionStatus::Paid);
}

#[tokio::test]
async fn concurrent_settlements_credit_once() {
    let (accounts, payments, _dir) = setup().await;
    let id = buyer(&accounts).await;
    payments.create_transaction(&pending(&id, "cs_race")).await.unwrap();

    let (a, b) = tokio::join!(payments.settle_paid("cs_race"), payments.settle_paid("cs_race"));
    let credited = [a.unwrap(), b.unwrap()]
        .iter()
        .filter(|s| matches!(s, Settlement::Credited { .. }))
        .count();
    assert_eq!(credited, 1);

    let account = accounts.get_account_by_id(&id).await.unwrap().unwrap();
    assert_eq!(account.credits, 50);
}

#[tokio::test]
async fn closed_transaction_is_never_credited() {
    let (accounts, payments, _dir) = setup().await;
    let id = buyer(&accounts).await;
    payments.create_transaction(&pending(&id, "cs_exp")).await.unwrap();

    assert!(payments.close_transaction("cs_exp", TransactionStatus::Expired).await.unwrap());
    assert!(!payments.close_transaction("cs_exp", TransactionStatus::Failed).await.unwrap());

    let outcome = payments.settle_paid("cs_exp").await.unwrap();
    assert_eq!(outcome, Settlement::Closed(TransactionStatus::Expired));
    let account = accounts.get_account_by_id(&id).await.unwrap().unwrap();
    assert_eq!(account.credits, 0);
}

#[tokio::test]
async fn unknown_session_is_not_found() {
    let (_accounts, payments, _dir) = setup().await;
    let err = payments.settle_paid("cs_missing").await.unwrap_err();
    assert!(matches!(err, PlagiError::NotFound(_)), "got {err:?}");
    assert!(payments.get_transaction_by_session("cs_missing").await.unwrap().is_none());
}

#[tokio::test]
async fn owner_payout_upsert_replaces_single_row() {
    let (_accounts, payments, _dir) = setup().await;
    assert!(payments.get_owner_payout().await.unwrap().is_none());

    let mut config = OwnerPayoutConfig {
        payout_email: "owner@test.com".to_string(),
        business_name: "PlagiFree".to_string(),
        stripe_account_id: None,
        currency: "usd".to_string(),
        updated_at: Utc::now(),
    };
    payments.upsert_owner_payout(&config).await.unwrap();

    config.stripe_account_id = Some("acct_123".to_string());
    config.currency = "eur".to_string();
    payments.upsert_owner_payout(&config).await.unwrap();

    let stored = payments.get_owner_payout().await.unwrap().unwrap();
    assert_eq!(stored.stripe_account_id.as_deref(), Some("acct_123"));
    assert_eq!(stored.currency, "eur");
}
