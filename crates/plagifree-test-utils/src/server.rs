use std::sync::Arc;

use axum::Router;
use axum::body::Body;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use plagifree_core::config::{
    CreditPackage, DatabaseConfig, JwtConfig, LedgerConfig, PaymentsConfig, PlagiConfig,
    RewriterConfig,
};
use plagifree_engine::InstructionTable;
use plagifree_server::{AppState, Collaborators, build_router};
use plagifree_storage_sqlite::{SqliteAccountStore, SqliteHistoryStore, SqlitePaymentStore};

use crate::fakes::{RecordingMailer, StubEngine, StubGateway};
use crate::stores::{TestStores, create_test_stores};

pub const TEST_JWT_SECRET: &str = "test-jwt-secret-at-least-32-chars-long";
pub const TEST_PASSWORD: &str = "hunter2-test-password";
/// Reply of the stub rewriting engine unless a test changes it.
pub const STUB_REWRITE: &str = "The cat rested on the rug. It was sunny.";

pub fn create_test_config() -> PlagiConfig {
    PlagiConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        public_url: "https://app.test".to_string(),
        cors_origins: vec!["*".to_string()],
        jwt: JwtConfig {
            secret: TEST_JWT_SECRET.to_string(),
            expiration_hours: 1,
        },
        database: DatabaseConfig {
            url: String::new(), // not used; stores are pre-connected
        },
        ledger: LedgerConfig {
            daily_limit: 3,
            utc_offset_minutes: 0,
        },
        rewriter: RewriterConfig {
            api_base: "http://rewriter.invalid/v1".to_string(),
            api_key: "sk-test".to_string(),
            model: "test-model".to_string(),
            timeout_secs: 5,
            instructions_path: None,
        },
        payments: Some(PaymentsConfig {
            secret_key: "sk_test".to_string(),
            webhook_secret: "whsec_test".to_string(),
            api_base: "http://payments.invalid".to_string(),
            currency: "usd".to_string(),
            success_url: None,
            cancel_url: None,
            packages: vec![
                CreditPackage {
                    id: "starter".to_string(),
                    name: "Starter".to_string(),
                    credits: 10,
                    amount_cents: 499,
                },
                CreditPackage {
                    id: "pro".to_string(),
                    name: "Pro".to_string(),
                    credits: 150,
                    amount_cents: 4999,
                },
            ],
        }),
        smtp: None,
    }
}

/// A router wired to SQLite stores in a tempdir and in-memory collaborators.
pub struct TestApp {
    pub router: Router,
    pub stores: TestStores,
    pub engine: Arc<StubEngine>,
    pub gateway: Arc<StubGateway>,
    pub mailer: Arc<RecordingMailer>,
}

pub async fn create_test_app() -> TestApp {
    create_test_app_with(create_test_config()).await
}

pub async fn create_test_app_with(config: PlagiConfig) -> TestApp {
    let stores = create_test_stores().await;
    let engine = Arc::new(StubEngine::new(STUB_REWRITE));
    let gateway = Arc::new(StubGateway::new());
    let mailer = Arc::new(RecordingMailer::new());

    let collaborators = Collaborators {
        engine: engine.clone(),
        gateway: Some(gateway.clone()),
        mailer: mailer.clone(),
        instructions: InstructionTable::builtin().expect("built-in instructions"),
    };
    let state: AppState<SqliteAccountStore, SqliteHistoryStore, SqlitePaymentStore> =
        AppState::new(
            config,
            stores.account_store.clone(),
            stores.history_store.clone(),
            stores.payment_store.clone(),
            collaborators,
        )
        .expect("failed to build app state");

    TestApp {
        router: build_router(state),
        stores,
        engine,
        gateway,
        mailer,
    }
}

pub async fn create_test_router_and_stores() -> (Router, TestStores) {
    let app = create_test_app().await;
    (app.router, app.stores)
}

/// Register an account via the API and return (account_id, token).
pub async fn register_via_api(router: &Router, email: &str) -> (String, String) {
    let body = serde_json::json!({
        "email": email,
        "password": TEST_PASSWORD,
    });
    let (status, json) = send_request(router, "POST", "/api/auth/register", None, Some(body)).await;
    assert_eq!(status, 200, "register failed: {json}");

    let id = json["user"]["id"].as_str().unwrap().to_string();
    let token = json["token"].as_str().unwrap().to_string();
    (id, token)
}

/// Send a request through the router and return (status, body_json).
pub async fn send_request(
    router: &Router,
    method: &str,
    uri: &str,
    auth_token: Option<&str>,
    body: Option<Value>,
) -> (u16, Value) {
    let (status, _, bytes) = send_raw_request(
        router,
        method,
        uri,
        auth_token,
        body.map(|b| serde_json::to_vec(&b).unwrap()),
        &[("content-type", "application/json")],
    )
    .await;

    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::String(
            String::from_utf8_lossy(&bytes).to_string(),
        ))
    };

    (status, json)
}

/// Send a request with a raw body and extra headers; return (status, headers, body bytes).
pub async fn send_raw_request(
    router: &Router,
    method: &str,
    uri: &str,
    auth_token: Option<&str>,
    body: Option<Vec<u8>>,
    headers: &[(&str, &str)],
) -> (u16, axum::http::HeaderMap, Vec<u8>) {
    let mut builder = axum::http::Request::builder().method(method).uri(uri);

    if let Some(token) = auth_token {
        builder = builder.header("authorization", format!("Bearer {token}"));
    }

    let req_body = match body {
        Some(b) => {
            for (name, value) in headers {
                builder = builder.header(*name, *value);
            }
            Body::from(b)
        }
        None => Body::empty(),
    };

    let req = builder.body(req_body).unwrap();
    let resp = router.clone().oneshot(req).await.unwrap();
    let status = resp.status().as_u16();
    let headers = resp.headers().clone();
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();

    (status, headers, bytes.to_vec())
}
