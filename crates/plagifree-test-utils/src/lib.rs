pub mod assertions;
pub mod fakes;
pub mod server;
pub mod stores;

pub use assertions::{assert_api_error, assert_api_ok};
pub use fakes::{RecordingMailer, STUB_SIGNATURE, SentMail, StubEngine, StubGateway};
pub use server::{
    STUB_REWRITE, TEST_JWT_SECRET, TEST_PASSWORD, TestApp, create_test_app, create_test_app_with,
    create_test_config, create_test_router_and_stores, register_via_api, send_raw_request,
    send_request,
};
pub use stores::{TestStores, create_test_stores};

#[cfg(test)]
mod tests {
    use super::*;
    use plagifree_core::AccountStore;

    #[tokio::test]
    async fn test_stores_are_usable() {
        let stores = create_test_stores().await;

        let missing = stores
            .account_store
            .get_account_by_email("nobody@test.com")
            .await
            .unwrap();
        assert!(missing.is_none());
    }
}
