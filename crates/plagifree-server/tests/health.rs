use plagifree_test_utils::*;

#[tokio::test]
async fn health_reports_version() {
    let (router, _stores) = create_test_router_and_stores().await;

    let (status, body) = send_request(&router, "GET", "/api/health", None, None).await;
    assert_api_ok(status, &body);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn root_identifies_the_api() {
    let (router, _stores) = create_test_router_and_stores().await;

    for uri in ["/api", "/api/"] {
        let (status, body) = send_request(&router, "GET", uri, None, None).await;
        assert_api_ok(status, &body);
        assert_eq!(body["message"], "PlagiFree AI API");
    }
}

#[tokio::test]
async fn unknown_route_is_404() {
    let (router, _stores) = create_test_router_and_stores().await;

    let (status, _) = send_request(&router, "GET", "/api/nope", None, None).await;
    assert_eq!(status, 404);
}
