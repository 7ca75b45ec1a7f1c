use plagifree_test_utils::*;
use serde_json::json;

async fn rewrite(app: &TestApp, token: &str, text: &str) -> String {
    let (status, body) = send_request(
        &app.router,
        "POST",
        "/api/rewrite",
        Some(token),
        Some(json!({ "text": text, "mode": "standard", "tone": "academic" })),
    )
    .await;
    assert_api_ok(status, &body);
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn history_is_newest_first() {
    let app = create_test_app().await;
    let (_, token) = register_via_api(&app.router, "historian@test.com").await;

    let first = rewrite(&app, &token, "First text.").await;
    let second = rewrite(&app, &token, "Second text.").await;

    let (status, body) = send_request(&app.router, "GET", "/api/history", Some(&token), None).await;
    assert_api_ok(status, &body);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["id"], second.as_str());
    assert_eq!(items[1]["id"], first.as_str());
    assert_eq!(items[1]["original_text"], "First text.");
    assert_eq!(items[0]["rewritten_text"], STUB_REWRITE);
}

#[tokio::test]
async fn history_is_capped_at_fifty() {
    let app = create_test_app().await;
    let (id, token) = register_via_api(&app.router, "prolific@test.com").await;
    sqlx::query("UPDATE account SET credits = 60 WHERE id = ?")
        .bind(&id)
        .execute(&app.stores.pool)
        .await
        .unwrap();

    for i in 0..52 {
        rewrite(&app, &token, &format!("Text number {i}.")).await;
    }

    let (_, body) = send_request(&app.router, "GET", "/api/history", Some(&token), None).await;
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 50);
    assert_eq!(items[0]["original_text"], "Text number 51.");
}

#[tokio::test]
async fn history_item_is_private_to_its_owner() {
    let app = create_test_app().await;
    let (_, alice) = register_via_api(&app.router, "alice@test.com").await;
    let (_, bob) = register_via_api(&app.router, "bob@test.com").await;
    let id = rewrite(&app, &alice, "Alice wrote this.").await;

    let uri = format!("/api/history/{id}");
    let (status, body) = send_request(&app.router, "GET", &uri, Some(&alice), None).await;
    assert_api_ok(status, &body);
    assert_eq!(body["original_text"], "Alice wrote this.");

    let (status, body) = send_request(&app.router, "GET", &uri, Some(&bob), None).await;
    assert_api_error(status, &body, 404, "NotFound");

    let (_, bob_history) = send_request(&app.router, "GET", "/api/history", Some(&bob), None).await;
    assert!(bob_history.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn export_as_markdown_attachment() {
    let app = create_test_app().await;
    let (_, token) = register_via_api(&app.router, "exporter@test.com").await;
    let id = rewrite(&app, &token, "The cat sat on the mat. It was sunny.").await;

    let (status, headers, body) = send_raw_request(
        &app.router,
        "GET",
        &format!("/api/history/{id}/export?format=md"),
        Some(&token),
        None,
        &[],
    )
    .await;
    assert_eq!(status, 200);
    assert_eq!(
        headers["content-type"].to_str().unwrap(),
        "text/markdown; charset=utf-8"
    );
    assert_eq!(
        headers["content-disposition"].to_str().unwrap(),
        format!("attachment; filename=\"plagifree-rewrite-{id}.md\"")
    );
    let text = String::from_utf8(body).unwrap();
    assert!(text.starts_with("# PlagiFree AI Rewrite"));
    assert!(text.contains("The cat sat on the mat. It was sunny."));
    assert!(text.contains(STUB_REWRITE));
}

#[tokio::test]
async fn export_defaults_to_text_and_rejects_unknown_formats() {
    let app = create_test_app().await;
    let (_, token) = register_via_api(&app.router, "plain@test.com").await;
    let id = rewrite(&app, &token, "Plain words.").await;

    let (status, headers, _) = send_raw_request(
        &app.router,
        "GET",
        &format!("/api/history/{id}/export"),
        Some(&token),
        None,
        &[],
    )
    .await;
    assert_eq!(status, 200);
    assert!(headers["content-type"].to_str().unwrap().starts_with("text/plain"));

    let (status, body) = send_request(
        &app.router,
        "GET",
        &format!("/api/history/{id}/export?format=pdf"),
        Some(&token),
        None,
    )
    .await;
    assert_api_error(status, &body, 400, "InvalidRequest");
}
