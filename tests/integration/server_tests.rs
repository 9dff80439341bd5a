use std::sync::Arc;
use std::time::Duration;

use reqwest::StatusCode;
use serde_json::{json, Value};

use copydesk::agent::model::EDIT_TOOL_NAME;
use copydesk::document::DOCUMENT_PATH;
use copydesk::persistence::brand_repo::SqliteBrandRepo;
use copydesk::persistence::db;
use copydesk::persistence::progress_store::SqliteProgressStore;
use copydesk::server::{serve, AppState};
use copydesk::GlobalConfig;
use tokio_util::sync::CancellationToken;

use super::test_helpers::{tool_call_response, text_response, CannedFetcher, ScriptedModel};

/// Spin up the API on an ephemeral port and return its base URL plus
/// the token that shuts the server down.
async fn spawn_api(model: ScriptedModel) -> (String, CancellationToken) {
    // Reserve a free port, then release it for the server to take.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("reserve port");
    let port = listener.local_addr().expect("local addr").port();
    drop(listener);

    let config = GlobalConfig::from_toml_str(&format!("http_port = {port}"))
        .expect("test config");
    let pool = Arc::new(db::connect_memory().await.expect("in-memory db"));
    let state = Arc::new(AppState {
        config: Arc::new(config),
        model: Arc::new(model),
        fetcher: Arc::new(CannedFetcher("Acme makes anvils.".to_owned())),
        brand_repo: Arc::new(SqliteBrandRepo::new(Arc::clone(&pool))),
        progress: Arc::new(SqliteProgressStore::new(pool)),
    });

    let ct = CancellationToken::new();
    tokio::spawn(serve(state, ct.clone()));

    let base = format!("http://127.0.0.1:{port}");
    let client = reqwest::Client::new();
    for _ in 0..50 {
        if client.get(format!("{base}/health")).send().await.is_ok() {
            return (base, ct);
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("server did not come up on {base}");
}

#[tokio::test]
async fn health_returns_ok() {
    let (base, _ct) = spawn_api(ScriptedModel::new(Vec::new())).await;

    let response = reqwest::get(format!("{base}/health")).await.expect("request");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await.expect("body"), "ok");
}

#[tokio::test]
async fn edit_endpoint_returns_the_edited_markdown() {
    let model = ScriptedModel::new(vec![
        tool_call_response(vec![(
            EDIT_TOOL_NAME,
            json!({
                "command": "str_replace",
                "path": DOCUMENT_PATH,
                "old_str": "draft",
                "new_str": "final"
            }),
        )]),
        text_response("Done."),
    ]);
    let (base, _ct) = spawn_api(model).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/organizations/org_1/content/edit"))
        .json(&json!({
            "instruction": "finalize the heading",
            "current_markdown": "# draft"
        }))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["markdown"], "# final");
}

#[tokio::test]
async fn edit_endpoint_rejects_an_empty_instruction() {
    let (base, _ct) = spawn_api(ScriptedModel::new(Vec::new())).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/organizations/org_1/content/edit"))
        .json(&json!({ "instruction": "  ", "current_markdown": "# doc" }))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["error"], "Validation failed");
}

#[tokio::test]
async fn analyze_endpoint_rejects_a_bad_url() {
    let (base, _ct) = spawn_api(ScriptedModel::new(Vec::new())).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/organizations/org_1/brand/analyze"))
        .json(&json!({ "url": "not a url" }))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn analyze_endpoint_starts_the_workflow_and_progress_becomes_pollable() {
    let model = ScriptedModel::new(vec![text_response(
        r#"{
            "companyName": "Acme",
            "companyDescription": "Acme makes anvils for discerning coyotes.",
            "toneProfile": "Casual",
            "audience": "Cartoon predators."
        }"#,
    )]);
    let (base, _ct) = spawn_api(model).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{base}/api/organizations/org_1/brand/analyze"))
        .json(&json!({ "url": "https://acme.example" }))
        .send()
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::ACCEPTED);

    // The workflow runs detached from the request; poll until it lands.
    let progress_url = format!("{base}/api/organizations/org_1/brand/progress");
    for _ in 0..50 {
        let response = client.get(&progress_url).send().await.expect("poll");
        if response.status() == StatusCode::OK {
            let body: Value = response.json().await.expect("json body");
            if body["status"] == "completed" {
                assert_eq!(body["currentStep"], 3);
                assert_eq!(body["totalSteps"], 3);
                assert!(body.get("error").is_none());
                return;
            }
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    panic!("brand analysis never completed");
}

#[tokio::test]
async fn progress_endpoint_returns_not_found_without_a_run() {
    let (base, _ct) = spawn_api(ScriptedModel::new(Vec::new())).await;

    let response = reqwest::get(format!("{base}/api/organizations/org_9/brand/progress"))
        .await
        .expect("request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn preview_endpoint_streams_and_returns_text() {
    let model = ScriptedModel::new(Vec::new()).with_stream_text("Hello from the preview.");
    let (base, _ct) = spawn_api(model).await;

    let response = reqwest::Client::new()
        .post(format!("{base}/api/debug/preview"))
        .json(&json!({ "prompt": "say hello" }))
        .send()
        .await
        .expect("request");

    assert_eq!(response.status(), StatusCode::OK);
    let body: Value = response.json().await.expect("json body");
    assert_eq!(body["text"], "Hello from the preview.");
}
