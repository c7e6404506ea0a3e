//! HTTP transport end-to-end: a real listener, a real MCP client exchange.

mod common;

use serde_json::{Value, json};
use wiremock::matchers::{method, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sheets_mcp::mcp::http::build_app;

/// Bind the app on an ephemeral port and return its base URL.
async fn spawn_http(server: sheets_mcp::mcp::McpServer) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, build_app(server)).await.unwrap();
    });
    format!("http://{addr}")
}

async fn post_mcp(base: &str, body: Value) -> reqwest::Response {
    reqwest::Client::new()
        .post(format!("{base}/mcp"))
        .json(&body)
        .send()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_initialize_then_list_then_call() {
    let token_server = MockServer::start().await;
    let sheets_server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/v4/spreadsheets/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [["alpha", "beta"]]
        })))
        .mount(&sheets_server)
        .await;

    let dir = tempfile::tempdir().unwrap();
    let config = common::test_config(dir.path());
    common::store_token(&config, &common::fresh_token());
    let auth = common::auth_manager(&config, &token_server);
    let base = spawn_http(common::mcp_server(config, auth, &sheets_server)).await;

    // initialize
    let response: Value = post_mcp(
        &base,
        json!({
            "jsonrpc": "2.0", "id": 1, "method": "initialize",
            "params": {
                "protocolVersion": "2024-11-05",
                "capabilities": {},
                "clientInfo": { "name": "test-client", "version": "0.0.0" }
            }
        }),
    )
    .await
    .json()
    .await
    .unwrap();
    assert_eq!(response["result"]["protocolVersion"], "2024-11-05");

    // The stateless transport needs no session: the initialized
    // notification is simply acknowledged without a body.
    let response = post_mcp(
        &base,
        json!({ "jsonrpc": "2.0", "method": "notifications/initialized" }),
    )
    .await;
    assert_eq!(response.status(), reqwest::StatusCode::ACCEPTED);

    // tools/list
    let response: Value = post_mcp(
        &base,
        json!({ "jsonrpc": "2.0", "id": 2, "method": "tools/list" }),
    )
    .await
    .json()
    .await
    .unwrap();
    let tools = response["result"]["tools"].as_array().unwrap();
    assert_eq!(tools.len(), 2);

    // tools/call
    let response: Value = post_mcp(
        &base,
        json!({
            "jsonrpc": "2.0", "id": 3, "method": "tools/call",
            "params": { "name": "read_rows", "arguments": { "spreadsheetId": "s", "range": "A1:B1" } }
        }),
    )
    .await
    .json()
    .await
    .unwrap();
    let text = response["result"]["content"][0]["text"].as_str().unwrap();
    let output: Value = serde_json::from_str(text).unwrap();
    assert_eq!(output["rows"], json!([["alpha", "beta"]]));
}

#[tokio::test]
async fn test_unknown_paths_are_404() {
    let token_server = MockServer::start().await;
    let sheets_server = MockServer::start().await;

    let dir = tempfile::tempdir().unwrap();
    let config = common::test_config(dir.path());
    let auth = common::auth_manager(&config, &token_server);
    let base = spawn_http(common::mcp_server(config, auth, &sheets_server)).await;

    let response = reqwest::get(format!("{base}/")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);

    let response = reqwest::get(format!("{base}/mcp/extra")).await.unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_body_is_parse_error() {
    let token_server = MockServer::start().await;
    let sheets_server = MockServer::start().await;

    let dir = tempfile::tempdir().unwrap();
    let config = common::test_config(dir.path());
    let auth = common::auth_manager(&config, &token_server);
    let base = spawn_http(common::mcp_server(config, auth, &sheets_server)).await;

    let response: Value = reqwest::Client::new()
        .post(format!("{base}/mcp"))
        .body("{broken")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(response["error"]["code"], -32700);
}
