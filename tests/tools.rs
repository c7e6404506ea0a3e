//! Tool operations against a mocked Sheets API.

mod common;

use serde_json::{Value, json};
use wiremock::matchers::{body_partial_json, method, path_regex, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use sheets_mcp::mcp::McpServer;

/// Run one tools/call and return the parsed response.
async fn call_tool(server: &McpServer, name: &str, arguments: Value) -> Value {
    let request = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": "tools/call",
        "params": { "name": name, "arguments": arguments }
    });
    let response = server
        .handle_message(&request.to_string())
        .await
        .expect("tools/call always gets a response");
    serde_json::to_value(&response).unwrap()
}

/// Extract the JSON payload from the MCP text content envelope.
fn tool_output(response: &Value) -> Value {
    let text = response["result"]["content"][0]["text"]
        .as_str()
        .unwrap_or_else(|| panic!("no text content in {response}"));
    serde_json::from_str(text).unwrap()
}

async fn setup(
    dir: &std::path::Path,
    with_defaults: bool,
) -> (MockServer, MockServer, McpServer) {
    let token_server = MockServer::start().await;
    let sheets_server = MockServer::start().await;

    let config = if with_defaults {
        common::test_config(dir)
    } else {
        common::config_without_defaults(dir)
    };
    common::store_token(&config, &common::fresh_token());

    let auth = common::auth_manager(&config, &token_server);
    let server = common::mcp_server(config, auth, &sheets_server);
    (token_server, sheets_server, server)
}

#[tokio::test]
async fn test_append_reports_updated_rows_and_range() {
    let dir = tempfile::tempdir().unwrap();
    let (_token_server, sheets_server, server) = setup(dir.path(), true).await;

    Mock::given(method("POST"))
        .and(path_regex(r"^/v4/spreadsheets/my-sheet/values/.+:append$"))
        .and(query_param("valueInputOption", "USER_ENTERED"))
        .and(body_partial_json(json!({ "values": [["a", "1", "true"]] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "spreadsheetId": "my-sheet",
            "updates": {
                "spreadsheetId": "my-sheet",
                "updatedRange": "Sheet1!A5:C5",
                "updatedRows": 1,
                "updatedColumns": 3,
                "updatedCells": 3
            }
        })))
        .expect(1)
        .mount(&sheets_server)
        .await;

    let response = call_tool(
        &server,
        "append_rows",
        json!({
            "spreadsheetId": "my-sheet",
            "range": "Sheet1",
            "rows": [["a", "1", "true"]]
        }),
    )
    .await;

    let output = tool_output(&response);
    assert_eq!(output, json!({ "updatedRows": 1, "updatedRange": "Sheet1!A5:C5" }));
}

#[tokio::test]
async fn test_append_defaults_missing_update_counts() {
    let dir = tempfile::tempdir().unwrap();
    let (_token_server, sheets_server, server) = setup(dir.path(), true).await;

    // Some responses omit the updates block entirely.
    Mock::given(method("POST"))
        .and(path_regex(r":append$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "spreadsheetId": "my-sheet"
        })))
        .mount(&sheets_server)
        .await;

    let response = call_tool(
        &server,
        "append_rows",
        json!({ "spreadsheetId": "my-sheet", "range": "Sheet1", "rows": [["x"]] }),
    )
    .await;

    let output = tool_output(&response);
    assert_eq!(output, json!({ "updatedRows": 0, "updatedRange": "" }));
}

#[tokio::test]
async fn test_read_returns_row_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let (_token_server, sheets_server, server) = setup(dir.path(), true).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/v4/spreadsheets/my-sheet/values/.+$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Sheet1!A1:B2",
            "majorDimension": "ROWS",
            "values": [["name", "count"], ["widgets", 3]]
        })))
        .mount(&sheets_server)
        .await;

    let response = call_tool(
        &server,
        "read_rows",
        json!({ "spreadsheetId": "my-sheet", "range": "Sheet1!A1:B2" }),
    )
    .await;

    let output = tool_output(&response);
    assert_eq!(
        output,
        json!({ "rows": [["name", "count"], ["widgets", 3]] })
    );
}

#[tokio::test]
async fn test_append_rejects_non_string_cells() {
    let dir = tempfile::tempdir().unwrap();
    let (_token_server, sheets_server, server) = setup(dir.path(), true).await;

    // Nothing may hit the API.
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&sheets_server)
        .await;

    let response = call_tool(
        &server,
        "append_rows",
        json!({ "spreadsheetId": "my-sheet", "range": "Sheet1", "rows": [["a", 1, true]] }),
    )
    .await;

    assert_eq!(response["error"]["code"], -32602);
}

#[tokio::test]
async fn test_read_empty_range_returns_empty_matrix() {
    let dir = tempfile::tempdir().unwrap();
    let (_token_server, sheets_server, server) = setup(dir.path(), true).await;

    // Google omits `values` entirely for an empty range.
    Mock::given(method("GET"))
        .and(path_regex(r"^/v4/spreadsheets/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "range": "Sheet1!Z100:Z200",
            "majorDimension": "ROWS"
        })))
        .mount(&sheets_server)
        .await;

    let response = call_tool(
        &server,
        "read_rows",
        json!({ "spreadsheetId": "my-sheet", "range": "Sheet1!Z100:Z200" }),
    )
    .await;

    let output = tool_output(&response);
    assert_eq!(output, json!({ "rows": [] }));
}

#[tokio::test]
async fn test_call_falls_back_to_configured_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let (_token_server, sheets_server, server) = setup(dir.path(), true).await;

    // test_config defaults: spreadsheet "default-sheet", range "Sheet1".
    Mock::given(method("GET"))
        .and(path_regex(r"^/v4/spreadsheets/default-sheet/values/Sheet1$"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "values": [["hello"]]
        })))
        .expect(1)
        .mount(&sheets_server)
        .await;

    let response = call_tool(&server, "read_rows", json!({})).await;
    let output = tool_output(&response);
    assert_eq!(output, json!({ "rows": [["hello"]] }));
}

#[tokio::test]
async fn test_missing_target_with_no_defaults_is_input_error() {
    let dir = tempfile::tempdir().unwrap();
    let (_token_server, sheets_server, server) = setup(dir.path(), false).await;

    // Nothing may hit the API.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&sheets_server)
        .await;

    let response = call_tool(&server, "read_rows", json!({})).await;
    assert_eq!(response["error"]["code"], -32602);
    assert!(
        response["error"]["message"]
            .as_str()
            .unwrap()
            .contains("spreadsheetId")
    );
}

#[tokio::test]
async fn test_upstream_failure_carries_google_message() {
    let dir = tempfile::tempdir().unwrap();
    let (_token_server, sheets_server, server) = setup(dir.path(), true).await;

    Mock::given(method("GET"))
        .and(path_regex(r"^/v4/spreadsheets/"))
        .respond_with(ResponseTemplate::new(403).set_body_json(json!({
            "error": {
                "code": 403,
                "message": "The caller does not have permission",
                "status": "PERMISSION_DENIED"
            }
        })))
        .mount(&sheets_server)
        .await;

    let response = call_tool(
        &server,
        "read_rows",
        json!({ "spreadsheetId": "forbidden", "range": "Sheet1" }),
    )
    .await;

    assert_eq!(response["error"]["code"], -32603);
    assert!(
        response["error"]["message"]
            .as_str()
            .unwrap()
            .contains("The caller does not have permission")
    );
}

#[tokio::test]
async fn test_auth_failure_passes_through_unrewrapped() {
    let dir = tempfile::tempdir().unwrap();
    let token_server = MockServer::start().await;
    let sheets_server = MockServer::start().await;

    // Stored credential has no refresh token: classified as an
    // authorization problem, not an upstream one.
    let config = common::test_config(dir.path());
    let mut token = common::fresh_token();
    token.refresh_token = None;
    common::store_token(&config, &token);

    let auth = common::auth_manager(&config, &token_server);
    let server = common::mcp_server(config, auth, &sheets_server);

    let response = call_tool(
        &server,
        "read_rows",
        json!({ "spreadsheetId": "my-sheet", "range": "Sheet1" }),
    )
    .await;

    assert_eq!(response["error"]["code"], -32600);
    assert!(
        response["error"]["message"]
            .as_str()
            .unwrap()
            .contains("refresh token")
    );
}
