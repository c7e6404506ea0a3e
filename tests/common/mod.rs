//! Shared fixtures for the integration suites.
#![allow(dead_code)] // not every suite uses every fixture

use std::path::Path;
use std::sync::Arc;

use chrono::Utc;
use wiremock::MockServer;

use sheets_mcp::config::{AuthMode, Config};
use sheets_mcp::mcp::McpServer;
use sheets_mcp::oauth::{AuthManager, OAuthConfig, TokenSet, TokenStore};
use sheets_mcp::sheets::SheetsClient;

pub const CLIENT_ID: &str = "test-client-id";
pub const CLIENT_SECRET: &str = "test-client-secret";

/// A config with operation defaults, pointing the token store into `dir`.
pub fn test_config(dir: &Path) -> Config {
    Config {
        client_id: CLIENT_ID.to_string(),
        client_secret: CLIENT_SECRET.to_string(),
        default_spreadsheet_id: Some("default-sheet".to_string()),
        default_range: Some("Sheet1".to_string()),
        token_path: dir.join("tokens.json"),
        oauth_port: 0,
        auth_mode: AuthMode::Loopback,
        http_port: 0,
        log_json: false,
    }
}

/// A config with no operation defaults.
pub fn config_without_defaults(dir: &Path) -> Config {
    Config {
        default_spreadsheet_id: None,
        default_range: None,
        ..test_config(dir)
    }
}

/// An auth manager whose token endpoint points at the mock server.
pub fn auth_manager(config: &Config, token_server: &MockServer) -> Arc<AuthManager> {
    AuthManager::new(
        OAuthConfig::new(CLIENT_ID, CLIENT_SECRET)
            .with_token_url(format!("{}/token", token_server.uri())),
        TokenStore::new(&config.token_path),
        config.auth_mode,
        config.oauth_port,
    )
}

/// An MCP dispatcher wired to the given auth manager and Sheets mock.
pub fn mcp_server(config: Config, auth: Arc<AuthManager>, sheets_server: &MockServer) -> McpServer {
    let sheets = SheetsClient::builder(auth)
        .with_base_url(sheets_server.uri())
        .build();
    McpServer::new(Arc::new(config), sheets)
}

/// A credential that will not need renewal for an hour.
pub fn fresh_token() -> TokenSet {
    TokenSet {
        access_token: "fresh-access-token".to_string(),
        refresh_token: Some("stored-refresh-token".to_string()),
        expiry: Some(Utc::now().timestamp() + 3600),
        extra: serde_json::Map::new(),
    }
}

/// A credential whose access token expired a minute ago.
pub fn expired_token() -> TokenSet {
    TokenSet {
        access_token: "expired-access-token".to_string(),
        refresh_token: Some("stored-refresh-token".to_string()),
        expiry: Some(Utc::now().timestamp() - 60),
        extra: serde_json::Map::new(),
    }
}

/// Persist `token` where the manager built from `config` will load it.
pub fn store_token(config: &Config, token: &TokenSet) {
    TokenStore::new(&config.token_path).save(token).unwrap();
}

/// The JSON body Google's token endpoint returns on a refresh exchange.
pub fn refresh_response_body() -> serde_json::Value {
    serde_json::json!({
        "access_token": "renewed-access-token",
        "expires_in": 3599,
        "scope": "https://www.googleapis.com/auth/spreadsheets",
        "token_type": "Bearer"
    })
}
