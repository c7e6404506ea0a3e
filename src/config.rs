//! Environment-driven configuration.
//!
//! Every setting comes from the process environment (a local `.env` file is
//! honored via `dotenvy` before this module reads anything). The client id
//! and secret are required; everything else has a default or is optional.

use std::path::PathBuf;
use std::str::FromStr;

use crate::error::AppError;

/// Default port for the one-shot OAuth callback listener.
const DEFAULT_OAUTH_PORT: u16 = 5173;

/// Default port for the HTTP MCP transport.
const DEFAULT_HTTP_PORT: u16 = 3000;

/// Default path of the persisted credential file.
const DEFAULT_TOKEN_PATH: &str = "tokens.json";

/// How the authorization bootstrap obtains the consent code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthMode {
    /// Short-lived local listener receives the browser redirect.
    #[default]
    Loopback,
    /// The user pastes the code into the console (out-of-band).
    Oob,
}

impl FromStr for AuthMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "loopback" => Ok(Self::Loopback),
            "oob" | "out-of-band" => Ok(Self::Oob),
            other => Err(format!("Unknown auth mode: {other} (expected 'loopback' or 'oob')")),
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// OAuth client id (required).
    pub client_id: String,
    /// OAuth client secret (required).
    pub client_secret: String,
    /// Default spreadsheet for calls that omit `spreadsheetId`.
    pub default_spreadsheet_id: Option<String>,
    /// Default A1 range for calls that omit `range`.
    pub default_range: Option<String>,
    /// Path of the persisted credential file.
    pub token_path: PathBuf,
    /// Port for the loopback callback listener (0 = ephemeral).
    pub oauth_port: u16,
    /// How the initial authorization code is obtained.
    pub auth_mode: AuthMode,
    /// Port for the HTTP MCP transport.
    pub http_port: u16,
    /// Emit JSON-formatted logs.
    pub log_json: bool,
}

impl Config {
    /// Build the configuration from the process environment.
    ///
    /// Fails with a configuration error naming the first missing required
    /// variable; optional settings fall back to their defaults.
    pub fn from_env() -> Result<Self, AppError> {
        let client_id = require_env("GSHEETS_CLIENT_ID")?;
        let client_secret = require_env("GSHEETS_CLIENT_SECRET")?;

        let auth_mode = match std::env::var("GSHEETS_AUTH_MODE") {
            Ok(val) => val
                .parse()
                .map_err(AppError::Config)?,
            Err(_) => AuthMode::default(),
        };

        Ok(Self {
            client_id,
            client_secret,
            default_spreadsheet_id: optional_env("GSHEETS_SPREADSHEET_ID"),
            default_range: optional_env("GSHEETS_RANGE"),
            token_path: optional_env("GSHEETS_TOKEN_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TOKEN_PATH)),
            oauth_port: parse_env("GSHEETS_OAUTH_PORT", DEFAULT_OAUTH_PORT)?,
            auth_mode,
            http_port: parse_env("PORT", DEFAULT_HTTP_PORT)?,
            log_json: optional_env("GSHEETS_LOG_JSON")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(false),
        })
    }

    /// The HTTP transport listen address.
    pub fn listen_addr(&self) -> String {
        format!("0.0.0.0:{}", self.http_port)
    }
}

#[cfg(test)]
impl Default for Config {
    fn default() -> Self {
        Self {
            client_id: "test-client".into(),
            client_secret: "test-secret".into(),
            default_spreadsheet_id: None,
            default_range: None,
            token_path: PathBuf::from(DEFAULT_TOKEN_PATH),
            oauth_port: DEFAULT_OAUTH_PORT,
            auth_mode: AuthMode::Loopback,
            http_port: DEFAULT_HTTP_PORT,
            log_json: false,
        }
    }
}

fn require_env(name: &str) -> Result<String, AppError> {
    match std::env::var(name) {
        Ok(val) if !val.trim().is_empty() => Ok(val),
        _ => Err(AppError::Config(format!(
            "Missing required environment variable: {name}"
        ))),
    }
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn parse_env<T: FromStr>(name: &str, default: T) -> Result<T, AppError> {
    match std::env::var(name) {
        Ok(val) => val
            .parse()
            .map_err(|_| AppError::Config(format!("Invalid value for {name}: {val}"))),
        Err(_) => Ok(default),
    }
}
