//! Google OAuth 2.0 authorization code flow.
//!
//! Consent URL construction and the two token-endpoint exchanges
//! (authorization code and refresh token), both as standard form-encoded
//! POSTs.
//!
//! # Key characteristics
//! - Client secret: required, even with PKCE
//! - Auth URL parameters: `access_type=offline` and `prompt=consent` so a
//!   refresh token is always issued
//!
//! # Endpoints
//! - Authorization: `https://accounts.google.com/o/oauth2/v2/auth`
//! - Token: `https://oauth2.googleapis.com/token`

use chrono::Utc;
use serde::Deserialize;
use tracing::{debug, warn};

use super::AuthError;
use super::pkce::Pkce;
use super::token::TokenSet;

/// Default authorization URL.
const DEFAULT_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Default token URL.
const DEFAULT_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Scope for spreadsheet read/write access.
const SPREADSHEETS_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets";

/// Fixed redirect target for the out-of-band flow.
pub const OOB_REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";

/// Configuration for the OAuth flow.
#[derive(Debug, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    pub auth_url: String,
    pub token_url: String,
    pub scope: String,
}

impl OAuthConfig {
    /// Create a config with the default Google endpoints and scope.
    pub fn new(client_id: impl Into<String>, client_secret: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.into(),
            auth_url: DEFAULT_AUTH_URL.into(),
            token_url: DEFAULT_TOKEN_URL.into(),
            scope: SPREADSHEETS_SCOPE.into(),
        }
    }

    /// Override the token endpoint (used by tests to point at a mock).
    #[must_use]
    pub fn with_token_url(mut self, token_url: impl Into<String>) -> Self {
        self.token_url = token_url.into();
        self
    }
}

/// Build the consent URL the user must visit.
///
/// `access_type=offline` and `prompt=consent` are both required: without
/// them Google may omit the refresh token and the stored credential would
/// be use-once.
pub fn build_authorize_url(
    config: &OAuthConfig,
    redirect_uri: &str,
    pkce: &Pkce,
    state: &str,
) -> String {
    format!(
        "{}?client_id={}&redirect_uri={}&response_type=code&scope={}&code_challenge={}&code_challenge_method={}&state={}&access_type=offline&prompt=consent",
        config.auth_url,
        urlencoding::encode(&config.client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&config.scope),
        urlencoding::encode(&pkce.challenge),
        pkce.method,
        urlencoding::encode(state),
    )
}

/// Token response from the token endpoint.
///
/// Fields beyond the three we interpret are captured and carried into the
/// [`TokenSet`] so nothing the server sends is dropped.
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    expires_in: Option<i64>,
    #[serde(flatten)]
    extra: serde_json::Map<String, serde_json::Value>,
}

impl TokenResponse {
    fn into_token_set(self) -> TokenSet {
        TokenSet {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expiry: self.expires_in.map(|secs| Utc::now().timestamp() + secs),
            extra: self.extra,
        }
    }
}

/// Error response from the token endpoint.
#[derive(Debug, Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Exchange an authorization code for the initial token pair.
///
/// A response without a refresh token is a fatal setup error: the consent
/// request asked for offline access, so its absence means the flow must be
/// re-run, not worked around.
pub async fn exchange_code(
    http_client: &reqwest::Client,
    config: &OAuthConfig,
    code: &str,
    verifier: &str,
    redirect_uri: &str,
) -> Result<TokenSet, AuthError> {
    debug!("Exchanging authorization code for tokens");

    let form_data = [
        ("code", code),
        ("code_verifier", verifier),
        ("grant_type", "authorization_code"),
        ("redirect_uri", redirect_uri),
        ("client_id", &config.client_id),
        ("client_secret", &config.client_secret),
    ];

    let response = http_client
        .post(&config.token_url)
        .form(&form_data)
        .send()
        .await?;

    let token = parse_token_response(response, "code exchange").await?;

    if !token.has_refresh_token() {
        return Err(AuthError::ExchangeFailed(
            "No refresh token in response - ensure access_type=offline and prompt=consent"
                .to_string(),
        ));
    }

    debug!("Code exchange successful");
    Ok(token)
}

/// Exchange a refresh token for a new access token.
///
/// Google typically omits the refresh token from this response; the caller
/// merges the result into the existing record, which keeps the old one.
pub async fn refresh_token(
    http_client: &reqwest::Client,
    config: &OAuthConfig,
    refresh_token_value: &str,
) -> Result<TokenSet, AuthError> {
    debug!("Refreshing access token");

    let form_data = [
        ("refresh_token", refresh_token_value),
        ("grant_type", "refresh_token"),
        ("client_id", config.client_id.as_str()),
        ("client_secret", config.client_secret.as_str()),
    ];

    let response = http_client
        .post(&config.token_url)
        .form(&form_data)
        .send()
        .await?;

    let token = parse_token_response(response, "token refresh").await?;
    debug!("Token refresh successful");
    Ok(token)
}

async fn parse_token_response(
    response: reqwest::Response,
    context: &str,
) -> Result<TokenSet, AuthError> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        if let Ok(error) = serde_json::from_str::<TokenErrorResponse>(&body) {
            warn!(
                error = %error.error,
                description = ?error.error_description,
                "Authorization server rejected {context}"
            );
            // An invalid_grant means the refresh token was revoked or
            // expired: the operator must re-authorize.
            if error.error == "invalid_grant" {
                return Err(AuthError::NotAuthorized(
                    error
                        .error_description
                        .unwrap_or_else(|| "refresh token rejected (invalid_grant)".to_string()),
                ));
            }
            return Err(AuthError::ExchangeFailed(
                error.error_description.unwrap_or(error.error),
            ));
        }
        return Err(AuthError::ExchangeFailed(format!(
            "HTTP {}: {}",
            status.as_u16(),
            body
        )));
    }

    let token_response: TokenResponse = serde_json::from_str(&body).map_err(|e| {
        AuthError::ExchangeFailed(format!("Failed to parse token response: {}", e))
    })?;

    Ok(token_response.into_token_set())
}
