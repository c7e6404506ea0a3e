//! Google Sheets API client.
//!
//! Thin wrapper over the `spreadsheets.values` endpoints. Authorization is
//! delegated to [`AuthManager`]: every call obtains a bearer token through
//! the lifecycle accessor, so renewal and bootstrap happen transparently.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, instrument};

use crate::error::AppError;
use crate::oauth::AuthManager;

const DEFAULT_BASE_URL: &str = "https://sheets.googleapis.com";

/// Client for the Sheets `values.append` / `values.get` endpoints.
#[derive(Clone)]
pub struct SheetsClient {
    auth: Arc<AuthManager>,
    http: reqwest::Client,
    base_url: String,
}

/// Builder for [`SheetsClient`].
pub struct SheetsClientBuilder {
    auth: Arc<AuthManager>,
    base_url: String,
}

impl SheetsClientBuilder {
    /// Override the API base URL. Used by tests to point at a mock server.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn build(self) -> SheetsClient {
        SheetsClient {
            auth: self.auth,
            http: reqwest::Client::new(),
            base_url: self.base_url.trim_end_matches('/').to_string(),
        }
    }
}

/// Result of an append call, as reported by the API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppendResult {
    pub updated_rows: u64,
    pub updated_range: String,
}

#[derive(Deserialize)]
struct AppendResponse {
    #[serde(default)]
    updates: Option<AppendUpdates>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    #[serde(default)]
    updated_rows: Option<u64>,
    #[serde(default)]
    updated_range: Option<String>,
}

#[derive(Deserialize)]
struct ValuesResponse {
    #[serde(default)]
    values: Option<Vec<Vec<Value>>>,
}

/// Error envelope Google returns on non-2xx responses.
#[derive(Deserialize)]
struct ApiErrorEnvelope {
    error: Option<ApiErrorBody>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl SheetsClient {
    pub fn builder(auth: Arc<AuthManager>) -> SheetsClientBuilder {
        SheetsClientBuilder {
            auth,
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    pub fn new(auth: Arc<AuthManager>) -> Self {
        Self::builder(auth).build()
    }

    /// Append rows after the last row of the given range.
    ///
    /// Values pass through as `USER_ENTERED`, so the API parses them the
    /// way a user typing into the sheet would be parsed.
    #[instrument(skip(self, rows), fields(range = %range, rows = rows.len()))]
    pub async fn append_rows(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: &[Vec<String>],
    ) -> Result<AppendResult, AppError> {
        let token = self.auth.access_token().await?;
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}:append",
            self.base_url,
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(range),
        );

        let response = self
            .http
            .post(&url)
            .bearer_auth(&token)
            .query(&[("valueInputOption", "USER_ENTERED")])
            .json(&serde_json::json!({ "values": rows }))
            .send()
            .await?;

        let response = Self::check_status(response).await?;
        let body: AppendResponse = response.json().await?;
        let updates = body.updates.unwrap_or(AppendUpdates {
            updated_rows: None,
            updated_range: None,
        });

        let result = AppendResult {
            updated_rows: updates.updated_rows.unwrap_or(0),
            updated_range: updates.updated_range.unwrap_or_default(),
        };
        debug!(
            updated_rows = result.updated_rows,
            updated_range = %result.updated_range,
            "Append completed"
        );
        Ok(result)
    }

    /// Read the cell matrix of the given range.
    ///
    /// Returns rows exactly as the API does: trailing empty cells are not
    /// padded, and an empty range yields an empty matrix.
    #[instrument(skip(self), fields(range = %range))]
    pub async fn read_rows(
        &self,
        spreadsheet_id: &str,
        range: &str,
    ) -> Result<Vec<Vec<Value>>, AppError> {
        let token = self.auth.access_token().await?;
        let url = format!(
            "{}/v4/spreadsheets/{}/values/{}",
            self.base_url,
            urlencoding::encode(spreadsheet_id),
            urlencoding::encode(range),
        );

        let response = self.http.get(&url).bearer_auth(&token).send().await?;
        let response = Self::check_status(response).await?;
        let body: ValuesResponse = response.json().await?;

        let values = body.values.unwrap_or_default();
        debug!(rows = values.len(), "Read completed");
        Ok(values)
    }

    /// Map a non-2xx response to an upstream error carrying Google's
    /// message when the body has one.
    async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, AppError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = serde_json::from_str::<ApiErrorEnvelope>(&text)
            .ok()
            .and_then(|envelope| envelope.error)
            .and_then(|body| body.message)
            .unwrap_or(text);

        Err(AppError::Upstream(format!("{status}: {message}")))
    }
}
