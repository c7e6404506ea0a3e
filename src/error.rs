//! Unified application error type and its JSON-RPC mapping.
//!
//! The error taxonomy follows the propagation policy of the crate: inner
//! modules return their own typed errors (`AuthError` for the credential
//! lifecycle), everything converges into [`AppError`], and only the MCP
//! transport turns an `AppError` into a protocol error envelope.

use crate::oauth::AuthError;

/// JSON-RPC 2.0 error codes used by the MCP transport.
pub mod jsonrpc {
    /// Malformed JSON on the wire.
    pub const PARSE_ERROR: i64 = -32700;
    /// Invalid request, including configuration and authorization failures.
    pub const INVALID_REQUEST: i64 = -32600;
    /// Unknown method.
    pub const METHOD_NOT_FOUND: i64 = -32601;
    /// A call omitted a required argument with no configured default.
    pub const INVALID_PARAMS: i64 = -32602;
    /// Upstream or internal failure.
    pub const INTERNAL_ERROR: i64 = -32603;
}

/// Unified application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    /// Missing or invalid configuration; fatal, never retried.
    #[error("Configuration error: {0}")]
    Config(String),

    /// A call omitted a required identifier/range with no configured
    /// default. Surfaced before any network call is attempted.
    #[error("Invalid input: {0}")]
    Input(String),

    /// Credential lifecycle failure (consent, exchange, refresh).
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// The Sheets API rejected a call; carries the upstream message.
    #[error("Sheets API error: {0}")]
    Upstream(String),

    /// Anything else.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// The JSON-RPC error code for this error.
    ///
    /// Configuration and authorization failures map to `InvalidRequest` so
    /// an operator can distinguish "re-authorize" from a transient upstream
    /// failure, which reports as `InternalError` with the upstream message.
    /// A credential-file fault is a disk problem, not an authorization one,
    /// so it reports as internal too.
    pub fn jsonrpc_code(&self) -> i64 {
        match self {
            Self::Auth(AuthError::Storage(_)) => jsonrpc::INTERNAL_ERROR,
            Self::Config(_) | Self::Auth(_) => jsonrpc::INVALID_REQUEST,
            Self::Input(_) => jsonrpc::INVALID_PARAMS,
            Self::Upstream(_) | Self::Internal(_) => jsonrpc::INTERNAL_ERROR,
        }
    }
}

impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        tracing::error!(error = %err, "HTTP client error");
        Self::Upstream(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        Self::Internal(format!("JSON error: {err}"))
    }
}
