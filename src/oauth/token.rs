//! The persisted credential record.
//!
//! [`TokenSet`] is the single credential entity of the process: an access
//! token, the long-lived refresh token, an absolute expiry, and whatever
//! extra fields the authorization server returned. Extra fields survive
//! save/load round trips verbatim and are merged, never dropped, when a
//! refresh response carries new ones.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Safety margin for expiry checks (60 seconds).
///
/// A token within this margin of its expiry is refreshed before use so a
/// call never goes out with a token that dies in flight.
pub const EXPIRY_SAFETY_MARGIN_SECS: i64 = 60;

/// OAuth credential record, exactly one live per process.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TokenSet {
    /// Short-lived bearer token for API requests.
    pub access_token: String,

    /// Long-lived refresh token. Required whenever the record authorizes
    /// a call; its absence invalidates the record entirely.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,

    /// Unix timestamp (seconds) when the access token expires.
    /// `None` means "treat as already expired".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<i64>,

    /// Any additional fields the authorization server returned
    /// (scope, token_type, id_token, ...), preserved verbatim.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl TokenSet {
    /// Create a record from an access/refresh pair and a relative lifetime.
    pub fn new(
        access_token: impl Into<String>,
        refresh_token: Option<String>,
        expires_in: Option<i64>,
    ) -> Self {
        let expiry = expires_in.map(|secs| Utc::now().timestamp() + secs);
        Self {
            access_token: access_token.into(),
            refresh_token,
            expiry,
            extra: serde_json::Map::new(),
        }
    }

    /// Whether the record carries a usable refresh token.
    #[must_use]
    pub fn has_refresh_token(&self) -> bool {
        self.refresh_token
            .as_deref()
            .is_some_and(|rt| !rt.trim().is_empty())
    }

    /// Whether the access token must be renewed before use.
    ///
    /// Returns `true` if no expiry is recorded, or if the remaining
    /// lifetime is below [`EXPIRY_SAFETY_MARGIN_SECS`].
    #[must_use]
    pub fn needs_refresh(&self) -> bool {
        match self.expiry {
            Some(exp) => exp - Utc::now().timestamp() < EXPIRY_SAFETY_MARGIN_SECS,
            None => true,
        }
    }

    /// Merge a renewal response into this record.
    ///
    /// Replaces `access_token` and `expiry`, adopts a rotated refresh
    /// token when the response carries one (renewal responses frequently
    /// omit it, in which case the existing one is kept), and merges any
    /// extra fields over the existing ones.
    pub fn merge_refresh(&mut self, renewed: TokenSet) {
        if renewed.has_refresh_token() {
            self.refresh_token = renewed.refresh_token;
        }
        self.access_token = renewed.access_token;
        self.expiry = renewed.expiry;
        for (key, value) in renewed.extra {
            self.extra.insert(key, value);
        }
    }
}
