//! OAuth2 authorization-code flow against Google, with persisted
//! credentials and silent renewal.
//!
//! The module splits along the lifecycle's seams:
//!
//! - [`token`]: the credential record and its expiry/merge rules
//! - [`store`]: atomic JSON persistence of the record
//! - [`pkce`]: code verifier/challenge generation
//! - [`flow`]: consent URL building and the token endpoint exchanges
//! - [`callback`]: the one-shot loopback listener and OOB prompt
//! - [`manager`]: the accessor that ties the cycle together

pub mod callback;
pub mod flow;
pub mod manager;
pub mod pkce;
pub mod store;
pub mod token;

pub use flow::OAuthConfig;
pub use manager::AuthManager;
pub use store::TokenStore;
pub use token::TokenSet;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum AuthError {
    /// The stored grant is no longer usable; the user must re-authorize.
    #[error("Not authorized: {0}. Run the auth flow to re-authorize.")]
    NotAuthorized(String),

    #[error(
        "Stored credential has no refresh token. Delete the token file and \
         re-run the auth flow with access_type=offline and prompt=consent."
    )]
    MissingRefreshToken,

    #[error("Token exchange failed: {0}")]
    ExchangeFailed(String),

    #[error("Authorization was not granted: {0}")]
    ConsentDenied(String),

    #[error("OAuth callback state mismatch, possible CSRF or stale consent page")]
    InvalidState,

    #[error("Token storage error: {0}")]
    Storage(String),

    #[error("OAuth callback listener error: {0}")]
    Listener(String),

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl AuthError {
    /// Whether recovery requires a new interactive consent rather than a
    /// retry.
    pub fn needs_reauthorization(&self) -> bool {
        matches!(
            self,
            AuthError::NotAuthorized(_) | AuthError::MissingRefreshToken
        )
    }
}
