//! Credential lifecycle manager.
//!
//! [`AuthManager`] owns the process's single in-memory credential and the
//! full load → bootstrap-if-absent → validate → maybe-refresh → return
//! cycle behind one idempotent accessor. Persistence is an explicit step
//! of the renewal path (the record is saved before the accessor returns),
//! not a side-channel listener.
//!
//! # Concurrency
//!
//! The credential slot sits behind one async mutex that is held across a
//! renewal exchange. The first caller that finds a stale token performs
//! the exchange; callers arriving while it is in flight queue on the lock
//! and, once inside, see a fresh token and skip their own exchange. That
//! gives exactly one renewal per expiry, with the outcome shared by every
//! concurrent caller. Callers with an already-valid token hold the lock
//! only for the expiry check.

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::config::AuthMode;

use super::AuthError;
use super::callback::{CallbackListener, prompt_for_code};
use super::flow::{self, OAuthConfig, OOB_REDIRECT_URI};
use super::pkce::Pkce;
use super::store::TokenStore;
use super::token::TokenSet;

/// Owns the cached credential and its renewal cycle.
pub struct AuthManager {
    oauth: OAuthConfig,
    store: TokenStore,
    auth_mode: AuthMode,
    callback_port: u16,
    http_client: reqwest::Client,
    slot: Mutex<Option<TokenSet>>,
}

impl AuthManager {
    pub fn new(
        oauth: OAuthConfig,
        store: TokenStore,
        auth_mode: AuthMode,
        callback_port: u16,
    ) -> Arc<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .unwrap_or_default();

        Arc::new(Self {
            oauth,
            store,
            auth_mode,
            callback_port,
            http_client,
            slot: Mutex::new(None),
        })
    }

    /// Get a valid bearer token, renewing or bootstrapping as needed.
    ///
    /// This is the single authorization entry point for the spreadsheet
    /// operations. Renewal failures are not retried; they surface to the
    /// caller as authorization errors.
    pub async fn access_token(&self) -> Result<String, AuthError> {
        let mut slot = self.slot.lock().await;

        if slot.is_none() {
            *slot = self.store.load()?;
        }

        if slot.is_none() {
            info!("No stored credential, starting interactive authorization");
            let token = self.bootstrap().await?;
            self.store.save(&token)?;
            *slot = Some(token);
        }

        let Some(token) = slot.as_mut() else {
            return Err(AuthError::NotAuthorized(
                "no credential available after bootstrap".into(),
            ));
        };

        // A record without a refresh token cannot be silently recovered;
        // fail before any network call.
        if !token.has_refresh_token() {
            return Err(AuthError::MissingRefreshToken);
        }

        if token.needs_refresh() {
            debug!("Access token stale, refreshing");
            let refresh = token
                .refresh_token
                .clone()
                .ok_or(AuthError::MissingRefreshToken)?;
            let renewed = flow::refresh_token(&self.http_client, &self.oauth, &refresh).await?;
            token.merge_refresh(renewed);
            // Write-through: in-memory and on-disk copies converge before
            // the token is handed out.
            self.store.save(token)?;
            debug!("Token refreshed and persisted");
        }

        Ok(token.access_token.clone())
    }

    /// A copy of the current credential record, if one is cached or stored.
    pub async fn token_set(&self) -> Result<Option<TokenSet>, AuthError> {
        let mut slot = self.slot.lock().await;
        if slot.is_none() {
            *slot = self.store.load()?;
        }
        Ok(slot.clone())
    }

    /// Run the interactive consent flow and persist the resulting record.
    ///
    /// Used by the `auth` subcommand; `access_token` also falls back to
    /// this when no credential exists yet.
    pub async fn authorize(&self) -> Result<TokenSet, AuthError> {
        let token = self.bootstrap().await?;
        self.store.save(&token)?;
        let mut slot = self.slot.lock().await;
        *slot = Some(token.clone());
        Ok(token)
    }

    /// One-time consent: build the URL, collect the code, exchange it.
    async fn bootstrap(&self) -> Result<TokenSet, AuthError> {
        let pkce = Pkce::generate();
        let state = uuid::Uuid::new_v4().to_string();

        match self.auth_mode {
            AuthMode::Loopback => {
                let listener = CallbackListener::bind(self.callback_port).await?;
                let redirect_uri = listener.redirect_uri();
                let url = flow::build_authorize_url(&self.oauth, &redirect_uri, &pkce, &state);

                eprintln!("Authorize this app by visiting this URL:\n\n{url}\n");
                eprintln!("Waiting for OAuth callback on {redirect_uri} ...");

                let code = listener.recv(&state).await?;
                flow::exchange_code(
                    &self.http_client,
                    &self.oauth,
                    &code,
                    &pkce.verifier,
                    &redirect_uri,
                )
                .await
            }
            AuthMode::Oob => {
                let url =
                    flow::build_authorize_url(&self.oauth, OOB_REDIRECT_URI, &pkce, &state);

                eprintln!("Authorize this app by visiting this URL:\n\n{url}\n");

                let code = prompt_for_code().await?;
                flow::exchange_code(
                    &self.http_client,
                    &self.oauth,
                    &code,
                    &pkce.verifier,
                    OOB_REDIRECT_URI,
                )
                .await
            }
        }
    }
}
