//! Obtaining the authorization code from the user.
//!
//! Two implementations of the same capability, selected by configuration:
//! a one-shot loopback listener that receives the browser redirect, and a
//! console prompt for the out-of-band flow where the user pastes the code.
//!
//! The loopback listener is a short-lived, one-shot resource: bound once,
//! torn down after exactly one callback (success or error), never left
//! listening.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Html;
use axum::routing::get;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::oneshot;
use tracing::{info, warn};

use super::AuthError;

/// Path the consent redirect points at.
const CALLBACK_PATH: &str = "/oauth2callback";

/// Query parameters of the OAuth callback.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    pub code: Option<String>,
    pub state: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub error_description: Option<String>,
}

/// Extract the authorization code from callback parameters.
///
/// The `state` must match the value embedded in the consent URL; a
/// provider-reported error or a missing code fails the flow.
pub fn validate_callback_params(
    params: &CallbackParams,
    expected_state: &str,
) -> Result<String, AuthError> {
    if let Some(ref error) = params.error {
        let desc = params
            .error_description
            .as_deref()
            .unwrap_or("Unknown error");
        warn!(error = %error, description = %desc, "OAuth error from authorization server");
        return Err(AuthError::ConsentDenied(format!("{}: {}", error, desc)));
    }

    if params.state.as_deref() != Some(expected_state) {
        return Err(AuthError::InvalidState);
    }

    params
        .code
        .clone()
        .ok_or_else(|| AuthError::ConsentDenied("Missing authorization code in callback".into()))
}

/// Channel ends handed to the first callback; `None` once consumed.
struct ListenerSlots {
    outcome: Option<oneshot::Sender<CallbackParams>>,
    shutdown: Option<oneshot::Sender<()>>,
}

type SharedSlots = Arc<Mutex<ListenerSlots>>;

/// One-shot loopback listener for the consent redirect.
pub struct CallbackListener {
    addr: SocketAddr,
    outcome_rx: oneshot::Receiver<CallbackParams>,
    serve_task: tokio::task::JoinHandle<()>,
}

impl CallbackListener {
    /// Bind the listener on `127.0.0.1:port` (0 for an ephemeral port)
    /// and start serving the callback route.
    pub async fn bind(port: u16) -> Result<Self, AuthError> {
        let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|e| AuthError::Listener(format!("Failed to bind callback port {port}: {e}")))?;
        let addr = listener
            .local_addr()
            .map_err(|e| AuthError::Listener(e.to_string()))?;

        let (outcome_tx, outcome_rx) = oneshot::channel();
        let (shutdown_tx, shutdown_rx) = oneshot::channel();

        let slots: SharedSlots = Arc::new(Mutex::new(ListenerSlots {
            outcome: Some(outcome_tx),
            shutdown: Some(shutdown_tx),
        }));

        let app = Router::new()
            .route(CALLBACK_PATH, get(callback_handler))
            .fallback(|| async { StatusCode::NOT_FOUND })
            .with_state(slots);

        let serve_task = tokio::spawn(async move {
            let server = axum::serve(listener, app).with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            });
            if let Err(e) = server.await {
                warn!(error = %e, "Callback listener terminated with error");
            }
        });

        info!(addr = %addr, "Callback listener bound");

        Ok(Self {
            addr,
            outcome_rx,
            serve_task,
        })
    }

    /// The redirect URI to embed in the consent URL.
    pub fn redirect_uri(&self) -> String {
        format!("http://{}{}", self.addr, CALLBACK_PATH)
    }

    /// The bound socket address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the first callback and return the authorization code.
    ///
    /// The listener is torn down before this returns, success or failure;
    /// no second callback is ever served.
    pub async fn recv(self, expected_state: &str) -> Result<String, AuthError> {
        let outcome = match self.outcome_rx.await {
            Ok(params) => params,
            Err(_) => {
                self.serve_task.abort();
                return Err(AuthError::Listener(
                    "Callback listener closed before receiving a callback".into(),
                ));
            }
        };

        // The handler has already triggered graceful shutdown; wait for
        // the accept loop to finish so the port is actually released.
        let _ = self.serve_task.await;

        validate_callback_params(&outcome, expected_state)
    }
}

async fn callback_handler(
    State(slots): State<SharedSlots>,
    Query(params): Query<CallbackParams>,
) -> Html<String> {
    let html = match params.error {
        Some(ref error) => error_html(
            error,
            params.error_description.as_deref().unwrap_or(""),
        ),
        None => success_html(),
    };

    // First callback wins; both channel ends are consumed so the server
    // shuts down and any later request finds the slots empty.
    let (outcome, shutdown) = {
        let mut guard = match slots.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        (guard.outcome.take(), guard.shutdown.take())
    };
    if let Some(tx) = outcome {
        let _ = tx.send(params);
    }
    if let Some(tx) = shutdown {
        let _ = tx.send(());
    }

    Html(html)
}

/// Read a pasted authorization code from the console (out-of-band mode).
///
/// Blocks indefinitely on user action, as the flow requires.
pub async fn prompt_for_code() -> Result<String, AuthError> {
    eprint!("Enter the authorization code from the browser: ");

    let mut line = String::new();
    let mut reader = BufReader::new(tokio::io::stdin());
    reader
        .read_line(&mut line)
        .await
        .map_err(|e| AuthError::ConsentDenied(format!("Failed to read code from console: {e}")))?;

    let code = line.trim().to_string();
    if code.is_empty() {
        return Err(AuthError::ConsentDenied(
            "Empty authorization code".to_string(),
        ));
    }
    Ok(code)
}

// =============================================================================
// HTML responses
// =============================================================================

/// Confirmation page shown in the browser after a successful callback.
fn success_html() -> String {
    r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Authorization complete</title></head>
<body>
    <h3>Authorization complete. You may close this window and return to the terminal.</h3>
</body>
</html>"#
        .to_string()
}

/// Error page shown when the provider redirected with an error.
fn error_html(error: &str, description: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head><meta charset="UTF-8"><title>Authorization failed</title></head>
<body>
    <h3>Authorization failed.</h3>
    <p><strong>Error:</strong> <code>{}</code></p>
    <p>{}</p>
    <p>Close this window and try again from the terminal.</p>
</body>
</html>"#,
        html_escape(error),
        html_escape(description)
    )
}

/// Simple HTML escaping to prevent XSS via the error parameters.
fn html_escape(s: &str) -> String {
    let mut escaped = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
