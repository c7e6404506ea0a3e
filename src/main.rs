//! Application entry point.
//!
//! One binary, three modes:
//!   - `serve` (default): MCP over HTTP on `POST /mcp`
//!   - `stdio`: MCP over line-delimited stdin/stdout
//!   - `auth`: run the interactive consent flow and store the credential

use std::sync::Arc;

use tokio::signal;
use tracing_subscriber::EnvFilter;

use sheets_mcp::config::Config;
use sheets_mcp::mcp::{McpServer, http, stdio};
use sheets_mcp::oauth::{AuthManager, OAuthConfig, TokenStore};
use sheets_mcp::sheets::SheetsClient;

// ---------------------------------------------------------------------------
// CLI argument parsing (minimal, no clap dependency)
// ---------------------------------------------------------------------------

enum Command {
    Serve,
    Stdio,
    Auth,
}

fn parse_args() -> Command {
    let mut command = Command::Serve;

    for arg in std::env::args().skip(1) {
        match arg.as_str() {
            "serve" => command = Command::Serve,
            "stdio" => command = Command::Stdio,
            "auth" => command = Command::Auth,
            "--help" | "-h" => {
                print_usage();
                std::process::exit(0);
            }
            "--version" | "-V" => {
                println!("sheets-mcp {}", env!("CARGO_PKG_VERSION"));
                std::process::exit(0);
            }
            other => {
                eprintln!("Unknown argument: {other}");
                eprintln!("Run with --help for usage information.");
                std::process::exit(1);
            }
        }
    }

    command
}

fn print_usage() {
    println!(
        "\
sheets-mcp {version} -- Google Sheets MCP server

USAGE:
    sheets-mcp [COMMAND]

COMMANDS:
    serve      Serve MCP over HTTP on POST /mcp [default]
    stdio      Serve MCP over stdin/stdout (one JSON-RPC message per line)
    auth       Run the interactive OAuth consent flow and store the credential

OPTIONS:
    -h, --help             Print this help message
    -V, --version          Print version information

ENVIRONMENT:
    GSHEETS_CLIENT_ID      OAuth client id (required)
    GSHEETS_CLIENT_SECRET  OAuth client secret (required)
    GSHEETS_SPREADSHEET_ID Default spreadsheet for calls that omit one
    GSHEETS_RANGE          Default A1 range for calls that omit one
    GSHEETS_TOKEN_PATH     Credential file path [default: tokens.json]
    GSHEETS_OAUTH_PORT     OAuth callback port [default: 5173]
    GSHEETS_AUTH_MODE      'loopback' or 'oob' [default: loopback]
    PORT                   HTTP listen port [default: 3000]
    RUST_LOG               Override log level (e.g. RUST_LOG=debug)
",
        version = env!("CARGO_PKG_VERSION")
    );
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let command = parse_args();

    // Local .env overrides are honored before the environment is read.
    let _ = dotenvy::dotenv();

    let config = Config::from_env()?;
    init_tracing(&config);

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        token_path = %config.token_path.display(),
        "Starting sheets-mcp"
    );

    let auth = AuthManager::new(
        OAuthConfig::new(&config.client_id, &config.client_secret),
        TokenStore::new(&config.token_path),
        config.auth_mode,
        config.oauth_port,
    );

    match command {
        Command::Auth => {
            auth.authorize().await?;
            println!("Authorization complete. Tokens stored in {}", config.token_path.display());
            Ok(())
        }
        Command::Stdio => {
            let server = McpServer::new(Arc::new(config), SheetsClient::new(auth));
            stdio::serve(server).await?;
            Ok(())
        }
        Command::Serve => {
            let addr = config.listen_addr();
            let server = McpServer::new(Arc::new(config), SheetsClient::new(auth));
            http::serve(server, &addr, shutdown_signal()).await?;
            tracing::info!("Shutting down gracefully");
            Ok(())
        }
    }
}

// ---------------------------------------------------------------------------
// Tracing initialization
// ---------------------------------------------------------------------------

/// Set up the tracing subscriber.
///
/// Logs always go to stderr: in stdio mode stdout carries the protocol
/// stream and must stay clean.
fn init_tracing(config: &Config) {
    // RUST_LOG env var takes precedence
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("sheets_mcp=info,tower_http=info,warn"));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true);

    if config.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}

// ---------------------------------------------------------------------------
// Graceful shutdown
// ---------------------------------------------------------------------------

/// Wait for a shutdown signal (SIGTERM or SIGINT / Ctrl+C).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl+C)");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM");
        }
    }
}
