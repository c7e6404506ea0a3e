//! Line-delimited stdio transport.
//!
//! One JSON-RPC message per line on stdin, one response per line on
//! stdout. Logging must go to stderr in this mode or it would corrupt
//! the protocol stream.

use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{debug, info};

use crate::error::AppError;

use super::server::McpServer;

/// Pump stdin through the dispatcher until EOF.
pub async fn serve(server: McpServer) -> Result<(), AppError> {
    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    let mut lines = stdin.lines();

    info!("MCP stdio transport ready");

    while let Some(line) = lines
        .next_line()
        .await
        .map_err(|err| AppError::Internal(format!("stdin read failed: {err}")))?
    {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(response) = server.handle_message(line).await {
            let mut encoded = serde_json::to_vec(&response)?;
            encoded.push(b'\n');
            stdout
                .write_all(&encoded)
                .await
                .map_err(|err| AppError::Internal(format!("stdout write failed: {err}")))?;
            stdout
                .flush()
                .await
                .map_err(|err| AppError::Internal(format!("stdout flush failed: {err}")))?;
        }
    }

    debug!("stdin closed, stdio transport exiting");
    Ok(())
}
