//! MCP method dispatch, shared by both transports.
//!
//! Transports hand raw JSON lines (stdio) or request bodies (HTTP) to
//! [`McpServer::handle_message`]; everything protocol-level happens here,
//! including the only place application errors turn into JSON-RPC error
//! envelopes.

use std::sync::Arc;

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::{AppError, jsonrpc};
use crate::sheets::{SheetsClient, ops};

use super::types::{
    InitializeResult, JsonRpcRequest, JsonRpcResponse, ToolCallResult, ToolDefinition,
    ToolsCallParams, ToolsListResult,
};

/// Stateless MCP request handler.
#[derive(Clone)]
pub struct McpServer {
    config: Arc<Config>,
    sheets: SheetsClient,
}

impl McpServer {
    pub fn new(config: Arc<Config>, sheets: SheetsClient) -> Self {
        Self { config, sheets }
    }

    /// The two tools this server exposes.
    ///
    /// `spreadsheetId` and `range` are optional in both schemas; a call
    /// that omits them falls back to the configured defaults.
    pub fn tool_definitions() -> Vec<ToolDefinition> {
        vec![
            ToolDefinition {
                name: "append_rows".to_string(),
                description: "Append rows after the last row with data in a Google Sheets range"
                    .to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "spreadsheetId": {
                            "type": "string",
                            "description": "Spreadsheet ID; defaults to the configured spreadsheet"
                        },
                        "range": {
                            "type": "string",
                            "description": "A1-notation range; defaults to the configured range"
                        },
                        "rows": {
                            "type": "array",
                            "items": {
                                "type": "array",
                                "items": { "type": "string" }
                            },
                            "description": "Row matrix to append; cells are strings, entered as if typed by a user"
                        }
                    },
                    "required": ["rows"]
                }),
            },
            ToolDefinition {
                name: "read_rows".to_string(),
                description: "Read the cell values of a Google Sheets range".to_string(),
                input_schema: json!({
                    "type": "object",
                    "properties": {
                        "spreadsheetId": {
                            "type": "string",
                            "description": "Spreadsheet ID; defaults to the configured spreadsheet"
                        },
                        "range": {
                            "type": "string",
                            "description": "A1-notation range; defaults to the configured range"
                        }
                    }
                }),
            },
        ]
    }

    /// Parse one raw JSON-RPC message and dispatch it.
    ///
    /// Returns `None` for notifications, which get no response.
    pub async fn handle_message(&self, raw: &str) -> Option<JsonRpcResponse> {
        let request: JsonRpcRequest = match serde_json::from_str(raw) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "Unparseable JSON-RPC message");
                return Some(JsonRpcResponse::error(
                    Value::Null,
                    jsonrpc::PARSE_ERROR,
                    format!("Parse error: {err}"),
                ));
            }
        };
        self.handle_request(request).await
    }

    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            debug!(method = %request.method, "Ignoring notification");
            return None;
        }
        let id = request.id.clone().unwrap_or(Value::Null);
        debug!(method = %request.method, "Handling request");

        let outcome = match request.method.as_str() {
            "initialize" => serde_json::to_value(InitializeResult::current())
                .map_err(AppError::from),
            "tools/list" => serde_json::to_value(ToolsListResult {
                tools: Self::tool_definitions(),
            })
            .map_err(AppError::from),
            "tools/call" => self.handle_tool_call(request.params).await,
            "ping" => Ok(json!({})),
            other => {
                return Some(JsonRpcResponse::error(
                    id,
                    jsonrpc::METHOD_NOT_FOUND,
                    format!("Method not found: {other}"),
                ));
            }
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(err) => {
                warn!(error = %err, method = %request.method, "Request failed");
                JsonRpcResponse::error(id, err.jsonrpc_code(), err.to_string())
            }
        })
    }

    async fn handle_tool_call(&self, params: Option<Value>) -> Result<Value, AppError> {
        let params: ToolsCallParams = serde_json::from_value(params.unwrap_or(Value::Null))
            .map_err(|err| AppError::Input(format!("Invalid tools/call params: {err}")))?;
        let arguments = params.arguments.unwrap_or_else(|| json!({}));

        let output = match params.name.as_str() {
            "append_rows" => {
                let args = serde_json::from_value(arguments)
                    .map_err(|err| AppError::Input(format!("Invalid append_rows arguments: {err}")))?;
                ops::append_rows(&self.sheets, &self.config, args).await?
            }
            "read_rows" => {
                let args = serde_json::from_value(arguments)
                    .map_err(|err| AppError::Input(format!("Invalid read_rows arguments: {err}")))?;
                ops::read_rows(&self.sheets, &self.config, args).await?
            }
            other => {
                return Err(AppError::Input(format!("Unknown tool: {other}")));
            }
        };

        let text = serde_json::to_string_pretty(&output)?;
        Ok(serde_json::to_value(ToolCallResult::text(text))?)
    }
}
