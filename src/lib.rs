//! Google Sheets MCP server.
//!
//! Exposes two MCP tools, `append_rows` and `read_rows`, over a stateless
//! HTTP endpoint or stdio. The interesting machinery is the OAuth2
//! credential lifecycle behind them: a persisted refresh token, silent
//! coalesced renewal, and an interactive consent bootstrap for first use.

pub mod config;
pub mod error;
pub mod mcp;
pub mod oauth;
pub mod sheets;

pub use config::Config;
pub use error::AppError;
