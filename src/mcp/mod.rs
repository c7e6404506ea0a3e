//! MCP transport adapter: JSON-RPC types, method dispatch, and the two
//! transports (stateless HTTP and line-delimited stdio).

pub mod http;
pub mod server;
pub mod stdio;
pub mod types;

pub use server::McpServer;
