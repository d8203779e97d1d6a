//! Line-delimited JSON-RPC surface: message types, method dispatch,
//! resource URIs and the stdio transport.

pub mod jsonrpc;
pub mod resources;
pub mod server;
pub mod transport;

pub use jsonrpc::{Request, Response, RpcError};
pub use resources::{ResourceProvider, ResourceUri};
pub use server::McpServer;
pub use transport::{serve_lines, serve_stdio};
