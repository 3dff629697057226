pub mod client;
pub mod host;
pub mod token;

pub use client::{BridgedSessionClient, SessionClient};
pub use host::McpToolHost;
pub use token::{BridgeState, TokenBridge, ToolHost, extract_token};
