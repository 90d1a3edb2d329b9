//! MCP Error Handling
//!
//! Error classification for the MCP server and conversion into JSON-RPC
//! error responses.

use crate::mcp::protocol::{JsonRpcError, error_codes, mcp_error_codes};
use thiserror::Error;

/// Errors that can occur while serving MCP requests
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Protocol version not supported: {version}. Supported versions: {supported:?}")]
    UnsupportedProtocolVersion {
        version: String,
        supported: Vec<String>,
    },

    #[error("Tool not found: {name}")]
    ToolNotFound { name: String },

    #[error("Invalid request: {message}")]
    InvalidRequest { message: String },

    #[error("JSON-RPC parse error: {message}")]
    ParseError { message: String },

    #[error("Method not found: {method}")]
    MethodNotFound { method: String },

    #[error("Invalid parameters: {message}")]
    InvalidParameters { message: String },

    #[error("Internal server error: {message}")]
    InternalError { message: String },
}

impl McpError {
    /// Convert into a JSON-RPC error object
    #[inline]
    pub fn to_jsonrpc_error(&self) -> JsonRpcError {
        match self {
            Self::UnsupportedProtocolVersion { version, supported } => JsonRpcError::new(
                mcp_error_codes::INVALID_PROTOCOL_VERSION,
                format!(
                    "Unsupported protocol version: {}. Supported: {}",
                    version,
                    supported.join(", ")
                ),
                None,
            ),
            Self::ToolNotFound { name } => JsonRpcError::new(
                mcp_error_codes::TOOL_NOT_FOUND,
                format!("Tool not found: {}", name),
                None,
            ),
            Self::InvalidRequest { message } => JsonRpcError::new(
                error_codes::INVALID_REQUEST,
                format!("Invalid Request: {}", message),
                None,
            ),
            Self::ParseError { message } => JsonRpcError::new(
                error_codes::PARSE_ERROR,
                format!("Parse error: {}", message),
                None,
            ),
            Self::MethodNotFound { method } => JsonRpcError::new(
                error_codes::METHOD_NOT_FOUND,
                format!("Method not found: {}", method),
                None,
            ),
            Self::InvalidParameters { message } => {
                JsonRpcError::invalid_params(Some(message.clone()))
            }
            Self::InternalError { message } => {
                JsonRpcError::internal_error(Some(message.clone()))
            }
        }
    }
}
