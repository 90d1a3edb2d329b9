//! MCP Message Validation
//!
//! Structural validation of incoming JSON-RPC messages before they reach the
//! dispatcher, plus protocol version negotiation support.

use crate::mcp::errors::McpError;
use crate::mcp::protocol::{JSONRPC_VERSION, JsonRpcMessage, MCP_VERSION};
use serde_json::Value;
use tracing::debug;

/// Validator for raw MCP messages
#[derive(Debug)]
pub struct McpValidator {
    supported_versions: Vec<String>,
}

impl Default for McpValidator {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl McpValidator {
    #[inline]
    pub fn new() -> Self {
        Self {
            supported_versions: vec![MCP_VERSION.to_string(), "2025-03-26".to_string()],
        }
    }

    /// Check a raw JSON value for JSON-RPC shape and parse it into a typed
    /// message
    #[inline]
    pub fn validate_raw_message(&self, raw: &Value) -> Result<JsonRpcMessage, McpError> {
        let object = raw.as_object().ok_or_else(|| McpError::InvalidRequest {
            message: "Message must be a JSON object".to_string(),
        })?;

        match object.get("jsonrpc").and_then(Value::as_str) {
            Some(JSONRPC_VERSION) => {}
            Some(other) => {
                return Err(McpError::InvalidRequest {
                    message: format!("Unsupported JSON-RPC version: {}", other),
                });
            }
            None => {
                return Err(McpError::InvalidRequest {
                    message: "Missing jsonrpc version field".to_string(),
                });
            }
        }

        if object.contains_key("method") {
            if object
                .get("method")
                .and_then(Value::as_str)
                .is_none_or(str::is_empty)
            {
                return Err(McpError::InvalidRequest {
                    message: "Method must be a non-empty string".to_string(),
                });
            }

            if let Some(id) = object.get("id") {
                if !(id.is_string() || id.is_i64() || id.is_u64()) {
                    return Err(McpError::InvalidRequest {
                        message: "Request id must be a string or an integer".to_string(),
                    });
                }
            }
        } else if !object.contains_key("result") && !object.contains_key("error") {
            return Err(McpError::InvalidRequest {
                message: "Message must carry a method, result, or error".to_string(),
            });
        }

        let message: JsonRpcMessage =
            serde_json::from_value(raw.clone()).map_err(|e| McpError::ParseError {
                message: e.to_string(),
            })?;

        debug!("Validated incoming JSON-RPC message");
        Ok(message)
    }

    /// Whether a client-announced protocol version is supported
    #[inline]
    pub fn is_protocol_version_supported(&self, version: &str) -> bool {
        self.supported_versions.iter().any(|v| v == version)
    }

    #[inline]
    pub fn supported_protocol_versions(&self) -> &[String] {
        &self.supported_versions
    }
}
