use super::errors::McpError;
use super::protocol::{
    CallToolParams, InitializeParams, JsonRpcMessage, MCP_VERSION, error_codes, mcp_error_codes,
};
use super::server::{ConnectionState, McpServer, MessageHandler};
use super::tools::{
    GetSolutionHandler, ListTagsHandler, SaveSolutionHandler, SearchSolutionsHandler,
};
use super::validation::McpValidator;
use serde_json::json;
use std::sync::Arc;

fn test_server() -> Arc<McpServer> {
    Arc::new(McpServer::new(
        "solution-memory-mcp".to_string(),
        "0.1.0".to_string(),
    ))
}

#[test]
fn validator_accepts_well_formed_request() {
    let validator = McpValidator::new();
    let raw = json!({
        "jsonrpc": "2.0",
        "method": "tools/list",
        "id": 1
    });

    let message = validator
        .validate_raw_message(&raw)
        .expect("should validate request successfully");
    assert!(matches!(message, JsonRpcMessage::Request(_)));
}

#[test]
fn validator_accepts_notification_without_id() {
    let validator = McpValidator::new();
    let raw = json!({
        "jsonrpc": "2.0",
        "method": "initialized"
    });

    let message = validator
        .validate_raw_message(&raw)
        .expect("should validate notification successfully");
    assert!(matches!(message, JsonRpcMessage::Notification(_)));
}

#[test]
fn validator_rejects_wrong_jsonrpc_version() {
    let validator = McpValidator::new();
    let raw = json!({
        "jsonrpc": "1.0",
        "method": "ping",
        "id": 1
    });

    assert!(validator.validate_raw_message(&raw).is_err());
}

#[test]
fn validator_rejects_message_without_method_or_result() {
    let validator = McpValidator::new();
    let raw = json!({ "jsonrpc": "2.0", "id": 7 });

    assert!(validator.validate_raw_message(&raw).is_err());
}

#[test]
fn validator_rejects_non_scalar_id() {
    let validator = McpValidator::new();
    let raw = json!({
        "jsonrpc": "2.0",
        "method": "ping",
        "id": {"nested": true}
    });

    assert!(validator.validate_raw_message(&raw).is_err());
}

#[test]
fn validator_knows_supported_protocol_versions() {
    let validator = McpValidator::new();
    assert!(validator.is_protocol_version_supported(MCP_VERSION));
    assert!(!validator.is_protocol_version_supported("2020-01-01"));
}

#[test]
fn error_conversion_uses_protocol_codes() {
    let error = McpError::MethodNotFound {
        method: "bogus".to_string(),
    };
    assert_eq!(error.to_jsonrpc_error().code, error_codes::METHOD_NOT_FOUND);

    let error = McpError::ToolNotFound {
        name: "bogus".to_string(),
    };
    assert_eq!(
        error.to_jsonrpc_error().code,
        mcp_error_codes::TOOL_NOT_FOUND
    );

    let error = McpError::UnsupportedProtocolVersion {
        version: "1999-01-01".to_string(),
        supported: vec![MCP_VERSION.to_string()],
    };
    assert_eq!(
        error.to_jsonrpc_error().code,
        mcp_error_codes::INVALID_PROTOCOL_VERSION
    );
}

#[test]
fn tool_definitions_expose_expected_schemas() {
    let save = SaveSolutionHandler::tool_definition();
    assert_eq!(save.name, "save_solution");
    assert_eq!(
        save.input_schema["required"],
        json!(["title", "problem", "solution"])
    );

    let search = SearchSolutionsHandler::tool_definition();
    assert_eq!(search.name, "search_solutions");
    assert_eq!(search.input_schema["required"], json!(["query"]));
    assert_eq!(
        search.input_schema["properties"]["search_mode"]["enum"],
        json!(["hybrid", "semantic", "keyword"])
    );

    let get = GetSolutionHandler::tool_definition();
    assert_eq!(get.name, "get_solution");
    assert_eq!(get.input_schema["required"], json!(["id"]));

    let list = ListTagsHandler::tool_definition();
    assert_eq!(list.name, "list_tags");
    assert_eq!(
        list.input_schema["properties"]["category"]["enum"],
        json!(["tech_stack", "problem_type", "error_code"])
    );
}

#[tokio::test]
async fn initialize_negotiates_protocol_version() {
    let server = test_server();
    let handler = MessageHandler::new(Arc::clone(&server));

    let params = InitializeParams {
        protocol_version: MCP_VERSION.to_string(),
        capabilities: super::protocol::ClientCapabilities {
            experimental: None,
            sampling: None,
        },
        client_info: super::protocol::Implementation {
            name: "test-client".to_string(),
            version: "1.0".to_string(),
        },
    };

    let result = handler
        .handle_initialize(Some(
            serde_json::to_value(params).expect("should serialize params"),
        ))
        .await
        .expect("should initialize successfully");

    assert_eq!(result["protocolVersion"], MCP_VERSION);
    assert_eq!(result["serverInfo"]["name"], "solution-memory-mcp");
    assert_eq!(server.connection_state().await, ConnectionState::Initializing);
}

#[tokio::test]
async fn initialize_rejects_unsupported_version() {
    let server = test_server();
    let handler = MessageHandler::new(server);

    let params = json!({
        "protocolVersion": "1999-01-01",
        "capabilities": {"experimental": null, "sampling": null},
        "clientInfo": {"name": "test", "version": "0"}
    });

    let result = handler.handle_initialize(Some(params)).await;
    assert!(matches!(
        result,
        Err(McpError::UnsupportedProtocolVersion { .. })
    ));
}

#[tokio::test]
async fn list_tools_is_empty_before_registration() {
    let server = test_server();
    let handler = MessageHandler::new(server);

    let result = handler
        .handle_list_tools()
        .await
        .expect("should list tools successfully");
    assert_eq!(result["tools"], json!([]));
}

#[tokio::test]
async fn call_to_unknown_tool_is_rejected() {
    let server = test_server();
    let handler = MessageHandler::new(server);

    let params = CallToolParams {
        name: "no_such_tool".to_string(),
        arguments: None,
    };

    let result = handler
        .handle_call_tool(Some(
            serde_json::to_value(params).expect("should serialize params"),
        ))
        .await;
    assert!(matches!(result, Err(McpError::ToolNotFound { .. })));
}

#[tokio::test]
async fn ping_returns_empty_object() {
    let server = test_server();
    let handler = MessageHandler::new(server);

    let result = handler.handle_ping().expect("should handle ping");
    assert_eq!(result, json!({}));
}
