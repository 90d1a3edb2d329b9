//! MCP Tools Implementation
//!
//! Concrete tool handlers for saving, searching, fetching, and browsing
//! problem/solution records.

use crate::database::lancedb::vector_store::VectorStore;
use crate::database::sqlite::Database;
use crate::database::sqlite::models::{NewSolution, Solution};
use crate::mcp::protocol::{CallToolParams, CallToolResult, Tool, ToolContent};
use crate::mcp::server::ToolHandler;
use crate::search::{HybridSearchEngine, SearchMode};
use crate::taxonomy::TagCategory;
use anyhow::Result;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, error, warn};

const DEFAULT_SEARCH_LIMIT: i64 = 5;
const MAX_SEARCH_LIMIT: i64 = 20;

fn text_result(payload: &Value, is_error: bool) -> Result<CallToolResult> {
    Ok(CallToolResult {
        content: vec![ToolContent::Text {
            text: serde_json::to_string_pretty(payload)?,
        }],
        is_error: Some(is_error),
    })
}

fn error_result(message: String) -> Result<CallToolResult> {
    text_result(&json!({ "error": message }), true)
}

fn optional_string_list(args: &HashMap<String, Value>, key: &str) -> Vec<String> {
    args.get(key)
        .and_then(Value::as_array)
        .map(|values| {
            values
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Handler for the save_solution tool
pub struct SaveSolutionHandler {
    database: Arc<Database>,
    vector_store: Arc<VectorStore>,
}

impl SaveSolutionHandler {
    #[inline]
    pub fn new(database: Arc<Database>, vector_store: Arc<VectorStore>) -> Self {
        Self {
            database,
            vector_store,
        }
    }

    /// Create the save_solution tool definition
    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: "save_solution".to_string(),
            description: Some(
                "Save a problem solution to the memory system for future reference. Use this \
                 after successfully solving a bug, configuration issue, or technical problem."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "A concise title describing the problem (max 500 chars)"
                    },
                    "problem": {
                        "type": "string",
                        "description": "Detailed description of the problem"
                    },
                    "solution": {
                        "type": "string",
                        "description": "The solution that resolved the problem"
                    },
                    "root_cause": {
                        "type": "string",
                        "description": "Optional root cause analysis"
                    },
                    "error_messages": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Optional list of error messages encountered"
                    },
                    "tags": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Optional tags for categorization (e.g., 'React', 'Docker', 'bug')"
                    },
                    "project_name": {
                        "type": "string",
                        "description": "Optional name of the project where this was solved"
                    }
                },
                "required": ["title", "problem", "solution"],
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for SaveSolutionHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args = params.arguments.unwrap_or_default();

        let mut required = HashMap::new();
        for field in ["title", "problem", "solution"] {
            match args.get(field).and_then(Value::as_str) {
                Some(value) if !value.trim().is_empty() => {
                    required.insert(field, value.to_string());
                }
                _ => {
                    return error_result(format!(
                        "Missing or empty required parameter: {field}"
                    ));
                }
            }
        }

        let new_solution = NewSolution {
            title: required["title"].clone(),
            problem: required["problem"].clone(),
            solution: required["solution"].clone(),
            root_cause: args
                .get("root_cause")
                .and_then(Value::as_str)
                .map(str::to_string),
            error_messages: optional_string_list(&args, "error_messages"),
            tags: optional_string_list(&args, "tags"),
            project_name: args
                .get("project_name")
                .and_then(Value::as_str)
                .map(str::to_string),
        };

        let solution = Solution::create(new_solution);

        debug!("Saving solution '{}' as {}", solution.title, solution.id);

        self.database.save_solution(&solution).await?;

        // The two-store write is not atomic. When vector indexing fails the
        // record is already keyword-searchable; `reconcile` repairs the gap.
        if let Err(e) = self
            .vector_store
            .add(
                &solution.id,
                &solution.problem,
                &solution.error_messages,
                &solution.title,
            )
            .await
        {
            warn!(
                "Solution {} saved but vector indexing failed: {}",
                solution.id, e
            );
            return error_result(format!(
                "Solution saved with ID {} but semantic indexing failed: {}. \
                 Run 'reconcile' to repair the vector index.",
                solution.id, e
            ));
        }

        text_result(
            &json!({
                "id": solution.id,
                "message": format!(
                    "Solution '{}' saved successfully with ID {}",
                    solution.title, solution.id
                )
            }),
            false,
        )
    }
}

/// Handler for the search_solutions tool
pub struct SearchSolutionsHandler {
    search_engine: Arc<HybridSearchEngine>,
}

impl SearchSolutionsHandler {
    #[inline]
    pub fn new(search_engine: Arc<HybridSearchEngine>) -> Self {
        Self { search_engine }
    }

    /// Create the search_solutions tool definition
    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: "search_solutions".to_string(),
            description: Some(
                "Search for similar solutions in the memory system. Use this when encountering \
                 a problem to find relevant historical solutions."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Search query - describe the problem or paste error messages"
                    },
                    "limit": {
                        "type": "integer",
                        "description": "Maximum number of results (default 5, max 20)",
                        "default": 5,
                        "minimum": 1,
                        "maximum": 20
                    },
                    "tags": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Optional tags to filter results"
                    },
                    "search_mode": {
                        "type": "string",
                        "enum": ["hybrid", "semantic", "keyword"],
                        "description": "Search mode: 'hybrid' (default), 'semantic', or 'keyword'",
                        "default": "hybrid"
                    }
                },
                "required": ["query"],
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for SearchSolutionsHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args = params.arguments.unwrap_or_default();

        let Some(query) = args.get("query").and_then(Value::as_str) else {
            return error_result("Missing required parameter: query".to_string());
        };

        let limit = args
            .get("limit")
            .and_then(Value::as_i64)
            .unwrap_or(DEFAULT_SEARCH_LIMIT)
            .clamp(1, MAX_SEARCH_LIMIT) as usize;

        let tags = optional_string_list(&args, "tags");

        let mode = args
            .get("search_mode")
            .and_then(Value::as_str)
            .map_or(SearchMode::Hybrid, SearchMode::parse);

        debug!(
            "Searching solutions: mode={}, limit={}, tags={:?}",
            mode, limit, tags
        );

        match self.search_engine.search(query, limit, &tags, mode).await {
            Ok(results) => {
                let total = results.len();
                text_result(
                    &json!({
                        "results": results,
                        "total": total
                    }),
                    false,
                )
            }
            Err(e) => {
                error!("Search failed: {}", e);
                error_result(format!("Search failed: {}", e))
            }
        }
    }
}

/// Handler for the get_solution tool
pub struct GetSolutionHandler {
    database: Arc<Database>,
}

impl GetSolutionHandler {
    #[inline]
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Create the get_solution tool definition
    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: "get_solution".to_string(),
            description: Some(
                "Get full details of a solution by its ID. Use this after search_solutions to \
                 get complete solution information."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "id": {
                        "type": "string",
                        "description": "The solution UUID"
                    }
                },
                "required": ["id"],
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for GetSolutionHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args = params.arguments.unwrap_or_default();

        let Some(id) = args.get("id").and_then(Value::as_str) else {
            return error_result("Missing required parameter: id".to_string());
        };

        match self.database.get_solution(id).await? {
            Some(solution) => text_result(
                &json!({
                    "id": solution.id,
                    "title": solution.title,
                    "problem": solution.problem,
                    "root_cause": solution.root_cause,
                    "solution": solution.solution,
                    "error_messages": solution.error_messages,
                    "tags": solution.tags,
                    "project_name": solution.project_name,
                    "created_at": solution.created_at.to_rfc3339(),
                    "updated_at": solution.updated_at.to_rfc3339()
                }),
                false,
            ),
            None => error_result(format!("Solution with ID '{}' not found", id)),
        }
    }
}

/// Handler for the list_tags tool
pub struct ListTagsHandler {
    database: Arc<Database>,
}

impl ListTagsHandler {
    #[inline]
    pub fn new(database: Arc<Database>) -> Self {
        Self { database }
    }

    /// Create the list_tags tool definition
    #[inline]
    pub fn tool_definition() -> Tool {
        Tool {
            name: "list_tags".to_string(),
            description: Some(
                "List all tags in the solution memory, optionally filtered by category. Useful \
                 for browsing solutions by technology or problem type."
                    .to_string(),
            ),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "category": {
                        "type": "string",
                        "enum": ["tech_stack", "problem_type", "error_code"],
                        "description": "Optional category filter"
                    }
                },
                "required": [],
                "additionalProperties": false
            }),
        }
    }
}

#[async_trait]
impl ToolHandler for ListTagsHandler {
    #[inline]
    async fn handle(&self, params: CallToolParams) -> Result<CallToolResult> {
        let args = params.arguments.unwrap_or_default();

        let category = match args.get("category").and_then(Value::as_str) {
            Some(raw) => match TagCategory::from_str(raw) {
                Ok(category) => Some(category),
                Err(e) => return error_result(e.to_string()),
            },
            None => None,
        };

        let tags = self.database.list_tags(category).await?;

        text_result(
            &json!({
                "tags": tags
                    .iter()
                    .map(|t| json!({
                        "name": t.name,
                        "category": t.category,
                        "count": t.count
                    }))
                    .collect::<Vec<_>>()
            }),
            false,
        )
    }
}
