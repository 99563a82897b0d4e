//! MCP tools to allow an AI agent to explore and query a PostgreSQL GraphQL API.
//!
//! Each tool turns its parameters into a GraphQL request, runs it through the shared
//! [`Executor`] and shapes the outcome. Failures never escape a tool as faults. They are
//! turned into an [`ErrorEnvelope`] and handed back to the client like any other result.

mod collection_query;
mod graphql_query;
mod introspection;
mod list_tables;
mod table_info;

use std::sync::Arc;

use rmcp::model::{CallToolResult, Content, JsonObject, Tool};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::graphql::{ExecutionError, Executor};
use crate::naming::CollectionNaming;

pub use collection_query::{
    COLLECTION_QUERY_TOOL_NAME, CollectionQuery, DEFAULT_NODE_FIELDS, DEFAULT_PAGE_SIZE,
    Input as CollectionQueryInput, collection_request,
};
pub use graphql_query::{GRAPHQL_QUERY_TOOL_NAME, GraphqlQuery, Input as GraphqlQueryInput};
pub use introspection::{INTROSPECTION_QUERY, INTROSPECTION_TOOL_NAME, IntrospectionQuery};
pub use list_tables::{LIST_TABLES_TOOL_NAME, ListTables};
pub use table_info::{
    GET_TABLE_INFO_TOOL_NAME, Input as TableInfoInput, TABLE_INFO_QUERY, TableInfo,
};

/// Errors reported by a tool
#[derive(Debug, thiserror::Error)]
pub enum ToolError {
    /// Bad or missing input, detected before anything is sent
    #[error("{0}")]
    Parameter(String),

    /// The GraphQL request itself failed
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// The schema has nothing describing the requested table
    #[error("Table '{table}' not found: the schema has no type named '{type_name}'")]
    NotFound { table: String, type_name: String },
}

impl ToolError {
    /// A stable identifier for the class of error
    pub fn kind(&self) -> &'static str {
        match self {
            ToolError::Parameter(_) => "parameter_error",
            ToolError::Execution(ExecutionError::Network(_)) => "network_error",
            ToolError::Execution(ExecutionError::Http { .. }) => "http_error",
            ToolError::Execution(ExecutionError::Decode { .. }) => "decode_error",
            ToolError::NotFound { .. } => "not_found",
        }
    }

    pub fn envelope(&self) -> ErrorEnvelope {
        let kind = self.kind();
        let detail = match self {
            ToolError::Parameter(_) | ToolError::Execution(ExecutionError::Network(_)) => {
                json!({ "kind": kind })
            }
            ToolError::Execution(ExecutionError::Http { status, body }) => json!({
                "kind": kind,
                "status": status.as_u16(),
                "body": body,
            }),
            ToolError::Execution(ExecutionError::Decode { excerpt, .. }) => json!({
                "kind": kind,
                "excerpt": excerpt,
            }),
            ToolError::NotFound { table, type_name } => json!({
                "kind": kind,
                "table": table,
                "type_name": type_name,
            }),
        };

        ErrorEnvelope {
            error: self.to_string(),
            detail: Some(detail),
        }
    }
}

/// The uniform shape of every failed tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorEnvelope {
    /// A human-readable description of what went wrong
    pub error: String,

    /// Structured information about the failure, always including its `kind`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<Value>,
}

/// Render the outcome of a tool as an MCP result.
///
/// Payloads and envelopes are both pretty-printed JSON text; envelopes are flagged as errors.
pub fn into_call_tool_result(result: Result<Value, ToolError>) -> CallToolResult {
    match result {
        Ok(value) => CallToolResult::success(vec![Content::text(
            serde_json::to_string_pretty(&value).unwrap_or_default(),
        )]),
        Err(error) => {
            warn!(kind = error.kind(), "Tool call failed: {error}");
            CallToolResult::error(vec![Content::text(
                serde_json::to_string_pretty(&error.envelope()).unwrap_or_default(),
            )])
        }
    }
}

/// Deserialize tool arguments, treating missing arguments as an empty object
pub(crate) fn parse_input<T: DeserializeOwned>(
    arguments: Option<JsonObject>,
) -> Result<T, ToolError> {
    serde_json::from_value(Value::Object(arguments.unwrap_or_default()))
        .map_err(|e| ToolError::Parameter(format!("Invalid input: {e}")))
}

/// A required string parameter, trimmed of surrounding whitespace
pub(crate) fn require_non_empty<'a>(name: &str, value: &'a str) -> Result<&'a str, ToolError> {
    let value = value.trim();
    if value.is_empty() {
        Err(ToolError::Parameter(format!("{name} must not be empty")))
    } else {
        Ok(value)
    }
}

/// An optional string parameter, with blank values treated as absent
pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.trim().is_empty())
}

/// All the tools, sharing one executor
#[derive(Clone)]
pub struct Toolbox {
    graphql_query: GraphqlQuery,
    introspection_query: IntrospectionQuery,
    list_tables: ListTables,
    table_info: TableInfo,
    collection_query: CollectionQuery,
}

impl Toolbox {
    pub fn new(executor: Arc<Executor>, naming: CollectionNaming) -> Self {
        let naming = Arc::new(naming);
        Self {
            graphql_query: GraphqlQuery::new(executor.clone()),
            introspection_query: IntrospectionQuery::new(executor.clone()),
            list_tables: ListTables::new(executor.clone(), naming.clone()),
            table_info: TableInfo::new(executor.clone(), naming.clone()),
            collection_query: CollectionQuery::new(executor, naming),
        }
    }

    /// The MCP descriptions of every tool
    pub fn tools(&self) -> Vec<Tool> {
        vec![
            self.graphql_query.tool.clone(),
            self.introspection_query.tool.clone(),
            self.list_tables.tool.clone(),
            self.table_info.tool.clone(),
            self.collection_query.tool.clone(),
        ]
    }

    /// Call a tool by name. Returns `None` if there is no tool with that name.
    #[tracing::instrument(skip(self, arguments))]
    pub async fn call(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Option<Result<Value, ToolError>> {
        let result = match name {
            GRAPHQL_QUERY_TOOL_NAME => self.graphql_query.call(arguments).await,
            INTROSPECTION_TOOL_NAME => self.introspection_query.execute().await,
            LIST_TABLES_TOOL_NAME => self.list_tables.execute().await,
            GET_TABLE_INFO_TOOL_NAME => self.table_info.call(arguments).await,
            COLLECTION_QUERY_TOOL_NAME => self.collection_query.call(arguments).await,
            _ => {
                debug!("No tool named {name}");
                return None;
            }
        };
        Some(result)
    }
}
