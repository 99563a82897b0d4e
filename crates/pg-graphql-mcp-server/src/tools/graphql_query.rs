use std::sync::Arc;

use rmcp::model::{JsonObject, Tool};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::{ToolError, non_blank, parse_input, require_non_empty};
use crate::graphql::{Executor, Request};
use crate::schema_from_type;

/// The name of the tool to execute an arbitrary GraphQL document
pub const GRAPHQL_QUERY_TOOL_NAME: &str = "graphql_query";

#[derive(Clone)]
pub struct GraphqlQuery {
    pub tool: Tool,
    executor: Arc<Executor>,
}

/// Input for the graphql_query tool.
#[derive(JsonSchema, Deserialize, Debug, Default)]
pub struct Input {
    /// The GraphQL document
    pub query: String,

    /// The variable values as a JSON object, or a string containing one
    #[schemars(schema_with = "String::json_schema", default)]
    pub variables: Option<Value>,

    /// The operation to run, when the document defines more than one
    #[serde(default)]
    pub operation_name: Option<String>,
}

impl GraphqlQuery {
    pub fn new(executor: Arc<Executor>) -> Self {
        Self {
            executor,
            tool: Tool::new(
                GRAPHQL_QUERY_TOOL_NAME,
                "Execute a GraphQL query or mutation against the PostgreSQL GraphQL API and return the raw response. Use `list_tables` and `get_table_info` to discover the schema first. GraphQL errors are returned as part of the response.",
                schema_from_type!(Input),
            ),
        }
    }

    pub(super) async fn call(&self, arguments: Option<JsonObject>) -> Result<Value, ToolError> {
        self.execute(parse_input(arguments)?).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, input: Input) -> Result<Value, ToolError> {
        require_non_empty("query", &input.query)?;
        let variables = variables(input.variables)?;
        let operation_name = non_blank(&input.operation_name).map(str::to_string);

        let request = Request::new(input.query)
            .with_variables(variables)
            .with_operation_name(operation_name);
        Ok(self.executor.execute(&request).await?)
    }
}

/// Variables arrive either as an object or as JSON text; blank text means none
fn variables(variables: Option<Value>) -> Result<Map<String, Value>, ToolError> {
    let variables = match variables {
        Some(Value::String(text)) if text.trim().is_empty() => None,
        Some(Value::String(text)) => Some(serde_json::from_str::<Value>(&text).map_err(|e| {
            ToolError::Parameter(format!("Variables JSON format error: {e}"))
        })?),
        other => other,
    };

    match variables {
        None | Some(Value::Null) => Ok(Map::new()),
        Some(Value::Object(variables)) => Ok(variables),
        Some(_) => Err(ToolError::Parameter(
            "Variables must be a JSON object or a string containing one".into(),
        )),
    }
}
