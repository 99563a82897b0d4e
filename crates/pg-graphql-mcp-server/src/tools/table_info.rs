//! MCP tool to describe a single table.

use std::sync::Arc;

use rmcp::model::{JsonObject, Tool};
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{Map, Value};

use super::introspection::introspection_fragments;
use super::{ToolError, parse_input, require_non_empty};
use crate::graphql::{Executor, Request, Response};
use crate::naming::CollectionNaming;
use crate::schema_from_type;

/// The name of the tool to describe a table
pub const GET_TABLE_INFO_TOOL_NAME: &str = "get_table_info";

/// Introspection of a single type, whose name is passed as the `name` variable
pub const TABLE_INFO_QUERY: &str = concat!(
    r#"query GetTableInfo($name: String!) {
  __type(name: $name) {
    ...FullType
  }
}
"#,
    introspection_fragments!()
);

#[derive(Clone)]
pub struct TableInfo {
    pub tool: Tool,
    executor: Arc<Executor>,
    naming: Arc<CollectionNaming>,
}

/// Input for the get_table_info tool.
#[derive(JsonSchema, Deserialize, Debug)]
pub struct Input {
    /// The table name, as returned by `list_tables`
    pub table_name: String,
}

impl TableInfo {
    pub fn new(executor: Arc<Executor>, naming: Arc<CollectionNaming>) -> Self {
        Self {
            executor,
            naming,
            tool: Tool::new(
                GET_TABLE_INFO_TOOL_NAME,
                "Get the GraphQL type describing a table, with its fields, their types and arguments. Use `list_tables` to find table names.",
                schema_from_type!(Input),
            ),
        }
    }

    pub(super) async fn call(&self, arguments: Option<JsonObject>) -> Result<Value, ToolError> {
        self.execute(parse_input(arguments)?).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, input: Input) -> Result<Value, ToolError> {
        let table = require_non_empty("table_name", &input.table_name)?;
        let type_name = self.naming.type_name(table);

        let request = Request::new(TABLE_INFO_QUERY)
            .with_variables(Map::from_iter([(
                "name".to_string(),
                Value::from(type_name.as_str()),
            )]))
            .with_operation_name(Some("GetTableInfo".to_string()));
        let response = self.executor.execute(&request).await?;

        if is_missing_type(&response) {
            return Err(ToolError::NotFound {
                table: table.to_string(),
                type_name,
            });
        }
        Ok(response)
    }
}

/// Whether the endpoint answered cleanly that no such type exists.
///
/// A null type that comes with errors is relayed as is, since the errors say more
/// about what happened than a not-found would.
fn is_missing_type(response: &Value) -> bool {
    let Ok(Response { data, errors, .. }) = serde_json::from_value::<Response>(response.clone())
    else {
        return false;
    };
    errors.is_empty()
        && data
            .as_ref()
            .and_then(|data| data.get("__type"))
            .is_some_and(Value::is_null)
}
