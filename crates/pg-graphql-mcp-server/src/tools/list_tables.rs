//! MCP tool to list the tables exposed by the GraphQL API.

use std::collections::HashSet;
use std::sync::Arc;

use rmcp::model::Tool;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use super::ToolError;
use super::introspection::introspection_request;
use crate::graphql::{ExecutionError, Executor, Response, excerpt};
use crate::naming::CollectionNaming;

/// The name of the tool to list tables
pub const LIST_TABLES_TOOL_NAME: &str = "list_tables";

/// The type kind of tables' collection types
const OBJECT_KIND: &str = "OBJECT";

#[derive(Clone)]
pub struct ListTables {
    pub tool: Tool,
    executor: Arc<Executor>,
    naming: Arc<CollectionNaming>,
}

#[derive(Deserialize)]
struct IntrospectedSchema {
    #[serde(default)]
    types: Vec<IntrospectedType>,
}

#[derive(Deserialize)]
struct IntrospectedType {
    kind: String,
    name: Option<String>,
    #[serde(default)]
    description: Option<String>,
}

/// A table found in the schema, with the description of its collection type
#[derive(Debug, PartialEq, Serialize)]
struct Table {
    name: String,
    description: Option<String>,
}

impl ListTables {
    pub fn new(executor: Arc<Executor>, naming: Arc<CollectionNaming>) -> Self {
        Self {
            executor,
            naming,
            tool: Tool::new(
                LIST_TABLES_TOOL_NAME,
                "List the database tables available through the PostgreSQL GraphQL API. Returns each table's name and description, and their count. Use a table name with `get_table_info` or `execute_collection_query`.",
                Map::from_iter([("type".to_string(), Value::from("object"))]),
            ),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self) -> Result<Value, ToolError> {
        let response = self.executor.execute(&introspection_request()).await?;
        match tables(&self.naming, &response)? {
            Some(tables) => {
                debug!(count = tables.len(), "Found tables");
                let total = tables.len();
                let mut payload = Map::from_iter([
                    ("tables".to_string(), json!(tables)),
                    ("total".to_string(), json!(total)),
                ]);

                // A partial schema still lists its tables, next to what went wrong
                if let Some(errors) = response
                    .get("errors")
                    .filter(|errors| errors.as_array().is_some_and(|errors| !errors.is_empty()))
                {
                    payload.insert("errors".to_string(), errors.clone());
                }
                Ok(Value::Object(payload))
            }
            None => Ok(response),
        }
    }
}

/// The tables named by an introspection response, in schema order and without duplicates.
///
/// Returns `None` when the response holds no schema, so the caller can pass along
/// whatever the endpoint said instead.
fn tables(naming: &CollectionNaming, response: &Value) -> Result<Option<Vec<Table>>, ToolError> {
    let Some(schema) = serde_json::from_value::<Response>(response.clone())
        .ok()
        .and_then(|response| response.data)
        .and_then(|mut data| data.get_mut("__schema").map(Value::take))
        .filter(|schema| !schema.is_null())
    else {
        return Ok(None);
    };

    let schema = serde_json::from_value::<IntrospectedSchema>(schema.clone()).map_err(|source| {
        ExecutionError::Decode {
            source,
            excerpt: excerpt(&schema.to_string()),
        }
    })?;

    let mut seen = HashSet::new();
    let tables = schema
        .types
        .iter()
        .filter(|ty| ty.kind == OBJECT_KIND)
        .filter_map(|ty| {
            let table = naming.table_name(ty.name.as_deref()?)?;
            seen.insert(table).then(|| Table {
                name: table.to_string(),
                description: ty.description.clone(),
            })
        })
        .collect();

    Ok(Some(tables))
}
