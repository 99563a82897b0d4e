//! MCP tool to page through the rows of a table.
//!
//! The collection name becomes part of the query text, so it is checked against the
//! GraphQL name grammar. `where`, `order_by` and `fields` are GraphQL fragments written
//! by the caller and spliced in as they are; the endpoint is the one to reject them.

use std::sync::Arc;

use rmcp::model::{JsonObject, Tool};
use schemars::JsonSchema;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_json::{Number, Value};

use super::{ToolError, non_blank, parse_input, require_non_empty};
use crate::graphql::{Executor, Request};
use crate::naming::CollectionNaming;
use crate::schema_from_type;

/// The name of the tool to query a collection
pub const COLLECTION_QUERY_TOOL_NAME: &str = "execute_collection_query";

/// The page size used when `first` is not given
pub const DEFAULT_PAGE_SIZE: i64 = 10;

/// The node selection used when `fields` is not given
pub const DEFAULT_NODE_FIELDS: &str = "id";

#[derive(Clone)]
pub struct CollectionQuery {
    pub tool: Tool,
    executor: Arc<Executor>,
    naming: Arc<CollectionNaming>,
}

/// Input for the execute_collection_query tool.
#[derive(JsonSchema, Deserialize, Debug, Default)]
pub struct Input {
    /// The table to query, as returned by `list_tables`
    pub collection_name: String,

    /// How many rows to return. Defaults to 10.
    #[serde(default, deserialize_with = "whole_number")]
    pub first: Option<i64>,

    /// Return rows after this cursor, taken from `pageInfo.endCursor` of a previous page
    #[serde(default)]
    pub after: Option<String>,

    /// A filter in GraphQL syntax, such as `{ status: { eq: "active" } }`
    #[serde(default, rename = "where")]
    pub filter: Option<String>,

    /// An ordering in GraphQL syntax, such as `[{ created_at: DescNullsLast }]`
    #[serde(default)]
    pub order_by: Option<String>,

    /// The fields to select on each row, such as `id name email`. Defaults to `id`.
    #[serde(default)]
    pub fields: Option<String>,
}

impl CollectionQuery {
    pub fn new(executor: Arc<Executor>, naming: Arc<CollectionNaming>) -> Self {
        Self {
            executor,
            naming,
            tool: Tool::new(
                COLLECTION_QUERY_TOOL_NAME,
                "Fetch a page of rows from a table with cursor pagination. Optional `where` and `order_by` take GraphQL syntax and `fields` lists the columns to return (use `get_table_info` to find them). The result includes `pageInfo` for fetching further pages and the `totalCount` of matching rows.",
                schema_from_type!(Input),
            ),
        }
    }

    pub(super) async fn call(&self, arguments: Option<JsonObject>) -> Result<Value, ToolError> {
        self.execute(parse_input(arguments)?).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self, input: Input) -> Result<Value, ToolError> {
        let request = collection_request(&self.naming, &input)?;
        Ok(self.executor.execute(&request).await?)
    }
}

/// Build the request fetching one page of a collection.
///
/// Optional arguments that were not given, or are blank, are left out of the query
/// entirely rather than sent as `null`.
pub fn collection_request(
    naming: &CollectionNaming,
    input: &Input,
) -> Result<Request, ToolError> {
    let table = require_non_empty("collection_name", &input.collection_name)?;
    if !is_name(table) {
        return Err(ToolError::Parameter(format!(
            "collection_name '{table}' is not a valid GraphQL name"
        )));
    }

    let first = input.first.unwrap_or(DEFAULT_PAGE_SIZE);
    if first < 1 {
        return Err(ToolError::Parameter(format!(
            "first must be at least 1, got {first}"
        )));
    }

    let mut arguments = vec![format!("first: {first}")];
    if let Some(after) = non_blank(&input.after) {
        arguments.push(format!("after: {}", string_literal(after)));
    }
    if let Some(filter) = non_blank(&input.filter) {
        arguments.push(format!("where: {filter}"));
    }
    if let Some(order_by) = non_blank(&input.order_by) {
        arguments.push(format!("orderBy: {order_by}"));
    }
    let fields = non_blank(&input.fields).unwrap_or(DEFAULT_NODE_FIELDS);

    let field = naming.collection_field(table);
    let operation_name = operation_name(&field);
    let query = [
        format!("query {operation_name} {{"),
        format!("  {field}({}) {{", arguments.join(", ")),
        "    edges {".to_string(),
        "      node {".to_string(),
        format!("        {fields}"),
        "      }".to_string(),
        "      cursor".to_string(),
        "    }".to_string(),
        "    pageInfo {".to_string(),
        "      hasNextPage".to_string(),
        "      hasPreviousPage".to_string(),
        "      startCursor".to_string(),
        "      endCursor".to_string(),
        "    }".to_string(),
        "    totalCount".to_string(),
        "  }".to_string(),
        "}".to_string(),
    ]
    .join("\n");

    Ok(Request::new(query).with_operation_name(Some(operation_name)))
}

/// Largest integer an `f64` holds exactly
const MAX_EXACT_FLOAT: f64 = 9_007_199_254_740_992.0;

/// An integer that may arrive as a float with no fractional part, such as `10.0`
fn whole_number<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    number
        .as_i64()
        .or_else(|| {
            number
                .as_f64()
                .filter(|float| float.fract() == 0.0 && float.abs() <= MAX_EXACT_FLOAT)
                .map(|float| float as i64)
        })
        .map(Some)
        .ok_or_else(|| D::Error::custom(format!("expected a whole number, got {number}")))
}

/// `usersCollection` → `GetUsersCollection`
fn operation_name(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => format!("Get{}{}", first.to_uppercase(), chars.as_str()),
        None => "Get".to_string(),
    }
}

/// Whether `name` matches the GraphQL name grammar `[_A-Za-z][_0-9A-Za-z]*`
fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Quote a value as a GraphQL string literal
fn string_literal(value: &str) -> String {
    let mut literal = String::with_capacity(value.len() + 2);
    literal.push('"');
    for c in value.chars() {
        match c {
            '"' => literal.push_str("\\\""),
            '\\' => literal.push_str("\\\\"),
            '\n' => literal.push_str("\\n"),
            '\r' => literal.push_str("\\r"),
            '\t' => literal.push_str("\\t"),
            '\u{08}' => literal.push_str("\\b"),
            '\u{0C}' => literal.push_str("\\f"),
            c if c.is_control() => literal.push_str(&format!("\\u{:04X}", u32::from(c))),
            c => literal.push(c),
        }
    }
    literal.push('"');
    literal
}
