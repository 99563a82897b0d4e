//! MCP tool to fetch the full schema of the GraphQL API.

use std::sync::Arc;

use rmcp::model::Tool;
use serde_json::{Map, Value};

use super::ToolError;
use crate::graphql::{Executor, Request};

/// The name of the tool to introspect the whole GraphQL schema
pub const INTROSPECTION_TOOL_NAME: &str = "introspection_query";

/// The fragments shared by every introspection document
macro_rules! introspection_fragments {
    () => {
        r#"
fragment FullType on __Type {
  kind
  name
  description
  fields(includeDeprecated: true) {
    name
    description
    args {
      ...InputValue
    }
    type {
      ...TypeRef
    }
    isDeprecated
    deprecationReason
  }
  inputFields {
    ...InputValue
  }
  interfaces {
    ...TypeRef
  }
  enumValues(includeDeprecated: true) {
    name
    description
    isDeprecated
    deprecationReason
  }
  possibleTypes {
    ...TypeRef
  }
}

fragment InputValue on __InputValue {
  name
  description
  type {
    ...TypeRef
  }
  defaultValue
}

fragment TypeRef on __Type {
  kind
  name
  ofType {
    kind
    name
    ofType {
      kind
      name
      ofType {
        kind
        name
        ofType {
          kind
          name
          ofType {
            kind
            name
            ofType {
              kind
              name
              ofType {
                kind
                name
              }
            }
          }
        }
      }
    }
  }
}
"#
    };
}
pub(super) use introspection_fragments;

/// A full introspection of the schema: root types, every type and every directive
pub const INTROSPECTION_QUERY: &str = concat!(
    r#"query IntrospectionQuery {
  __schema {
    queryType {
      name
    }
    mutationType {
      name
    }
    subscriptionType {
      name
    }
    types {
      ...FullType
    }
    directives {
      name
      description
      locations
      args {
        ...InputValue
      }
    }
  }
}
"#,
    introspection_fragments!()
);

/// The request sent for a full introspection
pub(super) fn introspection_request() -> Request {
    Request::new(INTROSPECTION_QUERY).with_operation_name(Some("IntrospectionQuery".to_string()))
}

/// A tool to fetch the complete schema description
#[derive(Clone)]
pub struct IntrospectionQuery {
    pub tool: Tool,
    executor: Arc<Executor>,
}

impl IntrospectionQuery {
    pub fn new(executor: Arc<Executor>) -> Self {
        Self {
            executor,
            tool: Tool::new(
                INTROSPECTION_TOOL_NAME,
                "Get the complete GraphQL schema of the PostgreSQL GraphQL API, including every type, field, argument and directive. The result is large; prefer `list_tables` and `get_table_info` when looking for specific tables.",
                Map::from_iter([("type".to_string(), Value::from("object"))]),
            ),
        }
    }

    #[tracing::instrument(skip(self))]
    pub async fn execute(&self) -> Result<Value, ToolError> {
        Ok(self.executor.execute(&introspection_request()).await?)
    }
}
