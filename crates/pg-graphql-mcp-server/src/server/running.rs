use std::time::Instant;

use rmcp::model::{
    CallToolRequestParam, CallToolResult, ErrorCode, Implementation, JsonObject,
    ListToolsResult, PaginatedRequestParam, ServerCapabilities, ServerInfo, ToolsCapability,
};
use rmcp::{RoleServer, ServerHandler, service::RequestContext};
use tracing::debug;
use url::Url;

use crate::errors::McpError;
use crate::tools::{Toolbox, into_call_tool_result};

#[derive(Clone)]
pub(super) struct Running {
    pub(super) toolbox: Toolbox,
    pub(super) endpoint: Url,
}

impl Running {
    async fn call_tool_impl(
        &self,
        name: &str,
        arguments: Option<JsonObject>,
    ) -> Result<CallToolResult, McpError> {
        let start = Instant::now();
        let result = self
            .toolbox
            .call(name, arguments)
            .await
            .map(into_call_tool_result)
            .ok_or_else(|| tool_not_found(name));

        debug!(
            elapsed = ?start.elapsed(),
            success = result.as_ref().is_ok_and(|r| r.is_error != Some(true)),
            "Tool call finished"
        );
        result
    }

    fn list_tools_impl(&self) -> ListToolsResult {
        ListToolsResult {
            meta: None,
            next_cursor: None,
            tools: self.toolbox.tools(),
        }
    }
}

impl ServerHandler for Running {
    #[tracing::instrument(skip_all, fields(tool_name = request.name.as_ref(), request_id = %context.id))]
    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> Result<CallToolResult, McpError> {
        self.call_tool_impl(&request.name, request.arguments).await
    }

    #[tracing::instrument(skip_all)]
    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> Result<ListToolsResult, McpError> {
        Ok(self.list_tools_impl())
    }

    fn get_info(&self) -> ServerInfo {
        let capabilities = ServerCapabilities {
            tools: Some(ToolsCapability { list_changed: None }),
            ..Default::default()
        };

        ServerInfo {
            server_info: Implementation {
                name: "PostgreSQL GraphQL MCP Server".to_string(),
                description: None,
                icons: None,
                title: Some("PostgreSQL GraphQL MCP Server".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                website_url: None,
            },
            capabilities,
            instructions: Some(format!(
                "Tools to explore and query the PostgreSQL database behind the GraphQL API at {}. Start with `list_tables`, inspect a table with `get_table_info`, then read rows with `execute_collection_query` or write your own query with `graphql_query`.",
                self.endpoint
            )),
            ..Default::default()
        }
    }
}

fn tool_not_found(name: &str) -> McpError {
    McpError::new(
        ErrorCode::METHOD_NOT_FOUND,
        format!("Tool {name} not found"),
        None,
    )
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::{Value, json};

    use super::*;
    use crate::graphql::{Executor, ExecutorConfig};
    use crate::naming::CollectionNaming;
    use crate::tools::ErrorEnvelope;

    fn running(endpoint: &str) -> Running {
        let endpoint: Url = endpoint.parse().unwrap();
        let executor = Executor::new(ExecutorConfig::new(endpoint.clone())).unwrap();
        Running {
            toolbox: Toolbox::new(Arc::new(executor), CollectionNaming::default()),
            endpoint,
        }
    }

    fn text(result: &CallToolResult) -> Value {
        serde_json::from_str(&result.content[0].as_text().unwrap().text).unwrap()
    }

    #[tokio::test]
    async fn unknown_tool_is_a_protocol_error() {
        let error = running("http://localhost:3001/rpc/graphql")
            .call_tool_impl("drop_table", None)
            .await
            .unwrap_err();

        assert_eq!(error.code.0, ErrorCode::METHOD_NOT_FOUND.0);
        assert_eq!(error.message, "Tool drop_table not found");
    }

    #[tokio::test]
    async fn bad_arguments_are_an_error_result() {
        let arguments = json!({ "collection_name": "users", "first": 0 })
            .as_object()
            .cloned();

        let result = running("http://localhost:3001/rpc/graphql")
            .call_tool_impl("execute_collection_query", arguments)
            .await
            .unwrap();

        assert_eq!(result.is_error, Some(true));
        let envelope: ErrorEnvelope = serde_json::from_value(text(&result)).unwrap();
        assert_eq!(envelope.error, "first must be at least 1, got 0");
        assert_eq!(envelope.detail, Some(json!({ "kind": "parameter_error" })));
    }

    #[tokio::test]
    async fn success_is_the_response_as_text() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/")
            .with_status(200)
            .with_body(r#"{"data":{"x":1}}"#)
            .create_async()
            .await;

        let arguments = json!({ "query": "{ x }" }).as_object().cloned();
        let result = running(&server.url())
            .call_tool_impl("graphql_query", arguments)
            .await
            .unwrap();

        assert_ne!(result.is_error, Some(true));
        assert_eq!(text(&result), json!({ "data": { "x": 1 } }));
    }

    #[test]
    fn lists_tools_with_object_schemas() {
        let result = running("http://localhost:3001/rpc/graphql").list_tools_impl();

        assert_eq!(result.tools.len(), 5);
        for tool in &result.tools {
            assert_eq!(
                tool.input_schema.get("type"),
                Some(&json!("object")),
                "{}",
                tool.name
            );
            assert!(tool.description.is_some());
        }
    }

    #[test]
    fn info_advertises_tools_and_endpoint() {
        let info = running("http://db.internal:3001/rpc/graphql").get_info();

        assert!(info.capabilities.tools.is_some());
        assert!(
            info.instructions
                .unwrap_or_default()
                .contains("http://db.internal:3001/rpc/graphql")
        );
    }
}
