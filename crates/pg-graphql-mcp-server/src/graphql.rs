//! Execute GraphQL operations against the configured endpoint

use std::time::Duration;

use reqwest::header::{ACCEPT, CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{StatusCode, redirect};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;
use url::Url;

use crate::errors::ServerError;

/// The endpoint used when none is configured
pub const DEFAULT_ENDPOINT: &str = "http://127.0.0.1:3001/rpc/graphql";

/// The request timeout used when none is configured
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// How much of an undecodable response body is kept for diagnostics
const EXCERPT_CHARS: usize = 200;

/// A GraphQL request as sent over the wire
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Request {
    pub query: String,

    pub variables: Map<String, Value>,

    #[serde(rename = "operationName", skip_serializing_if = "Option::is_none")]
    pub operation_name: Option<String>,
}

impl Request {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            variables: Map::new(),
            operation_name: None,
        }
    }

    pub fn with_variables(mut self, variables: Map<String, Value>) -> Self {
        self.variables = variables;
        self
    }

    pub fn with_operation_name(mut self, operation_name: Option<String>) -> Self {
        self.operation_name = operation_name;
        self
    }
}

/// A GraphQL response, for callers that need to look inside one.
///
/// Both `data` and `errors` may be present when an operation partially succeeds.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Response {
    #[serde(default)]
    pub data: Option<Value>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub errors: Vec<GraphQLError>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

/// An entry of the `errors` array reported by the endpoint
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct GraphQLError {
    pub message: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub locations: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<Value>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<Value>,
}

/// Errors in executing a GraphQL request.
///
/// GraphQL errors reported inside a successful response are not execution errors.
#[derive(Debug, thiserror::Error)]
pub enum ExecutionError {
    /// The request failed before an HTTP status was received, or the body could not be read
    #[error("Network request error: {}", error_chain(.0))]
    Network(#[source] reqwest::Error),

    /// The endpoint answered with a status outside of 2xx
    #[error("HTTP error: {status}{}", body_suffix(.body))]
    Http {
        status: StatusCode,
        body: Option<String>,
    },

    /// The endpoint answered 2xx with a body that is not JSON
    #[error("JSON parsing error: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
        excerpt: String,
    },
}

/// Settings for the executor, resolved once at startup
#[derive(Debug, Clone)]
pub struct ExecutorConfig {
    pub endpoint: Url,
    pub timeout: Duration,
    pub headers: HeaderMap,
}

impl ExecutorConfig {
    pub fn new(endpoint: Url) -> Self {
        Self {
            endpoint,
            timeout: DEFAULT_TIMEOUT,
            headers: HeaderMap::new(),
        }
    }
}

/// Sends GraphQL requests to a single endpoint.
///
/// Holds no mutable state, so one instance can be shared by concurrent tool calls.
/// Every call makes exactly one attempt; retry policy belongs to the caller.
#[derive(Debug, Clone)]
pub struct Executor {
    client: reqwest::Client,
    endpoint: Url,
}

impl Executor {
    pub fn new(config: ExecutorConfig) -> Result<Self, ServerError> {
        let mut headers = config.headers;
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.timeout)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(ServerError::HttpClient)?;

        Ok(Self {
            client,
            endpoint: config.endpoint,
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    /// Execute a request, returning the decoded response body unmodified
    #[tracing::instrument(skip_all, fields(operation_name = request.operation_name.as_deref()))]
    pub async fn execute(&self, request: &Request) -> Result<Value, ExecutionError> {
        debug!(endpoint = %self.endpoint, "Sending GraphQL request");

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(request)
            .send()
            .await
            .map_err(ExecutionError::Network)?;

        let status = response.status();
        let body = response.text().await.map_err(ExecutionError::Network)?;
        debug!(%status, length = body.len(), "Received GraphQL response");

        if !status.is_success() {
            return Err(ExecutionError::Http {
                status,
                body: (!body.is_empty()).then_some(body),
            });
        }

        serde_json::from_str(&body).map_err(|source| ExecutionError::Decode {
            source,
            excerpt: excerpt(&body),
        })
    }
}

/// The start of a response body, cut on a character boundary
pub(crate) fn excerpt(body: &str) -> String {
    match body.char_indices().nth(EXCERPT_CHARS) {
        Some((end, _)) => format!("{}…", body.get(..end).unwrap_or_default()),
        None => body.to_string(),
    }
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_deref()
        .map(|body| format!(" - {body}"))
        .unwrap_or_default()
}

/// An error message followed by the messages of everything that caused it
fn error_chain(error: &dyn std::error::Error) -> String {
    let mut message = error.to_string();
    let mut source = error.source();
    while let Some(cause) = source {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        source = cause.source();
    }
    message
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Matcher;
    use rstest::rstest;
    use serde_json::json;

    fn executor(url: &str) -> Executor {
        Executor::new(ExecutorConfig::new(url.parse().unwrap())).unwrap()
    }

    #[test]
    fn request_omits_missing_operation_name() {
        let request = Request::new("{ x }");
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({ "query": "{ x }", "variables": {} })
        );
    }

    #[test]
    fn request_includes_operation_name_and_variables() {
        let mut variables = Map::new();
        variables.insert("id".to_string(), json!(1));
        let request = Request::new("query GetX($id: Int) { x(id: $id) }")
            .with_variables(variables)
            .with_operation_name(Some("GetX".to_string()));
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            json!({
                "query": "query GetX($id: Int) { x(id: $id) }",
                "variables": { "id": 1 },
                "operationName": "GetX"
            })
        );
    }

    #[test]
    fn response_keeps_data_and_errors_apart() {
        let response: Response = serde_json::from_value(json!({
            "data": { "x": null },
            "errors": [{ "message": "boom", "path": ["x"] }]
        }))
        .unwrap();
        assert_eq!(response.data, Some(json!({ "x": null })));
        assert_eq!(response.errors.len(), 1);
        assert_eq!(response.errors[0].message, "boom");
        assert_eq!(response.errors[0].path, Some(json!(["x"])));
    }

    #[tokio::test]
    async fn returns_response_body_unmodified() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("content-type", "application/json")
            .match_header("accept", "application/json")
            .match_body(Matcher::Json(json!({ "query": "{ x }", "variables": {} })))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"data":{"x":1}}"#)
            .expect(1)
            .create_async()
            .await;

        let result = executor(&server.url())
            .execute(&Request::new("{ x }"))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(result, json!({ "data": { "x": 1 } }));
    }

    #[tokio::test]
    async fn posts_to_the_configured_path() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/rpc/graphql")
            .with_body(r#"{"data":{}}"#)
            .expect(1)
            .create_async()
            .await;

        let result = executor(&format!("{}/rpc/graphql", server.url()))
            .execute(&Request::new("{ __typename }"))
            .await;

        mock.assert_async().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn sends_configured_headers() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/")
            .match_header("x-tenant", "acme")
            .with_body(r#"{"data":{}}"#)
            .expect(1)
            .create_async()
            .await;

        let mut config = ExecutorConfig::new(server.url().parse().unwrap());
        config
            .headers
            .insert("x-tenant", HeaderValue::from_static("acme"));
        let result = Executor::new(config)
            .unwrap()
            .execute(&Request::new("{ x }"))
            .await;

        mock.assert_async().await;
        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn graphql_errors_are_not_execution_errors() {
        let body = json!({ "errors": [{ "message": "Unknown field \"y\"" }] });
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body(body.to_string())
            .create_async()
            .await;

        let result = executor(&server.url())
            .execute(&Request::new("{ y }"))
            .await
            .unwrap();

        assert_eq!(result, body);
    }

    #[rstest]
    #[case(301)]
    #[case(302)]
    #[case(400)]
    #[case(401)]
    #[case(404)]
    #[case(500)]
    #[case(503)]
    #[tokio::test]
    async fn non_success_status_is_http_error(#[case] status: usize) {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(status)
            .with_header("location", "http://127.0.0.1:9/elsewhere")
            .with_body("upstream unhappy")
            .create_async()
            .await;

        let result = executor(&server.url()).execute(&Request::new("{ x }")).await;

        match result {
            Err(ExecutionError::Http {
                status: actual,
                body,
            }) => {
                assert_eq!(actual.as_u16() as usize, status);
                assert_eq!(body.as_deref(), Some("upstream unhappy"));
            }
            other => panic!("expected an HTTP error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn http_error_without_body() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_status(502)
            .create_async()
            .await;

        let error = executor(&server.url())
            .execute(&Request::new("{ x }"))
            .await
            .unwrap_err();

        assert!(matches!(error, ExecutionError::Http { body: None, .. }));
        assert_eq!(error.to_string(), "HTTP error: 502 Bad Gateway");
    }

    #[tokio::test]
    async fn invalid_json_is_decode_error() {
        let mut server = mockito::Server::new_async().await;
        let _mock = server
            .mock("POST", "/")
            .with_body("<html>gateway</html>")
            .create_async()
            .await;

        let error = executor(&server.url())
            .execute(&Request::new("{ x }"))
            .await
            .unwrap_err();

        match error {
            ExecutionError::Decode { excerpt, .. } => assert_eq!(excerpt, "<html>gateway</html>"),
            other => panic!("expected a decode error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn connection_refused_is_network_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        drop(listener);

        let error = executor(&format!("http://{address}"))
            .execute(&Request::new("{ x }"))
            .await
            .unwrap_err();

        assert!(matches!(error, ExecutionError::Network(_)));
        assert!(error.to_string().starts_with("Network request error"));
    }

    #[tokio::test]
    async fn unresponsive_endpoint_times_out() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let address = listener.local_addr().unwrap();
        let hold = tokio::spawn(async move {
            let (_socket, _) = listener.accept().await.unwrap();
            tokio::time::sleep(Duration::from_secs(10)).await;
        });

        let mut config = ExecutorConfig::new(format!("http://{address}").parse().unwrap());
        config.timeout = Duration::from_millis(100);
        let error = Executor::new(config)
            .unwrap()
            .execute(&Request::new("{ x }"))
            .await
            .unwrap_err();

        hold.abort();
        match error {
            ExecutionError::Network(e) => assert!(e.is_timeout()),
            other => panic!("expected a network error, got {other:?}"),
        }
    }

    #[test]
    fn short_bodies_are_kept_whole() {
        assert_eq!(excerpt("not json"), "not json");
        assert_eq!(excerpt(""), "");
    }

    #[test]
    fn long_bodies_are_cut_on_char_boundaries() {
        let body = "é".repeat(EXCERPT_CHARS + 50);
        let cut = excerpt(&body);
        assert_eq!(cut.chars().count(), EXCERPT_CHARS + 1);
        assert!(cut.ends_with('…'));
    }
}
