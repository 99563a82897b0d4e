use std::time::Duration;

use pg_graphql_mcp_server::naming::CollectionNaming;
use pg_graphql_mcp_server::server::Transport;
use reqwest::header::HeaderMap;
use schemars::JsonSchema;
use serde::Deserialize;
use url::Url;

use super::logging::Logging;
use super::parsers;

/// Configuration for the MCP server
#[derive(Debug, Deserialize, JsonSchema)]
pub struct Config {
    /// The PostgreSQL GraphQL endpoint to query.
    /// Defaults to `http://127.0.0.1:3001/rpc/graphql`, or `GRAPHQL_ENDPOINT` when set.
    pub endpoint: Url,

    /// List of hard-coded headers to include in all GraphQL requests
    #[serde(default, deserialize_with = "parsers::map_from_str")]
    #[schemars(schema_with = "super::schemas::header_map")]
    pub headers: HeaderMap,

    /// How long to wait for a GraphQL response, in time units such as `10s`
    #[serde(
        deserialize_with = "humantime_serde::deserialize",
        default = "defaults::timeout"
    )]
    #[schemars(with = "String")]
    pub timeout: Duration,

    /// How table names map to GraphQL type and field names
    #[serde(default)]
    pub naming: CollectionNaming,

    /// Logging configuration
    #[serde(default)]
    pub logging: Logging,

    /// The type of server transport to use
    #[serde(default)]
    pub transport: Transport,
}

mod defaults {
    use std::time::Duration;

    use pg_graphql_mcp_server::graphql::DEFAULT_TIMEOUT;

    pub(super) fn timeout() -> Duration {
        DEFAULT_TIMEOUT
    }
}
