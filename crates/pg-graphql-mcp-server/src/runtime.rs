//! Runtime utilities
//!
//! This module is only used by the main binary and provides helper code
//! related to runtime configuration.

mod config;
pub mod logging;
mod parsers;
mod schemas;

use std::path::Path;

pub use config::Config;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Yaml},
};
use pg_graphql_mcp_server::graphql::DEFAULT_ENDPOINT;

/// Prefix of the environment variables holding configuration
const ENV_PREFIX: &str = "PG_GRAPHQL_MCP_";

/// Separator to use when drilling down into nested options in the env figment
const ENV_NESTED_SEPARATOR: &str = "__";

/// The unprefixed variable that also sets the endpoint
const ENDPOINT_ENV: &str = "GRAPHQL_ENDPOINT";

/// Read configuration from environment variables only (when no config file is provided)
#[allow(clippy::result_large_err)]
pub fn read_config_from_env() -> Result<Config, figment::Error> {
    Figment::new()
        .join(Env::prefixed(ENV_PREFIX).split(ENV_NESTED_SEPARATOR))
        .join(endpoint_env())
        .join(Serialized::default("endpoint", DEFAULT_ENDPOINT))
        .extract()
}

/// Read in a config from a YAML file, filling in any missing values from the environment.
///
/// Environment variables take precedence over the file.
#[allow(clippy::result_large_err)]
pub fn read_config(yaml_path: impl AsRef<Path>) -> Result<Config, figment::Error> {
    let content = std::fs::read_to_string(yaml_path.as_ref()).map_err(|e| {
        figment::Error::from(format!(
            "failed to read config file '{}': {}",
            yaml_path.as_ref().display(),
            e
        ))
    })?;

    Figment::new()
        .join(Env::prefixed(ENV_PREFIX).split(ENV_NESTED_SEPARATOR))
        .join(endpoint_env())
        .join(Yaml::string(&content))
        .join(Serialized::default("endpoint", DEFAULT_ENDPOINT))
        .extract()
}

/// Figment provider mapping `GRAPHQL_ENDPOINT` onto the endpoint
fn endpoint_env() -> Env {
    Env::raw()
        .only(&[ENDPOINT_ENV])
        .map(|_| "endpoint".into())
}
