use std::path::PathBuf;

use clap::Parser;
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use pg_graphql_mcp_server::server::Server;
use runtime::logging::{Logging, LoggingLayerBuilder};
use tracing::info;
use tracing_subscriber::Registry;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

mod runtime;

/// Clap styling
const STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

/// Arguments to the MCP server
#[derive(Debug, Parser)]
#[command(
    version,
    styles = STYLES,
    about = "PostgreSQL GraphQL MCP Server - explore and query a PostgreSQL database from an AI agent",
)]
struct Args {
    /// Path to the config file
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = match Args::parse().config {
        Some(config_path) => runtime::read_config(config_path)?,
        None => runtime::read_config_from_env()?,
    };

    let (logging_layer, _guard) = LoggingLayerBuilder::new().build(&config.logging);
    Registry::default()
        .with(logging_layer)
        .with(Logging::env_filter(&config.logging)?)
        .try_init()?;

    info!(
        "PostgreSQL GraphQL MCP Server v{} // querying {}",
        env!("CARGO_PKG_VERSION"),
        config.endpoint
    );

    Ok(Server::builder()
        .transport(config.transport)
        .endpoint(config.endpoint)
        .timeout(config.timeout)
        .headers(config.headers)
        .naming(config.naming)
        .build()
        .start()
        .await?)
}
