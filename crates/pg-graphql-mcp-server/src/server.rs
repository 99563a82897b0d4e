use std::net::{IpAddr, Ipv4Addr};
use std::time::Duration;

use bon::bon;
use reqwest::header::HeaderMap;
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::{error, info};
use url::Url;

use crate::errors::ServerError;
use crate::graphql::{DEFAULT_TIMEOUT, Executor, ExecutorConfig};
use crate::naming::CollectionNaming;

mod running;
mod starting;

use running::Running;
use starting::Starting;

/// A PostgreSQL GraphQL MCP Server
pub struct Server {
    transport: Transport,
    executor: ExecutorConfig,
    naming: CollectionNaming,
}

#[derive(Debug, Clone, Deserialize, Default, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Transport {
    /// Use standard IO for server <> client communication
    #[default]
    Stdio,

    /// Host the MCP server on the configuration, using streamable HTTP messages.
    StreamableHttp {
        /// The IP address to bind to
        #[serde(default = "Transport::default_address")]
        address: IpAddr,

        /// The port to bind to
        #[serde(default = "Transport::default_port")]
        port: u16,

        /// Enable stateful mode for session management
        #[serde(default = "Transport::default_stateful_mode")]
        stateful_mode: bool,
    },
}

impl Transport {
    fn default_address() -> IpAddr {
        IpAddr::V4(Ipv4Addr::LOCALHOST)
    }

    fn default_port() -> u16 {
        8000
    }

    fn default_stateful_mode() -> bool {
        true
    }
}

#[bon]
impl Server {
    #[builder]
    pub fn new(
        transport: Transport,
        endpoint: Url,
        #[builder(default = DEFAULT_TIMEOUT)] timeout: Duration,
        #[builder(default)] headers: HeaderMap,
        #[builder(default)] naming: CollectionNaming,
    ) -> Self {
        Self {
            transport,
            executor: ExecutorConfig {
                endpoint,
                timeout,
                headers,
            },
            naming,
        }
    }

    pub async fn start(self) -> Result<(), ServerError> {
        Starting {
            transport: self.transport,
            executor: Executor::new(self.executor)?,
            naming: self.naming,
        }
        .start()
        .await
    }
}

/// Resolves on Ctrl+C, or on SIGTERM where there is one
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutting down");
}
