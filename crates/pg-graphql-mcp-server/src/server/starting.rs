use std::net::SocketAddr;
use std::sync::Arc;

use rmcp::transport::streamable_http_server::session::local::LocalSessionManager;
use rmcp::transport::{StreamableHttpServerConfig, StreamableHttpService};
use rmcp::{ServiceExt as _, transport::stdio};
use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::errors::ServerError;
use crate::graphql::Executor;
use crate::naming::CollectionNaming;
use crate::server::Transport;
use crate::tools::Toolbox;

use super::{Running, shutdown_signal};

pub(super) struct Starting {
    pub(super) transport: Transport,
    pub(super) executor: Executor,
    pub(super) naming: CollectionNaming,
}

impl Starting {
    /// Serve MCP clients until the transport closes or the process is told to stop
    pub(super) async fn start(self) -> Result<(), ServerError> {
        let endpoint = self.executor.endpoint().clone();
        let toolbox = Toolbox::new(Arc::new(self.executor), self.naming);
        debug!(
            "Exposing tools:\n{}",
            serde_json::to_string_pretty(&toolbox.tools())?
        );

        let running = Running { toolbox, endpoint };

        match self.transport {
            Transport::StreamableHttp {
                address,
                port,
                stateful_mode,
            } => {
                info!(port = ?port, address = ?address, "Starting MCP server in Streamable HTTP mode");
                let listen_address = SocketAddr::new(address, port);
                let service = StreamableHttpService::new(
                    move || Ok(running.clone()),
                    LocalSessionManager::default().into(),
                    StreamableHttpServerConfig {
                        stateful_mode,
                        ..Default::default()
                    },
                );
                let router = axum::Router::new().nest_service("/mcp", service);

                let tcp_listener = TcpListener::bind(listen_address).await?;
                axum::serve(tcp_listener, router)
                    .with_graceful_shutdown(shutdown_signal())
                    .await
                    .inspect_err(|e| error!("Failed to serve MCP server: {e:?}"))
                    .map_err(ServerError::Serve)?;
            }
            Transport::Stdio => {
                info!("Starting MCP server in stdio mode");
                let service = running
                    .serve(stdio())
                    .await
                    .inspect_err(|e| {
                        error!("serving error: {:?}", e);
                    })
                    .map_err(Box::new)?;
                service.waiting().await.map_err(ServerError::StartupError)?;
            }
        }

        Ok(())
    }
}
