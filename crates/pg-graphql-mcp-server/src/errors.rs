use std::fmt;
use tokio::task::JoinError;

/// An error in server initialization
#[derive(Debug)]
pub enum ServerError {
    HttpClient(reqwest::Error),
    Json(serde_json::Error),
    Bind(std::io::Error),
    Serve(std::io::Error),
    StartupError(JoinError),
    McpInitializeError(Box<rmcp::service::ServerInitializeError>),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServerError::HttpClient(e) => write!(f, "Could not build the HTTP client: {}", e),
            ServerError::Json(e) => write!(f, "Invalid JSON: {}", e),
            ServerError::Bind(e) => write!(f, "Could not bind the listen address: {}", e),
            ServerError::Serve(e) => write!(f, "HTTP server failed: {}", e),
            ServerError::StartupError(e) => write!(f, "Failed to start server: {}", e),
            ServerError::McpInitializeError(e) => {
                write!(f, "Failed to initialize MCP server: {}", e)
            }
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ServerError::HttpClient(e) => Some(e),
            ServerError::Json(e) => Some(e),
            ServerError::Bind(e) | ServerError::Serve(e) => Some(e),
            ServerError::StartupError(e) => Some(e),
            ServerError::McpInitializeError(e) => Some(e.as_ref()),
        }
    }
}

impl From<serde_json::Error> for ServerError {
    fn from(e: serde_json::Error) -> Self {
        ServerError::Json(e)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(e: std::io::Error) -> Self {
        ServerError::Bind(e)
    }
}

impl From<JoinError> for ServerError {
    fn from(e: JoinError) -> Self {
        ServerError::StartupError(e)
    }
}

impl From<Box<rmcp::service::ServerInitializeError>> for ServerError {
    fn from(e: Box<rmcp::service::ServerInitializeError>) -> Self {
        ServerError::McpInitializeError(e)
    }
}

/// An MCP tool error
pub type McpError = rmcp::model::ErrorData;
