//! MCP server implementation using pmcp.
//!
//! Tools from the [`ToolRegistry`] are exposed over stdio or streamable HTTP.
//! Failures reach the client as JSON-RPC errors whose message is the
//! serialized [`ErrorEnvelope`](crate::error::ErrorEnvelope).

use crate::api::TrainerCentralApi;
use crate::client::TrainerCentralClient;
use crate::error::{ErrorKind, TcError};
use crate::mcp::tools::ToolRegistry;
use async_trait::async_trait;
use pmcp::{
    server::streamable_http_server::StreamableHttpServer, Error, RequestHandlerExtra, Server,
    ServerCapabilities, ToolHandler, ToolInfo,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// Name reported in the MCP `initialize` handshake
pub const SERVER_NAME: &str = "trainercentral";

/// The MCP server for TrainerCentral
#[derive(Debug)]
pub struct McpServer {
    server: Arc<Mutex<Server>>,
}

impl McpServer {
    /// Create a server exposing every tool in `tools`
    pub fn new(tools: ToolRegistry) -> Result<Self, pmcp::Error> {
        let server = Self::build_server_impl(tools)?;
        Ok(Self {
            server: Arc::new(Mutex::new(server)),
        })
    }

    /// Create a server with the full tool catalog over `client`
    pub fn from_client(client: Arc<TrainerCentralClient>) -> Result<Self, pmcp::Error> {
        let api = TrainerCentralApi::new(client);
        Self::new(ToolRegistry::new(&api))
    }

    fn build_server_impl(tools: ToolRegistry) -> Result<Server, pmcp::Error> {
        let mut builder = Server::builder()
            .name(SERVER_NAME)
            .version(env!("CARGO_PKG_VERSION"))
            .capabilities(ServerCapabilities::default());

        for tool in tools.all() {
            let tool_handler = ToolWrapper {
                name: tool.name.clone(),
                description: Some(tool.description.clone()),
                input_schema: tool.input_schema.clone(),
                handler: tool.handler.clone(),
            };
            builder = builder.tool(tool_handler.name.clone(), tool_handler);
        }

        builder.build()
    }

    /// Run the server in stdio mode, consuming it
    pub async fn run(self) -> Result<(), pmcp::Error> {
        tracing::info!("Starting MCP server in stdio mode");

        // run_stdio() takes ownership of the Server
        let server = Arc::try_unwrap(self.server)
            .map_err(|_| Error::internal("MCP server is already serving over HTTP"))?
            .into_inner();

        server.run_stdio().await
    }

    /// Run the server over streamable HTTP
    pub async fn run_http(&self, addr: &str) -> Result<(SocketAddr, JoinHandle<()>), pmcp::Error> {
        tracing::info!("Starting MCP server in streamable HTTP mode on {}", addr);

        let socket_addr: SocketAddr = addr
            .parse()
            .map_err(|e| Error::invalid_params(format!("Invalid address: {}", e)))?;

        StreamableHttpServer::new(socket_addr, self.server.clone())
            .start()
            .await
    }
}

/// Serialized error envelope carried as the JSON-RPC error message
pub fn envelope_json(err: &TcError) -> String {
    serde_json::to_string(&err.to_envelope()).unwrap_or_else(|_| err.to_string())
}

/// Validation problems are the caller's fault; everything else is internal
pub fn to_mcp_error(err: &TcError) -> Error {
    let message = envelope_json(err);
    match err.kind() {
        ErrorKind::ValidationError => Error::invalid_params(message),
        _ => Error::internal(message),
    }
}

/// Wrapper for adapting our Tool to pmcp's ToolHandler
#[derive(Clone)]
struct ToolWrapper {
    name: String,
    description: Option<String>,
    input_schema: Value,
    handler: Arc<dyn crate::mcp::tools::ToolHandler>,
}

#[async_trait]
impl ToolHandler for ToolWrapper {
    async fn handle(&self, args: Value, _extra: RequestHandlerExtra) -> Result<Value, Error> {
        self.handler.execute(args).await.map_err(|e| {
            tracing::warn!(tool = %self.name, kind = ?e.kind(), "Tool call failed: {}", e);
            to_mcp_error(&e)
        })
    }

    fn metadata(&self) -> Option<ToolInfo> {
        Some(ToolInfo::new(
            self.name.clone(),
            self.description.clone(),
            self.input_schema.clone(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorEnvelope;

    fn client() -> Arc<TrainerCentralClient> {
        let settings = crate::config::Settings::from_lookup(|key| match key {
            "ZOHO_ACCESS_TOKEN" => Some("token".to_string()),
            "TRAINERCENTRAL_ORG_ID" => Some("1".to_string()),
            _ => None,
        })
        .unwrap();
        Arc::new(TrainerCentralClient::new(settings).unwrap())
    }

    #[test]
    fn test_envelope_json_round_trips() {
        let err = TcError::Upstream {
            status: 401,
            message: "INVALID_OAUTHTOKEN".to_string(),
        };
        let envelope: ErrorEnvelope = serde_json::from_str(&envelope_json(&err)).unwrap();
        assert_eq!(envelope.kind, ErrorKind::UpstreamError);
        assert_eq!(envelope.upstream_status_code, Some(401));
    }

    #[test]
    fn test_envelope_for_configuration_error_has_no_status() {
        let err = TcError::Configuration("missing ZOHO_CLIENT_ID".to_string());
        let value: Value = serde_json::from_str(&envelope_json(&err)).unwrap();
        assert_eq!(value["kind"], "configuration_error");
        assert!(value["upstream_status_code"].is_null());
    }

    #[test]
    fn test_server_builds_with_catalog() {
        let client = client();
        assert!(McpServer::from_client(client).is_ok());
    }

    #[tokio::test]
    async fn test_stdio_run_takes_ownership_of_server() {
        let client = client();
        let server = McpServer::from_client(client).unwrap();

        // Serving blocks on stdin; returning early is only acceptable for a
        // transport reason such as EOF, never for a shared server handle.
        match tokio::time::timeout(std::time::Duration::from_millis(500), server.run()).await {
            Err(_elapsed) => {}
            Ok(Ok(())) => {}
            Ok(Err(e)) => assert!(
                !e.to_string().contains("already serving"),
                "stdio serve refused to start: {}",
                e
            ),
        }
    }

    #[tokio::test]
    async fn test_stdio_run_refused_while_serving_http() {
        let client = client();
        let server = McpServer::from_client(client).unwrap();

        let (_addr, handle) = server.run_http("127.0.0.1:0").await.unwrap();
        let err = server.run().await.unwrap_err();
        assert!(err.to_string().contains("already serving"));
        handle.abort();
    }
}
