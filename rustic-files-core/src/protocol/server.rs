use std::sync::Arc;

use serde_json::{json, Value};
use tracing::{debug, info};

use crate::config::schema::ServerConfig;
use crate::protocol::jsonrpc::{Request, Response, RpcError};
use crate::protocol::resources::{self, ResourceProvider};
use crate::runtime::Runtime;
use crate::tools::ToolRegistry;

pub const SUPPORTED_PROTOCOL_VERSIONS: [&str; 3] = ["2024-11-05", "2025-03-26", "2025-06-18"];

/// Method dispatcher for the tool server. Cloning is cheap; each in-flight
/// request holds its own clone.
#[derive(Clone)]
pub struct McpServer {
    info: Arc<ServerConfig>,
    tools: Arc<ToolRegistry>,
    resources: ResourceProvider,
}

impl McpServer {
    pub fn new(info: ServerConfig, tools: Arc<ToolRegistry>, resources: ResourceProvider) -> Self {
        Self {
            info: Arc::new(info),
            tools,
            resources,
        }
    }

    pub fn from_runtime(runtime: &Runtime) -> Self {
        Self::new(
            runtime.config.server.clone(),
            runtime.tools.clone(),
            ResourceProvider::new(runtime.files.clone(), runtime.pool.clone()),
        )
    }

    /// Handles one raw input line. Blank lines and notifications produce no
    /// response.
    pub async fn handle_line(&self, line: &str) -> Option<Response> {
        let line = line.trim();
        if line.is_empty() {
            return None;
        }
        match Request::parse(line) {
            Ok(request) => self.handle(request).await,
            Err(response) => {
                debug!(code = ?response.error_code(), "rejected malformed message");
                Some(response)
            }
        }
    }

    pub async fn handle(&self, request: Request) -> Option<Response> {
        let Some(id) = request.id else {
            debug!(method = %request.method, "notification received");
            return None;
        };

        debug!(method = %request.method, id = %id, "request received");
        let response = match self.dispatch(&request.method, request.params).await {
            Ok(result) => Response::ok(id, result),
            Err(error) => Response::from_error(id, error),
        };
        Some(response)
    }

    async fn dispatch(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        match method {
            "initialize" => Ok(self.initialize(&params)),
            "ping" => Ok(json!({})),
            "tools/list" => Ok(json!({ "tools": self.tools.definitions() })),
            "tools/call" => self.call_tool(params).await,
            "resources/list" => Ok(json!({ "resources": [] })),
            "resources/templates/list" => Ok(json!({ "resourceTemplates": resources::templates() })),
            "resources/read" => {
                let uri = params
                    .get("uri")
                    .and_then(Value::as_str)
                    .ok_or_else(|| RpcError::invalid_params("missing resource 'uri'"))?;
                Ok(self.resources.read(uri).await?)
            }
            other => Err(RpcError::method_not_found(other)),
        }
    }

    fn initialize(&self, params: &Value) -> Value {
        let requested = params.get("protocolVersion").and_then(Value::as_str);
        let version = match requested {
            Some(version) if SUPPORTED_PROTOCOL_VERSIONS.contains(&version) => version,
            _ => self.info.protocol_version.as_str(),
        };
        info!(
            client = params["clientInfo"]["name"].as_str().unwrap_or("unknown"),
            protocol = version,
            "client initialized"
        );

        json!({
            "protocolVersion": version,
            "capabilities": {
                "tools": { "listChanged": false },
                "resources": { "subscribe": false, "listChanged": false }
            },
            "serverInfo": {
                "name": self.info.name,
                "version": self.info.version
            }
        })
    }

    async fn call_tool(&self, mut params: Value) -> Result<Value, RpcError> {
        let name = params
            .get("name")
            .and_then(Value::as_str)
            .map(str::to_owned)
            .ok_or_else(|| RpcError::invalid_params("missing tool 'name'"))?;
        let arguments = match params.get_mut("arguments").map(Value::take) {
            None | Some(Value::Null) => json!({}),
            Some(arguments) => arguments,
        };

        let result = self.tools.call(&name, arguments).await?;
        Ok(result.into_call_result())
    }
}
