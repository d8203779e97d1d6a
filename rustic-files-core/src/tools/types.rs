use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::Result;

/// Outcome of a tool call as seen by a client. Handler failures are carried
/// here as `{"error": ...}` payloads rather than as protocol errors.
#[derive(Debug, Clone)]
pub struct ToolResult {
    pub success: bool,
    pub payload: Value,
}

impl ToolResult {
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: json!({ "error": message.into() }),
        }
    }

    pub fn is_error(&self) -> bool {
        !self.success
    }

    /// Shapes the result as a `tools/call` response body.
    pub fn into_call_result(self) -> Value {
        let text = serde_json::to_string_pretty(&self.payload)
            .unwrap_or_else(|_| self.payload.to_string());
        json!({
            "content": [{ "type": "text", "text": text }],
            "structuredContent": self.payload,
            "isError": !self.success,
        })
    }
}

#[async_trait]
pub trait Tool: Send + Sync {
    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn schema(&self) -> &Value;
    async fn execute(&self, args: Value) -> Result<Value>;
}
