use std::collections::HashMap;
use std::sync::Arc;

use jsonschema::JSONSchema;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::tools::types::{Tool, ToolResult};

struct RegisteredTool {
    tool: Arc<dyn Tool>,
    validator: JSONSchema,
}

#[derive(Default)]
pub struct ToolRegistry {
    tools: HashMap<String, RegisteredTool>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a tool, compiling its argument schema up front.
    pub fn register(&mut self, tool: Arc<dyn Tool>) -> Result<()> {
        let validator = JSONSchema::compile(tool.schema()).map_err(|err| {
            Error::Config(format!(
                "invalid argument schema for tool '{}': {err}",
                tool.name()
            ))
        })?;
        self.tools
            .insert(tool.name().to_owned(), RegisteredTool { tool, validator });
        Ok(())
    }

    /// Tool definitions in `tools/list` shape, ordered by name.
    pub fn definitions(&self) -> Vec<Value> {
        let mut names = self.tools.keys().collect::<Vec<_>>();
        names.sort_unstable();
        names
            .into_iter()
            .filter_map(|name| self.tools.get(name))
            .map(|entry| {
                json!({
                    "name": entry.tool.name(),
                    "description": entry.tool.description(),
                    "inputSchema": entry.tool.schema(),
                })
            })
            .collect()
    }

    fn validate(entry: &RegisteredTool, args: &Value) -> Result<()> {
        if let Err(errors) = entry.validator.validate(args) {
            return Err(Error::Validation(format!(
                "invalid arguments for '{}': {}",
                entry.tool.name(),
                errors.map(|e| e.to_string()).collect::<Vec<_>>().join(", ")
            )));
        }
        Ok(())
    }

    /// Runs a tool. Only an unknown tool name is an `Err`; validation and
    /// handler failures come back as error results.
    pub async fn call(&self, name: &str, args: Value) -> Result<ToolResult> {
        let entry = self
            .tools
            .get(name)
            .ok_or_else(|| Error::NotFound(format!("unknown tool '{name}'")))?;

        if let Err(err) = Self::validate(entry, &args) {
            debug!(tool = name, "rejected tool arguments: {err}");
            return Ok(ToolResult::error(err.to_string()));
        }

        match entry.tool.execute(args).await {
            Ok(payload) => Ok(ToolResult::ok(payload)),
            Err(err) => {
                warn!(tool = name, "tool call failed: {err}");
                Ok(ToolResult::error(err.to_string()))
            }
        }
    }
}
