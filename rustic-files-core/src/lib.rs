pub mod config;
pub mod error;
pub mod files;
pub mod logging;
pub mod protocol;
pub mod runtime;
pub mod tools;

pub use config::Config;
pub use error::{Error, Result};
pub use files::FileManager;
pub use protocol::McpServer;
pub use tools::{ToolRegistry, ToolResult};

pub struct RusticFiles {
    runtime: runtime::Runtime,
}

impl RusticFiles {
    pub fn new(config: Config) -> Result<Self> {
        config::validate_config(&config)?;
        let runtime = runtime::Runtime::new(config)?;
        Ok(Self { runtime })
    }

    /// Loads the TOML file at `path` (or defaults when `None`) plus env overrides.
    pub fn from_config_path(path: Option<&std::path::Path>) -> Result<Self> {
        let config = config::load(path)?;
        Self::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.runtime.config
    }

    pub fn runtime(&self) -> &runtime::Runtime {
        &self.runtime
    }

    pub fn files(&self) -> &FileManager {
        &self.runtime.files
    }

    pub fn tool_definitions(&self) -> Vec<serde_json::Value> {
        self.runtime.tools.definitions()
    }

    pub async fn call_tool(&self, name: &str, args: serde_json::Value) -> Result<ToolResult> {
        self.runtime.tools.call(name, args).await
    }

    pub fn server(&self) -> McpServer {
        McpServer::from_runtime(&self.runtime)
    }

    pub async fn serve_stdio(&self) -> Result<()> {
        protocol::serve_stdio(self.server()).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn facade_runs_tools_by_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("a.md"), "# a").expect("write");
        let app = RusticFiles::new(Config::default()).expect("app");

        let result = app
            .call_tool(
                "search_files",
                json!({"search_path": dir.path().to_string_lossy(), "extension": "md"}),
            )
            .await
            .expect("call");
        assert!(result.success);
        assert_eq!(result.payload["count"], 1);
        assert_eq!(app.tool_definitions().len(), 9);
    }

    #[test]
    fn rejects_invalid_config() {
        let mut config = Config::default();
        config.pool.max_workers = 0;
        assert!(matches!(RusticFiles::new(config), Err(Error::Validation(_))));
    }
}
