pub mod pool;

pub use pool::WorkerPool;

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::files::FileManager;
use crate::tools::{register_file_tools, ToolRegistry};

/// Shared state for one server or CLI invocation.
pub struct Runtime {
    pub config: Config,
    pub pool: WorkerPool,
    pub files: Arc<FileManager>,
    pub tools: Arc<ToolRegistry>,
}

impl Runtime {
    pub fn new(config: Config) -> Result<Self> {
        let pool = WorkerPool::new(config.pool.max_workers);
        let files = Arc::new(FileManager::new(config.limits.clone()));

        let mut registry = ToolRegistry::new();
        register_file_tools(&mut registry, files.clone(), pool.clone())?;

        Ok(Self {
            config,
            pool,
            files,
            tools: Arc::new(registry),
        })
    }
}
