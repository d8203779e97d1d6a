pub mod file_tools;
pub mod registry;
pub mod types;

pub use file_tools::{register_file_tools, FileTool, FileToolKind};
pub use registry::ToolRegistry;
pub use types::{Tool, ToolResult};
