use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};

use crate::error::{Error, Result};
use crate::files::{
    BatchRequest, CreateFolderRequest, DeleteRequest, FileManager, ListRequest, OrganizeRequest,
    SearchRequest, StatsRequest, TransferRequest,
};
use crate::runtime::WorkerPool;
use crate::tools::registry::ToolRegistry;
use crate::tools::types::Tool;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileToolKind {
    List,
    Stats,
    Search,
    CreateFolder,
    Delete,
    Move,
    Copy,
    Batch,
    Organize,
}

impl FileToolKind {
    pub const ALL: [FileToolKind; 9] = [
        FileToolKind::List,
        FileToolKind::Stats,
        FileToolKind::Search,
        FileToolKind::CreateFolder,
        FileToolKind::Delete,
        FileToolKind::Move,
        FileToolKind::Copy,
        FileToolKind::Batch,
        FileToolKind::Organize,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::List => "list_files_and_folders",
            Self::Stats => "get_file_stats",
            Self::Search => "search_files",
            Self::CreateFolder => "create_folder",
            Self::Delete => "delete_item",
            Self::Move => "move_file",
            Self::Copy => "copy_file",
            Self::Batch => "batch_operations",
            Self::Organize => "organize_by_extension",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::List => "List files and folders in a directory with metadata, optional grouping by extension and sorting",
            Self::Stats => "Get detailed metadata for a file or directory, optionally with a SHA-256 hash",
            Self::Search => "Search recursively by name pattern, file content or extension",
            Self::CreateFolder => "Create a folder, including missing parent folders",
            Self::Delete => "Delete a file or folder",
            Self::Move => "Move or rename a file or folder",
            Self::Copy => "Copy a file or folder",
            Self::Batch => "Run several copy, move, delete or create_folder operations in sequence",
            Self::Organize => "Sort the files of a folder into sub-folders named after their extensions",
        }
    }

    pub fn schema(self) -> Value {
        match self {
            Self::List => json!({
                "type": "object",
                "properties": {
                    "folder_path": {"type": "string", "description": "Folder to list"},
                    "recursive": {"type": "boolean", "default": false},
                    "group_by_extension": {"type": "boolean", "default": false},
                    "include_hidden": {"type": "boolean", "default": false},
                    "sort_by": {
                        "type": "string",
                        "enum": ["name", "size", "modified", "created", "extension"],
                        "default": "name"
                    },
                    "sort_order": {"type": "string", "enum": ["asc", "desc"], "default": "asc"}
                },
                "required": ["folder_path"]
            }),
            Self::Stats => json!({
                "type": "object",
                "properties": {
                    "file_path": {"type": "string", "description": "File or folder to inspect"},
                    "include_hash": {"type": "boolean", "default": false}
                },
                "required": ["file_path"]
            }),
            Self::Search => json!({
                "type": "object",
                "properties": {
                    "search_path": {"type": "string", "description": "Folder to search from"},
                    "name_pattern": {"type": "string", "description": "Glob or substring matched against entry names"},
                    "content_search": {"type": "string", "description": "Text that matching files must contain"},
                    "extension": {"type": "string", "description": "Extension with or without the leading dot"},
                    "include_hidden": {"type": "boolean", "default": false},
                    "case_sensitive": {"type": "boolean", "default": false},
                    "max_results": {"type": "integer", "minimum": 1}
                },
                "required": ["search_path"]
            }),
            Self::CreateFolder => json!({
                "type": "object",
                "properties": {
                    "folder_path": {"type": "string"},
                    "parents": {"type": "boolean", "default": true},
                    "exist_ok": {"type": "boolean", "default": true}
                },
                "required": ["folder_path"]
            }),
            Self::Delete => json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string"},
                    "recursive": {"type": "boolean", "default": false}
                },
                "required": ["path"]
            }),
            Self::Move | Self::Copy => json!({
                "type": "object",
                "properties": {
                    "source_path": {"type": "string"},
                    "target_path": {"type": "string"},
                    "overwrite": {"type": "boolean", "default": false}
                },
                "required": ["source_path", "target_path"]
            }),
            Self::Batch => json!({
                "type": "object",
                "properties": {
                    "operations": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "type": {
                                    "type": "string",
                                    "enum": ["copy", "move", "delete", "create_folder"]
                                },
                                "params": {"type": "object"}
                            },
                            "required": ["type", "params"]
                        }
                    },
                    "file_paths": {"type": "array", "items": {"type": "string"}},
                    "target_dir": {"type": "string"},
                    "operation": {"type": "string", "enum": ["copy", "move"], "default": "copy"},
                    "stop_on_error": {"type": "boolean", "default": false}
                }
            }),
            Self::Organize => json!({
                "type": "object",
                "properties": {
                    "source_dir": {"type": "string"},
                    "target_dir": {"type": "string", "description": "Defaults to source_dir"},
                    "move_files": {"type": "boolean", "default": true},
                    "dry_run": {"type": "boolean", "default": false},
                    "include_hidden": {"type": "boolean", "default": false}
                },
                "required": ["source_dir"]
            }),
        }
    }
}

fn parse_args<T: DeserializeOwned>(kind: FileToolKind, args: Value) -> Result<T> {
    serde_json::from_value(args)
        .map_err(|err| Error::Validation(format!("invalid arguments for '{}': {err}", kind.name())))
}

fn to_payload<T: Serialize>(report: T) -> Result<Value> {
    Ok(serde_json::to_value(report)?)
}

/// One filesystem handler exposed as a tool. Work runs on the shared pool.
pub struct FileTool {
    kind: FileToolKind,
    schema: Value,
    files: Arc<FileManager>,
    pool: WorkerPool,
}

impl FileTool {
    pub fn new(kind: FileToolKind, files: Arc<FileManager>, pool: WorkerPool) -> Self {
        Self {
            kind,
            schema: kind.schema(),
            files,
            pool,
        }
    }

    fn run_blocking(kind: FileToolKind, files: &FileManager, args: Value) -> Result<Value> {
        match kind {
            FileToolKind::List => to_payload(files.list(&parse_args::<ListRequest>(kind, args)?)?),
            FileToolKind::Stats => {
                to_payload(files.stats(&parse_args::<StatsRequest>(kind, args)?)?)
            }
            FileToolKind::Search => {
                to_payload(files.search(&parse_args::<SearchRequest>(kind, args)?)?)
            }
            FileToolKind::CreateFolder => {
                to_payload(files.create_folder(&parse_args::<CreateFolderRequest>(kind, args)?)?)
            }
            FileToolKind::Delete => {
                to_payload(files.delete(&parse_args::<DeleteRequest>(kind, args)?)?)
            }
            FileToolKind::Move => {
                to_payload(files.move_entry(&parse_args::<TransferRequest>(kind, args)?)?)
            }
            FileToolKind::Copy => {
                to_payload(files.copy(&parse_args::<TransferRequest>(kind, args)?)?)
            }
            FileToolKind::Batch => to_payload(files.batch(parse_args::<BatchRequest>(kind, args)?)?),
            FileToolKind::Organize => {
                to_payload(files.organize(&parse_args::<OrganizeRequest>(kind, args)?)?)
            }
        }
    }
}

#[async_trait]
impl Tool for FileTool {
    fn name(&self) -> &str {
        self.kind.name()
    }

    fn description(&self) -> &str {
        self.kind.description()
    }

    fn schema(&self) -> &Value {
        &self.schema
    }

    async fn execute(&self, args: Value) -> Result<Value> {
        let kind = self.kind;
        let files = self.files.clone();
        self.pool
            .run(move || Self::run_blocking(kind, &files, args))
            .await
    }
}

/// Registers every file tool against one manager and pool.
pub fn register_file_tools(
    registry: &mut ToolRegistry,
    files: Arc<FileManager>,
    pool: WorkerPool,
) -> Result<()> {
    for kind in FileToolKind::ALL {
        registry.register(Arc::new(FileTool::new(kind, files.clone(), pool.clone())))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn registry() -> ToolRegistry {
        let mut registry = ToolRegistry::new();
        register_file_tools(
            &mut registry,
            Arc::new(FileManager::default()),
            WorkerPool::new(2),
        )
        .expect("register");
        registry
    }

    #[test]
    fn registry_lists_every_tool_once() {
        let definitions = registry().definitions();
        let listed = definitions
            .iter()
            .filter_map(|definition| definition["name"].as_str())
            .collect::<Vec<_>>();
        let mut expected = FileToolKind::ALL.map(FileToolKind::name).to_vec();
        expected.sort_unstable();
        assert_eq!(listed, expected);
        assert_eq!(definitions[0]["name"], "batch_operations");
    }

    #[tokio::test]
    async fn copy_then_list_through_registry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("notes.txt");
        fs::write(&source, "hello").expect("write");
        let registry = registry();

        let copied = registry
            .call(
                "copy_file",
                json!({
                    "source_path": source.to_string_lossy(),
                    "target_path": dir.path().join("copy.txt").to_string_lossy()
                }),
            )
            .await
            .expect("call");
        assert!(copied.success, "{}", copied.payload);
        assert_eq!(copied.payload["bytes_copied"], 5);

        let listing = registry
            .call(
                "list_files_and_folders",
                json!({"folder_path": dir.path().to_string_lossy()}),
            )
            .await
            .expect("call");
        let names = listing.payload["items"]
            .as_array()
            .expect("items")
            .iter()
            .filter_map(|item| item["name"].as_str())
            .collect::<Vec<_>>();
        assert_eq!(names, vec!["copy.txt", "notes.txt"]);
    }

    #[tokio::test]
    async fn missing_path_is_an_error_payload() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = registry()
            .call(
                "get_file_stats",
                json!({"file_path": dir.path().join("ghost").to_string_lossy()}),
            )
            .await
            .expect("call");
        assert!(result.is_error());
        assert!(result.payload["error"].as_str().is_some());
    }

    #[tokio::test]
    async fn bad_enum_value_is_rejected_before_running() {
        let dir = tempfile::tempdir().expect("tempdir");
        let result = registry()
            .call(
                "list_files_and_folders",
                json!({"folder_path": dir.path().to_string_lossy(), "sort_by": "color"}),
            )
            .await
            .expect("call");
        assert!(result.is_error());
    }
}
