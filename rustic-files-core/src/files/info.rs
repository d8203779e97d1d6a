use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::SystemTime;

use serde::Serialize;

use crate::error::{Error, Result};
use crate::files::format::{
    created_time, human_size, iso_timestamp, mime_for_extension, modified_time, permission_bits,
    DIRECTORY_MIME,
};
use crate::files::paths::file_name_of;

pub const NO_EXTENSION: &str = "no_extension";

/// Metadata snapshot of one filesystem entry, valid for the instant it was read.
#[derive(Debug, Clone, Serialize)]
pub struct FileInfo {
    pub name: String,
    pub path: String,
    pub size: u64,
    pub size_human: String,
    pub extension: String,
    pub mime_type: String,
    pub is_dir: bool,
    pub created: String,
    pub modified: String,
    pub permissions: String,
    pub parent: String,
    #[serde(skip)]
    pub(crate) created_at: SystemTime,
    #[serde(skip)]
    pub(crate) modified_at: SystemTime,
}

impl FileInfo {
    pub fn read(path: &Path) -> Result<Self> {
        // Broken symlinks still get a record from the link itself.
        let metadata = fs::metadata(path)
            .or_else(|_| fs::symlink_metadata(path))
            .map_err(|err| {
                if err.kind() == std::io::ErrorKind::NotFound {
                    Error::NotFound(format!("path '{}' does not exist", path.display()))
                } else {
                    Error::Tool(format!(
                        "failed to read metadata for '{}': {err}",
                        path.display()
                    ))
                }
            })?;

        let is_dir = metadata.is_dir();
        let extension = if is_dir {
            String::new()
        } else {
            extension_of(path)
        };
        let mime_type = if is_dir {
            DIRECTORY_MIME.to_owned()
        } else {
            mime_for_extension(extension.trim_start_matches('.')).to_owned()
        };
        let created_at = created_time(&metadata);
        let modified_at = modified_time(&metadata);

        Ok(Self {
            name: file_name_of(path),
            path: path.to_string_lossy().into_owned(),
            size: metadata.len(),
            size_human: human_size(metadata.len()),
            extension,
            mime_type,
            is_dir,
            created: iso_timestamp(created_at),
            modified: iso_timestamp(modified_at),
            permissions: permission_bits(&metadata),
            parent: path
                .parent()
                .map(|parent| parent.to_string_lossy().into_owned())
                .unwrap_or_default(),
            created_at,
            modified_at,
        })
    }

    /// Group label: the extension, or [`NO_EXTENSION`].
    pub fn group_key(&self) -> String {
        if self.extension.is_empty() {
            NO_EXTENSION.to_owned()
        } else {
            self.extension.clone()
        }
    }
}

/// Lowercased suffix with its leading dot; empty for dotfiles and bare names.
pub fn extension_of(path: &Path) -> String {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy().to_lowercase()))
        .unwrap_or_default()
}

#[derive(Debug, Clone, Serialize)]
pub struct FileGroup {
    pub extension: String,
    pub count: usize,
    pub total_size: u64,
    pub total_size_human: String,
    pub files: Vec<FileInfo>,
}

impl FileGroup {
    /// Groups files by extension; directories are ignored. Groups come out
    /// ordered by extension, files keep their incoming order.
    pub fn group(items: &[FileInfo]) -> Vec<FileGroup> {
        let mut grouped: BTreeMap<String, Vec<FileInfo>> = BTreeMap::new();
        for item in items.iter().filter(|item| !item.is_dir) {
            grouped.entry(item.group_key()).or_default().push(item.clone());
        }

        grouped
            .into_iter()
            .map(|(extension, files)| {
                let total_size = files.iter().map(|file| file.size).sum();
                FileGroup {
                    extension,
                    count: files.len(),
                    total_size,
                    total_size_human: human_size(total_size),
                    files,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FolderSummary {
    pub path: String,
    pub total_files: usize,
    pub total_dirs: usize,
    pub total_size: u64,
    pub total_size_human: String,
    pub extensions: BTreeMap<String, usize>,
    pub largest_file: Option<FileInfo>,
    pub oldest_file: Option<FileInfo>,
    pub newest_file: Option<FileInfo>,
}

impl FolderSummary {
    pub fn summarize(path: &Path, items: &[FileInfo]) -> Self {
        let files = items.iter().filter(|item| !item.is_dir).collect::<Vec<_>>();
        let total_size = files.iter().map(|file| file.size).sum();

        let mut extensions = BTreeMap::new();
        for file in &files {
            *extensions.entry(file.group_key()).or_insert(0usize) += 1;
        }

        Self {
            path: path.to_string_lossy().into_owned(),
            total_files: files.len(),
            total_dirs: items.len() - files.len(),
            total_size,
            total_size_human: human_size(total_size),
            extensions,
            largest_file: files.iter().max_by_key(|file| file.size).map(|file| (*file).clone()),
            oldest_file: files
                .iter()
                .min_by_key(|file| file.modified_at)
                .map(|file| (*file).clone()),
            newest_file: files
                .iter()
                .max_by_key(|file| file.modified_at)
                .map(|file| (*file).clone()),
        }
    }
}
