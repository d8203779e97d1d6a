use std::fs;
use std::io::Read;
use std::path::Path;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Error, Result};
use crate::files::info::{FileInfo, FolderSummary};
use crate::files::paths::resolve_path;
use crate::files::walk::walk_entries;
use crate::files::FileManager;

#[derive(Debug, Clone, Deserialize)]
pub struct StatsRequest {
    pub file_path: String,
    #[serde(default)]
    pub include_hash: bool,
}

impl StatsRequest {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            include_hash: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FileStats {
    #[serde(flatten)]
    pub info: FileInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<FolderSummary>,
}

impl FileManager {
    pub fn stats(&self, request: &StatsRequest) -> Result<FileStats> {
        let path = resolve_path(&request.file_path)?;
        let info = FileInfo::read(&path)?;

        let sha256 = if request.include_hash && !info.is_dir {
            Some(self.sha256_file(&path)?)
        } else {
            None
        };

        let summary = if info.is_dir {
            let children = walk_entries(&path, self.walk_options(false, true))?
                .iter()
                .map(|child| FileInfo::read(child))
                .collect::<Result<Vec<_>>>()?;
            Some(FolderSummary::summarize(&path, &children))
        } else {
            None
        };

        Ok(FileStats {
            info,
            sha256,
            summary,
        })
    }

    fn sha256_file(&self, path: &Path) -> Result<String> {
        let metadata = fs::metadata(path).map_err(|err| {
            Error::Tool(format!(
                "failed to read metadata '{}': {err}",
                path.display()
            ))
        })?;
        let limit = self.limits().max_hash_bytes;
        if metadata.len() > limit {
            return Err(Error::Tool(format!(
                "file '{}' is too large to hash safely ({} bytes, limit {limit} bytes)",
                path.display(),
                metadata.len(),
            )));
        }

        let mut file = fs::File::open(path)
            .map_err(|err| Error::Tool(format!("failed to open '{}': {err}", path.display())))?;
        let mut hasher = Sha256::new();
        let mut buffer = [0u8; 8192];
        loop {
            let read = file.read(&mut buffer).map_err(|err| {
                Error::Tool(format!(
                    "failed to read '{}' for hashing: {err}",
                    path.display()
                ))
            })?;
            if read == 0 {
                break;
            }
            hasher.update(&buffer[..read]);
        }

        Ok(format!("{:x}", hasher.finalize()))
    }
}
