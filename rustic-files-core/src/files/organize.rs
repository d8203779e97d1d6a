use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::files::info::{extension_of, NO_EXTENSION};
use crate::files::ops::EntryKind;
use crate::files::paths::{file_name_of, require_directory, resolve_path};
use crate::files::walk::walk_entries;
use crate::files::{default_true, FileManager};

#[derive(Debug, Clone, Deserialize)]
pub struct OrganizeRequest {
    pub source_dir: String,
    #[serde(default)]
    pub target_dir: Option<String>,
    #[serde(default = "default_true")]
    pub move_files: bool,
    #[serde(default)]
    pub dry_run: bool,
    #[serde(default)]
    pub include_hidden: bool,
}

impl OrganizeRequest {
    pub fn new(source_dir: impl Into<String>) -> Self {
        Self {
            source_dir: source_dir.into(),
            target_dir: None,
            move_files: true,
            dry_run: false,
            include_hidden: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum OrganizeAction {
    Move,
    Copy,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizeError {
    pub file: String,
    pub error: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct OrganizeReport {
    pub source_dir: String,
    pub target_dir: String,
    pub action: OrganizeAction,
    pub dry_run: bool,
    pub groups: BTreeMap<String, Vec<String>>,
    pub processed: usize,
    pub failed: usize,
    pub errors: Vec<OrganizeError>,
}

/// Folder a file lands in: its extension without the dot, or `no_extension`.
fn folder_for(extension: &str) -> String {
    if extension.is_empty() {
        NO_EXTENSION.to_owned()
    } else {
        extension.trim_start_matches('.').to_owned()
    }
}

impl FileManager {
    fn place(&self, source: &Path, destination: &Path, action: OrganizeAction) -> Result<()> {
        if fs::symlink_metadata(destination).is_ok() {
            return Err(Error::Tool(format!(
                "destination '{}' already exists",
                destination.display()
            )));
        }
        if let Some(parent) = destination.parent() {
            fs::create_dir_all(parent).map_err(|err| {
                Error::Tool(format!(
                    "failed to create folder '{}': {err}",
                    parent.display()
                ))
            })?;
        }

        match action {
            OrganizeAction::Copy => fs::copy(source, destination).map(|_| ()).map_err(|err| {
                Error::Tool(format!(
                    "failed to copy '{}' to '{}': {err}",
                    source.display(),
                    destination.display()
                ))
            }),
            OrganizeAction::Move => {
                self.relocate(source, destination, EntryKind::File, |from, to| {
                    fs::rename(from, to)
                })
            }
        }
    }

    /// Sorts the top-level files of `source_dir` into per-extension folders.
    pub fn organize(&self, request: &OrganizeRequest) -> Result<OrganizeReport> {
        let source_dir = resolve_path(&request.source_dir)?;
        require_directory(&source_dir)?;
        let target_dir = match request.target_dir.as_deref() {
            Some(raw) if !raw.trim().is_empty() => resolve_path(raw)?,
            _ => source_dir.clone(),
        };
        let action = if request.move_files {
            OrganizeAction::Move
        } else {
            OrganizeAction::Copy
        };

        let mut plan: Vec<(PathBuf, PathBuf, String)> = Vec::new();
        let mut groups: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for path in walk_entries(&source_dir, self.walk_options(false, request.include_hidden))? {
            if path.is_dir() {
                continue;
            }
            let folder = folder_for(&extension_of(&path));
            let name = file_name_of(&path);
            let destination = target_dir.join(&folder).join(&name);
            groups.entry(folder).or_default().push(name.clone());
            plan.push((path, destination, name));
        }

        let mut report = OrganizeReport {
            source_dir: source_dir.to_string_lossy().into_owned(),
            target_dir: target_dir.to_string_lossy().into_owned(),
            action,
            dry_run: request.dry_run,
            groups,
            processed: 0,
            failed: 0,
            errors: Vec::new(),
        };
        if request.dry_run {
            return Ok(report);
        }

        for (source, destination, name) in plan {
            match self.place(&source, &destination, action) {
                Ok(()) => report.processed += 1,
                Err(err) => {
                    warn!(file = %name, "organize skipped file: {err}");
                    report.failed += 1;
                    report.errors.push(OrganizeError {
                        file: name,
                        error: err.to_string(),
                    });
                }
            }
        }

        info!(
            source = %report.source_dir,
            processed = report.processed,
            failed = report.failed,
            "organized files by extension"
        );
        Ok(report)
    }
}
