use std::path::{Component, Path, PathBuf};

use crate::error::{Error, Result};

/// Drops `.` components and resolves `..` lexically, without touching the
/// filesystem, so paths that do not exist yet can still be validated.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut normalized = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                let _ = normalized.pop();
            }
            _ => normalized.push(component.as_os_str()),
        }
    }
    normalized
}

fn expand_home(raw: &str) -> PathBuf {
    let home = std::env::var_os("HOME").map(PathBuf::from);
    match (raw, home) {
        ("~", Some(home)) => home,
        (value, Some(home)) if value.starts_with("~/") => home.join(&value[2..]),
        (value, _) => PathBuf::from(value),
    }
}

/// Resolves a caller-supplied path against the current directory.
pub fn resolve_path(raw: &str) -> Result<PathBuf> {
    let cwd = std::env::current_dir()
        .map_err(|err| Error::Tool(format!("failed to resolve current directory: {err}")))?;
    resolve_path_from(raw, &cwd)
}

pub fn resolve_path_from(raw: &str, base: &Path) -> Result<PathBuf> {
    if raw.trim().is_empty() {
        return Err(Error::Validation("path must be non-empty".to_owned()));
    }

    let expanded = expand_home(raw);
    let absolute = if expanded.is_absolute() {
        expanded
    } else {
        base.join(expanded)
    };
    Ok(normalize_path(&absolute))
}

/// Fails with `NotFound` unless something exists at `path`.
pub fn require_existing(path: &Path) -> Result<()> {
    if std::fs::symlink_metadata(path).is_err() {
        return Err(Error::NotFound(format!(
            "path '{}' does not exist",
            path.display()
        )));
    }
    Ok(())
}

pub fn require_directory(path: &Path) -> Result<()> {
    require_existing(path)?;
    if !path.is_dir() {
        return Err(Error::Tool(format!(
            "path '{}' is not a directory",
            path.display()
        )));
    }
    Ok(())
}

pub fn file_name_of(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
