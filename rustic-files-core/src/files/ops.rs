use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::files::paths::{require_existing, resolve_path};
use crate::files::{default_true, FileManager};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EntryKind {
    File,
    Directory,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CreateFolderRequest {
    pub folder_path: String,
    #[serde(default = "default_true")]
    pub parents: bool,
    #[serde(default = "default_true")]
    pub exist_ok: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct FolderCreated {
    pub success: bool,
    pub path: String,
    pub created: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DeleteRequest {
    pub path: String,
    #[serde(default)]
    pub recursive: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Deleted {
    pub success: bool,
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
}

/// Arguments shared by copy and move.
#[derive(Debug, Clone, Deserialize)]
pub struct TransferRequest {
    pub source_path: String,
    pub target_path: String,
    #[serde(default)]
    pub overwrite: bool,
}

impl TransferRequest {
    pub fn new(source_path: impl Into<String>, target_path: impl Into<String>) -> Self {
        Self {
            source_path: source_path.into(),
            target_path: target_path.into(),
            overwrite: false,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Transferred {
    pub success: bool,
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bytes_copied: Option<u64>,
}

struct CopyBudget {
    max_depth: usize,
    max_entries: usize,
    entries: usize,
    bytes: u64,
}

fn kind_of(path: &Path) -> Result<EntryKind> {
    let metadata = fs::symlink_metadata(path).map_err(|err| {
        Error::Tool(format!(
            "failed to read metadata for '{}': {err}",
            path.display()
        ))
    })?;
    if metadata.is_dir() {
        Ok(EntryKind::Directory)
    } else {
        Ok(EntryKind::File)
    }
}

fn remove_entry(path: &Path) -> Result<()> {
    let result = match kind_of(path)? {
        EntryKind::Directory => fs::remove_dir_all(path),
        EntryKind::File => fs::remove_file(path),
    };
    result.map_err(|err| Error::Tool(format!("failed to remove '{}': {err}", path.display())))
}

/// Best-effort removal used while rolling back a failed transfer.
fn discard(path: &Path) {
    if fs::symlink_metadata(path).is_err() {
        return;
    }
    if let Err(err) = remove_entry(path) {
        warn!(path = %path.display(), "failed to clean up: {err}");
    }
}

fn create_parent(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|err| {
            Error::Tool(format!(
                "failed to create destination parent '{}': {err}",
                parent.display()
            ))
        })?;
    }
    Ok(())
}

// EXDEV on unix, ERROR_NOT_SAME_DEVICE on windows.
#[cfg(not(windows))]
const CROSS_DEVICE_ERROR: i32 = 18;
#[cfg(windows)]
const CROSS_DEVICE_ERROR: i32 = 17;

fn is_cross_device(err: &io::Error) -> bool {
    err.raw_os_error() == Some(CROSS_DEVICE_ERROR)
}

/// Free sibling name used to hold an occupied target while it is replaced.
fn set_aside_path(target: &Path) -> Result<PathBuf> {
    let parent = target.parent().unwrap_or_else(|| Path::new("."));
    let name = target
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    (0..64)
        .map(|attempt| parent.join(format!(".{name}.replaced-{}-{attempt}", std::process::id())))
        .find(|candidate| fs::symlink_metadata(candidate).is_err())
        .ok_or_else(|| {
            Error::Tool(format!(
                "no free name to set aside '{}' while replacing it",
                target.display()
            ))
        })
}

/// Runs `place` with the existing `target` moved aside. The old entry is
/// deleted once `place` succeeds and put back when it fails.
fn replace_with<T>(target: &Path, place: impl FnOnce() -> Result<T>) -> Result<T> {
    let aside = set_aside_path(target)?;
    fs::rename(target, &aside).map_err(|err| {
        Error::Tool(format!(
            "failed to set aside existing target '{}': {err}",
            target.display()
        ))
    })?;

    match place() {
        Ok(value) => {
            if let Err(err) = remove_entry(&aside) {
                warn!(path = %aside.display(), "replaced entry was left behind: {err}");
            }
            Ok(value)
        }
        Err(err) => {
            discard(target);
            if let Err(restore) = fs::rename(&aside, target) {
                warn!(
                    target = %target.display(),
                    aside = %aside.display(),
                    "failed to restore replaced entry: {restore}"
                );
            }
            Err(err)
        }
    }
}

impl FileManager {
    pub fn create_folder(&self, request: &CreateFolderRequest) -> Result<FolderCreated> {
        let path = resolve_path(&request.folder_path)?;

        if let Ok(metadata) = fs::symlink_metadata(&path) {
            if !metadata.is_dir() {
                return Err(Error::Tool(format!(
                    "'{}' already exists and is not a directory",
                    path.display()
                )));
            }
            if !request.exist_ok {
                return Err(Error::Tool(format!(
                    "directory '{}' already exists",
                    path.display()
                )));
            }
            return Ok(FolderCreated {
                success: true,
                path: path.to_string_lossy().into_owned(),
                created: false,
            });
        }

        let result = if request.parents {
            fs::create_dir_all(&path)
        } else {
            fs::create_dir(&path)
        };
        result.map_err(|err| {
            Error::Tool(format!(
                "failed to create directory '{}': {err}",
                path.display()
            ))
        })?;

        Ok(FolderCreated {
            success: true,
            path: path.to_string_lossy().into_owned(),
            created: true,
        })
    }

    pub fn delete(&self, request: &DeleteRequest) -> Result<Deleted> {
        let path = resolve_path(&request.path)?;
        if path.parent().is_none() {
            return Err(Error::Tool(
                "deleting the filesystem root is not allowed".to_owned(),
            ));
        }
        require_existing(&path)?;

        let kind = kind_of(&path)?;
        match kind {
            EntryKind::Directory if request.recursive => {
                self.enforce_recursive_delete_limits(&path)?;
                fs::remove_dir_all(&path).map_err(|err| {
                    Error::Tool(format!(
                        "failed to delete directory '{}': {err}",
                        path.display()
                    ))
                })?;
            }
            EntryKind::Directory => {
                fs::remove_dir(&path).map_err(|err| {
                    Error::Tool(format!(
                        "failed to delete directory '{}' (set recursive=true for non-empty directories): {err}",
                        path.display()
                    ))
                })?;
            }
            EntryKind::File => {
                fs::remove_file(&path).map_err(|err| {
                    Error::Tool(format!("failed to delete file '{}': {err}", path.display()))
                })?;
            }
        }

        Ok(Deleted {
            success: true,
            path: path.to_string_lossy().into_owned(),
            kind,
        })
    }

    pub fn copy(&self, request: &TransferRequest) -> Result<Transferred> {
        let (source, target, replace) = self.transfer_paths(request)?;
        let kind = kind_of(&source)?;
        create_parent(&target)?;

        let copy = || self.copy_entry(&source, &target, kind);
        let bytes = if replace {
            replace_with(&target, copy)?
        } else {
            copy()?
        };

        Ok(Transferred {
            success: true,
            source: source.to_string_lossy().into_owned(),
            target: target.to_string_lossy().into_owned(),
            kind,
            bytes_copied: Some(bytes),
        })
    }

    pub fn move_entry(&self, request: &TransferRequest) -> Result<Transferred> {
        let (source, target, replace) = self.transfer_paths(request)?;
        let kind = kind_of(&source)?;
        create_parent(&target)?;

        let relocate = || self.relocate(&source, &target, kind, |from, to| fs::rename(from, to));
        if replace {
            replace_with(&target, relocate)?;
        } else {
            relocate()?;
        }

        Ok(Transferred {
            success: true,
            source: source.to_string_lossy().into_owned(),
            target: target.to_string_lossy().into_owned(),
            kind,
            bytes_copied: None,
        })
    }

    /// Renames `source` to `target`. Only a rename that crosses devices
    /// falls back to copy-then-remove; any other failure is returned.
    pub(crate) fn relocate<R>(
        &self,
        source: &Path,
        target: &Path,
        kind: EntryKind,
        rename: R,
    ) -> Result<()>
    where
        R: FnOnce(&Path, &Path) -> io::Result<()>,
    {
        match rename(source, target) {
            Ok(()) => return Ok(()),
            Err(err) if is_cross_device(&err) => {
                debug!(source = %source.display(), "rename crossed devices, copying instead");
            }
            Err(err) => {
                return Err(Error::Tool(format!(
                    "failed to move '{}' -> '{}': {err}",
                    source.display(),
                    target.display()
                )));
            }
        }

        if let Err(err) = self.copy_entry(source, target, kind) {
            discard(target);
            return Err(err);
        }
        let removed = match kind {
            EntryKind::Directory => fs::remove_dir_all(source),
            EntryKind::File => fs::remove_file(source),
        };
        removed.map_err(|err| {
            Error::Tool(format!(
                "failed to remove source '{}' after copy: {err}",
                source.display()
            ))
        })
    }

    /// Copies a file or directory tree, returning the bytes written.
    fn copy_entry(&self, source: &Path, target: &Path, kind: EntryKind) -> Result<u64> {
        match kind {
            EntryKind::Directory => {
                let mut budget = self.copy_budget();
                Self::copy_directory_recursive(source, target, 0, &mut budget)?;
                Ok(budget.bytes)
            }
            EntryKind::File => fs::copy(source, target).map_err(|err| {
                Error::Tool(format!(
                    "failed to copy '{}' -> '{}': {err}",
                    source.display(),
                    target.display()
                ))
            }),
        }
    }

    /// Resolves source and destination for copy/move. A target that is an
    /// existing directory receives the source under its own name. The third
    /// value is true when an existing destination will be replaced, which
    /// needs `overwrite`. Nothing on disk is touched here.
    fn transfer_paths(&self, request: &TransferRequest) -> Result<(PathBuf, PathBuf, bool)> {
        let source = resolve_path(&request.source_path)?;
        let raw_target = resolve_path(&request.target_path)?;
        if fs::symlink_metadata(&source).is_err() {
            return Err(Error::NotFound(format!(
                "source '{}' does not exist",
                source.display()
            )));
        }

        let target = match source.file_name() {
            Some(name) if raw_target.is_dir() && raw_target != source => raw_target.join(name),
            _ => raw_target,
        };

        if target == source {
            return Err(Error::Tool(format!(
                "source and target are the same path '{}'",
                source.display()
            )));
        }
        if source.is_dir() && target.starts_with(&source) {
            return Err(Error::Tool(format!(
                "cannot place directory '{}' inside itself",
                source.display()
            )));
        }
        if source.starts_with(&target) {
            return Err(Error::Tool(format!(
                "target '{}' contains the source '{}'",
                target.display(),
                source.display()
            )));
        }

        let replace = fs::symlink_metadata(&target).is_ok();
        if replace && !request.overwrite {
            return Err(Error::Tool(format!(
                "target '{}' already exists (set overwrite=true to replace it)",
                target.display()
            )));
        }

        Ok((source, target, replace))
    }

    fn copy_budget(&self) -> CopyBudget {
        CopyBudget {
            max_depth: self.limits().max_walk_depth,
            max_entries: self.limits().max_walk_entries,
            entries: 0,
            bytes: 0,
        }
    }

    fn copy_directory_recursive(
        source: &Path,
        destination: &Path,
        depth: usize,
        budget: &mut CopyBudget,
    ) -> Result<()> {
        if depth > budget.max_depth {
            return Err(Error::Tool(format!(
                "directory copy exceeded max depth ({})",
                budget.max_depth
            )));
        }

        fs::create_dir_all(destination).map_err(|err| {
            Error::Tool(format!(
                "failed to create destination directory '{}': {err}",
                destination.display()
            ))
        })?;

        for entry in fs::read_dir(source)
            .map_err(|err| Error::Tool(format!("failed to read '{}': {err}", source.display())))?
        {
            let entry = entry.map_err(|err| {
                Error::Tool(format!(
                    "failed to read directory entry in '{}': {err}",
                    source.display()
                ))
            })?;

            budget.entries += 1;
            if budget.entries > budget.max_entries {
                return Err(Error::Tool(format!(
                    "directory copy exceeded max entries ({})",
                    budget.max_entries
                )));
            }

            let from = entry.path();
            let to = destination.join(entry.file_name());
            let metadata = fs::symlink_metadata(&from).map_err(|err| {
                Error::Tool(format!(
                    "failed to read symlink metadata for '{}': {err}",
                    from.display()
                ))
            })?;
            if metadata.file_type().is_symlink() {
                return Err(Error::Tool(format!(
                    "symlink entries are not supported for recursive copy: '{}'",
                    from.display()
                )));
            }

            if metadata.is_dir() {
                Self::copy_directory_recursive(&from, &to, depth + 1, budget)?;
            } else {
                budget.bytes += fs::copy(&from, &to).map_err(|err| {
                    Error::Tool(format!(
                        "failed to copy '{}' -> '{}': {err}",
                        from.display(),
                        to.display()
                    ))
                })?;
            }
        }

        Ok(())
    }

    fn enforce_recursive_delete_limits(&self, path: &Path) -> Result<()> {
        let max_depth = self.limits().max_walk_depth;
        let max_entries = self.limits().max_walk_entries;
        let mut queue = VecDeque::new();
        queue.push_back((path.to_path_buf(), 0usize));
        let mut entries = 0usize;

        while let Some((current, depth)) = queue.pop_front() {
            if depth > max_depth {
                return Err(Error::Tool(format!(
                    "recursive delete exceeded max depth ({max_depth})"
                )));
            }

            let metadata = fs::symlink_metadata(&current).map_err(|err| {
                Error::Tool(format!(
                    "failed to inspect '{}' during delete safety scan: {err}",
                    current.display()
                ))
            })?;

            entries += 1;
            if entries > max_entries {
                return Err(Error::Tool(format!(
                    "recursive delete exceeded max entries ({max_entries})"
                )));
            }

            if metadata.is_dir() {
                let iter = fs::read_dir(&current).map_err(|err| {
                    Error::Tool(format!(
                        "failed to read '{}' during delete safety scan: {err}",
                        current.display()
                    ))
                })?;
                for entry in iter {
                    let entry = entry.map_err(|err| {
                        Error::Tool(format!(
                            "failed to read entry in '{}' during delete safety scan: {err}",
                            current.display()
                        ))
                    })?;
                    queue.push_back((entry.path(), depth + 1));
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::LimitsConfig;

    fn path_str(path: &Path) -> String {
        path.to_string_lossy().into_owned()
    }

    fn folder_request(path: &Path) -> CreateFolderRequest {
        CreateFolderRequest {
            folder_path: path_str(path),
            parents: true,
            exist_ok: true,
        }
    }

    #[test]
    fn creates_nested_folders_and_tolerates_existing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("new_folder").join("deeper");
        let manager = FileManager::default();

        let created = manager.create_folder(&folder_request(&target)).expect("create");
        assert!(created.created);
        assert!(target.is_dir());

        let again = manager.create_folder(&folder_request(&target)).expect("exists ok");
        assert!(!again.created);

        let mut strict = folder_request(&target);
        strict.exist_ok = false;
        assert!(manager.create_folder(&strict).is_err());
    }

    #[test]
    fn create_without_parents_fails_for_missing_parent() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut request = folder_request(&dir.path().join("a").join("b"));
        request.parents = false;
        assert!(FileManager::default().create_folder(&request).is_err());
        assert!(!dir.path().join("a").exists());
    }

    #[test]
    fn create_over_file_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("taken");
        fs::write(&file, "x").expect("write");
        let error = FileManager::default()
            .create_folder(&folder_request(&file))
            .expect_err("file in the way");
        assert!(error.to_string().contains("not a directory"));
    }

    #[test]
    fn copy_preserves_bytes() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("test.txt");
        let payload = b"test content\n\x00\xffbinary tail".to_vec();
        fs::write(&source, &payload).expect("write");
        let target = dir.path().join("new_folder").join("copied.txt");

        let copied = FileManager::default()
            .copy(&TransferRequest::new(path_str(&source), path_str(&target)))
            .expect("copy");
        assert_eq!(copied.bytes_copied, Some(payload.len() as u64));
        assert_eq!(fs::read(&target).expect("read copy"), payload);
        assert_eq!(fs::read(&source).expect("read source"), payload);
    }

    #[test]
    fn copy_into_existing_directory_keeps_name() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("note.md");
        fs::write(&source, "# note").expect("write");
        let folder = dir.path().join("inbox");
        fs::create_dir(&folder).expect("mkdir");

        let copied = FileManager::default()
            .copy(&TransferRequest::new(path_str(&source), path_str(&folder)))
            .expect("copy");
        assert_eq!(copied.target, path_str(&folder.join("note.md")));
        assert_eq!(fs::read_to_string(folder.join("note.md")).expect("read"), "# note");
    }

    #[test]
    fn copy_refuses_existing_target_without_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("a.txt");
        let target = dir.path().join("b.txt");
        fs::write(&source, "new").expect("write");
        fs::write(&target, "old").expect("write");
        let manager = FileManager::default();

        let mut request = TransferRequest::new(path_str(&source), path_str(&target));
        assert!(manager.copy(&request).is_err());
        assert_eq!(fs::read_to_string(&target).expect("read"), "old");

        request.overwrite = true;
        manager.copy(&request).expect("overwrite copy");
        assert_eq!(fs::read_to_string(&target).expect("read"), "new");
    }

    #[test]
    fn copies_directories_recursively() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("tree");
        fs::create_dir_all(source.join("inner")).expect("mkdir");
        fs::write(source.join("top.txt"), "top").expect("write");
        fs::write(source.join("inner").join("leaf.txt"), "leaf").expect("write");
        let target = dir.path().join("tree-copy");

        let copied = FileManager::default()
            .copy(&TransferRequest::new(path_str(&source), path_str(&target)))
            .expect("copy");
        assert_eq!(copied.kind, EntryKind::Directory);
        assert_eq!(copied.bytes_copied, Some(7));
        assert_eq!(
            fs::read_to_string(target.join("inner").join("leaf.txt")).expect("read"),
            "leaf"
        );
    }

    #[test]
    fn copy_into_own_subtree_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("tree");
        fs::create_dir_all(source.join("inner")).expect("mkdir");
        let error = FileManager::default()
            .copy(&TransferRequest::new(
                path_str(&source),
                path_str(&source.join("inner").join("again")),
            ))
            .expect_err("recursion");
        assert!(error.to_string().contains("inside itself"));
    }

    #[test]
    fn move_preserves_bytes_and_removes_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("copied.txt");
        fs::write(&source, "payload").expect("write");
        let target = dir.path().join("moved.txt");

        let moved = FileManager::default()
            .move_entry(&TransferRequest::new(path_str(&source), path_str(&target)))
            .expect("move");
        assert_eq!(moved.kind, EntryKind::File);
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&target).expect("read"), "payload");
    }

    #[test]
    fn move_missing_source_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let error = FileManager::default()
            .move_entry(&TransferRequest::new(
                path_str(&dir.path().join("ghost")),
                path_str(&dir.path().join("target")),
            ))
            .expect_err("missing");
        assert!(matches!(error, Error::NotFound(_)));
    }

    fn leftovers(dir: &Path) -> Vec<String> {
        fs::read_dir(dir)
            .expect("read dir")
            .map(|entry| entry.expect("entry").file_name().to_string_lossy().into_owned())
            .filter(|name| name.contains(".replaced-"))
            .collect()
    }

    #[test]
    fn overwrite_refuses_target_that_contains_source() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("d");
        let nested = root.join("x").join("x");
        fs::create_dir_all(&nested).expect("mkdir");
        fs::write(nested.join("inner.txt"), "inner").expect("write");
        fs::write(root.join("x").join("sibling.txt"), "sibling").expect("write");
        let manager = FileManager::default();

        let mut request = TransferRequest::new(path_str(&nested), path_str(&root));
        request.overwrite = true;
        let error = manager.move_entry(&request).expect_err("ancestor target");
        assert!(error.to_string().contains("contains the source"));
        assert!(manager.copy(&request).is_err());

        assert_eq!(fs::read_to_string(nested.join("inner.txt")).expect("read"), "inner");
        assert_eq!(
            fs::read_to_string(root.join("x").join("sibling.txt")).expect("read"),
            "sibling"
        );
    }

    #[test]
    fn moves_directories_with_contents() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("tree");
        fs::create_dir_all(source.join("inner")).expect("mkdir");
        fs::write(source.join("inner").join("leaf.txt"), "leaf").expect("write");
        let target = dir.path().join("archive").join("tree");

        let moved = FileManager::default()
            .move_entry(&TransferRequest::new(path_str(&source), path_str(&target)))
            .expect("move");
        assert_eq!(moved.kind, EntryKind::Directory);
        assert!(!source.exists());
        assert_eq!(
            fs::read_to_string(target.join("inner").join("leaf.txt")).expect("read"),
            "leaf"
        );
    }

    #[test]
    fn overwrite_replaces_directory_with_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("a.txt");
        fs::write(&source, "new").expect("write");
        let folder = dir.path().join("inbox");
        fs::create_dir_all(folder.join("a.txt")).expect("mkdir");
        fs::write(folder.join("a.txt").join("old.txt"), "old").expect("write");

        let mut request = TransferRequest::new(path_str(&source), path_str(&folder));
        request.overwrite = true;
        let copied = FileManager::default().copy(&request).expect("copy");
        assert_eq!(copied.target, path_str(&folder.join("a.txt")));
        assert_eq!(fs::read_to_string(folder.join("a.txt")).expect("read"), "new");
        assert!(leftovers(&folder).is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn failed_overwrite_restores_previous_target() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("tree");
        fs::create_dir(&source).expect("mkdir");
        fs::write(source.join("file.txt"), "file").expect("write");
        std::os::unix::fs::symlink(source.join("file.txt"), source.join("link")).expect("link");
        let target = dir.path().join("old");
        fs::create_dir_all(target.join("tree")).expect("mkdir");
        fs::write(target.join("tree").join("keep.txt"), "keep").expect("write");

        let mut request = TransferRequest::new(path_str(&source), path_str(&target));
        request.overwrite = true;

        let error = FileManager::default().copy(&request).expect_err("symlink");
        assert!(error.to_string().contains("symlink"));
        assert_eq!(
            fs::read_to_string(target.join("tree").join("keep.txt")).expect("read"),
            "keep"
        );
        assert!(!target.join("tree").join("file.txt").exists());
        assert!(leftovers(&target).is_empty());
    }

    #[test]
    fn cross_device_rename_falls_back_to_copy() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("tree");
        fs::create_dir(&source).expect("mkdir");
        fs::write(source.join("leaf.txt"), "leaf").expect("write");
        let target = dir.path().join("moved");

        FileManager::default()
            .relocate(&source, &target, EntryKind::Directory, |_, _| {
                Err(io::Error::from_raw_os_error(CROSS_DEVICE_ERROR))
            })
            .expect("fallback");
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(target.join("leaf.txt")).expect("read"), "leaf");
    }

    #[test]
    fn other_rename_errors_are_not_retried_as_copies() {
        let dir = tempfile::tempdir().expect("tempdir");
        let source = dir.path().join("a.txt");
        fs::write(&source, "payload").expect("write");
        let target = dir.path().join("b.txt");

        let error = FileManager::default()
            .relocate(&source, &target, EntryKind::File, |_, _| {
                Err(io::Error::from(io::ErrorKind::PermissionDenied))
            })
            .expect_err("denied");
        assert!(error.to_string().contains("failed to move"));
        assert!(source.exists());
        assert!(!target.exists());
    }

    #[test]
    fn deleting_non_empty_directory_requires_recursive() {
        let dir = tempfile::tempdir().expect("tempdir");
        let folder = dir.path().join("full");
        fs::create_dir(&folder).expect("mkdir");
        fs::write(folder.join("keep.txt"), "keep").expect("write");
        let manager = FileManager::default();

        let mut request = DeleteRequest {
            path: path_str(&folder),
            recursive: false,
        };
        let error = manager.delete(&request).expect_err("non-empty");
        assert!(error.to_string().contains("recursive=true"));
        assert_eq!(fs::read_to_string(folder.join("keep.txt")).expect("read"), "keep");

        request.recursive = true;
        let deleted = manager.delete(&request).expect("recursive delete");
        assert_eq!(deleted.kind, EntryKind::Directory);
        assert!(!folder.exists());
    }

    #[test]
    fn deletes_files_and_rejects_missing_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("gone.txt");
        fs::write(&file, "bye").expect("write");
        let manager = FileManager::default();
        let request = DeleteRequest {
            path: path_str(&file),
            recursive: false,
        };

        assert_eq!(manager.delete(&request).expect("delete").kind, EntryKind::File);
        assert!(matches!(
            manager.delete(&request).expect_err("already gone"),
            Error::NotFound(_)
        ));
    }

    #[test]
    fn refuses_to_delete_root() {
        let error = FileManager::default()
            .delete(&DeleteRequest {
                path: "/".to_owned(),
                recursive: true,
            })
            .expect_err("root");
        assert!(error.to_string().contains("filesystem root"));
    }

    #[test]
    fn recursive_delete_respects_entry_limit() {
        let dir = tempfile::tempdir().expect("tempdir");
        let folder = dir.path().join("many");
        fs::create_dir(&folder).expect("mkdir");
        for index in 0..5 {
            fs::write(folder.join(format!("{index}.txt")), "x").expect("write");
        }
        let manager = FileManager::new(LimitsConfig {
            max_walk_entries: 3,
            ..LimitsConfig::default()
        });

        let error = manager
            .delete(&DeleteRequest {
                path: path_str(&folder),
                recursive: true,
            })
            .expect_err("limit");
        assert!(error.to_string().contains("max entries"));
        assert!(folder.exists());
    }
}
