use std::ops::ControlFlow;
use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::debug;

use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy)]
pub(crate) struct WalkOptions {
    pub recursive: bool,
    pub include_hidden: bool,
    pub max_depth: usize,
    pub max_entries: usize,
    /// Unreadable entries are skipped instead of failing the walk.
    pub skip_errors: bool,
}

/// How a visiting walk ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum WalkEnd {
    Finished,
    /// The visitor asked to stop.
    Stopped,
    /// `max_entries` entries were visited and more remained.
    EntryLimit,
}

/// Hands the entries below `root` (never `root` itself) to `visit` in
/// file-name order, one at a time. Symlinks are reported but not followed.
pub(crate) fn visit_entries<F>(
    root: &Path,
    options: WalkOptions,
    mut visit: F,
) -> Result<WalkEnd>
where
    F: FnMut(PathBuf) -> ControlFlow<()>,
{
    let depth = if options.recursive {
        options.max_depth
    } else {
        1
    };

    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .hidden(!options.include_hidden)
        .follow_links(false)
        .max_depth(Some(depth))
        .sort_by_file_name(|left, right| left.cmp(right));

    let mut seen = 0usize;
    for item in builder.build() {
        let entry = match item {
            Ok(entry) => entry,
            Err(err) if options.skip_errors => {
                debug!(root = %root.display(), "skipping unreadable entry: {err}");
                continue;
            }
            Err(err) => {
                return Err(Error::Tool(format!(
                    "failed to walk '{}': {err}",
                    root.display()
                )));
            }
        };

        if entry.depth() == 0 {
            continue;
        }

        if seen >= options.max_entries {
            return Ok(WalkEnd::EntryLimit);
        }
        seen += 1;
        if visit(entry.into_path()).is_break() {
            return Ok(WalkEnd::Stopped);
        }
    }

    Ok(WalkEnd::Finished)
}

/// Collects every entry below `root`. Going past `max_entries` is an error.
pub(crate) fn walk_entries(root: &Path, options: WalkOptions) -> Result<Vec<PathBuf>> {
    let mut entries = Vec::new();
    let end = visit_entries(root, options, |path| {
        entries.push(path);
        ControlFlow::Continue(())
    })?;

    if end == WalkEnd::EntryLimit {
        return Err(Error::Tool(format!(
            "walking '{}' exceeded max entries ({})",
            root.display(),
            options.max_entries
        )));
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn options(recursive: bool, include_hidden: bool) -> WalkOptions {
        WalkOptions {
            recursive,
            include_hidden,
            max_depth: 32,
            max_entries: 100,
            skip_errors: false,
        }
    }

    fn fixture() -> tempfile::TempDir {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("b.txt"), "b").expect("write");
        fs::write(dir.path().join("a.txt"), "a").expect("write");
        fs::write(dir.path().join(".hidden"), "h").expect("write");
        fs::create_dir(dir.path().join("sub")).expect("mkdir");
        fs::write(dir.path().join("sub").join("nested.txt"), "n").expect("write");
        dir
    }

    fn names(root: &Path, entries: &[PathBuf]) -> Vec<String> {
        entries
            .iter()
            .map(|path| {
                path.strip_prefix(root)
                    .expect("under root")
                    .to_string_lossy()
                    .replace('\\', "/")
            })
            .collect()
    }

    #[test]
    fn shallow_walk_skips_hidden_and_nested() {
        let dir = fixture();
        let entries = walk_entries(dir.path(), options(false, false)).expect("walk");
        assert_eq!(names(dir.path(), &entries), vec!["a.txt", "b.txt", "sub"]);
    }

    #[test]
    fn recursive_walk_includes_hidden_on_request() {
        let dir = fixture();
        let entries = walk_entries(dir.path(), options(true, true)).expect("walk");
        assert_eq!(
            names(dir.path(), &entries),
            vec![".hidden", "a.txt", "b.txt", "sub", "sub/nested.txt"]
        );
    }

    #[test]
    fn entry_limit_is_enforced() {
        let dir = fixture();
        let mut limited = options(true, true);
        limited.max_entries = 2;
        let error = walk_entries(dir.path(), limited).expect_err("limit should trip");
        assert!(error.to_string().contains("max entries"));
    }

    #[test]
    fn visitor_can_stop_early() {
        let dir = fixture();
        let mut visited = Vec::new();
        let end = visit_entries(dir.path(), options(true, false), |path| {
            visited.push(path);
            if visited.len() == 2 {
                ControlFlow::Break(())
            } else {
                ControlFlow::Continue(())
            }
        })
        .expect("walk");
        assert_eq!(end, WalkEnd::Stopped);
        assert_eq!(names(dir.path(), &visited), vec!["a.txt", "b.txt"]);
    }
}
