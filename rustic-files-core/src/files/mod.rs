//! Filesystem handlers behind the tool surface.
//!
//! Each handler validates its paths, performs plain `std::fs` calls and
//! returns a serializable report. Handlers are synchronous; callers run them
//! on the [`WorkerPool`](crate::runtime::WorkerPool).

pub mod batch;
pub mod format;
pub mod info;
pub mod listing;
pub mod ops;
pub mod organize;
pub mod paths;
pub mod search;
pub mod stats;
mod walk;

pub use batch::{BatchItem, BatchKind, BatchReport, BatchRequest};
pub use info::{FileGroup, FileInfo, FolderSummary};
pub use listing::{ListRequest, Listing, SortKey, SortOrder};
pub use ops::{CreateFolderRequest, DeleteRequest, EntryKind, TransferRequest};
pub use organize::{OrganizeReport, OrganizeRequest};
pub use search::{SearchReport, SearchRequest, SearchResult};
pub use stats::{FileStats, StatsRequest};

use crate::config::schema::LimitsConfig;

#[derive(Debug, Clone, Default)]
pub struct FileManager {
    limits: LimitsConfig,
}

impl FileManager {
    pub fn new(limits: LimitsConfig) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &LimitsConfig {
        &self.limits
    }

    fn walk_options(&self, recursive: bool, include_hidden: bool) -> walk::WalkOptions {
        walk::WalkOptions {
            recursive,
            include_hidden,
            max_depth: self.limits.max_walk_depth,
            max_entries: self.limits.max_walk_entries,
            skip_errors: false,
        }
    }
}

fn default_true() -> bool {
    true
}
