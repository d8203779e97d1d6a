use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::files::info::{FileGroup, FileInfo, FolderSummary};
use crate::files::paths::{require_directory, resolve_path};
use crate::files::walk::walk_entries;
use crate::files::FileManager;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Name,
    Size,
    Modified,
    Created,
    Extension,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ListRequest {
    pub folder_path: String,
    #[serde(default)]
    pub recursive: bool,
    #[serde(default)]
    pub group_by_extension: bool,
    #[serde(default)]
    pub include_hidden: bool,
    #[serde(default)]
    pub sort_by: SortKey,
    #[serde(default)]
    pub sort_order: SortOrder,
}

impl ListRequest {
    pub fn new(folder_path: impl Into<String>) -> Self {
        Self {
            folder_path: folder_path.into(),
            recursive: false,
            group_by_extension: false,
            include_hidden: false,
            sort_by: SortKey::default(),
            sort_order: SortOrder::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Listing {
    pub path: String,
    pub summary: FolderSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub items: Option<Vec<FileInfo>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<FileGroup>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub folders: Option<Vec<FileInfo>>,
}

fn compare(key: SortKey, left: &FileInfo, right: &FileInfo) -> Ordering {
    let by_name = || {
        left.name
            .to_lowercase()
            .cmp(&right.name.to_lowercase())
            .then_with(|| left.path.cmp(&right.path))
    };

    match key {
        SortKey::Name => by_name(),
        SortKey::Size => left.size.cmp(&right.size).then_with(by_name),
        SortKey::Modified => left.modified_at.cmp(&right.modified_at).then_with(by_name),
        SortKey::Created => left.created_at.cmp(&right.created_at).then_with(by_name),
        SortKey::Extension => left.extension.cmp(&right.extension).then_with(by_name),
    }
}

pub(crate) fn sort_items(items: &mut [FileInfo], key: SortKey, order: SortOrder) {
    items.sort_by(|left, right| {
        let ordering = compare(key, left, right);
        match order {
            SortOrder::Asc => ordering,
            SortOrder::Desc => ordering.reverse(),
        }
    });
}

impl FileManager {
    pub fn list(&self, request: &ListRequest) -> Result<Listing> {
        let root = resolve_path(&request.folder_path)?;
        require_directory(&root)?;

        let options = self.walk_options(request.recursive, request.include_hidden);
        let mut items = walk_entries(&root, options)?
            .iter()
            .map(|path| FileInfo::read(path))
            .collect::<Result<Vec<_>>>()?;
        sort_items(&mut items, request.sort_by, request.sort_order);

        let summary = FolderSummary::summarize(&root, &items);
        let path = root.to_string_lossy().into_owned();

        if request.group_by_extension {
            let groups = FileGroup::group(&items);
            let folders = items.into_iter().filter(|item| item.is_dir).collect();
            return Ok(Listing {
                path,
                summary,
                items: None,
                groups: Some(groups),
                folders: Some(folders),
            });
        }

        Ok(Listing {
            path,
            summary,
            items: Some(items),
            groups: None,
            folders: None,
        })
    }
}
