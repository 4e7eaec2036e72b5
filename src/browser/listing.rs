//! Derived views over a flat keyspace.
//!
//! Folders do not exist on the server; they are computed here from the keys
//! (and common prefixes) of one listing. Nothing in this module talks to the
//! network.

use crate::{
    browser::file_kind::FileKind,
    models::object::{ListEntry, ObjectInfo},
};
use clap::ValueEnum;
use std::collections::BTreeSet;

/// Which listing mode the browser is in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum MediaFilter {
    /// Hierarchical view of one prefix level.
    #[default]
    All,
    /// Every image in the bucket, newest first.
    Images,
    /// Every video in the bucket, newest first.
    Videos,
}

impl MediaFilter {
    pub fn is_media(self) -> bool {
        !matches!(self, MediaFilter::All)
    }

    pub fn matches(self, name: &str) -> bool {
        match self {
            MediaFilter::All => true,
            MediaFilter::Images => FileKind::is_image(name),
            MediaFilter::Videos => FileKind::is_video(name),
        }
    }
}

/// One row of the browser.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserItem {
    /// `key` is the folder's full "/"-terminated path.
    Folder { key: String, name: String },
    File { info: ObjectInfo, name: String },
}

impl BrowserItem {
    pub fn key(&self) -> &str {
        match self {
            BrowserItem::Folder { key, .. } => key,
            BrowserItem::File { info, .. } => &info.key,
        }
    }

    pub fn display_name(&self) -> &str {
        match self {
            BrowserItem::Folder { name, .. } | BrowserItem::File { name, .. } => name,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, BrowserItem::Folder { .. })
    }

    pub fn object(&self) -> Option<&ObjectInfo> {
        match self {
            BrowserItem::File { info, .. } => Some(info),
            BrowserItem::Folder { .. } => None,
        }
    }

    /// `None` for folders.
    pub fn file_kind(&self) -> Option<FileKind> {
        self.object().map(|_| FileKind::of(self.display_name()))
    }

    pub fn is_image(&self) -> bool {
        self.file_kind() == Some(FileKind::Image)
    }
}

/// Immediate children of one prefix.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FolderView {
    /// Names of immediate subfolders, without the trailing "/".
    pub folders: BTreeSet<String>,
    /// Objects directly under the prefix, sorted by display name.
    pub files: Vec<ObjectInfo>,
}

impl FolderView {
    /// Split a listing into subfolders and immediate files relative to
    /// `prefix`. Keys nested deeper than one level contribute their first
    /// segment as a folder, so recursive listings give the same view.
    pub fn derive(entries: &[ListEntry], prefix: &str) -> FolderView {
        let mut view = FolderView::default();

        for entry in entries {
            match entry {
                ListEntry::Prefix { prefix: common } => {
                    let Some(rest) = common.strip_prefix(prefix) else {
                        continue;
                    };
                    let name = rest.trim_end_matches('/');
                    if !name.is_empty() && !name.contains('/') {
                        view.folders.insert(name.to_string());
                    }
                }
                ListEntry::Object(info) => {
                    let Some(relative) = info.key.strip_prefix(prefix) else {
                        continue;
                    };
                    if relative.is_empty() {
                        continue;
                    }
                    match relative.split_once('/') {
                        Some((folder, _)) => {
                            if !folder.is_empty() {
                                view.folders.insert(folder.to_string());
                            }
                        }
                        None => view.files.push(info.clone()),
                    }
                }
            }
        }

        view.files
            .sort_by(|a, b| relative_name(&a.key, prefix).cmp(relative_name(&b.key, prefix)));
        view
    }

    /// Folder rows first, then file rows.
    pub fn into_items(self, prefix: &str) -> Vec<BrowserItem> {
        let folders = self.folders.into_iter().map(|name| BrowserItem::Folder {
            key: format!("{prefix}{name}/"),
            name,
        });
        let files = self.files.into_iter().map(|info| BrowserItem::File {
            name: relative_name(&info.key, prefix).to_string(),
            info,
        });
        folders.chain(files).collect()
    }
}

/// Flat media view: real objects whose names match `filter`, newest first.
/// Objects without a modification time sort last.
pub fn derive_media_view(entries: &[ListEntry], filter: MediaFilter) -> Vec<BrowserItem> {
    let mut files: Vec<&ObjectInfo> = entries
        .iter()
        .filter_map(ListEntry::object)
        .filter(|info| !info.key.ends_with('/') && filter.matches(&info.key))
        .collect();
    files.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));

    files
        .into_iter()
        .map(|info| BrowserItem::File {
            name: info.file_name().to_string(),
            info: info.clone(),
        })
        .collect()
}

/// Rows for a listing in the given mode.
pub fn derive_items(entries: &[ListEntry], prefix: &str, filter: MediaFilter) -> Vec<BrowserItem> {
    if filter.is_media() {
        derive_media_view(entries, filter)
    } else {
        FolderView::derive(entries, prefix).into_items(prefix)
    }
}

/// `(label, prefix)` pairs from the bucket root down to `prefix`.
pub fn breadcrumbs(prefix: &str) -> Vec<(String, String)> {
    let mut crumbs = Vec::new();
    let mut path = String::new();
    for segment in prefix.split('/').filter(|s| !s.is_empty()) {
        path.push_str(segment);
        path.push('/');
        crumbs.push((segment.to_string(), path.clone()));
    }
    crumbs
}

fn relative_name<'a>(key: &'a str, prefix: &str) -> &'a str {
    key.strip_prefix(prefix).unwrap_or(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn object(key: &str, size: i64, minute: u32) -> ListEntry {
        ListEntry::Object(ObjectInfo {
            key: key.to_string(),
            size,
            last_modified: Some(Utc.with_ymd_and_hms(2025, 3, 1, 12, minute, 0).unwrap()),
            etag: None,
            content_type: None,
        })
    }

    fn names(items: &[BrowserItem]) -> Vec<&str> {
        items.iter().map(BrowserItem::display_name).collect()
    }

    #[test]
    fn root_level_splits_folders_and_files() {
        let entries = vec![object("a/b.txt", 3, 0), object("a/c/d.txt", 4, 1), object("e.txt", 5, 2)];
        let view = FolderView::derive(&entries, "");
        assert_eq!(view.folders.iter().collect::<Vec<_>>(), ["a"]);
        assert_eq!(view.files.len(), 1);
        assert_eq!(view.files[0].key, "e.txt");

        let items = view.into_items("");
        assert_eq!(items[0].key(), "a/");
        assert!(items[0].is_folder());
        assert_eq!(items[1].key(), "e.txt");
    }

    #[test]
    fn nested_prefix_uses_common_prefixes_and_skips_placeholder() {
        let entries = vec![
            object("a/", 0, 0),
            object("a/b.txt", 3, 1),
            ListEntry::Prefix {
                prefix: "a/c/".into(),
            },
            object("a/Zed.txt", 1, 2),
        ];
        let items = derive_items(&entries, "a/", MediaFilter::All);
        assert_eq!(names(&items), ["c", "Zed.txt", "b.txt"]);
        assert_eq!(items[0].key(), "a/c/");
    }

    #[test]
    fn folders_are_deduplicated_and_sorted() {
        let entries = vec![
            object("z/1.txt", 1, 0),
            object("m/1.txt", 1, 0),
            object("z/2.txt", 1, 0),
            ListEntry::Prefix { prefix: "m/".into() },
        ];
        let items = derive_items(&entries, "", MediaFilter::All);
        assert_eq!(names(&items), ["m", "z"]);
    }

    #[test]
    fn media_view_filters_and_sorts_newest_first() {
        let entries = vec![
            object("old.png", 10, 1),
            object("deep/new.JPG", 10, 30),
            object("clip.mp4", 10, 20),
            object("notes.txt", 10, 40),
            object("pics/", 0, 50),
            ListEntry::Prefix {
                prefix: "pics/".into(),
            },
        ];
        let images = derive_media_view(&entries, MediaFilter::Images);
        assert_eq!(names(&images), ["new.JPG", "old.png"]);
        assert_eq!(images[0].key(), "deep/new.JPG");

        let videos = derive_media_view(&entries, MediaFilter::Videos);
        assert_eq!(names(&videos), ["clip.mp4"]);
    }

    #[test]
    fn breadcrumbs_walk_down_from_the_root() {
        assert!(breadcrumbs("").is_empty());
        assert_eq!(
            breadcrumbs("a/b/"),
            vec![("a".to_string(), "a/".to_string()), ("b".to_string(), "a/b/".to_string())]
        );
    }
}
