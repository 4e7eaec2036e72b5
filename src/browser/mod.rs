//! Listing logic of the object browser: derived folder and media views,
//! file-type classification, and paginated loading with thumbnails.

pub mod file_kind;
pub mod listing;
pub mod pager;

pub use file_kind::{FileKind, format_size};
pub use listing::{BrowserItem, FolderView, MediaFilter};
pub use pager::{BrowserState, ClickOutcome, ListingSource, ObjectBrowser, ScrollMetrics};
