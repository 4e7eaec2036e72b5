//! Incremental pagination over one listing.
//!
//! A selection (bucket, prefix, media filter) is listed once and held in
//! memory; the visible window grows by [`PAGE_SIZE`] entries each time the
//! viewer scrolls near its end. Image entries entering the window get
//! presigned thumbnail URLs in batches of [`THUMBNAIL_BATCH`] keys.

use crate::{
    browser::{
        file_kind::FileKind,
        listing::{BrowserItem, MediaFilter, breadcrumbs, derive_items},
    },
    client::ClientResult,
    models::object::ListEntry,
};
use async_trait::async_trait;
use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    ops::Range,
};
use tracing::{debug, warn};

pub const PAGE_SIZE: usize = 100;
/// Distance from the end of the scroll area, in pixels, that loads the next page.
pub const SCROLL_THRESHOLD_PX: f64 = 200.0;
pub const THUMBNAIL_BATCH: usize = 20;
pub const THUMBNAIL_EXPIRY_SECS: u64 = 3600;

/// Where the browser gets its listings and thumbnail URLs from.
#[async_trait]
pub trait ListingSource: Send + Sync {
    async fn list(&self, bucket: &str, prefix: &str, recursive: bool) -> ClientResult<Vec<ListEntry>>;

    /// `{key: url}`, with `None` for keys that could not be presigned.
    async fn presign_batch(
        &self,
        bucket: &str,
        keys: &[String],
        expiry_secs: u64,
    ) -> ClientResult<BTreeMap<String, Option<String>>>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrowserState {
    Idle,
    Loading,
    Ready,
    LoadingMore,
    /// The listing failed; the visible window is empty until the next reload.
    Error(String),
}

/// Scroll position of the container showing the visible window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    pub fn near_end(&self) -> bool {
        self.scroll_height - self.scroll_top - self.client_height < SCROLL_THRESHOLD_PX
    }
}

/// What a click on a row did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClickOutcome {
    /// A folder was clicked; the browser should open this prefix.
    Navigate(String),
    /// Selection membership flipped; `true` if the key is now selected.
    Toggled(bool),
    Ignored,
}

pub struct ObjectBrowser<S> {
    source: S,
    bucket: String,
    prefix: String,
    filter: MediaFilter,
    state: BrowserState,
    items: Vec<BrowserItem>,
    visible: usize,
    selected: BTreeSet<String>,
    thumbnails: HashMap<String, String>,
}

impl<S: ListingSource> ObjectBrowser<S> {
    /// A browser at the root of `bucket`. Nothing is listed until
    /// [`ObjectBrowser::reload`] (or a navigation) runs.
    pub fn new(source: S, bucket: impl Into<String>) -> Self {
        Self {
            source,
            bucket: bucket.into(),
            prefix: String::new(),
            filter: MediaFilter::All,
            state: BrowserState::Idle,
            items: Vec::new(),
            visible: 0,
            selected: BTreeSet::new(),
            thumbnails: HashMap::new(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn filter(&self) -> MediaFilter {
        self.filter
    }

    pub fn state(&self) -> &BrowserState {
        &self.state
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    /// Open a folder. Leaves media mode, since folders only exist in the
    /// hierarchical view.
    pub async fn navigate(&mut self, prefix: impl Into<String>) {
        let mut prefix = prefix.into();
        if !prefix.is_empty() && !prefix.ends_with('/') {
            prefix.push('/');
        }
        self.prefix = prefix;
        self.filter = MediaFilter::All;
        self.reload().await;
    }

    pub async fn set_filter(&mut self, filter: MediaFilter) {
        self.filter = filter;
        self.reload().await;
    }

    pub async fn open_bucket(&mut self, bucket: impl Into<String>) {
        self.bucket = bucket.into();
        self.prefix.clear();
        self.filter = MediaFilter::All;
        self.reload().await;
    }

    /// Discard everything and list the current selection again.
    pub async fn reload(&mut self) {
        self.state = BrowserState::Loading;
        self.items.clear();
        self.visible = 0;
        self.selected.clear();
        self.thumbnails.clear();

        let media = self.filter.is_media();
        let list_prefix = if media { "" } else { self.prefix.as_str() };
        let entries = match self.source.list(&self.bucket, list_prefix, media).await {
            Ok(entries) => entries,
            Err(err) => {
                warn!("listing {}/{} failed: {}", self.bucket, list_prefix, err);
                self.state = BrowserState::Error(err.to_string());
                return;
            }
        };

        self.items = derive_items(&entries, &self.prefix, self.filter);
        self.visible = self.items.len().min(PAGE_SIZE);
        debug!(
            "listed {} entries in {}/{} ({:?})",
            self.items.len(),
            self.bucket,
            self.prefix,
            self.filter
        );
        self.state = BrowserState::Ready;
        self.fetch_thumbnails(0..self.visible).await;
    }

    /// Load the next page if the viewer is near the end. Returns whether a
    /// page was appended.
    pub async fn on_scroll(&mut self, metrics: ScrollMetrics) -> bool {
        if !metrics.near_end() {
            return false;
        }
        self.load_more().await
    }

    /// Append the next page of entries to the visible window.
    pub async fn load_more(&mut self) -> bool {
        let Some(range) = self.begin_page() else {
            return false;
        };
        self.fetch_thumbnails(range.clone()).await;
        self.finish_page(range);
        true
    }

    /// Claim the next page. `None` while another page is in flight, outside
    /// the Ready state, or when everything is already visible.
    pub fn begin_page(&mut self) -> Option<Range<usize>> {
        if self.state != BrowserState::Ready || !self.has_more() {
            return None;
        }
        self.state = BrowserState::LoadingMore;
        let end = (self.visible + PAGE_SIZE).min(self.items.len());
        Some(self.visible..end)
    }

    pub fn finish_page(&mut self, range: Range<usize>) {
        if self.state != BrowserState::LoadingMore {
            return;
        }
        self.visible = range.end.min(self.items.len()).max(self.visible);
        self.state = BrowserState::Ready;
    }

    pub fn has_more(&self) -> bool {
        self.visible < self.items.len()
    }

    pub fn visible_items(&self) -> &[BrowserItem] {
        &self.items[..self.visible]
    }

    /// Every entry of the current listing, visible or not.
    pub fn all_items(&self) -> &[BrowserItem] {
        &self.items
    }

    pub fn thumbnail(&self, key: &str) -> Option<&str> {
        self.thumbnails.get(key).map(String::as_str)
    }

    /// Image and video counts over the whole listing.
    pub fn media_counts(&self) -> (usize, usize) {
        self.items.iter().fold((0, 0), |(images, videos), item| {
            match item.file_kind() {
                Some(FileKind::Image) => (images + 1, videos),
                Some(FileKind::Video) => (images, videos + 1),
                _ => (images, videos),
            }
        })
    }

    /// `(label, prefix)` pairs for the current prefix, root excluded.
    pub fn breadcrumbs(&self) -> Vec<(String, String)> {
        breadcrumbs(&self.prefix)
    }

    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    /// Click the visible row at `index`. Folders navigate on any click; files
    /// toggle selection only with the modifier held.
    pub fn click(&mut self, index: usize, modifier: bool) -> ClickOutcome {
        let Some(item) = self.visible_items().get(index) else {
            return ClickOutcome::Ignored;
        };
        let key = item.key().to_string();
        if item.is_folder() {
            return ClickOutcome::Navigate(key);
        }
        if !modifier {
            return ClickOutcome::Ignored;
        }
        if self.selected.remove(&key) {
            ClickOutcome::Toggled(false)
        } else {
            self.selected.insert(key);
            ClickOutcome::Toggled(true)
        }
    }

    /// Click a row and follow folder navigation.
    pub async fn activate(&mut self, index: usize, modifier: bool) -> ClickOutcome {
        let outcome = self.click(index, modifier);
        if let ClickOutcome::Navigate(prefix) = &outcome {
            self.navigate(prefix.clone()).await;
        }
        outcome
    }

    /// Presign thumbnails for the images in `range`, one batch after another.
    /// A failed batch leaves its keys unresolved.
    async fn fetch_thumbnails(&mut self, range: Range<usize>) {
        let keys: Vec<String> = self.items[range]
            .iter()
            .filter(|item| item.is_image())
            .map(|item| item.key().to_string())
            .collect();

        for batch in keys.chunks(THUMBNAIL_BATCH) {
            match self
                .source
                .presign_batch(&self.bucket, batch, THUMBNAIL_EXPIRY_SECS)
                .await
            {
                Ok(urls) => {
                    self.thumbnails
                        .extend(urls.into_iter().filter_map(|(key, url)| url.map(|url| (key, url))));
                }
                Err(err) => warn!("thumbnail batch of {} failed: {}", batch.len(), err),
            }
        }
    }
}
