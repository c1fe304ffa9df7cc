//! The popup session: ties the bookmark store, search filter and pagination
//! controller together and routes mutations back through a full reset.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, error, info, warn};

use crate::bookmarks::{extract_bookmarks, sort_newest_first, BookmarkRecord};
use crate::config::TimelineConfig;
use crate::error::{Result, TimelineError};
use crate::grouping::Clock;
use crate::pagination::{FixedDelay, LoadOutcome, Pacer, PaginationController, PaginationState, ScrollDecision, ScrollMetrics};
use crate::search::SearchFilter;
use crate::store::{BookmarkStore, Launcher};
use crate::timeline::Timeline;

pub const ROOT_FOLDER_LABEL: &str = "Bookmarks Bar";
pub const UNKNOWN_FOLDER_LABEL: &str = "Unknown folder";
pub const BOOKMARK_MANAGER_URL: &str = "chrome://bookmarks/";

const MAX_FOLDER_DEPTH: usize = 64;

pub struct BookmarkTimeline<S: BookmarkStore> {
    store: S,
    clock: Arc<dyn Clock>,
    bookmarks: Vec<BookmarkRecord>,
    search: SearchFilter,
    pagination: PaginationController,
    load_delay: Duration,
}

impl<S: BookmarkStore> BookmarkTimeline<S> {
    pub fn new(store: S, config: &TimelineConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let pagination = PaginationController::new(config, Arc::clone(&clock))?;
        Ok(Self {
            store,
            clock,
            bookmarks: Vec::new(),
            search: SearchFilter::new(),
            pagination,
            load_delay: config.load_delay(),
        })
    }

    /// Fetch the tree, sort newest first and render the first page.
    ///
    /// A store failure leaves an empty timeline; returns the bookmark count.
    pub async fn load(&mut self) -> usize {
        match self.store.get_tree().await {
            Ok(tree) => {
                let mut records = extract_bookmarks(&tree, self.clock.now_millis());
                sort_newest_first(&mut records);
                info!("📖 Loaded {} bookmarks", records.len());
                self.bookmarks = records;
            }
            Err(e) => {
                error!("❌ Failed to load bookmarks: {}", e);
                self.bookmarks.clear();
            }
        }

        let filtered = self.search.filter(&self.bookmarks);
        self.pagination.reset(filtered);
        self.bookmarks.len()
    }

    /// Apply a new query and restart pagination.
    pub fn search(&mut self, query: &str) -> usize {
        let filtered = self.search.apply(query, &self.bookmarks);
        debug!("Search {:?} matched {} bookmarks", query, filtered.len());
        let count = filtered.len();
        self.pagination.reset(filtered);
        count
    }

    pub fn clear_search(&mut self) {
        self.search.clear();
        self.pagination.reset(self.bookmarks.clone());
    }

    /// Pacer using the configured load delay.
    pub fn pacer(&self) -> FixedDelay {
        FixedDelay(self.load_delay)
    }

    pub async fn load_next_page<P: Pacer>(&mut self, pacer: &P) -> LoadOutcome {
        self.pagination.load_next_page(pacer).await
    }

    pub fn on_scroll(&self, metrics: ScrollMetrics) -> ScrollDecision {
        self.pagination.on_scroll(metrics)
    }

    /// Delete a bookmark and rebuild the timeline from scratch.
    ///
    /// When the store refuses, the failure is logged and returned but the
    /// timeline is still rebuilt from the unchanged in-memory lists.
    pub async fn delete(&mut self, id: &str) -> Result<()> {
        match self.store.remove(id).await {
            Ok(()) => {
                self.bookmarks.retain(|b| b.id != id);
                let filtered: Vec<BookmarkRecord> = self
                    .pagination
                    .filtered()
                    .iter()
                    .filter(|b| b.id != id)
                    .cloned()
                    .collect();
                self.pagination.reset(filtered);
                info!("🗑️  Deleted bookmark {}", id);
                Ok(())
            }
            Err(e) => {
                error!("❌ Failed to delete bookmark {}: {}", id, e);
                let filtered = self.pagination.filtered().to_vec();
                self.pagination.reset(filtered);
                Err(match e {
                    TimelineError::DeleteFailed { .. } => e,
                    other => TimelineError::DeleteFailed {
                        id: id.to_string(),
                        reason: other.to_string(),
                    },
                })
            }
        }
    }

    /// Human-readable folder chain for a bookmark's parent, e.g.
    /// `"Bookmarks Bar > Work > Rust"`.
    pub async fn folder_path(&self, parent_id: Option<&str>) -> String {
        let Some(mut id) = parent_id.filter(|id| *id != "0").map(str::to_string) else {
            return ROOT_FOLDER_LABEL.to_string();
        };

        let mut segments: Vec<String> = Vec::new();
        for _ in 0..MAX_FOLDER_DEPTH {
            let folder = match self.store.get(&id).await {
                Ok(folder) => folder,
                Err(e) => {
                    warn!("⚠️  Failed to resolve folder {}: {}", id, e);
                    return UNKNOWN_FOLDER_LABEL.to_string();
                }
            };
            let title = folder.title.unwrap_or_default();

            match folder.parent_id.as_deref() {
                None | Some("0") => {
                    segments.push(if title.is_empty() {
                        ROOT_FOLDER_LABEL.to_string()
                    } else {
                        title
                    });
                    segments.reverse();
                    return segments.join(" > ");
                }
                Some(parent) => {
                    segments.push(title);
                    id = parent.to_string();
                }
            }
        }

        warn!("⚠️  Folder chain for {:?} is too deep", parent_id);
        UNKNOWN_FOLDER_LABEL.to_string()
    }

    pub async fn open_bookmark<L: Launcher>(&self, launcher: &L, record: &BookmarkRecord) -> Result<()> {
        launch(launcher, &record.url).await
    }

    /// Open the bookmark manager focused on the record's folder.
    pub async fn show_in_folder<L: Launcher>(&self, launcher: &L, record: &BookmarkRecord) -> Result<()> {
        let url = match record.parent_id.as_deref() {
            Some(parent) => format!("{}?id={}", BOOKMARK_MANAGER_URL, parent),
            None => BOOKMARK_MANAGER_URL.to_string(),
        };
        launch(launcher, &url).await
    }

    pub async fn open_manager<L: Launcher>(&self, launcher: &L) -> Result<()> {
        launch(launcher, BOOKMARK_MANAGER_URL).await
    }

    pub fn find(&self, id: &str) -> Option<&BookmarkRecord> {
        self.bookmarks.iter().find(|b| b.id == id)
    }

    pub fn timeline(&self) -> &Timeline {
        self.pagination.timeline()
    }

    pub fn state(&self) -> PaginationState {
        self.pagination.state()
    }

    pub fn bookmarks(&self) -> &[BookmarkRecord] {
        &self.bookmarks
    }

    pub fn filtered(&self) -> &[BookmarkRecord] {
        self.pagination.filtered()
    }

    pub fn search_query(&self) -> Option<&str> {
        self.search.active_query()
    }

    /// Whether the empty-state view should be shown.
    pub fn is_empty(&self) -> bool {
        self.pagination.is_empty()
    }

    pub fn now_millis(&self) -> i64 {
        self.clock.now_millis()
    }

    pub fn pagination_mut(&mut self) -> &mut PaginationController {
        &mut self.pagination
    }
}

async fn launch<L: Launcher>(launcher: &L, url: &str) -> Result<()> {
    launcher.open_url(url).await.map_err(|e| {
        error!("❌ Failed to open {}: {}", url, e);
        e
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bookmarks::BookmarkNode;
    use crate::grouping::{FixedClock, GroupKey};
    use crate::pagination::NoDelay;
    use crate::store::{MemoryBookmarkStore, RecordingLauncher};
    use chrono::{TimeZone, Utc};

    const DAY: i64 = 24 * 60 * 60 * 1000;

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::utc(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()))
    }

    fn leaf(id: &str, parent: &str, title: &str, url: &str, date_added: i64) -> BookmarkNode {
        BookmarkNode {
            id: id.to_string(),
            title: Some(title.to_string()),
            url: Some(url.to_string()),
            date_added: Some(date_added),
            parent_id: Some(parent.to_string()),
            children: None,
        }
    }

    fn folder(id: &str, parent: &str, title: &str, children: Vec<BookmarkNode>) -> BookmarkNode {
        BookmarkNode {
            id: id.to_string(),
            title: Some(title.to_string()),
            parent_id: Some(parent.to_string()),
            children: Some(children),
            ..Default::default()
        }
    }

    fn tree() -> Vec<BookmarkNode> {
        let now = clock().now_millis();
        vec![BookmarkNode {
            id: "0".to_string(),
            children: Some(vec![
                folder(
                    "1",
                    "0",
                    "Work",
                    vec![
                        leaf("10", "1", "GitHub Docs", "https://a.com", now),
                        folder(
                            "2",
                            "1",
                            "Rust",
                            vec![leaf("20", "2", "Foo", "https://github.com", now - DAY)],
                        ),
                    ],
                ),
                folder("3", "0", "", vec![leaf("30", "3", "Old", "https://old.example", now - 10 * DAY)]),
            ]),
            ..Default::default()
        }]
    }

    async fn session(page_size: usize) -> BookmarkTimeline<MemoryBookmarkStore> {
        let config = TimelineConfig::default().with_page_size(page_size);
        let mut session = BookmarkTimeline::new(MemoryBookmarkStore::new(tree()), &config, clock()).unwrap();
        session.load().await;
        session
    }

    #[tokio::test]
    async fn test_load_sorts_and_renders_first_page() {
        let session = session(2).await;
        let ids: Vec<&str> = session.bookmarks().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["10", "20", "30"]);
        assert_eq!(session.timeline().keys(), vec![GroupKey::Today, GroupKey::Yesterday]);
        assert!(session.state().has_more);
    }

    #[tokio::test]
    async fn test_load_failure_shows_empty_state() {
        let config = TimelineConfig::default();
        let mut session = BookmarkTimeline::new(MemoryBookmarkStore::unavailable(), &config, clock()).unwrap();
        assert_eq!(session.load().await, 0);
        assert!(session.is_empty());
        assert!(session.timeline().is_empty());
        assert!(!session.state().has_more);
    }

    #[tokio::test]
    async fn test_search_resets_pagination() {
        let mut session = session(1).await;
        session.load_next_page(&NoDelay).await;
        assert_eq!(session.state().page, 2);

        assert_eq!(session.search("GITHUB"), 2);
        assert_eq!(session.state().page, 1);
        assert_eq!(session.search_query(), Some("github"));
        session.load_next_page(&NoDelay).await;
        assert!(!session.state().has_more);
        assert!(session.timeline().records().all(|r| r.id != "30"));

        session.clear_search();
        assert_eq!(session.filtered().len(), 3);
        assert_eq!(session.search_query(), None);
    }

    #[tokio::test]
    async fn test_delete_only_record_in_group_removes_group() {
        let mut session = session(10).await;
        assert!(session.timeline().group(&GroupKey::Yesterday).is_some());

        session.delete("20").await.unwrap();
        assert!(session.timeline().group(&GroupKey::Yesterday).is_none());
        assert!(session.find("20").is_none());
        assert_eq!(session.filtered().len(), 2);
        assert!(session.timeline().is_ordered());
    }

    #[tokio::test]
    async fn test_delete_keeps_search_active() {
        let mut session = session(10).await;
        session.search("github");
        session.delete("10").await.unwrap();
        let ids: Vec<&str> = session.filtered().iter().map(|b| b.id.as_str()).collect();
        assert_eq!(ids, vec!["20"]);
        assert_eq!(session.bookmarks().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_failure_still_resets() {
        let config = TimelineConfig::default().with_page_size(1);
        let store = MemoryBookmarkStore::new(tree()).failing_removes();
        let mut session = BookmarkTimeline::new(store, &config, clock()).unwrap();
        session.load().await;
        session.load_next_page(&NoDelay).await;
        let epoch = session.pagination_mut().epoch();

        let err = session.delete("10").await.unwrap_err();
        assert!(matches!(err, TimelineError::DeleteFailed { .. }));
        assert_eq!(session.pagination_mut().epoch(), epoch + 1);
        assert_eq!(session.state().page, 1);
        assert_eq!(session.filtered().len(), 3);
        assert!(!session.state().is_loading);
    }

    #[tokio::test]
    async fn test_delete_non_empty_folder_is_refused() {
        let mut session = session(10).await;

        let err = session.delete("2").await.unwrap_err();
        assert!(matches!(err, TimelineError::DeleteFailed { .. }));
        assert!(session.find("20").is_some());
        assert!(session.timeline().contains("20"));
        assert_eq!(session.filtered().len(), 3);
    }

    #[tokio::test]
    async fn test_folder_path() {
        let session = session(10).await;
        assert_eq!(session.folder_path(Some("2")).await, "Work > Rust");
        assert_eq!(session.folder_path(Some("1")).await, "Work");
        assert_eq!(session.folder_path(Some("3")).await, ROOT_FOLDER_LABEL);
        assert_eq!(session.folder_path(Some("0")).await, ROOT_FOLDER_LABEL);
        assert_eq!(session.folder_path(None).await, ROOT_FOLDER_LABEL);
        assert_eq!(session.folder_path(Some("404")).await, UNKNOWN_FOLDER_LABEL);
    }

    #[tokio::test]
    async fn test_context_actions() {
        let session = session(10).await;
        let launcher = RecordingLauncher::new();
        let record = session.find("20").unwrap().clone();

        session.open_bookmark(&launcher, &record).await.unwrap();
        session.show_in_folder(&launcher, &record).await.unwrap();
        session.open_manager(&launcher).await.unwrap();

        assert_eq!(
            launcher.opened(),
            vec![
                "https://github.com".to_string(),
                "chrome://bookmarks/?id=2".to_string(),
                "chrome://bookmarks/".to_string(),
            ]
        );
    }
}
