//! Incremental pagination over the filtered bookmark list.
//!
//! The controller owns the filtered list, the [`Timeline`] built from it and
//! the [`PaginationState`]. A page load is split in two halves around the
//! asynchronous pacing step: [`PaginationController::begin_load`] claims the
//! single loading slot and hands out a [`PageTicket`], and
//! [`PaginationController::complete_load`] merges the page. Tickets carry the
//! pagination epoch; every reset bumps it, so a load that straddles a reset
//! is discarded instead of merging into a rebuilt timeline.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tracing::{debug, warn};

use crate::bookmarks::BookmarkRecord;
use crate::config::TimelineConfig;
use crate::error::{Result, TimelineError};
use crate::grouping::{group_by_date, Clock};
use crate::timeline::Timeline;

/// Cursor and flags for the current pagination epoch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginationState {
    /// Pages already merged into the timeline
    pub page: usize,
    pub page_size: usize,
    pub has_more: bool,
    pub is_loading: bool,
}

impl PaginationState {
    fn fresh(page_size: usize) -> Self {
        Self {
            page: 0,
            page_size,
            has_more: true,
            is_loading: false,
        }
    }
}

/// Claim on the loading slot for one page of one epoch.
#[derive(Debug)]
pub struct PageTicket {
    epoch: u64,
    page: usize,
}

impl PageTicket {
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn page(&self) -> usize {
        self.page
    }
}

/// What a load attempt did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// A load was already in flight or nothing is left.
    Skipped,
    /// A page was merged.
    Merged { page: usize, records: usize },
    /// The slice was empty; `has_more` is now false.
    Exhausted,
    /// The ticket belonged to an epoch that has since been reset.
    Stale,
    /// The pacing step failed; the loading slot was released.
    Failed,
}

/// Viewport geometry delivered with each scroll event.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub offset: f64,
    pub scroll_extent: f64,
    pub viewport_extent: f64,
}

impl ScrollMetrics {
    pub fn new(offset: f64, scroll_extent: f64, viewport_extent: f64) -> Self {
        Self {
            offset,
            scroll_extent,
            viewport_extent,
        }
    }

    pub fn is_near_bottom(&self, threshold: f64) -> bool {
        self.offset + self.viewport_extent >= self.scroll_extent - threshold
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ScrollDecision {
    pub load_more: bool,
    pub show_back_to_top: bool,
}

/// The asynchronous pause between claiming a page and merging it.
#[allow(async_fn_in_trait)]
pub trait Pacer {
    async fn pause(&self) -> Result<()>;
}

/// Sleep for a fixed duration.
#[derive(Debug, Clone, Copy)]
pub struct FixedDelay(pub Duration);

impl Pacer for FixedDelay {
    async fn pause(&self) -> Result<()> {
        if !self.0.is_zero() {
            tokio::time::sleep(self.0).await;
        }
        Ok(())
    }
}

/// Merge immediately.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoDelay;

impl Pacer for NoDelay {
    async fn pause(&self) -> Result<()> {
        Ok(())
    }
}

pub struct PaginationController {
    filtered: Vec<BookmarkRecord>,
    timeline: Timeline,
    state: PaginationState,
    epoch: u64,
    scroll_threshold: f64,
    back_to_top_threshold: f64,
    clock: Arc<dyn Clock>,
}

impl PaginationController {
    pub fn new(config: &TimelineConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            filtered: Vec::new(),
            timeline: Timeline::new(),
            state: PaginationState::fresh(config.page_size),
            epoch: 0,
            scroll_threshold: config.scroll_threshold,
            back_to_top_threshold: config.back_to_top_threshold,
            clock,
        })
    }

    /// Replace the filtered list and rebuild the first page from scratch.
    ///
    /// Any load in flight is orphaned: its ticket no longer matches the epoch.
    pub fn reset(&mut self, filtered: Vec<BookmarkRecord>) {
        self.epoch += 1;
        self.filtered = filtered;
        self.state = PaginationState::fresh(self.state.page_size);
        self.timeline.clear();

        let end = self.state.page_size.min(self.filtered.len());
        if end == 0 {
            self.state.has_more = false;
            debug!("Reset to empty list (epoch {})", self.epoch);
            return;
        }

        let groups = group_by_date(&self.filtered[..end], self.clock.as_ref());
        self.timeline = Timeline::from_groups(groups);
        self.state.page = 1;
        self.state.has_more = self.state.page_size < self.filtered.len();

        debug!(
            "Reset to {} records, first page has {} groups (epoch {})",
            self.filtered.len(),
            self.timeline.groups().len(),
            self.epoch
        );
    }

    /// Claim the loading slot for the next page.
    ///
    /// Returns `None` while another load is in flight or when no data is left.
    pub fn begin_load(&mut self) -> Option<PageTicket> {
        if self.state.is_loading || !self.state.has_more {
            return None;
        }
        self.state.is_loading = true;
        Some(PageTicket {
            epoch: self.epoch,
            page: self.state.page,
        })
    }

    /// Merge the page claimed by `ticket` and release the loading slot.
    pub fn complete_load(&mut self, ticket: PageTicket) -> LoadOutcome {
        if ticket.epoch != self.epoch {
            debug!(
                "Discarding page {} from stale epoch {} (current {})",
                ticket.page, ticket.epoch, self.epoch
            );
            return LoadOutcome::Stale;
        }

        let outcome = self.merge_next_page();
        self.state.is_loading = false;
        outcome
    }

    /// Release the loading slot after a failed pacing step.
    pub fn fail_load(&mut self, ticket: PageTicket) {
        if ticket.epoch == self.epoch {
            self.state.is_loading = false;
        }
    }

    /// Fetch, pace and merge the next page.
    pub async fn load_next_page<P: Pacer>(&mut self, pacer: &P) -> LoadOutcome {
        let Some(ticket) = self.begin_load() else {
            return LoadOutcome::Skipped;
        };

        match pacer.pause().await {
            Ok(()) => self.complete_load(ticket),
            Err(e) => {
                warn!("⚠️  Page {} load failed: {}", ticket.page, e);
                self.fail_load(ticket);
                LoadOutcome::Failed
            }
        }
    }

    /// Keep loading until the filtered list is exhausted.
    pub async fn load_all<P: Pacer>(&mut self, pacer: &P) -> Result<usize> {
        let mut pages = 0;
        while self.state.has_more {
            match self.load_next_page(pacer).await {
                LoadOutcome::Merged { .. } => pages += 1,
                LoadOutcome::Failed => {
                    return Err(TimelineError::Pacing(format!(
                        "stopped after {} pages",
                        pages
                    )))
                }
                LoadOutcome::Exhausted => break,
                outcome @ (LoadOutcome::Skipped | LoadOutcome::Stale) => {
                    // Another load holds the slot; leave the rest to it
                    debug!("Stopping after {} pages: {:?}", pages, outcome);
                    break;
                }
            }
        }
        Ok(pages)
    }

    fn merge_next_page(&mut self) -> LoadOutcome {
        let start = self.state.page * self.state.page_size;
        let end = start + self.state.page_size;

        if start >= self.filtered.len() {
            self.state.has_more = false;
            return LoadOutcome::Exhausted;
        }

        let slice = &self.filtered[start..end.min(self.filtered.len())];
        let groups = group_by_date(slice, self.clock.as_ref());
        self.timeline.merge(groups);

        self.state.page += 1;
        self.state.has_more = end < self.filtered.len();

        debug!(
            "Merged page {} ({} records), has_more={}",
            self.state.page,
            slice.len(),
            self.state.has_more
        );

        LoadOutcome::Merged {
            page: self.state.page,
            records: slice.len(),
        }
    }

    /// Level-triggered scroll check; evaluated on every scroll event.
    pub fn on_scroll(&self, metrics: ScrollMetrics) -> ScrollDecision {
        ScrollDecision {
            load_more: metrics.is_near_bottom(self.scroll_threshold)
                && !self.state.is_loading
                && self.state.has_more,
            show_back_to_top: metrics.offset > self.back_to_top_threshold,
        }
    }

    pub fn state(&self) -> PaginationState {
        self.state
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn filtered(&self) -> &[BookmarkRecord] {
        &self.filtered
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_empty(&self) -> bool {
        self.filtered.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grouping::{FixedClock, GroupKey};
    use chrono::{TimeZone, Utc};

    const DAY: i64 = 24 * 60 * 60 * 1000;

    fn clock() -> Arc<dyn Clock> {
        Arc::new(FixedClock::utc(Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap()))
    }

    fn records(count: usize, date_added: i64) -> Vec<BookmarkRecord> {
        (0..count)
            .map(|i| BookmarkRecord {
                id: i.to_string(),
                title: format!("Bookmark {}", i),
                url: format!("https://site{}.example", i),
                date_added,
                parent_id: Some("1".to_string()),
            })
            .collect()
    }

    fn controller(page_size: usize) -> PaginationController {
        let config = TimelineConfig::default().with_page_size(page_size);
        PaginationController::new(&config, clock()).unwrap()
    }

    struct FailingPacer;

    impl Pacer for FailingPacer {
        async fn pause(&self) -> Result<()> {
            Err(TimelineError::Pacing("window closed".to_string()))
        }
    }

    #[test]
    fn test_zero_page_size_rejected() {
        let config = TimelineConfig::default().with_page_size(0);
        assert!(PaginationController::new(&config, clock()).is_err());
    }

    #[test]
    fn test_reset_builds_first_page() {
        let now = clock().now_millis();
        let mut list = records(1, now);
        list.extend(records(1, now - DAY));
        list.extend(records(1, now - 10 * DAY));

        let mut pagination = controller(2);
        pagination.reset(list);

        assert_eq!(pagination.timeline().keys(), vec![GroupKey::Today, GroupKey::Yesterday]);
        let state = pagination.state();
        assert_eq!(state.page, 1);
        assert!(state.has_more);
        assert!(!state.is_loading);
    }

    #[test]
    fn test_reset_empty_list() {
        let mut pagination = controller(5);
        pagination.reset(Vec::new());
        assert!(pagination.timeline().is_empty());
        assert!(pagination.is_empty());
        assert!(!pagination.state().has_more);
        assert!(pagination.begin_load().is_none());
    }

    #[test]
    fn test_exact_multiple_of_page_size() {
        let mut pagination = controller(5);
        pagination.reset(records(10, 0));
        let ticket = pagination.begin_load().unwrap();
        assert_eq!(
            pagination.complete_load(ticket),
            LoadOutcome::Merged { page: 2, records: 5 }
        );
        assert!(!pagination.state().has_more);
        assert_eq!(pagination.timeline().record_count(), 10);
    }

    #[test]
    fn test_begin_load_is_exclusive() {
        let mut pagination = controller(2);
        pagination.reset(records(6, 0));
        let ticket = pagination.begin_load().unwrap();
        assert!(pagination.begin_load().is_none());
        assert!(!pagination.on_scroll(ScrollMetrics::new(900.0, 1000.0, 100.0)).load_more);
        pagination.complete_load(ticket);
        assert!(!pagination.state().is_loading);
        assert!(pagination.begin_load().is_some());
    }

    #[test]
    fn test_stale_ticket_discarded_after_reset() {
        let mut pagination = controller(2);
        pagination.reset(records(6, 0));
        let ticket = pagination.begin_load().unwrap();

        pagination.reset(records(3, 0));
        let rebuilt = pagination.timeline().clone();

        assert_eq!(pagination.complete_load(ticket), LoadOutcome::Stale);
        assert_eq!(pagination.timeline(), &rebuilt);
        assert_eq!(pagination.state().page, 1);
        assert!(!pagination.state().is_loading);
    }

    #[test]
    fn test_stale_ticket_does_not_release_new_load() {
        let mut pagination = controller(2);
        pagination.reset(records(6, 0));
        let old = pagination.begin_load().unwrap();
        pagination.reset(records(6, 0));
        let current = pagination.begin_load().unwrap();

        pagination.fail_load(old);
        assert!(pagination.state().is_loading);
        pagination.complete_load(current);
        assert!(!pagination.state().is_loading);
    }

    #[test]
    fn test_scroll_decision() {
        let mut pagination = controller(2);
        pagination.reset(records(6, 0));

        let far = ScrollMetrics::new(0.0, 1000.0, 300.0);
        let near = ScrollMetrics::new(600.0, 1000.0, 300.0);
        assert!(!pagination.on_scroll(far).load_more);
        assert!(!pagination.on_scroll(far).show_back_to_top);
        assert!(pagination.on_scroll(near).load_more);
        assert!(pagination.on_scroll(near).show_back_to_top);
        assert!(!ScrollMetrics::new(599.0, 1000.0, 300.0).is_near_bottom(100.0));
    }

    #[tokio::test]
    async fn test_load_next_page_until_exhausted() {
        let mut pagination = controller(20);
        pagination.reset(records(25, 0));
        assert_eq!(
            pagination.load_next_page(&NoDelay).await,
            LoadOutcome::Merged { page: 2, records: 5 }
        );
        assert!(!pagination.state().has_more);
        assert_eq!(pagination.load_next_page(&NoDelay).await, LoadOutcome::Skipped);
        assert_eq!(pagination.timeline().groups().len(), 1);
        assert_eq!(pagination.timeline().record_count(), 25);
    }

    #[tokio::test]
    async fn test_failed_pacing_releases_slot() {
        let mut pagination = controller(2);
        pagination.reset(records(6, 0));
        assert_eq!(pagination.load_next_page(&FailingPacer).await, LoadOutcome::Failed);
        let state = pagination.state();
        assert!(!state.is_loading);
        assert_eq!(state.page, 1);
        assert!(state.has_more);
        assert!(pagination.load_all(&FailingPacer).await.is_err());
        assert!(!pagination.state().is_loading);
    }

    #[tokio::test]
    async fn test_load_all_yields_to_load_in_flight() {
        let mut pagination = controller(2);
        pagination.reset(records(6, 0));
        let ticket = pagination.begin_load().unwrap();

        let pages = tokio::time::timeout(Duration::from_secs(2), pagination.load_all(&NoDelay))
            .await
            .expect("load_all must not spin while a load is in flight")
            .unwrap();
        assert_eq!(pages, 0);
        assert!(pagination.state().is_loading);
        assert_eq!(pagination.state().page, 1);

        pagination.complete_load(ticket);
        assert_eq!(pagination.load_all(&NoDelay).await.unwrap(), 1);
        assert!(!pagination.state().has_more);
        assert_eq!(pagination.timeline().record_count(), 6);
    }

    #[tokio::test(start_paused = true)]
    async fn test_fixed_delay_paces_merge() {
        let mut pagination = controller(2);
        pagination.reset(records(4, 0));
        let started = tokio::time::Instant::now();
        let outcome = pagination.load_next_page(&FixedDelay(Duration::from_millis(800))).await;
        assert_eq!(outcome, LoadOutcome::Merged { page: 2, records: 2 });
        assert!(started.elapsed() >= Duration::from_millis(800));
    }
}
