//! Reverse-chronological, date-grouped bookmark timeline with incremental
//! pagination, search and per-bookmark actions.
//!
//! Data flows one way: the bookmark tree is flattened by [`bookmarks`],
//! narrowed by [`search`], paged by [`pagination`], bucketed by [`grouping`]
//! and kept ordered by [`timeline`]. [`session::BookmarkTimeline`] wires these
//! to the stores in [`store`].

pub mod bookmarks;
pub mod config;
pub mod error;
pub mod grouping;
pub mod icon;
pub mod pagination;
pub mod present;
pub mod report;
pub mod search;
pub mod session;
pub mod store;
pub mod theme;
pub mod timeline;

pub use bookmarks::{extract_bookmarks, BookmarkNode, BookmarkRecord};
pub use config::TimelineConfig;
pub use error::{Result, TimelineError};
pub use grouping::{group_by_date, Clock, DateGroup, FixedClock, GroupKey, SystemClock};
pub use pagination::{FixedDelay, LoadOutcome, NoDelay, Pacer, PaginationController, PaginationState, ScrollMetrics};
pub use search::SearchFilter;
pub use session::BookmarkTimeline;
pub use timeline::{insert_in_order, sort_keys, Timeline};
