use crate::pagination::PaginationState;
use crate::present::{display_host, relative_age};
use crate::search::highlight;
use crate::timeline::Timeline;

/// Plain-text rendering of the timeline for terminal output.
pub struct TimelineReport<'a> {
    timeline: &'a Timeline,
    state: PaginationState,
    query: Option<&'a str>,
    now_millis: i64,
    total: usize,
}

impl<'a> TimelineReport<'a> {
    pub fn new(timeline: &'a Timeline, state: PaginationState, now_millis: i64) -> Self {
        Self {
            timeline,
            state,
            query: None,
            now_millis,
            total: timeline.record_count(),
        }
    }

    /// Highlight matches of `query` in titles.
    pub fn with_query(mut self, query: Option<&'a str>) -> Self {
        self.query = query;
        self
    }

    /// Size of the filtered list the timeline was paged from.
    pub fn with_total(mut self, total: usize) -> Self {
        self.total = total;
        self
    }

    pub fn format(&self, detailed: bool) -> String {
        let mut output = String::new();

        output.push_str("\n🕒 Bookmark Timeline\n");
        output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");

        if let Some(query) = self.query {
            output.push_str(&format!("🔍 Search: {}\n", query));
        }
        output.push('\n');

        if self.timeline.is_empty() {
            output.push_str("📭 No bookmarks found\n");
        }

        for group in self.timeline.groups() {
            output.push_str(&format!("📅 {}\n", group.key.display_title()));
            for record in &group.records {
                output.push_str(&format!(
                    "  • {}  {} · {}\n",
                    self.title(&record.title),
                    display_host(&record.url),
                    relative_age(self.now_millis, record.date_added)
                ));
                if detailed {
                    output.push_str(&format!("    ID: {}  URL: {}\n", record.id, record.url));
                }
            }
            output.push('\n');
        }

        output.push_str("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━\n");
        output.push_str(&format!(
            "📊 Showing {}/{} bookmarks ({} pages)",
            self.timeline.record_count(),
            self.total,
            self.state.page
        ));
        if !self.state.has_more && !self.timeline.is_empty() {
            output.push_str(" · no more bookmarks");
        }
        output.push_str("\n\n");

        output
    }

    fn title(&self, title: &str) -> String {
        match self.query {
            Some(query) => highlight(title, query)
                .into_iter()
                .map(|fragment| {
                    if fragment.highlighted {
                        format!("[{}]", fragment.text)
                    } else {
                        fragment.text
                    }
                })
                .collect(),
            None => title.to_string(),
        }
    }
}
