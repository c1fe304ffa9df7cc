//! Case-insensitive substring search over titles and URLs.

use regex::Regex;

use crate::bookmarks::BookmarkRecord;

/// Holds the active query and derives filtered lists from the full set.
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    query: String,
}

impl SearchFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Case-fold then trim.
    pub fn normalize(raw: &str) -> String {
        fold(raw).trim().to_string()
    }

    /// Record `raw` as the active query and return the matching records.
    ///
    /// An empty query returns the full list unchanged.
    pub fn apply(&mut self, raw: &str, all: &[BookmarkRecord]) -> Vec<BookmarkRecord> {
        self.query = Self::normalize(raw);
        self.filter(all)
    }

    /// Filter with the current query.
    pub fn filter(&self, all: &[BookmarkRecord]) -> Vec<BookmarkRecord> {
        if self.query.is_empty() {
            return all.to_vec();
        }
        all.iter()
            .filter(|record| matches_query(record, &self.query))
            .cloned()
            .collect()
    }

    pub fn clear(&mut self) {
        self.query.clear();
    }

    pub fn is_active(&self) -> bool {
        !self.query.is_empty()
    }

    /// The normalized query, when one is active.
    pub fn active_query(&self) -> Option<&str> {
        if self.is_active() {
            Some(&self.query)
        } else {
            None
        }
    }
}

/// Per-character lowercase. Filtering and highlighting both fold through
/// here so that every filtered record has a highlightable run.
pub fn fold(text: &str) -> String {
    text.chars().flat_map(char::to_lowercase).collect()
}

/// `normalized` must already be case-folded and trimmed.
pub fn matches_query(record: &BookmarkRecord, normalized: &str) -> bool {
    fold(&record.title).contains(normalized) || fold(&record.url).contains(normalized)
}

/// A run of text, flagged when it matched the search query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fragment {
    pub text: String,
    pub highlighted: bool,
}

impl Fragment {
    fn plain(text: &str) -> Self {
        Self {
            text: text.to_string(),
            highlighted: false,
        }
    }
}

/// Split `text` into plain and highlighted fragments.
///
/// The query is matched literally against the folded text; each match is
/// widened to whole characters of the original.
pub fn highlight(text: &str, query: &str) -> Vec<Fragment> {
    let needle = SearchFilter::normalize(query);
    if needle.is_empty() || text.is_empty() {
        return vec![Fragment::plain(text)];
    }

    let pattern = match Regex::new(&regex::escape(&needle)) {
        Ok(pattern) => pattern,
        Err(_) => return vec![Fragment::plain(text)],
    };

    // Byte range in `text` of the character each folded byte came from
    let mut folded = String::with_capacity(text.len());
    let mut origin: Vec<(usize, usize)> = Vec::with_capacity(text.len());
    for (start, c) in text.char_indices() {
        let end = start + c.len_utf8();
        for lower in c.to_lowercase() {
            folded.push(lower);
        }
        origin.resize(folded.len(), (start, end));
    }

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for found in pattern.find_iter(&folded) {
        let start = origin[found.start()].0;
        let end = origin[found.end() - 1].1;
        match ranges.last_mut() {
            Some(last) if start <= last.1 => last.1 = last.1.max(end),
            _ => ranges.push((start, end)),
        }
    }

    let mut fragments = Vec::new();
    let mut last = 0;
    for (start, end) in ranges {
        if start > last {
            fragments.push(Fragment::plain(&text[last..start]));
        }
        fragments.push(Fragment {
            text: text[start..end].to_string(),
            highlighted: true,
        });
        last = end;
    }
    if last < text.len() {
        fragments.push(Fragment::plain(&text[last..]));
    }
    fragments
}
