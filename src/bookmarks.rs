//! Bookmark tree nodes and the flat records extracted from them.

use serde::{Deserialize, Serialize};

/// Title given to bookmarks that carry none.
pub const UNTITLED_BOOKMARK: &str = "Untitled bookmark";

/// A node of the bookmark store's tree, as returned by `getTree()`.
///
/// Folders have `children` and no `url`; leaves have a `url`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkNode {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_added: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub children: Option<Vec<BookmarkNode>>,
}

impl BookmarkNode {
    pub fn is_folder(&self) -> bool {
        !self.has_url()
    }

    fn has_url(&self) -> bool {
        self.url.as_deref().is_some_and(|url| !url.is_empty())
    }
}

/// One URL-bearing bookmark, flattened out of the tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkRecord {
    pub id: String,
    pub title: String,
    pub url: String,
    /// Epoch milliseconds.
    pub date_added: i64,
    pub parent_id: Option<String>,
}

/// Flatten a bookmark tree into records, in pre-order.
///
/// Only nodes with a non-empty URL are emitted; folders are descended into
/// but never emitted. Missing titles become [`UNTITLED_BOOKMARK`] and missing
/// dates become `now_millis`.
pub fn extract_bookmarks(nodes: &[BookmarkNode], now_millis: i64) -> Vec<BookmarkRecord> {
    let mut records = Vec::new();
    collect_records(nodes, now_millis, &mut records);
    records
}

fn collect_records(nodes: &[BookmarkNode], now_millis: i64, records: &mut Vec<BookmarkRecord>) {
    for node in nodes {
        if let Some(url) = node.url.as_ref().filter(|url| !url.is_empty()) {
            records.push(BookmarkRecord {
                id: node.id.clone(),
                title: node
                    .title
                    .clone()
                    .filter(|title| !title.is_empty())
                    .unwrap_or_else(|| UNTITLED_BOOKMARK.to_string()),
                url: url.clone(),
                date_added: node.date_added.filter(|ts| *ts != 0).unwrap_or(now_millis),
                parent_id: node.parent_id.clone(),
            });
        }

        if let Some(ref children) = node.children {
            collect_records(children, now_millis, records);
        }
    }
}

/// Sort records newest first. Ties keep their extraction order.
pub fn sort_newest_first(records: &mut [BookmarkRecord]) {
    records.sort_by(|a, b| b.date_added.cmp(&a.date_added));
}

/// Find a node anywhere in the tree.
pub fn find_node<'a>(nodes: &'a [BookmarkNode], id: &str) -> Option<&'a BookmarkNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(found) = node.children.as_deref().and_then(|c| find_node(c, id)) {
            return Some(found);
        }
    }
    None
}

/// Result of removing a node from the tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    NotFound,
    /// Folders must be emptied before they can be removed.
    FolderNotEmpty,
}

/// Remove a bookmark or an empty folder from the tree.
pub fn remove_node(nodes: &mut Vec<BookmarkNode>, id: &str) -> Removal {
    if let Some(pos) = nodes.iter().position(|node| node.id == id) {
        if nodes[pos].children.as_ref().is_some_and(|c| !c.is_empty()) {
            return Removal::FolderNotEmpty;
        }
        nodes.remove(pos);
        return Removal::Removed;
    }
    for node in nodes.iter_mut() {
        if let Some(ref mut children) = node.children {
            match remove_node(children, id) {
                Removal::NotFound => continue,
                done => return done,
            }
        }
    }
    Removal::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(id: &str, parent: &str, url: &str, date: Option<i64>) -> BookmarkNode {
        BookmarkNode {
            id: id.to_string(),
            title: Some(format!("Title {}", id)),
            url: Some(url.to_string()),
            date_added: date,
            parent_id: Some(parent.to_string()),
            children: None,
        }
    }

    fn folder(id: &str, parent: Option<&str>, children: Vec<BookmarkNode>) -> BookmarkNode {
        BookmarkNode {
            id: id.to_string(),
            title: Some(format!("Folder {}", id)),
            parent_id: parent.map(str::to_string),
            children: Some(children),
            ..Default::default()
        }
    }

    fn sample_tree() -> Vec<BookmarkNode> {
        vec![folder(
            "0",
            None,
            vec![
                folder(
                    "1",
                    Some("0"),
                    vec![
                        leaf("10", "1", "https://a.com", Some(1_000)),
                        folder("11", Some("1"), vec![leaf("12", "11", "https://b.com", Some(3_000))]),
                    ],
                ),
                leaf("20", "0", "https://c.com", Some(2_000)),
            ],
        )]
    }

    #[test]
    fn test_extract_preorder_skips_folders() {
        let records = extract_bookmarks(&sample_tree(), 99);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["10", "12", "20"]);
        assert_eq!(records[1].parent_id.as_deref(), Some("11"));
    }

    #[test]
    fn test_extract_defaults() {
        let mut node = leaf("5", "1", "https://x.com", None);
        node.title = None;
        let mut empty_title = leaf("6", "1", "https://y.com", Some(0));
        empty_title.title = Some(String::new());

        let records = extract_bookmarks(&[node, empty_title], 12_345);
        assert_eq!(records[0].title, UNTITLED_BOOKMARK);
        assert_eq!(records[0].date_added, 12_345);
        assert_eq!(records[1].title, UNTITLED_BOOKMARK);
        assert_eq!(records[1].date_added, 12_345);
    }

    #[test]
    fn test_extract_ignores_empty_url() {
        let mut node = leaf("5", "1", "", Some(1));
        node.children = Some(vec![leaf("7", "5", "https://z.com", Some(2))]);
        let records = extract_bookmarks(&[node], 0);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "7");
    }

    #[test]
    fn test_sort_newest_first_is_stable() {
        let mut records = extract_bookmarks(&sample_tree(), 0);
        records.push(BookmarkRecord {
            id: "30".to_string(),
            title: "Tie".to_string(),
            url: "https://d.com".to_string(),
            date_added: 2_000,
            parent_id: None,
        });
        sort_newest_first(&mut records);
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["12", "20", "30", "10"]);
    }

    #[test]
    fn test_find_and_remove_node() {
        let mut tree = sample_tree();
        assert_eq!(find_node(&tree, "11").and_then(|n| n.title.clone()).as_deref(), Some("Folder 11"));
        assert_eq!(remove_node(&mut tree, "12"), Removal::Removed);
        assert!(find_node(&tree, "12").is_none());
        assert_eq!(remove_node(&mut tree, "404"), Removal::NotFound);
    }

    #[test]
    fn test_remove_refuses_non_empty_folder() {
        let mut tree = sample_tree();
        assert_eq!(remove_node(&mut tree, "1"), Removal::FolderNotEmpty);
        assert!(find_node(&tree, "10").is_some());
        assert!(find_node(&tree, "12").is_some());

        // Once emptied, the folder can go
        assert_eq!(remove_node(&mut tree, "12"), Removal::Removed);
        assert_eq!(remove_node(&mut tree, "11"), Removal::Removed);
        assert!(find_node(&tree, "11").is_none());
    }

    #[test]
    fn test_node_json_shape() {
        let json = r#"[{"id":"0","children":[{"id":"3","parentId":"0","title":"Rust","url":"https://rust-lang.org","dateAdded":1700000000000}]}]"#;
        let nodes: Vec<BookmarkNode> = serde_json::from_str(json).unwrap();
        assert!(nodes[0].is_folder());
        let records = extract_bookmarks(&nodes, 0);
        assert_eq!(records[0].date_added, 1_700_000_000_000);
        assert_eq!(records[0].parent_id.as_deref(), Some("0"));
    }
}
