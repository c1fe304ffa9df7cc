//! The rendered timeline: date groups kept in strict [`GroupKey`] order.

use serde::Serialize;

use crate::bookmarks::BookmarkRecord;
use crate::grouping::{DateGroup, GroupKey};

/// Ordered, key-unique sequence of date groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Timeline {
    groups: Vec<DateGroup>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from scratch, sorting the groups by key.
    ///
    /// Groups sharing a key are folded together in input order.
    pub fn from_groups(groups: Vec<DateGroup>) -> Self {
        let mut folded: Vec<DateGroup> = Vec::with_capacity(groups.len());
        for group in groups {
            match folded.iter_mut().find(|g| g.key == group.key) {
                Some(existing) => existing.records.extend(group.records),
                None => folded.push(group),
            }
        }
        // Stable sort; keys are unique at this point anyway
        folded.sort_by(|a, b| a.key.cmp(&b.key));
        Self { groups: folded }
    }

    /// Merge one page's groups into the existing structure.
    ///
    /// Records for a key already present are appended to that group; new keys
    /// are inserted at their ordered position without re-sorting.
    pub fn merge(&mut self, groups: Vec<DateGroup>) {
        for group in groups {
            match self.groups.iter_mut().find(|g| g.key == group.key) {
                Some(existing) => existing.records.extend(group.records),
                None => insert_in_order(group, &mut self.groups),
            }
        }
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }

    pub fn groups(&self) -> &[DateGroup] {
        &self.groups
    }

    pub fn group(&self, key: &GroupKey) -> Option<&DateGroup> {
        self.groups.iter().find(|g| g.key == *key)
    }

    pub fn keys(&self) -> Vec<GroupKey> {
        self.groups.iter().map(|g| g.key).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn record_count(&self) -> usize {
        self.groups.iter().map(|g| g.records.len()).sum()
    }

    /// All records, group by group.
    pub fn records(&self) -> impl Iterator<Item = &BookmarkRecord> {
        self.groups.iter().flat_map(|g| g.records.iter())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.records().any(|r| r.id == id)
    }

    /// Whether group keys are strictly increasing under the timeline order.
    pub fn is_ordered(&self) -> bool {
        self.groups.windows(2).all(|pair| pair[0].key < pair[1].key)
    }
}

/// Sort group keys: today, yesterday, then dates newest first.
pub fn sort_keys(mut keys: Vec<GroupKey>) -> Vec<GroupKey> {
    keys.sort();
    keys
}

/// Insert `group` before the first existing group it must precede,
/// or append it when none qualifies.
pub fn insert_in_order(group: DateGroup, groups: &mut Vec<DateGroup>) {
    match groups
        .iter()
        .position(|existing| should_insert_before(&group.key, &existing.key))
    {
        Some(pos) => groups.insert(pos, group),
        None => groups.push(group),
    }
}

fn should_insert_before(new_key: &GroupKey, existing_key: &GroupKey) -> bool {
    new_key < existing_key
}
