//! Calendar-day bucketing of bookmark records.
//!
//! Records are classified against "today" in the clock's local time zone into
//! `today`, `yesterday`, or a literal `YYYY-MM-DD` bucket. [`GroupKey`] carries
//! the total order used by the timeline: today first, then yesterday, then
//! every other date, newest first.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::bookmarks::BookmarkRecord;

const DATE_KEY_FORMAT: &str = "%Y-%m-%d";

/// Source of "now" and of local calendar dates.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;

    /// Calendar date of an epoch-millisecond instant in local time.
    fn local_date(&self, millis: i64) -> NaiveDate;

    fn today(&self) -> NaiveDate {
        self.local_date(self.now_millis())
    }
}

/// Wall clock in the machine's local time zone.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        Utc::now().timestamp_millis()
    }

    fn local_date(&self, millis: i64) -> NaiveDate {
        instant(millis).with_timezone(&Local).date_naive()
    }
}

/// A frozen clock with an explicit UTC offset.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock {
    now: DateTime<FixedOffset>,
}

impl FixedClock {
    pub fn new(now: DateTime<FixedOffset>) -> Self {
        Self { now }
    }

    pub fn utc(now: DateTime<Utc>) -> Self {
        Self { now: now.fixed_offset() }
    }
}

impl Clock for FixedClock {
    fn now_millis(&self) -> i64 {
        self.now.timestamp_millis()
    }

    fn local_date(&self, millis: i64) -> NaiveDate {
        instant(millis).with_timezone(&self.now.timezone()).date_naive()
    }
}

// Out-of-range timestamps collapse onto the epoch rather than failing.
fn instant(millis: i64) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(millis).unwrap_or_default()
}

/// Identity of a date bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Today,
    Yesterday,
    Date(NaiveDate),
}

impl GroupKey {
    /// Classify a calendar date relative to `today`.
    pub fn classify(date: NaiveDate, today: NaiveDate) -> Self {
        if date == today {
            GroupKey::Today
        } else if today.pred_opt() == Some(date) {
            GroupKey::Yesterday
        } else {
            GroupKey::Date(date)
        }
    }

    /// Heading shown above the group.
    pub fn display_title(&self) -> String {
        match self {
            GroupKey::Today => "Today".to_string(),
            GroupKey::Yesterday => "Yesterday".to_string(),
            GroupKey::Date(date) => date.format("%B %-d, %Y").to_string(),
        }
    }
}

impl Ord for GroupKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (GroupKey::Today, GroupKey::Today) => Ordering::Equal,
            (GroupKey::Today, _) => Ordering::Less,
            (_, GroupKey::Today) => Ordering::Greater,
            (GroupKey::Yesterday, GroupKey::Yesterday) => Ordering::Equal,
            (GroupKey::Yesterday, _) => Ordering::Less,
            (_, GroupKey::Yesterday) => Ordering::Greater,
            // Later dates come first
            (GroupKey::Date(a), GroupKey::Date(b)) => b.cmp(a),
        }
    }
}

impl PartialOrd for GroupKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Canonical key string: `today`, `yesterday` or zero-padded `YYYY-MM-DD`.
impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Today => write!(f, "today"),
            GroupKey::Yesterday => write!(f, "yesterday"),
            GroupKey::Date(date) => write!(f, "{}", date.format(DATE_KEY_FORMAT)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidGroupKey(pub String);

impl fmt::Display for InvalidGroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Invalid group key: {}", self.0)
    }
}

impl std::error::Error for InvalidGroupKey {}

impl FromStr for GroupKey {
    type Err = InvalidGroupKey;

    /// Only the canonical form is accepted; `2024-1-5` is rejected.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "today" => Ok(GroupKey::Today),
            "yesterday" => Ok(GroupKey::Yesterday),
            _ => {
                let date = NaiveDate::parse_from_str(s, DATE_KEY_FORMAT)
                    .map_err(|_| InvalidGroupKey(s.to_string()))?;
                if date.format(DATE_KEY_FORMAT).to_string() != s {
                    return Err(InvalidGroupKey(s.to_string()));
                }
                Ok(GroupKey::Date(date))
            }
        }
    }
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for GroupKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// One date bucket and its records, in the order they were appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DateGroup {
    pub key: GroupKey,
    pub records: Vec<BookmarkRecord>,
}

impl DateGroup {
    pub fn new(key: GroupKey) -> Self {
        Self {
            key,
            records: Vec::new(),
        }
    }
}

/// Bucket records by calendar day.
///
/// Groups are returned in order of first appearance; records keep their
/// relative input order inside each group.
pub fn group_by_date(records: &[BookmarkRecord], clock: &dyn Clock) -> Vec<DateGroup> {
    let today = clock.today();
    let mut groups: Vec<DateGroup> = Vec::new();

    for record in records {
        let key = GroupKey::classify(clock.local_date(record.date_added), today);
        match groups.iter_mut().find(|group| group.key == key) {
            Some(group) => group.records.push(record.clone()),
            None => {
                let mut group = DateGroup::new(key);
                group.records.push(record.clone());
                groups.push(group);
            }
        }
    }

    groups
}
