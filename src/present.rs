//! Labels shown next to each bookmark: host and relative age.

use url::Url;

const MINUTE: i64 = 60 * 1000;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;
const WEEK: i64 = 7 * DAY;
const MONTH: i64 = 30 * DAY;
const YEAR: i64 = 365 * DAY;

fn parsed_host(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|parsed| parsed.host_str().map(str::to_string))
        .filter(|host| !host.is_empty())
}

/// Hostname of the URL, or the raw string when it cannot be parsed.
pub fn display_host(url: &str) -> String {
    parsed_host(url).unwrap_or_else(|| url.to_string())
}

/// Hostname used for favicon lookup; `"unknown"` when unparseable.
pub fn hostname(url: &str) -> String {
    parsed_host(url).unwrap_or_else(|| "unknown".to_string())
}

/// Hostname without a leading `www.`.
pub fn site_name(url: &str) -> String {
    let host = hostname(url);
    match host.strip_prefix("www.") {
        Some(rest) => rest.to_string(),
        None => host,
    }
}

/// Coarse "time ago" label for a bookmark's creation instant.
pub fn relative_age(now_millis: i64, date_added: i64) -> String {
    let diff = now_millis - date_added;

    if diff < MINUTE {
        "just now".to_string()
    } else if diff < HOUR {
        plural(diff / MINUTE, "minute")
    } else if diff < DAY {
        plural(diff / HOUR, "hour")
    } else if diff < WEEK {
        plural(diff / DAY, "day")
    } else if diff < MONTH {
        plural(diff / WEEK, "week")
    } else if diff < YEAR {
        plural(diff / MONTH, "month")
    } else {
        plural(diff / YEAR, "year")
    }
}

fn plural(n: i64, unit: &str) -> String {
    if n == 1 {
        format!("1 {} ago", unit)
    } else {
        format!("{} {}s ago", n, unit)
    }
}
