//! Favicon resolution with a deterministic monogram fallback.

use std::time::Duration;

use tracing::debug;

use crate::error::Result;
use crate::present::{hostname, site_name};

/// How long a favicon may take before the monogram is shown instead.
pub const ICON_TIMEOUT: Duration = Duration::from_millis(500);

const FALLBACK_PALETTE: [&str; 14] = [
    "#FF6B6B", "#4ECDC4", "#45B7D1", "#96CEB4", "#FFEAA7", "#DDA0DD", "#98D8C8",
    "#F7DC6F", "#BB8FCE", "#85C1E9", "#F8C471", "#82E0AA", "#F1948A", "#D2B4DE",
];

const CUSTOM_INITIALS: &[(&str, &str)] = &[
    ("github.com", "G"),
    ("stackoverflow.com", "SO"),
    ("google.com", "G"),
    ("baidu.com", "百"),
    ("zhihu.com", "知"),
    ("bilibili.com", "B"),
    ("youtube.com", "Y"),
    ("twitter.com", "T"),
    ("facebook.com", "F"),
    ("linkedin.com", "in"),
];

/// Letter badge drawn when no favicon is available.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monogram {
    pub initial: String,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IconOutcome {
    /// Image source of the loaded favicon
    Success(String),
    Fallback(Monogram),
}

/// Loads favicon images. Implemented by the host.
#[allow(async_fn_in_trait)]
pub trait IconResolver {
    async fn load(&self, favicon_url: &str) -> Result<String>;
}

pub fn favicon_url(host: &str) -> String {
    format!("https://www.google.com/s2/favicons?domain={}&sz=32", host)
}

pub fn site_initial(site: &str) -> String {
    if let Some((_, initial)) = CUSTOM_INITIALS.iter().find(|(name, _)| *name == site) {
        return initial.to_string();
    }
    site.split('.')
        .next()
        .and_then(|label| label.chars().next())
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_default()
}

/// Stable colour for a site name (31-multiplier string hash over UTF-16 units).
pub fn fallback_color(text: &str) -> &'static str {
    let mut hash: i32 = 0;
    for unit in text.encode_utf16() {
        hash = hash.wrapping_shl(5).wrapping_sub(hash).wrapping_add(unit as i32);
    }
    let index = (hash as i64).unsigned_abs() % FALLBACK_PALETTE.len() as u64;
    FALLBACK_PALETTE[index as usize]
}

pub fn monogram(url: &str) -> Monogram {
    let site = site_name(url);
    Monogram {
        initial: site_initial(&site),
        color: fallback_color(&site),
    }
}

/// Race the resolver against `timeout`; failure or timeout yields a monogram.
pub async fn resolve_icon<R: IconResolver>(resolver: &R, url: &str, timeout: Duration) -> IconOutcome {
    let source = favicon_url(&hostname(url));
    match tokio::time::timeout(timeout, resolver.load(&source)).await {
        Ok(Ok(image)) => IconOutcome::Success(image),
        Ok(Err(e)) => {
            debug!("Favicon failed for {}: {}", url, e);
            IconOutcome::Fallback(monogram(url))
        }
        Err(_) => {
            debug!("Favicon timed out for {}", url);
            IconOutcome::Fallback(monogram(url))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TimelineError;

    struct Ready;
    struct Broken;
    struct Slow;

    impl IconResolver for Ready {
        async fn load(&self, favicon_url: &str) -> Result<String> {
            Ok(format!("img:{}", favicon_url))
        }
    }

    impl IconResolver for Broken {
        async fn load(&self, _favicon_url: &str) -> Result<String> {
            Err(TimelineError::NotFound("favicon".to_string()))
        }
    }

    impl IconResolver for Slow {
        async fn load(&self, _favicon_url: &str) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        }
    }

    #[test]
    fn test_site_initial() {
        assert_eq!(site_initial("stackoverflow.com"), "SO");
        assert_eq!(site_initial("linkedin.com"), "in");
        assert_eq!(site_initial("docs.rs"), "D");
        assert_eq!(site_initial(""), "");
    }

    #[test]
    fn test_fallback_color_is_stable() {
        assert_eq!(fallback_color("github.com"), "#FFEAA7");
        assert_eq!(fallback_color("docs.rs"), "#BB8FCE");
        assert_eq!(fallback_color("a"), "#D2B4DE");
        assert_eq!(fallback_color(""), "#FF6B6B");
    }

    #[test]
    fn test_monogram_for_malformed_url() {
        let badge = monogram("not a url");
        assert_eq!(badge.initial, "U");
        assert_eq!(badge.color, fallback_color("unknown"));
    }

    #[tokio::test]
    async fn test_resolve_success() {
        let outcome = resolve_icon(&Ready, "https://www.github.com/x", ICON_TIMEOUT).await;
        assert_eq!(
            outcome,
            IconOutcome::Success(
                "img:https://www.google.com/s2/favicons?domain=www.github.com&sz=32".to_string()
            )
        );
    }

    #[tokio::test]
    async fn test_resolve_failure_falls_back() {
        let outcome = resolve_icon(&Broken, "https://www.github.com/x", ICON_TIMEOUT).await;
        assert_eq!(
            outcome,
            IconOutcome::Fallback(Monogram { initial: "G".to_string(), color: "#FFEAA7" })
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_resolve_timeout_falls_back() {
        let outcome = resolve_icon(&Slow, "https://docs.rs", ICON_TIMEOUT).await;
        assert!(matches!(outcome, IconOutcome::Fallback(_)));
    }
}
