use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Result, TimelineError};

/// Tuning knobs for pagination and scroll handling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TimelineConfig {
    /// Records per page
    pub page_size: usize,

    /// Distance from the bottom at which the next page is requested
    pub scroll_threshold: f64,

    /// Pacing delay before a page merge completes
    pub load_delay_ms: u64,

    /// Scroll offset past which the back-to-top control is shown
    pub back_to_top_threshold: f64,
}

impl Default for TimelineConfig {
    fn default() -> Self {
        Self {
            page_size: 20,
            scroll_threshold: 100.0,
            load_delay_ms: 800,
            back_to_top_threshold: 200.0,
        }
    }
}

impl TimelineConfig {
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_load_delay(mut self, delay: Duration) -> Self {
        self.load_delay_ms = delay.as_millis() as u64;
        self
    }

    pub fn load_delay(&self) -> Duration {
        Duration::from_millis(self.load_delay_ms)
    }

    pub fn validate(&self) -> Result<()> {
        if self.page_size == 0 {
            return Err(TimelineError::InvalidConfig(
                "page size must be greater than zero".to_string(),
            ));
        }

        if !self.scroll_threshold.is_finite() || self.scroll_threshold < 0.0 {
            return Err(TimelineError::InvalidConfig(format!(
                "scroll threshold must be a non-negative number, got {}",
                self.scroll_threshold
            )));
        }

        if !self.back_to_top_threshold.is_finite() || self.back_to_top_threshold < 0.0 {
            return Err(TimelineError::InvalidConfig(format!(
                "back-to-top threshold must be a non-negative number, got {}",
                self.back_to_top_threshold
            )));
        }

        Ok(())
    }
}
