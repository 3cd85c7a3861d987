use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::config::DelayRange;

/// Configuration for the headless browser and element waits
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrowserSettings {
    /// Whether to run the browser in headless mode (default: true)
    pub headless: bool,

    /// User agent string to use
    pub user_agent: Option<String>,

    /// Extra command line arguments passed to Chrome
    pub chrome_args: Vec<String>,

    /// How long to wait for a required element, in seconds (default: 20)
    pub element_timeout_secs: u64,

    /// Poll interval while waiting for an element to become interactable (default: 500)
    pub poll_interval_ms: u64,

    /// Pause between scrolls on infinite-scroll pages
    pub scroll_pause: DelayRange,

    /// Upper bound on scrolling a single page, in seconds (default: 60)
    pub scroll_max_wait_secs: u64,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            user_agent: Some(
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
                 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36"
                    .to_string(),
            ),
            chrome_args: Vec::new(),
            element_timeout_secs: 20,
            poll_interval_ms: 500,
            scroll_pause: DelayRange::secs(1, 3),
            scroll_max_wait_secs: 60,
        }
    }
}

impl BrowserSettings {
    pub fn element_timeout(&self) -> Duration {
        Duration::from_secs(self.element_timeout_secs)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn scroll_max_wait(&self) -> Duration {
        Duration::from_secs(self.scroll_max_wait_secs)
    }

    /// Settings with every wait and pause collapsed, for tests against a fake driver.
    pub fn instant() -> Self {
        Self {
            element_timeout_secs: 1,
            poll_interval_ms: 10,
            scroll_pause: DelayRange::ZERO,
            scroll_max_wait_secs: 1,
            ..Default::default()
        }
    }
}
