use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle of a category scrape session.
///
/// ```text
/// Idle → LoggingIn → ScrapingPage(n) ⇄ Retrying(n) → FetchingDetails → Done
/// ```
///
/// `LoggingIn` is only entered by sources that need authentication.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionState {
    #[default]
    Idle,
    LoggingIn,
    ScrapingPage(usize),
    Retrying { page: usize, attempt: u32 },
    FetchingDetails,
    Done,
}

impl SessionState {
    /// Whether moving from `self` to `next` is a legal transition.
    pub fn can_transition_to(&self, next: SessionState) -> bool {
        use SessionState::*;
        match (*self, next) {
            (Idle, LoggingIn) | (Idle, ScrapingPage(_)) | (Idle, Done) => true,
            (LoggingIn, ScrapingPage(_)) | (LoggingIn, Done) => true,
            (ScrapingPage(n), Retrying { page, .. }) => n == page,
            (Retrying { page, .. }, ScrapingPage(m)) => m >= page,
            (Retrying { page, .. }, Retrying { page: p, .. }) => page == p,
            (ScrapingPage(n), ScrapingPage(m)) => m > n,
            (ScrapingPage(_), FetchingDetails) | (Retrying { .. }, FetchingDetails) => true,
            (FetchingDetails, ScrapingPage(_)) => true,
            (ScrapingPage(_), Done) | (Retrying { .. }, Done) | (FetchingDetails, Done) => true,
            _ => false,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionState::Done)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Idle => write!(f, "idle"),
            SessionState::LoggingIn => write!(f, "logging in"),
            SessionState::ScrapingPage(n) => write!(f, "scraping page {}", n + 1),
            SessionState::Retrying { page, attempt } => {
                write!(f, "retrying page {} (attempt {})", page + 1, attempt + 1)
            }
            SessionState::FetchingDetails => write!(f, "fetching details"),
            SessionState::Done => write!(f, "done"),
        }
    }
}
