use std::time::Duration;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HarvestError {
    #[error("Timed out after {timeout:?} waiting for element: {selector}")]
    ElementTimeout { selector: String, timeout: Duration },

    #[error("Element not found: {0}")]
    ElementNotFound(String),

    #[error("Stale element reference: {0}")]
    StaleElement(String),

    #[error("Transient error on page {page}: {reason}")]
    TransientPage { page: usize, reason: String },

    #[error("Browser error: {0}")]
    Browser(String),

    #[error("Database error: {0}")]
    Persistence(#[from] rusqlite::Error),

    #[error("Category '{category}' failed: {reason}")]
    FatalCategory { category: String, reason: String },

    #[error("{operation} failed after {attempts} attempts: {last}")]
    RetriesExhausted {
        operation: String,
        attempts: u32,
        last: Box<HarvestError>,
    },

    #[error("Missing credential: {0} is not set")]
    MissingCredentials(&'static str),

    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl HarvestError {
    /// Whether a retry of the same unit of work may succeed.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            HarvestError::ElementTimeout { .. }
                | HarvestError::ElementNotFound(_)
                | HarvestError::StaleElement(_)
                | HarvestError::TransientPage { .. }
                | HarvestError::Browser(_)
        )
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self, HarvestError::ElementTimeout { .. })
    }
}

pub type Result<T> = std::result::Result<T, HarvestError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeouts_and_stale_elements_are_recoverable() {
        let timeout = HarvestError::ElementTimeout {
            selector: "div.job".into(),
            timeout: Duration::from_secs(20),
        };
        assert!(timeout.is_recoverable());
        assert!(timeout.is_timeout());
        assert!(HarvestError::StaleElement("card".into()).is_recoverable());
        assert!(HarvestError::Browser("net::ERR_ABORTED".into()).is_recoverable());
    }

    #[test]
    fn test_configuration_errors_are_not_recoverable() {
        assert!(!HarvestError::MissingCredentials("LINKEDIN_USERNAME").is_recoverable());
        assert!(!HarvestError::Config("bad".into()).is_recoverable());
        let fatal = HarvestError::FatalCategory {
            category: "Energy".into(),
            reason: "browser crashed".into(),
        };
        assert!(!fatal.is_recoverable());
        assert_eq!(fatal.to_string(), "Category 'Energy' failed: browser crashed");
    }
}
