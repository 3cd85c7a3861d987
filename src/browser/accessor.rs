//! Safe element access: bounded waits, optional lookups, scroll-to-load.

use std::time::Duration;

use tokio::time::Instant;
use tracing::debug;

use crate::app::{HarvestError, Result};
use crate::browser::{BrowserDriver, DomElement, Scope};
use crate::config::DelayRange;

pub const SCROLL_HEIGHT_SCRIPT: &str = "document.body.scrollHeight";
pub const SCROLL_TO_BOTTOM_SCRIPT: &str = "window.scrollTo(0, document.body.scrollHeight)";

/// Wait until `selector` matches an element in the DOM.
pub async fn wait_for_presence<S: Scope>(
    scope: &S,
    selector: &str,
    timeout: Duration,
    poll: Duration,
) -> Result<S::Element> {
    let deadline = Instant::now() + timeout;
    loop {
        match scope.find_element(selector).await {
            Ok(element) => return Ok(element),
            Err(HarvestError::ElementNotFound(_)) | Err(HarvestError::StaleElement(_)) => {}
            Err(e) => return Err(e),
        }
        if Instant::now() >= deadline {
            return Err(HarvestError::ElementTimeout {
                selector: selector.to_string(),
                timeout,
            });
        }
        tokio::time::sleep(poll).await;
    }
}

/// Wait until `selector` matches an element that is visible and enabled.
pub async fn wait_for_interactable<S: Scope>(
    scope: &S,
    selector: &str,
    timeout: Duration,
    poll: Duration,
) -> Result<S::Element> {
    let deadline = Instant::now() + timeout;
    loop {
        match scope.find_element(selector).await {
            Ok(element) => match element.is_interactable().await {
                Ok(true) => return Ok(element),
                Ok(false) | Err(HarvestError::StaleElement(_)) => {}
                Err(e) => return Err(e),
            },
            Err(HarvestError::ElementNotFound(_)) | Err(HarvestError::StaleElement(_)) => {}
            Err(e) => return Err(e),
        }
        if Instant::now() >= deadline {
            return Err(HarvestError::ElementTimeout {
                selector: selector.to_string(),
                timeout,
            });
        }
        tokio::time::sleep(poll).await;
    }
}

/// Look up an element that may legitimately be missing.
///
/// Absence and driver hiccups both come back as `Ok(None)`. Only a stale
/// `scope` is reported, since the caller's unit of work is then lost.
pub async fn find_optional<S: Scope>(scope: &S, selector: &str) -> Result<Option<S::Element>> {
    match scope.find_element(selector).await {
        Ok(element) => Ok(Some(element)),
        Err(e @ HarvestError::StaleElement(_)) => Err(e),
        Err(HarvestError::ElementNotFound(_)) => Ok(None),
        Err(e) => {
            debug!("Treating lookup of {} as absent: {}", selector, e);
            Ok(None)
        }
    }
}

/// Text of an optional sub-element.
pub async fn text_of<S: Scope>(scope: &S, selector: &str) -> Result<Option<String>> {
    match find_optional(scope, selector).await? {
        Some(element) => Ok(Some(element.text().await?)),
        None => Ok(None),
    }
}

/// Attribute of an optional sub-element.
pub async fn attribute_of<S: Scope>(
    scope: &S,
    selector: &str,
    attribute: &str,
) -> Result<Option<String>> {
    match find_optional(scope, selector).await? {
        Some(element) => element.attribute(attribute).await,
        None => Ok(None),
    }
}

/// Scroll to the bottom until the page height stops growing.
///
/// Returns the final height. Gives up quietly once `max_wait` has passed.
pub async fn scroll_until_stable<D: BrowserDriver>(
    driver: &D,
    pause: DelayRange,
    max_wait: Duration,
) -> Result<u64> {
    let deadline = Instant::now() + max_wait;
    let mut last_height = page_height(driver).await?;

    loop {
        driver.execute_script(SCROLL_TO_BOTTOM_SCRIPT).await?;
        pause.sleep().await;

        let height = page_height(driver).await?;
        if height == last_height {
            return Ok(height);
        }
        last_height = height;

        if Instant::now() >= deadline {
            debug!("Page still growing after {:?}, stopped scrolling", max_wait);
            return Ok(height);
        }
    }
}

async fn page_height<D: BrowserDriver>(driver: &D) -> Result<u64> {
    let value = driver.execute_script(SCROLL_HEIGHT_SCRIPT).await?;
    value
        .as_u64()
        .or_else(|| value.as_f64().map(|h| h as u64))
        .ok_or_else(|| HarvestError::Browser(format!("Unexpected scroll height: {}", value)))
}
