//! Browser automation capability.
//!
//! Scrapers only talk to the browser through [`BrowserDriver`] and
//! [`DomElement`], so they can run against headless Chrome
//! ([`ChromeDriver`]) or a scripted in-memory DOM in tests.
//!
//! # Error contract
//!
//! - A selector that matches nothing yields [`HarvestError::ElementNotFound`].
//! - An element whose node has left the document yields
//!   [`HarvestError::StaleElement`].
//! - Everything else the driver reports becomes [`HarvestError::Browser`].
//!
//! [`HarvestError::ElementNotFound`]: crate::app::HarvestError::ElementNotFound
//! [`HarvestError::StaleElement`]: crate::app::HarvestError::StaleElement
//! [`HarvestError::Browser`]: crate::app::HarvestError::Browser

pub mod accessor;
mod chrome;
mod config;
#[cfg(test)]
pub mod fake;

pub use accessor::{
    attribute_of, find_optional, scroll_until_stable, text_of, wait_for_interactable,
    wait_for_presence,
};
pub use chrome::{ChromeDriver, ChromeLauncher};
pub use config::BrowserSettings;

use async_trait::async_trait;

use crate::app::Result;

/// Anything elements can be looked up under: the whole page or another element.
#[async_trait]
pub trait Scope: Send + Sync {
    type Element: DomElement;

    /// First element matching a CSS selector.
    async fn find_element(&self, selector: &str) -> Result<Self::Element>;

    /// Every element matching a CSS selector, in document order.
    async fn find_elements(&self, selector: &str) -> Result<Vec<Self::Element>>;
}

/// A located DOM node.
#[async_trait]
pub trait DomElement: Scope<Element = Self> + Sized {
    /// Rendered text of the element.
    async fn text(&self) -> Result<String>;

    async fn attribute(&self, name: &str) -> Result<Option<String>>;

    /// Visible and enabled.
    async fn is_interactable(&self) -> Result<bool>;

    async fn click(&self) -> Result<()>;

    async fn type_text(&self, text: &str) -> Result<()>;
}

/// Identifies one open tab of a browser session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TabHandle(pub usize);

/// One browser session. Lookups through [`Scope`] act on the active tab.
#[async_trait]
pub trait BrowserDriver: Scope {
    /// Load `url` in the active tab.
    async fn navigate(&self, url: &str) -> Result<()>;

    /// Evaluate a JavaScript expression in the active tab.
    async fn execute_script(&self, script: &str) -> Result<serde_json::Value>;

    async fn current_tab(&self) -> Result<TabHandle>;

    /// Open a blank tab without activating it.
    async fn open_tab(&self) -> Result<TabHandle>;

    async fn switch_tab(&self, tab: TabHandle) -> Result<()>;

    async fn close_tab(&self, tab: TabHandle) -> Result<()>;

    /// Shut the browser down.
    async fn quit(&self) -> Result<()>;
}

/// Starts browser sessions.
#[async_trait]
pub trait Launcher: Send + Sync {
    type Driver: BrowserDriver + 'static;

    async fn launch(&self) -> Result<Self::Driver>;
}
