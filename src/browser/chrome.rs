use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::error::CdpError;
use chromiumoxide::{Element, Page};
use futures::StreamExt;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::app::{HarvestError, Result};
use crate::browser::{BrowserDriver, BrowserSettings, DomElement, Launcher, Scope, TabHandle};

const INTERACTABLE_FN: &str = "function() { \
    const rect = this.getBoundingClientRect(); \
    const style = window.getComputedStyle(this); \
    return !this.disabled && rect.width > 0 && rect.height > 0 \
        && style.visibility !== 'hidden' && style.display !== 'none'; \
}";

struct TabSet {
    pages: Vec<Option<Page>>,
    current: usize,
}

/// Chrome session driven over CDP with chromiumoxide
pub struct ChromeDriver {
    browser: Mutex<Browser>,
    handler: JoinHandle<()>,
    tabs: Mutex<TabSet>,
}

impl ChromeDriver {
    /// Launch a new Chrome process with the given settings
    pub async fn launch(settings: &BrowserSettings) -> Result<Self> {
        let mut builder = BrowserConfig::builder();
        if !settings.headless {
            builder = builder.with_head();
        }
        for arg in launch_args(settings) {
            builder = builder.arg(arg);
        }

        let browser_config = builder
            .build()
            .map_err(|e| HarvestError::Browser(format!("Failed to build browser config: {}", e)))?;

        let (browser, mut handler) = Browser::launch(browser_config).await.map_err(|e| {
            HarvestError::Browser(format!(
                "Failed to launch browser: {}. Is Chrome or Chromium installed and in PATH?",
                e
            ))
        })?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| HarvestError::Browser(format!("Failed to create page: {}", e)))?;

        info!("Browser launched (headless={})", settings.headless);

        Ok(Self {
            browser: Mutex::new(browser),
            handler,
            tabs: Mutex::new(TabSet {
                pages: vec![Some(page)],
                current: 0,
            }),
        })
    }

    async fn page(&self) -> Result<Page> {
        let tabs = self.tabs.lock().await;
        tabs.pages
            .get(tabs.current)
            .and_then(|p| p.clone())
            .ok_or_else(|| HarvestError::Browser("No active tab".to_string()))
    }
}

impl Drop for ChromeDriver {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// Map a CDP failure from a lookup or element call onto the error taxonomy.
fn classify(selector: &str, e: CdpError) -> HarvestError {
    if matches!(e, CdpError::NotFound) {
        return HarvestError::ElementNotFound(selector.to_string());
    }
    let message = e.to_string();
    let lower = message.to_lowercase();
    if lower.contains("no node with given id")
        || lower.contains("could not find node")
        || lower.contains("node is detached")
        || lower.contains("cannot find context with specified id")
    {
        HarvestError::StaleElement(format!("{}: {}", selector, message))
    } else if lower.contains("not found") {
        HarvestError::ElementNotFound(selector.to_string())
    } else {
        HarvestError::Browser(message)
    }
}

#[async_trait]
impl Scope for ChromeDriver {
    type Element = ChromeElement;

    async fn find_element(&self, selector: &str) -> Result<ChromeElement> {
        let page = self.page().await?;
        let inner = page
            .find_element(selector)
            .await
            .map_err(|e| classify(selector, e))?;
        Ok(ChromeElement::new(inner, selector))
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<ChromeElement>> {
        let page = self.page().await?;
        let elements = page
            .find_elements(selector)
            .await
            .map_err(|e| classify(selector, e))?;
        Ok(elements
            .into_iter()
            .map(|inner| ChromeElement::new(inner, selector))
            .collect())
    }
}

#[async_trait]
impl BrowserDriver for ChromeDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        let page = self.page().await?;
        page.goto(url)
            .await
            .map_err(|e| HarvestError::Browser(format!("Navigation to {} failed: {}", url, e)))?;
        Ok(())
    }

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value> {
        let page = self.page().await?;
        let result = page
            .evaluate(script)
            .await
            .map_err(|e| HarvestError::Browser(format!("Script execution failed: {}", e)))?;
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn current_tab(&self) -> Result<TabHandle> {
        let tabs = self.tabs.lock().await;
        match tabs.pages.get(tabs.current) {
            Some(Some(_)) => Ok(TabHandle(tabs.current)),
            _ => Err(HarvestError::Browser("No active tab".to_string())),
        }
    }

    async fn open_tab(&self) -> Result<TabHandle> {
        let page = self
            .browser
            .lock()
            .await
            .new_page("about:blank")
            .await
            .map_err(|e| HarvestError::Browser(format!("Failed to open tab: {}", e)))?;

        let mut tabs = self.tabs.lock().await;
        tabs.pages.push(Some(page));
        Ok(TabHandle(tabs.pages.len() - 1))
    }

    async fn switch_tab(&self, tab: TabHandle) -> Result<()> {
        let page = {
            let mut tabs = self.tabs.lock().await;
            let page = tabs
                .pages
                .get(tab.0)
                .and_then(|p| p.clone())
                .ok_or_else(|| HarvestError::Browser(format!("No such tab: {}", tab.0)))?;
            tabs.current = tab.0;
            page
        };
        page.bring_to_front()
            .await
            .map_err(|e| HarvestError::Browser(format!("Failed to focus tab: {}", e)))?;
        Ok(())
    }

    async fn close_tab(&self, tab: TabHandle) -> Result<()> {
        let page = {
            let mut tabs = self.tabs.lock().await;
            tabs.pages
                .get_mut(tab.0)
                .and_then(|p| p.take())
                .ok_or_else(|| HarvestError::Browser(format!("No such tab: {}", tab.0)))?
        };
        page.close()
            .await
            .map_err(|e| HarvestError::Browser(format!("Failed to close tab: {}", e)))?;
        Ok(())
    }

    async fn quit(&self) -> Result<()> {
        let mut browser = self.browser.lock().await;
        browser
            .close()
            .await
            .map_err(|e| HarvestError::Browser(format!("Failed to close browser: {}", e)))?;
        if let Err(e) = browser.wait().await {
            debug!("Browser process did not exit cleanly: {}", e);
        }
        self.handler.abort();
        Ok(())
    }
}

/// A DOM node on a Chrome page
pub struct ChromeElement {
    inner: Element,
    selector: String,
}

impl ChromeElement {
    fn new(inner: Element, selector: &str) -> Self {
        Self {
            inner,
            selector: selector.to_string(),
        }
    }

    fn fail(&self, e: CdpError) -> HarvestError {
        classify(&self.selector, e)
    }
}

#[async_trait]
impl Scope for ChromeElement {
    type Element = ChromeElement;

    async fn find_element(&self, selector: &str) -> Result<ChromeElement> {
        let inner = self
            .inner
            .find_element(selector)
            .await
            .map_err(|e| classify(selector, e))?;
        Ok(ChromeElement::new(inner, selector))
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<ChromeElement>> {
        let elements = self
            .inner
            .find_elements(selector)
            .await
            .map_err(|e| classify(selector, e))?;
        Ok(elements
            .into_iter()
            .map(|inner| ChromeElement::new(inner, selector))
            .collect())
    }
}

#[async_trait]
impl DomElement for ChromeElement {
    async fn text(&self) -> Result<String> {
        Ok(self
            .inner
            .inner_text()
            .await
            .map_err(|e| self.fail(e))?
            .unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.inner.attribute(name).await.map_err(|e| self.fail(e))
    }

    async fn is_interactable(&self) -> Result<bool> {
        let returns = self
            .inner
            .call_js_fn(INTERACTABLE_FN, false)
            .await
            .map_err(|e| self.fail(e))?;
        Ok(returns
            .result
            .value
            .and_then(|v| v.as_bool())
            .unwrap_or(false))
    }

    async fn click(&self) -> Result<()> {
        self.inner.click().await.map_err(|e| self.fail(e))?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        self.inner.type_str(text).await.map_err(|e| self.fail(e))?;
        Ok(())
    }
}

/// Launches a fresh Chrome process per session
#[derive(Debug, Clone)]
pub struct ChromeLauncher {
    settings: BrowserSettings,
}

impl ChromeLauncher {
    pub fn new(settings: BrowserSettings) -> Self {
        Self { settings }
    }
}

#[async_trait]
impl Launcher for ChromeLauncher {
    type Driver = ChromeDriver;

    async fn launch(&self) -> Result<ChromeDriver> {
        ChromeDriver::launch(&self.settings).await
    }
}

/// Command-line flags passed to Chrome, fixed ones first.
fn launch_args(settings: &BrowserSettings) -> Vec<String> {
    let mut args: Vec<String> = [
        "--no-sandbox",
        "--disable-gpu",
        "--disable-dev-shm-usage",
        "--disable-software-rasterizer",
        "--disable-blink-features=AutomationControlled",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();

    if let Some(ref ua) = settings.user_agent {
        args.push(format!("--user-agent={}", ua));
    }
    args.extend(settings.chrome_args.iter().cloned());
    args
}
