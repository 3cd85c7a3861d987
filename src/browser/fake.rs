//! Scripted in-memory browser for tests.
//!
//! Pages are canned DOM trees served per URL. Each node lists the selectors
//! it answers to, so lookups are plain string matches.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::app::{HarvestError, Result};
use crate::browser::accessor::{SCROLL_HEIGHT_SCRIPT, SCROLL_TO_BOTTOM_SCRIPT};
use crate::browser::{BrowserDriver, DomElement, Launcher, Scope, TabHandle};

#[derive(Debug, Clone)]
pub struct FakeNode {
    matches: Vec<String>,
    text: String,
    attrs: HashMap<String, String>,
    children: Vec<FakeNode>,
    interactable: bool,
    stale: bool,
}

impl FakeNode {
    pub fn new(selector: &str) -> Self {
        Self {
            matches: vec![selector.to_string()],
            text: String::new(),
            attrs: HashMap::new(),
            children: Vec::new(),
            interactable: true,
            stale: false,
        }
    }

    /// Also answer to `selector`.
    pub fn also(mut self, selector: &str) -> Self {
        self.matches.push(selector.to_string());
        self
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_string();
        self
    }

    pub fn attr(mut self, name: &str, value: &str) -> Self {
        self.attrs.insert(name.to_string(), value.to_string());
        self
    }

    pub fn child(mut self, node: FakeNode) -> Self {
        self.children.push(node);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.interactable = false;
        self
    }

    /// Every access through this node reports a stale reference.
    pub fn stale(mut self) -> Self {
        self.stale = true;
        self
    }

    fn answers_to(&self, selector: &str) -> bool {
        self.matches.iter().any(|m| m == selector)
    }

    fn collect_descendants(&self, selector: &str, out: &mut Vec<FakeNode>) {
        for child in &self.children {
            if child.answers_to(selector) {
                out.push(child.clone());
            }
            child.collect_descendants(selector, out);
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct FakePage {
    roots: Vec<FakeNode>,
    heights: Vec<u64>,
}

impl FakePage {
    pub fn new(roots: Vec<FakeNode>) -> Self {
        Self {
            roots,
            heights: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Successive `document.body.scrollHeight` values, advanced by each scroll.
    pub fn with_heights(mut self, heights: Vec<u64>) -> Self {
        self.heights = heights;
        self
    }

    fn find_all(&self, selector: &str) -> Vec<FakeNode> {
        let mut out = Vec::new();
        for root in &self.roots {
            if root.answers_to(selector) {
                out.push(root.clone());
            }
            root.collect_descendants(selector, &mut out);
        }
        out
    }
}

#[derive(Debug, Clone)]
enum Response {
    Page(FakePage),
    Fail(String),
}

#[derive(Debug, Default)]
struct Shared {
    routes: HashMap<String, VecDeque<Response>>,
    events: Vec<String>,
    navigations: HashMap<String, usize>,
    scrolls: usize,
    quits: usize,
}

#[derive(Debug, Default)]
struct Tab {
    page: FakePage,
    generation: u64,
    scroll_index: usize,
}

#[derive(Debug)]
struct Tabs {
    tabs: Vec<Option<Tab>>,
    current: usize,
    next_generation: u64,
    closed: bool,
}

impl Tabs {
    fn new() -> Self {
        Self {
            tabs: vec![Some(Tab::default())],
            current: 0,
            next_generation: 1,
            closed: false,
        }
    }

    fn active(&mut self) -> Result<&mut Tab> {
        if self.closed {
            return Err(HarvestError::Browser("browser has quit".into()));
        }
        self.tabs
            .get_mut(self.current)
            .and_then(|t| t.as_mut())
            .ok_or_else(|| HarvestError::Browser("no active tab".into()))
    }
}

/// In-memory [`BrowserDriver`].
#[derive(Debug, Clone)]
pub struct FakeDriver {
    shared: Arc<Mutex<Shared>>,
    tabs: Arc<Mutex<Tabs>>,
}

impl Default for FakeDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeDriver {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Mutex::new(Shared::default())),
            tabs: Arc::new(Mutex::new(Tabs::new())),
        }
    }

    /// A new browser window sharing this driver's routes and event log.
    pub fn fresh_session(&self) -> Self {
        Self {
            shared: self.shared.clone(),
            tabs: Arc::new(Mutex::new(Tabs::new())),
        }
    }

    /// Queue `page` as the next response for `url`. The last queued
    /// response keeps being served once the others are used up.
    pub fn serve(&self, url: &str, page: FakePage) {
        self.push(url, Response::Page(page));
    }

    /// Queue a navigation failure for `url`.
    pub fn fail(&self, url: &str, message: &str) {
        self.push(url, Response::Fail(message.to_string()));
    }

    fn push(&self, url: &str, response: Response) {
        self.shared
            .lock()
            .unwrap()
            .routes
            .entry(url.to_string())
            .or_default()
            .push_back(response);
    }

    pub fn events(&self) -> Vec<String> {
        self.shared.lock().unwrap().events.clone()
    }

    pub fn navigations(&self, url: &str) -> usize {
        self.shared
            .lock()
            .unwrap()
            .navigations
            .get(url)
            .copied()
            .unwrap_or(0)
    }

    pub fn scroll_count(&self) -> usize {
        self.shared.lock().unwrap().scrolls
    }

    pub fn quit_count(&self) -> usize {
        self.shared.lock().unwrap().quits
    }

    pub fn open_tab_count(&self) -> usize {
        self.tabs.lock().unwrap().tabs.iter().filter(|t| t.is_some()).count()
    }

    pub fn active_tab(&self) -> TabHandle {
        TabHandle(self.tabs.lock().unwrap().current)
    }

    fn log(&self, event: String) {
        self.shared.lock().unwrap().events.push(event);
    }

    fn next_response(&self, url: &str) -> Response {
        let mut shared = self.shared.lock().unwrap();
        *shared.navigations.entry(url.to_string()).or_insert(0) += 1;
        match shared.routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap_or(Response::Page(FakePage::empty())),
            Some(queue) => queue.front().cloned().unwrap_or(Response::Page(FakePage::empty())),
            None => Response::Page(FakePage::empty()),
        }
    }

    fn element(&self, node: FakeNode, tab: usize, generation: u64) -> FakeElement {
        FakeElement {
            shared: self.shared.clone(),
            tabs: self.tabs.clone(),
            node,
            tab,
            generation,
        }
    }
}

#[async_trait]
impl Scope for FakeDriver {
    type Element = FakeElement;

    async fn find_element(&self, selector: &str) -> Result<FakeElement> {
        self.find_elements(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| HarvestError::ElementNotFound(selector.to_string()))
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<FakeElement>> {
        let (nodes, tab, generation) = {
            let mut tabs = self.tabs.lock().unwrap();
            let current = tabs.current;
            let active = tabs.active()?;
            (active.page.find_all(selector), current, active.generation)
        };
        Ok(nodes
            .into_iter()
            .map(|node| self.element(node, tab, generation))
            .collect())
    }
}

#[async_trait]
impl BrowserDriver for FakeDriver {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.log(format!("navigate {}", url));
        let response = self.next_response(url);
        let mut tabs = self.tabs.lock().unwrap();
        let generation = tabs.next_generation;
        tabs.next_generation += 1;
        let active = tabs.active()?;
        match response {
            Response::Page(page) => {
                active.page = page;
                active.generation = generation;
                active.scroll_index = 0;
                Ok(())
            }
            Response::Fail(message) => {
                active.page = FakePage::empty();
                active.generation = generation;
                Err(HarvestError::Browser(message))
            }
        }
    }

    async fn execute_script(&self, script: &str) -> Result<serde_json::Value> {
        let mut tabs = self.tabs.lock().unwrap();
        let active = tabs.active()?;
        let last = active.page.heights.len().saturating_sub(1);
        match script {
            SCROLL_HEIGHT_SCRIPT => {
                let height = active
                    .page
                    .heights
                    .get(active.scroll_index.min(last))
                    .copied()
                    .unwrap_or(0);
                Ok(serde_json::json!(height))
            }
            SCROLL_TO_BOTTOM_SCRIPT => {
                active.scroll_index = (active.scroll_index + 1).min(last);
                drop(tabs);
                self.shared.lock().unwrap().scrolls += 1;
                Ok(serde_json::Value::Null)
            }
            _ => Ok(serde_json::Value::Null),
        }
    }

    async fn current_tab(&self) -> Result<TabHandle> {
        let mut tabs = self.tabs.lock().unwrap();
        let current = tabs.current;
        tabs.active()?;
        Ok(TabHandle(current))
    }

    async fn open_tab(&self) -> Result<TabHandle> {
        let handle = {
            let mut tabs = self.tabs.lock().unwrap();
            if tabs.closed {
                return Err(HarvestError::Browser("browser has quit".into()));
            }
            tabs.tabs.push(Some(Tab::default()));
            TabHandle(tabs.tabs.len() - 1)
        };
        self.log(format!("open_tab {}", handle.0));
        Ok(handle)
    }

    async fn switch_tab(&self, tab: TabHandle) -> Result<()> {
        {
            let mut tabs = self.tabs.lock().unwrap();
            if !matches!(tabs.tabs.get(tab.0), Some(Some(_))) {
                return Err(HarvestError::Browser(format!("no such tab: {}", tab.0)));
            }
            tabs.current = tab.0;
        }
        self.log(format!("switch_tab {}", tab.0));
        Ok(())
    }

    async fn close_tab(&self, tab: TabHandle) -> Result<()> {
        {
            let mut tabs = self.tabs.lock().unwrap();
            match tabs.tabs.get_mut(tab.0) {
                Some(slot @ Some(_)) => *slot = None,
                _ => return Err(HarvestError::Browser(format!("no such tab: {}", tab.0))),
            }
        }
        self.log(format!("close_tab {}", tab.0));
        Ok(())
    }

    async fn quit(&self) -> Result<()> {
        self.tabs.lock().unwrap().closed = true;
        let mut shared = self.shared.lock().unwrap();
        shared.quits += 1;
        shared.events.push("quit".to_string());
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct FakeElement {
    shared: Arc<Mutex<Shared>>,
    tabs: Arc<Mutex<Tabs>>,
    node: FakeNode,
    tab: usize,
    generation: u64,
}

impl FakeElement {
    fn name(&self) -> String {
        self.node.matches.first().cloned().unwrap_or_default()
    }

    fn check_live(&self) -> Result<()> {
        if self.node.stale {
            return Err(HarvestError::StaleElement(self.name()));
        }
        let tabs = self.tabs.lock().unwrap();
        match tabs.tabs.get(self.tab) {
            Some(Some(tab)) if tab.generation == self.generation => Ok(()),
            _ => Err(HarvestError::StaleElement(self.name())),
        }
    }

    fn wrap(&self, node: FakeNode) -> FakeElement {
        FakeElement {
            shared: self.shared.clone(),
            tabs: self.tabs.clone(),
            node,
            tab: self.tab,
            generation: self.generation,
        }
    }
}

#[async_trait]
impl Scope for FakeElement {
    type Element = FakeElement;

    async fn find_element(&self, selector: &str) -> Result<FakeElement> {
        self.find_elements(selector)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| HarvestError::ElementNotFound(selector.to_string()))
    }

    async fn find_elements(&self, selector: &str) -> Result<Vec<FakeElement>> {
        self.check_live()?;
        let mut nodes = Vec::new();
        self.node.collect_descendants(selector, &mut nodes);
        Ok(nodes.into_iter().map(|n| self.wrap(n)).collect())
    }
}

#[async_trait]
impl DomElement for FakeElement {
    async fn text(&self) -> Result<String> {
        self.check_live()?;
        Ok(self.node.text.clone())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.check_live()?;
        Ok(self.node.attrs.get(name).cloned())
    }

    async fn is_interactable(&self) -> Result<bool> {
        self.check_live()?;
        Ok(self.node.interactable)
    }

    async fn click(&self) -> Result<()> {
        self.check_live()?;
        self.shared
            .lock()
            .unwrap()
            .events
            .push(format!("click {}", self.name()));
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        self.check_live()?;
        self.shared
            .lock()
            .unwrap()
            .events
            .push(format!("type {} {}", self.name(), text));
        Ok(())
    }
}

/// Hands out fresh windows of one [`FakeDriver`], optionally failing a launch.
pub struct FakeLauncher {
    driver: FakeDriver,
    fail_on: Option<usize>,
    launches: AtomicUsize,
}

impl FakeLauncher {
    pub fn new(driver: FakeDriver) -> Self {
        Self {
            driver,
            fail_on: None,
            launches: AtomicUsize::new(0),
        }
    }

    /// Make the `n`th launch (1-based) fail.
    pub fn failing_launch(mut self, n: usize) -> Self {
        self.fail_on = Some(n);
        self
    }

    pub fn launches(&self) -> usize {
        self.launches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Launcher for FakeLauncher {
    type Driver = FakeDriver;

    async fn launch(&self) -> Result<FakeDriver> {
        let n = self.launches.fetch_add(1, Ordering::SeqCst) + 1;
        if self.fail_on == Some(n) {
            return Err(HarvestError::Browser("failed to launch browser".into()));
        }
        Ok(self.driver.fresh_session())
    }
}
