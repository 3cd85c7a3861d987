use tracing::{debug, warn};

use crate::app::Result;
use crate::browser::{
    text_of, wait_for_interactable, wait_for_presence, BrowserDriver, BrowserSettings,
    DomElement, TabHandle,
};
use crate::domain::listing::DESCRIPTION_UNAVAILABLE;
use crate::domain::{JobListing, ListingDetail};
use crate::scraper::{DetailTab, RetryPolicy, SourceSettings, WaitMode};

/// What a detail page load produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DetailOutcome {
    Loaded(ListingDetail),
    /// The description never appeared
    TimedOut,
}

impl DetailOutcome {
    pub fn apply_to(self, listing: &mut JobListing) {
        match self {
            DetailOutcome::Loaded(detail) => listing.apply_detail(detail),
            DetailOutcome::TimedOut => listing.degrade_detail(DESCRIPTION_UNAVAILABLE),
        }
    }
}

/// Opens a listing's own page and reads its description and extras.
#[derive(Debug, Clone, Copy)]
pub struct DetailFetcher<'a> {
    settings: &'a SourceSettings,
    browser: &'a BrowserSettings,
}

impl<'a> DetailFetcher<'a> {
    pub fn new(settings: &'a SourceSettings, browser: &'a BrowserSettings) -> Self {
        Self { settings, browser }
    }

    /// Fetch and merge detail fields into `listing`, retrying per `policy`.
    ///
    /// A missing description is not an error: the detail fields fall back to
    /// their sentinels and the returned outcome is [`DetailOutcome::TimedOut`].
    /// Navigation and driver failures that outlast the policy are returned
    /// with `listing` untouched.
    pub async fn enrich<D: BrowserDriver>(
        &self,
        driver: &D,
        listing: &mut JobListing,
        policy: &RetryPolicy,
    ) -> Result<DetailOutcome> {
        let fetcher = *self;
        let url = listing.url.clone();
        let outcome = policy
            .run("Detail fetch", |_| fetcher.fetch(driver, &url))
            .await?;
        outcome.clone().apply_to(listing);
        Ok(outcome)
    }

    /// Load `url` according to the site's tab mode and read the detail fields.
    pub async fn fetch<D: BrowserDriver>(&self, driver: &D, url: &str) -> Result<DetailOutcome> {
        match self.settings.detail_tab {
            DetailTab::SameTab => self.read(driver, url).await,
            DetailTab::NewTab => self.read_in_new_tab(driver, url).await,
        }
    }

    async fn read_in_new_tab<D: BrowserDriver>(&self, driver: &D, url: &str) -> Result<DetailOutcome> {
        let original = driver.current_tab().await?;
        let tab = driver.open_tab().await?;

        let outcome = match driver.switch_tab(tab).await {
            Ok(()) => self.read(driver, url).await,
            Err(e) => Err(e),
        };
        let restored = restore_tab(driver, tab, original).await;

        let outcome = outcome?;
        restored?;
        Ok(outcome)
    }

    async fn read<D: BrowserDriver>(&self, driver: &D, url: &str) -> Result<DetailOutcome> {
        driver.navigate(url).await?;
        self.settings.detail_settle.sleep().await;

        let selectors = &self.settings.selectors;
        let timeout = self.browser.element_timeout();
        let poll = self.browser.poll_interval();
        let waited = match self.settings.wait_mode {
            WaitMode::Presence => wait_for_presence(driver, &selectors.description, timeout, poll).await,
            WaitMode::Interactable => {
                wait_for_interactable(driver, &selectors.description, timeout, poll).await
            }
        };

        let description = match waited {
            Ok(element) => element.text().await?,
            Err(e) if e.is_timeout() => {
                warn!("Timeout while fetching job description for {}", url);
                return Ok(DetailOutcome::TimedOut);
            }
            Err(e) => return Err(e),
        };

        let detailed_salary = optional_text(driver, selectors.detailed_salary.as_deref()).await?;
        let job_type = optional_text(driver, selectors.job_type.as_deref()).await?;
        let detailed_location = optional_text(driver, selectors.detailed_location.as_deref()).await?;

        debug!("Fetched {} chars of description from {}", description.len(), url);

        Ok(DetailOutcome::Loaded(ListingDetail {
            description,
            detailed_salary,
            job_type,
            detailed_location,
        }))
    }
}

async fn optional_text<D: BrowserDriver>(driver: &D, selector: Option<&str>) -> Result<Option<String>> {
    match selector {
        Some(selector) => text_of(driver, selector).await,
        None => Ok(None),
    }
}

/// Close the detail tab and give focus back to the tab we came from.
async fn restore_tab<D: BrowserDriver>(driver: &D, tab: TabHandle, original: TabHandle) -> Result<()> {
    let closed = driver.close_tab(tab).await;
    let switched = driver.switch_tab(original).await;
    if let Err(ref e) = closed {
        warn!("Failed to close detail tab: {}", e);
    }
    switched
}
