use tracing::{debug, error, info, warn};

use crate::app::{HarvestError, Result};
use crate::browser::{
    attribute_of, scroll_until_stable, text_of, wait_for_interactable, wait_for_presence,
    BrowserDriver, BrowserSettings, DomElement,
};
use crate::domain::PartialListing;
use crate::scraper::urls::{canonical_url, search_url};
use crate::scraper::{Selectors, SourceSettings, WaitMode};

/// Cards read from one results page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListingPage {
    pub url: String,
    pub listings: Vec<PartialListing>,
    /// Cards dropped because they went stale or failed mid-read
    pub skipped: usize,
}

/// Reads summary cards off a site's search results.
#[derive(Debug, Clone, Copy)]
pub struct ListingPageScraper<'a> {
    settings: &'a SourceSettings,
    browser: &'a BrowserSettings,
}

impl<'a> ListingPageScraper<'a> {
    pub fn new(settings: &'a SourceSettings, browser: &'a BrowserSettings) -> Self {
        Self { settings, browser }
    }

    /// Load results page `page` (zero-based) for `category` and read every card.
    ///
    /// Fails with [`HarvestError::ElementTimeout`] when the result list never
    /// appears. A single bad card is skipped, never the whole page.
    pub async fn fetch<D: BrowserDriver>(
        &self,
        driver: &D,
        category: &str,
        page: usize,
    ) -> Result<ListingPage> {
        let url = search_url(self.settings, category, page);
        driver
            .navigate(&url)
            .await
            .map_err(|e| transient(page, e))?;
        self.settings.page_settle.sleep().await;

        info!("Scraping {} - page {}", category, page + 1);

        if self.settings.scroll_results {
            let height = scroll_until_stable(
                driver,
                self.browser.scroll_pause,
                self.browser.scroll_max_wait(),
            )
            .await?;
            debug!("Results settled at height {}", height);
        }

        let selectors = &self.settings.selectors;
        let timeout = self.browser.element_timeout();
        let poll = self.browser.poll_interval();
        let waited = match self.settings.wait_mode {
            WaitMode::Presence => {
                wait_for_presence(driver, &selectors.results_container, timeout, poll)
                    .await
                    .map(|_| ())
            }
            WaitMode::Interactable => {
                wait_for_interactable(driver, &selectors.results_container, timeout, poll)
                    .await
                    .map(|_| ())
            }
        };
        if let Err(e) = waited {
            if e.is_timeout() {
                error!("Timeout waiting for job cards on page {}", page + 1);
            }
            return Err(e);
        }

        let cards = driver
            .find_elements(&selectors.card)
            .await
            .map_err(|e| transient(page, e))?;
        let mut result = ListingPage {
            url: url.clone(),
            ..Default::default()
        };

        for card in &cards {
            match self.read_card(card, &url).await {
                Ok(listing) => result.listings.push(listing),
                Err(HarvestError::StaleElement(_)) => {
                    warn!("Stale element reference, skipping job card");
                    result.skipped += 1;
                }
                Err(e) => {
                    error!("Error scraping job card: {}", e);
                    result.skipped += 1;
                }
            }
        }

        info!(
            "Completed {} - page {}: {} cards read, {} skipped",
            category,
            page + 1,
            result.listings.len(),
            result.skipped
        );

        Ok(result)
    }

    async fn read_card<E: DomElement>(&self, card: &E, page_url: &str) -> Result<PartialListing> {
        let selectors: &Selectors = &self.settings.selectors;

        let title = text_of(card, &selectors.title).await?;
        let company = text_of(card, &selectors.company).await?;
        let location = text_of(card, &selectors.location).await?;
        let salary = match selectors.salary {
            Some(ref selector) => text_of(card, selector).await?,
            None => None,
        };
        let date_posted = match (&selectors.date_posted, &selectors.date_posted_attribute) {
            (Some(selector), Some(attribute)) => attribute_of(card, selector, attribute).await?,
            (Some(selector), None) => text_of(card, selector).await?,
            (None, _) => None,
        };

        let url = match attribute_of(card, &selectors.link, "href").await? {
            Some(href) if !href.trim().is_empty() => {
                match canonical_url(page_url, &href, self.settings.strip_query) {
                    Ok(url) => Some(url),
                    Err(e) => {
                        warn!("Ignoring unusable link {:?}: {}", href, e);
                        None
                    }
                }
            }
            _ => None,
        };

        Ok(PartialListing {
            title,
            company,
            location,
            salary,
            url,
            date_posted,
        })
    }
}

/// Browser failures on a results page are reported against that page.
fn transient(page: usize, error: HarvestError) -> HarvestError {
    match error {
        HarvestError::Browser(reason) => HarvestError::TransientPage { page, reason },
        other => other,
    }
}
