//! One category scraped end to end in a single browser session.

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::{debug, error, info, warn};

use crate::app::{HarvestError, Result};
use crate::browser::{BrowserDriver, BrowserSettings, Launcher};
use crate::config::Credentials;
use crate::domain::listing::{DESCRIPTION_ERROR, NOT_AVAILABLE};
use crate::domain::{JobListing, SessionState};
use crate::scraper::detail::{DetailFetcher, DetailOutcome};
use crate::scraper::listing_page::{ListingPage, ListingPageScraper};
use crate::scraper::login::login;
use crate::scraper::{DetailPhase, RetryPolicy, SourceSettings};

/// What one category produced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategoryOutcome {
    pub category: String,
    pub listings: Vec<JobListing>,
    pub pages_scraped: usize,
    /// Zero-based indexes of pages abandoned after their retries ran out
    pub failed_pages: Vec<usize>,
    pub skipped_cards: usize,
    /// Listings whose detail fields fell back to sentinels
    pub degraded_details: usize,
}

impl CategoryOutcome {
    fn new(category: &str) -> Self {
        Self {
            category: category.to_string(),
            ..Default::default()
        }
    }
}

/// Walks a category's result pages and enriches every listing found.
///
/// Failures stay inside the smallest unit they hit: a bad card is skipped,
/// a page whose retries run out is recorded in
/// [`CategoryOutcome::failed_pages`], and a failed detail fetch leaves the
/// listing with sentinel detail fields. The category itself only fails when
/// no page could be read at all, or when login fails.
pub struct CategorySession<'a, D> {
    driver: &'a D,
    settings: &'a SourceSettings,
    browser: &'a BrowserSettings,
    category: &'a str,
    date_scraped: NaiveDate,
    credentials: Option<&'a Credentials>,
    state: SessionState,
}

impl<'a, D: BrowserDriver> CategorySession<'a, D> {
    pub fn new(
        driver: &'a D,
        settings: &'a SourceSettings,
        browser: &'a BrowserSettings,
        category: &'a str,
        date_scraped: NaiveDate,
    ) -> Self {
        Self {
            driver,
            settings,
            browser,
            category,
            date_scraped,
            credentials: None,
            state: SessionState::Idle,
        }
    }

    /// Sign in before the first page. Ignored for sites without a login form.
    pub fn with_login(mut self, credentials: &'a Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    fn transition(&mut self, next: SessionState) {
        if !self.state.can_transition_to(next) {
            warn!(
                category = %self.category,
                "Unexpected session transition: {} -> {}", self.state, next
            );
        }
        debug!(category = %self.category, "{} -> {}", self.state, next);
        self.state = next;
    }

    fn fatal(&self, reason: impl Into<String>) -> HarvestError {
        HarvestError::FatalCategory {
            category: self.category.to_string(),
            reason: reason.into(),
        }
    }

    pub async fn run(&mut self) -> Result<CategoryOutcome> {
        let (driver, settings, browser, category) =
            (self.driver, self.settings, self.browser, self.category);

        if let (Some(credentials), Some(form)) = (self.credentials, settings.login.as_ref()) {
            self.transition(SessionState::LoggingIn);
            login(driver, form, credentials, browser)
                .await
                .map_err(|e| self.fatal(format!("login failed: {}", e)))?;
        }

        let mut outcome = CategoryOutcome::new(category);
        let mut seen = HashSet::new();
        let scraper = ListingPageScraper::new(settings, browser);
        let page_policy = RetryPolicy::from(settings.page_retry);

        for page in 0..settings.max_pages {
            self.transition(SessionState::ScrapingPage(page));

            let state = &mut self.state;
            let result = page_policy
                .run_observed(
                    &format!("{} page {}", category, page + 1),
                    |_| scraper.fetch(driver, category, page),
                    |attempt, _, _| *state = SessionState::Retrying { page, attempt },
                )
                .await;

            let listing_page = match result {
                Ok(listing_page) => listing_page,
                Err(e) => {
                    error!(category = %category, "Abandoning page {}: {}", page + 1, e);
                    outcome.failed_pages.push(page);
                    continue;
                }
            };

            outcome.pages_scraped += 1;
            outcome.skipped_cards += listing_page.skipped;
            let mut fresh = self.collect(listing_page, &mut seen, &mut outcome.skipped_cards);

            if settings.detail_phase == DetailPhase::PerPage && !fresh.is_empty() {
                self.transition(SessionState::FetchingDetails);
                outcome.degraded_details += self.enrich_all(&mut fresh).await;
            }
            outcome.listings.append(&mut fresh);
        }

        if settings.max_pages > 0 && outcome.pages_scraped == 0 {
            return Err(self.fatal(format!("all {} result pages failed", settings.max_pages)));
        }

        if settings.detail_phase == DetailPhase::AfterAllPages && !outcome.listings.is_empty() {
            self.transition(SessionState::FetchingDetails);
            outcome.degraded_details += self.enrich_all(&mut outcome.listings).await;
        }

        self.transition(SessionState::Done);
        info!(
            category = %category,
            "Collected {} listings ({} pages failed, {} cards skipped, {} details degraded)",
            outcome.listings.len(),
            outcome.failed_pages.len(),
            outcome.skipped_cards,
            outcome.degraded_details
        );

        Ok(outcome)
    }

    /// Turn a page's cards into listings, dropping URL-less cards and repeats.
    fn collect(
        &self,
        page: ListingPage,
        seen: &mut HashSet<String>,
        skipped: &mut usize,
    ) -> Vec<JobListing> {
        let mut fresh = Vec::with_capacity(page.listings.len());
        for partial in page.listings {
            let title = partial.title.clone();
            let listing =
                JobListing::from_partial(self.settings.source, self.category, partial, self.date_scraped);
            match listing {
                Some(listing) if seen.insert(listing.url.clone()) => fresh.push(listing),
                Some(listing) => debug!("Already collected {}", listing.url),
                None => {
                    warn!(
                        category = %self.category,
                        "Skipping job card without a link: {}",
                        title.as_deref().unwrap_or(NOT_AVAILABLE)
                    );
                    *skipped += 1;
                }
            }
        }
        fresh
    }

    /// Fetch the detail page of every listing. Returns how many were degraded.
    async fn enrich_all(&self, listings: &mut [JobListing]) -> usize {
        let driver = self.driver;
        let fetcher = DetailFetcher::new(self.settings, self.browser);
        let policy = RetryPolicy::from(self.settings.detail_retry);
        let mut degraded = 0;

        for (i, listing) in listings.iter_mut().enumerate() {
            if i > 0 {
                self.settings.between_details.sleep().await;
            }

            match fetcher.enrich(driver, listing, &policy).await {
                Ok(DetailOutcome::Loaded(_)) => {}
                Ok(DetailOutcome::TimedOut) => degraded += 1,
                Err(e) => {
                    error!("Error fetching description for {}: {}", listing.url, e);
                    listing.degrade_detail(DESCRIPTION_ERROR);
                    degraded += 1;
                }
            }
        }

        degraded
    }
}

/// Scrape one category in a browser of its own.
///
/// The browser is shut down whether or not the scrape succeeded.
pub async fn scrape_category<L: Launcher>(
    launcher: &L,
    settings: &SourceSettings,
    browser: &BrowserSettings,
    category: &str,
    date_scraped: NaiveDate,
) -> Result<CategoryOutcome> {
    let driver = launcher
        .launch()
        .await
        .map_err(|e| HarvestError::FatalCategory {
            category: category.to_string(),
            reason: format!("browser launch failed: {}", e),
        })?;

    let result = CategorySession::new(&driver, settings, browser, category, date_scraped)
        .run()
        .await;

    if let Err(e) = driver.quit().await {
        warn!(category = %category, "Failed to close browser: {}", e);
    }

    result
}
