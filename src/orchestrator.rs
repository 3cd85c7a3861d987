//! Runs every category of a source and hands each batch to the store.
//!
//! Sites without a login get one browser per category, a bounded number at a
//! time. Sites with a login share a single signed-in browser and walk their
//! categories one after another.

use std::sync::Arc;

use chrono::NaiveDate;
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::app::{HarvestError, Result};
use crate::browser::{BrowserDriver, BrowserSettings, Launcher};
use crate::config::credentials::USERNAME_VAR;
use crate::config::Credentials;
use crate::domain::{SessionState, Source};
use crate::scraper::{scrape_category, CategoryOutcome, CategorySession, SourceSettings};
use crate::store::Store;

/// How one category ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CategoryStatus {
    /// Listings were written to the store
    Stored,
    /// The category was abandoned before producing a batch
    Failed(String),
    /// Scraped, but the batch could not be written
    NotPersisted(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategoryReport {
    pub category: String,
    pub listings: usize,
    pub failed_pages: usize,
    pub degraded_details: usize,
    pub status: CategoryStatus,
}

impl CategoryReport {
    fn failed(category: &str, reason: String) -> Self {
        Self {
            category: category.to_string(),
            listings: 0,
            failed_pages: 0,
            degraded_details: 0,
            status: CategoryStatus::Failed(reason),
        }
    }

    fn scraped(outcome: &CategoryOutcome, status: CategoryStatus) -> Self {
        Self {
            category: outcome.category.clone(),
            listings: outcome.listings.len(),
            failed_pages: outcome.failed_pages.len(),
            degraded_details: outcome.degraded_details,
            status,
        }
    }
}

/// Summary of one source's run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub source: Source,
    pub categories: Vec<CategoryReport>,
    pub rows_written: usize,
    pub failed_batches: usize,
}

impl RunReport {
    fn new(source: Source) -> Self {
        Self {
            source,
            categories: Vec::new(),
            rows_written: 0,
            failed_batches: 0,
        }
    }

    fn push(&mut self, report: CategoryReport) {
        match report.status {
            CategoryStatus::Stored => self.rows_written += report.listings,
            CategoryStatus::NotPersisted(_) => self.failed_batches += 1,
            CategoryStatus::Failed(_) => {}
        }
        self.categories.push(report);
    }

    /// Every batch that was scraped also reached the store.
    pub fn persistence_ok(&self) -> bool {
        self.failed_batches == 0
    }

    pub fn failed_categories(&self) -> usize {
        self.categories
            .iter()
            .filter(|c| matches!(c.status, CategoryStatus::Failed(_)))
            .count()
    }
}

pub struct Orchestrator<S, L> {
    store: Arc<S>,
    launcher: Arc<L>,
    browser: Arc<BrowserSettings>,
}

impl<S, L> Orchestrator<S, L>
where
    S: Store + Send + Sync + 'static,
    L: Launcher + 'static,
{
    pub fn new(store: Arc<S>, launcher: Arc<L>, browser: BrowserSettings) -> Self {
        Self {
            store,
            launcher,
            browser: Arc::new(browser),
        }
    }

    /// Scrape every category of `settings.source` and persist the results.
    ///
    /// Only run-level problems are returned as errors: a missing credential, an
    /// unusable store, or a shared browser that cannot be started. Category
    /// failures are recorded in the report.
    pub async fn run(
        &self,
        settings: SourceSettings,
        credentials: Option<&Credentials>,
        date_scraped: NaiveDate,
    ) -> Result<RunReport> {
        self.store.ensure_schema()?;

        info!(
            "Scraping {} categories from {}",
            settings.categories.len(),
            settings.source
        );

        let report = if settings.login.is_some() {
            let credentials = credentials.ok_or(HarvestError::MissingCredentials(USERNAME_VAR))?;
            self.run_shared(&settings, credentials, date_scraped).await?
        } else {
            self.run_pooled(Arc::new(settings), date_scraped).await
        };

        info!(
            "{} done: {} rows written, {} categories failed, {} batches not saved",
            report.source,
            report.rows_written,
            report.failed_categories(),
            report.failed_batches
        );

        Ok(report)
    }

    /// One browser per category, at most `settings.workers` at once.
    async fn run_pooled(&self, settings: Arc<SourceSettings>, date_scraped: NaiveDate) -> RunReport {
        let mut report = RunReport::new(settings.source);
        let semaphore = Arc::new(Semaphore::new(settings.workers.max(1)));
        let mut handles = Vec::new();

        for category in settings.categories.iter().cloned() {
            let Ok(permit) = semaphore.clone().acquire_owned().await else {
                error!("Worker pool closed before {} could start", category);
                report.push(CategoryReport::failed(&category, "worker pool closed".into()));
                continue;
            };

            let launcher = self.launcher.clone();
            let store = self.store.clone();
            let browser = self.browser.clone();
            let settings = settings.clone();
            let name = category.clone();

            let handle = tokio::spawn(async move {
                let _permit = permit;
                let result =
                    scrape_category(&*launcher, &settings, &browser, &category, date_scraped).await;
                persist(&*store, &category, result)
            });

            handles.push((name, handle));
        }

        for (category, handle) in handles {
            match handle.await {
                Ok(category_report) => report.push(category_report),
                Err(e) => {
                    error!("Task join error for {}: {}", category, e);
                    report.push(CategoryReport::failed(&category, e.to_string()));
                }
            }
        }

        report
    }

    /// One signed-in browser reused for every category in turn.
    async fn run_shared(
        &self,
        settings: &SourceSettings,
        credentials: &Credentials,
        date_scraped: NaiveDate,
    ) -> Result<RunReport> {
        let driver = self.launcher.launch().await?;
        let report = self
            .scrape_in_session(&driver, settings, credentials, date_scraped)
            .await;

        if let Err(e) = driver.quit().await {
            warn!("Failed to close browser: {}", e);
        }

        Ok(report)
    }

    async fn scrape_in_session<D: BrowserDriver>(
        &self,
        driver: &D,
        settings: &SourceSettings,
        credentials: &Credentials,
        date_scraped: NaiveDate,
    ) -> RunReport {
        let mut report = RunReport::new(settings.source);
        let mut logged_in = false;

        for (i, category) in settings.categories.iter().enumerate() {
            let mut session =
                CategorySession::new(driver, settings, &self.browser, category, date_scraped);
            if !logged_in {
                session = session.with_login(credentials);
            }

            let result = session.run().await;
            match result {
                Err(e) if session.state() == SessionState::LoggingIn => {
                    let reason = e.to_string();
                    error!("Login failed, skipping remaining categories: {}", reason);
                    for category in &settings.categories[i..] {
                        report.push(CategoryReport::failed(category, reason.clone()));
                    }
                    break;
                }
                result => {
                    logged_in = true;
                    report.push(persist(&*self.store, category, result));
                }
            }
        }

        report
    }
}

/// Write a category's batch, turning the result into a report line.
fn persist<S: Store>(store: &S, category: &str, result: Result<CategoryOutcome>) -> CategoryReport {
    let outcome = match result {
        Ok(outcome) => outcome,
        Err(e) => {
            error!("Error scraping category {}: {}", category, e);
            return CategoryReport::failed(category, e.to_string());
        }
    };

    match store.upsert_batch(&outcome.listings) {
        Ok(written) => {
            info!("Saved {} listings for {}", written, category);
            CategoryReport::scraped(&outcome, CategoryStatus::Stored)
        }
        Err(e) => {
            error!("Failed to save listings for {}: {}", category, e);
            CategoryReport::scraped(&outcome, CategoryStatus::NotPersisted(e.to_string()))
        }
    }
}
