//! Browser-driven scraping of job search results.
//!
//! # Architecture
//!
//! ```text
//! search URL → ListingPageScraper → PartialListing
//!                                      ↓
//!                       JobListing ← DetailFetcher
//! ```
//!
//! A [`CategorySession`] ties the two together for one category, page by
//! page, retrying failed pages with a [`RetryPolicy`]. Everything that
//! differs between sites lives in [`SourceSettings`].
//!
//! # Usage
//!
//! ```rust,ignore
//! use jobharvest::scraper::{scrape_category, SourceSettings};
//!
//! let settings = SourceSettings::indeed();
//! let outcome = scrape_category(&launcher, &settings, &browser, "Data Scientist", today).await?;
//! println!("{} listings", outcome.listings.len());
//! ```

mod config;
pub mod detail;
#[cfg(test)]
pub(crate) mod fixtures;
pub mod listing_page;
pub mod login;
pub mod retry;
pub mod session;
pub mod urls;

pub use config::{
    DetailPhase, DetailTab, LoginSettings, RetrySettings, Selectors, SourceSettings, WaitMode,
};
pub use detail::{DetailFetcher, DetailOutcome};
pub use listing_page::{ListingPage, ListingPageScraper};
pub use login::login;
pub use retry::RetryPolicy;
pub use session::{scrape_category, CategoryOutcome, CategorySession};
