//! # jobharvest
//!
//! Headless-browser scraper for UK job listings from Indeed and LinkedIn,
//! stored in a local SQLite database.
//!
//! ## Architecture
//!
//! ```text
//! Orchestrator → CategorySession → ListingPageScraper → DetailFetcher → Store
//! ```
//!
//! - [`browser`]: Browser capability traits and the Chrome implementation
//! - [`scraper`]: Result pages, detail pages, login, retries
//! - [`orchestrator`]: Worker pool and shared-session runs
//! - [`store`]: SQLite persistence
//!
//! ## Quick Start
//!
//! ```bash
//! # Scrape Indeed with three browsers in parallel
//! jobharvest indeed
//!
//! # Scrape LinkedIn (needs LINKEDIN_USERNAME and LINKEDIN_PASSWORD)
//! jobharvest linkedin
//!
//! # How many listings are stored
//! jobharvest count
//! ```

/// Application context and error handling.
///
/// The [`AppContext`](app::AppContext) struct wires configuration to the store.
pub mod app;

/// Browser automation.
///
/// - [`BrowserDriver`](browser::BrowserDriver): One browser session
/// - [`ChromeDriver`](browser::ChromeDriver): chromiumoxide-backed implementation
/// - [`accessor`](browser::accessor): Bounded waits and optional lookups
pub mod browser;

/// Command-line interface using clap.
///
/// - `indeed` - Scrape Indeed
/// - `linkedin` - Scrape LinkedIn
/// - `count` - Show stored listing counts
pub mod cli;

/// Configuration management.
///
/// Loads from `~/.config/jobharvest/config.toml`, supporting per-source
/// categories, page limits, delays, retries and CSS selectors.
pub mod config;

/// Core domain models.
///
/// - [`JobListing`](domain::JobListing): One scraped posting
/// - [`SessionState`](domain::SessionState): Category session lifecycle
pub mod domain;

/// Runs a source's categories and persists each batch.
pub mod orchestrator;

/// Scraping of search results and listing pages.
pub mod scraper;

/// SQLite persistence layer.
///
/// - [`Store`](store::Store): Trait defining storage operations
/// - [`SqliteStore`](store::SqliteStore): SQLite implementation
pub mod store;
