use std::sync::Arc;

use chrono::{Local, NaiveDate};

use crate::app::{AppContext, Result};
use crate::browser::{ChromeLauncher, Launcher};
use crate::config::Credentials;
use crate::domain::Source;
use crate::orchestrator::{CategoryStatus, Orchestrator, RunReport};
use crate::store::Store;

/// Scrape every category of `source` with headless Chrome.
pub async fn harvest(ctx: &AppContext, source: Source) -> Result<RunReport> {
    let launcher = Arc::new(ChromeLauncher::new(ctx.config.browser.clone()));
    harvest_with(ctx, source, launcher, Local::now().date_naive()).await
}

pub async fn harvest_with<L: Launcher + 'static>(
    ctx: &AppContext,
    source: Source,
    launcher: Arc<L>,
    date_scraped: NaiveDate,
) -> Result<RunReport> {
    let settings = ctx.config.source(source).clone();

    // Checked before any browser is started
    let credentials = match settings.login {
        Some(_) => Some(Credentials::from_env()?),
        None => None,
    };

    println!(
        "Scraping {} categories from {}...",
        settings.categories.len(),
        source
    );

    let orchestrator = Orchestrator::new(ctx.store.clone(), launcher, ctx.config.browser.clone());
    let report = orchestrator
        .run(settings, credentials.as_ref(), date_scraped)
        .await?;

    print_report(&report);
    Ok(report)
}

fn print_report(report: &RunReport) {
    for category in &report.categories {
        match &category.status {
            CategoryStatus::Stored => println!(
                "  {}: {} listings ({} pages failed, {} without details)",
                category.category, category.listings, category.failed_pages, category.degraded_details
            ),
            CategoryStatus::Failed(reason) => {
                eprintln!("  {}: failed: {}", category.category, reason)
            }
            CategoryStatus::NotPersisted(reason) => {
                eprintln!("  {}: not saved: {}", category.category, reason)
            }
        }
    }

    println!(
        "{} complete: {} listings saved, {} categories failed",
        report.source,
        report.rows_written,
        report.failed_categories()
    );
}

pub fn count(ctx: &AppContext) -> Result<()> {
    let counts = ctx.store.count_by_source()?;

    if counts.is_empty() {
        println!("No listings stored");
        return Ok(());
    }

    for (source, n) in &counts {
        println!("{:<10} {}", source.as_str(), n);
    }
    println!("{:<10} {}", "Total", ctx.store.count()?);

    Ok(())
}
