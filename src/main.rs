use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use jobharvest::app::AppContext;
use jobharvest::cli::{commands, Cli, Commands};
use jobharvest::domain::Source;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let ctx = AppContext::new(cli.config.as_deref())?;

    let source = match cli.command {
        Commands::Indeed => Source::Indeed,
        Commands::LinkedIn => Source::LinkedIn,
        Commands::Count => {
            commands::count(&ctx)?;
            return Ok(ExitCode::SUCCESS);
        }
    };

    let report = commands::harvest(&ctx, source).await?;
    if report.persistence_ok() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::FAILURE)
    }
}
