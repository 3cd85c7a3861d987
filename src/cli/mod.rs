pub mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "jobharvest")]
#[command(about = "Scrape UK job listings into SQLite", long_about = None)]
pub struct Cli {
    /// Path to the config file (default: ~/.config/jobharvest/config.toml)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Scrape every configured category from Indeed
    Indeed,
    /// Log in and scrape every configured category from LinkedIn
    #[command(name = "linkedin")]
    LinkedIn,
    /// Show how many listings are stored per source
    Count,
}
