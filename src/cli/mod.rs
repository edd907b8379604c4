pub mod commands;

use clap::{Parser, Subcommand};
use crate::error::Result;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "news-reader")]
#[command(about = "Read news headlines and searches with an offline cache")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(short, long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing configuration
        #[arg(short, long)]
        force: bool,
    },

    /// Show top headlines (page 1 is cached for offline use)
    Headlines {
        /// Two-letter country code
        #[arg(long)]
        country: Option<String>,

        /// Number of pages to scroll through
        #[arg(short, long, default_value_t = 1)]
        pages: usize,

        /// Articles per page
        #[arg(long)]
        page_size: Option<u32>,
    },

    /// Show the regional feed
    Regional {
        /// Number of pages to scroll through
        #[arg(short, long, default_value_t = 1)]
        pages: usize,
    },

    /// Search all articles
    Search {
        /// Search terms
        query: String,

        /// Oldest publication date (ISO-8601)
        #[arg(long)]
        from: Option<String>,

        /// Newest publication date (ISO-8601)
        #[arg(long)]
        to: Option<String>,

        /// Ordering: publishedAt, relevancy or popularity
        #[arg(long)]
        sort_by: Option<String>,

        /// Number of pages to scroll through
        #[arg(short, long, default_value_t = 1)]
        pages: usize,
    },

    /// Show the cached top headlines without going online
    Cached,

    /// Show configuration and cache status
    Status,

    /// Remove every cached article
    ClearCache,

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let config = commands::load_config(self.config.clone())?;
        commands::init_logging(self.debug, self.verbose, &config.logging)?;

        match self.command {
            Commands::Init { force } => {
                commands::init(self.config, force).await
            }
            Commands::Headlines { country, pages, page_size } => {
                commands::headlines(&config, country, pages, page_size).await
            }
            Commands::Regional { pages } => {
                commands::regional(&config, pages).await
            }
            Commands::Search { query, from, to, sort_by, pages } => {
                commands::search(&config, query, from, to, sort_by, pages).await
            }
            Commands::Cached => {
                commands::cached(&config).await
            }
            Commands::Status => {
                commands::status(&config, self.config).await
            }
            Commands::ClearCache => {
                commands::clear_cache(&config).await
            }
            Commands::Completions { shell } => {
                commands::generate_completions(shell);
                Ok(())
            }
        }
    }
}
