use std::io;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, info, warn};

use crate::cli::Cli;
use crate::config::{Config, LoggingConfig};
use crate::controller::{FeedController, FeedKind, FeedState, LoadMoreOutcome, SearchController};
use crate::error::{Error, Result};
use crate::news::client::NewsClient;
use crate::news::SearchRequest;
use crate::storage::{ArticleStore, FileArticleStore, MemoryArticleStore, Repository};

/// Load the configuration from `config_path` or the default location.
pub fn load_config(config_path: Option<PathBuf>) -> Result<Config> {
    let config_file = get_config_file(config_path)?;
    Config::load_or_default(&config_file)
}

/// Wire the HTTP client and the article store into a repository.
pub fn build_repository(config: &Config) -> Result<Repository> {
    let mut client = NewsClient::new(config.api.base_url.clone())?
        .with_timeout(Duration::from_secs(config.api.timeout))
        .with_user_agent(config.api.user_agent.clone());

    match &config.api.api_key {
        Some(key) => client = client.with_api_key(key.clone()),
        None => warn!("No API key configured; set NEWS_API_KEY or [api].api_key"),
    }

    Ok(Repository::new(Arc::new(client), open_store(config)?))
}

fn open_store(config: &Config) -> Result<Arc<dyn ArticleStore>> {
    if !config.cache.enabled {
        debug!("Article cache disabled, using memory store");
        return Ok(Arc::new(MemoryArticleStore::default()));
    }

    let store = FileArticleStore::open(config.store_dir()?)?;
    debug!("Using article store at {}", store.path().display());
    Ok(Arc::new(store))
}

/// Write a default configuration file
pub async fn init(config_path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_file = get_config_file(config_path)?;

    if config_file.exists() && !force {
        warn!("Configuration file already exists: {}", config_file.display());
        println!("Configuration already exists: {}", config_file.display());
        println!("   Use --force to overwrite it.");
        return Ok(());
    }

    let config = Config::default();
    config.save(&config_file)?;
    info!("Created default configuration: {}", config_file.display());

    println!("✅ news-reader initialized");
    println!("   Config file: {}", config_file.display());
    if let Ok(cache_dir) = config.store_dir() {
        println!("   Cache directory: {}", cache_dir.display());
    }
    println!();
    println!("Next steps:");
    println!("   1. export NEWS_API_KEY=<your key>");
    println!("   2. news-reader headlines");

    Ok(())
}

/// Show top headlines, scrolling through `pages` pages
pub async fn headlines(
    config: &Config,
    country: Option<String>,
    pages: usize,
    page_size: Option<u32>,
) -> Result<()> {
    let repo = Arc::new(build_repository(config)?);
    let country = country.unwrap_or_else(|| config.feeds.country.clone());
    let page_size = page_size.unwrap_or(config.feeds.page_size);

    let feed = FeedController::new(repo, FeedKind::headlines(country.clone()), page_size);
    run_feed(&format!("Top headlines ({})", country), &feed, pages).await
}

/// Show the regional feed
pub async fn regional(config: &Config, pages: usize) -> Result<()> {
    let repo = Arc::new(build_repository(config)?);
    let query = config.feeds.regional_query.clone();

    let feed = FeedController::new(repo, FeedKind::regional(query.clone()), config.feeds.page_size);
    run_feed(&format!("Regional news ({})", query), &feed, pages).await
}

/// Run a search
pub async fn search(
    config: &Config,
    query: String,
    from: Option<String>,
    to: Option<String>,
    sort_by: Option<String>,
    pages: usize,
) -> Result<()> {
    if query.trim().is_empty() {
        return Err(Error::Invalid("Search query cannot be empty".to_string()));
    }

    let repo = Arc::new(build_repository(config)?);
    let search = SearchController::new(repo, config.feeds.page_size);

    let mut request = SearchRequest::new(query.clone());
    request.from = from;
    request.to = to;
    request.sort_by = sort_by.unwrap_or_else(|| config.feeds.sort_by.clone());

    let state = search.search_with(request).await;
    if let Some(error) = &state.last_error {
        return Err(Error::Unavailable(format!("Search for '{}' failed: {}", query, error)));
    }

    match search.results() {
        Some(feed) => {
            scroll(&*feed, pages).await;
            print_feed(&format!("Search: {}", query), &feed.state());
        }
        None => print_feed(&format!("Search: {}", query), &state),
    }

    Ok(())
}

/// Show the cached top headlines
pub async fn cached(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    let articles = store.read_category(crate::storage::CATEGORY_TOP_HEADLINES).await?;

    if articles.is_empty() {
        println!("📭 No cached headlines yet. Run 'news-reader headlines' while online.");
        return Ok(());
    }

    println!("📦 Cached top headlines ({} articles)", articles.len());
    println!("==================================");
    for (i, article) in articles.iter().enumerate() {
        println!("{:>3}. {}", i + 1, article.headline());
    }

    Ok(())
}

/// Show configuration and cache status
pub async fn status(config: &Config, config_path: Option<PathBuf>) -> Result<()> {
    let config_file = get_config_file(config_path)?;

    println!("📊 news-reader status");
    println!("=====================");

    if config_file.exists() {
        println!("✅ Configuration: {}", config_file.display());
    } else {
        println!("⚪ Configuration: defaults (no file at {})", config_file.display());
    }
    println!("   API: {}", config.api.base_url);
    println!("   API key: {}", if config.api.api_key.is_some() { "set" } else { "missing" });
    println!("   Country: {}  Regional query: {}  Page size: {}",
             config.feeds.country, config.feeds.regional_query, config.feeds.page_size);

    if !config.cache.enabled {
        println!("⚪ Cache: disabled");
        return Ok(());
    }

    let store = open_store(config)?;
    let stats = store.stats().await?;
    println!("✅ Cache: {}", config.store_dir()?.display());
    println!("   💾 Cached articles: {}", stats.total_records);
    for (category, count) in &stats.records_by_category {
        println!("      {}: {}", category, count);
    }
    println!("   📦 Storage size: {} bytes", stats.storage_size_bytes);
    if let Some(last_write) = stats.last_write {
        println!("   🕒 Last update: {}", last_write.format("%Y-%m-%d %H:%M:%S UTC"));
    }

    Ok(())
}

/// Remove every cached article
pub async fn clear_cache(config: &Config) -> Result<()> {
    let store = open_store(config)?;
    store.clear().await?;
    println!("🧹 Article cache cleared");
    Ok(())
}

/// Generate shell completions
pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

async fn run_feed<R>(title: &str, feed: &FeedController<R>, pages: usize) -> Result<()>
where
    R: crate::storage::NewsRepository + ?Sized,
{
    let state = feed.load().await;
    if let Some(error) = state.last_error {
        return Err(Error::Unavailable(format!("{} unavailable: {}", title, error)));
    }

    scroll(feed, pages).await;
    print_feed(title, &feed.state());
    Ok(())
}

/// Ask for `pages - 1` further pages, stopping at the first failure.
async fn scroll<R>(feed: &FeedController<R>, pages: usize)
where
    R: crate::storage::NewsRepository + ?Sized,
{
    for _ in 1..pages {
        match feed.load_more().await {
            LoadMoreOutcome::Failed => {
                warn!("Could not load more articles for {}", feed.kind().label());
                break;
            }
            LoadMoreOutcome::Skipped => break,
            LoadMoreOutcome::Appended(_) | LoadMoreOutcome::Recycled(_) => {}
        }
    }
}

fn print_feed(title: &str, state: &FeedState) {
    println!("📰 {} ({} articles, page {})", title, state.items.len(), state.current_page);
    println!("{}", "=".repeat(title.len() + 4));

    if state.items.is_empty() {
        println!("   No articles.");
        return;
    }

    for (i, article) in state.items.iter().enumerate() {
        println!("{:>3}. {}", i + 1, article.headline());
    }

    if !state.has_more {
        debug!("Source exhausted after page {}", state.current_page);
    }
}

pub fn init_logging(debug: bool, verbose: bool, logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level))
    };

    let builder = fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_file(debug)
        .with_line_number(debug)
        .with_writer(io::stderr);

    let result = if logging.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };

    result.map_err(|e| Error::Config(format!("Failed to initialise logging: {}", e)))?;

    debug!("Logging initialized");
    Ok(())
}

/// Error output for the terminal, with a hint for the common cases.
pub fn error_report(error: &Error) -> String {
    let mut report = format!("Error [{}]: {}", error.error_code(), error);

    if error.is_temporary() {
        report.push_str("\n   The news service could not be reached. 'news-reader cached' shows the last saved headlines.");
    } else if error.is_network() {
        report.push_str("\n   The news service rejected the request. Check NEWS_API_KEY.");
    } else if error.is_storage() {
        report.push_str("\n   The article cache could not be used. 'news-reader clear-cache' resets it.");
    } else if error.is_user_error() {
        report.push_str("\n   Check the configuration ('news-reader status') or the command arguments.");
    }

    report
}

/// Get the configuration file path
fn get_config_file(config_path: Option<PathBuf>) -> Result<PathBuf> {
    match config_path {
        Some(path) => Ok(path),
        None => Config::default_path(),
    }
}
