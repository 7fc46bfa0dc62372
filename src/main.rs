use clap::Parser;
use maps_scrape::domain::ports::Page;
use maps_scrape::utils::{logger, validation::Validate};
use maps_scrape::{
    CliConfig, FileSink, LocalStorage, RunSummary, ScrapeEngine, ScrapeError, ScraperConfig,
    SnapshotPage,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    logger::init_cli_logger(cli.verbose, cli.log_json);

    tracing::info!("Starting maps-scrape");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let config = match cli.validate().and_then(|_| cli.scraper_config()) {
        Ok(config) => Arc::new(config),
        Err(e) => fail(&e),
    };

    if cli.monitor {
        tracing::info!("🔍 System monitoring enabled");
    }

    let destination = cli.output_path();
    let result = match &cli.replay {
        Some(path) => {
            tracing::info!("📂 Replaying saved page: {}", path);
            match SnapshotPage::load(&LocalStorage::default(), path).await {
                Ok(page) => run(Arc::new(page), config, &cli, &destination).await,
                Err(e) => Err(e),
            }
        }
        None => run_live(config, &cli, &destination).await?,
    };

    match result {
        Ok(summary) => {
            tracing::info!(
                "✅ Scraped {} businesses ({} reviews, {} cards skipped, {} attempt(s))",
                summary.outcome.businesses.len(),
                summary.outcome.review_count(),
                summary.outcome.skipped_cards,
                summary.outcome.attempts
            );
            println!("✅ Scraped {} businesses", summary.outcome.businesses.len());
            println!("📁 Output saved to: {}", summary.output_path);
            Ok(())
        }
        Err(e) => fail(&e),
    }
}

async fn run<P: Page>(
    page: Arc<P>,
    config: Arc<ScraperConfig>,
    cli: &CliConfig,
    destination: &str,
) -> Result<RunSummary, ScrapeError> {
    let sink = FileSink::new(LocalStorage::default());
    let mut engine = ScrapeEngine::new_with_monitoring(page, config, sink, cli.monitor);
    engine.run(&cli.query(), cli.max_results, destination).await
}

#[cfg(feature = "browser")]
async fn run_live(
    config: Arc<ScraperConfig>,
    cli: &CliConfig,
    destination: &str,
) -> anyhow::Result<Result<RunSummary, ScrapeError>> {
    use anyhow::Context;
    use maps_scrape::adapters::chromium::BrowserSession;

    let session = BrowserSession::launch(cli.headless, config.timing.page_load_timeout())
        .await
        .context("Failed to launch Chromium")?;
    let page = session
        .new_page()
        .await
        .context("Failed to open a browser tab")?;

    let result = run(Arc::new(page), config, cli, destination).await;

    if let Err(e) = session.close().await {
        tracing::warn!("Failed to close browser: {}", e);
    }
    Ok(result)
}

#[cfg(not(feature = "browser"))]
async fn run_live(
    _config: Arc<ScraperConfig>,
    _cli: &CliConfig,
    _destination: &str,
) -> anyhow::Result<Result<RunSummary, ScrapeError>> {
    anyhow::bail!("built without the `browser` feature; pass --replay <HTML> to scrape a saved page")
}

fn fail(e: &ScrapeError) -> ! {
    tracing::error!("❌ Scrape failed: {} (Category: {:?})", e, e.category());
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    eprintln!("❌ {}", e.user_friendly_message());
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(1);
}
