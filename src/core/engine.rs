use crate::config::ScraperConfig;
use crate::core::orchestrator::ScrapeOrchestrator;
use crate::domain::model::ScrapeOutcome;
use crate::domain::ports::{Page, RecordSink};
use crate::utils::error::{Result, ScrapeError};
use crate::utils::monitor::{Phase, ResourceMonitor};
use std::sync::Arc;

/// Scrape first, export only after the scrape succeeded.
pub struct ScrapeEngine<P: Page, S: RecordSink> {
    orchestrator: ScrapeOrchestrator<P>,
    sink: S,
    monitor: ResourceMonitor,
}

/// What a finished run produced.
#[derive(Debug, Clone)]
pub struct RunSummary {
    pub output_path: String,
    pub outcome: ScrapeOutcome,
}

impl<P: Page, S: RecordSink> ScrapeEngine<P, S> {
    pub fn new(page: Arc<P>, config: Arc<ScraperConfig>, sink: S) -> Self {
        Self::new_with_monitoring(page, config, sink, false)
    }

    pub fn new_with_monitoring(
        page: Arc<P>,
        config: Arc<ScraperConfig>,
        sink: S,
        monitor_enabled: bool,
    ) -> Self {
        Self {
            orchestrator: ScrapeOrchestrator::new(page, config),
            sink,
            monitor: ResourceMonitor::new(monitor_enabled),
        }
    }

    pub fn orchestrator(&self) -> &ScrapeOrchestrator<P> {
        &self.orchestrator
    }

    pub async fn run(&mut self, query: &str, max_results: usize, destination: &str) -> Result<RunSummary> {
        tracing::info!("🚀 Starting scrape for \"{}\" (max {} results)", query, max_results);

        let outcome = self.orchestrator.scrape_businesses(query, max_results).await?;
        self.monitor.checkpoint(Phase::Scrape);

        if outcome.businesses.is_empty() {
            return Err(ScrapeError::NoResults {
                query: query.to_string(),
            });
        }

        tracing::info!(
            "💾 Writing {} businesses and {} reviews to {}",
            outcome.businesses.len(),
            outcome.review_count(),
            destination
        );
        let output_path = self.sink.write(&outcome.businesses, destination).await?;
        self.monitor.checkpoint(Phase::Export);
        self.monitor.finish();

        Ok(RunSummary {
            output_path,
            outcome,
        })
    }
}
