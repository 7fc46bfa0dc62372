use crate::config::ScraperConfig;
use crate::domain::ports::{Element, ElementHandle, Page};
use crate::utils::error::{Result, ScrapeError};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Drives the page through search, consent and scrolling.
pub struct PageNavigator<P: Page> {
    page: Arc<P>,
    config: Arc<ScraperConfig>,
}

impl<P: Page> PageNavigator<P> {
    pub fn new(page: Arc<P>, config: Arc<ScraperConfig>) -> Self {
        Self { page, config }
    }

    pub fn page(&self) -> &P {
        &self.page
    }

    pub async fn search(&self, query: &str) -> Result<()> {
        match self.run_search(query).await {
            Ok(()) => Ok(()),
            Err(e @ ScrapeError::SearchTimeoutError { .. }) => Err(e),
            Err(e @ ScrapeError::SearchError { .. }) => Err(e),
            Err(e) => Err(ScrapeError::search(e.to_string())),
        }
    }

    async fn run_search(&self, query: &str) -> Result<()> {
        let selectors = &self.config.selectors;
        let timeout = self.config.timing.page_load_timeout();

        tracing::info!("🔎 Searching for: {}", query);
        self.page.navigate(&self.config.site.base_url).await?;

        self.dismiss_consent().await?;

        let search_box = self.wait_for(&selectors.search_box, timeout).await?;
        search_box.click().await?;
        search_box.clear().await?;
        search_box.type_text(query).await?;

        let search_button = self.wait_for(&selectors.search_button, timeout).await?;
        search_button.click().await?;

        self.wait_for(&selectors.results_container, timeout).await?;
        tracing::debug!("Results container is present");
        Ok(())
    }

    /// Clicks the first consent button found. Returns whether one was clicked.
    pub async fn dismiss_consent(&self) -> Result<bool> {
        for matcher in &self.config.consent {
            for candidate in self.page.find_all(&matcher.selector).await? {
                let matches = match &matcher.text {
                    Some(needle) => candidate
                        .text()
                        .await?
                        .to_lowercase()
                        .contains(&needle.to_lowercase()),
                    None => true,
                };

                if matches {
                    tracing::debug!("Dismissing consent dialog via '{}'", matcher.selector);
                    candidate.click().await?;
                    return Ok(true);
                }
            }
        }

        tracing::debug!("No consent dialog found");
        Ok(false)
    }

    /// Polls until `selector` is present.
    pub async fn wait_for(&self, selector: &str, timeout: Duration) -> Result<ElementHandle> {
        self.poll_for(selector, timeout)
            .await?
            .ok_or_else(|| ScrapeError::SearchTimeoutError {
                selector: selector.to_string(),
                timeout,
            })
    }

    async fn poll_for(&self, selector: &str, timeout: Duration) -> Result<Option<ElementHandle>> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(element) = self.page.find(selector).await? {
                return Ok(Some(element));
            }
            if Instant::now() >= deadline {
                return Ok(None);
            }
            sleep(self.config.timing.poll_interval()).await;
        }
    }

    /// Scrolls the result list until `target_count` cards are loaded or the list stops growing.
    ///
    /// Returns the number of cards realized on the page.
    pub async fn scroll_results(&self, target_count: usize) -> Result<usize> {
        let container = &self.config.selectors.results_container;
        let timing = &self.config.timing;

        let mut count = self.card_count().await?;
        let mut last_height = self.page.scroll_height(container).await?;
        let mut attempts = 0;

        while count < target_count && attempts < timing.max_scroll_attempts {
            attempts += 1;
            self.page.scroll_by(container, timing.scroll_step_px).await?;
            sleep(timing.scroll_delay()).await;

            let height = self.page.scroll_height(container).await?;
            count = self.card_count().await?;
            tracing::debug!(
                "Scroll {}: height {} -> {}, {} cards",
                attempts,
                last_height,
                height,
                count
            );

            if height <= last_height {
                tracing::debug!("Result list stopped growing");
                break;
            }
            last_height = height;
        }

        tracing::info!("📜 {} result cards loaded", count);
        Ok(count)
    }

    async fn card_count(&self) -> Result<usize> {
        Ok(self.cards().await?.len())
    }

    pub async fn cards(&self) -> Result<Vec<ElementHandle>> {
        self.page.find_all(&self.config.selectors.result_cards).await
    }

    /// Activates a card and returns the detail panel once it shows `name`.
    ///
    /// A panel still showing another listing does not count; `None` when no
    /// matching panel renders within the detail timeout.
    pub async fn open_detail(&self, card: &ElementHandle, name: &str) -> Result<Option<ElementHandle>> {
        card.click().await?;

        let selectors = &self.config.selectors;
        let deadline = Instant::now() + self.config.timing.detail_timeout();
        loop {
            if let Some(panel) = self.page.find(&selectors.detail_panel).await? {
                if panel_shows(panel.as_ref(), &selectors.detail_name, name).await? {
                    return Ok(Some(panel));
                }
            }
            if Instant::now() >= deadline {
                tracing::debug!("No detail panel for '{}' within {:?}", name, self.config.timing.detail_timeout());
                return Ok(None);
            }
            sleep(self.config.timing.poll_interval()).await;
        }
    }
}

async fn panel_shows(panel: &dyn Element, heading_selector: &str, name: &str) -> Result<bool> {
    for heading in panel.find_all(heading_selector).await? {
        if heading.text().await?.trim() == name {
            return Ok(true);
        }
    }
    Ok(false)
}
