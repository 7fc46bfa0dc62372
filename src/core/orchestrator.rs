use crate::config::{CardErrorPolicy, ScraperConfig};
use crate::core::card::CardExtractor;
use crate::core::navigator::PageNavigator;
use crate::core::reviews::ReviewExtractor;
use crate::domain::model::{Business, ScrapeOutcome};
use crate::domain::ports::Page;
use crate::utils::error::{Result, ScrapeError};
use std::fmt;
use std::sync::Arc;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapeState {
    Idle,
    Searching,
    Scrolling,
    ExtractingCards,
    Retrying,
    Done,
    Failed,
}

impl fmt::Display for ScrapeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// Runs one query end to end with bounded, whole-attempt retries.
pub struct ScrapeOrchestrator<P: Page> {
    navigator: PageNavigator<P>,
    cards: CardExtractor,
    reviews: ReviewExtractor,
    config: Arc<ScraperConfig>,
    transitions: Vec<ScrapeState>,
}

impl<P: Page> ScrapeOrchestrator<P> {
    pub fn new(page: Arc<P>, config: Arc<ScraperConfig>) -> Self {
        Self {
            navigator: PageNavigator::new(page, Arc::clone(&config)),
            cards: CardExtractor::new(Arc::clone(&config)),
            reviews: ReviewExtractor::new(Arc::clone(&config)),
            config,
            transitions: vec![ScrapeState::Idle],
        }
    }

    pub fn state(&self) -> ScrapeState {
        self.transitions
            .last()
            .copied()
            .unwrap_or(ScrapeState::Idle)
    }

    /// Every state entered so far, oldest first.
    pub fn transitions(&self) -> &[ScrapeState] {
        &self.transitions
    }

    fn enter(&mut self, state: ScrapeState) {
        tracing::debug!("State {} -> {}", self.state(), state);
        self.transitions.push(state);
    }

    pub async fn scrape_businesses(&mut self, query: &str, max_results: usize) -> Result<ScrapeOutcome> {
        let max_attempts = self.config.retry.max_retries.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            match self.attempt(query, max_results).await {
                Ok((businesses, skipped_cards)) => {
                    self.enter(ScrapeState::Done);
                    tracing::info!(
                        "✅ Scraped {} businesses on attempt {} ({} cards skipped)",
                        businesses.len(),
                        attempt,
                        skipped_cards
                    );
                    return Ok(ScrapeOutcome {
                        businesses,
                        skipped_cards,
                        attempts: attempt,
                    });
                }
                Err(e) if attempt >= max_attempts => {
                    self.enter(ScrapeState::Failed);
                    tracing::error!("❌ Attempt {} failed, giving up: {}", attempt, e);
                    return Err(ScrapeError::RetriesExhausted {
                        attempts: attempt,
                        source: Box::new(e),
                    });
                }
                Err(e) => {
                    self.enter(ScrapeState::Retrying);
                    let delay = self.config.retry.backoff.delay_for(attempt);
                    tracing::warn!(
                        "🔄 Attempt {}/{} failed: {} (retrying in {:?})",
                        attempt,
                        max_attempts,
                        e,
                        delay
                    );
                    sleep(delay).await;
                }
            }
        }
    }

    /// One full search + scroll + extract pass. The result list lives only here,
    /// so a failed pass leaves nothing behind.
    async fn attempt(&mut self, query: &str, max_results: usize) -> Result<(Vec<Business>, usize)> {
        self.enter(ScrapeState::Searching);
        self.navigator.search(query).await?;

        self.enter(ScrapeState::Scrolling);
        self.navigator.scroll_results(max_results).await?;

        self.enter(ScrapeState::ExtractingCards);
        let cards = self.navigator.cards().await?;
        let mut businesses = Vec::with_capacity(cards.len().min(max_results));
        let mut skipped = 0;

        for (index, card) in cards.iter().take(max_results).enumerate() {
            let business = match self.cards.extract_business_data(card.as_ref()).await {
                Ok(business) => business,
                Err(e)
                    if e.is_card_level()
                        && self.config.extraction.on_card_error == CardErrorPolicy::Skip =>
                {
                    tracing::warn!("⚠️ Skipping card #{}: {}", index + 1, e);
                    skipped += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let detail = match self.navigator.open_detail(card, &business.name).await {
                Ok(detail) => detail,
                Err(e) => {
                    tracing::warn!(
                        "⚠️ Could not open details of '{}', reading reviews from its card: {}",
                        business.name,
                        e
                    );
                    None
                }
            };
            let detail_view = detail.as_ref().unwrap_or(card);
            let reviews = self.reviews.get_reviews(detail_view.as_ref()).await;

            tracing::info!(
                "🏢 [{}/{}] {} ({} reviews)",
                index + 1,
                max_results.min(cards.len()),
                business.name,
                reviews.len()
            );
            businesses.push(business.with_reviews(reviews));
        }

        Ok((businesses, skipped))
    }
}
