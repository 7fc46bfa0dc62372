use crate::config::ScraperConfig;
use crate::core::normalize;
use crate::domain::model::Review;
use crate::domain::ports::Element;
use crate::utils::error::{Result, ScrapeError};
use std::sync::Arc;
use tokio::time::sleep;

/// Collects a bounded number of reviews from a listing's detail view.
///
/// Reviews are enrichment: nothing here fails the listing. Broken items are
/// skipped with a warning and a broken tab yields no reviews.
pub struct ReviewExtractor {
    config: Arc<ScraperConfig>,
}

/// Breakdown lines split into the two point lists.
#[derive(Debug, Default, PartialEq)]
struct PointLines {
    positive: Vec<String>,
    negative: Vec<String>,
}

impl ReviewExtractor {
    pub fn new(config: Arc<ScraperConfig>) -> Self {
        Self { config }
    }

    pub async fn get_reviews(&self, detail_view: &dyn Element) -> Vec<Review> {
        match self.collect(detail_view).await {
            Ok(reviews) => reviews,
            Err(e) => {
                tracing::warn!("⚠️ Could not open reviews: {}", e);
                Vec::new()
            }
        }
    }

    async fn collect(&self, detail_view: &dyn Element) -> Result<Vec<Review>> {
        let selectors = &self.config.selectors;
        let max_reviews = self.config.extraction.max_reviews;

        let Some(tab) = detail_view.find(&selectors.reviews_tab).await? else {
            tracing::debug!("No reviews tab present");
            return Ok(Vec::new());
        };
        if max_reviews == 0 {
            return Ok(Vec::new());
        }

        tab.click().await?;
        sleep(self.config.timing.review_render_delay()).await;

        let items = detail_view.find_all(&selectors.review_items).await?;
        let mut reviews = Vec::with_capacity(items.len().min(max_reviews));

        for (index, item) in items.iter().take(max_reviews).enumerate() {
            match self.extract_review(item.as_ref()).await {
                Ok(review) => reviews.push(review),
                Err(e) => tracing::warn!("⚠️ Skipping review #{}: {}", index + 1, e),
            }
        }

        tracing::debug!("Collected {} of {} reviews", reviews.len(), items.len());
        Ok(reviews)
    }

    async fn extract_review(&self, item: &dyn Element) -> Result<Review> {
        let selectors = &self.config.selectors;

        let text = match item.find(&selectors.review_text).await? {
            Some(element) => element.text().await?.trim().to_string(),
            None => String::new(),
        };
        let text = normalize::truncate_text(&text, self.config.extraction.review_text_max_length);

        let label = match item.find(&selectors.review_rating).await? {
            Some(element) => element.attribute("aria-label").await?,
            None => None,
        };
        let label = label.ok_or_else(|| {
            ScrapeError::extraction("review rating", "no accessible rating label")
        })?;
        let rating = normalize::parse_rating_label(&label)?;

        let time_posted = match item.find(&selectors.review_time).await? {
            Some(element) => element.text().await?.trim().to_string(),
            None => String::new(),
        };

        let (positive_points, negative_points, services_used) =
            match item.find(&selectors.review_points).await? {
                Some(points) => {
                    let lines = split_point_lines(&points.text().await?);
                    let mut services = Vec::new();
                    for service in item.find_all(&selectors.review_services).await? {
                        let name = service.text().await?.trim().to_string();
                        if !name.is_empty() {
                            services.push(name);
                        }
                    }
                    (
                        Some(normalize::format_review_points(&lines.positive)),
                        Some(normalize::format_review_points(&lines.negative)),
                        Some(services),
                    )
                }
                None => (None, None, None),
            };

        Ok(Review {
            text,
            rating,
            time_posted,
            positive_points,
            negative_points,
            services_used,
        })
    }
}

fn split_point_lines(text: &str) -> PointLines {
    let mut lines = PointLines::default();
    for line in text.lines().map(str::trim).filter(|line| !line.is_empty()) {
        let lower = line.to_lowercase();
        if line.starts_with('👍') || lower.contains("positive") {
            lines.positive.push(line.to_string());
        } else if line.starts_with('👎') || lower.contains("negative") {
            lines.negative.push(line.to_string());
        }
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::snapshot::{PageAction, SnapshotPage};
    use crate::domain::ports::Page;

    const DETAIL: &str = r#"
<div class="detail">
  <button data-tab-index="1">Reviews</button>
  <div class="jftiEf">
    <span class="kvMYJc" aria-label="5 stars"></span>
    <span class="rsqaWe">2 weeks ago</span>
    <span class="wiI7pd">Great work, fixed everything quickly</span>
    <div class="k8MTF">
      <span>Lighting installation</span>
      <div>👍 quick response</div>
      <div>👎 hard to reach by phone</div>
    </div>
  </div>
  <div class="jftiEf">
    <span class="kvMYJc" aria-label="no rating"></span>
    <span class="wiI7pd">Broken rating</span>
  </div>
  <div class="jftiEf">
    <span class="kvMYJc" aria-label="3,0 Sterne"></span>
    <span class="rsqaWe">a year ago</span>
    <span class="wiI7pd">Okay.</span>
  </div>
</div>"#;

    fn extractor(max_reviews: usize) -> ReviewExtractor {
        let mut config = ScraperConfig::default();
        config.timing.review_render_delay_ms = 0;
        config.extraction.max_reviews = max_reviews;
        config.extraction.review_text_max_length = 20;
        ReviewExtractor::new(Arc::new(config))
    }

    #[tokio::test]
    async fn test_get_reviews_skips_broken_items() {
        let page = SnapshotPage::new(DETAIL);
        let detail = page.find(".detail").await.unwrap().unwrap();

        let reviews = extractor(10).get_reviews(detail.as_ref()).await;

        assert_eq!(reviews.len(), 2);
        let first = &reviews[0];
        assert_eq!(first.rating, 5.0);
        assert_eq!(first.time_posted, "2 weeks ago");
        assert_eq!(first.text, "Great work, fixed...");
        assert_eq!(
            first.positive_points.as_deref(),
            Some(&["Quick response".to_string()][..])
        );
        assert_eq!(
            first.negative_points.as_deref(),
            Some(&["Hard to reach by phone".to_string()][..])
        );
        assert_eq!(
            first.services_used.as_deref(),
            Some(&["Lighting installation".to_string()][..])
        );

        let last = &reviews[1];
        assert_eq!(last.rating, 3.0);
        assert_eq!(last.text, "Okay.");
        assert!(last.positive_points.is_none());
        assert!(last.services_used.is_none());

        assert!(page
            .actions()
            .contains(&PageAction::Click("Reviews".to_string())));
    }

    #[tokio::test]
    async fn test_get_reviews_respects_cap() {
        let page = SnapshotPage::new(DETAIL);
        let detail = page.find(".detail").await.unwrap().unwrap();

        let reviews = extractor(1).get_reviews(detail.as_ref()).await;
        assert_eq!(reviews.len(), 1);

        let reviews = extractor(0).get_reviews(detail.as_ref()).await;
        assert!(reviews.is_empty());
    }

    #[tokio::test]
    async fn test_missing_reviews_tab_yields_nothing() {
        let page = SnapshotPage::new(r#"<div class="detail"><div class="jftiEf"></div></div>"#);
        let detail = page.find(".detail").await.unwrap().unwrap();

        let reviews = extractor(10).get_reviews(detail.as_ref()).await;
        assert!(reviews.is_empty());
        assert!(page.actions().is_empty());
    }

    #[test]
    fn test_split_point_lines() {
        let lines = split_point_lines("👍 Friendly\nPositive: punctual\n👎 Expensive\nNegative: messy\nother");
        assert_eq!(lines.positive, vec!["👍 Friendly", "Positive: punctual"]);
        assert_eq!(lines.negative, vec!["👎 Expensive", "Negative: messy"]);
    }
}
