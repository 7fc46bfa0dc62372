use crate::config::ScraperConfig;
use crate::core::normalize::{self, ParsedAddress};
use crate::domain::model::Business;
use crate::domain::ports::Element;
use crate::utils::error::{Result, ScrapeError};
use std::sync::Arc;
use url::Url;

/// Reads the summary fields of one listing card.
pub struct CardExtractor {
    config: Arc<ScraperConfig>,
}

impl CardExtractor {
    pub fn new(config: Arc<ScraperConfig>) -> Self {
        Self { config }
    }

    pub async fn extract_business_data(&self, card: &dyn Element) -> Result<Business> {
        let selectors = &self.config.selectors;
        let extraction = &self.config.extraction;

        let name = required_text(card, &selectors.name, "name").await?;
        let raw_address = required_text(card, &selectors.address, "address").await?;
        let ParsedAddress {
            street,
            postal_code,
            city,
        } = extraction.address_policy.parse(&raw_address)?;

        let rating_text = required_text(card, &selectors.rating, "rating").await?;
        let avg_rating = normalize::parse_rating(&rating_text)?;

        let num_ratings = match optional_text(card, &selectors.review_count).await? {
            Some(text) => normalize::parse_count(&text),
            None => 0,
        };

        let phone = optional_text(card, &selectors.phone)
            .await?
            .map(|raw| normalize::clean_phone_number_with(&raw, &extraction.country_code));

        let website = match card.find(&selectors.website).await? {
            Some(element) => element
                .attribute("href")
                .await?
                .and_then(|href| normalize_website(&name, &href)),
            None => None,
        };

        tracing::debug!("Extracted card '{}' ({} ratings)", name, num_ratings);

        Ok(Business {
            name,
            street_address: street,
            postal_code,
            city,
            phone,
            website,
            avg_rating,
            num_ratings,
            reviews: Vec::new(),
        })
    }
}

async fn required_text(card: &dyn Element, selector: &str, field: &str) -> Result<String> {
    let element = card
        .find(selector)
        .await?
        .ok_or_else(|| ScrapeError::extraction(field, format!("no element matches '{}'", selector)))?;

    let text = element.text().await?.trim().to_string();
    if text.is_empty() {
        return Err(ScrapeError::extraction(field, "element has no text"));
    }
    Ok(text)
}

async fn optional_text(card: &dyn Element, selector: &str) -> Result<Option<String>> {
    match card.find(selector).await? {
        Some(element) => {
            let text = element.text().await?.trim().to_string();
            Ok((!text.is_empty()).then_some(text))
        }
        None => Ok(None),
    }
}

fn normalize_website(name: &str, href: &str) -> Option<String> {
    match Url::parse(href.trim()) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url.to_string()),
        Ok(url) => {
            tracing::warn!("Ignoring website of '{}' with scheme '{}'", name, url.scheme());
            None
        }
        Err(e) => {
            tracing::warn!("Ignoring unparsable website '{}' of '{}': {}", href, name, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::snapshot::SnapshotPage;
    use crate::core::normalize::AddressPolicy;
    use crate::domain::ports::Page;

    const CARD: &str = r#"
<div role="article">
  <div class="fontHeadlineSmall"> Elektro Meier </div>
  <div data-item-id="address">Hauptstraße 12, 91522 Ansbach</div>
  <div class="fontDisplayLarge">4,6</div>
  <div class="fontBodyMedium"><span>(1.234 reviews)</span></div>
  <div data-item-id="phone:tel:0981123">0981 / 123-45</div>
  <a data-item-id="authority" href="https://elektro-meier.example">elektro-meier.example</a>
</div>"#;

    async fn extract(html: &str, config: ScraperConfig) -> Result<Business> {
        let page = SnapshotPage::new(html);
        let card = page.find(r#"[role="article"]"#).await?.expect("card present");
        CardExtractor::new(Arc::new(config))
            .extract_business_data(card.as_ref())
            .await
    }

    #[tokio::test]
    async fn test_extract_full_card() {
        let business = extract(CARD, ScraperConfig::default()).await.unwrap();

        assert_eq!(business.name, "Elektro Meier");
        assert_eq!(business.street_address, "Hauptstraße 12");
        assert_eq!(business.postal_code, "91522");
        assert_eq!(business.city, "Ansbach");
        assert_eq!(business.avg_rating, 4.6);
        assert_eq!(business.num_ratings, 1234);
        assert_eq!(business.phone.as_deref(), Some("+4998112345"));
        assert_eq!(
            business.website.as_deref(),
            Some("https://elektro-meier.example/")
        );
        assert!(business.reviews.is_empty());
    }

    #[tokio::test]
    async fn test_optional_fields_may_be_absent() {
        let html = r#"<div role="article">
  <div class="fontHeadlineSmall">Kiosk</div>
  <div data-item-id="address">Bahnhofstr. 1, 91522 Ansbach</div>
  <div class="fontDisplayLarge">3.0</div>
  <a data-item-id="authority" href="javascript:void(0)">site</a>
</div>"#;
        let business = extract(html, ScraperConfig::default()).await.unwrap();

        assert_eq!(business.num_ratings, 0);
        assert!(business.phone.is_none());
        assert!(business.website.is_none());
    }

    #[tokio::test]
    async fn test_mandatory_fields_raise() {
        let no_name = r#"<div role="article">
  <div data-item-id="address">Bahnhofstr. 1, 91522 Ansbach</div>
  <div class="fontDisplayLarge">3.0</div>
</div>"#;
        let err = extract(no_name, ScraperConfig::default()).await.unwrap_err();
        assert!(matches!(err, ScrapeError::ExtractionError { ref field, .. } if field == "name"));

        let bad_rating = CARD.replace("4,6", "n/a");
        let err = extract(&bad_rating, ScraperConfig::default()).await.unwrap_err();
        assert!(matches!(err, ScrapeError::InvalidRatingError { .. }));

        let bad_address = CARD.replace("Hauptstraße 12, 91522 Ansbach", "Hauptstraße 12 Ansbach");
        let err = extract(&bad_address, ScraperConfig::default()).await.unwrap_err();
        assert!(matches!(err, ScrapeError::AddressFormatError { .. }));
    }

    #[tokio::test]
    async fn test_lenient_address_policy() {
        let mut config = ScraperConfig::default();
        config.extraction.address_policy = AddressPolicy::Lenient;

        let html = CARD.replace("Hauptstraße 12, 91522 Ansbach", "Hauptstraße 12 Ansbach");
        let business = extract(&html, config).await.unwrap();

        assert_eq!(business.street_address, "Hauptstraße 12 Ansbach");
        assert!(business.postal_code.is_empty());
        assert!(business.city.is_empty());
    }
}
