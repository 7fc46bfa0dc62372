use crate::core::normalize::{AddressPolicy, DEFAULT_COUNTRY_CODE};
use crate::utils::error::{Result, ScrapeError};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Everything the navigator and extractors need to know about the target UI.
///
/// Built once per run and shared read-only; swap selector sets per locale or
/// UI revision through a TOML file instead of editing code.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub site: SiteConfig,
    pub selectors: SelectorConfig,
    pub consent: Vec<ConsentMatcher>,
    pub timing: TimingConfig,
    pub retry: RetryConfig,
    pub extraction: ExtractionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteConfig {
    pub base_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SelectorConfig {
    pub search_box: String,
    pub search_button: String,
    pub results_container: String,
    pub result_cards: String,
    pub detail_panel: String,
    /// Heading inside the detail panel naming the listing it shows.
    pub detail_name: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub website: String,
    pub rating: String,
    pub review_count: String,
    pub reviews_tab: String,
    pub review_items: String,
    pub review_text: String,
    pub review_rating: String,
    pub review_time: String,
    pub review_points: String,
    pub review_services: String,
}

/// One way of recognising the consent dialog's accept button.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsentMatcher {
    pub selector: String,
    /// Case-insensitive substring the element text must contain.
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub page_load_timeout_secs: u64,
    pub detail_timeout_ms: u64,
    pub poll_interval_ms: u64,
    pub scroll_delay_ms: u64,
    pub scroll_step_px: u32,
    pub max_scroll_attempts: usize,
    pub review_render_delay_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    /// Total number of attempts before the scrape is declared failed.
    pub max_retries: u32,
    pub backoff: BackoffPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackoffPolicy {
    Constant {
        delay_ms: u64,
    },
    Exponential {
        initial_ms: u64,
        factor: f64,
        max_ms: u64,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardErrorPolicy {
    /// Log the card and continue with the next one.
    Skip,
    /// Treat the card failure as a failed attempt.
    Retry,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    pub max_reviews: usize,
    pub review_text_max_length: usize,
    pub address_policy: AddressPolicy,
    pub on_card_error: CardErrorPolicy,
    pub country_code: String,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            site: SiteConfig::default(),
            selectors: SelectorConfig::default(),
            consent: default_consent_matchers(),
            timing: TimingConfig::default(),
            retry: RetryConfig::default(),
            extraction: ExtractionConfig::default(),
        }
    }
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.google.com/maps".to_string(),
        }
    }
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            search_box: r#"input#searchboxinput, input[name="q"]"#.to_string(),
            search_button: r#"button#searchbox-searchbutton, button[jsaction*="search"]"#
                .to_string(),
            results_container: r#"[role="feed"]"#.to_string(),
            result_cards: r#"[role="feed"] [role="article"]"#.to_string(),
            detail_panel: r#"[role="main"]"#.to_string(),
            detail_name: "h1, .fontHeadlineLarge, .fontHeadlineSmall".to_string(),
            name: ".fontHeadlineSmall".to_string(),
            address: r#"[data-item-id*="address"]"#.to_string(),
            phone: r#"[data-item-id*="phone"]"#.to_string(),
            website: r#"a[data-item-id*="authority"]"#.to_string(),
            rating: ".fontDisplayLarge".to_string(),
            review_count: ".fontBodyMedium span".to_string(),
            reviews_tab: r#"[data-tab-index="1"]"#.to_string(),
            review_items: ".jftiEf".to_string(),
            review_text: ".wiI7pd".to_string(),
            review_rating: ".kvMYJc".to_string(),
            review_time: ".rsqaWe".to_string(),
            review_points: ".k8MTF".to_string(),
            review_services: ".k8MTF span:first-child".to_string(),
        }
    }
}

fn default_consent_matchers() -> Vec<ConsentMatcher> {
    let by_text = |text: &str| ConsentMatcher {
        selector: "button".to_string(),
        text: Some(text.to_string()),
    };

    vec![
        by_text("Accept all"),
        by_text("Alle akzeptieren"),
        by_text("Tout accepter"),
        by_text("Aceptar todo"),
        ConsentMatcher {
            selector: r#"form[action*="consent"] button"#.to_string(),
            text: None,
        },
    ]
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            page_load_timeout_secs: 30,
            detail_timeout_ms: 3_000,
            poll_interval_ms: 200,
            scroll_delay_ms: 1_500,
            scroll_step_px: 1_000,
            max_scroll_attempts: 200,
            review_render_delay_ms: 1_000,
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            backoff: BackoffPolicy::default(),
        }
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        BackoffPolicy::Constant { delay_ms: 1_000 }
    }
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            max_reviews: 10,
            review_text_max_length: 32_000,
            address_policy: AddressPolicy::Strict,
            on_card_error: CardErrorPolicy::Skip,
            country_code: DEFAULT_COUNTRY_CODE.to_string(),
        }
    }
}

impl TimingConfig {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_secs(self.page_load_timeout_secs)
    }

    pub fn detail_timeout(&self) -> Duration {
        Duration::from_millis(self.detail_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn scroll_delay(&self) -> Duration {
        Duration::from_millis(self.scroll_delay_ms)
    }

    pub fn review_render_delay(&self) -> Duration {
        Duration::from_millis(self.review_render_delay_ms)
    }
}

impl BackoffPolicy {
    /// Pause before retry number `retry` (1-based).
    pub fn delay_for(&self, retry: u32) -> Duration {
        match *self {
            BackoffPolicy::Constant { delay_ms } => Duration::from_millis(delay_ms),
            BackoffPolicy::Exponential {
                initial_ms,
                factor,
                max_ms,
            } => {
                let exponent = retry.saturating_sub(1).min(i32::MAX as u32) as i32;
                let millis = (initial_ms as f64) * factor.powi(exponent);
                Duration::from_millis(millis.min(max_ms as f64) as u64)
            }
        }
    }
}

impl ScraperConfig {
    /// Loads a configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ScrapeError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parses a configuration, substituting `${VAR}` placeholders from the environment first.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ScrapeError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ScrapeError::ConfigError {
            message: format!("Invalid placeholder pattern: {}", e),
        })?;

        if let Some(unset) = re
            .captures_iter(content)
            .map(|caps| caps[1].to_string())
            .find(|name| std::env::var(name).is_err())
        {
            return Err(ScrapeError::MissingConfigError {
                field: format!("environment variable {}", unset),
            });
        }

        let result = re.replace_all(content, |caps: &regex::Captures| {
            std::env::var(&caps[1]).unwrap_or_default()
        });

        Ok(result.to_string())
    }

    fn named_selectors(&self) -> Vec<(&'static str, &str)> {
        let s = &self.selectors;
        vec![
            ("selectors.search_box", s.search_box.as_str()),
            ("selectors.search_button", s.search_button.as_str()),
            ("selectors.results_container", s.results_container.as_str()),
            ("selectors.result_cards", s.result_cards.as_str()),
            ("selectors.detail_panel", s.detail_panel.as_str()),
            ("selectors.detail_name", s.detail_name.as_str()),
            ("selectors.name", s.name.as_str()),
            ("selectors.address", s.address.as_str()),
            ("selectors.phone", s.phone.as_str()),
            ("selectors.website", s.website.as_str()),
            ("selectors.rating", s.rating.as_str()),
            ("selectors.review_count", s.review_count.as_str()),
            ("selectors.reviews_tab", s.reviews_tab.as_str()),
            ("selectors.review_items", s.review_items.as_str()),
            ("selectors.review_text", s.review_text.as_str()),
            ("selectors.review_rating", s.review_rating.as_str()),
            ("selectors.review_time", s.review_time.as_str()),
            ("selectors.review_points", s.review_points.as_str()),
            ("selectors.review_services", s.review_services.as_str()),
        ]
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_url("site.base_url", &self.site.base_url)?;

        for (field, selector) in self.named_selectors() {
            validate_selector(field, selector)?;
        }
        for matcher in &self.consent {
            validate_selector("consent.selector", &matcher.selector)?;
        }

        let timing = &self.timing;
        validation::validate_positive_number(
            "timing.page_load_timeout_secs",
            timing.page_load_timeout_secs as usize,
            1,
        )?;
        validation::validate_positive_number(
            "timing.poll_interval_ms",
            timing.poll_interval_ms as usize,
            1,
        )?;
        validation::validate_positive_number(
            "timing.scroll_step_px",
            timing.scroll_step_px as usize,
            1,
        )?;
        validation::validate_positive_number(
            "timing.max_scroll_attempts",
            timing.max_scroll_attempts,
            1,
        )?;

        validation::validate_positive_number(
            "retry.max_retries",
            self.retry.max_retries as usize,
            1,
        )?;
        if let BackoffPolicy::Exponential {
            initial_ms,
            factor,
            max_ms,
        } = self.retry.backoff
        {
            validation::validate_range("retry.backoff.factor", factor, 1.0, 10.0)?;
            validation::validate_range("retry.backoff.initial_ms", initial_ms, 0, max_ms)?;
        }

        validation::validate_positive_number(
            "extraction.review_text_max_length",
            self.extraction.review_text_max_length,
            1,
        )?;
        let code = &self.extraction.country_code;
        if !code.starts_with('+') || code.len() < 2 || !code[1..].chars().all(|c| c.is_ascii_digit())
        {
            return Err(ScrapeError::invalid_value(
                "extraction.country_code",
                code,
                "Expected '+' followed by digits, e.g. +49",
            ));
        }

        Ok(())
    }
}

fn validate_selector(field: &str, selector: &str) -> Result<()> {
    validation::validate_non_empty_string(field, selector)?;
    scraper::Selector::parse(selector).map_err(|e| {
        ScrapeError::invalid_value(field, selector, format!("Invalid CSS selector: {}", e))
    })?;
    Ok(())
}

impl Validate for ScraperConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_config_is_valid() {
        let config = ScraperConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.retry.max_retries, 3);
        assert_eq!(config.timing.scroll_delay(), Duration::from_millis(1500));
        assert_eq!(config.consent.len(), 5);
    }

    #[test]
    fn test_empty_toml_uses_defaults() {
        let config = ScraperConfig::from_toml_str("").unwrap();
        assert_eq!(config.site.base_url, "https://www.google.com/maps");
        assert_eq!(config.extraction.max_reviews, 10);
        assert_eq!(config.extraction.address_policy, AddressPolicy::Strict);
    }

    #[test]
    fn test_parse_partial_toml_config() {
        let toml_content = r#"
[site]
base_url = "https://maps.example.com"

[selectors]
name = "h1.title"

[[consent]]
selector = "button.agree"

[timing]
scroll_delay_ms = 250

[retry]
max_retries = 5
backoff = { kind = "exponential", initial_ms = 100, factor = 2.0, max_ms = 1000 }

[extraction]
address_policy = "lenient"
on_card_error = "retry"
"#;

        let config = ScraperConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.site.base_url, "https://maps.example.com");
        assert_eq!(config.selectors.name, "h1.title");
        assert_eq!(config.selectors.rating, ".fontDisplayLarge");
        assert_eq!(config.consent.len(), 1);
        assert_eq!(config.consent[0].text, None);
        assert_eq!(config.timing.scroll_delay_ms, 250);
        assert_eq!(config.timing.page_load_timeout_secs, 30);
        assert_eq!(config.retry.max_retries, 5);
        assert_eq!(config.extraction.address_policy, AddressPolicy::Lenient);
        assert_eq!(config.extraction.on_card_error, CardErrorPolicy::Retry);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("MAPS_SCRAPE_TEST_BASE_URL", "https://maps.test.local");

        let toml_content = r#"
[site]
base_url = "${MAPS_SCRAPE_TEST_BASE_URL}"
"#;

        let config = ScraperConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.site.base_url, "https://maps.test.local");

        std::env::remove_var("MAPS_SCRAPE_TEST_BASE_URL");
    }

    #[test]
    fn test_unset_env_var_is_missing_config() {
        let toml_content = r#"
[site]
base_url = "${MAPS_SCRAPE_TEST_UNSET_VAR}"
"#;

        let err = ScraperConfig::from_toml_str(toml_content).unwrap_err();
        match err {
            ScrapeError::MissingConfigError { field } => {
                assert!(field.contains("MAPS_SCRAPE_TEST_UNSET_VAR"))
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_config_validation_rejects_bad_values() {
        let mut config = ScraperConfig::default();
        config.site.base_url = "not a url".to_string();
        assert!(config.validate().is_err());

        let mut config = ScraperConfig::default();
        config.selectors.rating = "[[[".to_string();
        assert!(config.validate().is_err());

        let mut config = ScraperConfig::default();
        config.retry.max_retries = 0;
        assert!(config.validate().is_err());

        let mut config = ScraperConfig::default();
        config.extraction.country_code = "49".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_backoff_delays() {
        let constant = BackoffPolicy::Constant { delay_ms: 1000 };
        assert_eq!(constant.delay_for(1), Duration::from_secs(1));
        assert_eq!(constant.delay_for(4), Duration::from_secs(1));

        let exponential = BackoffPolicy::Exponential {
            initial_ms: 100,
            factor: 2.0,
            max_ms: 500,
        };
        assert_eq!(exponential.delay_for(1), Duration::from_millis(100));
        assert_eq!(exponential.delay_for(2), Duration::from_millis(200));
        assert_eq!(exponential.delay_for(3), Duration::from_millis(400));
        assert_eq!(exponential.delay_for(4), Duration::from_millis(500));
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[extraction]\nmax_reviews = 3\n")
            .unwrap();

        let config = ScraperConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.extraction.max_reviews, 3);
    }
}
