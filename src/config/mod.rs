pub mod scraper_config;

pub use scraper_config::{
    BackoffPolicy, CardErrorPolicy, ConsentMatcher, ScraperConfig, SelectorConfig,
};

#[cfg(feature = "cli")]
use crate::export::SUPPORTED_EXTENSIONS;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "maps-scrape")]
#[command(about = "Scrape business listings from a map search into a spreadsheet")]
pub struct CliConfig {
    /// Location to search in (e.g. "Ansbach")
    pub location: String,

    /// Type of business to search for (e.g. "electrician")
    pub business_type: String,

    #[arg(long, default_value_t = 20, help = "Maximum number of businesses to scrape")]
    pub max_results: usize,

    #[arg(long, help = "Output file (.xlsx, .zip or .json; default: businesses_TIMESTAMP.xlsx)")]
    pub output: Option<String>,

    #[arg(long, help = "Run Chrome in headless mode")]
    pub headless: bool,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "TOML file with selectors, timing and retry settings")]
    pub config: Option<String>,

    #[arg(long, help = "Scrape a saved results page instead of a live browser")]
    pub replay: Option<String>,

    #[arg(long, help = "Override the number of reviews collected per business")]
    pub max_reviews: Option<usize>,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub log_json: bool,

    #[arg(long, help = "Log CPU and memory usage per phase")]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    pub fn query(&self) -> String {
        format!("{} {}", self.location.trim(), self.business_type.trim())
    }

    pub fn output_path(&self) -> String {
        self.output.clone().unwrap_or_else(|| {
            format!(
                "businesses_{}.xlsx",
                chrono::Local::now().format("%Y%m%d_%H%M%S")
            )
        })
    }

    /// Loads the scraper settings (file or defaults) with command-line overrides applied.
    pub fn scraper_config(&self) -> Result<ScraperConfig> {
        let mut config = match &self.config {
            Some(path) => {
                tracing::info!("📁 Loading scraper configuration from: {}", path);
                ScraperConfig::from_file(path)?
            }
            None => ScraperConfig::default(),
        };

        if let Some(max_reviews) = self.max_reviews {
            config.extraction.max_reviews = max_reviews;
            tracing::info!("🔧 max_reviews overridden to: {}", max_reviews);
        }

        config.validate()?;
        Ok(config)
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_non_empty_string("location", &self.location)?;
        validation::validate_non_empty_string("business_type", &self.business_type)?;
        validation::validate_positive_number("max_results", self.max_results, 1)?;

        if let Some(output) = &self.output {
            validation::validate_path("output", output)?;
            validation::validate_file_extension("output", output, SUPPORTED_EXTENSIONS)?;
        }
        if let Some(replay) = &self.replay {
            validation::validate_path("replay", replay)?;
        }

        Ok(())
    }
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cli_arguments() {
        let config = CliConfig::try_parse_from([
            "maps-scrape",
            "Ansbach",
            "electrician",
            "--max-results",
            "5",
            "--headless",
            "--output",
            "out.json",
        ])
        .unwrap();

        assert_eq!(config.query(), "Ansbach electrician");
        assert_eq!(config.max_results, 5);
        assert!(config.headless);
        assert!(!config.verbose);
        assert_eq!(config.output_path(), "out.json");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_default_output_path_is_timestamped_workbook() {
        let config = CliConfig::try_parse_from(["maps-scrape", "Ansbach", "bakery"]).unwrap();
        let output = config.output_path();

        assert_eq!(config.max_results, 20);
        assert!(output.starts_with("businesses_"));
        assert!(output.ends_with(".xlsx"));
        assert_eq!(output.len(), "businesses_20240101_120000.xlsx".len());
    }

    #[test]
    fn test_validation_rejects_bad_arguments() {
        let config =
            CliConfig::try_parse_from(["maps-scrape", "Ansbach", "bakery", "--max-results", "0"])
                .unwrap();
        assert!(config.validate().is_err());

        let config =
            CliConfig::try_parse_from(["maps-scrape", "Ansbach", "bakery", "--output", "out.txt"])
                .unwrap();
        assert!(config.validate().is_err());

        let config = CliConfig::try_parse_from(["maps-scrape", "  ", "bakery"]).unwrap();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_max_reviews_override() {
        let config =
            CliConfig::try_parse_from(["maps-scrape", "Ansbach", "bakery", "--max-reviews", "2"])
                .unwrap();
        let scraper_config = config.scraper_config().unwrap();
        assert_eq!(scraper_config.extraction.max_reviews, 2);
    }
}
