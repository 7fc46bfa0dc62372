use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScrapeError {
    #[error("Search failed: {message}")]
    SearchError { message: String },

    #[error("Search timed out after {timeout:?} waiting for '{selector}'")]
    SearchTimeoutError { selector: String, timeout: Duration },

    #[error("Could not extract {field}: {message}")]
    ExtractionError { field: String, message: String },

    #[error("Invalid address format '{address}': {reason}")]
    AddressFormatError { address: String, reason: String },

    #[error("Invalid rating '{value}': {reason}")]
    InvalidRatingError { value: String, reason: String },

    #[error("Page automation failed: {message}")]
    AutomationError { message: String },

    #[error("Failed to scrape after {attempts} attempts: {source}")]
    RetriesExhausted {
        attempts: u32,
        #[source]
        source: Box<ScrapeError>,
    },

    #[error("No businesses found for '{query}'")]
    NoResults { query: String },

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("Workbook error: {0}")]
    WorkbookError(#[from] rust_xlsxwriter::XlsxError),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Navigation,
    Extraction,
    Normalization,
    Automation,
    Export,
    Configuration,
}

impl ScrapeError {
    pub fn search(message: impl Into<String>) -> Self {
        Self::SearchError {
            message: message.into(),
        }
    }

    pub fn extraction(field: &str, message: impl Into<String>) -> Self {
        Self::ExtractionError {
            field: field.to_string(),
            message: message.into(),
        }
    }

    pub fn automation(message: impl Into<String>) -> Self {
        Self::AutomationError {
            message: message.into(),
        }
    }

    pub fn invalid_value(field: &str, value: impl ToString, reason: impl Into<String>) -> Self {
        Self::InvalidConfigValueError {
            field: field.to_string(),
            value: value.to_string(),
            reason: reason.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::SearchError { .. } | Self::SearchTimeoutError { .. } | Self::NoResults { .. } => {
                ErrorCategory::Navigation
            }
            Self::ExtractionError { .. } => ErrorCategory::Extraction,
            Self::AddressFormatError { .. } | Self::InvalidRatingError { .. } => {
                ErrorCategory::Normalization
            }
            Self::AutomationError { .. } => ErrorCategory::Automation,
            Self::RetriesExhausted { source, .. } => source.category(),
            Self::IoError(_)
            | Self::CsvError(_)
            | Self::ZipError(_)
            | Self::WorkbookError(_)
            | Self::SerializationError(_) => ErrorCategory::Export,
            Self::ConfigError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    /// Errors that only invalidate a single listing card.
    pub fn is_card_level(&self) -> bool {
        matches!(
            self.category(),
            ErrorCategory::Extraction | ErrorCategory::Normalization
        ) && !matches!(self, Self::RetriesExhausted { .. })
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Navigation => {
                "Check your network connection, dismiss any blocking dialogs, or raise timing.page_load_timeout_secs"
            }
            ErrorCategory::Extraction | ErrorCategory::Normalization => {
                "The page layout may have changed; update the selectors in your --config file"
            }
            ErrorCategory::Automation => {
                "Make sure Chrome/Chromium is installed and can start (try without --headless)"
            }
            ErrorCategory::Export => "Check that the output path is writable",
            ErrorCategory::Configuration => "Fix the reported setting and run again",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::RetriesExhausted { attempts, source } => format!(
                "Scraping failed {} times in a row. Last error: {}",
                attempts,
                source.user_friendly_message()
            ),
            Self::NoResults { query } => format!("No businesses found for \"{}\"", query),
            Self::SearchTimeoutError { .. } => {
                "The search results did not load in time".to_string()
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ScrapeError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_card_level_classification() {
        assert!(ScrapeError::extraction("name", "missing").is_card_level());
        assert!(ScrapeError::InvalidRatingError {
            value: "abc".into(),
            reason: "not a number".into()
        }
        .is_card_level());
        assert!(!ScrapeError::search("boom").is_card_level());
        assert!(!ScrapeError::automation("crashed").is_card_level());

        let exhausted = ScrapeError::RetriesExhausted {
            attempts: 3,
            source: Box::new(ScrapeError::extraction("name", "missing")),
        };
        assert!(!exhausted.is_card_level());
        assert_eq!(exhausted.category(), ErrorCategory::Extraction);
    }

    #[test]
    fn test_user_friendly_message_unwraps_retries() {
        let err = ScrapeError::RetriesExhausted {
            attempts: 2,
            source: Box::new(ScrapeError::NoResults {
                query: "Ansbach electrician".into(),
            }),
        };
        let message = err.user_friendly_message();
        assert!(message.contains("2 times"));
        assert!(message.contains("Ansbach electrician"));
    }
}
