pub mod archive;
pub mod table;
pub mod workbook;

use crate::domain::model::Business;
use crate::domain::ports::{RecordSink, Storage};
use crate::utils::error::{Result, ScrapeError};
use std::path::Path;

pub use table::{tabulate, BusinessRow, ReviewRow, Tables};

pub const SUPPORTED_EXTENSIONS: &[&str] = &["xlsx", "zip", "json"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Two-sheet spreadsheet.
    Xlsx,
    /// Zip archive with one CSV file per table.
    CsvZip,
    /// The business list with nested reviews.
    Json,
}

impl ExportFormat {
    pub fn from_path(path: &str) -> Result<Self> {
        let extension = Path::new(path)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        match extension.as_str() {
            "xlsx" => Ok(Self::Xlsx),
            "zip" => Ok(Self::CsvZip),
            "json" => Ok(Self::Json),
            _ => Err(ScrapeError::InvalidConfigValueError {
                field: "output".to_string(),
                value: path.to_string(),
                reason: format!("extension must be one of: {}", SUPPORTED_EXTENSIONS.join(", ")),
            }),
        }
    }

    pub fn render(&self, businesses: &[Business]) -> Result<Vec<u8>> {
        match self {
            Self::Xlsx => workbook::render_workbook(&tabulate(businesses)),
            Self::CsvZip => archive::render_archive(&tabulate(businesses)),
            Self::Json => Ok(serde_json::to_vec_pretty(businesses)?),
        }
    }
}

/// Renders records in memory and hands the bytes to a storage backend.
pub struct FileSink<S: Storage> {
    storage: S,
}

impl<S: Storage> FileSink<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }
}

impl<S: Storage> RecordSink for FileSink<S> {
    async fn write(&self, businesses: &[Business], destination: &str) -> Result<String> {
        let format = ExportFormat::from_path(destination)?;
        let data = format.render(businesses)?;

        tracing::debug!("Writing {:?} output ({} bytes) to {}", format, data.len(), destination);
        self.storage.write_file(destination, &data).await?;

        Ok(destination.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(ExportFormat::from_path("out.xlsx").unwrap(), ExportFormat::Xlsx);
        assert_eq!(ExportFormat::from_path("dir/out.ZIP").unwrap(), ExportFormat::CsvZip);
        assert_eq!(ExportFormat::from_path("out.json").unwrap(), ExportFormat::Json);
        assert!(ExportFormat::from_path("out.csv").is_err());
        assert!(ExportFormat::from_path("out").is_err());
    }

    #[test]
    fn test_json_render_keeps_nested_reviews() {
        let business = Business {
            name: "Alpha".into(),
            street_address: "Main St 5".into(),
            postal_code: "12345".into(),
            city: "Springfield".into(),
            phone: None,
            website: None,
            avg_rating: 4.5,
            num_ratings: 2,
            reviews: vec![],
        };

        let bytes = ExportFormat::Json.render(&[business.clone()]).unwrap();
        let parsed: Vec<Business> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(parsed, vec![business]);
    }
}
