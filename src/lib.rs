pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod export;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::ScraperConfig;

pub use adapters::{LocalStorage, SnapshotPage};
pub use crate::core::{
    engine::{RunSummary, ScrapeEngine},
    orchestrator::{ScrapeOrchestrator, ScrapeState},
};
pub use domain::model::{Business, Review, ScrapeOutcome};
pub use export::{ExportFormat, FileSink};
pub use utils::error::{Result, ScrapeError};
