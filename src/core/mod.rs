pub mod card;
pub mod engine;
pub mod navigator;
pub mod normalize;
pub mod orchestrator;
pub mod reviews;

pub use crate::domain::model::{Business, Review, ScrapeOutcome};
pub use crate::domain::ports::{Element, ElementHandle, Page, RecordSink, Storage};
pub use crate::utils::error::Result;
