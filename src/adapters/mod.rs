//! Concrete implementations of the domain ports.

#[cfg(feature = "browser")]
pub mod chromium;
pub mod snapshot;
pub mod storage;

pub use snapshot::SnapshotPage;
pub use storage::LocalStorage;
