use crate::domain::model::Business;
use crate::utils::error::Result;
use async_trait::async_trait;

pub type ElementHandle = Box<dyn Element>;

/// A node of the rendered page, as exposed by an automation backend.
///
/// Lookups return `Ok(None)` / an empty list when nothing matches; `Err` is
/// reserved for the backend itself failing.
#[async_trait]
pub trait Element: Send + Sync {
    async fn find(&self, selector: &str) -> Result<Option<ElementHandle>>;
    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>>;
    /// Rendered text, empty when the node has none.
    async fn text(&self) -> Result<String>;
    async fn attribute(&self, name: &str) -> Result<Option<String>>;
    async fn click(&self) -> Result<()>;
    /// Empties a text input.
    async fn clear(&self) -> Result<()>;
    async fn type_text(&self, text: &str) -> Result<()>;
}

/// One automation session on one tab.
#[async_trait]
pub trait Page: Send + Sync {
    async fn navigate(&self, url: &str) -> Result<()>;
    async fn find(&self, selector: &str) -> Result<Option<ElementHandle>>;
    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>>;
    /// Scrolls the first element matching `selector` down by `pixels`.
    async fn scroll_by(&self, selector: &str, pixels: u32) -> Result<()>;
    /// Current scrollable height of the first element matching `selector`.
    async fn scroll_height(&self, selector: &str) -> Result<u64>;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

/// Consumes the finished business list. Returns where the records ended up.
pub trait RecordSink: Send + Sync {
    fn write(
        &self,
        businesses: &[Business],
        destination: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}
