//! Page backend over saved HTML.
//!
//! Each frame is one state of the results page; scrolling moves to the next
//! frame the way lazy loading would. Clicks, typing and navigation are recorded
//! and otherwise change nothing. Used for `--replay` and in tests.

use crate::domain::ports::{Element, ElementHandle, Page, Storage};
use crate::utils::error::{Result, ScrapeError};
use async_trait::async_trait;
use ego_tree::{NodeId, NodeRef};
use scraper::{ElementRef, Html, Node, Selector};
use std::sync::{Arc, Mutex};

const BLOCK_TAGS: &[&str] = &[
    "address", "article", "div", "footer", "h1", "h2", "h3", "h4", "h5", "h6", "header", "li",
    "main", "ol", "p", "section", "table", "tr", "ul",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageAction {
    Navigate(String),
    Click(String),
    Clear(String),
    Type(String),
    Scroll(String),
}

type ActionLog = Arc<Mutex<Vec<PageAction>>>;

pub struct SnapshotPage {
    frames: Vec<Arc<str>>,
    current: Mutex<usize>,
    actions: ActionLog,
}

impl SnapshotPage {
    pub fn new(html: impl Into<String>) -> Self {
        Self::from_frames(vec![html.into()])
    }

    pub fn from_frames(frames: Vec<String>) -> Self {
        Self {
            frames: frames.into_iter().map(Arc::from).collect(),
            current: Mutex::new(0),
            actions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Loads a saved page through a storage backend.
    pub async fn load<S: Storage>(storage: &S, path: &str) -> Result<Self> {
        let bytes = storage.read_file(path).await?;
        let html = String::from_utf8(bytes).map_err(|e| {
            ScrapeError::invalid_value("replay", path, format!("not UTF-8 HTML: {}", e))
        })?;
        Ok(Self::new(html))
    }

    pub fn actions(&self) -> Vec<PageAction> {
        self.actions.lock().map(|log| log.clone()).unwrap_or_default()
    }

    fn current_frame(&self) -> Result<Arc<str>> {
        let index = *self
            .current
            .lock()
            .map_err(|_| ScrapeError::automation("snapshot state poisoned"))?;
        self.frames
            .get(index)
            .cloned()
            .ok_or_else(|| ScrapeError::automation("snapshot has no frames"))
    }

    fn record(&self, action: PageAction) {
        record(&self.actions, action);
    }

    fn select_in_frame(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        let frame = self.current_frame()?;
        let selector = parse_selector(selector)?;
        let document = Html::parse_document(&frame);
        Ok(document
            .select(&selector)
            .map(|element| self.handle(&frame, element.id()))
            .collect())
    }

    fn handle(&self, frame: &Arc<str>, node: NodeId) -> ElementHandle {
        Box::new(SnapshotElement {
            frame: Arc::clone(frame),
            node,
            actions: Arc::clone(&self.actions),
        })
    }
}

#[async_trait]
impl Page for SnapshotPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        self.record(PageAction::Navigate(url.to_string()));
        let mut current = self
            .current
            .lock()
            .map_err(|_| ScrapeError::automation("snapshot state poisoned"))?;
        *current = 0;
        Ok(())
    }

    async fn find(&self, selector: &str) -> Result<Option<ElementHandle>> {
        Ok(self.select_in_frame(selector)?.into_iter().next())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        self.select_in_frame(selector)
    }

    async fn scroll_by(&self, selector: &str, _pixels: u32) -> Result<()> {
        self.record(PageAction::Scroll(selector.to_string()));
        let mut current = self
            .current
            .lock()
            .map_err(|_| ScrapeError::automation("snapshot state poisoned"))?;
        if *current + 1 < self.frames.len() {
            *current += 1;
        }
        Ok(())
    }

    async fn scroll_height(&self, selector: &str) -> Result<u64> {
        let frame = self.current_frame()?;
        let parsed = parse_selector(selector)?;
        let document = Html::parse_document(&frame);
        document
            .select(&parsed)
            .next()
            .map(|container| container.html().len() as u64)
            .ok_or_else(|| ScrapeError::automation(format!("no element matches '{}'", selector)))
    }
}

/// Handle to one node of a frame. The frame is re-parsed on access; parsing is
/// deterministic so node ids stay valid.
struct SnapshotElement {
    frame: Arc<str>,
    node: NodeId,
    actions: ActionLog,
}

impl SnapshotElement {
    fn with_element<T>(&self, f: impl FnOnce(ElementRef<'_>) -> Result<T>) -> Result<T> {
        let document = Html::parse_document(&self.frame);
        let element = document
            .tree
            .get(self.node)
            .and_then(ElementRef::wrap)
            .ok_or_else(|| ScrapeError::automation("stale element handle"))?;
        f(element)
    }

    fn select(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        let parsed = parse_selector(selector)?;
        self.with_element(|element| {
            Ok(element
                .select(&parsed)
                .map(|found| {
                    Box::new(SnapshotElement {
                        frame: Arc::clone(&self.frame),
                        node: found.id(),
                        actions: Arc::clone(&self.actions),
                    }) as ElementHandle
                })
                .collect())
        })
    }

    fn label(&self) -> String {
        self.with_element(|element| {
            let text = rendered_text(element);
            Ok(if text.is_empty() {
                format!("<{}>", element.value().name())
            } else {
                text.chars().take(40).collect()
            })
        })
        .unwrap_or_default()
    }
}

#[async_trait]
impl Element for SnapshotElement {
    async fn find(&self, selector: &str) -> Result<Option<ElementHandle>> {
        Ok(self.select(selector)?.into_iter().next())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        self.select(selector)
    }

    async fn text(&self) -> Result<String> {
        self.with_element(|element| Ok(rendered_text(element)))
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.with_element(|element| Ok(element.value().attr(name).map(str::to_string)))
    }

    async fn click(&self) -> Result<()> {
        record(&self.actions, PageAction::Click(self.label()));
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        record(&self.actions, PageAction::Clear(self.label()));
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        record(&self.actions, PageAction::Type(text.to_string()));
        Ok(())
    }
}

fn record(log: &ActionLog, action: PageAction) {
    if let Ok(mut actions) = log.lock() {
        actions.push(action);
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector)
        .map_err(|e| ScrapeError::automation(format!("invalid selector '{}': {}", selector, e)))
}

/// Approximates `innerText`: block elements end a line, other whitespace collapses.
fn rendered_text(element: ElementRef<'_>) -> String {
    let mut raw = String::new();
    collect_text(*element, &mut raw);

    raw.lines()
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn collect_text(node: NodeRef<'_, Node>, out: &mut String) {
    for child in node.children() {
        match child.value() {
            Node::Text(text) => out.push_str(&text.replace('\n', " ")),
            Node::Element(element) => {
                if element.name() == "br" {
                    out.push('\n');
                    continue;
                }
                let block = BLOCK_TAGS.contains(&element.name());
                if block {
                    out.push('\n');
                }
                collect_text(child, out);
                if block {
                    out.push('\n');
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"
<html><body>
  <div id="feed" role="feed">
    <div role="article" class="card">
      <span class="name">Alpha</span>
      <a class="site" href="https://alpha.example">Website</a>
      <div class="points"><div>👍 Fast</div><div>👎 Pricey</div></div>
    </div>
    <div role="article" class="card"><span class="name">Beta
      GmbH</span></div>
  </div>
  <button>Alle akzeptieren</button>
</body></html>"#;

    #[tokio::test]
    async fn test_find_and_read_elements() {
        let page = SnapshotPage::new(PAGE);

        let cards = page.find_all(r#"[role="article"]"#).await.unwrap();
        assert_eq!(cards.len(), 2);

        let name = cards[1].find(".name").await.unwrap().unwrap();
        assert_eq!(name.text().await.unwrap(), "Beta GmbH");

        let site = cards[0].find("a.site").await.unwrap().unwrap();
        assert_eq!(
            site.attribute("href").await.unwrap().as_deref(),
            Some("https://alpha.example")
        );
        assert_eq!(site.attribute("title").await.unwrap(), None);

        assert!(cards[1].find("a.site").await.unwrap().is_none());
        assert!(page.find(".missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_block_elements_produce_lines() {
        let page = SnapshotPage::new(PAGE);
        let points = page.find(".points").await.unwrap().unwrap();
        assert_eq!(points.text().await.unwrap(), "👍 Fast\n👎 Pricey");
    }

    #[tokio::test]
    async fn test_element_lookup_keeps_document_context() {
        let page = SnapshotPage::new(PAGE);
        let card = page.find(".card").await.unwrap().unwrap();
        // Ancestors outside the card still take part in matching.
        let name = card.find(r#"[role="feed"] .name"#).await.unwrap();
        assert!(name.is_some());
    }

    #[tokio::test]
    async fn test_scroll_advances_frames_and_records_actions() {
        let frames = vec![
            r#"<div role="feed"><p>one</p></div>"#.to_string(),
            r#"<div role="feed"><p>one</p><p>two</p></div>"#.to_string(),
        ];
        let page = SnapshotPage::from_frames(frames);

        let first = page.scroll_height(r#"[role="feed"]"#).await.unwrap();
        page.scroll_by(r#"[role="feed"]"#, 1000).await.unwrap();
        let second = page.scroll_height(r#"[role="feed"]"#).await.unwrap();
        page.scroll_by(r#"[role="feed"]"#, 1000).await.unwrap();
        let third = page.scroll_height(r#"[role="feed"]"#).await.unwrap();

        assert!(second > first);
        assert_eq!(second, third);

        page.navigate("https://maps.example").await.unwrap();
        assert_eq!(page.scroll_height(r#"[role="feed"]"#).await.unwrap(), first);

        let button = page.find("p").await.unwrap().unwrap();
        button.click().await.unwrap();
        button.type_text("hello").await.unwrap();

        let actions = page.actions();
        assert_eq!(actions.len(), 5);
        assert_eq!(actions[2], PageAction::Navigate("https://maps.example".into()));
        assert_eq!(actions[3], PageAction::Click("one".into()));
        assert_eq!(actions[4], PageAction::Type("hello".into()));
    }

    #[tokio::test]
    async fn test_load_through_storage() {
        let dir = tempfile::TempDir::new().unwrap();
        let storage = crate::adapters::storage::LocalStorage::new(dir.path());
        storage.write_file("saved/results.html", PAGE.as_bytes()).await.unwrap();

        let page = SnapshotPage::load(&storage, "saved/results.html").await.unwrap();
        assert_eq!(page.find_all(".card").await.unwrap().len(), 2);

        storage.write_file("binary.html", &[0xff, 0xfe]).await.unwrap();
        assert!(matches!(
            SnapshotPage::load(&storage, "binary.html").await,
            Err(ScrapeError::InvalidConfigValueError { .. })
        ));
        assert!(matches!(
            SnapshotPage::load(&storage, "missing.html").await,
            Err(ScrapeError::IoError(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_selector_is_an_error() {
        let page = SnapshotPage::new(PAGE);
        assert!(matches!(
            page.find("[[").await,
            Err(ScrapeError::AutomationError { .. })
        ));
        assert!(page.scroll_height(".missing").await.is_err());
    }
}
