use crate::domain::ports::{Element, ElementHandle, Page};
use crate::utils::error::{Result, ScrapeError};
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::element::Element as CdpElement;
use chromiumoxide::error::CdpError;
use chromiumoxide::page::Page as CdpPage;
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;

fn automation(e: CdpError) -> ScrapeError {
    ScrapeError::automation(e.to_string())
}

/// A launched Chromium process plus the task driving its CDP connection.
///
/// The handler task must be stopped when the session ends; `close` does it
/// gracefully and `Drop` aborts it as a fallback.
pub struct BrowserSession {
    browser: Browser,
    handler: JoinHandle<()>,
}

impl BrowserSession {
    pub async fn launch(headless: bool, request_timeout: Duration) -> Result<Self> {
        tracing::info!("Launching Chromium (headless: {})", headless);

        let mut builder = BrowserConfig::builder()
            .request_timeout(request_timeout)
            .window_size(1920, 1080)
            .no_sandbox()
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--no-first-run")
            .arg("--no-default-browser-check");
        if !headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(|message| ScrapeError::ConfigError {
            message: format!("invalid browser configuration: {}", message),
        })?;

        let (browser, mut handler) = Browser::launch(config).await.map_err(automation)?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::debug!("Browser handler error: {:?}", e);
                }
            }
            tracing::debug!("Browser event handler finished");
        });

        Ok(Self { browser, handler })
    }

    pub async fn new_page(&self) -> Result<ChromiumPage> {
        let page = self
            .browser
            .new_page("about:blank")
            .await
            .map_err(automation)?;
        Ok(ChromiumPage { page })
    }

    pub async fn close(mut self) -> Result<()> {
        self.browser.close().await.map_err(automation)?;
        if let Err(e) = self.browser.wait().await {
            tracing::warn!("Browser process did not exit cleanly: {}", e);
        }
        self.handler.abort();
        tracing::info!("Browser closed");
        Ok(())
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        self.handler.abort();
    }
}

/// One browser tab.
pub struct ChromiumPage {
    page: CdpPage,
}

impl ChromiumPage {
    async fn eval_number(&self, script: String) -> Result<f64> {
        self.page
            .evaluate(script)
            .await
            .map_err(automation)?
            .into_value::<f64>()
            .map_err(|e| ScrapeError::automation(format!("unexpected script result: {}", e)))
    }
}

fn query_script(selector: &str, body: &str) -> Result<String> {
    let selector = serde_json::to_string(selector)?;
    Ok(format!(
        "(() => {{ const el = document.querySelector({selector}); if (!el) return -1; {body} }})()"
    ))
}

fn boxed(elements: Vec<CdpElement>) -> Vec<ElementHandle> {
    elements
        .into_iter()
        .map(|element| Box::new(ChromiumElement { element }) as ElementHandle)
        .collect()
}

#[async_trait]
impl Page for ChromiumPage {
    async fn navigate(&self, url: &str) -> Result<()> {
        tracing::debug!("Navigating to {}", url);
        self.page.goto(url).await.map_err(automation)?;
        Ok(())
    }

    async fn find(&self, selector: &str) -> Result<Option<ElementHandle>> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        let elements = self.page.find_elements(selector).await.map_err(automation)?;
        Ok(boxed(elements))
    }

    async fn scroll_by(&self, selector: &str, pixels: u32) -> Result<()> {
        let script = query_script(selector, &format!("el.scrollTop += {pixels}; return el.scrollTop;"))?;
        if self.eval_number(script).await? < 0.0 {
            return Err(ScrapeError::automation(format!("no scrollable element matches '{}'", selector)));
        }
        Ok(())
    }

    async fn scroll_height(&self, selector: &str) -> Result<u64> {
        let script = query_script(selector, "return el.scrollHeight;")?;
        let height = self.eval_number(script).await?;
        if height < 0.0 {
            return Err(ScrapeError::automation(format!("no scrollable element matches '{}'", selector)));
        }
        Ok(height as u64)
    }
}

pub struct ChromiumElement {
    element: CdpElement,
}

#[async_trait]
impl Element for ChromiumElement {
    async fn find(&self, selector: &str) -> Result<Option<ElementHandle>> {
        Ok(self.find_all(selector).await?.into_iter().next())
    }

    async fn find_all(&self, selector: &str) -> Result<Vec<ElementHandle>> {
        let elements = self.element.find_elements(selector).await.map_err(automation)?;
        Ok(boxed(elements))
    }

    async fn text(&self) -> Result<String> {
        Ok(self
            .element
            .inner_text()
            .await
            .map_err(automation)?
            .unwrap_or_default())
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        self.element.attribute(name).await.map_err(automation)
    }

    async fn click(&self) -> Result<()> {
        self.element.click().await.map_err(automation)?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.element
            .call_js_fn("function() { this.value = ''; }", false)
            .await
            .map_err(automation)?;
        Ok(())
    }

    async fn type_text(&self, text: &str) -> Result<()> {
        self.element.type_str(text).await.map_err(automation)?;
        Ok(())
    }
}
