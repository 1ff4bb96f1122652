use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use super::cdp::{evaluation_value, CdpSession};
use super::error::BrowserError;
use crate::domain::ports::{VenueVisitor, VisitError};

#[derive(Debug, Clone, PartialEq)]
pub struct BrowserOptions {
    /// `http://host:port` of a browser started with `--remote-debugging-port`,
    /// or a page `ws://` URL used as-is.
    pub devtools_url: String,
    pub venue_url_template: String,
    pub store_key: String,
    pub command_timeout: Duration,
    pub load_timeout: Duration,
    /// Extra wait after the load event so deferred requests can fill the store.
    pub settle: Duration,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TargetInfo {
    #[serde(rename = "type")]
    kind: String,
    web_socket_debugger_url: Option<String>,
}

/// 從 DevTools HTTP 端點找出第一個頁面的 WebSocket 位址
pub async fn discover_page_ws_url(client: &reqwest::Client, devtools_url: &str) -> Result<String, BrowserError> {
    if devtools_url.starts_with("ws://") || devtools_url.starts_with("wss://") {
        return Ok(devtools_url.to_string());
    }

    let endpoint = format!("{}/json/list", devtools_url.trim_end_matches('/'));
    tracing::debug!("Listing DevTools targets at {}", endpoint);
    let targets: Vec<TargetInfo> = client
        .get(&endpoint)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;

    targets
        .into_iter()
        .filter(|target| target.kind == "page")
        .find_map(|target| target.web_socket_debugger_url)
        .ok_or(BrowserError::NoPageTarget { endpoint })
}

pub fn venue_url(template: &str, slug: &str) -> String {
    template.replace("{slug}", slug)
}

pub fn storage_read_expression(store_key: &str) -> String {
    // JSON string literals are valid JavaScript string literals.
    format!("localStorage.getItem({})", Value::String(store_key.to_string()))
}

/// 透過 Chrome DevTools Protocol 操作單一分頁的場館造訪者
pub struct BrowserVenueVisitor {
    session: CdpSession,
    options: BrowserOptions,
}

impl BrowserVenueVisitor {
    pub async fn connect(options: BrowserOptions) -> Result<Self, BrowserError> {
        let client = reqwest::Client::builder()
            .timeout(options.command_timeout)
            .build()?;
        let ws_url = discover_page_ws_url(&client, &options.devtools_url).await?;
        let session = CdpSession::connect(&ws_url, options.command_timeout).await?;
        session.send("Page.enable", json!({})).await?;
        tracing::info!("Connected to browser page {}", ws_url);
        Ok(Self { session, options })
    }

    async fn goto(&mut self, url: &str) -> Result<(), BrowserError> {
        self.session.drain_events();
        let result = self.session.send("Page.navigate", json!({ "url": url })).await?;
        if let Some(reason) = result.get("errorText").and_then(Value::as_str) {
            return Err(BrowserError::NavigationFailed {
                reason: reason.to_string(),
            });
        }
        self.session
            .wait_for_event("Page.loadEventFired", self.options.load_timeout)
            .await?;
        tokio::time::sleep(self.options.settle).await;
        Ok(())
    }

    async fn read_store(&mut self) -> Result<Option<String>, BrowserError> {
        let expression = storage_read_expression(&self.options.store_key);
        let result = self
            .session
            .send(
                "Runtime.evaluate",
                json!({ "expression": expression, "returnByValue": true }),
            )
            .await?;
        match evaluation_value(&result)? {
            Value::Null => Ok(None),
            Value::String(text) => Ok(Some(text)),
            other => Err(BrowserError::Protocol {
                detail: format!("localStorage returned a non-string value: {other}"),
            }),
        }
    }
}

#[async_trait]
impl VenueVisitor for BrowserVenueVisitor {
    async fn navigate(&mut self, slug: &str) -> Result<(), VisitError> {
        let url = venue_url(&self.options.venue_url_template, slug);
        tracing::debug!("Navigating to {}", url);
        self.goto(&url)
            .await
            .map_err(|e| VisitError::new(e.to_string()))
    }

    async fn read_serialized_store(&mut self) -> Result<Option<String>, VisitError> {
        self.read_store()
            .await
            .map_err(|e| VisitError::new(e.to_string()))
    }
}
