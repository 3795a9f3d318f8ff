// src/pricing/render.rs

//! Alternate page retrieval through an external headless-browser service,
//! used when plain fetching finds too little pricing. Best effort only:
//! every failure comes back as `None`.

use crate::config::RenderConfig;
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

/// Selectors the render service waits for before snapshotting the DOM.
const WAIT_FOR_SELECTOR: &str = r#".pricing-card, [data-test="pricing"], .tier"#;

/// Result of agentic navigation: where it ended up and what it saw there.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Navigation {
    pub html: String,
    pub final_url: String,
}

pub trait PageRenderer: Send + Sync {
    /// Fully rendered markup of `url`, or `None`.
    fn render(&self, url: &str) -> Option<String>;

    /// Starting from `start_url`, find the pricing page and return its markup.
    fn navigate(&self, start_url: &str) -> Option<Navigation>;
}

#[derive(Deserialize)]
struct RenderResponse {
    html: Option<String>,
}

pub struct HttpRenderClient {
    client: Client,
    base_url: String,
    api_key: String,
    timeout_ms: u64,
}

impl HttpRenderClient {
    pub fn new(cfg: &RenderConfig) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(cfg.timeout).build()?;
        Ok(Self {
            client,
            base_url: cfg.base_url.trim_end_matches('/').to_string(),
            api_key: cfg.api_key.clone(),
            timeout_ms: cfg.timeout.as_millis() as u64,
        })
    }

    fn post(&self, path: &str, body: serde_json::Value) -> Result<String, String> {
        let resp = self
            .client
            .post(format!("{}/{path}", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .map_err(|e| e.to_string())?;

        let status = resp.status();
        let text = resp.text().map_err(|e| e.to_string())?;
        if !status.is_success() {
            return Err(format!("HTTP {status}: {text}"));
        }
        Ok(text)
    }
}

impl PageRenderer for HttpRenderClient {
    fn render(&self, url: &str) -> Option<String> {
        info!(url, "rendering page");
        let body = json!({
            "url": url,
            "wait_for_selector": WAIT_FOR_SELECTOR,
            "timeout": self.timeout_ms,
        });

        match self.post("render", body) {
            Ok(text) => {
                // The service answers either `{"html": ...}` or the bare markup.
                let html = serde_json::from_str::<RenderResponse>(&text)
                    .ok()
                    .and_then(|r| r.html)
                    .unwrap_or(text);
                Some(html).filter(|h| !h.trim().is_empty())
            }
            Err(e) => {
                warn!(url, error = %e, "render failed");
                None
            }
        }
    }

    fn navigate(&self, start_url: &str) -> Option<Navigation> {
        info!(start_url, "🧭 navigating to pricing page");
        let body = json!({ "url": start_url, "goal": "pricing" });

        let text = match self.post("navigate", body) {
            Ok(text) => text,
            Err(e) => {
                warn!(start_url, error = %e, "navigation failed");
                return None;
            }
        };

        match serde_json::from_str::<Navigation>(&text) {
            Ok(nav) if !nav.html.trim().is_empty() => Some(nav),
            Ok(_) => None,
            Err(e) => {
                warn!(start_url, error = %e, "navigation returned malformed payload");
                None
            }
        }
    }
}
