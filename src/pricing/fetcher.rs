// src/pricing/fetcher.rs
use crate::config::{FetchConfig, ScraperApiConfig};
use crate::errors::FetchError;
use rand::Rng;
use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, REFERER};
use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use url::Url;

const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/121.0 Safari/537.36";

/// Bodies this short are error stubs or redirects, not pages.
const MIN_HTML_BYTES: usize = 100;
const JITTER_MAX_MILLIS: u64 = 500;

/// Anything that can turn a URL into page markup.
pub trait PageSource: Send + Sync {
    fn fetch(&self, url: &str) -> Result<String, FetchError>;
}

enum Strategy {
    ScraperApi(ScraperApiConfig),
    Proxy(Client),
    Direct,
}

impl Strategy {
    fn name(&self) -> &'static str {
        match self {
            Strategy::ScraperApi(_) => "scraper API",
            Strategy::Proxy(_) => "proxy",
            Strategy::Direct => "direct",
        }
    }
}

/// Fetches pages over HTTP, trying each configured strategy in turn with
/// a few attempts each. Attempts are sequential so exactly one response wins.
pub struct HttpPageFetcher {
    client: Client,
    strategies: Vec<Strategy>,
    max_retries: u32,
    backoff_unit: Duration,
}

impl HttpPageFetcher {
    pub fn new(cfg: &FetchConfig) -> Result<Self, FetchError> {
        let client = base_builder(cfg.timeout)
            .build()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let mut strategies = Vec::new();
        if let Some(api) = &cfg.scraper_api {
            strategies.push(Strategy::ScraperApi(api.clone()));
        }
        if let Some(proxy_url) = &cfg.proxy_url {
            let proxy =
                reqwest::Proxy::all(proxy_url).map_err(|e| FetchError::Network(e.to_string()))?;
            let proxied = base_builder(cfg.timeout)
                .proxy(proxy)
                .build()
                .map_err(|e| FetchError::Network(e.to_string()))?;
            strategies.push(Strategy::Proxy(proxied));
        }
        strategies.push(Strategy::Direct);

        Ok(Self {
            client,
            strategies,
            max_retries: cfg.max_retries.max(1),
            backoff_unit: Duration::from_secs(1),
        })
    }

    pub fn strategy_names(&self) -> Vec<&'static str> {
        self.strategies.iter().map(Strategy::name).collect()
    }

    fn try_strategy(&self, strategy: &Strategy, url: &str) -> Result<String, FetchError> {
        let html = match strategy {
            Strategy::ScraperApi(api) => self.fetch_via_scraper_api(api, url)?,
            Strategy::Proxy(client) => fetch_plain(client, url)?,
            Strategy::Direct => fetch_plain(&self.client, url)?,
        };

        if html.len() <= MIN_HTML_BYTES {
            return Err(FetchError::TooShort(html.len()));
        }
        Ok(html)
    }

    fn fetch_via_scraper_api(&self, api: &ScraperApiConfig, url: &str) -> Result<String, FetchError> {
        let mut params = HashMap::new();
        params.insert("url", url.to_string());
        params.insert("apikey", api.api_key.clone());
        params.insert("original_status", "true".to_string());

        let resp = self
            .client
            .get(&api.endpoint)
            .header(REFERER, HeaderValue::from_static("https://www.google.com/"))
            .query(&params)
            .send()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = resp.status();
        let text = resp
            .text()
            .map_err(|e| FetchError::Network(e.to_string()))?;

        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        // Scraping APIs report their own failures as a JSON body with a code.
        if text.trim_start().starts_with('{') {
            if let Ok(json) = serde_json::from_str::<serde_json::Value>(&text) {
                if json.get("code").is_some() {
                    return Err(FetchError::Network(format!("scraper API error: {text}")));
                }
            }
        }

        Ok(text)
    }
}

impl PageSource for HttpPageFetcher {
    fn fetch(&self, url: &str) -> Result<String, FetchError> {
        validate_url(url)?;

        let mut errors = Vec::new();

        for strategy in &self.strategies {
            for attempt in 1..=self.max_retries {
                let start = Instant::now();
                debug!(strategy = strategy.name(), attempt, url, "fetch attempt");

                match self.try_strategy(strategy, url) {
                    Ok(html) => {
                        info!(
                            strategy = strategy.name(),
                            attempt,
                            bytes = html.len(),
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "✅ page fetched"
                        );
                        return Ok(html);
                    }
                    Err(e) => {
                        warn!(strategy = strategy.name(), attempt, error = %e, "⚠️ fetch attempt failed");
                        errors.push(format!("{} attempt {attempt}: {e}", strategy.name()));

                        if attempt < self.max_retries {
                            let jitter = rand::thread_rng().gen_range(0..=JITTER_MAX_MILLIS);
                            std::thread::sleep(
                                self.backoff_unit * attempt + Duration::from_millis(jitter),
                            );
                        }
                    }
                }
            }
        }

        warn!(url, "❌ all fetch strategies failed");
        Err(FetchError::Exhausted(errors.join("; ")))
    }
}

fn base_builder(timeout: Duration) -> reqwest::blocking::ClientBuilder {
    let mut headers = HeaderMap::new();
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.5"));

    Client::builder()
        .user_agent(USER_AGENT)
        .default_headers(headers)
        .redirect(reqwest::redirect::Policy::limited(5))
        .timeout(timeout)
}

fn fetch_plain(client: &Client, url: &str) -> Result<String, FetchError> {
    let resp = client
        .get(url)
        .send()
        .map_err(|e| FetchError::Network(e.to_string()))?;

    let status = resp.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    resp.text().map_err(|e| FetchError::Network(e.to_string()))
}

/// Only absolute http(s) URLs are fetched.
pub fn validate_url(url: &str) -> Result<Url, FetchError> {
    let parsed = Url::parse(url).map_err(|_| FetchError::InvalidUrl(url.to_string()))?;
    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        _ => Err(FetchError::InvalidUrl(url.to_string())),
    }
}
