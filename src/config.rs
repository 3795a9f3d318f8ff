// src/config.rs

use crate::errors::ConfigError;
use std::env;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub max_workers: usize,
    pub db_path: String,
    pub fetch: FetchConfig,
    /// `None` disables the alternate render collaborator.
    pub render: Option<RenderConfig>,
    /// `None` disables generated insights; scans still complete.
    pub gemini: Option<GeminiConfig>,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub timeout: Duration,
    /// Attempts per strategy.
    pub max_retries: u32,
    pub scraper_api: Option<ScraperApiConfig>,
    pub proxy_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ScraperApiConfig {
    pub endpoint: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct RenderConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_retries: 2,
            scraper_api: None,
            proxy_url: None,
        }
    }
}

impl AppConfig {
    /// Reads `.env` if present, then the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();

        let fetch = FetchConfig {
            timeout: Duration::from_secs(parse_or("FETCH_TIMEOUT_SECS", 30)?),
            max_retries: parse_or("FETCH_MAX_RETRIES", 2)?,
            scraper_api: match (var("SCRAPER_API_URL"), var("SCRAPER_API_KEY")) {
                (Some(endpoint), Some(api_key)) => Some(ScraperApiConfig { endpoint, api_key }),
                _ => None,
            },
            proxy_url: var("PROXY_URL"),
        };

        let render = match (var("RENDER_API_URL"), var("RENDER_API_KEY")) {
            (Some(base_url), Some(api_key)) => Some(RenderConfig {
                base_url,
                api_key,
                timeout: Duration::from_secs(parse_or("RENDER_TIMEOUT_SECS", 45)?),
            }),
            _ => None,
        };

        let gemini = match var("GEMINI_API_KEY") {
            Some(api_key) => Some(GeminiConfig {
                api_key,
                model: var("GEMINI_MODEL").unwrap_or_else(|| "gemini-2.5-flash".to_string()),
                timeout: Duration::from_secs(parse_or("NLG_TIMEOUT_SECS", 30)?),
            }),
            None => None,
        };

        Ok(Self {
            addr: parse_or("PRICEWATCH_ADDR", SocketAddr::from(([127, 0, 0, 1], 3000)))?,
            max_workers: parse_or("PRICEWATCH_WORKERS", 8)?,
            db_path: var("DATABASE_PATH").unwrap_or_else(|| "pricewatch.sqlite3".to_string()),
            fetch,
            render,
            gemini,
        })
    }
}

/// Unset and blank variables are treated the same.
fn var(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T: FromStr>(key: &'static str, default: T) -> Result<T, ConfigError> {
    match var(key) {
        None => Ok(default),
        Some(value) => value
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
