// src/insight/gemini.rs

use crate::config::GeminiConfig;
use crate::domain::changes::Delta;
use crate::errors::InsightError;
use crate::insight::gate::InsightProvider;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const MAX_INSIGHT_WORDS: usize = 120;

#[derive(Serialize)]
struct GenerateRequest {
    contents: Vec<Content>,
}

#[derive(Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Content,
}

pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(cfg: &GeminiConfig) -> Result<Self, InsightError> {
        if cfg.api_key.trim().is_empty() {
            return Err(InsightError::NotConfigured);
        }
        let client = Client::builder()
            .timeout(cfg.timeout)
            .build()
            .map_err(|e| InsightError::Request(e.to_string()))?;

        Ok(Self {
            client,
            api_key: cfg.api_key.clone(),
            model: cfg.model.clone(),
        })
    }
}

impl InsightProvider for GeminiClient {
    fn analyze(&self, delta: &Delta) -> Result<String, InsightError> {
        let prompt = build_prompt(delta)?;
        let body = GenerateRequest {
            contents: vec![Content {
                parts: vec![Part { text: prompt }],
            }],
        };

        let resp = self
            .client
            .post(format!("{API_BASE}/models/{}:generateContent", self.model))
            .query(&[("key", self.api_key.as_str())])
            .json(&body)
            .send()
            .map_err(|e| InsightError::Request(e.to_string()))?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().unwrap_or_default();
            return Err(InsightError::Api(format!("{status} - {text}")));
        }

        let parsed: GenerateResponse = resp
            .json()
            .map_err(|e| InsightError::Request(e.to_string()))?;

        let text = parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.trim().is_empty())
            .ok_or(InsightError::MissingField("candidates"))?;

        debug!(model = %self.model, chars = text.len(), "gemini reply received");
        Ok(text)
    }
}

pub fn build_prompt(delta: &Delta) -> Result<String, InsightError> {
    let delta_json = serde_json::to_string(delta)?;
    Ok(format!(
        r#"Analyze this competitor pricing change strictly as JSON.
Provide a concise strategic insight. Limit the insight to {MAX_INSIGHT_WORDS} words maximum.
Return only a valid JSON object with this structure:
{{
  "insight": "string (max {MAX_INSIGHT_WORDS} words)",
  "classification": "Aggressive Expansion" | "Premium Repositioning" | "Stable" | "Market Penetration",
  "confidence": "number (80-95)",
  "impact": "Critical" | "High" | "Low"
}}

Delta Data:
{delta_json}"#
    ))
}
