pub mod gate;
pub mod gemini;
pub mod parse;

use crate::domain::classification::{Classification, Impact};
use serde::Serialize;

pub use gate::{InsightGate, InsightProvider};
pub use gemini::GeminiClient;

/// How an insight came to be; lets callers and logs tell a real
/// generated analysis from canned text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum InsightKind {
    Generated,
    Baseline,
    NoChange,
    Degraded,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Insight {
    pub insight: String,
    pub classification: Classification,
    pub confidence: u8,
    pub impact: Impact,
    pub kind: InsightKind,
}
