// src/insight/parse.rs

use crate::domain::classification::{Classification, Impact};
use crate::domain::randomness::{DisplayRandom, CONFIDENCE_MAX, CONFIDENCE_MIN};
use crate::errors::InsightError;
use crate::insight::{Insight, InsightKind};
use serde_json::Value;

/// Slice from the first `{` to the last `}`, so prose or code fences around
/// the object are ignored.
pub fn extract_json_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    (end > start).then(|| &text[start..=end])
}

/// Validates a model reply field by field.
///
/// Only a missing insight text is fatal. Unknown labels fall back to
/// `Stable` / `Low`, and the confidence is clamped to the display band
/// (or drawn from it when absent).
pub fn parse_insight(text: &str, random: &DisplayRandom) -> Result<Insight, InsightError> {
    let raw = extract_json_object(text).ok_or(InsightError::NoJson)?;
    let value: Value = serde_json::from_str(raw)?;

    let insight = value
        .get("insight")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or(InsightError::MissingField("insight"))?
        .to_string();

    let classification = value
        .get("classification")
        .and_then(Value::as_str)
        .and_then(Classification::from_label)
        .unwrap_or(Classification::Stable);

    let confidence = value
        .get("confidence")
        .and_then(confidence_value)
        .map(clamp_confidence)
        .unwrap_or_else(|| random.confidence());

    let impact = value
        .get("impact")
        .and_then(Value::as_str)
        .and_then(Impact::from_label)
        .unwrap_or(Impact::Low);

    Ok(Insight {
        insight,
        classification,
        confidence,
        impact,
        kind: InsightKind::Generated,
    })
}

/// Models sometimes send `88`, `"88"` or `"88%"`.
fn confidence_value(value: &Value) -> Option<f64> {
    let n = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().trim_end_matches('%').trim().parse().ok(),
        _ => None,
    }?;
    n.is_finite().then_some(n)
}

fn clamp_confidence(n: f64) -> u8 {
    n.round()
        .clamp(f64::from(CONFIDENCE_MIN), f64::from(CONFIDENCE_MAX)) as u8
}
