// src/domain/classification.rs

use crate::domain::changes::Change;
use crate::domain::randomness::DisplayRandom;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Above this, a move is a headline event.
pub const CRITICAL_PERCENT: f64 = 20.0;
/// At or above this, a price move is material.
pub const SIGNIFICANT_PERCENT: f64 = 5.0;
/// Decreases beyond this are high impact.
pub const HIGH_IMPACT_DECREASE_PERCENT: f64 = 10.0;

/// Coarse strategic label for a set of changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Classification {
    Stable,
    #[serde(rename = "Aggressive Expansion")]
    AggressiveExpansion,
    #[serde(rename = "Premium Repositioning")]
    PremiumRepositioning,
    #[serde(rename = "Market Penetration")]
    MarketPenetration,
}

impl Classification {
    pub fn label(&self) -> &'static str {
        match self {
            Classification::Stable => "Stable",
            Classification::AggressiveExpansion => "Aggressive Expansion",
            Classification::PremiumRepositioning => "Premium Repositioning",
            Classification::MarketPenetration => "Market Penetration",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Stable" => Some(Classification::Stable),
            "Aggressive Expansion" => Some(Classification::AggressiveExpansion),
            "Premium Repositioning" => Some(Classification::PremiumRepositioning),
            "Market Penetration" => Some(Classification::MarketPenetration),
            _ => None,
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Impact {
    Low,
    High,
    Critical,
}

impl Impact {
    pub fn label(&self) -> &'static str {
        match self {
            Impact::Low => "Low",
            Impact::High => "High",
            Impact::Critical => "Critical",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Low" => Some(Impact::Low),
            "High" => Some(Impact::High),
            "Critical" => Some(Impact::Critical),
            _ => None,
        }
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// `confidence` is a display value in `[80, 95]`, not a probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassificationResult {
    pub classification: Classification,
    pub confidence: u8,
    pub impact: Impact,
}

/// Derives the label and impact purely from the change list.
///
/// Bands are evaluated on the largest percentage move. Increases (including
/// newly added paid tiers) read as expansion or repositioning; decrease-only
/// moves read as market penetration. Anything under 5% is stable.
pub fn calculate_classification(changes: &[Change], random: &DisplayRandom) -> ClassificationResult {
    let (classification, impact) = classify(changes);
    ClassificationResult {
        classification,
        confidence: random.confidence(),
        impact,
    }
}

fn classify(changes: &[Change]) -> (Classification, Impact) {
    if changes.is_empty() {
        return (Classification::Stable, Impact::Low);
    }

    let max_percent = changes
        .iter()
        .filter_map(Change::percent_change)
        .map(f64::abs)
        .fold(0.0, f64::max);

    let has_increase = changes.iter().any(|c| match c {
        Change::Increased { .. } => true,
        Change::Added { current_price, .. } => *current_price > 0.0,
        _ => false,
    });
    let has_decrease = changes
        .iter()
        .any(|c| matches!(c, Change::Decreased { .. }));

    if max_percent > CRITICAL_PERCENT {
        let label = if has_increase {
            Classification::AggressiveExpansion
        } else if has_decrease {
            Classification::MarketPenetration
        } else {
            Classification::Stable
        };
        return (label, Impact::Critical);
    }

    if max_percent >= SIGNIFICANT_PERCENT {
        if has_increase {
            return (Classification::PremiumRepositioning, Impact::High);
        }
        if has_decrease {
            let impact = if max_percent > HIGH_IMPACT_DECREASE_PERCENT {
                Impact::High
            } else {
                Impact::Low
            };
            return (Classification::MarketPenetration, impact);
        }
        return (Classification::Stable, Impact::High);
    }

    (Classification::Stable, Impact::Low)
}
