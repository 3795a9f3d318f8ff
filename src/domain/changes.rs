// src/domain/changes.rs

use crate::pricing::models::PricingTier;
use serde::{Deserialize, Serialize};

/// One difference between two snapshots, keyed by tier name.
/// Serialized as `{"type": "increased", "tier": .., ...}` for report consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Change {
    Added {
        tier: String,
        current_price: f64,
    },
    Removed {
        tier: String,
        old_price: f64,
    },
    Increased {
        tier: String,
        old_price: f64,
        current_price: f64,
        percent_change: f64,
    },
    Decreased {
        tier: String,
        old_price: f64,
        current_price: f64,
        percent_change: f64,
    },
}

impl Change {
    pub fn tier(&self) -> &str {
        match self {
            Change::Added { tier, .. }
            | Change::Removed { tier, .. }
            | Change::Increased { tier, .. }
            | Change::Decreased { tier, .. } => tier,
        }
    }

    /// Only price moves carry a percentage.
    pub fn percent_change(&self) -> Option<f64> {
        match self {
            Change::Increased { percent_change, .. } | Change::Decreased { percent_change, .. } => {
                Some(*percent_change)
            }
            Change::Added { .. } | Change::Removed { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Change::Added { .. } => "added",
            Change::Removed { .. } => "removed",
            Change::Increased { .. } => "increased",
            Change::Decreased { .. } => "decreased",
        }
    }
}

/// Structured diff plus the tier list as it is now.
/// `current_pricing` is filled even when nothing changed.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Delta {
    pub changes: Vec<Change>,
    pub current_pricing: Vec<PricingTier>,
}
