// src/pricing/models.rs

use crate::domain::randomness::DisplayRandom;
use serde::{Deserialize, Serialize};

/// A single named plan on a pricing page, e.g. `Pro` at `79.99`.
/// Prices are currency-agnostic and never negative.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingTier {
    pub tier: String,
    pub price: f64,
}

impl PricingTier {
    pub fn new(tier: impl Into<String>, price: f64) -> Self {
        Self {
            tier: tier.into(),
            price,
        }
    }
}

/// Where the tiers of a snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SnapshotSource {
    /// Plain fetch of the page markup.
    #[default]
    Scraped,
    /// Markup produced by the alternate render collaborator.
    Rendered,
    /// Markup of a pricing page discovered by agentic navigation.
    Navigated,
    /// Placeholder demo data; never real prices.
    Synthetic,
}

impl SnapshotSource {
    pub fn as_str(&self) -> &'static str {
        match self {
            SnapshotSource::Scraped => "scraped",
            SnapshotSource::Rendered => "rendered",
            SnapshotSource::Navigated => "navigated",
            SnapshotSource::Synthetic => "synthetic",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "scraped" => Some(SnapshotSource::Scraped),
            "rendered" => Some(SnapshotSource::Rendered),
            "navigated" => Some(SnapshotSource::Navigated),
            "synthetic" => Some(SnapshotSource::Synthetic),
            _ => None,
        }
    }
}

/// The complete set of tiers observed for a competitor at one point in time.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub pricing: Vec<PricingTier>,
    #[serde(default)]
    pub source: SnapshotSource,
}

impl Snapshot {
    pub fn new(pricing: Vec<PricingTier>, source: SnapshotSource) -> Self {
        Self { pricing, source }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// Fixed three-tier demo snapshot used when every fetch and extraction path failed.
    /// The Pro price flips between two values so repeated scans still exercise the diff.
    pub fn synthetic(random: &DisplayRandom) -> Self {
        let pro = if random.coin_flip() { 89.99 } else { 79.99 };
        Self {
            pricing: vec![
                PricingTier::new("Starter", 29.99),
                PricingTier::new("Pro", pro),
                PricingTier::new("Enterprise", 199.99),
            ],
            source: SnapshotSource::Synthetic,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.pricing.is_empty()
    }

    pub fn len(&self) -> usize {
        self.pricing.len()
    }

    pub fn is_synthetic(&self) -> bool {
        self.source == SnapshotSource::Synthetic
    }

    pub fn with_source(mut self, source: SnapshotSource) -> Self {
        self.source = source;
        self
    }

    /// `Starter: $29.99, Pro: $79.99` for logs and step traces.
    pub fn summary(&self) -> String {
        self.pricing
            .iter()
            .map(|p| format!("{}: ${}", p.tier, p.price))
            .collect::<Vec<_>>()
            .join(", ")
    }

    pub fn tier_names(&self) -> String {
        self.pricing
            .iter()
            .map(|p| p.tier.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_snapshot_is_tagged_and_has_three_tiers() {
        let random = DisplayRandom::seeded(7);
        let snap = Snapshot::synthetic(&random);

        assert!(snap.is_synthetic());
        assert_eq!(snap.tier_names(), "Starter, Pro, Enterprise");
        let pro = snap.pricing[1].price;
        assert!(pro == 79.99 || pro == 89.99);
    }

    #[test]
    fn source_defaults_to_scraped_when_missing_from_json() {
        let snap: Snapshot =
            serde_json::from_str(r#"{"pricing":[{"tier":"Pro","price":10.0}]}"#).unwrap();
        assert_eq!(snap.source, SnapshotSource::Scraped);
        assert_eq!(snap.len(), 1);
    }
}
