// src/domain/delta.rs

use crate::domain::changes::{Change, Delta};
use crate::domain::classification::{
    calculate_classification, ClassificationResult, SIGNIFICANT_PERCENT,
};
use crate::domain::randomness::DisplayRandom;
use crate::pricing::models::Snapshot;
use serde::Serialize;
use std::collections::HashMap;

/// Everything the scan needs to know about old vs new pricing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeltaOutcome {
    pub is_first_run: bool,
    pub has_significant_change: bool,
    #[serde(flatten)]
    pub classification: ClassificationResult,
    pub delta: Delta,
}

/// Compares the stored snapshot (if any) with a freshly extracted one.
///
/// Added and removed tiers are always significant; price moves are
/// significant at 5% or more. Equal prices produce no change entry at all.
pub fn compute_delta(
    old: Option<&Snapshot>,
    new: &Snapshot,
    random: &DisplayRandom,
) -> DeltaOutcome {
    let current_pricing = new.pricing.clone();

    let Some(old) = old.filter(|snapshot| !snapshot.is_empty()) else {
        return DeltaOutcome {
            is_first_run: true,
            has_significant_change: false,
            classification: calculate_classification(&[], random),
            delta: Delta {
                changes: Vec::new(),
                current_pricing,
            },
        };
    };

    let mut remaining: HashMap<&str, f64> = HashMap::new();
    for tier in &old.pricing {
        remaining.entry(tier.tier.as_str()).or_insert(tier.price);
    }

    let mut changes = Vec::new();
    let mut significant = false;

    for tier in &new.pricing {
        match remaining.remove(tier.tier.as_str()) {
            None => {
                changes.push(Change::Added {
                    tier: tier.tier.clone(),
                    current_price: tier.price,
                });
                significant = true;
            }
            Some(old_price) if old_price == tier.price => {}
            Some(old_price) => {
                let percent_change = percent_change(old_price, tier.price);
                let change = if tier.price > old_price {
                    Change::Increased {
                        tier: tier.tier.clone(),
                        old_price,
                        current_price: tier.price,
                        percent_change,
                    }
                } else {
                    Change::Decreased {
                        tier: tier.tier.clone(),
                        old_price,
                        current_price: tier.price,
                        percent_change,
                    }
                };
                changes.push(change);
                if percent_change >= SIGNIFICANT_PERCENT {
                    significant = true;
                }
            }
        }
    }

    // Whatever is left was dropped from the page; report in old order.
    for tier in &old.pricing {
        if let Some(old_price) = remaining.remove(tier.tier.as_str()) {
            changes.push(Change::Removed {
                tier: tier.tier.clone(),
                old_price,
            });
            significant = true;
        }
    }

    DeltaOutcome {
        is_first_run: false,
        has_significant_change: !changes.is_empty() && significant,
        classification: calculate_classification(&changes, random),
        delta: Delta {
            changes,
            current_pricing,
        },
    }
}

/// `|new - old| / old * 100`. A free tier that starts charging counts as a 100% move.
pub fn percent_change(old_price: f64, current_price: f64) -> f64 {
    if old_price == 0.0 {
        return 100.0;
    }
    (current_price - old_price).abs() * 100.0 / old_price
}
