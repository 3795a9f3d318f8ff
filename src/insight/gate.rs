// src/insight/gate.rs

use crate::domain::changes::Delta;
use crate::domain::classification::{Classification, ClassificationResult, Impact};
use crate::domain::delta::DeltaOutcome;
use crate::domain::randomness::{DisplayRandom, CONFIDENCE_MIN};
use crate::errors::InsightError;
use crate::insight::parse::parse_insight;
use crate::insight::{Insight, InsightKind};
use tracing::{info, warn};

pub const BASELINE_INSIGHT: &str = "Initial baseline established.";
pub const NO_CHANGE_INSIGHT: &str = "No material changes detected.";
pub const UNCONFIGURED_INSIGHT: &str = "Insight provider not configured.";
pub const DEGRADED_INSIGHT: &str = "Error generating insight.";

/// The external language-generation collaborator. Returns the raw reply text.
pub trait InsightProvider: Send + Sync {
    fn analyze(&self, delta: &Delta) -> Result<String, InsightError>;
}

/// Decides whether a scan is worth the expensive generated insight.
///
/// Only significant deltas reach the provider. Baselines and quiet scans
/// get canned text built from the delta engine's own classification, and
/// provider failures are swallowed into a degraded result.
pub struct InsightGate {
    provider: Option<Box<dyn InsightProvider>>,
}

impl InsightGate {
    pub fn new(provider: Option<Box<dyn InsightProvider>>) -> Self {
        Self { provider }
    }

    pub fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    pub fn evaluate(&self, outcome: &DeltaOutcome, random: &DisplayRandom) -> Insight {
        if outcome.has_significant_change {
            return self.generate(&outcome.delta, random);
        }

        if outcome.is_first_run {
            info!("📌 first run, baseline established without generated insight");
            canned(BASELINE_INSIGHT, &outcome.classification, InsightKind::Baseline)
        } else {
            info!("⏭️ no significant change, skipping generated insight");
            canned(NO_CHANGE_INSIGHT, &outcome.classification, InsightKind::NoChange)
        }
    }

    fn generate(&self, delta: &Delta, random: &DisplayRandom) -> Insight {
        let Some(provider) = &self.provider else {
            warn!("insight provider missing, returning placeholder insight");
            return degraded(UNCONFIGURED_INSIGHT);
        };

        info!(changes = delta.changes.len(), "🔥 significant change, requesting insight");
        match provider
            .analyze(delta)
            .and_then(|reply| parse_insight(&reply, random))
        {
            Ok(insight) => {
                info!(
                    classification = %insight.classification,
                    confidence = insight.confidence,
                    impact = %insight.impact,
                    "insight generated"
                );
                insight
            }
            Err(e) => {
                warn!(error = %e, "insight generation failed, degrading");
                degraded(DEGRADED_INSIGHT)
            }
        }
    }
}

fn canned(text: &str, base: &ClassificationResult, kind: InsightKind) -> Insight {
    Insight {
        insight: text.to_string(),
        classification: base.classification,
        confidence: base.confidence,
        impact: base.impact,
        kind,
    }
}

fn degraded(text: &str) -> Insight {
    Insight {
        insight: text.to_string(),
        classification: Classification::Stable,
        confidence: CONFIDENCE_MIN,
        impact: Impact::Low,
        kind: InsightKind::Degraded,
    }
}
