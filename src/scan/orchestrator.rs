// src/scan/orchestrator.rs

use crate::db::competitors::get_competitor_for_user;
use crate::db::{Database, ReportSink, SnapshotStore};
use crate::domain::changes::Delta;
use crate::domain::classification::{Classification, Impact};
use crate::domain::delta::{compute_delta, DeltaOutcome};
use crate::domain::randomness::DisplayRandom;
use crate::domain::report::Report;
use crate::errors::ServerError;
use crate::insight::{InsightGate, InsightKind};
use crate::pricing::extractor::{extract, MIN_TIERS};
use crate::pricing::urls::{candidate_urls, pricing_page_url, CandidateKind};
use crate::pricing::{PageRenderer, PageSource, Snapshot, SnapshotSource};
use crate::scan::trace::{ScanMeta, ScanTrace, Stage, StepKind};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Serialize)]
pub struct ScanResponse {
    pub is_first_run: bool,
    pub has_significant_change: bool,
    pub classification: Classification,
    pub confidence: u8,
    pub impact: Impact,
    pub insight: String,
    /// Always present; `current_pricing` mirrors the new snapshot.
    pub delta: Delta,
    pub last_scan_time: DateTime<Utc>,
    pub scan_meta: ScanMeta,
}

/// Best pricing found so far and the page it came from.
struct Retrieval {
    snapshot: Snapshot,
    pricing_url: Option<String>,
}

/// Runs fetch → extract → diff → insight → persist for one user.
///
/// Every collaborator is injected so tests can swap in fakes. Only a missing
/// competitor or a failed report write reaches the caller as an error; every
/// other failure degrades to the next fallback.
pub struct ScanService {
    db: Database,
    pages: Box<dyn PageSource>,
    renderer: Option<Box<dyn PageRenderer>>,
    snapshots: Box<dyn SnapshotStore>,
    reports: Box<dyn ReportSink>,
    insight: InsightGate,
    random: Arc<DisplayRandom>,
}

impl ScanService {
    pub fn new(
        db: Database,
        pages: Box<dyn PageSource>,
        snapshots: Box<dyn SnapshotStore>,
        reports: Box<dyn ReportSink>,
        insight: InsightGate,
    ) -> Self {
        Self {
            db,
            pages,
            renderer: None,
            snapshots,
            reports,
            insight,
            random: Arc::new(DisplayRandom::from_entropy()),
        }
    }

    pub fn with_renderer(mut self, renderer: Box<dyn PageRenderer>) -> Self {
        self.renderer = Some(renderer);
        self
    }

    pub fn with_random(mut self, random: Arc<DisplayRandom>) -> Self {
        self.random = random;
        self
    }

    pub fn db(&self) -> &Database {
        &self.db
    }

    pub fn run_scan(&self, user_id: &str) -> Result<ScanResponse, ServerError> {
        let mut trace = ScanTrace::start();
        info!(user_id, "🚀 starting scan");

        let competitor = self
            .db
            .with_conn(|conn| get_competitor_for_user(conn, user_id))?
            .ok_or_else(|| {
                info!(user_id, "❌ no competitor configured");
                ServerError::NoCompetitor
            })?;
        info!(user_id, competitor = %competitor.name, url = %competitor.url, "🎯 target resolved");
        trace.step(StepKind::Init, "Initializing scan", Some(competitor.name.clone()));

        // Fetch each candidate page until one yields enough tiers.
        trace.begin(Stage::Fetching);
        let mut found = self.fetch_candidates(&competitor.url, &mut trace);
        trace.finish(Stage::Fetching, !found.snapshot.is_empty());

        // Too little structure: hand the page to the render collaborator.
        let mut render_used = false;
        if found.snapshot.len() < MIN_TIERS {
            match &self.renderer {
                Some(renderer) => {
                    render_used = true;
                    trace.begin(Stage::Navigating);
                    let ok = self.recover_with_renderer(
                        renderer.as_ref(),
                        &competitor.url,
                        &mut found,
                        &mut trace,
                    );
                    trace.finish(Stage::Navigating, ok);
                }
                None => debug!(
                    tiers = found.snapshot.len(),
                    "render collaborator not configured, skipping"
                ),
            }
        }

        trace.begin(Stage::Extracting);
        if found.snapshot.is_empty() {
            warn!(
                user_id,
                source = SnapshotSource::Synthetic.as_str(),
                "⚠️ all retrieval paths failed, using synthetic demo pricing"
            );
            trace.step(StepKind::Fallback, "Using synthetic demo data", None);
            found.snapshot = Snapshot::synthetic(&self.random);
        }
        let snapshot = found.snapshot;
        info!(
            user_id,
            tiers = snapshot.len(),
            source = snapshot.source.as_str(),
            pricing = %snapshot.summary(),
            "📈 final pricing"
        );
        trace.step(
            StepKind::Pricing,
            format!("Final pricing: {} tiers", snapshot.len()),
            Some(snapshot.summary()),
        );
        trace.finish(Stage::Extracting, true);

        trace.begin(Stage::ComputingDelta);
        let outcome = self.diff_against_baseline(user_id, &snapshot, &mut trace);
        trace.finish(Stage::ComputingDelta, true);

        trace.begin(Stage::GeneratingInsight);
        if outcome.has_significant_change {
            trace.step(StepKind::Ai, "Generating strategic insight", None);
        }
        let insight = self.insight.evaluate(&outcome, &self.random);
        let insight_step = match insight.kind {
            InsightKind::Generated | InsightKind::Degraded => {
                format!("Classification: {}", insight.classification)
            }
            InsightKind::Baseline => "Initial baseline established".to_string(),
            InsightKind::NoChange => "No material changes".to_string(),
        };
        trace.step(
            StepKind::Insight,
            insight_step,
            Some(format!("Classification: {}", insight.classification)),
        );
        trace.finish(
            Stage::GeneratingInsight,
            insight.kind != InsightKind::Degraded,
        );

        // Report first: a failed write leaves the stored baseline untouched.
        trace.step(StepKind::Save, "Saving report", None);
        let last_scan_time = Utc::now();
        let report = Report {
            competitor_id: competitor.id,
            user_id: user_id.to_string(),
            delta: outcome.delta.clone(),
            insight: insight.insight.clone(),
            classification: insight.classification,
            confidence: insight.confidence,
            impact: insight.impact,
            data_source: snapshot.source,
            last_scan_time,
        };
        let report_id = self.reports.save(&report).map_err(|e| {
            error!(
                user_id,
                stage = "save",
                duration_ms = trace.elapsed_ms(),
                error = %e,
                "❌ scan failed"
            );
            ServerError::Pipeline {
                stage: "save",
                message: e.to_string(),
            }
        })?;

        if let Err(e) = self.snapshots.save(user_id, &snapshot) {
            warn!(user_id, error = %e, "snapshot write failed, baseline not updated");
        }
        trace.step(StepKind::Complete, "Analysis complete", None);

        info!(
            user_id,
            report_id,
            duration_ms = trace.elapsed_ms(),
            data_source = snapshot.source.as_str(),
            render_used,
            tiers = snapshot.len(),
            classification = %insight.classification,
            steps = trace.steps().len(),
            "✅ scan complete"
        );

        let scan_meta = trace.into_meta(snapshot.source, render_used, found.pricing_url, snapshot.len());
        Ok(ScanResponse {
            is_first_run: outcome.is_first_run,
            has_significant_change: outcome.has_significant_change,
            classification: insight.classification,
            confidence: insight.confidence,
            impact: insight.impact,
            insight: insight.insight,
            delta: outcome.delta,
            last_scan_time,
            scan_meta,
        })
    }

    fn fetch_candidates(&self, provided: &str, trace: &mut ScanTrace) -> Retrieval {
        let mut found = Retrieval {
            snapshot: Snapshot::empty(),
            pricing_url: None,
        };

        let candidates = candidate_urls(provided);
        for candidate in &candidates {
            match candidate.kind {
                CandidateKind::ProvidedPricing => trace.step(
                    StepKind::Detect,
                    "URL identified as pricing page",
                    Some(candidate.url.clone()),
                ),
                CandidateKind::DetectedPricing => trace.step(
                    StepKind::Detect,
                    "Auto-detected pricing page URL",
                    Some(candidate.url.clone()),
                ),
                CandidateKind::Homepage => trace.step(
                    StepKind::Fetch,
                    "Fetching homepage",
                    Some(candidate.url.clone()),
                ),
            }
        }

        for candidate in candidates {
            let label = candidate.kind.label();
            info!(url = %candidate.url, "🔄 fetching {label}");

            let html = match self.pages.fetch(&candidate.url) {
                Ok(html) => html,
                Err(e) => {
                    warn!(url = %candidate.url, error = %e, "⚠️ failed to fetch {label}");
                    trace.step(
                        StepKind::Error,
                        format!("Failed to fetch {label}"),
                        Some(e.to_string()),
                    );
                    continue;
                }
            };
            trace.step(
                StepKind::Loaded,
                "Page loaded successfully",
                Some(format!("{:.1}KB", html.len() as f64 / 1024.0)),
            );

            let parsed = extract(&html);
            info!(url = %candidate.url, tiers = parsed.len(), "📊 parsed {label}");

            if parsed.len() >= MIN_TIERS {
                trace.step(
                    StepKind::Extract,
                    format!("Extracted {} pricing tiers", parsed.len()),
                    Some(parsed.tier_names()),
                );
                found.snapshot = parsed;
                found.pricing_url = Some(candidate.url);
                break;
            } else if !parsed.is_empty() && found.snapshot.is_empty() {
                trace.step(
                    StepKind::Partial,
                    format!("Found {} tier(s), searching for more", parsed.len()),
                    None,
                );
                found.snapshot = parsed;
                found.pricing_url = Some(candidate.url);
            } else {
                trace.step(
                    StepKind::Search,
                    "No pricing found on this page, continuing search",
                    None,
                );
            }
        }

        found
    }

    /// Navigation first, then a direct render of the best pricing URL.
    /// Replaces the current result only with one holding more tiers.
    fn recover_with_renderer(
        &self,
        renderer: &dyn PageRenderer,
        provided: &str,
        found: &mut Retrieval,
        trace: &mut ScanTrace,
    ) -> bool {
        info!(
            tiers = found.snapshot.len(),
            needed = MIN_TIERS,
            "🤖 too few tiers, activating render collaborator"
        );
        trace.step(StepKind::Agent, "Activating autonomous web agent", None);
        trace.step(
            StepKind::Navigate,
            "Agent navigating to find pricing page",
            Some(provided.to_string()),
        );

        let mut improved = false;
        match renderer.navigate(provided) {
            Some(nav) => {
                trace.step(
                    StepKind::Discover,
                    "Pricing page discovered",
                    Some(nav.final_url.clone()),
                );
                let parsed = extract(&nav.html).with_source(SnapshotSource::Navigated);
                if parsed.len() > found.snapshot.len() {
                    trace.step(
                        StepKind::Extract,
                        format!("Extracted {} pricing tiers", parsed.len()),
                        Some(parsed.tier_names()),
                    );
                    found.snapshot = parsed;
                    found.pricing_url = Some(nav.final_url);
                    improved = true;
                } else {
                    trace.step(StepKind::Warn, "Pricing page found but parsing failed", None);
                }
            }
            None => trace.step(StepKind::Warn, "Agent could not locate pricing page", None),
        }

        if found.snapshot.len() >= MIN_TIERS {
            return improved;
        }

        let target = found
            .pricing_url
            .clone()
            .or_else(|| pricing_page_url(provided))
            .unwrap_or_else(|| provided.to_string());
        match renderer.render(&target) {
            Some(html) => {
                let parsed = extract(&html).with_source(SnapshotSource::Rendered);
                if parsed.len() > found.snapshot.len() {
                    trace.step(
                        StepKind::Extract,
                        format!("Extracted {} pricing tiers from rendered page", parsed.len()),
                        Some(parsed.tier_names()),
                    );
                    found.snapshot = parsed;
                    found.pricing_url = Some(target);
                    improved = true;
                }
            }
            None => trace.step(StepKind::Warn, "Rendered page unavailable", Some(target)),
        }

        improved
    }

    fn diff_against_baseline(
        &self,
        user_id: &str,
        snapshot: &Snapshot,
        trace: &mut ScanTrace,
    ) -> DeltaOutcome {
        trace.step(StepKind::Compare, "Comparing against baseline snapshot", None);

        let previous = self.snapshots.latest(user_id).unwrap_or_else(|e| {
            warn!(user_id, error = %e, "snapshot read failed, treating as first run");
            None
        });
        match &previous {
            Some(old) => trace.step(
                StepKind::Baseline,
                "Previous baseline loaded",
                Some(format!("{} tiers", old.len())),
            ),
            None => trace.step(
                StepKind::Baseline,
                "No previous baseline, establishing first snapshot",
                None,
            ),
        }

        let outcome = compute_delta(previous.as_ref(), snapshot, &self.random);
        info!(
            user_id,
            first_run = outcome.is_first_run,
            significant = outcome.has_significant_change,
            changes = outcome.delta.changes.len(),
            classification = %outcome.classification.classification,
            confidence = outcome.classification.confidence,
            impact = %outcome.classification.impact,
            "📊 delta computed"
        );

        if outcome.has_significant_change {
            trace.step(
                StepKind::Delta,
                format!(
                    "Detected {} significant change(s)",
                    outcome.delta.changes.len()
                ),
                Some("≥5% threshold".into()),
            );
        } else if outcome.is_first_run {
            trace.step(StepKind::Delta, "First run, baseline established", None);
        } else {
            trace.step(
                StepKind::Delta,
                "No significant changes detected",
                Some("<5% threshold".into()),
            );
        }

        outcome
    }
}
