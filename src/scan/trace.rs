// src/scan/trace.rs

use crate::pricing::models::SnapshotSource;
use serde::Serialize;
use std::time::Instant;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Fetching,
    Navigating,
    Extracting,
    ComputingDelta,
    GeneratingInsight,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StageStatus {
    Pending,
    Active,
    Complete,
    Error,
    Skipped,
}

#[derive(Debug, Clone, Serialize)]
pub struct StageRecord {
    pub stage: Stage,
    pub status: StageStatus,
    pub elapsed_ms: Option<u64>,
    #[serde(skip)]
    started: Option<Instant>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Init,
    Detect,
    Fetch,
    Loaded,
    Extract,
    Partial,
    Search,
    Error,
    Agent,
    Navigate,
    Discover,
    Warn,
    Fallback,
    Pricing,
    Compare,
    Baseline,
    Delta,
    Ai,
    Insight,
    Save,
    Complete,
}

/// One entry of the human-readable decision trace.
#[derive(Debug, Clone, Serialize)]
pub struct Step {
    #[serde(rename = "type")]
    pub kind: StepKind,
    pub message: String,
    pub detail: Option<String>,
    /// Milliseconds since the scan started.
    pub elapsed_ms: u64,
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanMeta {
    pub data_source: SnapshotSource,
    pub render_used: bool,
    pub pricing_page_url: Option<String>,
    pub tiers_found: usize,
    pub duration_ms: u64,
    pub stages: Vec<StageRecord>,
    pub steps: Vec<Step>,
}

/// Collects stage timings and steps while a scan runs.
pub struct ScanTrace {
    started: Instant,
    stages: Vec<StageRecord>,
    steps: Vec<Step>,
}

impl ScanTrace {
    pub fn start() -> Self {
        let record = |stage, status| StageRecord {
            stage,
            status,
            elapsed_ms: None,
            started: None,
        };
        Self {
            started: Instant::now(),
            stages: vec![
                record(Stage::Fetching, StageStatus::Pending),
                record(Stage::Navigating, StageStatus::Skipped),
                record(Stage::Extracting, StageStatus::Pending),
                record(Stage::ComputingDelta, StageStatus::Pending),
                record(Stage::GeneratingInsight, StageStatus::Pending),
            ],
            steps: Vec::new(),
        }
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.started.elapsed().as_millis() as u64
    }

    pub fn begin(&mut self, stage: Stage) {
        if let Some(record) = self.record_mut(stage) {
            record.status = StageStatus::Active;
            record.started = Some(Instant::now());
        }
    }

    pub fn finish(&mut self, stage: Stage, ok: bool) {
        if let Some(record) = self.record_mut(stage) {
            record.status = if ok {
                StageStatus::Complete
            } else {
                StageStatus::Error
            };
            record.elapsed_ms = record.started.map(|s| s.elapsed().as_millis() as u64);
        }
    }

    pub fn status(&self, stage: Stage) -> Option<StageStatus> {
        self.stages
            .iter()
            .find(|r| r.stage == stage)
            .map(|r| r.status)
    }

    pub fn step(&mut self, kind: StepKind, message: impl Into<String>, detail: Option<String>) {
        let message = message.into();
        debug!(step = ?kind, detail = detail.as_deref().unwrap_or(""), "{message}");
        self.steps.push(Step {
            kind,
            message,
            detail,
            elapsed_ms: self.elapsed_ms(),
        });
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    pub fn into_meta(
        self,
        data_source: SnapshotSource,
        render_used: bool,
        pricing_page_url: Option<String>,
        tiers_found: usize,
    ) -> ScanMeta {
        ScanMeta {
            data_source,
            render_used,
            pricing_page_url,
            tiers_found,
            duration_ms: self.elapsed_ms(),
            stages: self.stages,
            steps: self.steps,
        }
    }

    fn record_mut(&mut self, stage: Stage) -> Option<&mut StageRecord> {
        self.stages.iter_mut().find(|r| r.stage == stage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_is_skipped_unless_started() {
        let mut trace = ScanTrace::start();
        trace.begin(Stage::Fetching);
        trace.finish(Stage::Fetching, false);

        assert_eq!(trace.status(Stage::Fetching), Some(StageStatus::Error));
        assert_eq!(trace.status(Stage::Navigating), Some(StageStatus::Skipped));
        assert_eq!(trace.status(Stage::Extracting), Some(StageStatus::Pending));
    }

    #[test]
    fn meta_serializes_steps_with_type_tag() {
        let mut trace = ScanTrace::start();
        trace.step(StepKind::Init, "Initializing scan", Some("Acme".into()));
        trace.begin(Stage::Extracting);
        trace.finish(Stage::Extracting, true);

        let meta = trace.into_meta(SnapshotSource::Synthetic, false, None, 3);
        let json = serde_json::to_value(&meta).unwrap();

        assert_eq!(json["data_source"], "synthetic");
        assert_eq!(json["steps"][0]["type"], "init");
        assert_eq!(json["steps"][0]["detail"], "Acme");
        assert_eq!(json["stages"][2]["stage"], "extracting");
        assert_eq!(json["stages"][2]["status"], "complete");
        assert!(json["stages"][2]["elapsed_ms"].is_u64());
        assert!(json["stages"][0]["elapsed_ms"].is_null());
    }
}
