// src/domain/report.rs

use crate::domain::changes::Delta;
use crate::domain::classification::{Classification, Impact};
use crate::pricing::models::SnapshotSource;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// The persisted, user-facing result of one scan. Written once, never updated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub competitor_id: i64,
    pub user_id: String,
    pub delta: Delta,
    pub insight: String,
    pub classification: Classification,
    pub confidence: u8,
    pub impact: Impact,
    // Lets readers tell placeholder pricing apart from scraped pricing.
    pub data_source: SnapshotSource,
    pub last_scan_time: DateTime<Utc>,
}
