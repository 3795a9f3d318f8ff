// src/db/reports.rs
use crate::db::connection::Database;
use crate::domain::classification::{Classification, Impact};
use crate::domain::report::Report;
use crate::errors::ServerError;
use crate::pricing::models::SnapshotSource;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

/// Append-only destination for finished scan reports.
pub trait ReportSink: Send + Sync {
    /// Returns the new report's id.
    fn save(&self, report: &Report) -> Result<i64, ServerError>;
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoredReport {
    pub id: i64,
    #[serde(flatten)]
    pub report: Report,
}

pub struct SqliteReportSink {
    db: Database,
}

impl SqliteReportSink {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl ReportSink for SqliteReportSink {
    fn save(&self, report: &Report) -> Result<i64, ServerError> {
        self.db.with_conn(|conn| insert_report(conn, report))
    }
}

pub fn insert_report(conn: &Connection, report: &Report) -> Result<i64, ServerError> {
    let delta_json =
        serde_json::to_string(&report.delta).map_err(|e| ServerError::DbError(e.to_string()))?;

    conn.execute(
        "INSERT INTO reports (competitor_id, user_id, delta_json, insight, classification,
                              confidence, impact, data_source, last_scan_time)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            report.competitor_id,
            report.user_id,
            delta_json,
            report.insight,
            report.classification.label(),
            report.confidence,
            report.impact.label(),
            report.data_source.as_str(),
            report.last_scan_time,
        ],
    )
    .map_err(|e| ServerError::DbError(e.to_string()))?;

    Ok(conn.last_insert_rowid())
}

pub fn get_latest_report(
    conn: &Connection,
    user_id: &str,
) -> Result<Option<StoredReport>, ServerError> {
    let row = conn
        .query_row(
            "SELECT id, competitor_id, user_id, delta_json, insight, classification,
                    confidence, impact, data_source, last_scan_time
             FROM reports WHERE user_id = ?1
             ORDER BY last_scan_time DESC, id DESC LIMIT 1",
            params![user_id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, u8>(6)?,
                    row.get::<_, String>(7)?,
                    row.get::<_, String>(8)?,
                    row.get::<_, DateTime<Utc>>(9)?,
                ))
            },
        )
        .optional()
        .map_err(|e| ServerError::DbError(e.to_string()))?;

    let Some((id, competitor_id, user_id, delta_json, insight, class, confidence, impact, source, at)) =
        row
    else {
        return Ok(None);
    };

    let corrupt = |field: &str| ServerError::DbError(format!("report {id}: bad {field}"));
    let report = Report {
        competitor_id,
        user_id,
        delta: serde_json::from_str(&delta_json).map_err(|_| corrupt("delta_json"))?,
        insight,
        classification: Classification::from_label(&class).ok_or_else(|| corrupt("classification"))?,
        confidence,
        impact: Impact::from_label(&impact).ok_or_else(|| corrupt("impact"))?,
        data_source: SnapshotSource::from_name(&source).ok_or_else(|| corrupt("data_source"))?,
        last_scan_time: at,
    };

    Ok(Some(StoredReport { id, report }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::changes::{Change, Delta};
    use chrono::Duration;

    fn conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(include_str!("../../sql/schema.sql"))
            .unwrap();
        conn
    }

    fn report(insight: &str, minutes_ago: i64) -> Report {
        Report {
            competitor_id: 1,
            user_id: "u1".into(),
            delta: Delta {
                changes: vec![Change::Removed {
                    tier: "Basic".into(),
                    old_price: 9.0,
                }],
                current_pricing: Vec::new(),
            },
            insight: insight.into(),
            classification: Classification::MarketPenetration,
            confidence: 87,
            impact: Impact::High,
            data_source: SnapshotSource::Synthetic,
            last_scan_time: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn latest_report_round_trips_labels() {
        let conn = conn();
        insert_report(&conn, &report("older", 10)).unwrap();
        let id = insert_report(&conn, &report("newer", 1)).unwrap();

        let stored = get_latest_report(&conn, "u1").unwrap().unwrap();
        assert_eq!(stored.id, id);
        assert_eq!(stored.report.insight, "newer");
        assert_eq!(stored.report.classification, Classification::MarketPenetration);
        assert_eq!(stored.report.data_source, SnapshotSource::Synthetic);
        assert_eq!(stored.report.delta.changes.len(), 1);
    }

    #[test]
    fn no_report_for_unknown_user() {
        assert!(get_latest_report(&conn(), "nobody").unwrap().is_none());
    }
}
