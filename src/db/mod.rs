pub mod competitors;
pub mod connection;
pub mod reports;
pub mod snapshots;

pub use connection::{init_db, Database};
pub use reports::{ReportSink, SqliteReportSink};
pub use snapshots::{FallbackSnapshotStore, MemorySnapshotStore, SnapshotStore, SqliteSnapshotStore};
