// src/db/snapshots.rs
use crate::db::connection::Database;
use crate::errors::ServerError;
use crate::pricing::models::Snapshot;
use chrono::Utc;
use rusqlite::{params, OptionalExtension};
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::warn;

/// Holds exactly one latest snapshot per user.
pub trait SnapshotStore: Send + Sync {
    fn latest(&self, user_id: &str) -> Result<Option<Snapshot>, ServerError>;
    fn save(&self, user_id: &str, snapshot: &Snapshot) -> Result<(), ServerError>;
}

pub struct SqliteSnapshotStore {
    db: Database,
}

impl SqliteSnapshotStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

impl SnapshotStore for SqliteSnapshotStore {
    fn latest(&self, user_id: &str) -> Result<Option<Snapshot>, ServerError> {
        let json: Option<String> = self.db.with_conn(|conn| {
            conn.query_row(
                "SELECT snapshot_json FROM snapshots WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|e| ServerError::DbError(e.to_string()))
        })?;

        json.map(|j| serde_json::from_str(&j))
            .transpose()
            .map_err(|e| ServerError::DbError(format!("Corrupt snapshot for {user_id}: {e}")))
    }

    fn save(&self, user_id: &str, snapshot: &Snapshot) -> Result<(), ServerError> {
        let json = serde_json::to_string(snapshot)
            .map_err(|e| ServerError::DbError(e.to_string()))?;

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO snapshots (user_id, snapshot_json, source, updated_at)
                 VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(user_id) DO UPDATE SET
                     snapshot_json = excluded.snapshot_json,
                     source = excluded.source,
                     updated_at = excluded.updated_at",
                params![user_id, json, snapshot.source.as_str(), Utc::now()],
            )
            .map_err(|e| ServerError::DbError(e.to_string()))?;
            Ok(())
        })
    }
}

/// Process-local store. Lost on restart.
#[derive(Default)]
pub struct MemorySnapshotStore {
    inner: Mutex<HashMap<String, Snapshot>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn latest(&self, user_id: &str) -> Result<Option<Snapshot>, ServerError> {
        let map = self.inner.lock().map_err(|_| ServerError::InternalError)?;
        Ok(map.get(user_id).cloned())
    }

    fn save(&self, user_id: &str, snapshot: &Snapshot) -> Result<(), ServerError> {
        let mut map = self.inner.lock().map_err(|_| ServerError::InternalError)?;
        map.insert(user_id.to_string(), snapshot.clone());
        Ok(())
    }
}

/// Mirrors every write into process memory and serves reads from that
/// mirror when the primary store fails.
pub struct FallbackSnapshotStore<S> {
    primary: S,
    memory: MemorySnapshotStore,
}

impl<S: SnapshotStore> FallbackSnapshotStore<S> {
    pub fn new(primary: S) -> Self {
        Self {
            primary,
            memory: MemorySnapshotStore::new(),
        }
    }
}

impl<S: SnapshotStore> SnapshotStore for FallbackSnapshotStore<S> {
    fn latest(&self, user_id: &str) -> Result<Option<Snapshot>, ServerError> {
        match self.primary.latest(user_id) {
            Ok(found) => Ok(found),
            Err(e) => {
                warn!(user_id, error = %e, "snapshot read failed, using in-memory copy");
                self.memory.latest(user_id)
            }
        }
    }

    fn save(&self, user_id: &str, snapshot: &Snapshot) -> Result<(), ServerError> {
        self.memory.save(user_id, snapshot)?;
        self.primary.save(user_id, snapshot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pricing::models::{PricingTier, SnapshotSource};

    struct BrokenStore;

    impl SnapshotStore for BrokenStore {
        fn latest(&self, _user_id: &str) -> Result<Option<Snapshot>, ServerError> {
            Err(ServerError::DbError("down".into()))
        }
        fn save(&self, _user_id: &str, _snapshot: &Snapshot) -> Result<(), ServerError> {
            Err(ServerError::DbError("down".into()))
        }
    }

    fn snapshot() -> Snapshot {
        Snapshot::new(
            vec![PricingTier::new("Pro", 49.0)],
            SnapshotSource::Rendered,
        )
    }

    #[test]
    fn memory_store_keeps_latest_only() {
        let store = MemorySnapshotStore::new();
        assert!(store.latest("u1").unwrap().is_none());

        store.save("u1", &Snapshot::empty()).unwrap();
        store.save("u1", &snapshot()).unwrap();
        assert_eq!(store.latest("u1").unwrap(), Some(snapshot()));
        assert!(store.latest("u2").unwrap().is_none());
    }

    #[test]
    fn fallback_serves_mirror_when_primary_fails() {
        let store = FallbackSnapshotStore::new(BrokenStore);
        assert!(store.save("u1", &snapshot()).is_err());
        assert_eq!(store.latest("u1").unwrap(), Some(snapshot()));
    }
}
