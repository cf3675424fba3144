//! SQLite store backend for persistent storage.

use super::{ComparisonRecord, MethodStats, RecordStore};
use crate::core::identity::ImageIdentity;
use crate::core::strategy::Method;
use crate::error::StoreError;
use rusqlite::{params, Connection, ErrorCode};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::Mutex;

/// SQLite-backed persistent store
///
/// Uses WAL (Write-Ahead Logging) mode so readers can proceed while a
/// write is in flight. The UNIQUE constraint on the ordered triple is
/// what resolves concurrent duplicate computations: the loser's insert
/// fails with [`StoreError::DuplicateRecord`].
pub struct SqliteStore {
    conn: Mutex<Connection>,
    db_path: PathBuf,
}

impl SqliteStore {
    /// Open or create a store database at the given path
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StoreError::OpenFailed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        }

        let conn = Connection::open(path).map_err(|e| StoreError::OpenFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        // WAL lets readers proceed while a write is in flight; the busy
        // timeout makes a losing concurrent insert surface as a
        // constraint violation instead of SQLITE_BUSY
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA busy_timeout=5000;")
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS comparisons (
                id INTEGER PRIMARY KEY,
                image1_identity TEXT NOT NULL,
                image2_identity TEXT NOT NULL,
                method TEXT NOT NULL,
                score REAL NOT NULL,
                created_at INTEGER NOT NULL,
                UNIQUE(image1_identity, image2_identity, method)
            )",
            [],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_method ON comparisons(method)",
            [],
        )
        .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(Self {
            conn: Mutex::new(conn),
            db_path: path.to_path_buf(),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn.lock().map_err(|_| StoreError::LockPoisoned)
    }

    fn is_unique_violation(error: &rusqlite::Error) -> bool {
        matches!(
            error.sqlite_error_code(),
            Some(ErrorCode::ConstraintViolation)
        )
    }
}

impl RecordStore for SqliteStore {
    fn lookup(
        &self,
        identity1: &ImageIdentity,
        identity2: &ImageIdentity,
        method: Method,
    ) -> Result<Option<f64>, StoreError> {
        let conn = self.lock()?;

        let result: Result<f64, _> = conn.query_row(
            "SELECT score FROM comparisons
             WHERE image1_identity = ? AND image2_identity = ? AND method = ?",
            params![identity1.to_hex(), identity2.to_hex(), method.as_token()],
            |row| row.get(0),
        );

        match result {
            Ok(score) => Ok(Some(score)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(StoreError::QueryFailed(e.to_string())),
        }
    }

    fn insert(&self, record: ComparisonRecord) -> Result<(), StoreError> {
        let conn = self.lock()?;

        let result = conn.execute(
            "INSERT INTO comparisons
             (image1_identity, image2_identity, method, score, created_at)
             VALUES (?, ?, ?, ?, ?)",
            params![
                record.identity1.to_hex(),
                record.identity2.to_hex(),
                record.method.as_token(),
                record.score,
                record.created_at.timestamp(),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) if Self::is_unique_violation(&e) => Err(StoreError::DuplicateRecord {
                identity1: record.identity1.to_hex(),
                identity2: record.identity2.to_hex(),
                method: record.method.to_string(),
            }),
            Err(e) => Err(StoreError::QueryFailed(e.to_string())),
        }
    }

    fn stats(&self) -> Result<Vec<MethodStats>, StoreError> {
        let conn = self.lock()?;

        let mut stmt = conn
            .prepare(
                "SELECT method, COUNT(*), MIN(score), MAX(score), AVG(score)
                 FROM comparisons GROUP BY method ORDER BY method",
            )
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, f64>(2)?,
                    row.get::<_, f64>(3)?,
                    row.get::<_, f64>(4)?,
                ))
            })
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        let mut stats = Vec::new();
        for row in rows {
            let (token, count, min, max, mean) =
                row.map_err(|e| StoreError::QueryFailed(e.to_string()))?;
            // Unknown tokens cannot be written by this crate; skip any
            // foreign rows rather than failing the whole aggregation
            if let Ok(method) = Method::from_str(&token) {
                stats.push(MethodStats {
                    method,
                    count: count as u64,
                    min,
                    max,
                    mean,
                });
            }
        }

        Ok(stats)
    }

    fn count(&self) -> Result<u64, StoreError> {
        let conn = self.lock()?;

        conn.query_row("SELECT COUNT(*) FROM comparisons", [], |row| {
            row.get::<_, i64>(0).map(|v| v as u64)
        })
        .map_err(|e| StoreError::QueryFailed(e.to_string()))
    }

    fn clear(&self) -> Result<(), StoreError> {
        let conn = self.lock()?;

        conn.execute("DELETE FROM comparisons", [])
            .map_err(|e| StoreError::QueryFailed(e.to_string()))?;

        Ok(())
    }
}

impl std::fmt::Debug for SqliteStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::identity::identity;
    use tempfile::TempDir;

    fn record(loc1: &str, loc2: &str, method: Method, score: f64) -> ComparisonRecord {
        ComparisonRecord::new(identity(loc1), identity(loc2), method, score)
    }

    #[test]
    fn sqlite_store_creates_database() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("comparisons.db");

        let store = SqliteStore::open(&db_path).unwrap();

        assert!(db_path.exists());
        assert_eq!(store.count().unwrap(), 0);
    }

    #[test]
    fn stores_and_retrieves_by_ordered_triple() {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&temp_dir.path().join("c.db")).unwrap();

        store
            .insert(record("a.jpg", "b.jpg", Method::Histogram, 0.75))
            .unwrap();

        let hit = store
            .lookup(&identity("a.jpg"), &identity("b.jpg"), Method::Histogram)
            .unwrap();
        assert_eq!(hit, Some(0.75));

        // Reversed pair is a distinct key
        let reversed = store
            .lookup(&identity("b.jpg"), &identity("a.jpg"), Method::Histogram)
            .unwrap();
        assert_eq!(reversed, None);

        // Different method is a distinct key
        let other_method = store
            .lookup(&identity("a.jpg"), &identity("b.jpg"), Method::Perceptual)
            .unwrap();
        assert_eq!(other_method, None);
    }

    #[test]
    fn duplicate_insert_is_reported() {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&temp_dir.path().join("c.db")).unwrap();

        store
            .insert(record("a.jpg", "b.jpg", Method::Keypoint, 0.5))
            .unwrap();
        let second = store.insert(record("a.jpg", "b.jpg", Method::Keypoint, 0.5));

        assert!(matches!(second, Err(StoreError::DuplicateRecord { .. })));
        assert_eq!(store.count().unwrap(), 1);
    }

    #[test]
    fn stats_aggregate_per_method() {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&temp_dir.path().join("c.db")).unwrap();

        store
            .insert(record("a.jpg", "b.jpg", Method::Histogram, 0.2))
            .unwrap();
        store
            .insert(record("a.jpg", "c.jpg", Method::Histogram, 0.8))
            .unwrap();
        store
            .insert(record("a.jpg", "b.jpg", Method::Perceptual, 1.0))
            .unwrap();

        let stats = store.stats().unwrap();

        let hist = stats
            .iter()
            .find(|s| s.method == Method::Histogram)
            .unwrap();
        assert_eq!(hist.count, 2);
        assert_eq!(hist.min, 0.2);
        assert_eq!(hist.max, 0.8);
        assert!((hist.mean - 0.5).abs() < 1e-9);

        let phash = stats
            .iter()
            .find(|s| s.method == Method::Perceptual)
            .unwrap();
        assert_eq!(phash.count, 1);
    }

    #[test]
    fn clear_removes_all_records() {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::open(&temp_dir.path().join("c.db")).unwrap();

        store
            .insert(record("a.jpg", "b.jpg", Method::Histogram, 0.5))
            .unwrap();
        store.clear().unwrap();

        assert_eq!(store.count().unwrap(), 0);
        assert!(store.stats().unwrap().is_empty());
    }

    #[test]
    fn store_persists_across_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let db_path = temp_dir.path().join("c.db");

        {
            let store = SqliteStore::open(&db_path).unwrap();
            store
                .insert(record("a.jpg", "b.jpg", Method::Perceptual, 0.9))
                .unwrap();
        }

        let reopened = SqliteStore::open(&db_path).unwrap();
        let hit = reopened
            .lookup(&identity("a.jpg"), &identity("b.jpg"), Method::Perceptual)
            .unwrap();

        assert_eq!(hit, Some(0.9));
    }
}
