#![cfg(feature = "sqlite")]

use crate::storage_traits::{validate_key, LedgerStore, VersionedValue};
use anyhow::Context;
use medlab_core::error::StorageError;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqliteConnection, SqlitePool, SqlitePoolOptions},
    Row,
};
use std::{
    path::{Path, PathBuf},
    str::FromStr,
    sync::Arc,
};
use tokio::runtime::Runtime;

/// SQL query constants to avoid repetition
mod sql {
    pub const CREATE_STATE_TABLE: &str = r#"
        CREATE TABLE IF NOT EXISTS ledger_state (
            key TEXT PRIMARY KEY,
            value BLOB NOT NULL,
            version INTEGER NOT NULL,
            updated_at INTEGER NOT NULL
        )
    "#;

    pub const GET_STATE: &str = r#"
        SELECT value, version FROM ledger_state WHERE key = ?
    "#;

    pub const GET_VERSION: &str = r#"
        SELECT version FROM ledger_state WHERE key = ?
    "#;

    pub const UPSERT_STATE: &str = r#"
        INSERT INTO ledger_state (key, value, version, updated_at)
        VALUES (?, ?, 1, ?)
        ON CONFLICT(key) DO UPDATE SET
            value = excluded.value,
            version = ledger_state.version + 1,
            updated_at = excluded.updated_at
    "#;

    pub const INSERT_IF_ABSENT: &str = r#"
        INSERT INTO ledger_state (key, value, version, updated_at)
        VALUES (?, ?, 1, ?)
        ON CONFLICT(key) DO NOTHING
    "#;

    pub const UPDATE_IF_VERSION: &str = r#"
        UPDATE ledger_state
        SET value = ?, version = version + 1, updated_at = ?
        WHERE key = ? AND version = ?
    "#;

    pub const LIST_KEYS: &str = r#"
        SELECT key FROM ledger_state ORDER BY key
    "#;
}

/// A SQLite-based implementation of the LedgerStore interface using sqlx.
pub struct SqliteLedgerStore {
    pool: SqlitePool,
    rt: Arc<Runtime>,
    db_path: PathBuf,
}

impl SqliteLedgerStore {
    /// Creates a new SQLite ledger store, creating the database file if needed
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StorageError> {
        let db_path = path.as_ref().to_path_buf();
        let db_url = format!("sqlite:{}", db_path.to_string_lossy());

        // Create a runtime for async operations
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map(Arc::new)?;

        let options = SqliteConnectOptions::from_str(&db_url)
            .with_context(|| format!("Invalid database URL: {}", db_url))?
            .create_if_missing(true);

        let pool = rt
            .block_on(async {
                SqlitePoolOptions::new()
                    .max_connections(5)
                    .connect_with(options)
                    .await
            })
            .with_context(|| format!("Failed to connect to database at {:?}", db_path))?;

        rt.block_on(Self::initialize_schema(&pool))
            .with_context(|| "Failed to initialize database schema")?;

        log::debug!("Opened SQLite ledger store at {:?}", db_path);

        Ok(Self { pool, rt, db_path })
    }

    /// Creates the state table if it does not exist
    async fn initialize_schema(pool: &SqlitePool) -> Result<(), sqlx::Error> {
        sqlx::query(sql::CREATE_STATE_TABLE).execute(pool).await?;
        Ok(())
    }

    /// Path of the backing database file
    pub fn path(&self) -> &Path {
        &self.db_path
    }

    async fn current_version(
        conn: &mut SqliteConnection,
        key: &str,
    ) -> Result<Option<u64>, StorageError> {
        let row = sqlx::query(sql::GET_VERSION)
            .bind(key)
            .fetch_optional(&mut *conn)
            .await
            .with_context(|| format!("Failed to read version of key: {}", key))?;
        Ok(row.map(|row| row.get::<i64, _>(0) as u64))
    }
}

impl LedgerStore for SqliteLedgerStore {
    fn get_versioned(&self, key: &str) -> Result<Option<VersionedValue>, StorageError> {
        validate_key(key)?;
        self.rt.block_on(async {
            let row = sqlx::query(sql::GET_STATE)
                .bind(key)
                .fetch_optional(&self.pool)
                .await
                .with_context(|| format!("Failed to fetch key: {}", key))?;

            Ok(row.map(|row| {
                let value: Vec<u8> = row.get(0);
                let version: i64 = row.get(1);
                VersionedValue::new(value, version as u64)
            }))
        })
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<u64, StorageError> {
        validate_key(key)?;
        self.rt.block_on(async {
            // Use a transaction so the returned version belongs to this write
            let mut tx = self
                .pool
                .begin()
                .await
                .with_context(|| "Failed to start database transaction")?;

            sqlx::query(sql::UPSERT_STATE)
                .bind(key)
                .bind(value)
                .bind(chrono::Utc::now().timestamp())
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to store key: {}", key))?;

            let version: i64 = sqlx::query(sql::GET_VERSION)
                .bind(key)
                .fetch_one(&mut *tx)
                .await
                .with_context(|| format!("Failed to read back version of key: {}", key))?
                .get(0);

            tx.commit()
                .await
                .with_context(|| "Failed to commit transaction")?;

            Ok(version as u64)
        })
    }

    fn put_if_version(
        &self,
        key: &str,
        value: &[u8],
        expected: Option<u64>,
    ) -> Result<u64, StorageError> {
        validate_key(key)?;
        self.rt.block_on(async {
            let mut tx = self
                .pool
                .begin()
                .await
                .with_context(|| "Failed to begin transaction")?;

            let now = chrono::Utc::now().timestamp();
            let result = match expected {
                None => sqlx::query(sql::INSERT_IF_ABSENT)
                    .bind(key)
                    .bind(value)
                    .bind(now)
                    .execute(&mut *tx)
                    .await,
                Some(version) => sqlx::query(sql::UPDATE_IF_VERSION)
                    .bind(value)
                    .bind(now)
                    .bind(key)
                    .bind(version as i64)
                    .execute(&mut *tx)
                    .await,
            }
            .with_context(|| format!("Failed to conditionally store key: {}", key))?;

            if result.rows_affected() != 1 {
                let actual = Self::current_version(&mut *tx, key).await?;
                tx.rollback()
                    .await
                    .with_context(|| "Failed to roll back transaction")?;
                return Err(StorageError::VersionConflict {
                    key: key.to_string(),
                    expected,
                    actual,
                });
            }

            tx.commit()
                .await
                .with_context(|| "Failed to commit transaction")?;

            Ok(expected.map_or(1, |version| version + 1))
        })
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        self.rt.block_on(async {
            let rows = sqlx::query(sql::LIST_KEYS)
                .fetch_all(&self.pool)
                .await
                .with_context(|| "Failed to list keys")?;
            Ok(rows.iter().map(|row| row.get::<String, _>(0)).collect())
        })
    }
}

impl std::fmt::Debug for SqliteLedgerStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SqliteLedgerStore")
            .field("db_path", &self.db_path)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_basic_storage_operations() {
        // Create temporary directory for test database
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("ledger.db");

        let store = SqliteLedgerStore::new(&db_path).unwrap();

        assert_eq!(store.put("CON1", br#"{"container_id":"CON1"}"#).unwrap(), 1);
        assert_eq!(store.get("CON1").unwrap(), br#"{"container_id":"CON1"}"#.to_vec());

        assert_eq!(store.put("CON1", b"{}").unwrap(), 2);
        let versioned = store.get_versioned("CON1").unwrap().unwrap();
        assert_eq!(versioned, VersionedValue::new(b"{}".to_vec(), 2));
    }

    #[test]
    fn test_missing_key_is_not_found() {
        let temp_dir = tempdir().unwrap();
        let store = SqliteLedgerStore::new(temp_dir.path().join("missing.db")).unwrap();

        assert!(matches!(store.get("NOPE"), Err(StorageError::NotFound(_))));
        assert!(!store.contains("NOPE").unwrap());
        assert!(matches!(store.get(""), Err(StorageError::InvalidKey(_))));
    }

    #[test]
    fn test_conditional_writes() {
        let temp_dir = tempdir().unwrap();
        let store = SqliteLedgerStore::new(temp_dir.path().join("fenced.db")).unwrap();

        assert_eq!(store.put_if_version("ContainerOwner", b"a", None).unwrap(), 1);

        let err = store.put_if_version("ContainerOwner", b"b", None).unwrap_err();
        assert!(matches!(
            err,
            StorageError::VersionConflict { expected: None, actual: Some(1), .. }
        ));

        assert_eq!(store.put_if_version("ContainerOwner", b"b", Some(1)).unwrap(), 2);

        let err = store.put_if_version("ContainerOwner", b"c", Some(1)).unwrap_err();
        assert!(matches!(
            err,
            StorageError::VersionConflict { expected: Some(1), actual: Some(2), .. }
        ));
        assert_eq!(store.get("ContainerOwner").unwrap(), b"b".to_vec());
    }

    #[test]
    fn test_rejected_write_releases_transaction() {
        let temp_dir = tempdir().unwrap();
        let store = SqliteLedgerStore::new(temp_dir.path().join("rollback.db")).unwrap();

        store.put("UniqueIDCounter", b"v1").unwrap();
        for _ in 0..3 {
            assert!(store
                .put_if_version("UniqueIDCounter", b"stale", Some(7))
                .unwrap_err()
                .is_conflict());
        }
        assert!(matches!(
            store.put_if_version("CON9", b"x", Some(1)),
            Err(StorageError::VersionConflict { actual: None, .. })
        ));

        assert_eq!(store.put_if_version("UniqueIDCounter", b"v2", Some(1)).unwrap(), 2);
        assert_eq!(store.put("UniqueIDCounter", b"v3").unwrap(), 3);
        assert!(!store.contains("CON9").unwrap());
    }

    #[test]
    fn test_state_survives_reopen() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("reopen.db");

        {
            let store = SqliteLedgerStore::new(&db_path).unwrap();
            store.put("UniqueIDCounter", br#"{"ContainerMaxID":2,"PalletMaxID":6}"#).unwrap();
            store.put("CON1", b"{}").unwrap();
        }

        let store = SqliteLedgerStore::new(&db_path).unwrap();
        assert_eq!(store.keys().unwrap(), vec!["CON1", "UniqueIDCounter"]);
        assert_eq!(
            store.get("UniqueIDCounter").unwrap(),
            br#"{"ContainerMaxID":2,"PalletMaxID":6}"#.to_vec()
        );
    }
}
