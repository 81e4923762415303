//! SQLite-backed run registry.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, ErrorCode, OptionalExtension};
use thiserror::Error;
use tracing::{debug, warn};

/// Sentinel process id stored between `push` and `update_pid`, while the
/// external process has not been spawned yet.
pub const PID_NONE: i64 = -99;

/// Default table name for the run registry.
pub const DEFAULT_REGISTRY_TABLE: &str = "runs";

/// Errors from registry operations.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A row with this request id already exists.
    #[error("request '{request_id}' is already registered")]
    Duplicate { request_id: String },

    /// No row with this request id exists.
    #[error("request '{request_id}' not found in registry")]
    NotFound { request_id: String },

    /// No metadata row with this request id exists.
    #[error("no metadata stored for request '{request_id}'")]
    MetadataNotFound { request_id: String },

    /// Table name is not a plain identifier.
    #[error("invalid registry table name: '{0}'")]
    InvalidTableName(String),

    /// Underlying SQLite failure.
    #[error("registry storage error: {0}")]
    Storage(#[from] rusqlite::Error),

    /// Failed to create the registry's parent directory.
    #[error("failed to create registry directory: {0}")]
    Directory(#[from] std::io::Error),
}

/// One row of the run registry.
#[derive(Debug, Clone, PartialEq)]
pub struct RunRecord {
    /// Caller-supplied unique request identifier.
    pub request_id: String,
    /// Process id of the spawned trainer, or [`PID_NONE`] before spawn.
    pub process_id: i64,
    /// Wall-clock timestamp (seconds) of insertion or last pid update.
    pub created_at: f64,
    /// Opaque caller-owned metadata blob.
    pub metadata: String,
}

/// Durable CRUD over [`RunRecord`] keyed by request id.
///
/// Every operation is a single SQLite statement, so per-key mutations are
/// serialized by the connection without explicit transactions. The
/// connection lives behind a mutex; operations are short (sub-millisecond)
/// and never held across an await point.
pub struct RunRegistry {
    conn: Mutex<Connection>,
    table: String,
}

impl RunRegistry {
    /// Opens (and resets) a registry at the given path with the default
    /// table name.
    ///
    /// Drops any previous table contents: entries never survive a restart.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        Self::open_with_table(path, DEFAULT_REGISTRY_TABLE)
    }

    /// Opens (and resets) a registry using a custom table name.
    ///
    /// The table name must be a plain identifier since it is interpolated
    /// into DDL statements.
    pub fn open_with_table(
        path: impl AsRef<Path>,
        table: &str,
    ) -> Result<Self, RegistryError> {
        if !is_plain_identifier(table) {
            return Err(RegistryError::InvalidTableName(table.to_string()));
        }

        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(&format!(
            "DROP TABLE IF EXISTS {table};\n\
             CREATE TABLE {table} (\n\
                 request_id TEXT PRIMARY KEY,\n\
                 process_id INTEGER NOT NULL,\n\
                 created_at REAL,\n\
                 metadata   TEXT NOT NULL\n\
             );",
        ))?;

        debug!(path = %path.display(), table = %table, "Run registry initialized");

        Ok(Self {
            conn: Mutex::new(conn),
            table: table.to_string(),
        })
    }

    /// Attaches to an existing registry without resetting it.
    ///
    /// Creates the table only when absent. Used by sibling processes (an
    /// abort issued from a second terminal, registry inspection) that must
    /// observe the supervising process's live entries.
    pub fn attach(path: impl AsRef<Path>) -> Result<Self, RegistryError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch(&format!(
            "CREATE TABLE IF NOT EXISTS {} (\n\
                 request_id TEXT PRIMARY KEY,\n\
                 process_id INTEGER NOT NULL,\n\
                 created_at REAL,\n\
                 metadata   TEXT NOT NULL\n\
             );",
            DEFAULT_REGISTRY_TABLE,
        ))?;

        debug!(path = %path.display(), "Run registry attached");

        Ok(Self {
            conn: Mutex::new(conn),
            table: DEFAULT_REGISTRY_TABLE.to_string(),
        })
    }

    /// Opens an in-memory registry (tests and diagnostics).
    pub fn in_memory() -> Result<Self, RegistryError> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch(&format!(
            "CREATE TABLE {} (\n\
                 request_id TEXT PRIMARY KEY,\n\
                 process_id INTEGER NOT NULL,\n\
                 created_at REAL,\n\
                 metadata   TEXT NOT NULL\n\
             );",
            DEFAULT_REGISTRY_TABLE,
        ))?;
        Ok(Self {
            conn: Mutex::new(conn),
            table: DEFAULT_REGISTRY_TABLE.to_string(),
        })
    }

    /// Inserts a new row.
    ///
    /// Fails with [`RegistryError::Duplicate`] if the request id is already
    /// present; a second submission must never overwrite a live entry.
    pub fn push(
        &self,
        process_id: i64,
        request_id: &str,
        timestamp: f64,
        metadata: &str,
    ) -> Result<(), RegistryError> {
        let conn = self.lock();
        let result = conn.execute(
            &format!(
                "INSERT INTO {} (request_id, process_id, created_at, metadata) \
                 VALUES (?1, ?2, ?3, ?4)",
                self.table
            ),
            params![request_id, process_id, timestamp, metadata],
        );

        match result {
            Ok(_) => {
                debug!(request_id = %request_id, process_id, "Registered run");
                Ok(())
            }
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == ErrorCode::ConstraintViolation =>
            {
                Err(RegistryError::Duplicate {
                    request_id: request_id.to_string(),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Overwrites the process id and timestamp of an existing row.
    pub fn update_pid(
        &self,
        process_id: i64,
        request_id: &str,
        timestamp: f64,
    ) -> Result<(), RegistryError> {
        let conn = self.lock();
        let updated = conn.execute(
            &format!(
                "UPDATE {} SET process_id = ?1, created_at = ?2 WHERE request_id = ?3",
                self.table
            ),
            params![process_id, timestamp, request_id],
        )?;

        if updated == 0 {
            return Err(RegistryError::NotFound {
                request_id: request_id.to_string(),
            });
        }

        debug!(request_id = %request_id, process_id, "Updated run pid");
        Ok(())
    }

    /// Deletes a row. Removing an absent key is a no-op, not an error.
    pub fn remove(&self, request_id: &str) -> Result<(), RegistryError> {
        let conn = self.lock();
        let removed = conn.execute(
            &format!("DELETE FROM {} WHERE request_id = ?1", self.table),
            params![request_id],
        )?;

        if removed > 0 {
            debug!(request_id = %request_id, "Removed run from registry");
        }
        Ok(())
    }

    /// Returns the stored process id for a request.
    pub fn get_pid(&self, request_id: &str) -> Result<i64, RegistryError> {
        let conn = self.lock();
        conn.query_row(
            &format!(
                "SELECT process_id FROM {} WHERE request_id = ?1",
                self.table
            ),
            params![request_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| RegistryError::NotFound {
            request_id: request_id.to_string(),
        })
    }

    /// Returns true if a row exists for the request id.
    pub fn check_existence(&self, request_id: &str) -> Result<bool, RegistryError> {
        let conn = self.lock();
        let found: Option<i64> = conn
            .query_row(
                &format!("SELECT 1 FROM {} WHERE request_id = ?1", self.table),
                params![request_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    /// Returns the metadata blob for a request.
    pub fn get_metadata(&self, request_id: &str) -> Result<String, RegistryError> {
        let conn = self.lock();
        conn.query_row(
            &format!("SELECT metadata FROM {} WHERE request_id = ?1", self.table),
            params![request_id],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| RegistryError::MetadataNotFound {
            request_id: request_id.to_string(),
        })
    }

    /// Replaces the metadata blob for a request.
    pub fn update_metadata(
        &self,
        request_id: &str,
        metadata: &str,
    ) -> Result<(), RegistryError> {
        let conn = self.lock();
        let updated = conn.execute(
            &format!(
                "UPDATE {} SET metadata = ?1 WHERE request_id = ?2",
                self.table
            ),
            params![metadata, request_id],
        )?;

        if updated == 0 {
            return Err(RegistryError::MetadataNotFound {
                request_id: request_id.to_string(),
            });
        }
        Ok(())
    }

    /// Deletes every row. Used when the calling layer wants a clean queue
    /// without reopening the store.
    pub fn purge(&self) -> Result<(), RegistryError> {
        let conn = self.lock();
        let purged = conn.execute(&format!("DELETE FROM {}", self.table), [])?;
        if purged > 0 {
            warn!(purged, "Purged all runs from registry");
        }
        Ok(())
    }

    /// Returns all rows. Diagnostics only; not part of the control flow.
    pub fn inspect(&self) -> Result<Vec<RunRecord>, RegistryError> {
        let conn = self.lock();
        let mut stmt = conn.prepare(&format!(
            "SELECT request_id, process_id, created_at, metadata FROM {}",
            self.table
        ))?;
        let rows = stmt
            .query_map([], |row| {
                Ok(RunRecord {
                    request_id: row.get(0)?,
                    process_id: row.get(1)?,
                    created_at: row.get::<_, Option<f64>>(2)?.unwrap_or(0.0),
                    metadata: row.get(3)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Connection> {
        // A poisoned mutex means another thread panicked mid-statement;
        // the connection itself is still usable.
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Returns true if the string is usable as an unquoted SQL identifier.
fn is_plain_identifier(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_')
        && !name.chars().next().is_some_and(|c| c.is_ascii_digit())
}
