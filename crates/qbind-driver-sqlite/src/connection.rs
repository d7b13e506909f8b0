//! SQLite connection implementation

use async_trait::async_trait;
use parking_lot::Mutex;
use qbind_core::{
    Connection, DataTransformer, Parameters, PassthroughTransformer, QbindError, QueryResult,
    Result, StatementResult, Transaction,
};
use qbind_query::{DefaultNormalizer, QueryNormalizer, ScanningTokenizer};
use rusqlite::{Connection as RusqliteConnection, OpenFlags};
use std::sync::Arc;
use std::time::Duration;

use crate::binding;

/// Shared handle to the underlying database. `None` once the connection is closed.
type SharedConnection = Arc<Mutex<Option<RusqliteConnection>>>;

/// SQLite connection wrapper
pub struct SqliteConnection {
    conn: SharedConnection,
    normalizer: Arc<dyn QueryNormalizer>,
    transformer: Arc<dyn DataTransformer>,
}

impl SqliteConnection {
    /// Open a SQLite database with the default normalizer and no value transformation
    pub fn open(path: &str) -> Result<Self> {
        Self::open_with(
            path,
            Arc::new(DefaultNormalizer::<ScanningTokenizer>::default()),
            Arc::new(PassthroughTransformer),
        )
    }

    /// Open a SQLite database with a custom normalizer and transformer
    pub fn open_with(
        path: &str,
        normalizer: Arc<dyn QueryNormalizer>,
        transformer: Arc<dyn DataTransformer>,
    ) -> Result<Self> {
        tracing::info!(path = %path, "opening SQLite database");
        let expanded_path = Self::expand_path(path)?;

        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
            | OpenFlags::SQLITE_OPEN_CREATE
            | OpenFlags::SQLITE_OPEN_URI
            | OpenFlags::SQLITE_OPEN_NO_MUTEX;

        let conn = if path == ":memory:" {
            RusqliteConnection::open_in_memory().map_err(|e| {
                QbindError::Connection(format!("Failed to open in-memory database: {}", e))
            })?
        } else {
            if !expanded_path.starts_with("file:") {
                let file_path = std::path::Path::new(&expanded_path);
                if let Some(parent) = file_path.parent()
                    && !parent.exists()
                {
                    return Err(QbindError::Connection(format!(
                        "Parent directory does not exist: {}",
                        parent.display()
                    )));
                }
            }

            RusqliteConnection::open_with_flags(&expanded_path, flags).map_err(|e| {
                QbindError::Connection(format!(
                    "Failed to open SQLite database at '{}': {}",
                    expanded_path, e
                ))
            })?
        };

        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(|e| QbindError::Connection(format!("Failed to enable foreign keys: {}", e)))?;

        tracing::info!(path = %expanded_path, "SQLite database connection established");
        Ok(Self {
            conn: Arc::new(Mutex::new(Some(conn))),
            normalizer,
            transformer,
        })
    }

    /// Expand `~/` to the home directory and make relative paths absolute
    fn expand_path(path: &str) -> Result<String> {
        if path == ":memory:" || path.starts_with("file:") {
            return Ok(path.to_string());
        }

        let expanded = if let Some(rest) = path.strip_prefix("~/") {
            let Some(home) = std::env::var_os("HOME") else {
                return Err(QbindError::Configuration(
                    "Unable to determine HOME directory".into(),
                ));
            };
            std::path::PathBuf::from(home).join(rest)
        } else if path.starts_with('~') {
            return Err(QbindError::Configuration(
                "User-specific home directories (~user) are not supported".into(),
            ));
        } else {
            std::path::PathBuf::from(path)
        };

        let absolute = if expanded.is_relative() {
            std::env::current_dir()?.join(expanded)
        } else {
            expanded
        };
        Ok(absolute.to_string_lossy().to_string())
    }

    /// Set how long a statement waits on a locked database before failing
    pub fn set_busy_timeout(&self, timeout: Duration) -> Result<()> {
        with_connection(&self.conn, |conn| {
            conn.busy_timeout(timeout).map_err(|e| {
                QbindError::Connection(format!("Failed to set busy timeout: {}", e))
            })
        })
    }

    /// Toggle foreign key enforcement, which is on by default
    pub fn set_foreign_keys(&self, enabled: bool) -> Result<()> {
        with_connection(&self.conn, |conn| {
            conn.pragma_update(None, "foreign_keys", if enabled { "ON" } else { "OFF" })
                .map_err(|e| {
                    QbindError::Connection(format!("Failed to set foreign keys: {}", e))
                })
        })
    }
}

#[async_trait]
impl Connection for SqliteConnection {
    fn driver_name(&self) -> &str {
        "sqlite"
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn execute(&self, sql: &str, params: &Parameters) -> Result<StatementResult> {
        let normalized = self.normalizer.normalize(sql, params)?;
        let result = with_connection(&self.conn, |conn| {
            binding::execute(conn, &normalized, self.transformer.as_ref())
        })?;

        tracing::debug!(
            affected_rows = result.affected_rows,
            bound = normalized.parameters().len(),
            "statement executed"
        );
        Ok(result)
    }

    #[tracing::instrument(skip(self, sql, params), fields(sql_preview = %sql.chars().take(100).collect::<String>()))]
    async fn query(&self, sql: &str, params: &Parameters) -> Result<QueryResult> {
        let normalized = self.normalizer.normalize(sql, params)?;
        let result = with_connection(&self.conn, |conn| {
            binding::query(conn, &normalized, self.transformer.as_ref())
        })?;

        tracing::debug!(
            row_count = result.row_count(),
            execution_time_ms = result.execution_time_ms,
            "query executed successfully"
        );
        Ok(result)
    }

    async fn begin_transaction(&self) -> Result<Box<dyn Transaction>> {
        tracing::debug!("beginning SQLite transaction");
        with_connection(&self.conn, |conn| {
            // DEFERRED takes the write lock on the first write, not at BEGIN
            conn.execute_batch("BEGIN DEFERRED").map_err(|e| {
                QbindError::Transaction(format!("Failed to begin transaction: {}", e))
            })
        })?;

        tracing::debug!("SQLite transaction started");
        Ok(Box::new(SqliteTransaction {
            conn: Arc::clone(&self.conn),
            normalizer: Arc::clone(&self.normalizer),
            transformer: Arc::clone(&self.transformer),
            committed: false,
            rolled_back: false,
        }))
    }

    async fn close(&self) -> Result<()> {
        let mut guard = self.conn.lock();
        let Some(conn) = guard.take() else {
            return Ok(());
        };

        tracing::info!("closing SQLite connection");
        if let Err((conn, e)) = conn.close() {
            *guard = Some(conn);
            return Err(QbindError::Connection(format!(
                "Failed to close SQLite connection: {}",
                e
            )));
        }
        Ok(())
    }

    fn is_closed(&self) -> bool {
        self.conn.lock().is_none()
    }
}

/// Run `f` against the open connection, failing once it has been closed.
fn with_connection<T>(
    conn: &Mutex<Option<RusqliteConnection>>,
    f: impl FnOnce(&RusqliteConnection) -> Result<T>,
) -> Result<T> {
    let guard = conn.lock();
    let conn = guard
        .as_ref()
        .ok_or_else(|| QbindError::Connection("No active database connection".into()))?;
    f(conn)
}

/// SQLite transaction wrapper.
///
/// Issues raw `BEGIN DEFERRED` / `COMMIT` / `ROLLBACK` SQL so that it can share
/// the connection `Arc<Mutex<...>>` without running into rusqlite's borrow-based
/// transaction lifetime requirements.
pub struct SqliteTransaction {
    conn: SharedConnection,
    normalizer: Arc<dyn QueryNormalizer>,
    transformer: Arc<dyn DataTransformer>,
    committed: bool,
    rolled_back: bool,
}

impl Drop for SqliteTransaction {
    fn drop(&mut self) {
        if !self.committed && !self.rolled_back {
            tracing::warn!(
                "SQLite transaction dropped without commit or rollback, issuing automatic rollback"
            );
            let guard = self.conn.lock();
            match guard.as_ref() {
                Some(conn) => {
                    if let Err(e) = conn.execute_batch("ROLLBACK") {
                        tracing::error!(error = %e, "automatic rollback on drop failed");
                    }
                }
                None => tracing::error!("connection closed before transaction was finished"),
            }
        }
    }
}

#[async_trait]
impl Transaction for SqliteTransaction {
    async fn commit(mut self: Box<Self>) -> Result<()> {
        tracing::debug!("committing SQLite transaction");

        if self.rolled_back {
            return Err(QbindError::Transaction("Transaction already rolled back".into()));
        }
        if self.committed {
            return Err(QbindError::Transaction("Transaction already committed".into()));
        }

        with_connection(&self.conn, |conn| {
            conn.execute_batch("COMMIT").map_err(|e| {
                QbindError::Transaction(format!("Failed to commit transaction: {}", e))
            })
        })?;

        self.committed = true;
        tracing::debug!("SQLite transaction committed successfully");
        Ok(())
    }

    async fn rollback(mut self: Box<Self>) -> Result<()> {
        tracing::debug!("rolling back SQLite transaction");

        if self.committed {
            return Err(QbindError::Transaction("Transaction already committed".into()));
        }
        if self.rolled_back {
            return Ok(());
        }

        with_connection(&self.conn, |conn| {
            conn.execute_batch("ROLLBACK").map_err(|e| {
                QbindError::Transaction(format!("Failed to rollback transaction: {}", e))
            })
        })?;

        self.rolled_back = true;
        tracing::debug!("SQLite transaction rolled back successfully");
        Ok(())
    }

    async fn query(&self, sql: &str, params: &Parameters) -> Result<QueryResult> {
        tracing::debug!(sql_preview = %sql.chars().take(100).collect::<String>(), "executing query in SQLite transaction");

        let normalized = self.normalizer.normalize(sql, params)?;
        with_connection(&self.conn, |conn| {
            binding::query(conn, &normalized, self.transformer.as_ref())
        })
    }

    async fn execute(&self, sql: &str, params: &Parameters) -> Result<StatementResult> {
        tracing::debug!(sql_preview = %sql.chars().take(100).collect::<String>(), "executing statement in SQLite transaction");

        let normalized = self.normalizer.normalize(sql, params)?;
        let result = with_connection(&self.conn, |conn| {
            binding::execute(conn, &normalized, self.transformer.as_ref())
        })?;

        tracing::debug!(
            affected_rows = result.affected_rows,
            "statement executed in SQLite transaction"
        );
        Ok(result)
    }
}
