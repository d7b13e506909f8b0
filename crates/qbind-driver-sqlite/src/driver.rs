//! SQLite driver implementation

use async_trait::async_trait;
use qbind_core::{Connection, ConnectionConfig, DatabaseDriver, QbindError, Result};
use std::sync::Arc;
use std::time::Duration;

use crate::SqliteConnection;

/// SQLite database driver
pub struct SqliteDriver;

impl SqliteDriver {
    /// Create a new SQLite driver instance
    pub fn new() -> Self {
        tracing::debug!("SQLite driver initialized");
        Self
    }
}

impl Default for SqliteDriver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl DatabaseDriver for SqliteDriver {
    fn name(&self) -> &'static str {
        "sqlite"
    }

    fn display_name(&self) -> &'static str {
        "SQLite"
    }

    /// Recognized `params`: `path`, `busy_timeout` (milliseconds) and
    /// `foreign_keys` (`on`/`off`).
    #[tracing::instrument(skip(self, config), fields(path = config.get_string("path").as_deref()))]
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>> {
        let path = config.get_string("path").ok_or_else(|| {
            QbindError::Configuration(
                "SQLite requires 'path' or 'database' parameter. Example: { \"path\": \"/path/to/database.db\" }".into(),
            )
        })?;

        let busy_timeout = config
            .get_string("busy_timeout")
            .map(|raw| {
                raw.trim().parse::<u64>().map_err(|_| {
                    QbindError::Configuration(format!(
                        "busy_timeout must be a number of milliseconds, got '{}'",
                        raw
                    ))
                })
            })
            .transpose()?;

        let foreign_keys = match config.get_string("foreign_keys") {
            None => None,
            Some(raw) => Some(parse_switch(&raw).ok_or_else(|| {
                QbindError::Configuration(format!(
                    "foreign_keys must be 'on' or 'off', got '{}'",
                    raw
                ))
            })?),
        };

        let conn = SqliteConnection::open(&path).map_err(|e| {
            tracing::error!(error = %e, "failed to connect to SQLite database");
            e
        })?;

        if let Some(ms) = busy_timeout {
            conn.set_busy_timeout(Duration::from_millis(ms))?;
        }
        if let Some(enabled) = foreign_keys {
            conn.set_foreign_keys(enabled)?;
        }

        tracing::info!(path = %path, "SQLite connection created");
        Ok(Arc::new(conn))
    }
}

fn parse_switch(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "on" | "true" | "1" | "yes" => Some(true),
        "off" | "false" | "0" | "no" => Some(false),
        _ => None,
    }
}
