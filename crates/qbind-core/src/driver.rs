//! Database driver trait definition

use crate::{Connection, ConnectionConfig, Result};
use async_trait::async_trait;
use std::sync::Arc;

/// A database driver that opens connections from a [`ConnectionConfig`].
#[async_trait]
pub trait DatabaseDriver: Send + Sync {
    /// Driver identifier, matched against [`ConnectionConfig::driver`]
    fn name(&self) -> &'static str;

    /// Human readable driver name
    fn display_name(&self) -> &'static str;

    /// Open a new connection
    async fn connect(&self, config: &ConnectionConfig) -> Result<Arc<dyn Connection>>;

    /// Open a connection and run a trivial query against it
    async fn test_connection(&self, config: &ConnectionConfig) -> Result<()> {
        tracing::debug!(driver = self.name(), "testing connection");
        let conn = self.connect(config).await?;
        conn.query("SELECT 1", &crate::Parameters::new()).await?;
        conn.close().await
    }
}
