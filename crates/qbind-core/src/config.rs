//! Connection configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use crate::Result;

/// Connection configuration handed to a [`DatabaseDriver`](crate::DatabaseDriver).
///
/// Configurations can be built in code or loaded from TOML:
///
/// ```toml
/// driver = "sqlite"
/// name = "local"
/// database = "/var/lib/app/app.db"
///
/// [params]
/// foreign_keys = "on"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectionConfig {
    /// Driver ID (e.g., "sqlite")
    pub driver: String,
    /// Display name
    #[serde(default)]
    pub name: String,
    /// Database name or file path
    #[serde(default)]
    pub database: Option<String>,
    /// Username
    #[serde(default)]
    pub username: Option<String>,
    /// Password
    #[serde(default)]
    pub password: Option<String>,
    /// Additional driver-specific parameters
    #[serde(default)]
    pub params: HashMap<String, String>,
}

impl ConnectionConfig {
    /// Create a new configuration with default values
    pub fn new(driver: &str, name: &str) -> Self {
        Self {
            driver: driver.to_string(),
            name: name.to_string(),
            database: None,
            username: None,
            password: None,
            params: HashMap::new(),
        }
    }

    /// Create a SQLite configuration
    pub fn new_sqlite(database_path: &str) -> Self {
        let mut config = Self::new("sqlite", "SQLite Database");
        config.database = Some(database_path.to_string());
        config
    }

    /// Set an additional parameter
    pub fn with_param(mut self, key: &str, value: &str) -> Self {
        self.params.insert(key.to_string(), value.to_string());
        self
    }

    /// Get a parameter as a string.
    ///
    /// `path` and `database` fall back to the `database` field when not set
    /// explicitly in `params`.
    pub fn get_string(&self, key: &str) -> Option<String> {
        if let Some(value) = self.params.get(key) {
            return Some(value.clone());
        }
        match key {
            "path" | "database" => self.database.clone(),
            "username" | "user" => self.username.clone(),
            _ => None,
        }
    }

    /// Parse a configuration from a TOML document
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Load a configuration from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        tracing::debug!(path = %path.display(), "loading connection configuration");
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}
