//! Settings for dcorm.
//!
//! [`Settings`] holds the logging and database configuration consumed by the
//! rest of the workspace. Each entry in [`Settings::databases`] names the SQL
//! dialect a database speaks, which is all the query compiler needs to know
//! about it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// The database alias used when none is given.
pub const DEFAULT_DB_ALIAS: &str = "default";

/// Configuration of one database.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// The dialect engine (`sqlite`, `postgresql`, `mysql`, `generic`, or a
    /// dotted path ending in one of those).
    pub engine: String,
    /// Schema that qualifies tables which do not declare their own.
    pub schema: Option<String>,
    /// Additional engine-specific options.
    pub options: HashMap<String, String>,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            engine: "sqlite".to_string(),
            schema: None,
            options: HashMap::new(),
        }
    }
}

/// The complete set of settings.
///
/// # Examples
///
/// ```
/// use dcorm_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.log_level, "info");
/// assert_eq!(settings.database("default").unwrap().engine, "sqlite");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,
    /// The `tracing` filter directive (e.g. "info", "dcorm_db=debug").
    pub log_level: String,
    /// Database configurations, keyed by alias (e.g. "default").
    pub databases: HashMap<String, DatabaseSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        let mut databases = HashMap::new();
        databases.insert(DEFAULT_DB_ALIAS.to_string(), DatabaseSettings::default());

        Self {
            debug: true,
            log_level: "info".to_string(),
            databases,
        }
    }
}

impl Settings {
    /// Returns the database configured under `alias`.
    pub fn database(&self, alias: &str) -> Option<&DatabaseSettings> {
        self.databases.get(alias)
    }
}
