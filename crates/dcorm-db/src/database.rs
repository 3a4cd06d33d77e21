//! Configured databases.
//!
//! A [`Database`] pairs a [`Dialect`] with the schema that qualifies tables
//! which do not declare their own. It is usually built from [`Settings`] and
//! is the single place statements are turned into `(template, values)` for an
//! external executor.

use dcorm_core::{DcormError, DcormResult, Settings};

use crate::dialect::Dialect;
use crate::query::engine::{Compile, Engine};
use crate::value::Value;

/// A dialect plus default schema, ready to compile statements.
///
/// # Examples
///
/// ```
/// use dcorm_core::Settings;
/// use dcorm_db::database::Database;
///
/// let db = Database::from_settings(&Settings::default(), "default").unwrap();
/// assert_eq!(db.dialect().name, "sqlite");
/// assert!(Database::from_settings(&Settings::default(), "replica").is_err());
/// ```
#[derive(Debug, Clone, Default)]
pub struct Database {
    dialect: Dialect,
    schema: Option<String>,
}

impl Database {
    /// Creates a database for `dialect` with no default schema.
    pub const fn new(dialect: Dialect) -> Self {
        Self {
            dialect,
            schema: None,
        }
    }

    /// Builds the database configured under `alias`.
    ///
    /// # Errors
    ///
    /// Returns [`DcormError::ImproperlyConfigured`] if `alias` is not
    /// configured or names an unknown engine.
    pub fn from_settings(settings: &Settings, alias: &str) -> DcormResult<Self> {
        let config = settings.database(alias).ok_or_else(|| {
            DcormError::ImproperlyConfigured(format!("The database alias '{alias}' is not configured"))
        })?;
        let dialect = Dialect::from_engine(&config.engine)?;
        tracing::debug!(alias, dialect = %dialect.name, "configured database");
        Ok(Self {
            dialect,
            schema: config.schema.clone(),
        })
    }

    /// Sets the schema applied to tables without one.
    #[must_use]
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Returns the configured dialect.
    pub const fn dialect(&self) -> &Dialect {
        &self.dialect
    }

    /// Returns the default schema, if any.
    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    /// Returns a fresh engine for this database.
    pub fn engine(&self) -> Engine<'_> {
        Engine::new(&self.dialect).with_default_schema(self.schema.clone())
    }

    /// Compiles `node` into a template and its bound values.
    ///
    /// # Errors
    ///
    /// Returns the first error raised while compiling `node`.
    pub fn compile<C: Compile + ?Sized>(&self, node: &C) -> DcormResult<(String, Vec<Value>)> {
        self.engine().finish(node)
    }

    /// Compiles `node` with its values inlined. Never execute the result.
    ///
    /// # Errors
    ///
    /// See [`Database::compile`].
    pub fn debug_string<C: Compile + ?Sized>(&self, node: &C) -> DcormResult<String> {
        let mut engine = self.engine();
        engine.sql(node)?;
        Ok(engine.query_string())
    }
}
