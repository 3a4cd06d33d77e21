//! Core error types for the dcorm workspace.
//!
//! This module provides the error enum [`DcormError`] shared by every crate in
//! the workspace. Query-construction errors, compilation errors, dialect
//! configuration errors and settings errors all live here so callers only
//! ever match on one type.

use thiserror::Error;

/// The primary error type for dcorm.
///
/// Construction and compilation errors are raised synchronously at the call
/// that caused them. None of them are transient: they indicate a mistake in
/// the way a query was assembled or configured, so they are never retried.
/// Every variant carries the offending name or value so the construction site
/// can be located from the message alone.
#[derive(Error, Debug)]
pub enum DcormError {
    // ── Query construction ───────────────────────────────────────────

    /// Two aliases resolved to the same name within one alias scope.
    #[error("Duplicate alias: {0}")]
    DuplicateAlias(String),

    /// An alias was compiled without an explicit or generated name.
    #[error("Alias name not set: {0}")]
    MissingAliasName(String),

    /// The value binder was handed a value it cannot bind.
    #[error("Cannot bind value of type {0}")]
    UnsupportedValue(String),

    /// A join omitted its predicate and no relation is declared between the
    /// two sides.
    #[error("No relation declared between {lhs} and {rhs}")]
    NoRelation {
        /// The left-hand side of the join.
        lhs: String,
        /// The right-hand side of the join.
        rhs: String,
    },

    /// A field was requested that the table or alias does not declare.
    #[error("{table} has no attribute '{attribute}'")]
    UnknownAttribute {
        /// The table or alias the lookup was made on.
        table: String,
        /// The requested attribute name.
        attribute: String,
    },

    /// The statement lacks a part it needs to be compiled.
    #[error("Incomplete query: {0}")]
    IncompleteQuery(String),

    // ── Dialect configuration ────────────────────────────────────────

    /// The dialect does not implement a requested behavior.
    #[error("{feature} is not supported by the {dialect} dialect")]
    NotSupported {
        /// The dialect name.
        dialect: String,
        /// The unsupported feature.
        feature: String,
    },

    // ── Settings ─────────────────────────────────────────────────────

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// The library is improperly configured.
    #[error("Improperly configured: {0}")]
    ImproperlyConfigured(String),

    // ── IO ───────────────────────────────────────────────────────────

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl DcormError {
    /// Returns `true` for errors caused by the way a query was built, as
    /// opposed to configuration or I/O problems.
    pub const fn is_construction_error(&self) -> bool {
        matches!(
            self,
            Self::DuplicateAlias(_)
                | Self::MissingAliasName(_)
                | Self::UnsupportedValue(_)
                | Self::NoRelation { .. }
                | Self::UnknownAttribute { .. }
                | Self::IncompleteQuery(_)
        )
    }
}

/// A convenience type alias for `Result<T, DcormError>`.
pub type DcormResult<T> = Result<T, DcormError>;
