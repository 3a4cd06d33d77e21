//! # dcorm
//!
//! Typed SQL expression building and dialect-aware statement compilation.
//!
//! This is the meta-crate that re-exports the sub-crates for convenient access.
//! You can depend on `dcorm` to get everything, or depend on individual crates
//! for finer-grained control.

/// Error types, settings, settings loading and logging setup.
pub use dcorm_core as core;

/// Expressions, aliases, joins, statements and dialects.
#[cfg(feature = "db")]
pub use dcorm_db as db;

/// Third-party crates whose types appear in the public API.
pub use chrono;
pub use tracing;
pub use uuid;

/// The names most programs need, in one import.
#[cfg(feature = "db")]
pub mod prelude {
    pub use dcorm_core::{DcormError, DcormResult, Settings};
    pub use dcorm_db::{
        select, Alias, ColumnType, Combinable, Database, Dialect, Expression, Field, FieldDef,
        JoinKind, Model, ModelMeta, SelectQuery, Value,
    };
}
