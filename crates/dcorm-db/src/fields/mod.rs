//! Field definitions and column references.
//!
//! [`FieldDef`] and [`ColumnType`] describe declared attributes; [`Field`] is
//! the expression leaf that refers to one of them.

pub mod field;
pub mod types;

pub use field::{AliasBinding, Field, FieldValue};
pub use types::{ColumnType, FieldDef, Reference};
