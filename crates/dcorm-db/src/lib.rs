//! # dcorm-db
//!
//! Expression compiler and statement assembly for dcorm. Callers declare
//! table metadata ([`ModelMeta`](model::ModelMeta)), build expression trees over
//! its [`Field`](fields::Field)s, assemble them into statements with
//! [`select`](query::select::select), and compile those into a SQL template
//! plus the ordered values to bind.
//!
//! ## Architecture
//!
//! Every node of a statement implements [`Compile`](query::engine::Compile)
//! and writes itself into an [`Engine`](query::engine::Engine). The engine
//! keeps fixed SQL syntax and user data strictly apart: keywords go through
//! `literal`, names through `identifier`, and values only ever through
//! `value`, which appends a dialect placeholder. Nothing is executed; the
//! `(template, values)` pair is handed to an external driver.
//!
//! ## Module Overview
//!
//! - [`value`] - The backend-agnostic [`Value`](value::Value) enum
//! - [`fields`] - Column types, field definitions and bound fields
//! - [`model`] - Table metadata and the [`Model`](model::Model) trait
//! - [`dialect`] - Per-database rendering rules
//! - [`query`] - Expressions, aliases, joins and statements
//! - [`database`] - Settings-driven dialect selection and compilation

// These clippy lints are intentionally allowed for the compiler crate:
// - struct_excessive_bools: FieldDef and Dialect carry several independent flags
// - result_large_err: DcormError is the workspace error type and is used consistently
// - doc_markdown: backtick requirements for documentation items are too strict
// - needless_pass_by_value: builder methods take ownership for chaining
// - return_self_not_must_use: builder pattern methods are self-documenting
// - use_self: explicit type names are clearer in some contexts
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::result_large_err)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::use_self)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::match_same_arms)]
#![allow(clippy::should_implement_trait)]

pub mod database;
pub mod dialect;
pub mod fields;
pub mod model;
pub mod query;
pub mod value;

// Re-export the most commonly used types at the crate root.
pub use database::Database;
pub use dialect::{CsqParens, Dialect, ParamStyle};
pub use fields::{ColumnType, Field, FieldDef, FieldValue, Reference};
pub use model::{Model, ModelMeta};
pub use query::{
    select, Alias, AliasManager, Combinable, Compile, CompoundSelect, DeclaredRelations, Engine,
    Expression, JoinKind, OrderedField, RelationLookup, SelectQuery,
};
pub use value::Value;
