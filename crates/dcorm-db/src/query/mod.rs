//! Statement building and compilation.
//!
//! This module contains the complete compilation pipeline:
//!
//! - [`engine`] - The [`Engine`] that accumulates SQL and bound values
//! - [`literal`] / [`operators`] - Fixed SQL syntax and operator precedence
//! - [`identifier`] - Dotted identifier paths
//! - [`expressions`] - Expression trees and the [`Combinable`] combinators
//! - [`alias`] - Table and sub-query aliases, and per-statement alias naming
//! - [`join`] / [`relations`] - Join chains and join predicate inference
//! - [`ordering`] - ORDER BY terms
//! - [`select`] / [`compound`] - SELECT statements and set operations

pub mod alias;
pub mod compound;
pub mod engine;
pub mod expressions;
pub mod identifier;
pub mod join;
pub mod literal;
pub mod operators;
pub mod ordering;
pub mod relations;
pub mod select;

pub use alias::{Alias, AliasId, AliasManager, AliasTarget};
pub use compound::{CompoundOp, CompoundOperand, CompoundSelect};
pub use engine::{Compile, Engine};
pub use expressions::{Combinable, Expression, Operation};
pub use identifier::Path;
pub use join::{FromTarget, Join, JoinKind, JoinSource};
pub use literal::Literal;
pub use operators::Operator;
pub use ordering::{Direction, NullsOrder, OrderedField};
pub use relations::{DeclaredRelations, RelationLookup};
pub use select::{select, SelectItem, SelectQuery};
