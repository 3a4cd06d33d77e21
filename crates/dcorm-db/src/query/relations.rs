//! Join predicate inference.

use dcorm_core::{DcormError, DcormResult};

use super::expressions::{Combinable, Expression};
use super::join::JoinSource;

/// Finds the predicate relating two join sources.
pub trait RelationLookup {
    /// Returns the join predicate between `lhs` and `rhs`.
    ///
    /// # Errors
    ///
    /// Returns [`DcormError::NoRelation`] when the sources are unrelated.
    fn find_relation(&self, lhs: &JoinSource, rhs: &JoinSource) -> DcormResult<Expression>;
}

/// Relation lookup over the foreign keys declared in model metadata.
///
/// A field of one side that [`references`](crate::fields::FieldDef::references)
/// the other side's table yields `fk = referenced`, with both fields seen
/// through the sources (so aliases are honored). `lhs` is searched first.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredRelations;

impl DeclaredRelations {
    fn forward(from: &JoinSource, to: &JoinSource) -> Option<Expression> {
        let target = to.model()?;
        from.fields().into_iter().find_map(|fk| {
            let reference = fk.def().references?;
            if !reference.target().same_as(target) {
                return None;
            }
            let referenced = to.field(reference.field).ok()?;
            Some(fk.equals(referenced))
        })
    }
}

impl RelationLookup for DeclaredRelations {
    fn find_relation(&self, lhs: &JoinSource, rhs: &JoinSource) -> DcormResult<Expression> {
        Self::forward(lhs, rhs)
            .or_else(|| Self::forward(rhs, lhs))
            .ok_or_else(|| DcormError::NoRelation {
                lhs: lhs.to_string(),
                rhs: rhs.to_string(),
            })
    }
}
