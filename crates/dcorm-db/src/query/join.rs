//! Join chains.
//!
//! A [`Join`] links a left side (a table, an alias or another join) to a
//! right-hand [`JoinSource`]. Chaining wraps the current join as the left
//! side of the next one, so `a.join(b)?.join(c)?` compiles left to right as
//! `a JOIN b ON .. JOIN c ON ..`.
//!
//! When no predicate is given, the [`RelationLookup`] collaborator is asked
//! for one; an inner or outer join without a predicate is rejected rather
//! than silently becoming a cross join.

use std::fmt;

use dcorm_core::{DcormError, DcormResult};

use super::alias::Alias;
use super::engine::{Compile, Engine};
use super::expressions::Expression;
use super::literal::{keywords, Literal};
use super::relations::{DeclaredRelations, RelationLookup};
use crate::fields::Field;
use crate::model::ModelMeta;

/// The kind of a join.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinKind {
    #[default]
    Inner,
    LeftOuter,
    RightOuter,
    Full,
    FullOuter,
    Cross,
    Natural,
    Lateral,
    LeftLateral,
}

impl JoinKind {
    /// Returns the keyword that joins the two sides.
    pub const fn literal(self) -> Literal {
        match self {
            Self::Inner => Literal::binary("INNER JOIN"),
            Self::LeftOuter => Literal::binary("LEFT OUTER JOIN"),
            Self::RightOuter => Literal::binary("RIGHT OUTER JOIN"),
            Self::Full => Literal::binary("FULL JOIN"),
            Self::FullOuter => Literal::binary("FULL OUTER JOIN"),
            Self::Cross => Literal::binary("CROSS JOIN"),
            Self::Natural => Literal::binary("NATURAL JOIN"),
            Self::Lateral => Literal::binary("LATERAL"),
            Self::LeftLateral => Literal::binary("LEFT JOIN LATERAL"),
        }
    }

    /// Returns `true` if joins of this kind need an ON predicate.
    pub const fn requires_predicate(self) -> bool {
        !matches!(self, Self::Cross | Self::Natural | Self::Lateral)
    }
}

/// A table or alias that can stand on either side of a join.
#[derive(Debug, Clone)]
pub enum JoinSource {
    Table(&'static ModelMeta),
    Alias(Alias),
}

impl JoinSource {
    /// Returns the underlying table, if known.
    pub const fn model(&self) -> Option<&'static ModelMeta> {
        match self {
            Self::Table(meta) => Some(*meta),
            Self::Alias(alias) => alias.underlying(),
        }
    }

    /// Returns the field `name` as seen through this source.
    ///
    /// # Errors
    ///
    /// Returns [`DcormError::UnknownAttribute`] for undeclared names.
    pub fn field(&self, name: &str) -> DcormResult<Field> {
        match self {
            Self::Table(meta) => meta.field(name),
            Self::Alias(alias) => alias.resolve_field(name),
        }
    }

    /// Returns every field of this source in declaration order.
    pub fn fields(&self) -> Vec<Field> {
        match self {
            Self::Table(meta) => meta.columns(),
            Self::Alias(alias) => alias.fields(),
        }
    }

    /// Returns the alias, if this source is one.
    pub const fn as_alias(&self) -> Option<&Alias> {
        match self {
            Self::Alias(alias) => Some(alias),
            Self::Table(_) => None,
        }
    }

    /// Returns `true` if both refer to the same table or the same alias.
    pub fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Table(a), Self::Table(b)) => a.same_as(b),
            (Self::Alias(a), Self::Alias(b)) => a.same_as(b),
            _ => false,
        }
    }

    /// Joins `other` to this source, inferring the predicate when `on` is
    /// `None`.
    ///
    /// # Errors
    ///
    /// Returns [`DcormError::NoRelation`] if a predicate is needed and none
    /// is declared.
    pub fn join(
        self,
        other: impl Into<Self>,
        kind: JoinKind,
        on: Option<Expression>,
    ) -> DcormResult<Join> {
        FromTarget::Source(self).join(other, kind, on)
    }
}

impl PartialEq for JoinSource {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Alias(a), Self::Alias(b)) => a == b,
            _ => self.same_as(other),
        }
    }
}

impl fmt::Display for JoinSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table(meta) => f.write_str(&meta.db_table),
            Self::Alias(alias) => match alias.name() {
                Some(name) => f.write_str(name),
                None => write!(f, "{}", alias.id()),
            },
        }
    }
}

impl From<&'static ModelMeta> for JoinSource {
    fn from(meta: &'static ModelMeta) -> Self {
        Self::Table(meta)
    }
}

impl From<Alias> for JoinSource {
    fn from(alias: Alias) -> Self {
        Self::Alias(alias)
    }
}

impl Compile for JoinSource {
    fn compile(&self, engine: &mut Engine<'_>) -> DcormResult<()> {
        match self {
            Self::Table(meta) => engine.sql(*meta)?,
            Self::Alias(alias) => engine.sql(alias)?,
        };
        Ok(())
    }
}

/// The FROM target of a statement: a single source or a join chain.
#[derive(Debug, Clone, PartialEq)]
pub enum FromTarget {
    Source(JoinSource),
    Join(Box<Join>),
}

impl FromTarget {
    /// Returns every source in chain order.
    pub fn sources(&self) -> Vec<&JoinSource> {
        match self {
            Self::Source(source) => vec![source],
            Self::Join(join) => join.sources(),
        }
    }

    /// Returns `true` if `source` appears anywhere in the chain.
    pub fn contains(&self, source: &JoinSource) -> bool {
        self.sources().into_iter().any(|s| s.same_as(source))
    }

    /// Joins `other` using the declared foreign keys when `on` is `None`.
    ///
    /// # Errors
    ///
    /// Returns [`DcormError::NoRelation`] if a predicate is needed and none
    /// is declared.
    pub fn join(
        self,
        other: impl Into<JoinSource>,
        kind: JoinKind,
        on: Option<Expression>,
    ) -> DcormResult<Join> {
        match on {
            Some(on) => Ok(Join::new(self, kind, other.into(), Some(on))),
            None => self.join_using(other, kind, &DeclaredRelations),
        }
    }

    /// Joins `other`, asking `relations` for the predicate.
    ///
    /// The most recently joined source is tried first, then the earlier ones.
    ///
    /// # Errors
    ///
    /// Returns [`DcormError::NoRelation`] if no source in the chain relates
    /// to `other`.
    pub fn join_using(
        self,
        other: impl Into<JoinSource>,
        kind: JoinKind,
        relations: &dyn RelationLookup,
    ) -> DcormResult<Join> {
        let other = other.into();
        if !kind.requires_predicate() {
            return Ok(Join::new(self, kind, other, None));
        }
        let mut first_error = None;
        let mut found = None;
        for source in self.sources().into_iter().rev() {
            match relations.find_relation(source, &other) {
                Ok(on) => {
                    found = Some(on);
                    break;
                }
                Err(err) => {
                    first_error.get_or_insert(err);
                }
            }
        }
        match found {
            Some(on) => Ok(Join::new(self, kind, other, Some(on))),
            None => Err(first_error.unwrap_or_else(|| DcormError::NoRelation {
                lhs: "empty join chain".to_string(),
                rhs: other.to_string(),
            })),
        }
    }
}

impl From<JoinSource> for FromTarget {
    fn from(source: JoinSource) -> Self {
        Self::Source(source)
    }
}

impl From<&'static ModelMeta> for FromTarget {
    fn from(meta: &'static ModelMeta) -> Self {
        Self::Source(JoinSource::Table(meta))
    }
}

impl From<Alias> for FromTarget {
    fn from(alias: Alias) -> Self {
        Self::Source(JoinSource::Alias(alias))
    }
}

impl From<Join> for FromTarget {
    fn from(join: Join) -> Self {
        Self::Join(Box::new(join))
    }
}

impl Compile for FromTarget {
    fn compile(&self, engine: &mut Engine<'_>) -> DcormResult<()> {
        match self {
            Self::Source(source) => engine.sql(source)?,
            Self::Join(join) => engine.sql(join.as_ref())?,
        };
        Ok(())
    }
}

/// One link of a join chain.
#[derive(Debug, Clone, PartialEq)]
pub struct Join {
    lhs: FromTarget,
    kind: JoinKind,
    rhs: JoinSource,
    on: Option<Expression>,
}

impl Join {
    /// Creates a join with an explicit (or absent) predicate.
    pub fn new(
        lhs: impl Into<FromTarget>,
        kind: JoinKind,
        rhs: impl Into<JoinSource>,
        on: Option<Expression>,
    ) -> Self {
        Self {
            lhs: lhs.into(),
            kind,
            rhs: rhs.into(),
            on,
        }
    }

    /// Extends the chain with `other`.
    ///
    /// # Errors
    ///
    /// See [`FromTarget::join`].
    pub fn join(
        self,
        other: impl Into<JoinSource>,
        kind: JoinKind,
        on: Option<Expression>,
    ) -> DcormResult<Self> {
        FromTarget::from(self).join(other, kind, on)
    }

    /// Extends the chain with `other`, using `relations` for the predicate.
    ///
    /// # Errors
    ///
    /// See [`FromTarget::join_using`].
    pub fn join_using(
        self,
        other: impl Into<JoinSource>,
        kind: JoinKind,
        relations: &dyn RelationLookup,
    ) -> DcormResult<Self> {
        FromTarget::from(self).join_using(other, kind, relations)
    }

    /// Returns the chain being extended.
    pub const fn lhs(&self) -> &FromTarget {
        &self.lhs
    }

    /// Returns the join kind.
    pub const fn kind(&self) -> JoinKind {
        self.kind
    }

    /// Returns the joined source.
    pub const fn rhs(&self) -> &JoinSource {
        &self.rhs
    }

    /// Returns the ON predicate, if any.
    pub const fn on(&self) -> Option<&Expression> {
        self.on.as_ref()
    }

    /// Returns every source in chain order.
    pub fn sources(&self) -> Vec<&JoinSource> {
        let mut sources = self.lhs.sources();
        sources.push(&self.rhs);
        sources
    }

    /// Returns the fields of every source in chain order.
    pub fn fields(&self) -> Vec<Field> {
        self.sources().into_iter().flat_map(JoinSource::fields).collect()
    }
}

impl Compile for Join {
    fn compile(&self, engine: &mut Engine<'_>) -> DcormResult<()> {
        engine.sql(&self.lhs)?.literal(self.kind.literal()).sql(&self.rhs)?;
        match &self.on {
            Some(on) => {
                engine.literal(keywords::ON).sql(on)?;
            }
            None if self.kind.requires_predicate() => {
                return Err(DcormError::IncompleteQuery(format!(
                    "{} of {} has no ON predicate",
                    self.kind.literal().keyword(),
                    self.rhs
                )));
            }
            None => {}
        }
        Ok(())
    }
}
