//! SELECT statements.
//!
//! [`SelectQuery`] collects a projection, a FROM target, a WHERE predicate,
//! ordering and LIMIT/OFFSET, and compiles them in that order. Building is
//! infallible except where a join needs a predicate; everything else is
//! checked when the statement is compiled.
//!
//! Each compilation registers the statement's aliases with a fresh
//! [`AliasManager`], so generated alias names are stable within one
//! compilation and never leak into another.

use std::fmt;
use std::mem;

use dcorm_core::{DcormError, DcormResult};

use super::alias::{Alias, AliasManager};
use super::compound::{CompoundOp, CompoundOperand, CompoundSelect};
use super::engine::{Compile, Engine};
use super::expressions::{Combinable, Expression};
use super::join::{FromTarget, JoinKind, JoinSource};
use super::literal::keywords;
use super::ordering::OrderedField;
use super::relations::RelationLookup;
use crate::dialect::Dialect;
use crate::fields::Field;
use crate::model::ModelMeta;
use crate::value::Value;

/// One entry of a projection list.
///
/// Tables and aliases expand to all of their fields in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub enum SelectItem {
    Table(&'static ModelMeta),
    Alias(Alias),
    Field(Field),
}

impl SelectItem {
    fn fields(&self) -> Vec<Field> {
        match self {
            Self::Table(meta) => meta.columns(),
            Self::Alias(alias) => alias.fields(),
            Self::Field(field) => vec![field.clone()],
        }
    }

    fn source(&self) -> Option<JoinSource> {
        match self {
            Self::Table(meta) => Some(JoinSource::Table(*meta)),
            Self::Alias(alias) => Some(JoinSource::Alias(alias.clone())),
            Self::Field(field) if field.alias().is_none() => Some(JoinSource::Table(field.model())),
            Self::Field(_) => None,
        }
    }

    fn is_in(&self, from: &FromTarget) -> bool {
        match (self, self.source()) {
            (Self::Field(field), None) => field.alias().is_some_and(|binding| {
                from.sources()
                    .into_iter()
                    .filter_map(JoinSource::as_alias)
                    .any(|alias| alias.id() == binding.id)
            }),
            (_, Some(source)) => from.contains(&source),
            (_, None) => false,
        }
    }
}

impl fmt::Display for SelectItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Table(meta) => f.write_str(&meta.db_table),
            Self::Alias(alias) => match alias.name() {
                Some(name) => f.write_str(name),
                None => write!(f, "{}", alias.id()),
            },
            Self::Field(field) => write!(f, "{}.{}", field.source_name(), field.name()),
        }
    }
}

impl From<&'static ModelMeta> for SelectItem {
    fn from(meta: &'static ModelMeta) -> Self {
        Self::Table(meta)
    }
}

impl From<Alias> for SelectItem {
    fn from(alias: Alias) -> Self {
        Self::Alias(alias)
    }
}

impl From<Field> for SelectItem {
    fn from(field: Field) -> Self {
        Self::Field(field)
    }
}

/// Starts a SELECT over `items`.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
///
/// use dcorm_db::dialect::Dialect;
/// use dcorm_db::fields::{ColumnType, FieldDef};
/// use dcorm_db::model::ModelMeta;
/// use dcorm_db::query::expressions::Combinable;
/// use dcorm_db::query::select::select;
/// use dcorm_db::value::Value;
///
/// static PERSON: LazyLock<ModelMeta> = LazyLock::new(|| {
///     ModelMeta::new(
///         "person",
///         vec![
///             FieldDef::new("id", ColumnType::Auto).primary_key(),
///             FieldDef::new("name", ColumnType::Text),
///         ],
///     )
/// });
///
/// let query = select([&*PERSON]).where_(PERSON.field("id").unwrap().equals(1));
/// let (sql, values) = query.query(&Dialect::sqlite()).unwrap();
/// assert_eq!(
///     sql,
///     "SELECT \"person\".\"id\", \"person\".\"name\" FROM \"person\" WHERE \"person\".\"id\" = ?"
/// );
/// assert_eq!(values, vec![Value::Int(1)]);
/// ```
pub fn select<I, S>(items: I) -> SelectQuery
where
    I: IntoIterator<Item = S>,
    S: Into<SelectItem>,
{
    SelectQuery::new(items)
}

/// A SELECT statement under construction.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectQuery {
    items: Vec<SelectItem>,
    from: Option<FromTarget>,
    where_clause: Expression,
    order_by: Vec<OrderedField>,
    limit: Option<i64>,
    offset: Option<i64>,
    distinct: bool,
    for_update: bool,
}

impl SelectQuery {
    /// Creates a query projecting `items`. An empty projection selects `*`.
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<SelectItem>,
    {
        Self {
            items: items.into_iter().map(Into::into).collect(),
            from: None,
            where_clause: Expression::TRUE,
            order_by: Vec::new(),
            limit: None,
            offset: None,
            distinct: false,
            for_update: false,
        }
    }

    // ── Builders ────────────────────────────────────────────────────

    /// Sets the FROM target explicitly.
    ///
    /// Without one, the first selected table or alias is used.
    #[must_use]
    pub fn from(mut self, target: impl Into<FromTarget>) -> Self {
        self.from = Some(target.into());
        self
    }

    /// Narrows the WHERE clause by AND-ing `predicate` onto it.
    #[must_use]
    pub fn where_(mut self, predicate: impl Into<Expression>) -> Self {
        let current = mem::replace(&mut self.where_clause, Expression::TRUE);
        self.where_clause = current.and_(predicate);
        if self.where_clause.as_bool() == Some(false) {
            tracing::warn!("WHERE clause folded to constant false, the query matches no rows");
        }
        self
    }

    /// Joins `other` onto the FROM target.
    ///
    /// # Errors
    ///
    /// Returns [`DcormError::NoRelation`] when `on` is `None` and no
    /// relation is declared, or [`DcormError::IncompleteQuery`] when there
    /// is nothing to join onto.
    pub fn join(
        mut self,
        other: impl Into<JoinSource>,
        kind: JoinKind,
        on: Option<Expression>,
    ) -> DcormResult<Self> {
        let base = self.take_from()?;
        self.from = Some(base.join(other, kind, on)?.into());
        Ok(self)
    }

    /// Joins `other`, asking `relations` for the predicate.
    ///
    /// # Errors
    ///
    /// See [`SelectQuery::join`].
    pub fn join_using(
        mut self,
        other: impl Into<JoinSource>,
        kind: JoinKind,
        relations: &dyn RelationLookup,
    ) -> DcormResult<Self> {
        let base = self.take_from()?;
        self.from = Some(base.join_using(other, kind, relations)?.into());
        Ok(self)
    }

    /// Inner-joins the next selected table or alias that is not yet part of
    /// the FROM target, on `on`.
    ///
    /// # Errors
    ///
    /// Returns [`DcormError::IncompleteQuery`] if every selected source is
    /// already joined.
    pub fn join_on(mut self, on: impl Into<Expression>) -> DcormResult<Self> {
        let base = self.take_from()?;
        let next = self
            .items
            .iter()
            .filter_map(SelectItem::source)
            .find(|source| !base.contains(source));
        let Some(next) = next else {
            return Err(DcormError::IncompleteQuery(
                "every selected source is already joined".to_string(),
            ));
        };
        self.from = Some(base.join(next, JoinKind::Inner, Some(on.into()))?.into());
        Ok(self)
    }

    /// Sets the ORDER BY terms, replacing (with a warning) earlier ones.
    #[must_use]
    pub fn order_by<I, O>(mut self, terms: I) -> Self
    where
        I: IntoIterator<Item = O>,
        O: Into<OrderedField>,
    {
        if !self.order_by.is_empty() {
            let previous = self.order_by.len();
            tracing::warn!("Overriding previous ordering of {previous} term(s)");
        }
        self.order_by = terms.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the LIMIT, replacing (with a warning) an earlier one.
    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        replace_with_warning(&mut self.limit, limit, "limit");
        self
    }

    /// Sets the OFFSET, replacing (with a warning) an earlier one.
    #[must_use]
    pub fn offset(mut self, offset: i64) -> Self {
        replace_with_warning(&mut self.offset, offset, "offset");
        self
    }

    #[must_use]
    pub const fn distinct(mut self) -> Self {
        self.distinct = true;
        self
    }

    /// Locks the selected rows (`FOR UPDATE`).
    #[must_use]
    pub const fn for_update(mut self) -> Self {
        self.for_update = true;
        self
    }

    /// Wraps this query in a named alias for use as a FROM or JOIN source.
    pub fn alias(self, name: impl Into<String>) -> Alias {
        Alias::query(self, Some(name.into()))
    }

    /// Wraps this query in an alias named during compilation.
    pub fn unnamed_alias(self) -> Alias {
        Alias::query(self, None)
    }

    /// Combines this statement with `other` using `UNION`.
    pub fn union(self, other: impl Into<CompoundOperand>) -> CompoundSelect {
        CompoundSelect::new(self, CompoundOp::Union, other)
    }

    /// Combines this statement with `other` using `UNION ALL`.
    pub fn union_all(self, other: impl Into<CompoundOperand>) -> CompoundSelect {
        CompoundSelect::new(self, CompoundOp::UnionAll, other)
    }

    /// Combines this statement with `other` using `INTERSECT`.
    pub fn intersect(self, other: impl Into<CompoundOperand>) -> CompoundSelect {
        CompoundSelect::new(self, CompoundOp::Intersect, other)
    }

    /// Combines this statement with `other` using `EXCEPT`.
    pub fn except(self, other: impl Into<CompoundOperand>) -> CompoundSelect {
        CompoundSelect::new(self, CompoundOp::Except, other)
    }

    // ── Accessors ───────────────────────────────────────────────────

    /// Returns the projected items as given.
    pub fn items(&self) -> &[SelectItem] {
        &self.items
    }

    /// Returns the WHERE predicate.
    pub const fn where_clause(&self) -> &Expression {
        &self.where_clause
    }

    /// Returns the ORDER BY terms.
    pub fn ordering(&self) -> &[OrderedField] {
        &self.order_by
    }

    /// Returns the LIMIT, if set.
    pub const fn limit_value(&self) -> Option<i64> {
        self.limit
    }

    /// Returns the OFFSET, if set.
    pub const fn offset_value(&self) -> Option<i64> {
        self.offset
    }

    /// Returns the explicit or inferred FROM target.
    pub fn from_target(&self) -> Option<FromTarget> {
        self.from
            .clone()
            .or_else(|| self.items.iter().find_map(SelectItem::source).map(FromTarget::Source))
    }

    /// Returns the projected fields, with tables and aliases expanded.
    pub fn projection(&self) -> Vec<Field> {
        self.items.iter().flat_map(SelectItem::fields).collect()
    }

    /// Registers the aliases of the projection, then those of the FROM
    /// target, with `aliases`.
    ///
    /// # Errors
    ///
    /// Returns [`DcormError::DuplicateAlias`] if two aliases claim one name.
    pub fn register_aliases(&self, aliases: &mut AliasManager) -> DcormResult<()> {
        let selected = self.items.iter().filter_map(|item| match item {
            SelectItem::Alias(alias) => Some(alias),
            _ => None,
        });
        aliases.register_aliases(selected)?;
        if let Some(from) = self.from_target() {
            aliases.register_aliases(from.sources().into_iter().filter_map(JoinSource::as_alias))?;
        }
        Ok(())
    }

    // ── Compilation ─────────────────────────────────────────────────

    /// Compiles this statement for `dialect`.
    ///
    /// # Errors
    ///
    /// Returns any construction or dialect error found while compiling.
    pub fn query(&self, dialect: &Dialect) -> DcormResult<(String, Vec<Value>)> {
        Engine::render(dialect, self)
    }

    /// Compiles this statement with values inlined, for display only.
    ///
    /// # Errors
    ///
    /// See [`SelectQuery::query`].
    pub fn query_string(&self, dialect: &Dialect) -> DcormResult<String> {
        let mut engine = Engine::new(dialect);
        engine.sql(self)?;
        Ok(engine.query_string())
    }

    fn take_from(&mut self) -> DcormResult<FromTarget> {
        self.from
            .take()
            .or_else(|| self.items.iter().find_map(SelectItem::source).map(FromTarget::Source))
            .ok_or_else(|| DcormError::IncompleteQuery("no FROM target to join onto".to_string()))
    }

    fn check_projection(&self, from: &FromTarget) -> DcormResult<()> {
        match self.items.iter().find(|item| !item.is_in(from)) {
            Some(missing) => Err(DcormError::IncompleteQuery(format!(
                "{missing} is selected but missing from the FROM clause"
            ))),
            None => Ok(()),
        }
    }

    fn compile_body(&self, engine: &mut Engine<'_>, from: &FromTarget) -> DcormResult<()> {
        engine.literal(keywords::SELECT);
        if self.distinct {
            engine.literal(keywords::DISTINCT);
        }
        if self.items.is_empty() {
            engine.literal(keywords::STAR);
        } else {
            engine.comma_separated(self.projection().iter())?;
        }
        engine.literal(keywords::FROM).sql(from)?;

        match self.where_clause.as_bool() {
            Some(true) => {}
            Some(false) => {
                engine.literal(keywords::WHERE).literal(keywords::ALWAYS_FALSE);
            }
            None => {
                engine.literal(keywords::WHERE).sql(&self.where_clause)?;
            }
        }

        if !self.order_by.is_empty() {
            engine.literal(keywords::ORDER_BY).comma_separated(self.order_by.iter())?;
        }
        compile_limits(engine, self.limit, self.offset)?;
        if self.for_update {
            engine.literal(keywords::FOR_UPDATE);
        }
        Ok(())
    }
}

impl Compile for SelectQuery {
    fn compile(&self, engine: &mut Engine<'_>) -> DcormResult<()> {
        if self.for_update && !engine.dialect().for_update {
            return Err(engine.dialect().not_supported("FOR UPDATE"));
        }
        let from = self
            .from_target()
            .ok_or_else(|| DcormError::IncompleteQuery("SELECT without a FROM target".to_string()))?;
        self.check_projection(&from)?;

        let mut aliases = engine.nested_alias_manager();
        self.register_aliases(&mut aliases)?;
        engine.with_alias_scope(aliases, |engine| self.compile_body(engine, &from))
    }
}

/// Replaces `slot` with `value`, warning when it already held one.
pub(crate) fn replace_with_warning(slot: &mut Option<i64>, value: i64, clause: &str) {
    if let Some(previous) = slot.replace(value) {
        tracing::warn!("Overriding previous {clause} of {previous}");
    }
}

/// Appends LIMIT/OFFSET, binding both counts as parameters.
///
/// An OFFSET without a LIMIT uses the dialect's `limit_max` when it has one.
pub(crate) fn compile_limits(
    engine: &mut Engine<'_>,
    limit: Option<i64>,
    offset: Option<i64>,
) -> DcormResult<()> {
    let limit = limit.or_else(|| offset.and(engine.dialect().limit_max));
    if let Some(limit) = limit {
        engine.literal(keywords::LIMIT).value(&Value::Int(limit))?;
    }
    if let Some(offset) = offset {
        engine.literal(keywords::OFFSET).value(&Value::Int(offset))?;
    }
    Ok(())
}
