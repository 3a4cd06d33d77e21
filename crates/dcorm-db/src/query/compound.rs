//! Compound queries (`UNION`, `INTERSECT`, `EXCEPT`).

use dcorm_core::DcormResult;

use super::engine::{Compile, Engine};
use super::literal::{keywords, Literal};
use super::ordering::OrderedField;
use super::select::{compile_limits, replace_with_warning, SelectQuery};
use crate::dialect::{CsqParens, Dialect};
use crate::value::Value;

/// Set operator joining two queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompoundOp {
    Union,
    UnionAll,
    Intersect,
    Except,
}

impl CompoundOp {
    /// Returns the set operation keyword.
    pub const fn literal(self) -> Literal {
        match self {
            Self::Union => Literal::binary("UNION"),
            Self::UnionAll => Literal::binary("UNION ALL"),
            Self::Intersect => Literal::binary("INTERSECT"),
            Self::Except => Literal::binary("EXCEPT"),
        }
    }
}

/// One side of a compound query.
#[derive(Debug, Clone, PartialEq)]
pub enum CompoundOperand {
    Select(Box<SelectQuery>),
    Compound(Box<CompoundSelect>),
}

impl CompoundOperand {
    fn wrapped(&self, parens: CsqParens) -> bool {
        match parens {
            CsqParens::Never => false,
            CsqParens::Always => true,
            CsqParens::Unnested => matches!(self, Self::Compound(_)),
        }
    }
}

impl From<SelectQuery> for CompoundOperand {
    fn from(query: SelectQuery) -> Self {
        Self::Select(Box::new(query))
    }
}

impl From<CompoundSelect> for CompoundOperand {
    fn from(query: CompoundSelect) -> Self {
        Self::Compound(Box::new(query))
    }
}

impl Compile for CompoundOperand {
    fn compile(&self, engine: &mut Engine<'_>) -> DcormResult<()> {
        let wrapped = self.wrapped(engine.dialect().csq_parens);
        let inner = |engine: &mut Engine<'_>| match self {
            Self::Select(query) => query.compile(engine),
            Self::Compound(query) => query.compile(engine),
        };
        if wrapped {
            engine.parens(inner)?;
        } else {
            inner(engine)?;
        }
        Ok(())
    }
}

/// Two queries joined by a set operator, with optional ordering and limits
/// applied to the combined result.
///
/// Each operand keeps its own alias scope, so generated alias names may repeat
/// across operands.
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
///
/// static TAG: LazyLock<ModelMeta> = LazyLock::new(|| {
///     ModelMeta::new("tag", vec![FieldDef::new("name", ColumnType::Text)])
/// });
///
/// let name = TAG.field("name").unwrap();
/// let query = select([name.clone()])
///     .where_(name.clone().equals("a"))
///     .union(select([name.clone()]).where_(name.equals("b")));
/// let (sql, _) = query.query(&Dialect::generic()).unwrap();
/// assert_eq!(
///     sql,
///     "SELECT \"tag\".\"name\" FROM \"tag\" WHERE \"tag\".\"name\" = ? \
///      UNION SELECT \"tag\".\"name\" FROM \"tag\" WHERE \"tag\".\"name\" = ?"
/// );
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct CompoundSelect {
    lhs: CompoundOperand,
    op: CompoundOp,
    rhs: CompoundOperand,
    order_by: Vec<OrderedField>,
    limit: Option<i64>,
    offset: Option<i64>,
}

impl CompoundSelect {
    /// Combines `lhs` and `rhs` with `op`.
    pub fn new(
        lhs: impl Into<CompoundOperand>,
        op: CompoundOp,
        rhs: impl Into<CompoundOperand>,
    ) -> Self {
        Self {
            lhs: lhs.into(),
            op,
            rhs: rhs.into(),
            order_by: Vec::new(),
            limit: None,
            offset: None,
        }
    }

    /// Chains a `UNION` with `other`.
    pub fn union(self, other: impl Into<CompoundOperand>) -> Self {
        Self::new(self, CompoundOp::Union, other)
    }

    /// Chains a `UNION ALL` with `other`.
    pub fn union_all(self, other: impl Into<CompoundOperand>) -> Self {
        Self::new(self, CompoundOp::UnionAll, other)
    }

    /// Chains an `INTERSECT` with `other`.
    pub fn intersect(self, other: impl Into<CompoundOperand>) -> Self {
        Self::new(self, CompoundOp::Intersect, other)
    }

    /// Chains an `EXCEPT` with `other`.
    pub fn except(self, other: impl Into<CompoundOperand>) -> Self {
        Self::new(self, CompoundOp::Except, other)
    }

    /// Orders the combined result, replacing (with a warning) earlier terms.
    ///
    /// Columns are rendered by name alone, since a compound result only
    /// exposes its output column names.
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

    #[must_use]
    pub fn limit(mut self, limit: i64) -> Self {
        replace_with_warning(&mut self.limit, limit, "limit");
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: i64) -> Self {
        replace_with_warning(&mut self.offset, offset, "offset");
        self
    }

    /// Returns the set operation.
    pub const fn op(&self) -> CompoundOp {
        self.op
    }

    /// Returns the left operand.
    pub const fn lhs(&self) -> &CompoundOperand {
        &self.lhs
    }

    /// Returns the right operand.
    pub const fn rhs(&self) -> &CompoundOperand {
        &self.rhs
    }

    /// Compiles this statement for `dialect`.
    ///
    /// # Errors
    ///
    /// Returns the first error raised by either operand.
    pub fn query(&self, dialect: &Dialect) -> DcormResult<(String, Vec<Value>)> {
        Engine::render(dialect, self)
    }
}

impl Compile for CompoundSelect {
    fn compile(&self, engine: &mut Engine<'_>) -> DcormResult<()> {
        engine
            .sql(&self.lhs)?
            .literal(self.op.literal())
            .sql(&self.rhs)?;
        if !self.order_by.is_empty() {
            engine.literal(keywords::ORDER_BY);
            engine.with_bare_columns(|e| e.comma_separated(self.order_by.iter()).map(|_| ()))?;
        }
        compile_limits(engine, self.limit, self.offset)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;
    use crate::fields::{ColumnType, Field, FieldDef};
    use crate::model::ModelMeta;
    use crate::query::expressions::Combinable;
    use crate::query::select::select;

    static ITEM: LazyLock<ModelMeta> = LazyLock::new(|| {
        ModelMeta::new(
            "item",
            vec![
                FieldDef::new("id", ColumnType::Auto).primary_key(),
                FieldDef::new("price", ColumnType::Int),
            ],
        )
    });

    fn id() -> Field {
        ITEM.field("id").unwrap()
    }

    fn cheap() -> SelectQuery {
        select([id()]).where_(ITEM.field("price").unwrap().less_than(10))
    }

    fn pricey() -> SelectQuery {
        select([id()]).where_(ITEM.field("price").unwrap().greater_than(100))
    }

    #[test]
    fn test_postgres_wraps_every_operand() {
        let (sql, values) = cheap().union_all(pricey()).query(&Dialect::postgres()).unwrap();
        assert_eq!(
            sql,
            "(SELECT \"item\".\"id\" FROM \"item\" WHERE \"item\".\"price\" < $1) UNION ALL \
             (SELECT \"item\".\"id\" FROM \"item\" WHERE \"item\".\"price\" > $2)"
        );
        assert_eq!(values, vec![Value::Int(10), Value::Int(100)]);
    }

    #[test]
    fn test_unnested_wraps_only_compound_operands() {
        let query = cheap().intersect(pricey().except(cheap()));
        let (sql, values) = query.query(&Dialect::sqlite()).unwrap();
        assert!(sql.starts_with("SELECT \"item\".\"id\""));
        assert!(sql.contains(" INTERSECT (SELECT "));
        assert!(sql.contains(" EXCEPT SELECT "));
        assert!(sql.ends_with("< ?)"));
        assert_eq!(values.len(), 3);
    }

    #[test]
    fn test_order_and_limit_apply_to_whole_result() {
        let query = cheap().union(pricey()).order_by([id().desc()]).limit(5);
        let (sql, values) = query.query(&Dialect::generic()).unwrap();
        assert!(sql.ends_with(" UNION SELECT \"item\".\"id\" FROM \"item\" WHERE \"item\".\"price\" > ? \
             ORDER BY \"id\" DESC LIMIT ?"));
        assert_eq!(values, vec![Value::Int(10), Value::Int(100), Value::Int(5)]);
    }

    #[test]
    fn test_operand_errors_propagate() {
        let query = cheap().union(select([id()]).for_update());
        assert!(query.query(&Dialect::sqlite()).is_err());
    }

    #[test]
    fn test_op_keywords() {
        assert_eq!(CompoundOp::UnionAll.literal().keyword(), "UNION ALL");
        assert_eq!(cheap().except(pricey()).op(), CompoundOp::Except);
    }
}
