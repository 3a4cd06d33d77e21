//! Expression trees.
//!
//! An [`Expression`] is a value, a field reference, a sub-query or an
//! [`Operation`] over other expressions. Operations can only be built through
//! the [`Combinable`] methods (or the `std::ops` operators layered on top of
//! them), so every node has the operand count its operator requires.
//!
//! Construction applies a few rewrites so compiled SQL is always correct:
//!
//! - `AND`/`OR` fold boolean constants away (`x AND true` is `x`,
//!   `x OR true` is `true`, `x AND false` is `false`).
//! - `equals`/`not_equals` against NULL become `IS`/`IS NOT`.
//! - `NOT NOT x` collapses to `x`.

use std::ops;

use dcorm_core::DcormResult;

use super::engine::{Compile, Engine};
use super::operators::Operator;
use super::ordering::{Direction, OrderedField};
use super::select::SelectQuery;
use crate::fields::Field;
use crate::value::Value;

/// A node of an expression tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Expression {
    /// A constant operand.
    Value(Value),
    /// A column reference.
    Field(Field),
    /// A parenthesized sub-query.
    Query(Box<SelectQuery>),
    /// An operator applied to one or two operands.
    Operation(Operation),
}

/// An operator applied to its operands.
///
/// Unary operators have no right-hand side.
#[derive(Debug, Clone, PartialEq)]
pub struct Operation {
    lhs: Box<Expression>,
    op: Operator,
    rhs: Option<Box<Expression>>,
}

impl Operation {
    /// Returns the left operand.
    pub fn lhs(&self) -> &Expression {
        &self.lhs
    }

    /// Returns the operator joining the operands.
    pub const fn operator(&self) -> Operator {
        self.op
    }

    /// Returns the right operand; `None` for unary operators.
    pub fn rhs(&self) -> Option<&Expression> {
        self.rhs.as_deref()
    }

    fn operand(&self, engine: &mut Engine<'_>, child: &Expression, right: bool) -> DcormResult<()> {
        match child {
            Expression::Operation(inner) if self.op.needs_parens(inner.op, right) => {
                engine.parens(|e| inner.compile(e))?;
            }
            _ => {
                engine.sql(child)?;
            }
        }
        Ok(())
    }
}

impl Compile for Operation {
    fn compile(&self, engine: &mut Engine<'_>) -> DcormResult<()> {
        if self.op.is_unary() {
            engine.operator(self.op);
            return self.operand(engine, &self.lhs, false);
        }
        self.operand(engine, &self.lhs, false)?;
        engine.operator(self.op);
        if let Some(rhs) = &self.rhs {
            self.operand(engine, rhs, true)?;
        }
        Ok(())
    }
}

impl Expression {
    /// The boolean constant `true`, the neutral start of a WHERE clause.
    pub const TRUE: Self = Self::Value(Value::Bool(true));
    /// The boolean constant `false`.
    pub const FALSE: Self = Self::Value(Value::Bool(false));

    /// Returns the constant if this expression is a boolean literal.
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Value(Value::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Returns `true` for the NULL constant.
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Value(Value::Null))
    }

    /// Returns the operation, if this expression is one.
    pub const fn as_operation(&self) -> Option<&Operation> {
        match self {
            Self::Operation(op) => Some(op),
            _ => None,
        }
    }

    fn binary(lhs: Self, op: Operator, rhs: Self) -> Self {
        Self::Operation(Operation {
            lhs: Box::new(lhs),
            op,
            rhs: Some(Box::new(rhs)),
        })
    }

    fn unary(op: Operator, operand: Self) -> Self {
        Self::Operation(Operation {
            lhs: Box::new(operand),
            op,
            rhs: None,
        })
    }

    /// Ascending ordering on this expression.
    pub fn asc(self) -> OrderedField {
        OrderedField::new(self, Direction::Asc)
    }

    /// Descending ordering on this expression.
    pub fn desc(self) -> OrderedField {
        OrderedField::new(self, Direction::Desc)
    }
}

impl Compile for Expression {
    fn compile(&self, engine: &mut Engine<'_>) -> DcormResult<()> {
        match self {
            Self::Value(value) => engine.sql(value)?,
            Self::Field(field) => engine.sql(field)?,
            Self::Query(query) => engine.parens(|e| query.compile(e))?,
            Self::Operation(operation) => engine.sql(operation)?,
        };
        Ok(())
    }
}

// ── Builder protocol ───────────────────────────────────────────────────

/// Expression-building methods shared by every expression-capable type.
///
/// # Examples
///
/// ```
/// use dcorm_db::query::expressions::{Combinable, Expression};
/// use dcorm_db::value::Value;
///
/// let x = Expression::from(1).less_than(2);
/// assert_eq!(x.clone().and_(Expression::TRUE), x);
/// assert_eq!(x.clone().or_(true), Expression::TRUE);
/// assert_eq!(x.clone().not_().not_(), x);
/// ```
pub trait Combinable: Into<Expression> + Sized {
    /// `self = rhs`, or `self IS NULL` when `rhs` is NULL.
    fn equals(self, rhs: impl Into<Expression>) -> Expression {
        let rhs = rhs.into();
        let op = if rhs.is_null() { Operator::Is } else { Operator::Eq };
        Expression::binary(self.into(), op, rhs)
    }

    /// `self <> rhs`, or `self IS NOT NULL` when `rhs` is NULL.
    fn not_equals(self, rhs: impl Into<Expression>) -> Expression {
        let rhs = rhs.into();
        let op = if rhs.is_null() { Operator::IsNot } else { Operator::Ne };
        Expression::binary(self.into(), op, rhs)
    }

    fn less_than(self, rhs: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::Lt, rhs.into())
    }

    fn less_or_equal(self, rhs: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::Le, rhs.into())
    }

    fn greater_than(self, rhs: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::Gt, rhs.into())
    }

    fn greater_or_equal(self, rhs: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::Ge, rhs.into())
    }

    /// Membership in a value list or sub-query.
    fn in_(self, rhs: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::In, rhs.into())
    }

    fn not_in(self, rhs: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::NotIn, rhs.into())
    }

    fn is_(self, rhs: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::Is, rhs.into())
    }

    fn is_not(self, rhs: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::IsNot, rhs.into())
    }

    fn like(self, pattern: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::Like, pattern.into())
    }

    fn ilike(self, pattern: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::ILike, pattern.into())
    }

    fn concat(self, rhs: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::Concat, rhs.into())
    }

    fn plus(self, rhs: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::Add, rhs.into())
    }

    fn minus(self, rhs: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::Sub, rhs.into())
    }

    fn times(self, rhs: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::Mul, rhs.into())
    }

    fn divided_by(self, rhs: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::Div, rhs.into())
    }

    fn modulo(self, rhs: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::Mod, rhs.into())
    }

    fn bit_and(self, rhs: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::BitAnd, rhs.into())
    }

    fn bit_or(self, rhs: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::BitOr, rhs.into())
    }

    fn bit_xor(self, rhs: impl Into<Expression>) -> Expression {
        Expression::binary(self.into(), Operator::Xor, rhs.into())
    }

    fn bit_not(self) -> Expression {
        Expression::unary(Operator::BitwiseNegation, self.into())
    }

    /// Logical AND with constant folding.
    fn and_(self, rhs: impl Into<Expression>) -> Expression {
        let (lhs, rhs) = (self.into(), rhs.into());
        match (lhs.as_bool(), rhs.as_bool()) {
            (Some(true), _) => rhs,
            (_, Some(true)) => lhs,
            (Some(false), _) | (_, Some(false)) => Expression::FALSE,
            (None, None) => Expression::binary(lhs, Operator::And, rhs),
        }
    }

    /// Logical OR with constant folding.
    fn or_(self, rhs: impl Into<Expression>) -> Expression {
        let (lhs, rhs) = (self.into(), rhs.into());
        match (lhs.as_bool(), rhs.as_bool()) {
            (Some(true), _) | (_, Some(true)) => Expression::TRUE,
            (Some(false), _) => rhs,
            (_, Some(false)) => lhs,
            (None, None) => Expression::binary(lhs, Operator::Or, rhs),
        }
    }

    /// Logical NOT; cancels an existing NOT and flips boolean constants.
    fn not_(self) -> Expression {
        match self.into() {
            Expression::Operation(Operation {
                lhs,
                op: Operator::Not,
                ..
            }) => *lhs,
            Expression::Value(Value::Bool(b)) => Expression::Value(Value::Bool(!b)),
            other => Expression::unary(Operator::Not, other),
        }
    }
}

impl Combinable for Expression {}
impl Combinable for Field {}

// ── Conversions ────────────────────────────────────────────────────────

impl From<Field> for Expression {
    fn from(field: Field) -> Self {
        Self::Field(field)
    }
}

impl From<SelectQuery> for Expression {
    fn from(query: SelectQuery) -> Self {
        Self::Query(Box::new(query))
    }
}

impl From<Value> for Expression {
    fn from(value: Value) -> Self {
        Self::Value(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Expression {
    fn from(value: Option<T>) -> Self {
        Self::Value(value.into())
    }
}

macro_rules! value_expression {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for Expression {
                fn from(value: $ty) -> Self {
                    Self::Value(Value::from(value))
                }
            }
        )*
    };
}

value_expression!(
    bool,
    i32,
    i64,
    f64,
    String,
    &str,
    Vec<u8>,
    Vec<Value>,
    chrono::NaiveDate,
    chrono::NaiveDateTime,
    chrono::DateTime<chrono::Utc>,
    chrono::NaiveTime,
    uuid::Uuid,
);

// ── Operator sugar ─────────────────────────────────────────────────────

macro_rules! operator_sugar {
    ($($ty:ty),*) => {
        $(
            impl<T: Into<Expression>> ops::Add<T> for $ty {
                type Output = Expression;
                fn add(self, rhs: T) -> Expression {
                    self.plus(rhs)
                }
            }

            impl<T: Into<Expression>> ops::Sub<T> for $ty {
                type Output = Expression;
                fn sub(self, rhs: T) -> Expression {
                    self.minus(rhs)
                }
            }

            impl<T: Into<Expression>> ops::Mul<T> for $ty {
                type Output = Expression;
                fn mul(self, rhs: T) -> Expression {
                    self.times(rhs)
                }
            }

            impl<T: Into<Expression>> ops::Div<T> for $ty {
                type Output = Expression;
                fn div(self, rhs: T) -> Expression {
                    self.divided_by(rhs)
                }
            }

            impl<T: Into<Expression>> ops::Rem<T> for $ty {
                type Output = Expression;
                fn rem(self, rhs: T) -> Expression {
                    self.modulo(rhs)
                }
            }

            /// `a & b` is logical AND.
            impl<T: Into<Expression>> ops::BitAnd<T> for $ty {
                type Output = Expression;
                fn bitand(self, rhs: T) -> Expression {
                    self.and_(rhs)
                }
            }

            /// `a | b` is logical OR.
            impl<T: Into<Expression>> ops::BitOr<T> for $ty {
                type Output = Expression;
                fn bitor(self, rhs: T) -> Expression {
                    self.or_(rhs)
                }
            }

            impl ops::Not for $ty {
                type Output = Expression;
                fn not(self) -> Expression {
                    self.not_()
                }
            }
        )*
    };
}

operator_sugar!(Expression, Field);
