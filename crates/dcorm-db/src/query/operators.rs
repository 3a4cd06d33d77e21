//! Expression operators.
//!
//! [`Operator`] is the closed set of operators an expression node can carry.
//! Each maps to one [`Literal`] through a static table; a dialect may replace
//! individual renderings through its substitution map without any change to
//! the expression tree.

use super::literal::Literal;

/// Query operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Logical conjunction.
    And,
    /// Logical disjunction.
    Or,
    /// Logical negation (unary).
    Not,
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Bitwise AND.
    BitAnd,
    /// Bitwise OR.
    BitOr,
    /// Bitwise exclusive OR.
    Xor,
    /// Modulo.
    Mod,
    /// Equality.
    Eq,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
    /// Inequality.
    Ne,
    /// Membership.
    In,
    /// Negated membership.
    NotIn,
    /// Identity comparison (used for NULL).
    Is,
    /// Negated identity comparison.
    IsNot,
    /// Pattern match.
    Like,
    /// Case-insensitive pattern match.
    ILike,
    /// String concatenation.
    Concat,
    /// Bitwise negation (unary).
    BitwiseNegation,
}

/// Associativity of an operator relative to operators of equal precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    /// `a op b op c` means `(a op b) op c`.
    Left,
    /// Chaining is not portable; equal-precedence children are always
    /// parenthesized.
    None,
}

impl Operator {
    /// Returns the default SQL rendering of this operator.
    pub const fn literal(self) -> Literal {
        match self {
            Self::And => Literal::binary("AND"),
            Self::Or => Literal::binary("OR"),
            Self::Not => Literal::unary("NOT"),
            Self::Add => Literal::binary("+"),
            Self::Sub => Literal::binary("-"),
            Self::Mul => Literal::binary("*"),
            Self::Div => Literal::binary("/"),
            Self::BitAnd => Literal::binary("&"),
            Self::BitOr => Literal::binary("|"),
            Self::Xor => Literal::binary("#"),
            Self::Mod => Literal::binary("%"),
            Self::Eq => Literal::binary("="),
            Self::Lt => Literal::binary("<"),
            Self::Le => Literal::binary("<="),
            Self::Gt => Literal::binary(">"),
            Self::Ge => Literal::binary(">="),
            Self::Ne => Literal::binary("<>"),
            Self::In => Literal::binary("IN"),
            Self::NotIn => Literal::binary("NOT IN"),
            Self::Is => Literal::binary("IS"),
            Self::IsNot => Literal::binary("IS NOT"),
            Self::Like => Literal::binary("LIKE"),
            Self::ILike => Literal::binary("ILIKE"),
            Self::Concat => Literal::binary("||"),
            Self::BitwiseNegation => Literal::new("~"),
        }
    }

    /// Returns `true` for operators that take no right-hand operand.
    pub const fn is_unary(self) -> bool {
        matches!(self, Self::Not | Self::BitwiseNegation)
    }

    /// Returns the binding strength of this operator. Higher binds tighter.
    pub const fn precedence(self) -> u8 {
        match self {
            Self::Or => 1,
            Self::And => 2,
            Self::Not => 3,
            Self::Eq
            | Self::Ne
            | Self::Lt
            | Self::Le
            | Self::Gt
            | Self::Ge
            | Self::In
            | Self::NotIn
            | Self::Is
            | Self::IsNot
            | Self::Like
            | Self::ILike => 4,
            Self::BitAnd | Self::BitOr | Self::Xor => 5,
            Self::Concat => 6,
            Self::Add | Self::Sub => 7,
            Self::Mul | Self::Div | Self::Mod => 8,
            Self::BitwiseNegation => 9,
        }
    }

    /// Returns how this operator groups with equal-precedence operators.
    pub const fn associativity(self) -> Associativity {
        match self.precedence() {
            4 | 5 => Associativity::None,
            _ => Associativity::Left,
        }
    }

    /// Returns `true` if a child operation using `child` must be wrapped in
    /// parentheses when it appears as an operand of `self`.
    ///
    /// `right` tells whether the child is the right-hand operand.
    pub const fn needs_parens(self, child: Self, right: bool) -> bool {
        if self.is_unary() {
            return child.precedence() < self.precedence()
                || (child.precedence() == self.precedence() && !child.is_unary());
        }
        let (parent, inner) = (self.precedence(), child.precedence());
        if inner != parent {
            return inner < parent;
        }
        right || matches!(self.associativity(), Associativity::None)
    }
}
