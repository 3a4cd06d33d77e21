//! Fixed SQL keyword tokens.
//!
//! A [`Literal`] is a piece of SQL syntax (keyword, operator or punctuation)
//! together with its spacing rules. Literals are the only text the engine
//! appends verbatim, so they are `'static` and can never carry user data.

use std::fmt;

/// An SQL keyword with spacing rules.
///
/// Spacing is fixed when the keyword is defined: binary keywords get a space
/// on both sides, unary (prefix) keywords only a trailing one and suffix
/// keywords only a leading one. Adjacent fragments therefore never collide and
/// never double up on spaces.
///
/// # Examples
///
/// ```
/// use dcorm_db::query::literal::Literal;
///
/// assert_eq!(Literal::binary("AND").to_string(), " AND ");
/// assert_eq!(Literal::unary("NOT").to_string(), "NOT ");
/// assert_eq!(Literal::suffix("DESC").to_string(), " DESC");
/// assert_eq!(Literal::new("(").to_string(), "(");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Literal {
    keyword: &'static str,
    space_left: bool,
    space_right: bool,
}

impl Literal {
    /// A literal rendered without surrounding spaces.
    pub const fn new(keyword: &'static str) -> Self {
        Self {
            keyword,
            space_left: false,
            space_right: false,
        }
    }

    /// A literal for a binary operator or infix keyword.
    pub const fn binary(keyword: &'static str) -> Self {
        Self {
            keyword,
            space_left: true,
            space_right: true,
        }
    }

    /// A literal for a unary operator or leading keyword.
    pub const fn unary(keyword: &'static str) -> Self {
        Self {
            keyword,
            space_left: false,
            space_right: true,
        }
    }

    /// A literal that trails the fragment before it.
    pub const fn suffix(keyword: &'static str) -> Self {
        Self {
            keyword,
            space_left: true,
            space_right: false,
        }
    }

    /// Returns the bare keyword text.
    pub const fn keyword(&self) -> &'static str {
        self.keyword
    }

    /// Renders the keyword with its spacing.
    pub fn render(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.space_left {
            f.write_str(" ")?;
        }
        f.write_str(self.keyword)?;
        if self.space_right {
            f.write_str(" ")?;
        }
        Ok(())
    }
}

/// Keywords used by statement assembly.
pub mod keywords {
    use super::Literal;

    pub const SELECT: Literal = Literal::unary("SELECT");
    pub const DISTINCT: Literal = Literal::unary("DISTINCT");
    pub const STAR: Literal = Literal::new("*");
    pub const FROM: Literal = Literal::binary("FROM");
    pub const WHERE: Literal = Literal::binary("WHERE");
    pub const ORDER_BY: Literal = Literal::binary("ORDER BY");
    pub const LIMIT: Literal = Literal::binary("LIMIT");
    pub const OFFSET: Literal = Literal::binary("OFFSET");
    pub const FOR_UPDATE: Literal = Literal::suffix("FOR UPDATE");
    pub const AS: Literal = Literal::binary("AS");
    pub const ON: Literal = Literal::binary("ON");
    pub const ASC: Literal = Literal::suffix("ASC");
    pub const DESC: Literal = Literal::suffix("DESC");
    pub const NULLS_FIRST: Literal = Literal::suffix("NULLS FIRST");
    pub const NULLS_LAST: Literal = Literal::suffix("NULLS LAST");
    pub const NULL: Literal = Literal::new("NULL");
    pub const ALWAYS_FALSE: Literal = Literal::new("1 = 0");
    pub const COMMA: Literal = Literal::unary(",");
    pub const OPEN_PAREN: Literal = Literal::new("(");
    pub const CLOSE_PAREN: Literal = Literal::new(")");
}
