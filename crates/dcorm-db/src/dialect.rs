//! Per-database rendering rules.
//!
//! A [`Dialect`] is the bag of knobs the compilation engine consults whenever
//! output differs between databases: the parameter placeholder, identifier
//! quoting, operator substitutions, type names and which optional clauses the
//! database accepts. Presets exist for SQLite, PostgreSQL and MySQL.

use std::collections::HashMap;

use dcorm_core::DcormError;

use crate::fields::ColumnType;
use crate::query::literal::Literal;
use crate::query::operators::Operator;

/// Parameter placeholder styles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamStyle {
    /// `?` for every parameter (SQLite, generic).
    QuestionMark,
    /// `$1, $2, ...` (PostgreSQL).
    Numbered,
    /// `%s` for every parameter (MySQL client libraries).
    Format,
}

/// Parenthesization of the operands of a compound query (`UNION` etc.).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsqParens {
    /// Operands are never wrapped.
    Never,
    /// Every operand is wrapped.
    Always,
    /// Only operands that are themselves compound queries are wrapped.
    Unnested,
}

/// Database-specific rendering rules.
///
/// # Examples
///
/// ```
/// use dcorm_db::dialect::Dialect;
///
/// let pg = Dialect::postgres();
/// assert_eq!(pg.placeholder(2), "$2");
/// assert_eq!(pg.quote("user"), "\"user\"");
///
/// let mysql = Dialect::mysql();
/// assert_eq!(mysql.quote("order"), "`order`");
/// ```
#[derive(Debug, Clone)]
pub struct Dialect {
    /// Dialect name, used in diagnostics.
    pub name: String,
    /// Placeholder style for bound parameters.
    pub param: ParamStyle,
    /// Opening and closing identifier quote characters.
    pub quotes: (char, char),
    /// Compound query operand parenthesization.
    pub csq_parens: CsqParens,
    /// Whether `SELECT ... FOR UPDATE` is accepted.
    pub for_update: bool,
    /// LIMIT value emitted when only an OFFSET is requested.
    pub limit_max: Option<i64>,
    /// Whether `NULLS FIRST` / `NULLS LAST` is accepted in ORDER BY.
    pub nulls_ordering: bool,
    /// Operator renderings that differ from the default.
    pub operators: HashMap<Operator, Literal>,
    /// Column type names that differ from the default.
    pub field_types: HashMap<ColumnType, &'static str>,
}

impl Default for Dialect {
    fn default() -> Self {
        Self::generic()
    }
}

impl Dialect {
    /// A standard-SQL dialect with `?` placeholders and no optional clauses.
    pub fn generic() -> Self {
        Self {
            name: "generic".to_string(),
            param: ParamStyle::QuestionMark,
            quotes: ('"', '"'),
            csq_parens: CsqParens::Never,
            for_update: false,
            limit_max: None,
            nulls_ordering: false,
            operators: HashMap::new(),
            field_types: HashMap::new(),
        }
    }

    /// SQLite.
    pub fn sqlite() -> Self {
        Self {
            name: "sqlite".to_string(),
            csq_parens: CsqParens::Unnested,
            limit_max: Some(-1),
            nulls_ordering: true,
            operators: HashMap::from([(Operator::ILike, Literal::binary("LIKE"))]),
            field_types: HashMap::from([
                (ColumnType::Bool, "INTEGER"),
                (ColumnType::Uuid, "TEXT"),
            ]),
            ..Self::generic()
        }
    }

    /// PostgreSQL.
    pub fn postgres() -> Self {
        Self {
            name: "postgresql".to_string(),
            param: ParamStyle::Numbered,
            csq_parens: CsqParens::Always,
            for_update: true,
            nulls_ordering: true,
            field_types: HashMap::from([
                (ColumnType::Auto, "SERIAL"),
                (ColumnType::BigAuto, "BIGSERIAL"),
                (ColumnType::Blob, "BYTEA"),
                (ColumnType::DateTime, "TIMESTAMP"),
                (ColumnType::Decimal, "NUMERIC"),
                (ColumnType::Double, "DOUBLE PRECISION"),
                (ColumnType::Uuid, "UUID"),
                (ColumnType::UuidBinary, "BYTEA"),
            ]),
            ..Self::generic()
        }
    }

    /// MySQL.
    pub fn mysql() -> Self {
        Self {
            name: "mysql".to_string(),
            param: ParamStyle::Format,
            quotes: ('`', '`'),
            csq_parens: CsqParens::Always,
            for_update: true,
            limit_max: Some(i64::MAX),
            operators: HashMap::from([
                (Operator::ILike, Literal::binary("LIKE")),
                (Operator::Xor, Literal::binary("XOR")),
            ]),
            field_types: HashMap::from([
                (ColumnType::Auto, "INTEGER AUTO_INCREMENT"),
                (ColumnType::BigAuto, "BIGINT AUTO_INCREMENT"),
                (ColumnType::Bool, "BOOL"),
                (ColumnType::Double, "DOUBLE PRECISION"),
                (ColumnType::Float, "FLOAT"),
                (ColumnType::Uuid, "VARCHAR(40)"),
                (ColumnType::UuidBinary, "VARBINARY(16)"),
            ]),
            ..Self::generic()
        }
    }

    /// Resolves a dialect from an engine name as found in settings.
    ///
    /// Dotted paths are accepted; only the last segment is considered.
    ///
    /// # Errors
    ///
    /// Returns [`DcormError::ImproperlyConfigured`] for unknown engines.
    pub fn from_engine(engine: &str) -> Result<Self, DcormError> {
        let name = engine.rsplit('.').next().unwrap_or(engine).to_lowercase();
        match name.as_str() {
            "" | "generic" => Ok(Self::generic()),
            "sqlite" | "sqlite3" => Ok(Self::sqlite()),
            "postgres" | "postgresql" | "psycopg2" => Ok(Self::postgres()),
            "mysql" => Ok(Self::mysql()),
            _ => Err(DcormError::ImproperlyConfigured(format!(
                "Unknown database engine '{engine}'"
            ))),
        }
    }

    /// Quotes an identifier, doubling any embedded closing quote character.
    pub fn quote(&self, name: &str) -> String {
        let (open, close) = self.quotes;
        let mut quoted = String::with_capacity(name.len() + 2);
        quoted.push(open);
        for ch in name.chars() {
            if ch == close {
                quoted.push(close);
            }
            quoted.push(ch);
        }
        quoted.push(close);
        quoted
    }

    /// Returns the placeholder for the given 1-based parameter index.
    pub fn placeholder(&self, index: usize) -> String {
        match self.param {
            ParamStyle::QuestionMark => "?".to_string(),
            ParamStyle::Numbered => format!("${index}"),
            ParamStyle::Format => "%s".to_string(),
        }
    }

    /// Returns the rendering of `op`, honoring the substitution table.
    pub fn operator(&self, op: Operator) -> Literal {
        self.operators.get(&op).copied().unwrap_or_else(|| op.literal())
    }

    /// Returns the DDL type name of a column type.
    pub fn column_type_name(&self, ty: ColumnType) -> &'static str {
        self.field_types
            .get(&ty)
            .copied()
            .unwrap_or_else(|| ty.default_name())
    }

    /// Builds the error for a feature this dialect lacks.
    pub fn not_supported(&self, feature: &str) -> DcormError {
        DcormError::NotSupported {
            dialect: self.name.clone(),
            feature: feature.to_string(),
        }
    }
}
