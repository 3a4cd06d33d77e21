//! Field type definitions.
//!
//! A [`FieldDef`] is the declared metadata of one model attribute: its name,
//! column type, optional column-name override, constraint markers, an
//! optional foreign-key [`Reference`] and an optional value converter. The
//! compiler only reads the name, column and reference; the markers are kept
//! for schema tooling.

use crate::model::ModelMeta;
use crate::value::Value;

/// The declared storage type of a column.
///
/// Each variant maps to a default SQL type name; dialects override names
/// through [`Dialect::field_types`](crate::dialect::Dialect::field_types).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum ColumnType {
    /// Auto-incrementing 32-bit integer primary key.
    Auto,
    /// Auto-incrementing 64-bit integer primary key.
    BigAuto,
    /// 64-bit signed integer.
    BigInt,
    /// Raw binary data.
    Blob,
    /// Boolean.
    Bool,
    /// Fixed-length string.
    Char,
    /// Date without time.
    Date,
    /// Date and time.
    DateTime,
    /// Fixed-precision decimal.
    Decimal,
    /// Double-precision float.
    Double,
    /// Single-precision float.
    Float,
    /// 32-bit signed integer.
    Int,
    /// 16-bit signed integer.
    SmallInt,
    /// Unlimited-length text.
    Text,
    /// Time without date.
    Time,
    /// UUID stored as text.
    Uuid,
    /// UUID stored as 16 raw bytes.
    UuidBinary,
    /// Variable-length string.
    VarChar,
}

impl ColumnType {
    /// Returns the generic SQL type name for this column type.
    pub const fn default_name(self) -> &'static str {
        match self {
            Self::Auto | Self::Int => "INTEGER",
            Self::BigAuto | Self::BigInt => "BIGINT",
            Self::Blob | Self::UuidBinary => "BLOB",
            Self::Bool => "BOOLEAN",
            Self::Char => "CHAR",
            Self::Date => "DATE",
            Self::DateTime => "DATETIME",
            Self::Decimal => "DECIMAL",
            Self::Double | Self::Float => "REAL",
            Self::SmallInt => "SMALLINT",
            Self::Text | Self::Uuid => "TEXT",
            Self::Time => "TIME",
            Self::VarChar => "VARCHAR",
        }
    }
}

/// A foreign-key reference to an attribute of another model.
///
/// The target model is held as a function so a model may reference itself
/// from inside its own lazily initialized metadata.
#[derive(Debug, Clone, Copy)]
pub struct Reference {
    /// Returns the referenced model's metadata.
    pub model: fn() -> &'static ModelMeta,
    /// The referenced attribute name.
    pub field: &'static str,
}

impl Reference {
    /// Returns the referenced model's metadata.
    pub fn target(&self) -> &'static ModelMeta {
        (self.model)()
    }
}

/// Metadata of a declared model attribute.
#[derive(Debug, Clone)]
pub struct FieldDef {
    /// The attribute name.
    pub name: &'static str,
    /// The database column name, when it differs from `name`.
    pub column: Option<String>,
    /// The declared column type.
    pub column_type: ColumnType,
    /// Whether this attribute is the primary key.
    pub primary_key: bool,
    /// Whether NULL is allowed.
    pub null: bool,
    /// Whether a UNIQUE constraint applies.
    pub unique: bool,
    /// Whether a database index should be created.
    pub db_index: bool,
    /// Foreign-key target, if any.
    pub references: Option<Reference>,
    /// Conversion applied to values assigned to this attribute.
    pub converter: Option<fn(Value) -> Value>,
}

impl FieldDef {
    /// Creates a new `FieldDef` with no markers, reference or converter.
    pub const fn new(name: &'static str, column_type: ColumnType) -> Self {
        Self {
            name,
            column: None,
            column_type,
            primary_key: false,
            null: false,
            unique: false,
            db_index: false,
            references: None,
            converter: None,
        }
    }

    /// Sets the database column name.
    #[must_use]
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Marks this attribute as the primary key.
    #[must_use]
    pub const fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    /// Allows NULL values.
    #[must_use]
    pub const fn nullable(mut self) -> Self {
        self.null = true;
        self
    }

    /// Marks this attribute as UNIQUE.
    #[must_use]
    pub const fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Marks this attribute as indexed.
    #[must_use]
    pub const fn db_index(mut self) -> Self {
        self.db_index = true;
        self
    }

    /// Declares a foreign-key reference to `field` on the model returned by
    /// `model`.
    #[must_use]
    pub const fn references(mut self, model: fn() -> &'static ModelMeta, field: &'static str) -> Self {
        self.references = Some(Reference { model, field });
        self
    }

    /// Sets the converter applied to assigned values.
    #[must_use]
    pub const fn converter(mut self, converter: fn(Value) -> Value) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Returns the database column name.
    pub fn column_name(&self) -> &str {
        self.column.as_deref().unwrap_or(self.name)
    }

    /// Applies the converter, if any.
    pub fn convert(&self, value: Value) -> Value {
        match self.converter {
            Some(convert) => convert(value),
            None => value,
        }
    }
}
