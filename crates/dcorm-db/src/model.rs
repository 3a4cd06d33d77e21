//! Model trait and metadata.
//!
//! The [`Model`] trait is what every record type implements to take part in
//! query construction. It exposes static [`ModelMeta`]: the table namespace
//! and the declared attributes, in declaration order. Everything the compiler
//! knows about a table comes from here.

use std::ptr;

use dcorm_core::{DcormError, DcormResult};

use crate::fields::{Field, FieldDef};
use crate::query::alias::Alias;
use crate::query::engine::{Compile, Engine};
use crate::query::identifier::Path;
use crate::value::Value;

/// Static metadata for a model: table namespace and declared attributes.
///
/// Metadata is meant to live in a `static` (usually a `LazyLock`), since
/// [`Field`]s and aliases refer to it by `'static` reference and compare it
/// by identity.
#[derive(Debug)]
pub struct ModelMeta {
    /// Optional schema the table lives in.
    pub schema: Option<String>,
    /// The table name.
    pub db_table: String,
    /// Declared attributes, in declaration order.
    pub fields: Vec<FieldDef>,
}

impl ModelMeta {
    /// Creates metadata for `db_table` with the given attributes.
    pub fn new(db_table: impl Into<String>, fields: Vec<FieldDef>) -> Self {
        Self {
            schema: None,
            db_table: db_table.into(),
            fields,
        }
    }

    /// Places the table in `schema`.
    #[must_use]
    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Looks up a declared attribute by name.
    pub fn get_field(&self, name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Returns the primary key attribute, if one is declared.
    pub fn pk_field(&self) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.primary_key)
    }

    /// Returns the table namespace path (`schema.table` or `table`).
    pub fn path(&self) -> Path {
        let mut path = Path::default();
        if let Some(schema) = &self.schema {
            path.push(schema.clone());
        }
        path.push(self.db_table.clone());
        path
    }

    /// Returns a schema [`Field`] for the attribute `name`.
    ///
    /// # Errors
    ///
    /// Returns [`DcormError::UnknownAttribute`] if no such attribute exists.
    pub fn field(&'static self, name: &str) -> DcormResult<Field> {
        self.get_field(name)
            .map(|def| Field::new(self, def))
            .ok_or_else(|| DcormError::UnknownAttribute {
                table: self.db_table.clone(),
                attribute: name.to_string(),
            })
    }

    /// Returns a schema [`Field`] for every declared attribute.
    pub fn columns(&'static self) -> Vec<Field> {
        self.fields.iter().map(|def| Field::new(self, def)).collect()
    }

    /// Returns a named alias of this table.
    pub fn alias(&'static self, name: impl Into<String>) -> Alias {
        Alias::table(self, Some(name.into()))
    }

    /// Returns an alias whose name is assigned during compilation.
    pub fn unnamed_alias(&'static self) -> Alias {
        Alias::table(self, None)
    }

    /// Returns `true` if `other` is this very metadata instance.
    pub fn same_as(&self, other: &Self) -> bool {
        ptr::eq(self, other)
    }
}

/// Metadata compares by identity, like [`ModelMeta::same_as`].
impl PartialEq for ModelMeta {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for ModelMeta {}

impl Compile for ModelMeta {
    fn compile(&self, engine: &mut Engine<'_>) -> DcormResult<()> {
        let path = engine.table_path(self);
        engine.identifier(&path);
        Ok(())
    }
}

/// The trait implemented by record types.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
///
/// use dcorm_db::fields::{ColumnType, FieldDef};
/// use dcorm_db::model::{Model, ModelMeta};
/// use dcorm_db::value::Value;
///
/// struct Article {
///     id: i64,
///     title: String,
/// }
///
/// static ARTICLE: LazyLock<ModelMeta> = LazyLock::new(|| {
///     ModelMeta::new(
///         "article",
///         vec![
///             FieldDef::new("id", ColumnType::Auto).primary_key(),
///             FieldDef::new("title", ColumnType::Text),
///         ],
///     )
/// });
///
/// impl Model for Article {
///     fn meta() -> &'static ModelMeta {
///         &ARTICLE
///     }
///
///     fn field_values(&self) -> Vec<(&'static str, Value)> {
///         vec![("id", Value::Int(self.id)), ("title", Value::from(self.title.as_str()))]
///     }
/// }
///
/// let title = Article::field("title").unwrap();
/// assert_eq!(title.name(), "title");
/// ```
pub trait Model: 'static {
    /// Returns the static metadata for this model type.
    fn meta() -> &'static ModelMeta;

    /// Returns the attribute name-value pairs of this instance.
    fn field_values(&self) -> Vec<(&'static str, Value)>;

    /// Returns a schema field of this model.
    ///
    /// # Errors
    ///
    /// Returns [`DcormError::UnknownAttribute`] for undeclared names.
    fn field(name: &str) -> DcormResult<Field> {
        Self::meta().field(name)
    }

    /// Returns a named alias of this model's table.
    fn alias(name: impl Into<String>) -> Alias {
        Self::meta().alias(name)
    }

    /// Returns the fields of this instance, each carrying its current value.
    ///
    /// # Errors
    ///
    /// Returns [`DcormError::UnknownAttribute`] if `field_values` names an
    /// attribute the metadata does not declare.
    fn bound_fields(&self) -> DcormResult<Vec<Field>> {
        self.field_values()
            .into_iter()
            .map(|(name, value)| Ok(Self::field(name)?.with_value(value)))
            .collect()
    }
}
