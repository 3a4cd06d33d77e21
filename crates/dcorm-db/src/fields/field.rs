//! Column references.
//!
//! A [`Field`] is the leaf of every expression tree: one declared attribute
//! of one table, optionally seen through an alias. Its qualified name is
//! computed at compile time so the alias binding is always reflected.

use std::ptr;

use dcorm_core::DcormResult;

use super::types::FieldDef;
use crate::model::ModelMeta;
use crate::query::alias::AliasId;
use crate::query::engine::{Compile, Engine};
use crate::query::identifier::Path;
use crate::query::ordering::{Direction, OrderedField};
use crate::value::Value;

/// The value a [`Field`] carries when it stands for a record's attribute.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum FieldValue {
    /// The field is a schema reference.
    #[default]
    Unset,
    /// The field carries a record's current value.
    Set(Value),
}

/// The alias a [`Field`] was obtained through.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasBinding {
    /// Identity of the alias.
    pub id: AliasId,
    /// Explicit alias name; `None` until a scope assigns one.
    pub name: Option<String>,
}

/// A reference to a declared attribute of a table or alias.
#[derive(Debug, Clone)]
pub struct Field {
    model: &'static ModelMeta,
    def: &'static FieldDef,
    alias: Option<AliasBinding>,
    value: FieldValue,
}

impl Field {
    /// Creates a schema field for `def` on `model`.
    pub const fn new(model: &'static ModelMeta, def: &'static FieldDef) -> Self {
        Self {
            model,
            def,
            alias: None,
            value: FieldValue::Unset,
        }
    }

    /// Returns the column name.
    pub fn name(&self) -> &str {
        self.def.column_name()
    }

    /// Returns the declared attribute name.
    pub const fn attribute(&self) -> &'static str {
        self.def.name
    }

    /// Returns the attribute declaration.
    pub const fn def(&self) -> &'static FieldDef {
        self.def
    }

    /// Returns the declaring table's metadata.
    pub const fn model(&self) -> &'static ModelMeta {
        self.model
    }

    /// Returns the alias this field was obtained through, if any.
    pub const fn alias(&self) -> Option<&AliasBinding> {
        self.alias.as_ref()
    }

    /// Returns the record value this field carries, if any.
    pub const fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Returns the same attribute seen through the given alias.
    #[must_use]
    pub fn rebind(&self, id: AliasId, name: Option<String>) -> Self {
        Self {
            alias: Some(AliasBinding { id, name }),
            ..self.clone()
        }
    }

    /// Returns this field carrying `value`, after the attribute's converter
    /// has been applied.
    #[must_use]
    pub fn with_value(self, value: impl Into<Value>) -> Self {
        let value = self.def.convert(value.into());
        Self {
            value: FieldValue::Set(value),
            ..self
        }
    }

    /// Returns the name of the table or alias for diagnostics.
    pub fn source_name(&self) -> String {
        match &self.alias {
            Some(AliasBinding { name: Some(name), .. }) => name.clone(),
            Some(AliasBinding { id, name: None }) => id.to_string(),
            None => self.model.db_table.clone(),
        }
    }

    /// Ascending ordering on this field.
    pub fn asc(self) -> OrderedField {
        OrderedField::new(self, Direction::Asc)
    }

    /// Descending ordering on this field.
    pub fn desc(self) -> OrderedField {
        OrderedField::new(self, Direction::Desc)
    }

    /// Returns the qualified path of this field within `engine`'s scopes.
    ///
    /// # Errors
    ///
    /// Returns [`MissingAliasName`](dcorm_core::DcormError::MissingAliasName)
    /// for an unnamed alias that no active scope has registered.
    pub fn path(&self, engine: &Engine<'_>) -> DcormResult<Path> {
        let namespace = match &self.alias {
            Some(AliasBinding { name: Some(name), .. }) => Path::new([name.clone()]),
            Some(AliasBinding { id, name: None }) => Path::new([engine.resolve_alias(*id)?]),
            None => engine.table_path(self.model),
        };
        Ok(namespace.join(self.name()))
    }
}

impl PartialEq for Field {
    fn eq(&self, other: &Self) -> bool {
        self.model.same_as(other.model)
            && ptr::eq(self.def, other.def)
            && self.alias == other.alias
            && self.value == other.value
    }
}

impl Compile for Field {
    fn compile(&self, engine: &mut Engine<'_>) -> DcormResult<()> {
        if engine.bare_columns() {
            engine.identifier(&Path::new([self.name()]));
            return Ok(());
        }
        let path = self.path(engine)?;
        engine.identifier(&path);
        Ok(())
    }
}
