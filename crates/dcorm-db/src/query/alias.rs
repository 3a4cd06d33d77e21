//! Table and sub-query aliases.
//!
//! An [`Alias`] is a renamed view of a table, a join chain or a sub-query.
//! Fields resolved through an alias report the alias as their namespace, which
//! is what allows the same table to appear twice in one statement.
//!
//! Unnamed aliases get their name from an [`AliasManager`] while a statement
//! is compiled. The manager hands out the lowest free `t<N>` and refuses to
//! register two aliases under one name.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use dcorm_core::{DcormError, DcormResult};

use super::engine::{Compile, Engine};
use super::identifier::Path;
use super::join::{Join, JoinSource};
use super::literal::keywords;
use super::select::SelectQuery;
use crate::fields::Field;
use crate::model::ModelMeta;

static NEXT_ALIAS_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique identity of an alias.
///
/// Clones of an [`Alias`] share its id, so they resolve to the same name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AliasId(u64);

impl AliasId {
    /// Allocates a fresh id.
    pub fn next() -> Self {
        Self(NEXT_ALIAS_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for AliasId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alias #{}", self.0)
    }
}

/// What an alias renames.
#[derive(Debug, Clone)]
pub enum AliasTarget {
    Table(&'static ModelMeta),
    Join(Box<Join>),
    Query(Box<SelectQuery>),
}

impl PartialEq for AliasTarget {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Table(a), Self::Table(b)) => a.same_as(b),
            (Self::Join(a), Self::Join(b)) => a == b,
            (Self::Query(a), Self::Query(b)) => a == b,
            _ => false,
        }
    }
}

/// A renamed table, join chain or sub-query.
#[derive(Debug, Clone)]
pub struct Alias {
    id: AliasId,
    name: Option<String>,
    target: AliasTarget,
}

impl Alias {
    /// Creates an alias of `target`; `None` defers naming to compilation.
    pub fn new(target: AliasTarget, name: Option<String>) -> Self {
        Self {
            id: AliasId::next(),
            name,
            target,
        }
    }

    /// Creates an alias of a table.
    pub fn table(meta: &'static ModelMeta, name: Option<String>) -> Self {
        Self::new(AliasTarget::Table(meta), name)
    }

    /// Creates an alias of a sub-query.
    pub fn query(query: SelectQuery, name: Option<String>) -> Self {
        Self::new(AliasTarget::Query(Box::new(query)), name)
    }

    /// Creates an alias of a join chain.
    pub fn join(join: Join, name: Option<String>) -> Self {
        Self::new(AliasTarget::Join(Box::new(join)), name)
    }

    /// Returns the identity shared by every clone of this alias.
    pub const fn id(&self) -> AliasId {
        self.id
    }

    /// Returns the explicit name, if one was given.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Returns what this alias renames.
    pub const fn target(&self) -> &AliasTarget {
        &self.target
    }

    /// Returns the aliased table, if the alias renames a table.
    pub const fn underlying(&self) -> Option<&'static ModelMeta> {
        match self.target {
            AliasTarget::Table(meta) => Some(meta),
            _ => None,
        }
    }

    /// Returns the aliases nested inside a join target, outermost first.
    pub fn nested_aliases(&self) -> Vec<&Self> {
        match &self.target {
            AliasTarget::Join(join) => join
                .sources()
                .into_iter()
                .filter_map(JoinSource::as_alias)
                .flat_map(|alias| {
                    let mut found = vec![alias];
                    found.extend(alias.nested_aliases());
                    found
                })
                .collect(),
            AliasTarget::Table(_) | AliasTarget::Query(_) => Vec::new(),
        }
    }

    /// Returns `true` if both values are the same alias.
    pub fn same_as(&self, other: &Self) -> bool {
        self.id == other.id
    }

    /// Returns the field `name` of the aliased object, rebound to this alias.
    ///
    /// # Errors
    ///
    /// Returns [`DcormError::UnknownAttribute`] if the target has no such
    /// field.
    pub fn resolve_field(&self, name: &str) -> DcormResult<Field> {
        self.target_fields()
            .into_iter()
            .find(|f| f.attribute() == name || f.name() == name)
            .map(|f| self.bind(&f))
            .ok_or_else(|| DcormError::UnknownAttribute {
                table: self.display_name(),
                attribute: name.to_string(),
            })
    }

    /// Returns every field of the aliased object, rebound to this alias.
    pub fn fields(&self) -> Vec<Field> {
        self.target_fields().iter().map(|f| self.bind(f)).collect()
    }

    fn bind(&self, field: &Field) -> Field {
        field.rebind(self.id, self.name.clone())
    }

    fn target_fields(&self) -> Vec<Field> {
        match &self.target {
            AliasTarget::Table(meta) => meta.columns(),
            AliasTarget::Join(join) => join.fields(),
            AliasTarget::Query(query) => query.projection(),
        }
    }

    fn display_name(&self) -> String {
        self.name.clone().unwrap_or_else(|| self.id.to_string())
    }
}

impl PartialEq for Alias {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && self.name == other.name
    }
}

impl Compile for Alias {
    fn compile(&self, engine: &mut Engine<'_>) -> DcormResult<()> {
        let name = match &self.name {
            Some(name) => name.clone(),
            None => engine.resolve_alias(self.id)?,
        };
        match &self.target {
            AliasTarget::Table(meta) => {
                engine.sql(*meta)?;
            }
            AliasTarget::Join(join) => {
                engine.parens(|e| join.compile(e))?;
            }
            AliasTarget::Query(query) => {
                engine.parens(|e| query.compile(e))?;
            }
        }
        engine.literal(keywords::AS).identifier(&Path::new([name]));
        Ok(())
    }
}

// ── AliasManager ───────────────────────────────────────────────────────

/// Registry of alias names for one statement compilation.
///
/// Names visible from enclosing statements can be reserved so that a nested
/// sub-query never generates a name its correlated predicates already use.
///
/// # Examples
///
/// ```
/// use std::sync::LazyLock;
///
/// use dcorm_db::model::ModelMeta;
/// use dcorm_db::query::alias::AliasManager;
///
/// static PERSON: LazyLock<ModelMeta> = LazyLock::new(|| ModelMeta::new("person", vec![]));
///
/// let mut aliases = AliasManager::new();
/// let a = PERSON.unnamed_alias();
/// let b = PERSON.unnamed_alias();
/// assert_eq!(aliases.register_alias(&a).unwrap(), "t1");
/// assert_eq!(aliases.register_alias(&b).unwrap(), "t2");
/// assert!(aliases.register_alias(&PERSON.alias("t1")).is_err());
/// ```
#[derive(Debug, Default)]
pub struct AliasManager {
    assigned: HashMap<String, AliasId>,
    names: HashMap<AliasId, String>,
    reserved: HashSet<String>,
}

impl AliasManager {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a manager whose generated names avoid `reserved`.
    pub fn reserving<I, S>(reserved: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            reserved: reserved.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Returns the lowest `t<N>` neither assigned nor reserved.
    pub fn get_unique_alias(&self) -> String {
        let mut counter: u64 = 1;
        loop {
            let name = format!("t{counter}");
            if !self.assigned.contains_key(&name) && !self.reserved.contains(&name) {
                return name;
            }
            counter += 1;
        }
    }

    /// Registers `alias` and returns its name.
    ///
    /// Registering the same alias twice is a no-op returning the name it
    /// already has.
    ///
    /// # Errors
    ///
    /// Returns [`DcormError::DuplicateAlias`] if a different alias already
    /// holds the name.
    pub fn register_alias(&mut self, alias: &Alias) -> DcormResult<String> {
        if let Some(existing) = self.names.get(&alias.id()) {
            return Ok(existing.clone());
        }
        let name = match alias.name() {
            Some(name) => name.to_string(),
            None => self.get_unique_alias(),
        };
        if self.assigned.contains_key(&name) {
            return Err(DcormError::DuplicateAlias(name));
        }
        tracing::trace!(alias = %name, id = %alias.id(), "registered alias");
        self.assigned.insert(name.clone(), alias.id());
        self.names.insert(alias.id(), name.clone());
        Ok(name)
    }

    /// Registers every alias in order, together with the aliases nested in
    /// join targets.
    ///
    /// # Errors
    ///
    /// Stops at the first duplicate, see [`AliasManager::register_alias`].
    pub fn register_aliases<'a, I>(&mut self, aliases: I) -> DcormResult<()>
    where
        I: IntoIterator<Item = &'a Alias>,
    {
        for alias in aliases {
            self.register_alias(alias)?;
            for nested in alias.nested_aliases() {
                self.register_alias(nested)?;
            }
        }
        Ok(())
    }

    /// Returns the name assigned to `id`.
    pub fn name_of(&self, id: AliasId) -> Option<&str> {
        self.names.get(&id).map(String::as_str)
    }

    /// Returns `true` if an alias is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.assigned.contains_key(name)
    }

    /// Returns the registered names, in no particular order.
    pub fn assigned_names(&self) -> impl Iterator<Item = &str> {
        self.assigned.keys().map(String::as_str)
    }

    /// Returns the number of registered aliases.
    pub fn len(&self) -> usize {
        self.assigned.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.assigned.is_empty()
    }

    /// Drops every registration and reservation.
    pub fn clear(&mut self) {
        self.assigned.clear();
        self.names.clear();
        self.reserved.clear();
    }

    /// Enters a registration scope that clears this manager when dropped.
    pub fn scope(&mut self) -> AliasScope<'_> {
        AliasScope { manager: self }
    }
}

/// Guard returned by [`AliasManager::scope`].
#[derive(Debug)]
pub struct AliasScope<'m> {
    manager: &'m mut AliasManager,
}

impl Deref for AliasScope<'_> {
    type Target = AliasManager;

    fn deref(&self) -> &AliasManager {
        self.manager
    }
}

impl DerefMut for AliasScope<'_> {
    fn deref_mut(&mut self) -> &mut AliasManager {
        self.manager
    }
}

impl Drop for AliasScope<'_> {
    fn drop(&mut self) {
        self.manager.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::LazyLock;

    use super::*;
    use crate::dialect::Dialect;
    use crate::fields::{ColumnType, FieldDef};
    use crate::query::join::JoinKind;

    static NODE: LazyLock<ModelMeta> = LazyLock::new(|| {
        ModelMeta::new(
            "node",
            vec![
                FieldDef::new("id", ColumnType::Auto).primary_key(),
                FieldDef::new("parent_id", ColumnType::Int).nullable(),
            ],
        )
    });

    // ── AliasManager tests ──────────────────────────────────────────

    #[test]
    fn test_unique_names_are_sequential() {
        let mut manager = AliasManager::new();
        let aliases: Vec<Alias> = (0..5).map(|_| NODE.unnamed_alias()).collect();
        let names: Vec<String> = aliases
            .iter()
            .map(|a| manager.register_alias(a).unwrap())
            .collect();
        assert_eq!(names, vec!["t1", "t2", "t3", "t4", "t5"]);
    }

    #[test]
    fn test_generated_names_skip_explicit_ones() {
        let mut manager = AliasManager::new();
        manager.register_alias(&NODE.alias("t1")).unwrap();
        let generated = manager.register_alias(&NODE.unnamed_alias()).unwrap();
        assert_eq!(generated, "t2");
    }

    #[test]
    fn test_explicit_collision_with_generated_fails() {
        let mut manager = AliasManager::new();
        manager.register_alias(&NODE.unnamed_alias()).unwrap();
        let err = manager.register_alias(&NODE.alias("t1")).unwrap_err();
        assert!(matches!(err, DcormError::DuplicateAlias(ref name) if name == "t1"));
    }

    #[test]
    fn test_reregistering_same_alias_is_idempotent() {
        let mut manager = AliasManager::new();
        let alias = NODE.unnamed_alias();
        assert_eq!(manager.register_alias(&alias).unwrap(), "t1");
        assert_eq!(manager.register_alias(&alias.clone()).unwrap(), "t1");
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn test_scope_clears_on_drop() {
        let mut manager = AliasManager::new();
        {
            let mut scope = manager.scope();
            scope.register_alias(&NODE.alias("a")).unwrap();
            assert!(scope.contains("a"));
        }
        assert!(manager.is_empty());
    }

    #[test]
    fn test_scope_clears_on_error() {
        fn register_twice(manager: &mut AliasManager) -> DcormResult<()> {
            let mut scope = manager.scope();
            scope.register_aliases([&NODE.alias("x"), &NODE.alias("x")])?;
            Ok(())
        }
        let mut manager = AliasManager::new();
        assert!(register_twice(&mut manager).is_err());
        assert!(manager.is_empty());
    }

    #[test]
    fn test_reserved_names_are_skipped() {
        let mut manager = AliasManager::reserving(["t1", "t3"]);
        let names: Vec<String> = (0..2)
            .map(|_| manager.register_alias(&NODE.unnamed_alias()).unwrap())
            .collect();
        assert_eq!(names, vec!["t2", "t4"]);
        assert!(!manager.contains("t1"));
        // Explicit names may still shadow an enclosing scope.
        assert_eq!(manager.register_alias(&NODE.alias("t1")).unwrap(), "t1");
    }

    #[test]
    fn test_register_aliases_descends_into_join_targets() {
        let inner = NODE.unnamed_alias();
        let chain = JoinSource::from(inner.clone())
            .join(&*NODE, JoinKind::Cross, None)
            .unwrap();
        let outer = Alias::join(chain, Some("j".to_string()));
        assert_eq!(outer.nested_aliases().len(), 1);

        let mut manager = AliasManager::new();
        manager.register_aliases([&outer]).unwrap();
        assert_eq!(manager.name_of(outer.id()), Some("j"));
        assert_eq!(manager.name_of(inner.id()), Some("t1"));
    }

    // ── Alias tests ─────────────────────────────────────────────────

    #[test]
    fn test_resolve_field_rebinds() {
        let a = NODE.alias("a");
        let id = a.resolve_field("id").unwrap();
        assert_eq!(id.source_name(), "a");
        assert_eq!(id.model().db_table, "node");
        assert!(a.resolve_field("missing").is_err());
        assert_eq!(a.underlying().map(|m| m.db_table.as_str()), Some("node"));
    }

    #[test]
    fn test_compile_named_table_alias() {
        let dialect = Dialect::generic();
        let (sql, values) = Engine::render(&dialect, &NODE.alias("n")).unwrap();
        assert_eq!(sql, "\"node\" AS \"n\"");
        assert!(values.is_empty());
    }

    #[test]
    fn test_compile_unnamed_alias_requires_scope() {
        let dialect = Dialect::generic();
        let alias = NODE.unnamed_alias();
        let err = Engine::render(&dialect, &alias).unwrap_err();
        assert!(matches!(err, DcormError::MissingAliasName(_)));

        let mut engine = Engine::new(&dialect);
        let mut manager = AliasManager::new();
        manager.register_alias(&alias).unwrap();
        engine
            .with_alias_scope(manager, |e| {
                e.sql(&alias)?.sql(&alias.resolve_field("id")?)?;
                Ok(())
            })
            .unwrap();
        assert_eq!(engine.query().0, "\"node\" AS \"t1\"\"t1\".\"id\"");
    }
}
