//! The compilation engine.
//!
//! An [`Engine`] walks a tree of [`Compile`] nodes and accumulates two
//! buffers in lockstep: SQL fragments and bound values. The engine itself
//! knows nothing about node kinds. Every node appends its own text through
//! the three entry points, and user data only ever enters through
//! [`Engine::value`]:
//!
//! - [`Engine::literal`] appends fixed SQL syntax.
//! - [`Engine::identifier`] appends a dialect-quoted name.
//! - [`Engine::value`] appends a placeholder and binds the value.
//!
//! The engine also carries the stack of alias scopes that are active while a
//! statement (and any nested sub-query) is being compiled.

use dcorm_core::logging::compile_span;
use dcorm_core::{DcormError, DcormResult};

use super::alias::{AliasId, AliasManager};
use super::identifier::Path;
use super::literal::{keywords, Literal};
use super::operators::Operator;
use crate::dialect::Dialect;
use crate::model::ModelMeta;
use crate::value::Value;

/// A node that knows how to write itself into an [`Engine`].
pub trait Compile {
    /// Appends this node's SQL and values to `engine`.
    fn compile(&self, engine: &mut Engine<'_>) -> DcormResult<()>;
}

#[derive(Debug, Clone)]
enum Fragment {
    Sql(String),
    /// A placeholder for the bound value with this 1-based index.
    Param(usize),
}

/// Accumulates SQL fragments and bound values for one compilation.
///
/// # Examples
///
/// ```
/// use dcorm_db::dialect::Dialect;
/// use dcorm_db::query::engine::Engine;
/// use dcorm_db::query::literal::Literal;
/// use dcorm_db::value::Value;
///
/// let dialect = Dialect::postgres();
/// let mut engine = Engine::new(&dialect);
/// engine.value(&Value::Int(1)).unwrap();
/// engine.literal(Literal::binary("+"));
/// engine.value(&Value::Int(2)).unwrap();
///
/// let (sql, values) = engine.query();
/// assert_eq!(sql, "$1 + $2");
/// assert_eq!(values, vec![Value::Int(1), Value::Int(2)]);
/// ```
#[derive(Debug)]
pub struct Engine<'d> {
    dialect: &'d Dialect,
    default_schema: Option<String>,
    fragments: Vec<Fragment>,
    values: Vec<Value>,
    scopes: Vec<AliasManager>,
    bare_columns: bool,
}

impl<'d> Engine<'d> {
    /// Creates an empty engine for `dialect`.
    pub const fn new(dialect: &'d Dialect) -> Self {
        Self {
            dialect,
            default_schema: None,
            fragments: Vec::new(),
            values: Vec::new(),
            scopes: Vec::new(),
            bare_columns: false,
        }
    }

    /// Qualifies tables that declare no schema with `schema`.
    #[must_use]
    pub fn with_default_schema(mut self, schema: Option<String>) -> Self {
        self.default_schema = schema;
        self
    }

    /// Compiles `node` with a fresh engine and returns the statement.
    ///
    /// # Errors
    ///
    /// Propagates any error raised by the node tree.
    pub fn render<C: Compile + ?Sized>(
        dialect: &'d Dialect,
        node: &C,
    ) -> DcormResult<(String, Vec<Value>)> {
        Self::new(dialect).finish(node)
    }

    /// Compiles `node` into this engine and returns the statement.
    ///
    /// The engine is consumed either way, so a failed compilation never
    /// leaves partial buffers behind.
    ///
    /// # Errors
    ///
    /// Propagates any error raised by the node tree.
    pub fn finish<C: Compile + ?Sized>(mut self, node: &C) -> DcormResult<(String, Vec<Value>)> {
        let span = compile_span(&self.dialect.name);
        let _enter = span.enter();

        self.sql(node)?;
        let (sql, values) = self.query();
        tracing::debug!(params = values.len(), sql = %sql, "compiled statement");
        Ok((sql, values))
    }

    /// Returns the dialect this engine compiles for.
    pub const fn dialect(&self) -> &'d Dialect {
        self.dialect
    }

    /// Dispatches `node` to its own compile hook.
    ///
    /// # Errors
    ///
    /// Propagates any error raised by `node`.
    pub fn sql<C: Compile + ?Sized>(&mut self, node: &C) -> DcormResult<&mut Self> {
        node.compile(self)?;
        Ok(self)
    }

    /// Appends a placeholder and binds `value`.
    ///
    /// # Errors
    ///
    /// Returns [`DcormError::UnsupportedValue`] for lists; those are bound
    /// element-wise through [`Engine::value_list`].
    pub fn value(&mut self, value: &Value) -> DcormResult<&mut Self> {
        if let Value::List(items) = value {
            return Err(DcormError::UnsupportedValue(format!(
                "list of {} items as a single parameter",
                items.len()
            )));
        }
        self.values.push(value.clone());
        self.fragments.push(Fragment::Param(self.values.len()));
        Ok(self)
    }

    /// Appends a parenthesized, comma-separated placeholder list.
    ///
    /// # Errors
    ///
    /// Returns [`DcormError::UnsupportedValue`] for an empty list or a
    /// nested list.
    pub fn value_list(&mut self, items: &[Value]) -> DcormResult<&mut Self> {
        if items.is_empty() {
            return Err(DcormError::UnsupportedValue("empty list".to_string()));
        }
        self.literal(keywords::OPEN_PAREN);
        for (i, item) in items.iter().enumerate() {
            if i > 0 {
                self.literal(keywords::COMMA);
            }
            self.value(item)?;
        }
        self.literal(keywords::CLOSE_PAREN);
        Ok(self)
    }

    /// Appends a value used as an expression operand.
    ///
    /// `Null` becomes the `NULL` keyword so `IS NULL` works on every
    /// dialect, lists become placeholder lists and everything else is bound.
    ///
    /// # Errors
    ///
    /// See [`Engine::value`] and [`Engine::value_list`].
    pub fn operand(&mut self, value: &Value) -> DcormResult<&mut Self> {
        match value {
            Value::Null => Ok(self.literal(keywords::NULL)),
            Value::List(items) => self.value_list(items),
            _ => self.value(value),
        }
    }

    /// Appends fixed SQL syntax.
    pub fn literal(&mut self, literal: Literal) -> &mut Self {
        self.fragments.push(Fragment::Sql(literal.render()));
        self
    }

    /// Appends an operator, honoring the dialect's substitution table.
    pub fn operator(&mut self, op: Operator) -> &mut Self {
        let literal = self.dialect.operator(op);
        self.literal(literal)
    }

    /// Appends a quoted dotted name.
    pub fn identifier(&mut self, path: &Path) -> &mut Self {
        let quoted = path
            .segments()
            .iter()
            .map(|segment| self.quote(segment))
            .collect::<Vec<_>>()
            .join(".");
        self.fragments.push(Fragment::Sql(quoted));
        self
    }

    /// Quotes a single name with the dialect's identifier quotes.
    pub fn quote(&self, name: &str) -> String {
        self.dialect.quote(name)
    }

    /// Wraps whatever `f` appends in parentheses.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `f`.
    pub fn parens<F>(&mut self, f: F) -> DcormResult<&mut Self>
    where
        F: FnOnce(&mut Self) -> DcormResult<()>,
    {
        self.literal(keywords::OPEN_PAREN);
        f(self)?;
        self.literal(keywords::CLOSE_PAREN);
        Ok(self)
    }

    /// Compiles `items` separated by commas.
    ///
    /// # Errors
    ///
    /// Propagates the first error raised by an item.
    pub fn comma_separated<'n, C, I>(&mut self, items: I) -> DcormResult<&mut Self>
    where
        C: Compile + ?Sized + 'n,
        I: IntoIterator<Item = &'n C>,
    {
        for (i, item) in items.into_iter().enumerate() {
            if i > 0 {
                self.literal(keywords::COMMA);
            }
            self.sql(item)?;
        }
        Ok(self)
    }

    /// Returns the namespace path of `meta`, applying the default schema.
    pub fn table_path(&self, meta: &ModelMeta) -> Path {
        match (&meta.schema, &self.default_schema) {
            (None, Some(schema)) => Path::new([schema.clone(), meta.db_table.clone()]),
            _ => meta.path(),
        }
    }

    // ── Alias scopes ────────────────────────────────────────────────

    /// Runs `f` with `aliases` pushed as the innermost alias scope.
    ///
    /// The scope is popped and cleared on every exit path, including when
    /// `f` fails.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `f`.
    pub fn with_alias_scope<F>(&mut self, aliases: AliasManager, f: F) -> DcormResult<()>
    where
        F: FnOnce(&mut Self) -> DcormResult<()>,
    {
        self.scopes.push(aliases);
        let mut guard = ScopeGuard { engine: self };
        let result = f(&mut *guard.engine);
        drop(guard);
        result
    }

    /// Returns the name assigned to alias `id`, searching from the innermost
    /// scope outward.
    ///
    /// # Errors
    ///
    /// Returns [`DcormError::MissingAliasName`] if no active scope knows the
    /// alias.
    pub fn resolve_alias(&self, id: AliasId) -> DcormResult<String> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.name_of(id))
            .map(str::to_string)
            .ok_or_else(|| {
                DcormError::MissingAliasName(format!("{id} is not registered in any alias scope"))
            })
    }

    /// Returns a fresh alias manager that will not generate any name already
    /// visible from the active scopes.
    pub fn nested_alias_manager(&self) -> AliasManager {
        AliasManager::reserving(
            self.scopes
                .iter()
                .flat_map(AliasManager::assigned_names)
                .map(str::to_string),
        )
    }

    /// Returns the number of active alias scopes.
    pub fn scope_depth(&self) -> usize {
        self.scopes.len()
    }

    /// Runs `f` with columns rendered by name alone, as required by the
    /// ORDER BY of a compound statement.
    ///
    /// # Errors
    ///
    /// Propagates the error returned by `f`.
    pub fn with_bare_columns<F>(&mut self, f: F) -> DcormResult<()>
    where
        F: FnOnce(&mut Self) -> DcormResult<()>,
    {
        let previous = std::mem::replace(&mut self.bare_columns, true);
        let result = f(self);
        self.bare_columns = previous;
        result
    }

    /// Returns `true` while columns are rendered unqualified.
    pub const fn bare_columns(&self) -> bool {
        self.bare_columns
    }

    // ── Output ──────────────────────────────────────────────────────

    /// Returns the number of values bound so far.
    pub fn param_count(&self) -> usize {
        self.values.len()
    }

    /// Returns the SQL template with dialect placeholders.
    pub fn template(&self) -> String {
        self.fragments
            .iter()
            .map(|fragment| match fragment {
                Fragment::Sql(sql) => sql.clone(),
                Fragment::Param(index) => self.dialect.placeholder(*index),
            })
            .collect()
    }

    /// Consumes the engine and returns the template and the bound values, in
    /// placeholder order.
    pub fn query(self) -> (String, Vec<Value>) {
        (self.template(), self.values)
    }

    /// Returns the statement with values inlined, for display only.
    ///
    /// Inlining does not escape anything; the result must never be executed.
    pub fn query_string(&self) -> String {
        self.fragments
            .iter()
            .map(|fragment| match fragment {
                Fragment::Sql(sql) => sql.clone(),
                Fragment::Param(index) => self
                    .values
                    .get(index - 1)
                    .map_or_else(String::new, Value::to_sql_literal),
            })
            .collect()
    }
}

/// Pops the innermost alias scope when dropped.
struct ScopeGuard<'e, 'd> {
    engine: &'e mut Engine<'d>,
}

impl Drop for ScopeGuard<'_, '_> {
    fn drop(&mut self) {
        if let Some(mut scope) = self.engine.scopes.pop() {
            scope.clear();
        }
    }
}

impl Compile for Value {
    fn compile(&self, engine: &mut Engine<'_>) -> DcormResult<()> {
        engine.operand(self)?;
        Ok(())
    }
}

impl Compile for Literal {
    fn compile(&self, engine: &mut Engine<'_>) -> DcormResult<()> {
        engine.literal(*self);
        Ok(())
    }
}
