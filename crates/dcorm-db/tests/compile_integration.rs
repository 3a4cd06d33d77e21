//! Integration tests for statement compilation.
//!
//! These tests drive the public API end to end: declaring models, building
//! expressions and statements, and compiling them for each dialect.

use std::io;
use std::sync::{Arc, LazyLock, Mutex};

use dcorm_core::{DcormError, Settings};
use dcorm_db::fields::{ColumnType, FieldDef};
use dcorm_db::model::{Model, ModelMeta};
use dcorm_db::query::alias::{Alias, AliasManager};
use dcorm_db::query::expressions::{Combinable, Expression};
use dcorm_db::query::join::{JoinKind, JoinSource};
use dcorm_db::query::relations::DeclaredRelations;
use dcorm_db::query::select::{select, SelectItem};
use dcorm_db::value::Value;
use dcorm_db::{Database, Dialect};
use tracing_subscriber::fmt::MakeWriter;

// ── Test model definitions ────────────────────────────────────────────

#[derive(Debug, Clone)]
struct Person {
    id: i64,
    name: String,
    manager_id: Option<i64>,
}

impl Model for Person {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new(
                "person",
                vec![
                    FieldDef::new("id", ColumnType::Int).primary_key(),
                    FieldDef::new("name", ColumnType::Text),
                    FieldDef::new("manager_id", ColumnType::Int)
                        .nullable()
                        .references(Person::meta, "id"),
                ],
            )
        });
        &META
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![
            ("id", Value::Int(self.id)),
            ("name", Value::from(self.name.as_str())),
            ("manager_id", Value::from(self.manager_id)),
        ]
    }
}

#[derive(Debug, Clone)]
struct Pet {
    id: i64,
    owner_id: i64,
}

impl Model for Pet {
    fn meta() -> &'static ModelMeta {
        static META: LazyLock<ModelMeta> = LazyLock::new(|| {
            ModelMeta::new(
                "pet",
                vec![
                    FieldDef::new("id", ColumnType::Int).primary_key(),
                    FieldDef::new("owner_id", ColumnType::Int).references(Person::meta, "id"),
                ],
            )
        });
        &META
    }

    fn field_values(&self) -> Vec<(&'static str, Value)> {
        vec![("id", Value::Int(self.id)), ("owner_id", Value::Int(self.owner_id))]
    }
}

static BADGE: LazyLock<ModelMeta> = LazyLock::new(|| {
    ModelMeta::new("badge", vec![FieldDef::new("id", ColumnType::Int).primary_key()])
});

fn person(name: &str) -> dcorm_db::Field {
    Person::field(name).unwrap()
}

fn sqlite() -> Dialect {
    Dialect::sqlite()
}

/// Substitutes `?` placeholders with the inlined values, returning `None` if
/// the counts disagree.
fn substitute(template: &str, values: &[Value]) -> Option<String> {
    let pieces: Vec<&str> = template.split('?').collect();
    if pieces.len() != values.len() + 1 {
        return None;
    }
    let mut out = String::from(pieces[0]);
    for (value, piece) in values.iter().zip(&pieces[1..]) {
        out.push_str(&value.to_sql_literal());
        out.push_str(piece);
    }
    Some(out)
}

// ── Log capture ───────────────────────────────────────────────────────

#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    fn contents(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

fn with_captured_logs<T>(f: impl FnOnce() -> T) -> (T, String) {
    let logs = CapturedLogs::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(logs.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::WARN)
        .finish();
    let result = tracing::subscriber::with_default(subscriber, f);
    (result, logs.contents())
}

// ── Scenario tests ────────────────────────────────────────────────────

#[test]
fn test_select_person_by_id() {
    let query = select([Person::meta()]).where_(person("id").equals(1));
    let (sql, values) = query.query(&sqlite()).unwrap();
    assert_eq!(
        sql,
        "SELECT \"person\".\"id\", \"person\".\"name\", \"person\".\"manager_id\" \
         FROM \"person\" WHERE \"person\".\"id\" = ?"
    );
    assert_eq!(values, vec![Value::Int(1)]);
}

#[test]
fn test_comparison_with_null_uses_is() {
    let query = select([person("id")]).where_(person("manager_id").not_equals(None::<i64>));
    let (sql, values) = query.query(&sqlite()).unwrap();
    assert!(sql.ends_with("WHERE \"person\".\"manager_id\" IS NOT NULL"));
    assert!(!sql.contains("<>"));
    assert!(values.is_empty());

    let query = select([person("id")]).where_(person("manager_id").equals(Value::Null));
    let (sql, _) = query.query(&Dialect::postgres()).unwrap();
    assert!(sql.ends_with("WHERE \"person\".\"manager_id\" IS NULL"));
}

#[test]
fn test_self_join_with_named_aliases() {
    let a = Person::alias("a");
    let b = Person::alias("b");
    let on = a.resolve_field("id").unwrap().equals(b.resolve_field("manager_id").unwrap());
    let query = select([a.clone(), b.clone()]).join_on(on).unwrap();
    let (sql, values) = query.query(&sqlite()).unwrap();
    assert_eq!(
        sql,
        "SELECT \"a\".\"id\", \"a\".\"name\", \"a\".\"manager_id\", \
         \"b\".\"id\", \"b\".\"name\", \"b\".\"manager_id\" \
         FROM \"person\" AS \"a\" INNER JOIN \"person\" AS \"b\" ON \"a\".\"id\" = \"b\".\"manager_id\""
    );
    assert!(values.is_empty());

    let mut aliases = AliasManager::new();
    query.register_aliases(&mut aliases).unwrap();
    assert!(aliases.contains("a") && aliases.contains("b"));
}

#[test]
fn test_self_join_inferred_from_declared_relation() {
    let worker = Person::meta().unnamed_alias();
    let boss = Person::meta().unnamed_alias();
    let query = select([worker.resolve_field("name").unwrap(), boss.resolve_field("name").unwrap()])
        .from(worker)
        .join(boss, JoinKind::LeftOuter, None)
        .unwrap();
    let (sql, _) = query.query(&sqlite()).unwrap();
    assert_eq!(
        sql,
        "SELECT \"t1\".\"name\", \"t2\".\"name\" FROM \"person\" AS \"t1\" \
         LEFT OUTER JOIN \"person\" AS \"t2\" ON \"t1\".\"manager_id\" = \"t2\".\"id\""
    );
}

#[test]
fn test_limit_override_warns() {
    let (query, logs) = with_captured_logs(|| select([person("id")]).limit(10).limit(20));
    assert!(logs.contains("Overriding previous limit of 10"), "logs: {logs}");
    let (sql, values) = query.query(&sqlite()).unwrap();
    assert!(sql.ends_with("LIMIT ?"));
    assert_eq!(values, vec![Value::Int(20)]);
}

#[test]
fn test_offset_and_order_override_warn() {
    let (_, logs) = with_captured_logs(|| {
        select([person("id")])
            .offset(1)
            .offset(2)
            .order_by([person("id")])
            .order_by([person("name").desc()])
    });
    assert!(logs.contains("Overriding previous offset of 1"));
    assert!(logs.contains("Overriding previous ordering"));
}

#[test]
fn test_single_calls_do_not_warn() {
    let (_, logs) = with_captured_logs(|| select([person("id")]).limit(1).offset(1));
    assert!(logs.is_empty(), "logs: {logs}");
}

// ── Property tests ────────────────────────────────────────────────────

#[test]
fn test_placeholders_match_values() {
    let query = select([Person::meta()])
        .where_(person("id").in_(vec![Value::Int(1), Value::Int(2), Value::Int(3)]))
        .where_(person("name").like("A%").or_(person("name").equals("Bob")))
        .order_by([person("name")])
        .limit(5)
        .offset(10);
    let (sql, values) = query.query(&sqlite()).unwrap();
    assert_eq!(values.len(), 7);
    let inlined = substitute(&sql, &values).unwrap();
    assert!(!inlined.contains('?'));
    assert_eq!(inlined, query.query_string(&sqlite()).unwrap());
}

#[test]
fn test_double_negation_cancels() {
    let base = person("id").greater_than(3);
    let twice = base.clone().not_().not_();
    assert_eq!(twice, base);
    let dialect = sqlite();
    assert_eq!(
        select([person("id")]).where_(twice).query(&dialect).unwrap(),
        select([person("id")]).where_(base).query(&dialect).unwrap()
    );
}

#[test]
fn test_short_circuit_algebra() {
    let expr = person("id").equals(1);
    assert_eq!(expr.clone().and_(true), expr);
    assert_eq!(Expression::TRUE.and_(expr.clone()), expr);
    assert_eq!(expr.clone().or_(true), Expression::TRUE);
    assert_eq!(expr.clone().and_(false), Expression::FALSE);
    assert_eq!(expr.clone().or_(false), expr);
}

#[test]
fn test_unnamed_aliases_named_sequentially() {
    let aliases: Vec<_> = (0..4).map(|_| Person::meta().unnamed_alias()).collect();
    let mut manager = AliasManager::new();
    let names: Vec<String> = aliases.iter().map(|a| manager.register_alias(a).unwrap()).collect();
    assert_eq!(names, vec!["t1", "t2", "t3", "t4"]);

    let mut again = AliasManager::new();
    let repeated: Vec<String> = aliases.iter().map(|a| again.register_alias(a).unwrap()).collect();
    assert_eq!(repeated, names);
}

#[test]
fn test_explicit_alias_collides_with_generated() {
    let generated = Person::meta().unnamed_alias();
    let explicit = Person::alias("t1");
    let query = select([SelectItem::from(generated.clone())])
        .join(explicit, JoinKind::Cross, None)
        .unwrap();
    let err = query.query(&sqlite()).unwrap_err();
    assert!(matches!(err, DcormError::DuplicateAlias(ref name) if name == "t1"));
}

// ── Join tests ────────────────────────────────────────────────────────

#[test]
fn test_join_without_relation_fails() {
    let err = select([Pet::meta()]).join(&*BADGE, JoinKind::Inner, None).unwrap_err();
    assert!(matches!(
        err,
        DcormError::NoRelation { ref lhs, ref rhs } if lhs == "pet" && rhs == "badge"
    ));
}

#[test]
fn test_join_chain_with_custom_lookup() {
    let query = select([Pet::field("id").unwrap(), person("name")])
        .from(Pet::meta())
        .join_using(Person::meta(), JoinKind::Inner, &DeclaredRelations)
        .unwrap()
        .join(&*BADGE, JoinKind::Cross, None)
        .unwrap();
    let (sql, _) = query.query(&sqlite()).unwrap();
    assert_eq!(
        sql,
        "SELECT \"pet\".\"id\", \"person\".\"name\" FROM \"pet\" \
         INNER JOIN \"person\" ON \"pet\".\"owner_id\" = \"person\".\"id\" CROSS JOIN \"badge\""
    );
}

// ── Dialect tests ─────────────────────────────────────────────────────

#[test]
fn test_dialect_placeholders_and_quoting() {
    let query = select([person("name")])
        .where_(person("id").greater_than(1).and_(person("id").less_than(9)));

    let (pg, _) = query.query(&Dialect::postgres()).unwrap();
    assert!(pg.ends_with("\"person\".\"id\" > $1 AND \"person\".\"id\" < $2"));

    let (my, _) = query.query(&Dialect::mysql()).unwrap();
    assert_eq!(
        my,
        "SELECT `person`.`name` FROM `person` WHERE `person`.`id` > %s AND `person`.`id` < %s"
    );
}

#[test]
fn test_unsupported_clauses() {
    let locked = select([person("id")]).for_update();
    assert!(matches!(
        locked.query(&sqlite()).unwrap_err(),
        DcormError::NotSupported { ref dialect, .. } if dialect == "sqlite"
    ));
    assert!(locked.query(&Dialect::mysql()).is_ok());

    let nulls = select([person("id")]).order_by([person("manager_id").desc().nulls_last()]);
    assert!(nulls.query(&Dialect::mysql()).is_err());
    let (sql, _) = nulls.query(&Dialect::postgres()).unwrap();
    assert!(sql.ends_with("ORDER BY \"person\".\"manager_id\" DESC NULLS LAST"));
}

#[test]
fn test_ilike_substitution() {
    let query = select([person("id")]).where_(person("name").ilike("a%"));
    assert!(query.query(&Dialect::postgres()).unwrap().0.contains(" ILIKE $1"));
    assert!(query.query(&sqlite()).unwrap().0.contains(" LIKE ?"));
}

// ── Sub-query and compound tests ──────────────────────────────────────

#[test]
fn test_subquery_membership() {
    let owners = select([Pet::field("owner_id").unwrap()]);
    let query = select([person("name")]).where_(person("id").in_(owners));
    let (sql, values) = query.query(&sqlite()).unwrap();
    assert_eq!(
        sql,
        "SELECT \"person\".\"name\" FROM \"person\" WHERE \"person\".\"id\" IN \
         (SELECT \"pet\".\"owner_id\" FROM \"pet\")"
    );
    assert!(values.is_empty());
}

#[test]
fn test_correlated_subquery_gets_its_own_generated_name() {
    let pet = Pet::meta().unnamed_alias();
    let owner = Person::meta().unnamed_alias();
    let owners = select([owner.resolve_field("id").unwrap()])
        .from(owner.clone())
        .where_(
            owner
                .resolve_field("id")
                .unwrap()
                .equals(pet.resolve_field("owner_id").unwrap()),
        );
    let query = select([pet.resolve_field("id").unwrap()])
        .from(pet.clone())
        .where_(pet.resolve_field("owner_id").unwrap().in_(owners));

    let (sql, values) = query.query(&sqlite()).unwrap();
    assert_eq!(
        sql,
        "SELECT \"t1\".\"id\" FROM \"pet\" AS \"t1\" WHERE \"t1\".\"owner_id\" IN \
         (SELECT \"t2\".\"id\" FROM \"person\" AS \"t2\" WHERE \"t2\".\"id\" = \"t1\".\"owner_id\")"
    );
    assert!(values.is_empty());
}

#[test]
fn test_join_alias_registers_inner_aliases() {
    let pet = Pet::meta().unnamed_alias();
    let on = pet.resolve_field("owner_id").unwrap().equals(person("id"));
    let chain = JoinSource::from(pet)
        .join(Person::meta(), JoinKind::Inner, Some(on))
        .unwrap();
    let joined = Alias::join(chain, Some("j".to_string()));

    let (sql, _) = select([joined.clone()]).from(joined).query(&sqlite()).unwrap();
    assert!(sql.starts_with("SELECT \"j\".\"id\", \"j\".\"owner_id\""));
    assert!(sql.ends_with(
        "FROM (\"pet\" AS \"t1\" INNER JOIN \"person\" ON \"t1\".\"owner_id\" = \"person\".\"id\") AS \"j\""
    ));
}

#[test]
fn test_compound_numbers_parameters_across_operands() {
    let query = select([person("id")])
        .where_(person("name").equals("a"))
        .union(select([person("id")]).where_(person("name").equals("b")))
        .limit(3);
    let (sql, values) = query.query(&Dialect::postgres()).unwrap();
    assert!(sql.contains("= $1) UNION (SELECT"));
    assert!(sql.ends_with("= $2) LIMIT $3"));
    assert_eq!(values, vec![Value::from("a"), Value::from("b"), Value::Int(3)]);
}

#[test]
fn test_compound_ordering_uses_output_column_names() {
    let query = select([person("name")])
        .union(select([person("name")]).where_(person("id").greater_than(1)))
        .order_by([person("name").asc()]);
    let (sql, _) = query.query(&Dialect::postgres()).unwrap();
    assert!(sql.ends_with(") ORDER BY \"name\" ASC"));
}

// ── Database tests ────────────────────────────────────────────────────

#[test]
fn test_database_from_settings() {
    let mut settings = Settings::default();
    if let Some(db) = settings.databases.get_mut("default") {
        db.engine = "postgresql".to_string();
        db.schema = Some("hr".to_string());
    }
    let db = Database::from_settings(&settings, "default").unwrap();
    let (sql, values) = db.compile(&select([person("name")]).where_(person("id").equals(7))).unwrap();
    assert_eq!(
        sql,
        "SELECT \"hr\".\"person\".\"name\" FROM \"hr\".\"person\" WHERE \"hr\".\"person\".\"id\" = $1"
    );
    assert_eq!(values, vec![Value::Int(7)]);
}

#[test]
fn test_bound_fields_apply_values() {
    let bob = Person {
        id: 2,
        name: "Bob".to_string(),
        manager_id: None,
    };
    let fields = bob.bound_fields().unwrap();
    let predicate = fields
        .into_iter()
        .fold(Expression::TRUE, |acc, field| {
            let value = match field.value() {
                dcorm_db::FieldValue::Set(v) => v.clone(),
                dcorm_db::FieldValue::Unset => Value::Null,
            };
            acc.and_(field.equals(value))
        });
    let (sql, values) = select([Person::meta()]).where_(predicate).query(&sqlite()).unwrap();
    assert!(sql.ends_with(
        "WHERE \"person\".\"id\" = ? AND \"person\".\"name\" = ? AND \"person\".\"manager_id\" IS NULL"
    ));
    assert_eq!(values, vec![Value::Int(2), Value::from("Bob")]);
}
