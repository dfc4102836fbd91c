// tests/update/scheduling_test.rs
mod common;

use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, BTreeSet};

use common::*;
use triplewrite::config::BatchMode;
use triplewrite::exec::{edge_list, DependencyGraphBuilder, ExecutionScheduler};
use triplewrite::prelude::*;
use triplewrite::store::{Row, StoreResult};

const PARENT_CHILD: &str = "CREATE TABLE parent (id INTEGER PRIMARY KEY, name TEXT);
     CREATE TABLE child (
         id INTEGER PRIMARY KEY,
         parent_id INTEGER REFERENCES parent (id)
     );";

fn attr(s: &str) -> Attribute {
    Attribute::parse(s).unwrap()
}

fn insert(table: &str, values: &[(&str, &str)]) -> MutationStatement {
    let bindings: BindingMap = values
        .iter()
        .map(|(a, v)| (attr(a), Value::literal(*v)))
        .collect();
    let columns: Vec<&str> = values.iter().map(|(a, _)| a.split('.').nth(1).unwrap()).collect();
    let literals: Vec<&str> = values.iter().map(|(_, v)| *v).collect();
    let sql = format!(
        "INSERT INTO {table} ({}) VALUES ({})",
        columns.join(", "),
        literals.join(", ")
    );
    let subject = bindings
        .iter()
        .filter(|(a, _)| a.column() == "id")
        .map(|(a, v)| (a.clone(), v.clone()))
        .collect();
    MutationStatement::new(
        MutationKind::Insert,
        RelationName::new(table),
        db(),
        bindings,
        subject,
        sql,
    )
}

#[test]
fn test_referenced_insert_runs_first() {
    let store = store(PARENT_CHILD);
    let statements = vec![
        insert("child", &[("child.id", "1"), ("child.parent_id", "5")]),
        insert("parent", &[("parent.id", "5")]),
    ];

    let graph = DependencyGraphBuilder::new(&store, &store).build(&statements).unwrap();
    assert_eq!(edge_list(&graph), BTreeMap::from([(1, BTreeSet::from([0]))]));

    let settings = ExecutionSettings::default();
    let scheduler = ExecutionScheduler::new(&store, &settings);
    let ordered = scheduler.order(&graph, statements).unwrap();
    assert_eq!(ordered[0].table, RelationName::new("parent"));

    let executed = scheduler.execute(&ordered, false).unwrap();
    assert_eq!(executed.len(), 2);
    assert_eq!(rows(&store, "SELECT id, parent_id FROM child"), vec![vec![cell("1"), cell("5")]]);
}

#[test]
fn test_unrelated_statements_keep_planned_order() {
    let store = store(PARENT_CHILD);
    let statements = vec![
        insert("parent", &[("parent.id", "2")]),
        insert("child", &[("child.id", "1"), ("child.parent_id", "5")]),
        insert("parent", &[("parent.id", "1")]),
    ];

    let graph = DependencyGraphBuilder::new(&store, &store).build(&statements).unwrap();
    assert!(edge_list(&graph).is_empty());

    let settings = ExecutionSettings::default();
    let ordered = ExecutionScheduler::new(&store, &settings)
        .order(&graph, statements.clone())
        .unwrap();
    assert_eq!(ordered, statements);
}

#[test]
fn test_cycle_is_reported_with_both_statements() {
    let store = store(
        "CREATE TABLE a (id INTEGER PRIMARY KEY, b_id INTEGER REFERENCES b (id));
         CREATE TABLE b (id INTEGER PRIMARY KEY, a_id INTEGER REFERENCES a (id));",
    );
    let statements = vec![
        insert("a", &[("a.id", "1"), ("a.b_id", "2")]),
        insert("b", &[("b.id", "2"), ("b.a_id", "1")]),
    ];

    let graph = DependencyGraphBuilder::new(&store, &store).build(&statements).unwrap();
    let settings = ExecutionSettings::default();
    let err = ExecutionScheduler::new(&store, &settings)
        .order(&graph, statements)
        .unwrap_err();

    match err {
        UpdateError::CyclicDependency { statements } => {
            assert_eq!(statements.len(), 2);
            assert!(statements[0].starts_with("INSERT INTO a"));
            assert!(statements[1].starts_with("INSERT INTO b"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_cyclic_request_applies_nothing() {
    let mapping = Mapping::new()
        .with_rule(
            rule("b", "a")
                .object_uri(&format!("{EX}b/{{b.id}}"))
                .column_type("b.id", ValueType::Numeric)
                .join("a.b_id", "b.id")
                .build()
                .unwrap(),
        )
        .with_rule(
            rule("a", "b")
                .object_uri(&format!("{EX}a/{{a.id}}"))
                .column_type("a.id", ValueType::Numeric)
                .join("b.a_id", "a.id")
                .build()
                .unwrap(),
        );
    let updater = Updater::new(
        mapping,
        store(
            "CREATE TABLE a (id INTEGER PRIMARY KEY, b_id INTEGER REFERENCES b (id));
             CREATE TABLE b (id INTEGER PRIMARY KEY, a_id INTEGER REFERENCES a (id));",
        ),
    );

    let err = updater
        .add(&[link("a/1", "b", "b/2"), link("b/2", "a", "a/1")])
        .unwrap_err();

    assert!(matches!(err, UpdateError::CyclicDependency { .. }));
    assert!(rows(updater.store(), "SELECT id FROM a").is_empty());
    assert!(rows(updater.store(), "SELECT id FROM b").is_empty());
}

#[test]
fn test_zero_row_update_fails_verification() {
    let store = store(PARENT_CHILD);
    let update = MutationStatement::new(
        MutationKind::UpdateNonNull,
        RelationName::new("parent"),
        db(),
        BindingMap::from([(attr("parent.name"), Value::literal("'x'"))]),
        BindingMap::from([(attr("parent.id"), Value::literal("1"))]),
        "UPDATE parent SET name = 'x' WHERE id = 1".to_string(),
    );

    let strict = ExecutionSettings::default();
    let err = ExecutionScheduler::new(&store, &strict)
        .execute(std::slice::from_ref(&update), false)
        .unwrap_err();
    assert!(matches!(
        err,
        UpdateError::StatementExecution {
            affected: 0,
            minimum: 1,
            ..
        }
    ));

    let lenient = ExecutionSettings {
        verify_row_counts: false,
        ..ExecutionSettings::default()
    };
    let executed = ExecutionScheduler::new(&store, &lenient)
        .execute(&[update], false)
        .unwrap();
    assert_eq!(executed[0].affected, Some(0));
}

/// Wraps a store, recording every autocommit change and batch call.
struct RecordingConnection {
    inner: SqliteStore,
    autocommit_changes: RefCell<Vec<bool>>,
    batches: Cell<usize>,
    batch_support: bool,
    transaction_support: bool,
}

impl RecordingConnection {
    fn new(inner: SqliteStore, batch_support: bool) -> Self {
        Self {
            inner,
            autocommit_changes: RefCell::new(Vec::new()),
            batches: Cell::new(0),
            batch_support,
            transaction_support: true,
        }
    }

    fn without_transactions(mut self) -> Self {
        self.transaction_support = false;
        self
    }
}

impl SchemaInspector for RecordingConnection {
    fn primary_key_columns(&self, table: &RelationName) -> StoreResult<Vec<Attribute>> {
        self.inner.primary_key_columns(table)
    }

    fn foreign_keys(&self, table: &RelationName) -> StoreResult<Vec<triplewrite::store::ForeignKey>> {
        self.inner.foreign_keys(table)
    }

    fn is_nullable(&self, attribute: &Attribute) -> StoreResult<bool> {
        self.inner.is_nullable(attribute)
    }

    fn list_columns(&self, table: &RelationName) -> StoreResult<Vec<Attribute>> {
        self.inner.list_columns(table)
    }
}

impl Connection for RecordingConnection {
    fn database(&self) -> &DatabaseHandle {
        self.inner.database()
    }

    fn query(&self, sql: &str) -> StoreResult<Vec<Row>> {
        self.inner.query(sql)
    }

    fn execute(&self, sql: &str) -> StoreResult<Option<u64>> {
        self.inner.execute(sql)
    }

    fn execute_batch(&self, statements: &[&str]) -> StoreResult<Vec<Option<u64>>> {
        self.batches.set(self.batches.get() + 1);
        self.inner.execute_batch(statements)
    }

    fn supports_batch_updates(&self) -> bool {
        self.batch_support
    }

    fn supports_transactions(&self) -> bool {
        self.transaction_support
    }

    fn autocommit(&self) -> bool {
        self.inner.autocommit()
    }

    fn set_autocommit(&self, enabled: bool) -> StoreResult<()> {
        self.autocommit_changes.borrow_mut().push(enabled);
        self.inner.set_autocommit(enabled)
    }

    fn commit(&self) -> StoreResult<()> {
        self.inner.commit()
    }

    fn rollback(&self) -> StoreResult<()> {
        self.inner.rollback()
    }
}

fn recording_connection(batch_support: bool) -> RecordingConnection {
    RecordingConnection::new(
        store(
            "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT);
             INSERT INTO people VALUES (7, 'Al');",
        ),
        batch_support,
    )
}

fn recording_updater(batch_support: bool) -> Updater<RecordingConnection> {
    Updater::new(
        Mapping::new().with_rule(literal_rule("name", "people", "name")),
        recording_connection(batch_support),
    )
}

#[test]
fn test_batch_request_restores_autocommit() {
    let updater = recording_updater(true);

    updater.add(&[literal("people/8", "name", "Bo")]).unwrap();

    assert_eq!(*updater.store().autocommit_changes.borrow(), vec![false, true]);
    assert_eq!(updater.store().batches.get(), 1);
    assert!(updater.store().autocommit());
}

#[test]
fn test_failed_batch_request_rolls_back_and_restores_autocommit() {
    let updater = recording_updater(true);

    let err = updater
        .execute(
            &[literal("people/8", "name", "Bo"), literal("people/7", "name", "Cy")],
            &[],
        )
        .unwrap_err();

    assert!(matches!(err, UpdateError::StatementExecution { .. }));
    assert_eq!(*updater.store().autocommit_changes.borrow(), vec![false, true]);
    assert!(updater.store().autocommit());
    assert_eq!(
        rows(&updater.store().inner, "SELECT id FROM people"),
        vec![vec![cell("7")]]
    );
}

#[test]
fn test_sequential_mode_without_batch_support() {
    let updater = recording_updater(false);

    let summary = updater.add(&[literal("people/8", "name", "Bo")]).unwrap();

    assert_eq!(summary.count(MutationKind::Insert), 1);
    assert_eq!(*updater.store().autocommit_changes.borrow(), vec![false, true]);
    assert_eq!(updater.store().batches.get(), 0);
    assert_eq!(
        rows(&updater.store().inner, "SELECT id FROM people ORDER BY id"),
        vec![vec![cell("7")], vec![cell("8")]]
    );
}

#[test]
fn test_failed_sequential_request_rolls_back() {
    let updater = recording_updater(false);

    let err = updater
        .execute(
            &[literal("people/8", "name", "Bo"), literal("people/7", "name", "Cy")],
            &[],
        )
        .unwrap_err();

    assert!(matches!(err, UpdateError::StatementExecution { .. }));
    assert_eq!(updater.store().batches.get(), 0);
    assert_eq!(*updater.store().autocommit_changes.borrow(), vec![false, true]);
    assert_eq!(
        rows(&updater.store().inner, "SELECT id FROM people"),
        vec![vec![cell("7")]]
    );
}

#[test]
fn test_connection_without_transactions_keeps_autocommit() {
    let updater = Updater::new(
        Mapping::new().with_rule(literal_rule("name", "people", "name")),
        recording_connection(false).without_transactions(),
    );

    updater.add(&[literal("people/8", "name", "Bo")]).unwrap();

    assert!(updater.store().autocommit_changes.borrow().is_empty());
    assert_eq!(
        rows(&updater.store().inner, "SELECT id FROM people ORDER BY id"),
        vec![vec![cell("7")], vec![cell("8")]]
    );
}

#[test]
fn test_batch_mode_never_from_settings() {
    let settings = Settings::from_toml("[execution]\nbatch = \"never\"\n").unwrap();
    assert_eq!(settings.execution.batch, BatchMode::Never);
    let updater = recording_updater(true).with_settings(settings);

    updater.add(&[literal("people/8", "name", "Bo")]).unwrap();

    assert_eq!(updater.store().batches.get(), 0);
    assert_eq!(*updater.store().autocommit_changes.borrow(), vec![false, true]);
}

#[test]
fn test_failed_later_phase_undoes_sequential_delete() {
    let settings = Settings::from_toml("[execution]\nbatch = \"never\"\n").unwrap();
    let mapping = Mapping::new()
        .with_rule(literal_rule("name", "a", "name"))
        .with_rule(
            rule("b", "a")
                .object_uri(&format!("{EX}b/{{b.id}}"))
                .column_type("b.id", ValueType::Numeric)
                .join("a.b_id", "b.id")
                .build()
                .unwrap(),
        )
        .with_rule(
            rule("a", "b")
                .object_uri(&format!("{EX}a/{{a.id}}"))
                .column_type("a.id", ValueType::Numeric)
                .join("b.a_id", "a.id")
                .build()
                .unwrap(),
        );
    let updater = Updater::new(
        mapping,
        store(
            "CREATE TABLE a (
                 id INTEGER PRIMARY KEY,
                 name TEXT,
                 b_id INTEGER REFERENCES b (id)
             );
             CREATE TABLE b (id INTEGER PRIMARY KEY, a_id INTEGER REFERENCES a (id));
             INSERT INTO a VALUES (9, 'n', NULL);",
        ),
    )
    .with_settings(settings);

    let err = updater
        .execute(
            &[link("a/1", "b", "b/2"), link("b/2", "a", "a/1")],
            &[literal("a/9", "name", "n")],
        )
        .unwrap_err();

    assert!(matches!(err, UpdateError::CyclicDependency { .. }));
    assert_eq!(rows(updater.store(), "SELECT id, name FROM a"), vec![vec![cell("9"), cell("n")]]);
    assert!(rows(updater.store(), "SELECT id FROM b").is_empty());
}
