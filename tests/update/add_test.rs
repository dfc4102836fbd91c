// tests/update/add_test.rs
mod common;

use common::*;
use triplewrite::prelude::*;

fn name_mapping() -> Mapping {
    Mapping::new().with_rule(literal_rule("name", "T", "name"))
}

#[test]
fn test_add_inserts_missing_row() {
    let updater = Updater::new(
        name_mapping(),
        store("CREATE TABLE T (id INTEGER PRIMARY KEY, name TEXT);"),
    );

    let summary = updater.add(&[literal("T/7", "name", "x")]).unwrap();

    assert_eq!(summary.sql(), vec![r#"INSERT INTO "T" ("id", "name") VALUES (7, 'x')"#]);
    assert_eq!(summary.count(MutationKind::Insert), 1);
    assert_eq!(
        rows(updater.store(), "SELECT id, name FROM T"),
        vec![vec![cell("7"), cell("x")]]
    );
}

#[test]
fn test_re_adding_same_triple_is_noop() {
    let updater = Updater::new(
        name_mapping(),
        store("CREATE TABLE T (id INTEGER PRIMARY KEY, name TEXT);"),
    );
    let triple = literal("T/7", "name", "x");

    updater.add(std::slice::from_ref(&triple)).unwrap();
    let again = updater.add(&[triple]).unwrap();

    assert!(again.is_empty());
    assert_eq!(rows(updater.store(), "SELECT COUNT(*) FROM T"), vec![vec![cell("1")]]);
}

#[test]
fn test_add_fills_null_column_of_existing_row() {
    let mapping = Mapping::new()
        .with_rule(literal_rule("name", "people", "name"))
        .with_rule(literal_rule("email", "people", "email"));
    let updater = Updater::new(
        mapping,
        store(
            "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT, email TEXT);
             INSERT INTO people VALUES (7, 'Al', NULL);",
        ),
    );

    let summary = updater.add(&[literal("people/7", "email", "a@b")]).unwrap();

    insta::assert_snapshot!(summary.sql().join("\n"), @r#"UPDATE "people" SET "email" = 'a@b' WHERE ("people"."email" IS NULL OR "people"."email" = 'a@b') AND "people"."id" = 7"#);
    assert_eq!(
        rows(updater.store(), "SELECT name, email FROM people WHERE id = 7"),
        vec![vec![cell("Al"), cell("a@b")]]
    );
}

#[test]
fn test_add_merges_values_for_one_row() {
    let mapping = Mapping::new()
        .with_rule(literal_rule("name", "people", "name"))
        .with_rule(literal_rule("email", "people", "email"));
    let updater = Updater::new(
        mapping,
        store("CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT, email TEXT);"),
    );

    let summary = updater
        .add(&[
            literal("people/7", "name", "Al"),
            literal("people/7", "email", "a@b"),
        ])
        .unwrap();

    assert_eq!(
        summary.sql(),
        vec![r#"INSERT INTO "people" ("email", "id", "name") VALUES ('a@b', 7, 'Al')"#]
    );
}

#[test]
fn test_add_over_different_value_fails_and_rolls_back() {
    let mapping = Mapping::new()
        .with_rule(literal_rule("name", "people", "name"))
        .with_rule(literal_rule("email", "people", "email"));
    let updater = Updater::new(
        mapping,
        store(
            "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT, email TEXT);
             INSERT INTO people VALUES (7, 'Al', 'x@y');",
        ),
    );

    let err = updater
        .add(&[
            literal("people/8", "name", "Bo"),
            literal("people/7", "email", "a@b"),
        ])
        .unwrap_err();

    match err {
        UpdateError::StatementExecution {
            kind,
            affected,
            minimum,
            sql,
        } => {
            assert_eq!(kind, MutationKind::UpdateNonNull);
            assert_eq!((affected, minimum), (0, 1));
            assert!(sql.contains("'a@b'"));
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(rows(updater.store(), "SELECT COUNT(*) FROM people"), vec![vec![cell("1")]]);
    assert!(updater.store().autocommit());
}

#[test]
fn test_add_across_join_inserts_referenced_row_first() {
    let mapping = Mapping::new().with_rule(
        rule("team", "employee")
            .object_uri(&format!("{EX}team/{{team.id}}"))
            .column_type("team.id", ValueType::Numeric)
            .join("employee.team_id", "team.id")
            .build()
            .unwrap(),
    );
    let updater = Updater::new(
        mapping,
        store(
            "CREATE TABLE team (id INTEGER PRIMARY KEY, name TEXT);
             CREATE TABLE employee (
                 id INTEGER PRIMARY KEY,
                 team_id INTEGER REFERENCES team (id)
             );",
        ),
    );

    let summary = updater.add(&[link("employee/7", "team", "team/3")]).unwrap();

    assert_eq!(
        summary.sql(),
        vec![
            r#"INSERT INTO "team" ("id") VALUES (3)"#,
            r#"INSERT INTO "employee" ("id", "team_id") VALUES (7, 3)"#,
        ]
    );
    assert_eq!(
        rows(updater.store(), "SELECT id, team_id FROM employee"),
        vec![vec![cell("7"), cell("3")]]
    );
}

#[test]
fn test_unmapped_triple_is_ignored() {
    let updater = Updater::new(
        name_mapping(),
        store("CREATE TABLE T (id INTEGER PRIMARY KEY, name TEXT);"),
    );
    let summary = updater.add(&[literal("T/7", "color", "red")]).unwrap();
    assert!(summary.is_empty());
}

#[test]
fn test_keyless_table_is_unsupported() {
    let updater = Updater::new(
        Mapping::new().with_rule(literal_rule("label", "tags", "label")),
        store("CREATE TABLE tags (id INTEGER, label TEXT);"),
    );
    let err = updater.add(&[literal("tags/1", "label", "x")]).unwrap_err();
    assert!(matches!(err, UpdateError::UnsupportedSchema { ref table } if table.contains("tags")));
}

#[test]
fn test_rule_for_other_database_is_rejected() {
    let rule = TemplateRule::builder(DatabaseHandle::new("crm", Dialect::Sqlite), format!("{EX}name"))
        .subject_uri(&format!("{EX}T/{{T.id}}"))
        .column_type("T.id", ValueType::Numeric)
        .object_column("T.name", ValueType::Text)
        .build()
        .unwrap();
    let updater = Updater::new(
        Mapping::new().with_rule(rule),
        store("CREATE TABLE T (id INTEGER PRIMARY KEY, name TEXT);"),
    );

    let err = updater.add(&[literal("T/7", "name", "x")]).unwrap_err();
    assert!(matches!(err, UpdateError::DatabaseMismatch { .. }));
    assert!(rows(updater.store(), "SELECT id FROM T").is_empty());
}

fn tag_updater(rows_sql: &str) -> Updater<SqliteStore> {
    Updater::new(
        Mapping::new().with_rule(tag_rule()),
        store(&format!("{PERSON_TAG}\n{rows_sql}")),
    )
}

#[test]
fn test_add_to_composite_key_inserts_new_key() {
    let updater = tag_updater("INSERT INTO person_tag VALUES (7, 'x');");

    let summary = updater.add(&[literal("person/7", "tag", "a")]).unwrap();

    assert_eq!(
        summary.sql(),
        vec![r#"INSERT INTO "person_tag" ("person_id", "tag") VALUES (7, 'a')"#]
    );
    assert_eq!(
        rows(updater.store(), "SELECT person_id, tag FROM person_tag ORDER BY tag"),
        vec![vec![cell("7"), cell("a")], vec![cell("7"), cell("x")]]
    );
}

#[test]
fn test_add_existing_composite_key_is_noop() {
    let updater = tag_updater("INSERT INTO person_tag VALUES (7, 'x');");

    let summary = updater.add(&[literal("person/7", "tag", "x")]).unwrap();

    assert!(summary.is_empty());
    assert_eq!(rows(updater.store(), "SELECT COUNT(*) FROM person_tag"), vec![vec![cell("1")]]);
}

#[test]
fn test_several_values_for_composite_key_insert_one_row_each() {
    let updater = tag_updater("");

    let summary = updater
        .add(&[
            literal("person/7", "tag", "a"),
            literal("person/7", "tag", "b"),
        ])
        .unwrap();

    assert_eq!(summary.count(MutationKind::Insert), 2);
    assert_eq!(
        rows(updater.store(), "SELECT person_id, tag FROM person_tag ORDER BY tag"),
        vec![vec![cell("7"), cell("a")], vec![cell("7"), cell("b")]]
    );
}

#[test]
fn test_conflicting_values_for_single_column_fail() {
    let mapping = Mapping::new()
        .with_rule(literal_rule("name", "people", "name"))
        .with_rule(literal_rule("email", "people", "email"));
    let updater = Updater::new(
        mapping,
        store(
            "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT, email TEXT);
             INSERT INTO people VALUES (7, NULL, 'a@b');",
        ),
    );

    let err = updater
        .add(&[
            literal("people/7", "name", "Al"),
            literal("people/7", "name", "Bo"),
        ])
        .unwrap_err();

    match err {
        UpdateError::StatementExecution { kind, sql, affected, .. } => {
            assert_eq!(kind, MutationKind::UpdateNonNull);
            assert_eq!(affected, 0);
            assert!(sql.contains("'Bo'"), "{sql}");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(
        rows(updater.store(), "SELECT name, email FROM people"),
        vec![vec![None, cell("a@b")]]
    );
}

#[test]
fn test_language_tagged_rule_takes_only_tagged_literals() {
    let rule = rule("label", "T")
        .object_column("T.name", ValueType::Text)
        .object_language("en")
        .build()
        .unwrap();
    let updater = Updater::new(
        Mapping::new().with_rule(rule),
        store("CREATE TABLE T (id INTEGER PRIMARY KEY, name TEXT);"),
    );

    let plain = updater.add(&[literal("T/7", "label", "x")]).unwrap();
    assert!(plain.is_empty());

    let tagged = Triple::new(iri("T/7"), iri("label"), Node::lang_literal("x", "EN"));
    let summary = updater.add(&[tagged]).unwrap();
    assert_eq!(summary.sql(), vec![r#"INSERT INTO "T" ("id", "name") VALUES (7, 'x')"#]);
}

#[test]
fn test_typed_literal_rule_renders_numeric_value() {
    const XSD_INTEGER: &str = "http://www.w3.org/2001/XMLSchema#integer";
    let rule = rule("age", "T")
        .object_column("T.age", ValueType::Numeric)
        .object_datatype(XSD_INTEGER)
        .build()
        .unwrap();
    let updater = Updater::new(
        Mapping::new().with_rule(rule),
        store("CREATE TABLE T (id INTEGER PRIMARY KEY, age INTEGER);"),
    );

    let untyped = updater.add(&[literal("T/7", "age", "42")]).unwrap();
    assert!(untyped.is_empty());

    let typed = Triple::new(iri("T/7"), iri("age"), Node::typed_literal("42", XSD_INTEGER));
    let summary = updater.add(&[typed]).unwrap();
    assert_eq!(summary.sql(), vec![r#"INSERT INTO "T" ("age", "id") VALUES (42, 7)"#]);
    assert_eq!(rows(updater.store(), "SELECT age FROM T"), vec![vec![cell("42")]]);
}
