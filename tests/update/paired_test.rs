// tests/update/paired_test.rs
mod common;

use common::*;
use triplewrite::prelude::*;

fn people_updater(rows_sql: &str) -> Updater<SqliteStore> {
    let mapping = Mapping::new()
        .with_rule(literal_rule("name", "people", "name"))
        .with_rule(literal_rule("email", "people", "email"));
    Updater::new(
        mapping,
        store(&format!(
            "CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT, email TEXT);\n{rows_sql}"
        )),
    )
}

#[test]
fn test_replacement_updates_in_place() {
    let updater = people_updater("INSERT INTO people VALUES (7, 'Al', 'a@b');");

    let summary = updater
        .execute(
            &[literal("people/7", "name", "Bo")],
            &[literal("people/7", "name", "Al")],
        )
        .unwrap();

    insta::assert_snapshot!(summary.sql().join("\n"), @r#"UPDATE "people" SET "name" = 'Bo' WHERE "people"."id" = 7 AND ("people"."name" IS NULL OR "people"."name" = 'Al' OR "people"."name" = 'Bo')"#);
    assert_eq!(
        rows(updater.store(), "SELECT name, email FROM people"),
        vec![vec![cell("Bo"), cell("a@b")]]
    );
}

#[test]
fn test_replacement_of_missing_row_inserts() {
    let updater = people_updater("");

    let summary = updater
        .execute(
            &[literal("people/7", "name", "Bo")],
            &[literal("people/7", "name", "Al")],
        )
        .unwrap();

    assert_eq!(
        summary.sql(),
        vec![r#"INSERT INTO "people" ("id", "name") VALUES (7, 'Bo')"#]
    );
}

#[test]
fn test_replacement_already_applied_is_noop() {
    let updater = people_updater("INSERT INTO people VALUES (7, 'Bo', NULL);");

    let summary = updater
        .execute(
            &[literal("people/7", "name", "Bo")],
            &[literal("people/7", "name", "Al")],
        )
        .unwrap();

    assert!(summary.is_empty());
}

#[test]
fn test_replacement_over_unexpected_value_fails() {
    let updater = people_updater("INSERT INTO people VALUES (7, 'Cy', NULL);");

    let err = updater
        .execute(
            &[literal("people/7", "name", "Bo")],
            &[literal("people/7", "name", "Al")],
        )
        .unwrap_err();

    assert!(matches!(
        err,
        UpdateError::StatementExecution {
            kind: MutationKind::UpdateNonNull,
            affected: 0,
            ..
        }
    ));
    assert_eq!(
        rows(updater.store(), "SELECT name FROM people"),
        vec![vec![cell("Cy")]]
    );
}

#[test]
fn test_delete_insert_batch_runs_phases_in_order() {
    let updater = people_updater(
        "INSERT INTO people VALUES (7, 'Al', NULL);
         INSERT INTO people VALUES (8, 'Di', 'd@e');",
    );

    let summary = updater
        .begin_delete_insert()
        .delete([
            literal("people/7", "name", "Al"),
            literal("people/8", "email", "d@e"),
        ])
        .insert([
            literal("people/7", "name", "Bo"),
            literal("people/7", "email", "b@c"),
        ])
        .commit()
        .unwrap();

    assert_eq!(
        summary.sql(),
        vec![
            r#"UPDATE "people" SET "email" = NULL WHERE "people"."email" = 'd@e' AND "people"."id" = 8"#,
            r#"UPDATE "people" SET "email" = 'b@c' WHERE ("people"."email" IS NULL OR "people"."email" = 'b@c') AND "people"."id" = 7"#,
            r#"UPDATE "people" SET "name" = 'Bo' WHERE "people"."id" = 7 AND ("people"."name" IS NULL OR "people"."name" = 'Al' OR "people"."name" = 'Bo')"#,
        ]
    );
    assert_eq!(
        rows(updater.store(), "SELECT id, name, email FROM people ORDER BY id"),
        vec![
            vec![cell("7"), cell("Bo"), cell("b@c")],
            vec![cell("8"), cell("Di"), None],
        ]
    );
}

#[test]
fn test_replacing_composite_key_value_moves_row() {
    let updater = Updater::new(
        Mapping::new().with_rule(tag_rule()),
        store(&format!(
            "{PERSON_TAG}
             INSERT INTO person_tag VALUES (7, 'x');
             INSERT INTO person_tag VALUES (8, 'x');"
        )),
    );

    let summary = updater
        .execute(
            &[literal("person/7", "tag", "a")],
            &[literal("person/7", "tag", "x")],
        )
        .unwrap();

    assert_eq!(
        summary.sql(),
        vec![r#"UPDATE "person_tag" SET "tag" = 'a' WHERE "person_tag"."person_id" = 7 AND "person_tag"."tag" = 'x'"#]
    );
    assert_eq!(
        rows(updater.store(), "SELECT person_id, tag FROM person_tag ORDER BY person_id"),
        vec![vec![cell("7"), cell("a")], vec![cell("8"), cell("x")]]
    );
}
