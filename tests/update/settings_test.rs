// tests/update/settings_test.rs
mod common;

use std::env;
use std::fs;
use std::path::PathBuf;

use common::*;
use triplewrite::prelude::*;
use triplewrite::store::StoreError;

const CRM_CONFIG: &str = r#"
[execution]
batch = "never"

[database]
name = "crm"
dialect = "sqlite"
path = "${TRIPLEWRITE_SETTINGS_TEST_DIR}/crm.sqlite"
"#;

fn scratch_dir(name: &str) -> PathBuf {
    let dir = env::temp_dir().join(format!("triplewrite-{name}-{}", std::process::id()));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn crm_name_rule() -> TemplateRule {
    TemplateRule::builder(DatabaseHandle::new("crm", Dialect::Sqlite), format!("{EX}name"))
        .subject_uri(&format!("{EX}people/{{people.id}}"))
        .column_type("people.id", ValueType::Numeric)
        .object_column("people.name", ValueType::Text)
        .build()
        .unwrap()
}

#[test]
fn test_updater_opens_database_from_settings() {
    let dir = scratch_dir("open");
    env::set_var("TRIPLEWRITE_SETTINGS_TEST_DIR", &dir);
    let settings = Settings::from_toml(CRM_CONFIG).unwrap();

    let updater = Updater::open(Mapping::new().with_rule(crm_name_rule()), settings.clone()).unwrap();
    assert_eq!(updater.store().database().name, "crm");
    assert_eq!(updater.settings().execution.batch, BatchMode::Never);
    updater
        .store()
        .connection()
        .execute_batch("CREATE TABLE people (id INTEGER PRIMARY KEY, name TEXT);")
        .unwrap();

    let summary = updater.add(&[literal("people/7", "name", "Al")]).unwrap();
    assert_eq!(summary.count(MutationKind::Insert), 1);
    drop(updater);

    let reopened = SqliteStore::open(&settings.database).unwrap();
    assert_eq!(
        rows(&reopened, "SELECT id, name FROM people"),
        vec![vec![cell("7"), cell("Al")]]
    );
    drop(reopened);
    fs::remove_dir_all(&dir).unwrap();
}

#[test]
fn test_open_rejects_non_sqlite_dialect() {
    let settings = Settings::from_toml("[database]\nname = \"crm\"\ndialect = \"postgres\"\n").unwrap();

    let err = Updater::open(Mapping::new().with_rule(crm_name_rule()), settings).unwrap_err();

    assert!(matches!(
        err,
        UpdateError::Store(StoreError::UnsupportedDialect(Dialect::Postgres))
    ));
}

#[test]
fn test_default_settings_open_in_memory_database() {
    let updater = Updater::open(Mapping::new(), Settings::default()).unwrap();

    assert_eq!(updater.store().database().name, "default");
    assert!(updater.add(&[literal("people/7", "name", "Al")]).unwrap().is_empty());
}
