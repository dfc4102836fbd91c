// tests/sql/statement_test.rs
use sqlparser::parser::Parser;
use triplewrite::mapping::{MappingRule, Position, TemplateRule, ValueType};
use triplewrite::model::{Attribute, BindingMap, Node, RelationName, Value};
use triplewrite::sql::condition::parser_dialect;
use triplewrite::sql::{candidates_of, scan_equalities, CandidateMap, Dialect, StatementSynthesizer};
use triplewrite::store::DatabaseHandle;

const DIALECTS: [Dialect; 5] = [
    Dialect::Sqlite,
    Dialect::Postgres,
    Dialect::MySql,
    Dialect::TSql,
    Dialect::DuckDb,
];

fn attr(s: &str) -> Attribute {
    Attribute::parse(s).unwrap()
}

fn parses(sql: &str, dialect: Dialect) {
    let parser = parser_dialect(dialect);
    if let Err(e) = Parser::parse_sql(&*parser, sql) {
        panic!("{dialect}: {e}\nSQL: {sql}");
    }
}

fn row() -> BindingMap {
    BindingMap::from([
        (attr("people.id"), Value::literal("7")),
        (attr("people.name"), Value::literal("'Al'")),
    ])
}

#[test]
fn test_every_statement_parses_in_every_dialect() {
    let table = RelationName::new("people");
    for dialect in DIALECTS {
        let synth = StatementSynthesizer::new(dialect);

        let mut filter: CandidateMap = candidates_of(&BindingMap::from([(
            attr("people.id"),
            Value::literal("7"),
        )]));
        filter.insert(
            attr("people.name"),
            vec![Value::Null, Value::literal("'Al'"), Value::literal("'Bo'")],
        );
        let set = BindingMap::from([(attr("people.name"), Value::literal("'Bo'"))]);
        let lookup = BindingMap::from([
            (attr("people.id"), Value::literal("7")),
            (attr("people.email"), Value::Null),
        ]);

        parses(&synth.insert(&table, &row()), dialect);
        parses(&synth.update(&table, &set, &filter), dialect);
        parses(&synth.delete(&table, &row()), dialect);
        parses(&synth.select(&table, &[attr("people.id")], &lookup, Some(1)), dialect);
        parses(&synth.select(&table, &[attr("people.id")], &lookup, None), dialect);
    }
}

#[test]
fn test_dialect_specific_rendering() {
    let table = RelationName::new("people");
    let lookup = BindingMap::from([(attr("people.id"), Value::literal("7"))]);

    insta::assert_snapshot!(
        StatementSynthesizer::new(Dialect::TSql).select(&table, &[attr("people.id")], &lookup, Some(1)),
        @"SELECT TOP 1 [people].[id] FROM [people] WHERE [people].[id] = 7"
    );
    insta::assert_snapshot!(
        StatementSynthesizer::new(Dialect::MySql).insert(&table, &row()),
        @"INSERT INTO `people` (`id`, `name`) VALUES (7, 'Al')"
    );
}

#[test]
fn test_rule_conditions_scan_back_to_bindings() {
    for dialect in DIALECTS {
        let rule = TemplateRule::builder(DatabaseHandle::new("hr", dialect), "http://ex.org/born")
            .subject_uri("http://ex.org/person/{people.id}")
            .column_type("people.id", ValueType::Numeric)
            .object_column("people.born", ValueType::Date)
            .build()
            .unwrap();

        let subject = rule
            .select(Position::Subject, &Node::uri("http://ex.org/person/-3"))
            .unwrap();
        let bindings = scan_equalities(&subject.condition, dialect).unwrap();
        assert_eq!(bindings[&attr("people.id")], Value::literal("-3"), "{dialect}");

        let object = rule
            .select(Position::Object, &Node::literal("2020-01-01"))
            .unwrap();
        let bindings = scan_equalities(&object.condition, dialect).unwrap();
        let born = bindings[&attr("people.born")].as_sql().to_string();
        assert!(born.contains("2020-01-01"), "{dialect}: {born}");
        assert!(!born.contains(' '), "{dialect}: {born}");
    }
}

#[test]
fn test_scanned_values_render_valid_statements() {
    let rule = TemplateRule::builder(DatabaseHandle::new("hr", Dialect::Postgres), "http://ex.org/born")
        .subject_uri("http://ex.org/person/{people.id}")
        .column_type("people.id", ValueType::Numeric)
        .object_column("people.born", ValueType::Date)
        .build()
        .unwrap();
    let subject = rule
        .select(Position::Subject, &Node::uri("http://ex.org/person/7"))
        .unwrap();
    let object = rule
        .select(Position::Object, &Node::literal("2020-01-01"))
        .unwrap();

    let mut values = scan_equalities(&subject.condition, Dialect::Postgres).unwrap();
    values.extend(scan_equalities(&object.condition, Dialect::Postgres).unwrap());

    let sql = StatementSynthesizer::new(Dialect::Postgres).insert(&RelationName::new("people"), &values);
    insta::assert_snapshot!(sql, @r#"INSERT INTO "people" ("born", "id") VALUES (DATE'2020-01-01', 7)"#);
    parses(&sql, Dialect::Postgres);
}
