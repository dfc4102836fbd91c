//! Renders mutation and lookup statements from attribute/value bindings.
//!
//! Values are already-rendered SQL literals; nothing here escapes them.
//! Column lists and SET targets are unqualified, WHERE clauses use fully
//! qualified attributes and compare the NULL marker with `IS NULL`.

use std::collections::BTreeMap;

use super::dialect::Dialect;
use super::dml::{Delete, Insert, Update};
use super::expr::{attr_col, conjunction, disjunction, matches_value, Expr};
use super::query::Select;
use crate::model::{Attribute, BindingMap, RelationName, Value};

/// Candidate prior values per attribute for an UPDATE's WHERE clause.
pub type CandidateMap = BTreeMap<Attribute, Vec<Value>>;

#[derive(Debug, Clone, Copy)]
pub struct StatementSynthesizer {
    dialect: Dialect,
}

impl StatementSynthesizer {
    pub fn new(dialect: Dialect) -> Self {
        Self { dialect }
    }

    pub fn dialect(&self) -> Dialect {
        self.dialect
    }

    /// `INSERT INTO table (cols...) VALUES (vals...)`
    pub fn insert(&self, table: &RelationName, values: &BindingMap) -> String {
        let mut insert = Insert::into(table.table())
            .columns(values.keys().map(|a| a.column().to_string()))
            .values(values.values().map(Expr::from));
        if let Some(schema) = table.schema() {
            insert = insert.schema(schema);
        }
        insert.to_sql(self.dialect)
    }

    /// `UPDATE table SET ... WHERE` conjunction of per-attribute disjunctions.
    pub fn update(&self, table: &RelationName, set: &BindingMap, filter: &CandidateMap) -> String {
        let mut update = Update::table(table.table());
        if let Some(schema) = table.schema() {
            update = update.schema(schema);
        }
        for (attr, value) in set {
            update = update.set(attr.column(), value);
        }
        if let Some(condition) = candidate_filter(filter) {
            update = update.filter(condition);
        }
        update.to_sql(self.dialect)
    }

    /// `DELETE FROM table WHERE` conjunction of equalities.
    pub fn delete(&self, table: &RelationName, values: &BindingMap) -> String {
        let mut delete = Delete::from(table.table());
        if let Some(schema) = table.schema() {
            delete = delete.schema(schema);
        }
        if let Some(condition) = equality_filter(values) {
            delete = delete.filter(condition);
        }
        delete.to_sql(self.dialect)
    }

    /// Lookup `SELECT columns FROM table WHERE ...`, optionally row-limited.
    pub fn select(
        &self,
        table: &RelationName,
        columns: &[Attribute],
        condition: &BindingMap,
        limit: Option<u64>,
    ) -> String {
        let mut select = Select::from(table.table()).columns(columns.iter().map(attr_col));
        if let Some(schema) = table.schema() {
            select = select.schema(schema);
        }
        if let Some(filter) = equality_filter(condition) {
            select = select.filter(filter);
        }
        if let Some(n) = limit {
            select = select.limit(n);
        }
        select.to_sql(self.dialect)
    }
}

fn equality_filter(values: &BindingMap) -> Option<Expr> {
    conjunction(values.iter().map(|(a, v)| matches_value(a, v)))
}

fn candidate_filter(filter: &CandidateMap) -> Option<Expr> {
    conjunction(
        filter
            .iter()
            .filter_map(|(attr, values)| disjunction(values.iter().map(|v| matches_value(attr, v)))),
    )
}

/// Lift scalar bindings into single-candidate filters.
pub fn candidates_of(bindings: &BindingMap) -> CandidateMap {
    bindings
        .iter()
        .map(|(a, v)| (a.clone(), vec![v.clone()]))
        .collect()
}
