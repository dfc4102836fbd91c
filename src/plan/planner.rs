// src/plan/planner.rs
use std::collections::BTreeSet;

use tracing::{debug, warn};

use super::{ObjectBindings, PairedChange, RowChange};
use crate::error::{UpdateError, UpdateResult};
use crate::exec::{MutationKind, MutationStatement};
use crate::model::binding::format_bindings;
use crate::model::{Attribute, BindingMap, RelationName, Value};
use crate::sql::{candidates_of, CandidateMap, StatementSynthesizer};
use crate::store::{Connection, DatabaseHandle, SchemaInspector};

/// Chooses the statements that realize a row change.
///
/// Choices depend on what the row holds now, so the planner queries the
/// database with single-row SELECTs. Planning for one phase of a request
/// must happen after the previous phase has executed.
pub struct RowMutationPlanner<'a> {
    inspector: &'a dyn SchemaInspector,
    conn: &'a dyn Connection,
    mapped: &'a BTreeSet<Attribute>,
    synth: StatementSynthesizer,
}

impl<'a> RowMutationPlanner<'a> {
    /// `mapped` is the set of columns the mapping exposes as objects; only
    /// those count when deciding whether a delete empties a row.
    pub fn new(
        inspector: &'a dyn SchemaInspector,
        conn: &'a dyn Connection,
        mapped: &'a BTreeSet<Attribute>,
    ) -> Self {
        Self {
            inspector,
            conn,
            mapped,
            synth: StatementSynthesizer::new(conn.dialect()),
        }
    }

    /// Statements that make the row hold the added values.
    ///
    /// Nothing is emitted when a row already holds them. A row whose full
    /// primary key is already present is completed with an UPDATE that only
    /// fills NULL columns; otherwise the row is INSERTed. Conflicting values
    /// for one attribute are planned one extraction at a time.
    pub fn plan_add(&self, change: &RowChange) -> UpdateResult<Vec<MutationStatement>> {
        let primary_key = self.require_primary_key(&change.table)?;
        let candidates: Vec<BindingMap> = if change.has_conflicting_values() {
            change.objects.iter().map(|o| o.values.clone()).collect()
        } else {
            vec![change.merged_values()]
        };

        let mut statements = Vec::new();
        for values in candidates {
            let mut row = change.subject.clone();
            row.extend(values.clone());
            if self.row_exists(&change.table, &primary_key, &row)? {
                debug!(table = %change.table, row = %format_bindings(&row), "row already holds values");
                continue;
            }

            let key = key_of(&row, &primary_key);
            if !self.key_exists(&change.table, &primary_key, &key)? {
                statements.push(self.statement(
                    MutationKind::Insert,
                    &change.database,
                    &change.table,
                    &change.subject,
                    self.synth.insert(&change.table, &row),
                    row,
                ));
                continue;
            }

            let set = without_key(&values, &primary_key);
            if set.is_empty() {
                continue;
            }
            let mut filter = candidates_of(&key);
            for (attr, value) in &set {
                filter.insert(attr.clone(), vec![Value::Null, value.clone()]);
            }
            statements.push(self.update_non_null(&change.database, &change.table, &change.subject, set, &filter));
        }
        Ok(statements)
    }

    /// Statements that remove the deleted values from the row.
    ///
    /// When the values are all that is left of the row's mapped columns,
    /// the whole row is DELETEd. Otherwise each value's column is set to
    /// NULL, which fails for a non-nullable column that holds the value.
    pub fn plan_delete(&self, change: &RowChange) -> UpdateResult<Vec<MutationStatement>> {
        let primary_key = self.require_primary_key(&change.table)?;
        if change.subject.is_empty() {
            warn!(table = %change.table, "deleted values do not identify a row, skipped");
            return Ok(Vec::new());
        }

        let groups: Vec<BindingMap> = if change.has_conflicting_values() {
            change.objects.iter().map(deleted_values).collect()
        } else {
            vec![change.objects.iter().flat_map(deleted_values).collect()]
        };

        let mut statements = Vec::new();
        for values in groups {
            if values.is_empty() {
                continue;
            }
            if self.removes_whole_row(change, &primary_key, &values)? {
                let mut row = change.subject.clone();
                row.extend(values);
                statements.push(self.statement(
                    MutationKind::Delete,
                    &change.database,
                    &change.table,
                    &change.subject,
                    self.synth.delete(&change.table, &row),
                    row,
                ));
                continue;
            }

            for (attr, value) in &values {
                if !self.inspector.is_nullable(attr)? {
                    let mut holding = change.subject.clone();
                    holding.insert(attr.clone(), value.clone());
                    if self.row_exists(&change.table, &primary_key, &holding)? {
                        return Err(UpdateError::NonNullableViolation {
                            attribute: attr.to_string(),
                        });
                    }
                }
                let set = BindingMap::from([(attr.clone(), Value::Null)]);
                let mut filter = candidates_of(&change.subject);
                filter.insert(attr.clone(), vec![value.clone()]);
                statements.push(self.statement(
                    MutationKind::UpdateToNull,
                    &change.database,
                    &change.table,
                    &change.subject,
                    self.synth.update(&change.table, &set, &filter),
                    set,
                ));
            }
        }
        Ok(statements)
    }

    /// Statements that replace old values with new ones in place.
    ///
    /// The row is located by the primary key the new values give it, or
    /// failing that by the key the old values gave it, so a replacement may
    /// move a row to a new key. The UPDATE only applies where each non-key
    /// column is NULL, still holds the old value, or already holds the new
    /// one. A row found under neither key is INSERTed with the new values.
    pub fn plan_paired(&self, change: &PairedChange) -> UpdateResult<Vec<MutationStatement>> {
        let primary_key = self.require_primary_key(&change.table)?;
        let mut row = change.subject.clone();
        row.extend(change.new.clone());
        if self.row_exists(&change.table, &primary_key, &row)? {
            debug!(table = %change.table, row = %format_bindings(&row), "row already holds values");
            return Ok(Vec::new());
        }

        let key = key_of(&row, &primary_key);
        if self.key_exists(&change.table, &primary_key, &key)? {
            let set = without_key(&change.new, &primary_key);
            if set.is_empty() {
                return Ok(Vec::new());
            }
            let filter = replacement_filter(&key, &set, &change.old, &primary_key);
            return Ok(vec![self.update_non_null(
                &change.database,
                &change.table,
                &change.subject,
                set,
                &filter,
            )]);
        }

        let mut old_row = change.subject.clone();
        old_row.extend(change.old.clone());
        let old_key = key_of(&old_row, &primary_key);
        if old_key != key && self.key_exists(&change.table, &primary_key, &old_key)? {
            let set: BindingMap = change
                .new
                .iter()
                .filter(|(attr, _)| !change.subject.contains_key(*attr))
                .map(|(a, v)| (a.clone(), v.clone()))
                .collect();
            debug!(table = %change.table, from = %format_bindings(&old_key), to = %format_bindings(&key), "row key replaced");
            let filter = replacement_filter(&old_key, &set, &change.old, &primary_key);
            return Ok(vec![self.update_non_null(
                &change.database,
                &change.table,
                &change.subject,
                set,
                &filter,
            )]);
        }

        Ok(vec![self.statement(
            MutationKind::Insert,
            &change.database,
            &change.table,
            &change.subject,
            self.synth.insert(&change.table, &row),
            row,
        )])
    }

    fn require_primary_key(&self, table: &RelationName) -> UpdateResult<Vec<Attribute>> {
        let primary_key = self.inspector.primary_key_columns(table)?;
        if primary_key.is_empty() {
            return Err(UpdateError::UnsupportedSchema {
                table: table.to_string(),
            });
        }
        Ok(primary_key)
    }

    /// Whether some row of `table` matches `condition`.
    fn row_exists(
        &self,
        table: &RelationName,
        primary_key: &[Attribute],
        condition: &BindingMap,
    ) -> UpdateResult<bool> {
        let sql = self.synth.select(table, primary_key, condition, Some(1));
        let found = !self.conn.query(&sql)?.is_empty();
        debug!(sql = %sql, found, "row lookup");
        Ok(found)
    }

    /// Whether a row with the full primary key `key` exists. A key missing
    /// some primary-key column never matches.
    fn key_exists(
        &self,
        table: &RelationName,
        primary_key: &[Attribute],
        key: &BindingMap,
    ) -> UpdateResult<bool> {
        if key.len() < primary_key.len() {
            return Ok(false);
        }
        self.row_exists(table, primary_key, key)
    }

    /// Whether removing `values` leaves every other mapped column NULL.
    fn removes_whole_row(
        &self,
        change: &RowChange,
        primary_key: &[Attribute],
        values: &BindingMap,
    ) -> UpdateResult<bool> {
        let remaining: Vec<Attribute> = self
            .inspector
            .list_columns(&change.table)?
            .into_iter()
            .filter(|c| {
                self.mapped.contains(c)
                    && !primary_key.contains(c)
                    && !change.subject.contains_key(c)
                    && !values.contains_key(c)
            })
            .collect();
        if remaining.is_empty() {
            return Ok(true);
        }

        let mut condition = change.subject.clone();
        condition.extend(remaining.into_iter().map(|c| (c, Value::Null)));
        self.row_exists(&change.table, primary_key, &condition)
    }

    fn update_non_null(
        &self,
        database: &DatabaseHandle,
        table: &RelationName,
        subject: &BindingMap,
        set: BindingMap,
        filter: &CandidateMap,
    ) -> MutationStatement {
        let sql = self.synth.update(table, &set, filter);
        self.statement(MutationKind::UpdateNonNull, database, table, subject, sql, set)
    }

    fn statement(
        &self,
        kind: MutationKind,
        database: &DatabaseHandle,
        table: &RelationName,
        subject: &BindingMap,
        sql: String,
        bindings: BindingMap,
    ) -> MutationStatement {
        debug!(kind = %kind, sql = %sql, "planned");
        MutationStatement::new(kind, table.clone(), database.clone(), bindings, subject.clone(), sql)
    }
}

/// The values one extraction asks to delete. With several values, only
/// projected columns count; the rest are fixed rule conditions.
fn deleted_values(object: &ObjectBindings) -> BindingMap {
    if object.values.len() <= 1 {
        return object.values.clone();
    }
    object
        .values
        .iter()
        .filter(|(attr, _)| object.projections.contains(*attr))
        .map(|(a, v)| (a.clone(), v.clone()))
        .collect()
}

/// The primary-key bindings of `row`.
fn key_of(row: &BindingMap, primary_key: &[Attribute]) -> BindingMap {
    row.iter()
        .filter(|(attr, _)| primary_key.contains(*attr))
        .map(|(a, v)| (a.clone(), v.clone()))
        .collect()
}

/// WHERE candidates for replacing values: the row's key, then each non-key
/// column as NULL, its old value or its new value.
fn replacement_filter(
    key: &BindingMap,
    set: &BindingMap,
    old: &BindingMap,
    primary_key: &[Attribute],
) -> CandidateMap {
    let mut filter = candidates_of(key);
    for (attr, value) in set.iter().filter(|(attr, _)| !primary_key.contains(*attr)) {
        let mut accepted = vec![Value::Null];
        if let Some(previous) = old.get(attr) {
            if !accepted.contains(previous) {
                accepted.push(previous.clone());
            }
        }
        if !accepted.contains(value) {
            accepted.push(value.clone());
        }
        filter.insert(attr.clone(), accepted);
    }
    filter
}

fn without_key(values: &BindingMap, primary_key: &[Attribute]) -> BindingMap {
    values
        .iter()
        .filter(|(attr, _)| !primary_key.contains(*attr))
        .map(|(a, v)| (a.clone(), v.clone()))
        .collect()
}
