//! Attribute binding extraction.
//!
//! Turns triples into [`ExtractionResult`]s: which column values identify
//! the subject row and which column values the object asserts. Results
//! spanning several tables are split per table along join equivalences
//! before they are grouped into row changes.

mod equivalence;
mod extractor;

pub use equivalence::EquivalenceClasses;
pub use extractor::AttributeBindingExtractor;

use std::collections::BTreeSet;

use crate::model::binding::tables_of;
use crate::model::{AliasMap, Attribute, BindingMap, Join, RelationName};
use crate::store::DatabaseHandle;

/// Bindings recovered from one triple (or one blank-node group) against
/// one mapping rule.
///
/// A failed extraction is a terminal sentinel: no database and empty
/// collections. Splitting or grouping a failed result yields nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractionResult {
    database: Option<DatabaseHandle>,
    subject: BindingMap,
    object: BindingMap,
    joins: BTreeSet<Join>,
    projections: BTreeSet<Attribute>,
    aliases: AliasMap,
}

/// What a side emptied by splitting turns into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptySide {
    /// Reuse the other side's bindings. Adds: the row is still written.
    Borrow,
    /// Drop the table from the split. Deletes and paired changes.
    Drop,
}

impl ExtractionResult {
    pub fn new(
        database: DatabaseHandle,
        subject: BindingMap,
        object: BindingMap,
        joins: Vec<Join>,
        projections: BTreeSet<Attribute>,
        aliases: AliasMap,
    ) -> Self {
        Self {
            database: Some(database),
            subject,
            object,
            joins: joins.into_iter().collect(),
            projections,
            aliases,
        }
    }

    pub fn failed() -> Self {
        Self {
            database: None,
            subject: BindingMap::new(),
            object: BindingMap::new(),
            joins: BTreeSet::new(),
            projections: BTreeSet::new(),
            aliases: AliasMap::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.database.is_some()
    }

    pub fn database(&self) -> Option<&DatabaseHandle> {
        self.database.as_ref()
    }

    pub fn subject(&self) -> &BindingMap {
        &self.subject
    }

    pub fn object(&self) -> &BindingMap {
        &self.object
    }

    pub fn joins(&self) -> &BTreeSet<Join> {
        &self.joins
    }

    pub fn projections(&self) -> &BTreeSet<Attribute> {
        &self.projections
    }

    pub fn aliases(&self) -> &AliasMap {
        &self.aliases
    }

    /// Tables named by the joins and by either side's bindings.
    pub fn tables(&self) -> BTreeSet<RelationName> {
        let mut tables = tables_of(&self.subject);
        tables.extend(tables_of(&self.object));
        tables.extend(
            self.joins
                .iter()
                .flat_map(|j| j.attributes())
                .map(|a| a.relation().clone()),
        );
        tables
    }

    /// Split a multi-table result into single-table results.
    ///
    /// Each table receives every binding whose attribute is join-equivalent
    /// to one of its columns. Results naming fewer than two tables come
    /// back unchanged; per-table results carry no joins.
    pub fn split(self, empty_side: EmptySide) -> Vec<ExtractionResult> {
        let Some(database) = self.database.clone() else {
            return Vec::new();
        };
        let tables = self.tables();
        if tables.len() < 2 {
            return vec![self];
        }

        let classes = EquivalenceClasses::from_joins(&self.joins);
        let mut results = Vec::new();
        for table in &tables {
            let mut subject = project(&self.subject, &classes, table);
            let mut object = project(&self.object, &classes, table);

            if empty_side == EmptySide::Drop && !distinct_sides(&subject, &object) {
                tracing::debug!(table = %table, "no distinct subject and object bindings, table dropped");
                continue;
            }
            if subject.is_empty() {
                subject = object.clone();
            }
            if object.is_empty() {
                object = subject.clone();
            }
            if subject.is_empty() {
                continue;
            }

            let projections = self
                .projections
                .iter()
                .flat_map(|p| classes.class_of(p))
                .filter(|p| p.relation() == table)
                .collect();

            results.push(ExtractionResult::new(
                database.clone(),
                subject,
                object,
                Vec::new(),
                projections,
                self.aliases.clone(),
            ));
        }
        results
    }
}

/// Bindings for `table`, propagated through join equivalences.
fn project(bindings: &BindingMap, classes: &EquivalenceClasses, table: &RelationName) -> BindingMap {
    let mut projected = BindingMap::new();
    for (attr, value) in bindings {
        for member in classes.class_of(attr) {
            if member.relation() == table {
                projected.insert(member, value.clone());
            }
        }
    }
    projected
}

/// Both sides keep at least one attribute the other side lacks.
fn distinct_sides(subject: &BindingMap, object: &BindingMap) -> bool {
    subject.keys().any(|k| !object.contains_key(k)) && object.keys().any(|k| !subject.contains_key(k))
}
