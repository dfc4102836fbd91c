// src/plan/grouper.rs
use std::collections::BTreeMap;

use tracing::warn;

use super::{ObjectBindings, RowChange};
use crate::error::{UpdateError, UpdateResult};
use crate::extract::ExtractionResult;
use crate::model::binding::resolve_aliases;
use crate::model::{BindingMap, RelationName};
use crate::store::SchemaInspector;

/// Buckets single-table extraction results by the row they address.
///
/// Two results address the same row when they name the same base table
/// and carry the same primary-key bindings. Buckets keep first-seen order.
pub struct ChangeGrouper<'a> {
    inspector: &'a dyn SchemaInspector,
}

impl<'a> ChangeGrouper<'a> {
    pub fn new(inspector: &'a dyn SchemaInspector) -> Self {
        Self { inspector }
    }

    pub fn group(&self, results: Vec<ExtractionResult>) -> UpdateResult<Vec<RowChange>> {
        let mut changes: Vec<RowChange> = Vec::new();
        let mut index: BTreeMap<(RelationName, BindingMap), usize> = BTreeMap::new();

        for result in results {
            let Some(database) = result.database().cloned() else {
                continue;
            };
            let mut tables = result.tables().into_iter();
            let (Some(table), None) = (tables.next(), tables.next()) else {
                warn!(tables = ?result.tables(), "result spans several tables after splitting, skipped");
                continue;
            };

            let table = result.aliases().original_of(&table);
            let primary_key = self.inspector.primary_key_columns(&table)?;
            if primary_key.is_empty() {
                return Err(UpdateError::UnsupportedSchema {
                    table: table.to_string(),
                });
            }

            let mut subject = resolve_aliases(result.subject(), result.aliases());
            subject.retain(|attr, _| primary_key.contains(attr));
            let object = ObjectBindings {
                values: resolve_aliases(result.object(), result.aliases()),
                projections: result
                    .projections()
                    .iter()
                    .map(|p| p.resolve(result.aliases()))
                    .collect(),
            };

            let key = (table.clone(), subject.clone());
            match index.get(&key) {
                Some(&i) => changes[i].objects.push(object),
                None => {
                    index.insert(key, changes.len());
                    changes.push(RowChange {
                        database,
                        table,
                        subject,
                        objects: vec![object],
                    });
                }
            }
        }
        Ok(changes)
    }
}
