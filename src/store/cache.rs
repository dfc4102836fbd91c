use std::cell::RefCell;
use std::collections::HashMap;

use super::{ForeignKey, SchemaInspector, StoreResult};
use crate::model::{Attribute, RelationName};

/// Request-scoped memo over a [`SchemaInspector`].
///
/// Every answer is fetched at most once per table; the cache is dropped
/// with the request, so schema changes between requests are always seen.
pub struct SchemaCache<'a> {
    inner: &'a dyn SchemaInspector,
    primary_keys: RefCell<HashMap<RelationName, Vec<Attribute>>>,
    foreign_keys: RefCell<HashMap<RelationName, Vec<ForeignKey>>>,
    columns: RefCell<HashMap<RelationName, Vec<Attribute>>>,
    nullable: RefCell<HashMap<Attribute, bool>>,
}

impl<'a> SchemaCache<'a> {
    pub fn new(inner: &'a dyn SchemaInspector) -> Self {
        Self {
            inner,
            primary_keys: RefCell::new(HashMap::new()),
            foreign_keys: RefCell::new(HashMap::new()),
            columns: RefCell::new(HashMap::new()),
            nullable: RefCell::new(HashMap::new()),
        }
    }
}

fn memo<K, V>(
    map: &RefCell<HashMap<K, V>>,
    key: &K,
    fetch: impl FnOnce() -> StoreResult<V>,
) -> StoreResult<V>
where
    K: std::hash::Hash + Eq + Clone,
    V: Clone,
{
    if let Some(hit) = map.borrow().get(key) {
        return Ok(hit.clone());
    }
    let value = fetch()?;
    map.borrow_mut().insert(key.clone(), value.clone());
    Ok(value)
}

impl SchemaInspector for SchemaCache<'_> {
    fn primary_key_columns(&self, table: &RelationName) -> StoreResult<Vec<Attribute>> {
        memo(&self.primary_keys, table, || {
            self.inner.primary_key_columns(table)
        })
    }

    fn foreign_keys(&self, table: &RelationName) -> StoreResult<Vec<ForeignKey>> {
        memo(&self.foreign_keys, table, || self.inner.foreign_keys(table))
    }

    fn is_nullable(&self, attribute: &Attribute) -> StoreResult<bool> {
        memo(&self.nullable, attribute, || self.inner.is_nullable(attribute))
    }

    fn list_columns(&self, table: &RelationName) -> StoreResult<Vec<Attribute>> {
        memo(&self.columns, table, || self.inner.list_columns(table))
    }
}
