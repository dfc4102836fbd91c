// src/model/binding.rs
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::relation::{AliasMap, Attribute, RelationName};

/// A bound column value: SQL literal text already rendered by the mapping
/// layer, or the NULL marker.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Value {
    Literal(String),
    Null,
}

impl Value {
    pub fn literal(sql: impl Into<String>) -> Self {
        Value::Literal(sql.into())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// The SQL text of this value.
    pub fn as_sql(&self) -> &str {
        match self {
            Value::Literal(s) => s,
            Value::Null => "NULL",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Attribute -> value. Keys are unique; ordering only makes rendering stable.
pub type BindingMap = BTreeMap<Attribute, Value>;

/// Tables mentioned by the keys of `bindings`.
pub fn tables_of(bindings: &BindingMap) -> BTreeSet<RelationName> {
    bindings.keys().map(|a| a.relation().clone()).collect()
}

/// Rewrite every key through the alias map.
pub fn resolve_aliases(bindings: &BindingMap, aliases: &AliasMap) -> BindingMap {
    if aliases.is_empty() {
        return bindings.clone();
    }
    bindings
        .iter()
        .map(|(a, v)| (a.resolve(aliases), v.clone()))
        .collect()
}

pub fn format_bindings(bindings: &BindingMap) -> String {
    let parts: Vec<String> = bindings
        .iter()
        .map(|(a, v)| format!("{}={}", a, v))
        .collect();
    format!("{{{}}}", parts.join(", "))
}
