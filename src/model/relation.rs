// src/model/relation.rs
use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

/// A table name, optionally schema-qualified.
///
/// Equality, hashing and ordering go through a comparison key that folds
/// case unless the relation was declared case-sensitive. The original
/// spelling is kept for rendering.
#[derive(Debug, Clone)]
pub struct RelationName {
    schema: Option<String>,
    table: String,
    case_sensitive: bool,
}

impl RelationName {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            schema: None,
            table: table.into(),
            case_sensitive: false,
        }
    }

    pub fn with_schema(schema: impl Into<String>, table: impl Into<String>) -> Self {
        Self {
            schema: Some(schema.into()),
            table: table.into(),
            case_sensitive: false,
        }
    }

    /// Compare names exactly instead of case-insensitively.
    pub fn case_sensitive(mut self) -> Self {
        self.case_sensitive = true;
        self
    }

    /// Parse `table` or `schema.table`.
    pub fn parse(name: &str) -> Option<Self> {
        let parts: Vec<&str> = name.split('.').collect();
        match parts.as_slice() {
            [table] if !table.is_empty() => Some(Self::new(*table)),
            [schema, table] if !schema.is_empty() && !table.is_empty() => {
                Some(Self::with_schema(*schema, *table))
            }
            _ => None,
        }
    }

    pub fn schema(&self) -> Option<&str> {
        self.schema.as_deref()
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    fn fold(&self, s: &str) -> String {
        if self.case_sensitive {
            s.to_string()
        } else {
            s.to_lowercase()
        }
    }

    fn key(&self) -> (Option<String>, String) {
        (
            self.schema.as_deref().map(|s| self.fold(s)),
            self.fold(&self.table),
        )
    }
}

impl PartialEq for RelationName {
    fn eq(&self, other: &Self) -> bool {
        self.key() == other.key()
    }
}

impl Eq for RelationName {}

impl Hash for RelationName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key().hash(state);
    }
}

impl PartialOrd for RelationName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for RelationName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key().cmp(&other.key())
    }
}

impl fmt::Display for RelationName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.schema {
            Some(schema) => write!(f, "{}.{}", schema, self.table),
            None => write!(f, "{}", self.table),
        }
    }
}

/// A table-qualified column reference.
#[derive(Debug, Clone)]
pub struct Attribute {
    relation: RelationName,
    column: String,
}

impl Attribute {
    pub fn new(relation: RelationName, column: impl Into<String>) -> Self {
        Self {
            relation,
            column: column.into(),
        }
    }

    /// Parse `table.column` or `schema.table.column`.
    pub fn parse(name: &str) -> Option<Self> {
        let (relation, column) = name.rsplit_once('.')?;
        if column.is_empty() {
            return None;
        }
        Some(Self::new(RelationName::parse(relation)?, column))
    }

    pub fn relation(&self) -> &RelationName {
        &self.relation
    }

    pub fn column(&self) -> &str {
        &self.column
    }

    /// Resolve the relation through an alias map.
    pub fn resolve(&self, aliases: &AliasMap) -> Attribute {
        Attribute::new(aliases.original_of(&self.relation), self.column.clone())
    }

    fn column_key(&self) -> String {
        self.column.to_lowercase()
    }
}

impl PartialEq for Attribute {
    fn eq(&self, other: &Self) -> bool {
        self.relation == other.relation && self.column_key() == other.column_key()
    }
}

impl Eq for Attribute {}

impl Hash for Attribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.relation.hash(state);
        self.column_key().hash(state);
    }
}

impl PartialOrd for Attribute {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Attribute {
    fn cmp(&self, other: &Self) -> Ordering {
        self.relation
            .cmp(&other.relation)
            .then_with(|| self.column_key().cmp(&other.column_key()))
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.relation, self.column)
    }
}

/// Equi-join between two attribute lists.
///
/// Only single-attribute joins take part in equivalence-class closure;
/// wider joins are carried along but ignored there.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Join {
    pub left: Vec<Attribute>,
    pub right: Vec<Attribute>,
}

impl Join {
    pub fn new(left: Vec<Attribute>, right: Vec<Attribute>) -> Self {
        Self { left, right }
    }

    pub fn single(left: Attribute, right: Attribute) -> Self {
        Self {
            left: vec![left],
            right: vec![right],
        }
    }

    /// The joined pair when this is a single-attribute join.
    pub fn as_pair(&self) -> Option<(&Attribute, &Attribute)> {
        match (self.left.as_slice(), self.right.as_slice()) {
            ([l], [r]) => Some((l, r)),
            _ => None,
        }
    }

    pub fn attributes(&self) -> impl Iterator<Item = &Attribute> {
        self.left.iter().chain(self.right.iter())
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let side = |attrs: &[Attribute]| {
            attrs
                .iter()
                .map(|a| a.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };
        write!(f, "{} = {}", side(&self.left), side(&self.right))
    }
}

/// Alias name -> base relation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    aliases: BTreeMap<RelationName, RelationName>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, alias: RelationName, original: RelationName) {
        self.aliases.insert(alias, original);
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// The base relation behind `relation`, or `relation` itself.
    pub fn original_of(&self, relation: &RelationName) -> RelationName {
        self.aliases
            .get(relation)
            .cloned()
            .unwrap_or_else(|| relation.clone())
    }

    /// Union of two alias maps; entries of `self` win on conflict.
    pub fn merged(&self, other: &AliasMap) -> AliasMap {
        let mut aliases = other.aliases.clone();
        aliases.extend(self.aliases.iter().map(|(k, v)| (k.clone(), v.clone())));
        AliasMap { aliases }
    }
}
