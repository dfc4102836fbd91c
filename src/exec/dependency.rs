// src/exec/dependency.rs
use std::collections::{BTreeMap, BTreeSet};

use petgraph::graph::{DiGraph, NodeIndex};
use tracing::debug;

use super::statement::{MutationKind, MutationStatement};
use crate::error::UpdateResult;
use crate::model::{Attribute, BindingMap, RelationName, Value};
use crate::sql::StatementSynthesizer;
use crate::store::{Connection, ForeignKey, SchemaInspector};

/// Statement dependency graph. Node weights index into the statement
/// slice it was built from; an edge `a -> b` means `a` must run first.
pub type DependencyGraph = DiGraph<usize, ()>;

/// Derives execution-order constraints between statements from the
/// foreign keys of the tables they touch.
///
/// Two situations produce an edge:
///
/// - a written value references a value another statement INSERTs: the
///   INSERT runs first
/// - a DELETE removes a value that a clearing statement still references
///   in the database: the referencing statement runs first
pub struct DependencyGraphBuilder<'a> {
    inspector: &'a dyn SchemaInspector,
    conn: &'a dyn Connection,
    synth: StatementSynthesizer,
}

impl<'a> DependencyGraphBuilder<'a> {
    pub fn new(inspector: &'a dyn SchemaInspector, conn: &'a dyn Connection) -> Self {
        Self {
            inspector,
            conn,
            synth: StatementSynthesizer::new(conn.dialect()),
        }
    }

    pub fn build(&self, statements: &[MutationStatement]) -> UpdateResult<DependencyGraph> {
        let mut graph = DependencyGraph::with_capacity(statements.len(), 0);
        let nodes: Vec<NodeIndex> = (0..statements.len()).map(|i| graph.add_node(i)).collect();

        for fk in self.foreign_keys(statements)? {
            let referencing: Vec<usize> = binding_owners(statements, &fk.referencing);
            let referenced: Vec<usize> = binding_owners(statements, &fk.referenced);

            for &from in &referencing {
                for &to in &referenced {
                    if from == to {
                        continue;
                    }
                    let (before, after) = match self.order(&fk, &statements[from], &statements[to])? {
                        Some(Precedence::ReferencedFirst) => (to, from),
                        Some(Precedence::ReferencingFirst) => (from, to),
                        None => continue,
                    };
                    debug!(
                        referencing = %fk.referencing,
                        referenced = %fk.referenced,
                        before = %statements[before].sql,
                        after = %statements[after].sql,
                        "dependency"
                    );
                    graph.update_edge(nodes[before], nodes[after], ());
                }
            }
        }
        Ok(graph)
    }

    /// Foreign keys of every table any statement touches.
    fn foreign_keys(&self, statements: &[MutationStatement]) -> UpdateResult<BTreeSet<ForeignKey>> {
        let tables: BTreeSet<&RelationName> = statements.iter().map(|s| &s.table).collect();
        let mut keys = BTreeSet::new();
        for table in tables {
            keys.extend(self.inspector.foreign_keys(table)?);
        }
        Ok(keys)
    }

    fn order(
        &self,
        fk: &ForeignKey,
        referencing: &MutationStatement,
        referenced: &MutationStatement,
    ) -> UpdateResult<Option<Precedence>> {
        let (Some(value), Some(target)) = (
            referencing.bindings.get(&fk.referencing),
            referenced.bindings.get(&fk.referenced),
        ) else {
            return Ok(None);
        };

        match (referencing.kind, referenced.kind) {
            (kind, MutationKind::Insert) if kind.writes_values() => {
                Ok((!value.is_null() && value == target).then_some(Precedence::ReferencedFirst))
            }
            (kind, MutationKind::Delete) if kind.removes_values() => {
                if kind == MutationKind::Delete && value.is_null() {
                    return Ok(None);
                }
                if self.holds_null(&fk.referencing, &referencing.subject)? {
                    return Ok(None);
                }
                let current = self.current_values(&fk.referencing, &referencing.subject)?;
                let removed = self.current_values(&fk.referenced, &referenced.subject)?;
                Ok((!current.is_disjoint(&removed)).then_some(Precedence::ReferencingFirst))
            }
            _ => Ok(None),
        }
    }

    /// Whether the row identified by `subject` holds NULL in `attribute`.
    fn holds_null(&self, attribute: &Attribute, subject: &BindingMap) -> UpdateResult<bool> {
        let mut condition = subject.clone();
        condition.insert(attribute.clone(), Value::Null);
        let sql = self
            .synth
            .select(attribute.relation(), &[attribute.clone()], &condition, Some(1));
        Ok(!self.conn.query(&sql)?.is_empty())
    }

    /// Non-NULL values `attribute` currently holds in rows matching `subject`.
    fn current_values(&self, attribute: &Attribute, subject: &BindingMap) -> UpdateResult<BTreeSet<String>> {
        let sql = self
            .synth
            .select(attribute.relation(), &[attribute.clone()], subject, None);
        Ok(self
            .conn
            .query(&sql)?
            .into_iter()
            .filter_map(|row| row.into_iter().next().flatten())
            .collect())
    }
}

enum Precedence {
    ReferencedFirst,
    ReferencingFirst,
}

/// Indices of statements binding `attribute`.
fn binding_owners(statements: &[MutationStatement], attribute: &Attribute) -> Vec<usize> {
    statements
        .iter()
        .enumerate()
        .filter(|(_, s)| s.bindings.contains_key(attribute))
        .map(|(i, _)| i)
        .collect()
}

/// Edges of `graph` as statement index pairs, for inspection.
pub fn edge_list(graph: &DependencyGraph) -> BTreeMap<usize, BTreeSet<usize>> {
    let mut edges: BTreeMap<usize, BTreeSet<usize>> = BTreeMap::new();
    for edge in graph.raw_edges() {
        edges
            .entry(graph[edge.source()])
            .or_default()
            .insert(graph[edge.target()]);
    }
    edges
}
