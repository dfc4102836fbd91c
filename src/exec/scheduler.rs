// src/exec/scheduler.rs
use std::cmp::Reverse;
use std::collections::BinaryHeap;

use petgraph::algo::tarjan_scc;
use petgraph::graph::NodeIndex;
use petgraph::Direction;
use tracing::{debug, info};

use super::dependency::DependencyGraph;
use super::statement::{MutationKind, MutationStatement};
use crate::config::ExecutionSettings;
use crate::error::{UpdateError, UpdateResult};
use crate::store::Connection;

/// A statement that ran, with the row count the driver reported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutedStatement {
    pub kind: MutationKind,
    pub sql: String,
    pub affected: Option<u64>,
}

/// Orders statements along their dependencies and runs them.
pub struct ExecutionScheduler<'a> {
    conn: &'a dyn Connection,
    settings: &'a ExecutionSettings,
}

impl<'a> ExecutionScheduler<'a> {
    pub fn new(conn: &'a dyn Connection, settings: &'a ExecutionSettings) -> Self {
        Self { conn, settings }
    }

    /// Topological order of `statements`.
    ///
    /// Statements without a mutual constraint keep their planned order.
    /// Any cycle, including a statement depending on itself, fails with
    /// the SQL of every statement on it.
    pub fn order(
        &self,
        graph: &DependencyGraph,
        statements: Vec<MutationStatement>,
    ) -> UpdateResult<Vec<MutationStatement>> {
        let mut cyclic: Vec<usize> = tarjan_scc(graph)
            .into_iter()
            .filter(|scc| scc.len() > 1 || graph.contains_edge(scc[0], scc[0]))
            .flatten()
            .map(|node| graph[node])
            .collect();
        if !cyclic.is_empty() {
            cyclic.sort_unstable();
            return Err(UpdateError::CyclicDependency {
                statements: cyclic.into_iter().map(|i| statements[i].sql.clone()).collect(),
            });
        }

        let mut in_degree: Vec<usize> = graph
            .node_indices()
            .map(|n| graph.neighbors_directed(n, Direction::Incoming).count())
            .collect();
        let mut ready: BinaryHeap<Reverse<usize>> = graph
            .node_indices()
            .filter(|n| in_degree[n.index()] == 0)
            .map(|n| Reverse(n.index()))
            .collect();

        let mut order = Vec::with_capacity(statements.len());
        while let Some(Reverse(next)) = ready.pop() {
            order.push(next);
            for succ in graph.neighbors_directed(NodeIndex::new(next), Direction::Outgoing) {
                in_degree[succ.index()] -= 1;
                if in_degree[succ.index()] == 0 {
                    ready.push(Reverse(succ.index()));
                }
            }
        }

        let mut slots: Vec<Option<MutationStatement>> = statements.into_iter().map(Some).collect();
        Ok(order.into_iter().filter_map(|i| slots[i].take()).collect())
    }

    /// Run `statements` in the given order and verify their row counts.
    ///
    /// In batch mode everything goes to the driver at once and counts are
    /// checked afterwards; the caller owns the surrounding transaction.
    /// Otherwise each statement runs and is checked on its own.
    pub fn execute(
        &self,
        statements: &[MutationStatement],
        batch: bool,
    ) -> UpdateResult<Vec<ExecutedStatement>> {
        if statements.is_empty() {
            return Ok(Vec::new());
        }

        let executed = if batch {
            let sqls: Vec<&str> = statements.iter().map(|s| s.sql.as_str()).collect();
            debug!(count = sqls.len(), "executing batch");
            let counts = self.conn.execute_batch(&sqls)?;
            let executed: Vec<ExecutedStatement> = statements
                .iter()
                .zip(counts)
                .map(|(s, affected)| record(s, affected))
                .collect();
            for (statement, run) in statements.iter().zip(&executed) {
                self.verify(statement, run.affected)?;
            }
            executed
        } else {
            let mut executed_so_far = Vec::with_capacity(statements.len());
            for statement in statements {
                debug!(sql = %statement.sql, "executing");
                let affected = self.conn.execute(&statement.sql)?;
                self.verify(statement, affected)?;
                executed_so_far.push(record(statement, affected));
            }
            executed_so_far
        };

        info!(count = executed.len(), batch, "statements executed");
        Ok(executed)
    }

    fn verify(&self, statement: &MutationStatement, affected: Option<u64>) -> UpdateResult<()> {
        if !self.settings.verify_row_counts {
            debug!(sql = %statement.sql, ?affected, "row count not verified");
            return Ok(());
        }
        match affected {
            Some(n) if n < statement.minimum_rows => Err(UpdateError::StatementExecution {
                kind: statement.kind,
                sql: statement.sql.clone(),
                affected: n,
                minimum: statement.minimum_rows,
            }),
            _ => Ok(()),
        }
    }
}

fn record(statement: &MutationStatement, affected: Option<u64>) -> ExecutedStatement {
    ExecutedStatement {
        kind: statement.kind,
        sql: statement.sql.clone(),
        affected,
    }
}
