//! Statement ordering and execution.
//!
//! Planned [`MutationStatement`]s are linked into a dependency graph by
//! [`DependencyGraphBuilder`] and run in topological order by
//! [`ExecutionScheduler`], which also checks each statement's affected-row
//! count against its minimum.

mod dependency;
mod scheduler;
mod statement;

pub use dependency::{edge_list, DependencyGraph, DependencyGraphBuilder};
pub use scheduler::{ExecutedStatement, ExecutionScheduler};
pub use statement::{MutationKind, MutationStatement};
