//! SQL generation module.
//!
//! A token-based builder that renders the statements an update request
//! needs, in the target dialect:
//!
//! - [`expr`] - Expression AST and builder DSL
//! - [`dml`] - INSERT, UPDATE, DELETE builders
//! - [`query`] - single-table SELECT for row lookups
//! - [`synth`] - binding-driven statement synthesis
//! - [`condition`] - recovery of equality bindings from rendered conditions
//! - [`token`] - Token types for SQL generation
//! - [`dialect`] - SQL dialect implementations

pub mod condition;
pub mod dialect;
pub mod dml;
pub mod expr;
pub mod query;
pub mod synth;
pub mod token;

#[cfg(test)]
pub mod test_utils;

pub use condition::{scan_equalities, ConditionError};
pub use dialect::{Dialect, SqlDialect};
pub use dml::{Delete, Insert, Update};
pub use expr::{
    attr_col, col, conjunction, disjunction, lit_int, lit_null, lit_str, matches_value,
    table_col, BinaryOperator, Expr, ExprExt, Literal,
};
pub use query::Select;
pub use synth::{candidates_of, CandidateMap, StatementSynthesizer};
pub use token::{Token, TokenStream};
