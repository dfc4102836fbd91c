//! Errors surfaced by an update request.
//!
//! Every variant is a hard failure: the request stops and, when the
//! connection supports transactions, nothing it executed is committed. A
//! triple that no mapping rule can express is not an error; it is logged
//! and skipped.

use thiserror::Error;

use crate::exec::MutationKind;
use crate::sql::ConditionError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum UpdateError {
    #[error("update unsupported for table {table}: it has no primary key")]
    UnsupportedSchema { table: String },

    #[error("unable to set non-nullable attribute {attribute} to NULL")]
    NonNullableViolation { attribute: String },

    #[error("cyclic dependencies among the following statements:\n{}", .statements.join(";\n"))]
    CyclicDependency { statements: Vec<String> },

    #[error("SQL {kind} affected {affected} row(s), at least {minimum} required\nSQL: {sql}")]
    StatementExecution {
        kind: MutationKind,
        sql: String,
        affected: u64,
        minimum: u64,
    },

    #[error("cannot recover bindings from condition `{condition}`: {reason}")]
    ConditionUnparseable { condition: String, reason: String },

    #[error("request is bound to database {expected} but a mapping rule targets {found}")]
    DatabaseMismatch { expected: String, found: String },

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<ConditionError> for UpdateError {
    fn from(err: ConditionError) -> Self {
        UpdateError::ConditionUnparseable {
            condition: err.condition,
            reason: err.reason,
        }
    }
}

pub type UpdateResult<T> = Result<T, UpdateError>;
