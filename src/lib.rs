//! # triplewrite
//!
//! Writes graph triple additions and removals back into a relational
//! database through a mapping.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │          Update request (added / deleted triples)        │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [plan::Partition]
//! ┌─────────────────────────────────────────────────────────┐
//! │   unpaired deletes  →  unpaired adds  →  paired updates  │
//! └─────────────────────────────────────────────────────────┘
//!                          │ per phase
//!                          ▼ [extract]
//! ┌─────────────────────────────────────────────────────────┐
//! │     ExtractionResult (subject / object bindings)         │
//! │     split per table along join equivalences              │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [plan]
//! ┌─────────────────────────────────────────────────────────┐
//! │     RowChange → INSERT / UPDATE / DELETE statements      │
//! │     (probing current rows through the store)             │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [exec]
//! ┌─────────────────────────────────────────────────────────┐
//! │   FK dependency graph → topological order → execution    │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! [`Updater`] drives a request end to end. Mapping rules implement
//! [`mapping::MappingRule`]; databases implement [`store::Store`], with
//! [`store::SqliteStore`] as the bundled adapter.

pub mod config;
pub mod error;
pub mod exec;
pub mod extract;
pub mod mapping;
pub mod model;
pub mod plan;
pub mod sql;
pub mod store;
pub mod updater;

/// Re-exports for convenient usage.
pub mod prelude {
    pub use crate::config::{BatchMode, ExecutionSettings, Settings};
    pub use crate::error::{UpdateError, UpdateResult};
    pub use crate::exec::{ExecutedStatement, MutationKind, MutationStatement};
    pub use crate::mapping::{Mapping, MappingRule, TemplateRule, ValueType};
    pub use crate::model::{Attribute, BindingMap, Node, RelationName, Triple, Value};
    pub use crate::sql::{Dialect, SqlDialect};
    pub use crate::store::{Connection, DatabaseHandle, SchemaInspector, SqliteStore, Store};
    pub use crate::updater::{DeleteInsert, UpdateSummary, Updater};
}

// Also export at crate root for convenience
pub use error::{UpdateError, UpdateResult};
pub use updater::{UpdateSummary, Updater};
