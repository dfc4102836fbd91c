//! Relational and graph data model shared by every pipeline stage.

pub mod binding;
pub mod node;
pub mod relation;

pub use binding::{BindingMap, Value};
pub use node::{Node, Triple};
pub use relation::{AliasMap, Attribute, Join, RelationName};
