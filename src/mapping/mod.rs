//! Mapping rules: how triples correspond to rows.
//!
//! A [`MappingRule`] binds one predicate to a relational template. Given a
//! node in subject, predicate or object position, the rule either refuses
//! it or returns a [`Selection`]: the rendered condition that pins the node
//! to column values, plus the joins, projections and aliases of the rule.
//!
//! ```text
//! <http://ex.org/person/7>  ex:name  "Alice"
//!          │                            │
//!   subject template              literal column
//!   {people.id}                   people.name
//!          ▼                            ▼
//!   "people"."id" = 7          "people"."name" = 'Alice'
//! ```

mod rule;
mod template;

pub use rule::{TemplateRule, TemplateRuleBuilder, TermMaker};
pub use template::{Template, ValueType};

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::model::{AliasMap, Attribute, Join, Node};
use crate::store::DatabaseHandle;

#[derive(Debug, Error)]
pub enum MappingError {
    #[error("invalid template `{template}`: {reason}")]
    InvalidTemplate { template: String, reason: String },

    #[error("`{0}` is not a table-qualified column")]
    InvalidAttribute(String),

    #[error("rule for <{predicate}> has no {term} term")]
    Incomplete {
        predicate: String,
        term: &'static str,
    },
}

pub type MappingResult<T> = Result<T, MappingError>;

/// Which part of a triple a node is selected in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Subject,
    Predicate,
    Object,
}

/// What selecting one node against a rule produced.
///
/// `condition` is rendered SQL text: a conjunction of qualified equalities,
/// or `1` when the node adds no condition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub condition: String,
    pub joins: Vec<Join>,
    pub projections: BTreeSet<Attribute>,
    pub aliases: AliasMap,
}

impl Selection {
    pub const NO_CONDITION: &'static str = "1";

    pub fn has_condition(&self) -> bool {
        self.condition != Self::NO_CONDITION
    }
}

pub trait MappingRule: fmt::Debug {
    /// Database the rule's relation lives in.
    fn database(&self) -> &DatabaseHandle;

    /// The predicate this rule produces.
    fn predicate(&self) -> &Node;

    /// Select `node` in `position`; `None` when the rule cannot produce it.
    fn select(&self, position: Position, node: &Node) -> Option<Selection>;

    /// Columns whose values the rule exposes as objects.
    fn mapped_attributes(&self) -> BTreeSet<Attribute>;
}

/// The full rule set of one mapping.
#[derive(Debug, Clone, Default)]
pub struct Mapping {
    rules: Vec<Arc<dyn MappingRule>>,
}

impl Mapping {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rule(mut self, rule: impl MappingRule + 'static) -> Self {
        self.rules.push(Arc::new(rule));
        self
    }

    pub fn rules(&self) -> &[Arc<dyn MappingRule>] {
        &self.rules
    }

    /// Rules whose predicate selects `predicate`.
    pub fn rules_for<'a>(
        &'a self,
        predicate: &'a Node,
    ) -> impl Iterator<Item = &'a Arc<dyn MappingRule>> + 'a {
        self.rules
            .iter()
            .filter(move |rule| rule.predicate() == predicate)
    }

    /// Union of every rule's mapped attributes.
    pub fn mapped_attributes(&self) -> BTreeSet<Attribute> {
        self.rules
            .iter()
            .flat_map(|rule| rule.mapped_attributes())
            .collect()
    }
}
