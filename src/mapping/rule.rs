use std::collections::{BTreeMap, BTreeSet};

use super::template::{Template, ValueType};
use super::{MappingError, MappingResult, MappingRule, Position, Selection};
use crate::model::{AliasMap, Attribute, BindingMap, Join, Node, RelationName, Value};
use crate::sql::{conjunction, matches_value, Dialect};
use crate::store::DatabaseHandle;

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

/// Datatype with `xsd:string` folded into "untyped".
fn plain_datatype(datatype: &Option<String>) -> Option<&str> {
    datatype.as_deref().filter(|d| *d != XSD_STRING)
}

/// Produces one term of a triple from column values.
#[derive(Debug, Clone)]
pub enum TermMaker {
    /// IRI built from a template.
    Uri(Template),
    /// Blank node whose label is built from a template.
    Blank(Template),
    /// Literal read from one column.
    Literal {
        column: Attribute,
        value_type: ValueType,
        language: Option<String>,
        datatype: Option<String>,
    },
    /// A fixed node that carries no column values.
    Constant(Node),
}

impl TermMaker {
    pub fn columns(&self) -> Vec<&Attribute> {
        match self {
            TermMaker::Uri(t) | TermMaker::Blank(t) => t.columns().collect(),
            TermMaker::Literal { column, .. } => vec![column],
            TermMaker::Constant(_) => Vec::new(),
        }
    }

    fn bindings(
        &self,
        node: &Node,
        column_types: &BTreeMap<Attribute, ValueType>,
        dialect: Dialect,
    ) -> Option<BindingMap> {
        let from_template = |template: &Template, text: &str| -> Option<BindingMap> {
            template
                .match_text(text)?
                .into_iter()
                .map(|(column, raw)| {
                    let value_type = column_types.get(&column).copied().unwrap_or_default();
                    let literal = value_type.render(&raw, dialect)?;
                    Some((column, Value::Literal(literal)))
                })
                .collect()
        };

        match (self, node) {
            (TermMaker::Uri(template), Node::Uri(iri)) => from_template(template, iri),
            (TermMaker::Blank(template), Node::Blank(label)) => from_template(template, label),
            (
                TermMaker::Literal {
                    column,
                    value_type,
                    language,
                    datatype,
                },
                Node::Literal {
                    lexical,
                    language: node_language,
                    datatype: node_datatype,
                },
            ) => {
                let same_language = match (language, node_language) {
                    (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
                    (None, None) => true,
                    _ => false,
                };
                if !same_language || plain_datatype(datatype) != plain_datatype(node_datatype) {
                    return None;
                }
                let literal = value_type.render(lexical, dialect)?;
                Some(BindingMap::from([(column.clone(), Value::Literal(literal))]))
            }
            (TermMaker::Constant(constant), node) => (constant == node).then(BindingMap::new),
            _ => None,
        }
    }
}

/// A property rule: subject term, fixed predicate, object term, over one
/// relation with optional fixed conditions, joins and table aliases.
#[derive(Debug, Clone)]
pub struct TemplateRule {
    database: DatabaseHandle,
    predicate: Node,
    subject: TermMaker,
    object: TermMaker,
    condition: BindingMap,
    joins: Vec<Join>,
    aliases: AliasMap,
    column_types: BTreeMap<Attribute, ValueType>,
}

impl TemplateRule {
    pub fn builder(database: DatabaseHandle, predicate: impl Into<String>) -> TemplateRuleBuilder {
        TemplateRuleBuilder {
            database,
            predicate: predicate.into(),
            subject: None,
            object: None,
            condition: BindingMap::new(),
            joins: Vec::new(),
            aliases: AliasMap::new(),
            column_types: BTreeMap::new(),
            error: None,
        }
    }

    pub fn subject(&self) -> &TermMaker {
        &self.subject
    }

    pub fn object(&self) -> &TermMaker {
        &self.object
    }

    fn projections(&self) -> BTreeSet<Attribute> {
        self.subject
            .columns()
            .into_iter()
            .chain(self.object.columns())
            .cloned()
            .collect()
    }

    fn render_condition(&self, bindings: &BindingMap) -> String {
        conjunction(bindings.iter().map(|(a, v)| matches_value(a, v)))
            .map(|expr| expr.to_tokens().serialize(self.database.dialect))
            .unwrap_or_else(|| Selection::NO_CONDITION.to_string())
    }
}

impl MappingRule for TemplateRule {
    fn database(&self) -> &DatabaseHandle {
        &self.database
    }

    fn predicate(&self) -> &Node {
        &self.predicate
    }

    fn select(&self, position: Position, node: &Node) -> Option<Selection> {
        let dialect = self.database.dialect;
        let bindings = match position {
            Position::Predicate => (*node == self.predicate).then(BindingMap::new)?,
            Position::Subject => self.subject.bindings(node, &self.column_types, dialect)?,
            Position::Object => self.object.bindings(node, &self.column_types, dialect)?,
        };

        let mut condition = self.condition.clone();
        condition.extend(bindings);

        Some(Selection {
            condition: self.render_condition(&condition),
            joins: self.joins.clone(),
            projections: self.projections(),
            aliases: self.aliases.clone(),
        })
    }

    fn mapped_attributes(&self) -> BTreeSet<Attribute> {
        self.object
            .columns()
            .into_iter()
            .map(|a| a.resolve(&self.aliases))
            .collect()
    }
}

/// Builds a [`TemplateRule`]; the first invalid input is reported by
/// [`build`](TemplateRuleBuilder::build).
#[derive(Debug)]
pub struct TemplateRuleBuilder {
    database: DatabaseHandle,
    predicate: String,
    subject: Option<TermMaker>,
    object: Option<TermMaker>,
    condition: BindingMap,
    joins: Vec<Join>,
    aliases: AliasMap,
    column_types: BTreeMap<Attribute, ValueType>,
    error: Option<MappingError>,
}

impl TemplateRuleBuilder {
    fn record<T>(&mut self, result: MappingResult<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.error.get_or_insert(err);
                None
            }
        }
    }

    fn attribute(&mut self, name: &str) -> Option<Attribute> {
        let parsed =
            Attribute::parse(name).ok_or_else(|| MappingError::InvalidAttribute(name.to_string()));
        self.record(parsed)
    }

    pub fn subject_uri(mut self, pattern: &str) -> Self {
        self.subject = self.record(Template::parse(pattern)).map(TermMaker::Uri);
        self
    }

    pub fn subject_blank(mut self, pattern: &str) -> Self {
        self.subject = self.record(Template::parse(pattern)).map(TermMaker::Blank);
        self
    }

    pub fn object_column(mut self, column: &str, value_type: ValueType) -> Self {
        self.object = self.attribute(column).map(|column| TermMaker::Literal {
            column,
            value_type,
            language: None,
            datatype: None,
        });
        self
    }

    /// Language tag required on object literals.
    pub fn object_language(mut self, tag: &str) -> Self {
        if let Some(TermMaker::Literal { language, .. }) = &mut self.object {
            *language = Some(tag.to_string());
        }
        self
    }

    /// Datatype IRI required on object literals.
    pub fn object_datatype(mut self, iri: &str) -> Self {
        if let Some(TermMaker::Literal { datatype, .. }) = &mut self.object {
            *datatype = Some(iri.to_string());
        }
        self
    }

    pub fn object_uri(mut self, pattern: &str) -> Self {
        self.object = self.record(Template::parse(pattern)).map(TermMaker::Uri);
        self
    }

    pub fn object_blank(mut self, pattern: &str) -> Self {
        self.object = self.record(Template::parse(pattern)).map(TermMaker::Blank);
        self
    }

    pub fn object_constant(mut self, node: Node) -> Self {
        self.object = Some(TermMaker::Constant(node));
        self
    }

    /// Declare how a template column's values are rendered.
    pub fn column_type(mut self, column: &str, value_type: ValueType) -> Self {
        if let Some(column) = self.attribute(column) {
            self.column_types.insert(column, value_type);
        }
        self
    }

    /// Fixed `column = literal` condition; `literal` is SQL text.
    pub fn condition(mut self, column: &str, literal: &str) -> Self {
        if let Some(column) = self.attribute(column) {
            self.condition.insert(column, Value::literal(literal));
        }
        self
    }

    pub fn join(mut self, left: &str, right: &str) -> Self {
        if let (Some(l), Some(r)) = (self.attribute(left), self.attribute(right)) {
            self.joins.push(Join::single(l, r));
        }
        self
    }

    pub fn alias(mut self, alias: &str, table: &str) -> Self {
        let parse = |name: &str| {
            RelationName::parse(name).ok_or_else(|| MappingError::InvalidAttribute(name.to_string()))
        };
        if let (Some(a), Some(t)) = (self.record(parse(alias)), self.record(parse(table))) {
            self.aliases.insert(a, t);
        }
        self
    }

    pub fn build(self) -> MappingResult<TemplateRule> {
        if let Some(err) = self.error {
            return Err(err);
        }
        let incomplete = |term| MappingError::Incomplete {
            predicate: self.predicate.clone(),
            term,
        };
        let subject = self.subject.clone().ok_or_else(|| incomplete("subject"))?;
        let object = self.object.clone().ok_or_else(|| incomplete("object"))?;

        Ok(TemplateRule {
            database: self.database,
            predicate: Node::uri(self.predicate),
            subject,
            object,
            condition: self.condition,
            joins: self.joins,
            aliases: self.aliases,
            column_types: self.column_types,
        })
    }
}
