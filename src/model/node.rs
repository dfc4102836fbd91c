// src/model/node.rs
use std::fmt;

/// A node in the graph data model.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Node {
    Uri(String),
    Literal {
        lexical: String,
        language: Option<String>,
        datatype: Option<String>,
    },
    /// Blank node, identified only within one update request.
    Blank(String),
}

impl Node {
    pub fn uri(iri: impl Into<String>) -> Self {
        Node::Uri(iri.into())
    }

    pub fn literal(lexical: impl Into<String>) -> Self {
        Node::Literal {
            lexical: lexical.into(),
            language: None,
            datatype: None,
        }
    }

    pub fn typed_literal(lexical: impl Into<String>, datatype: impl Into<String>) -> Self {
        Node::Literal {
            lexical: lexical.into(),
            language: None,
            datatype: Some(datatype.into()),
        }
    }

    pub fn lang_literal(lexical: impl Into<String>, language: impl Into<String>) -> Self {
        Node::Literal {
            lexical: lexical.into(),
            language: Some(language.into()),
            datatype: None,
        }
    }

    pub fn blank(label: impl Into<String>) -> Self {
        Node::Blank(label.into())
    }

    pub fn is_blank(&self) -> bool {
        matches!(self, Node::Blank(_))
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Node::Uri(iri) => write!(f, "<{}>", iri),
            Node::Blank(label) => write!(f, "_:{}", label),
            Node::Literal {
                lexical,
                language,
                datatype,
            } => {
                write!(f, "\"{}\"", lexical.replace('"', "\\\""))?;
                if let Some(lang) = language {
                    write!(f, "@{}", lang)?;
                } else if let Some(dt) = datatype {
                    write!(f, "^^<{}>", dt)?;
                }
                Ok(())
            }
        }
    }
}

/// A subject-predicate-object assertion.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Triple {
    pub subject: Node,
    pub predicate: Node,
    pub object: Node,
}

impl Triple {
    pub fn new(subject: Node, predicate: Node, object: Node) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}
