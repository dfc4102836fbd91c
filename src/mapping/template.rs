// src/mapping/template.rs
use std::sync::LazyLock;

use regex::Regex;

use super::{MappingError, MappingResult};
use crate::model::Attribute;
use crate::sql::{Dialect, SqlDialect};

/// `{table.column}` or `{schema.table.column}` placeholders.
static PLACEHOLDER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\{([^{}]+)\}").unwrap());

static NUMERIC: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[+-]?[0-9]+(\.[0-9]+)?([eE][+-]?[0-9]+)?$").unwrap());

static DATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}$").unwrap());

static TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}[ T][0-9]{2}:[0-9]{2}(:[0-9]{2}(\.[0-9]+)?)?$").unwrap()
});

/// How a column's lexical value becomes a SQL literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ValueType {
    Numeric,
    #[default]
    Text,
    Date,
    Timestamp,
}

impl ValueType {
    /// Render `lexical` as a literal of this type, or `None` when the text
    /// cannot be a value of the column.
    pub fn render(self, lexical: &str, dialect: Dialect) -> Option<String> {
        match self {
            ValueType::Numeric => NUMERIC
                .is_match(lexical)
                .then(|| lexical.trim_start_matches('+').to_string()),
            ValueType::Text => Some(dialect.quote_string(lexical)),
            ValueType::Date => DATE
                .is_match(lexical)
                .then(|| dialect.format_date_literal(lexical)),
            ValueType::Timestamp => TIMESTAMP
                .is_match(lexical)
                .then(|| dialect.format_timestamp_literal(&lexical.replacen('T', " ", 1))),
        }
    }
}

#[derive(Debug, Clone)]
enum Part {
    Text(String),
    Column(Attribute),
}

/// A node template such as `http://ex.org/person/{people.id}`.
///
/// Matching runs the template backwards: the literal parts must appear
/// verbatim and each placeholder captures the text between them.
#[derive(Debug, Clone)]
pub struct Template {
    pattern: String,
    parts: Vec<Part>,
    matcher: Regex,
}

impl Template {
    pub fn parse(pattern: &str) -> MappingResult<Self> {
        let invalid = |reason: &str| MappingError::InvalidTemplate {
            template: pattern.to_string(),
            reason: reason.to_string(),
        };

        let mut parts = Vec::new();
        let mut regex = String::from("^");
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(pattern) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let literal = &pattern[last..whole.start()];
            if !literal.is_empty() {
                parts.push(Part::Text(literal.to_string()));
                regex.push_str(&regex::escape(literal));
            }
            let column = Attribute::parse(name.as_str().trim())
                .ok_or_else(|| invalid(&format!("`{}` is not a qualified column", name.as_str())))?;
            parts.push(Part::Column(column));
            regex.push_str("(.+?)");
            last = whole.end();
        }
        let tail = &pattern[last..];
        if !tail.is_empty() {
            parts.push(Part::Text(tail.to_string()));
            regex.push_str(&regex::escape(tail));
        }
        regex.push('$');

        if !parts.iter().any(|p| matches!(p, Part::Column(_))) {
            return Err(invalid("template has no column placeholder"));
        }
        let matcher = Regex::new(&regex).map_err(|e| invalid(&e.to_string()))?;

        Ok(Self {
            pattern: pattern.to_string(),
            parts,
            matcher,
        })
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn columns(&self) -> impl Iterator<Item = &Attribute> {
        self.parts.iter().filter_map(|p| match p {
            Part::Column(c) => Some(c),
            Part::Text(_) => None,
        })
    }

    /// Column values encoded in `text`, or `None` if it does not fit.
    ///
    /// A column used twice must capture the same text both times.
    pub fn match_text(&self, text: &str) -> Option<Vec<(Attribute, String)>> {
        let caps = self.matcher.captures(text)?;
        let mut values: Vec<(Attribute, String)> = Vec::new();
        for (column, capture) in self.columns().zip(caps.iter().skip(1)) {
            let captured = capture?.as_str().to_string();
            match values.iter().find(|(c, _)| c == column) {
                Some((_, previous)) if *previous != captured => return None,
                Some(_) => {}
                None => values.push((column.clone(), captured)),
            }
        }
        Some(values)
    }
}
