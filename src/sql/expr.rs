//! Expression AST for WHERE clauses, SET values and selected columns.
//!
//! Only the shapes mutation statements need: qualified columns,
//! literals, equality, IS NULL, AND/OR and parentheses.

use super::token::{Token, TokenStream};
use crate::model::{Attribute, Value};

// =============================================================================
// Expression AST
// =============================================================================

/// A SQL expression.
///
/// Every variant must be handled in `to_tokens()` - the compiler enforces this.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// Column reference: optional_schema.optional_table.column
    Column {
        schema: Option<String>,
        table: Option<String>,
        column: String,
    },

    /// Literal values
    Literal(Literal),

    /// Binary operation: left op right
    BinaryOp {
        left: Box<Expr>,
        op: BinaryOperator,
        right: Box<Expr>,
    },

    /// IS NULL / IS NOT NULL
    IsNull { expr: Box<Expr>, negated: bool },

    /// Parenthesized expression
    Paren(Box<Expr>),

    /// Pre-rendered SQL passed directly to output without escaping.
    ///
    /// Used for binding values, which the mapping layer renders.
    Raw(String),
}

/// Literal values.
#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    String(String),
    Null,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOperator {
    Eq,
    Ne,
    And,
    Or,
}

impl Expr {
    /// Convert this expression to a token stream.
    pub fn to_tokens(&self) -> TokenStream {
        let mut ts = TokenStream::new();

        match self {
            Expr::Column {
                schema,
                table,
                column,
            } => {
                if let Some(s) = schema {
                    ts.push(Token::Ident(s.clone()));
                    ts.push(Token::Dot);
                }
                if let Some(t) = table {
                    ts.push(Token::Ident(t.clone()));
                    ts.push(Token::Dot);
                }
                ts.push(Token::Ident(column.clone()));
            }

            Expr::Literal(lit) => {
                ts.push(match lit {
                    Literal::Int(n) => Token::LitInt(*n),
                    Literal::String(s) => Token::LitString(s.clone()),
                    Literal::Null => Token::LitNull,
                });
            }

            Expr::BinaryOp { left, op, right } => {
                ts.append(&left.to_tokens());
                ts.space();
                ts.push(binary_op_to_token(*op));
                ts.space();
                ts.append(&right.to_tokens());
            }

            Expr::IsNull { expr, negated } => {
                ts.append(&expr.to_tokens());
                ts.space();
                ts.push(if *negated {
                    Token::IsNotNull
                } else {
                    Token::IsNull
                });
            }

            Expr::Paren(inner) => {
                ts.lparen();
                ts.append(&inner.to_tokens());
                ts.rparen();
            }

            Expr::Raw(sql) => {
                ts.push(Token::Raw(sql.clone()));
            }
        }

        ts
    }
}

fn binary_op_to_token(op: BinaryOperator) -> Token {
    match op {
        BinaryOperator::Eq => Token::Eq,
        BinaryOperator::Ne => Token::Ne,
        BinaryOperator::And => Token::And,
        BinaryOperator::Or => Token::Or,
    }
}

impl From<&Value> for Expr {
    fn from(value: &Value) -> Self {
        match value {
            Value::Literal(sql) => Expr::Raw(sql.clone()),
            Value::Null => Expr::Literal(Literal::Null),
        }
    }
}

// =============================================================================
// Expression Constructors
// =============================================================================

/// Create a column reference.
pub fn col(name: &str) -> Expr {
    Expr::Column {
        schema: None,
        table: None,
        column: name.into(),
    }
}

/// Create a qualified column reference (table.column).
pub fn table_col(table: &str, column: &str) -> Expr {
    Expr::Column {
        schema: None,
        table: Some(table.into()),
        column: column.into(),
    }
}

/// Fully qualified reference to an attribute, including its schema.
pub fn attr_col(attribute: &Attribute) -> Expr {
    Expr::Column {
        schema: attribute.relation().schema().map(String::from),
        table: Some(attribute.relation().table().to_string()),
        column: attribute.column().to_string(),
    }
}

/// Create an integer literal.
pub fn lit_int(n: i64) -> Expr {
    Expr::Literal(Literal::Int(n))
}

/// Create a string literal.
pub fn lit_str(s: &str) -> Expr {
    Expr::Literal(Literal::String(s.into()))
}

/// Create a NULL literal.
pub fn lit_null() -> Expr {
    Expr::Literal(Literal::Null)
}

/// `attribute = value`, or `attribute IS NULL` for the NULL marker.
pub fn matches_value(attribute: &Attribute, value: &Value) -> Expr {
    match value {
        Value::Null => attr_col(attribute).is_null(),
        Value::Literal(_) => attr_col(attribute).eq(value),
    }
}

/// Left-nested AND of `exprs`, or `None` when empty.
pub fn conjunction(exprs: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    exprs.into_iter().reduce(|acc, e| acc.and(e))
}

/// OR of `exprs`, parenthesized when more than one.
pub fn disjunction(exprs: impl IntoIterator<Item = Expr>) -> Option<Expr> {
    let exprs: Vec<Expr> = exprs.into_iter().collect();
    let many = exprs.len() > 1;
    let joined = exprs.into_iter().reduce(|acc, e| acc.or(e))?;
    Some(if many { joined.paren() } else { joined })
}

// =============================================================================
// Expression Builder Trait
// =============================================================================

/// Extension trait for building expressions fluently.
pub trait ExprExt: Sized {
    fn into_expr(self) -> Expr;

    fn eq(self, other: impl Into<Expr>) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self.into_expr()),
            op: BinaryOperator::Eq,
            right: Box::new(other.into()),
        }
    }

    fn ne(self, other: impl Into<Expr>) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self.into_expr()),
            op: BinaryOperator::Ne,
            right: Box::new(other.into()),
        }
    }

    fn and(self, other: impl Into<Expr>) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self.into_expr()),
            op: BinaryOperator::And,
            right: Box::new(other.into()),
        }
    }

    fn or(self, other: impl Into<Expr>) -> Expr {
        Expr::BinaryOp {
            left: Box::new(self.into_expr()),
            op: BinaryOperator::Or,
            right: Box::new(other.into()),
        }
    }

    #[allow(clippy::wrong_self_convention)]
    fn is_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into_expr()),
            negated: false,
        }
    }

    #[allow(clippy::wrong_self_convention)]
    fn is_not_null(self) -> Expr {
        Expr::IsNull {
            expr: Box::new(self.into_expr()),
            negated: true,
        }
    }

    fn paren(self) -> Expr {
        Expr::Paren(Box::new(self.into_expr()))
    }
}

impl ExprExt for Expr {
    fn into_expr(self) -> Expr {
        self
    }
}
