//! Filter expressions.
//!
//! This module provides the expression system the tree's filter phase
//! assembles: column references, comparison and LIKE predicates, and the
//! OR-accumulating [`Disjunction`] an entity's filter pass returns.

use datatable_core::Value;

/// An expression usable as a query condition.
#[derive(Debug, Clone)]
pub enum Expr {
    /// Column reference with optional alias qualifier
    Column {
        /// Optional entity alias
        table: Option<String>,
        /// Column name
        name: String,
    },

    /// Literal value, bound as a parameter
    Literal(Value),

    /// Binary operation (e.g. a = b, a > b)
    Binary {
        left: Box<Expr>,
        op: BinaryOp,
        right: Box<Expr>,
    },

    /// LIKE / NOT LIKE pattern
    Like {
        expr: Box<Expr>,
        pattern: String,
        negated: bool,
    },

    /// IS NULL / IS NOT NULL
    IsNull { expr: Box<Expr>, negated: bool },

    /// Raw SQL fragment (escape hatch)
    Raw(String),

    /// Parenthesized expression
    Paren(Box<Expr>),
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// Equal (=)
    Eq,
    /// Not equal (<>)
    Ne,
    /// Less than (<)
    Lt,
    /// Less than or equal (<=)
    Le,
    /// Greater than (>)
    Gt,
    /// Greater than or equal (>=)
    Ge,
    /// Logical AND
    And,
    /// Logical OR
    Or,
}

impl BinaryOp {
    /// Get the SQL representation of this operator.
    pub const fn as_str(&self) -> &'static str {
        match self {
            BinaryOp::Eq => "=",
            BinaryOp::Ne => "<>",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::And => "AND",
            BinaryOp::Or => "OR",
        }
    }
}

impl Expr {
    /// Create an unqualified column reference.
    pub fn col(name: impl Into<String>) -> Self {
        Expr::Column {
            table: None,
            name: name.into(),
        }
    }

    /// Create a column reference qualified by an entity alias.
    pub fn qualified(table: impl Into<String>, name: impl Into<String>) -> Self {
        Expr::Column {
            table: Some(table.into()),
            name: name.into(),
        }
    }

    /// Create a raw SQL fragment.
    pub fn raw(sql: impl Into<String>) -> Self {
        Expr::Raw(sql.into())
    }

    /// Create a literal value expression.
    pub fn val(value: impl Into<Value>) -> Self {
        Expr::Literal(value.into())
    }

    fn binary(self, op: BinaryOp, right: impl Into<Expr>) -> Self {
        Expr::Binary {
            left: Box::new(self),
            op,
            right: Box::new(right.into()),
        }
    }

    /// Equality comparison.
    pub fn eq(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Eq, right)
    }

    /// Inequality comparison.
    pub fn ne(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Ne, right)
    }

    /// Less-than comparison.
    pub fn lt(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Lt, right)
    }

    /// Less-than-or-equal comparison.
    pub fn le(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Le, right)
    }

    /// Greater-than comparison.
    pub fn gt(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Gt, right)
    }

    /// Greater-than-or-equal comparison.
    pub fn ge(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Ge, right)
    }

    /// Logical AND.
    pub fn and(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::And, right)
    }

    /// Logical OR.
    pub fn or(self, right: impl Into<Expr>) -> Self {
        self.binary(BinaryOp::Or, right)
    }

    /// LIKE pattern match; the pattern is bound as a parameter.
    pub fn like(self, pattern: impl Into<String>) -> Self {
        Expr::Like {
            expr: Box::new(self),
            pattern: pattern.into(),
            negated: false,
        }
    }

    /// NOT LIKE pattern match.
    pub fn not_like(self, pattern: impl Into<String>) -> Self {
        Expr::Like {
            expr: Box::new(self),
            pattern: pattern.into(),
            negated: true,
        }
    }

    /// IS NULL check.
    pub fn is_null(self) -> Self {
        Expr::IsNull {
            expr: Box::new(self),
            negated: false,
        }
    }

    /// IS NOT NULL check.
    pub fn is_not_null(self) -> Self {
        Expr::IsNull {
            expr: Box::new(self),
            negated: true,
        }
    }

    /// Wrap this expression in parentheses.
    pub fn paren(self) -> Self {
        Expr::Paren(Box::new(self))
    }

    /// Render this expression, collecting bound parameters.
    ///
    /// `offset` is the number of parameters already bound by the caller;
    /// placeholders continue from there.
    pub fn build(&self, params: &mut Vec<Value>, offset: usize) -> String {
        match self {
            Expr::Column { table, name } => match table {
                Some(table) => format!("{table}.{name}"),
                None => name.clone(),
            },
            Expr::Literal(value) => {
                params.push(value.clone());
                format!("${}", offset + params.len())
            }
            Expr::Binary { left, op, right } => {
                let left_sql = left.build(params, offset);
                let right_sql = right.build(params, offset);
                format!("{left_sql} {} {right_sql}", op.as_str())
            }
            Expr::Like {
                expr,
                pattern,
                negated,
            } => {
                let expr_sql = expr.build(params, offset);
                params.push(Value::Text(pattern.clone()));
                let keyword = if *negated { "NOT LIKE" } else { "LIKE" };
                format!("{expr_sql} {keyword} ${}", offset + params.len())
            }
            Expr::IsNull { expr, negated } => {
                let expr_sql = expr.build(params, offset);
                let keyword = if *negated { "IS NOT NULL" } else { "IS NULL" };
                format!("{expr_sql} {keyword}")
            }
            Expr::Raw(sql) => sql.clone(),
            Expr::Paren(inner) => format!("({})", inner.build(params, offset)),
        }
    }
}

impl From<Value> for Expr {
    fn from(v: Value) -> Self {
        Expr::Literal(v)
    }
}

impl From<bool> for Expr {
    fn from(v: bool) -> Self {
        Expr::Literal(Value::Bool(v))
    }
}

impl From<i32> for Expr {
    fn from(v: i32) -> Self {
        Expr::Literal(Value::Int(i64::from(v)))
    }
}

impl From<i64> for Expr {
    fn from(v: i64) -> Self {
        Expr::Literal(Value::Int(v))
    }
}

impl From<f64> for Expr {
    fn from(v: f64) -> Self {
        Expr::Literal(Value::Float(v))
    }
}

impl From<&str> for Expr {
    fn from(v: &str) -> Self {
        Expr::Literal(Value::Text(v.to_string()))
    }
}

impl From<String> for Expr {
    fn from(v: String) -> Self {
        Expr::Literal(Value::Text(v))
    }
}

/// An OR-composition of predicates, built one term at a time.
///
/// A filter pass over an entity's fields accumulates one term per
/// participating field and returns the disjunction whole, attached or not,
/// so callers can inspect or combine it further.
#[derive(Debug, Clone, Default)]
pub struct Disjunction {
    terms: Vec<Expr>,
}

impl Disjunction {
    /// Create an empty disjunction.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term.
    pub fn add(&mut self, expr: Expr) {
        self.terms.push(expr);
    }

    /// Number of terms.
    pub fn len(&self) -> usize {
        self.terms.len()
    }

    /// Whether the disjunction has no terms.
    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    /// The accumulated terms, in insertion order.
    pub fn terms(&self) -> &[Expr] {
        &self.terms
    }

    /// Fold the terms into a single OR expression.
    ///
    /// Returns `None` when empty; an empty disjunction must never be
    /// attached as a condition (it would read as always-false). The fold is
    /// parenthesized so AND-composition by the sink binds correctly.
    pub fn into_expr(self) -> Option<Expr> {
        let mut terms = self.terms.into_iter();
        let first = terms.next()?;
        let folded = terms.fold(first, |acc, term| acc.or(term));
        Some(folded.paren())
    }
}
