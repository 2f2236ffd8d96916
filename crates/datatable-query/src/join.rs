//! JOIN clause types.

use crate::expr::Expr;
use datatable_core::Value;

/// A JOIN clause over a relation path.
///
/// The tree emits association joins, so the joined target is a relation
/// path (`parent_alias.relation`) rather than a bare table name.
#[derive(Debug, Clone)]
pub struct Join {
    /// Kind of join
    pub join_type: JoinType,
    /// Relation path being joined (e.g. `"u.address"`)
    pub path: String,
    /// Alias assigned to the joined relation
    pub alias: String,
    /// How the extra condition composes, if one is present
    pub condition_type: Option<JoinConditionType>,
    /// Extra condition restricting the join
    pub condition: Option<Expr>,
}

/// Kinds of joins the tree can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JoinType {
    Inner,
    #[default]
    Left,
    Right,
    Full,
}

impl JoinType {
    /// Get the SQL keyword for this join kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT JOIN",
            JoinType::Right => "RIGHT JOIN",
            JoinType::Full => "FULL JOIN",
        }
    }
}

/// How a join's extra condition composes with the association condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinConditionType {
    /// Replace the association condition
    On,
    /// Add to the association condition
    With,
}

impl JoinConditionType {
    /// Get the SQL keyword for this condition kind.
    pub const fn as_str(&self) -> &'static str {
        match self {
            JoinConditionType::On => "ON",
            JoinConditionType::With => "WITH",
        }
    }
}

impl Join {
    /// Create a join of the given kind.
    pub fn new(join_type: JoinType, path: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            join_type,
            path: path.into(),
            alias: alias.into(),
            condition_type: None,
            condition: None,
        }
    }

    /// Create a LEFT JOIN.
    pub fn left(path: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::new(JoinType::Left, path, alias)
    }

    /// Create an INNER JOIN.
    pub fn inner(path: impl Into<String>, alias: impl Into<String>) -> Self {
        Self::new(JoinType::Inner, path, alias)
    }

    /// Attach an extra condition.
    pub fn condition(mut self, kind: JoinConditionType, expr: Expr) -> Self {
        self.condition_type = Some(kind);
        self.condition = Some(expr);
        self
    }

    /// Render this JOIN clause, collecting bound parameters.
    pub fn build(&self, params: &mut Vec<Value>, offset: usize) -> String {
        let mut sql = format!(" {} {} {}", self.join_type.as_str(), self.path, self.alias);

        if let (Some(kind), Some(condition)) = (self.condition_type, &self.condition) {
            let condition_sql = condition.build(params, offset);
            sql.push_str(&format!(" {} {condition_sql}", kind.as_str()));
        }

        sql
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn left_join_renders_path_and_alias() {
        let mut params = Vec::new();
        let sql = Join::left("u.address", "a").build(&mut params, 0);
        assert_eq!(sql, " LEFT JOIN u.address a");
        assert!(params.is_empty());
    }

    #[test]
    fn join_with_condition_binds_parameters() {
        let mut params = Vec::new();
        let join = Join::inner("u.address", "a").condition(
            JoinConditionType::With,
            Expr::qualified("a", "active").eq(true),
        );
        let sql = join.build(&mut params, 0);
        assert_eq!(sql, " INNER JOIN u.address a WITH a.active = $1");
        assert_eq!(params, vec![Value::Bool(true)]);
    }

    #[test]
    fn join_type_keywords() {
        assert_eq!(JoinType::Left.as_str(), "LEFT JOIN");
        assert_eq!(JoinType::Inner.as_str(), "INNER JOIN");
        assert_eq!(JoinType::default(), JoinType::Left);
    }
}
