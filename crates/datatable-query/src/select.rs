//! The concrete SELECT sink and the declarative select spec.

use crate::expr::Expr;
use crate::join::Join;
use crate::sink::QuerySink;
use datatable_core::Value;

/// A SELECT accumulator implementing [`QuerySink`].
///
/// Collects select items, join clauses, and AND-composed conditions as the
/// tree emits them; `build` renders the accumulated query as generic
/// parameterized SQL for inspection and tests.
#[derive(Debug, Clone)]
pub struct SelectQuery {
    /// Root relation name
    from: String,
    /// Root relation alias
    from_alias: String,
    /// Select items, in emission order
    select: Vec<String>,
    /// JOIN clauses, in emission order
    joins: Vec<Join>,
    /// AND-composed criteria
    where_clause: Option<Expr>,
}

impl SelectQuery {
    /// Create a new SELECT over the given root relation and alias.
    pub fn new(from: impl Into<String>, from_alias: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            from_alias: from_alias.into(),
            select: Vec::new(),
            joins: Vec::new(),
            where_clause: None,
        }
    }

    /// The root relation name.
    pub fn from_name(&self) -> &str {
        &self.from
    }

    /// The root relation alias.
    pub fn from_alias(&self) -> &str {
        &self.from_alias
    }

    /// Accumulated select items.
    pub fn select_items(&self) -> &[String] {
        &self.select
    }

    /// Accumulated join clauses.
    pub fn joins(&self) -> &[Join] {
        &self.joins
    }

    /// The accumulated criteria, if any condition was attached.
    pub fn where_expr(&self) -> Option<&Expr> {
        self.where_clause.as_ref()
    }

    /// Render the accumulated query and its parameters.
    pub fn build(&self) -> (String, Vec<Value>) {
        let mut sql = String::new();
        let mut params = Vec::new();

        sql.push_str("SELECT ");
        if self.select.is_empty() {
            sql.push_str(&self.from_alias);
        } else {
            sql.push_str(&self.select.join(", "));
        }

        sql.push_str(" FROM ");
        sql.push_str(&self.from);
        sql.push(' ');
        sql.push_str(&self.from_alias);

        for join in &self.joins {
            sql.push_str(&join.build(&mut params, 0));
        }

        if let Some(where_clause) = &self.where_clause {
            let where_sql = where_clause.build(&mut params, 0);
            sql.push_str(" WHERE ");
            sql.push_str(&where_sql);
        }

        (sql, params)
    }
}

impl QuerySink for SelectQuery {
    fn add_select(&mut self, item: &str) {
        self.select.push(item.to_string());
    }

    fn and_where(&mut self, expr: Expr) {
        self.where_clause = Some(match self.where_clause.take() {
            Some(existing) => existing.and(expr),
            None => expr,
        });
    }

    fn add_join(&mut self, join: Join) {
        tracing::trace!(path = %join.path, alias = %join.alias, "adding join clause");
        self.joins.push(join);
    }

    fn join_aliases(&self) -> Vec<String> {
        self.joins.iter().map(|j| j.alias.clone()).collect()
    }
}

/// The declarative select spec: an order-preserving map from entity alias
/// to the columns selected under it.
pub type SelectSpec = serde_json::Map<String, serde_json::Value>;

/// Merge `other` into `into`, combining duplicate keys instead of
/// overwriting them.
///
/// Lists append, maps recurse, and a scalar colliding with anything is
/// widened into a list holding both sides, so no contribution is lost when
/// two fields select under the same alias.
pub fn merge_spec(into: &mut SelectSpec, other: SelectSpec) {
    for (key, incoming) in other {
        match into.get_mut(&key) {
            Some(existing) => merge_spec_value(existing, incoming),
            None => {
                into.insert(key, incoming);
            }
        }
    }
}

fn merge_spec_value(existing: &mut serde_json::Value, incoming: serde_json::Value) {
    use serde_json::Value;

    match (existing, incoming) {
        (Value::Object(existing), Value::Object(incoming)) => {
            for (key, value) in incoming {
                match existing.get_mut(&key) {
                    Some(slot) => merge_spec_value(slot, value),
                    None => {
                        existing.insert(key, value);
                    }
                }
            }
        }
        (Value::Array(existing), Value::Array(incoming)) => {
            existing.extend(incoming);
        }
        (Value::Array(existing), incoming) => {
            existing.push(incoming);
        }
        (existing, incoming) => {
            let old = existing.take();
            let mut items = vec![old];
            match incoming {
                Value::Array(rest) => items.extend(rest),
                other => items.push(other),
            }
            *existing = Value::Array(items);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::join::JoinConditionType;
    use serde_json::json;

    #[test]
    fn build_renders_accumulated_items_in_order() {
        let mut query = SelectQuery::new("User", "u");
        query.add_select("u");
        query.add_select("a");
        query.add_join(Join::left("u.address", "a"));
        query.and_where(Expr::qualified("u", "email").like("%jane%"));

        let (sql, params) = query.build();
        assert_eq!(
            sql,
            "SELECT u, a FROM User u LEFT JOIN u.address a WHERE u.email LIKE $1"
        );
        assert_eq!(params, vec![Value::Text("%jane%".to_string())]);
    }

    #[test]
    fn build_without_select_items_falls_back_to_root_alias() {
        let query = SelectQuery::new("User", "u");
        let (sql, params) = query.build();
        assert_eq!(sql, "SELECT u FROM User u");
        assert!(params.is_empty());
    }

    #[test]
    fn and_where_composes_conditions() {
        let mut query = SelectQuery::new("User", "u");
        query.and_where(Expr::qualified("u", "active").eq(true));
        query.and_where(Expr::qualified("u", "age").gt(18));

        let (sql, params) = query.build();
        assert_eq!(sql, "SELECT u FROM User u WHERE u.active = $1 AND u.age > $2");
        assert_eq!(params, vec![Value::Bool(true), Value::Int(18)]);
    }

    #[test]
    fn join_parameters_precede_where_parameters() {
        let mut query = SelectQuery::new("User", "u");
        query.add_join(Join::left("u.address", "a").condition(
            JoinConditionType::With,
            Expr::qualified("a", "active").eq(true),
        ));
        query.and_where(Expr::qualified("u", "age").gt(18));

        let (sql, params) = query.build();
        assert_eq!(
            sql,
            "SELECT u FROM User u LEFT JOIN u.address a WITH a.active = $1 WHERE u.age > $2"
        );
        assert_eq!(params, vec![Value::Bool(true), Value::Int(18)]);
    }

    #[test]
    fn join_aliases_reports_each_clause() {
        let mut query = SelectQuery::new("User", "u");
        query.add_join(Join::left("u.address", "a"));
        query.add_join(Join::left("a.country", "c"));
        assert_eq!(query.join_aliases(), vec!["a".to_string(), "c".to_string()]);
    }

    #[test]
    fn merge_spec_appends_lists_under_same_alias() {
        let mut spec = SelectSpec::new();
        merge_spec(&mut spec, json!({"u": ["email"]}).as_object().unwrap().clone());
        merge_spec(&mut spec, json!({"u": ["name"]}).as_object().unwrap().clone());
        merge_spec(&mut spec, json!({"a": ["city"]}).as_object().unwrap().clone());

        assert_eq!(
            serde_json::Value::Object(spec),
            json!({"u": ["email", "name"], "a": ["city"]})
        );
    }

    #[test]
    fn merge_spec_recurses_into_maps() {
        let mut spec = SelectSpec::new();
        merge_spec(
            &mut spec,
            json!({"u": {"columns": ["email"]}}).as_object().unwrap().clone(),
        );
        merge_spec(
            &mut spec,
            json!({"u": {"columns": ["name"], "hidden": ["id"]}})
                .as_object()
                .unwrap()
                .clone(),
        );

        assert_eq!(
            serde_json::Value::Object(spec),
            json!({"u": {"columns": ["email", "name"], "hidden": ["id"]}})
        );
    }

    #[test]
    fn merge_spec_widens_scalar_collisions_into_lists() {
        let mut spec = SelectSpec::new();
        merge_spec(&mut spec, json!({"u": "email"}).as_object().unwrap().clone());
        merge_spec(&mut spec, json!({"u": "name"}).as_object().unwrap().clone());

        assert_eq!(
            serde_json::Value::Object(spec),
            json!({"u": ["email", "name"]})
        );
    }
}
