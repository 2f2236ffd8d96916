//! The query-sink capability.

use crate::expr::Expr;
use crate::join::Join;

/// Where the tree's traversals write their output.
///
/// The composition tree never renders SQL itself; it emits select items,
/// AND-composed conditions, and join clauses into a sink. `join_aliases`
/// is the introspection the tree's idempotent-join guard relies on: a
/// sink must report exactly the aliases its current join clauses use.
pub trait QuerySink {
    /// Add a select item (an entity alias or qualified column).
    fn add_select(&mut self, item: &str);

    /// AND an additional condition onto the accumulated criteria.
    fn and_where(&mut self, expr: Expr);

    /// Add a join clause.
    fn add_join(&mut self, join: Join);

    /// Aliases of every join clause currently in the sink.
    fn join_aliases(&self) -> Vec<String>;
}
