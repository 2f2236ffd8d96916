//! Query-sink layer for Datatable Rust.
//!
//! `datatable-query` is the **query construction layer**. The composition
//! tree in the `datatable` crate emits select items, join clauses, and
//! filter conditions; this crate defines what it emits into.
//!
//! # Role In The Architecture
//!
//! - **`QuerySink` trait**: the capability the tree writes through, with
//!   the join introspection its deduplication guard needs.
//! - **Expression DSL**: `Expr` and `Disjunction` build filter predicates
//!   safely with bound parameters.
//! - **`SelectQuery`**: the in-repo sink, accumulating a query and
//!   rendering generic parameterized SQL for inspection and tests.
//!
//! Embedders targeting a real query builder implement `QuerySink` against
//! it and ignore `SelectQuery` entirely.

pub mod expr;
pub mod join;
pub mod select;
pub mod sink;

pub use expr::{BinaryOp, Disjunction, Expr};
pub use join::{Join, JoinConditionType, JoinType};
pub use select::{SelectQuery, SelectSpec, merge_spec};
pub use sink::QuerySink;
