//! Entity/field composition trees for server-side tabular listings.
//!
//! A server describes a tabular dataset sourced from a relational entity
//! graph as a tree of entities and fields, then derives mechanically for
//! each listing request: the select list, the joins reaching every nested
//! relation, a filter combining per-column and global search predicates,
//! and formatted output rows. One tree drives all three phases, so select,
//! filter, and format can never disagree about aliases or paths.
//!
//! # Example
//!
//! ```
//! use datatable::{Field, FieldOptions, JoinMeta, SelectQuery, Table};
//! use datatable::{EntityDescriptor, SchemaRegistry};
//!
//! let mut registry = SchemaRegistry::new();
//! registry
//!     .register(EntityDescriptor::new("User", "app.entity.User").association("address", "Address"))
//!     .register(EntityDescriptor::new("Address", "app.entity.Address"));
//!
//! let mut table = Table::new(registry, "User", Some("u"))?;
//! let root = table.root();
//! table.set_field(root, "email", Field::new("email", FieldOptions::new().searchable(true))?);
//!
//! let address = table.join(root, "address", Some("a"), JoinMeta::left())?;
//! table.set_field(address, "city", Field::new("city", FieldOptions::new())?);
//! table.set_entity_field(root, "address", address);
//!
//! let mut query = SelectQuery::new("User", "u");
//! table.select(root, &mut query);
//! table.apply_joins(&mut query);
//! table.filter_all(&mut query, false);
//!
//! let (sql, _params) = query.build();
//! assert_eq!(sql, "SELECT u, a FROM User u LEFT JOIN u.address a");
//! # Ok::<(), datatable::Error>(())
//! ```

pub mod alias;
pub mod entity;
pub mod field;
pub mod table;

pub use alias::AliasAllocator;
pub use entity::{Entity, EntityId, JoinMeta};
pub use field::{Field, FieldNode, FieldOptions, FormatHint};
pub use table::Table;

// Re-export the collaborating layers so embedders can depend on this crate
// alone.
pub use datatable_core::{
    EntityDescriptor, Error, MetadataProvider, PathSegment, PropertyPath, Result, SchemaRegistry,
    Value, resolve,
};
pub use datatable_query::{
    BinaryOp, Disjunction, Expr, Join, JoinConditionType, JoinType, QuerySink, SelectQuery,
    SelectSpec, merge_spec,
};
