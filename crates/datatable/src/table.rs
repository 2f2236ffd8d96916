//! The table: entity arena, alias registry, and the tree-wide algorithms.

use crate::alias::AliasAllocator;
use crate::entity::{Entity, EntityId, JoinMeta};
use crate::field::{Field, FieldNode};
use datatable_core::{Error, MetadataProvider, PropertyPath, Result, resolve};
use datatable_query::{Disjunction, Join, QuerySink, SelectSpec, merge_spec};
use serde_json::{Map as JsonMap, Value as JsonValue};
use std::collections::HashMap;
use std::fmt;

/// The root container of a composition tree.
///
/// Owns the entity arena, the table-scoped alias registry, the alias
/// allocator, and the metadata accessor; every tree mutation and traversal
/// goes through it. Entity handles ([`EntityId`]) are only valid for the
/// table that issued them.
pub struct Table {
    metadata: Box<dyn MetadataProvider>,
    /// Arena of entity nodes, in creation order
    entities: Vec<Entity>,
    /// Alias -> entity, covering every entity ever created under this table
    aliases: HashMap<String, EntityId>,
    allocator: AliasAllocator,
    root: EntityId,
}

impl Table {
    /// Create a table with its root entity.
    ///
    /// The root alias is generated from the root name when not supplied.
    /// Fails with `InvalidArgument` on an empty name.
    pub fn new(
        metadata: impl MetadataProvider + 'static,
        root_name: &str,
        root_alias: Option<&str>,
    ) -> Result<Self> {
        let mut table = Self {
            metadata: Box::new(metadata),
            entities: Vec::new(),
            aliases: HashMap::new(),
            allocator: AliasAllocator::new(),
            root: EntityId(0),
        };
        table.root = table.create_entity(root_name, root_alias, None)?;
        Ok(table)
    }

    /// The root entity.
    pub fn root(&self) -> EntityId {
        self.root
    }

    /// Access an entity node.
    ///
    /// # Panics
    ///
    /// Panics when `id` was issued by a different table.
    pub fn entity(&self, id: EntityId) -> &Entity {
        &self.entities[id.0]
    }

    /// All entities, in creation order.
    pub fn entities(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities
            .iter()
            .enumerate()
            .map(|(i, e)| (EntityId(i), e))
    }

    /// Look up an entity by alias in the table-scoped registry.
    pub fn entity_by_alias(&self, alias: &str) -> Option<EntityId> {
        self.aliases.get(alias).copied()
    }

    /// Number of entities in the tree.
    pub fn entity_count(&self) -> usize {
        self.entities.len()
    }

    /// The suffix the alias allocator will use next.
    pub fn next_alias_index(&self) -> u32 {
        self.allocator.peek_index()
    }

    fn create_entity(
        &mut self,
        name: &str,
        alias: Option<&str>,
        parent: Option<EntityId>,
    ) -> Result<EntityId> {
        if name.is_empty() {
            return Err(Error::invalid_argument(
                "name",
                "entity name must not be empty",
            ));
        }

        let alias = match alias {
            Some(alias) if !alias.is_empty() => alias.to_string(),
            _ => self.allocator.next(name),
        };
        if self.aliases.contains_key(&alias) {
            return Err(Error::duplicate_alias(alias));
        }

        let id = EntityId(self.entities.len());
        tracing::debug!(name, alias = %alias, parent = ?parent, "registering entity");
        self.entities
            .push(Entity::new(name.to_string(), alias.clone(), parent));
        self.aliases.insert(alias, id);
        Ok(id)
    }

    /// Register a relation of `parent` as a joined entity.
    ///
    /// Idempotent per parent and relation name: the first registration
    /// wins, and later calls return the cached child with their join
    /// arguments ignored. When the requested alias already names an entity
    /// of this table, that entity is reused instead of constructing a new
    /// one: two parent paths asking for the same alias share one physical
    /// join, which is what keeps the final query at one join clause per
    /// alias.
    pub fn join(
        &mut self,
        parent: EntityId,
        name: &str,
        alias: Option<&str>,
        meta: JoinMeta,
    ) -> Result<EntityId> {
        if let Some(cached) = self.entity(parent).relation(name) {
            tracing::debug!(
                name,
                alias = self.entity(cached).alias(),
                "relation already registered; keeping first registration"
            );
            return Ok(cached);
        }

        let reused = alias
            .filter(|a| !a.is_empty())
            .and_then(|a| self.entity_by_alias(a));
        let child = match reused {
            Some(existing) => {
                tracing::debug!(
                    name,
                    alias = self.entity(existing).alias(),
                    "reusing entity already registered under requested alias"
                );
                existing
            }
            None => self.create_entity(name, alias, Some(parent))?,
        };

        self.entities[child.0].join = Some(meta);
        self.entities[parent.0].relations.insert(name.to_string(), child);
        Ok(child)
    }

    /// Attach a leaf field under `key`, replacing any child with that key.
    pub fn set_field(&mut self, entity: EntityId, key: &str, field: Field) {
        self.entities[entity.0].set_field(key.to_string(), FieldNode::Leaf(field));
    }

    /// Attach a joined entity as a nested child under `key`, so formatting
    /// nests its fields as a sub-structure.
    pub fn set_entity_field(&mut self, entity: EntityId, key: &str, child: EntityId) {
        self.entities[entity.0].set_field(key.to_string(), FieldNode::Entity(child));
    }

    /// Mutable access to a leaf field, e.g. for assigning search terms.
    pub fn field_mut(&mut self, entity: EntityId, key: &str) -> Option<&mut Field> {
        self.entities[entity.0]
            .fields
            .iter_mut()
            .find(|(k, _)| k == key)
            .and_then(|(_, node)| match node {
                FieldNode::Leaf(field) => Some(field),
                FieldNode::Entity(_) => None,
            })
    }

    /// Assign a search term to the leaf field under `key`.
    ///
    /// Returns false when no leaf field exists under that key.
    pub fn set_search(&mut self, entity: EntityId, key: &str, term: Option<String>) -> bool {
        match self.field_mut(entity, key) {
            Some(field) => {
                field.set_search(term);
                true
            }
            None => false,
        }
    }

    /// Assign a global search term to every globally-searchable leaf field
    /// that does not already carry a per-column term.
    pub fn set_global_search(&mut self, term: &str) {
        for entity in &mut self.entities {
            for (_, node) in &mut entity.fields {
                if let FieldNode::Leaf(field) = node {
                    if field.options().global_searchable && field.search().is_none() {
                        field.set_search(Some(term.to_string()));
                    }
                }
            }
        }
    }

    /// The ordered names from the root down to and including `id`.
    pub fn path(&self, id: EntityId) -> Vec<&str> {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            let entity = self.entity(id);
            names.push(entity.name());
            current = entity.parent();
        }
        names.reverse();
        names
    }

    /// The relation path this entity is joined through
    /// (`parent_alias.name`), or `None` for the root.
    pub fn join_path(&self, id: EntityId) -> Option<String> {
        let entity = self.entity(id);
        entity
            .parent()
            .map(|parent| format!("{}.{}", self.entity(parent).alias(), entity.name()))
    }

    /// Resolve this entity's fully-qualified class identity.
    ///
    /// The root resolves its name directly; a joined entity resolves its
    /// parent's class first and follows the association named by its own
    /// name. Lookups are uncached and accessor failures propagate
    /// unchanged.
    pub fn class_name(&self, id: EntityId) -> Result<String> {
        let entity = self.entity(id);
        match entity.parent() {
            Some(parent) => {
                let parent_class = self.class_name(parent)?;
                self.metadata
                    .association_target(&parent_class, entity.name())
            }
            None => self.metadata.class_name(entity.name()),
        }
    }

    /// The identifier field(s) of this entity's resolved class.
    pub fn primary_keys(&self, id: EntityId) -> Result<Vec<String>> {
        let class = self.class_name(id)?;
        self.metadata.identifier_fields(&class)
    }

    /// Whether a join clause using this entity's alias is already present
    /// in the sink.
    pub fn is_joined<S: QuerySink + ?Sized>(&self, id: EntityId, sink: &S) -> bool {
        let alias = self.entity(id).alias();
        sink.join_aliases().iter().any(|a| a == alias)
    }

    /// Emit whole-entity selection for `id` and every nested entity below
    /// it.
    pub fn select<S: QuerySink + ?Sized>(&self, id: EntityId, sink: &mut S) {
        let entity = self.entity(id);
        sink.add_select(entity.alias());
        for (_, node) in entity.fields() {
            if let FieldNode::Entity(child) = node {
                self.select(*child, sink);
            }
        }
    }

    /// Recursively merge the select specifications of every child field.
    ///
    /// Duplicate keys combine instead of overwriting, so two fields
    /// selecting under the same alias both survive into the merged map.
    pub fn select_spec(&self, id: EntityId) -> SelectSpec {
        let entity = self.entity(id);
        let mut spec = SelectSpec::new();
        for (_, node) in entity.fields() {
            match node {
                FieldNode::Leaf(field) => merge_spec(&mut spec, field.select_spec(entity.alias())),
                FieldNode::Entity(child) => merge_spec(&mut spec, self.select_spec(*child)),
            }
        }
        spec
    }

    /// Emit a join clause for every joined entity not yet present in the
    /// sink.
    ///
    /// Guarded by [`is_joined`](Self::is_joined), so re-running the pass
    /// (or sharing one alias between two parent paths) never duplicates a
    /// clause.
    #[tracing::instrument(level = "trace", skip(self, sink))]
    pub fn apply_joins<S: QuerySink + ?Sized>(&self, sink: &mut S) {
        for (id, entity) in self.entities() {
            let Some(meta) = entity.join() else {
                continue;
            };
            if self.is_joined(id, sink) {
                tracing::debug!(alias = entity.alias(), "already joined in sink; skipping");
                continue;
            }
            let Some(path) = self.join_path(id) else {
                continue;
            };

            let mut join = Join::new(meta.kind, path, entity.alias());
            if let (Some(kind), Some(condition)) = (meta.condition_type, &meta.condition) {
                join = join.condition(kind, condition.clone());
            }
            sink.add_join(join);
        }
    }

    /// Build the OR-disjunction of this entity's participating fields and
    /// AND it onto the sink.
    ///
    /// `global` selects between the cross-column global search pass and
    /// the per-column filter pass. The disjunction is returned whole so
    /// callers can inspect or combine it; an empty one is returned but
    /// never attached.
    #[tracing::instrument(level = "trace", skip(self, sink))]
    pub fn filter<S: QuerySink + ?Sized>(
        &self,
        id: EntityId,
        sink: &mut S,
        global: bool,
    ) -> Disjunction {
        let entity = self.entity(id);
        let mut orx = Disjunction::new();
        for (_, node) in entity.fields() {
            if let FieldNode::Leaf(field) = node {
                if field.is_search(global) {
                    if let Some(predicate) = field.predicate(entity.alias()) {
                        orx.add(predicate);
                    }
                }
            }
        }

        if let Some(expr) = orx.clone().into_expr() {
            tracing::debug!(
                alias = entity.alias(),
                terms = orx.len(),
                global,
                "attaching search disjunction"
            );
            sink.and_where(expr);
        }
        orx
    }

    /// Run [`filter`](Self::filter) over every entity in creation order,
    /// AND-ing each non-empty disjunction onto the sink.
    pub fn filter_all<S: QuerySink + ?Sized>(&self, sink: &mut S, global: bool) -> Vec<Disjunction> {
        (0..self.entities.len())
            .map(|i| self.filter(EntityId(i), sink, global))
            .collect()
    }

    /// Format one row-scoped value through this entity's fields.
    ///
    /// Every child lands in the output map in insertion order: leaves
    /// resolve their column within the current value and coerce it per
    /// their format hint; nested entities resolve their sub-structure and
    /// recurse. A missing value fails with a `Path` error and aborts the
    /// whole row.
    pub fn format(&self, id: EntityId, value: &JsonValue) -> Result<JsonMap<String, JsonValue>> {
        let entity = self.entity(id);
        let mut row = JsonMap::new();
        for (key, node) in entity.fields() {
            match node {
                FieldNode::Leaf(field) => {
                    let raw = resolve(value, &PropertyPath::from_keys([field.name()]))?;
                    row.insert(key.clone(), field.format(raw));
                }
                FieldNode::Entity(child) => {
                    let name = self.entity(*child).name();
                    let raw = resolve(value, &PropertyPath::from_keys([name]))?;
                    row.insert(key.clone(), JsonValue::Object(self.format(*child, raw)?));
                }
            }
        }
        Ok(row)
    }

    /// Format a slice of rows through the root entity.
    #[tracing::instrument(level = "debug", skip(self, rows), fields(rows = rows.len()))]
    pub fn format_rows(&self, rows: &[JsonValue]) -> Result<Vec<JsonMap<String, JsonValue>>> {
        rows.iter().map(|row| self.format(self.root, row)).collect()
    }
}

impl fmt::Debug for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("root", &self.root)
            .field("entities", &self.entities)
            .field("aliases", &self.aliases)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datatable_core::{EntityDescriptor, SchemaRegistry};
    use datatable_query::SelectQuery;

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .register(
                EntityDescriptor::new("User", "app.entity.User")
                    .association("address", "Address"),
            )
            .register(
                EntityDescriptor::new("Address", "app.entity.Address")
                    .association("country", "Country"),
            )
            .register(EntityDescriptor::new("Country", "app.entity.Country"));
        registry
    }

    fn user_table() -> Table {
        Table::new(registry(), "User", Some("u")).unwrap()
    }

    #[test]
    fn empty_name_fails_without_mutating_registry_or_allocator() {
        let mut table = user_table();
        let before_count = table.entity_count();
        let before_index = table.next_alias_index();

        let err = table.join(table.root(), "", None, JoinMeta::left()).unwrap_err();
        assert!(matches!(err, Error::InvalidArgument(_)));
        assert_eq!(table.entity_count(), before_count);
        assert_eq!(table.next_alias_index(), before_index);
    }

    #[test]
    fn generated_alias_colliding_with_an_explicit_one_fails() {
        // the first generated alias for "address" is a1, which the root
        // already claimed explicitly
        let mut table = Table::new(registry(), "User", Some("a1")).unwrap();
        let err = table
            .join(table.root(), "address", None, JoinMeta::left())
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateAlias(_)));
    }

    #[test]
    fn root_alias_is_generated_when_absent() {
        let table = Table::new(registry(), "User", None).unwrap();
        let root = table.entity(table.root());
        assert_eq!(root.alias(), "u1");
        assert_eq!(table.entity_by_alias("u1"), Some(table.root()));
    }

    #[test]
    fn generated_join_alias_lands_in_the_registry() {
        let mut table = user_table();
        let address = table
            .join(table.root(), "address", None, JoinMeta::left())
            .unwrap();

        let alias = table.entity(address).alias().to_string();
        assert!(alias.starts_with('a'));
        assert_eq!(table.entity_by_alias(&alias), Some(address));
    }

    #[test]
    fn join_is_idempotent_and_first_registration_wins() {
        let mut table = user_table();
        let first = table
            .join(table.root(), "address", Some("a"), JoinMeta::inner())
            .unwrap();
        let second = table
            .join(table.root(), "address", Some("b"), JoinMeta::left())
            .unwrap();

        assert_eq!(first, second);
        let entity = table.entity(first);
        assert_eq!(entity.alias(), "a");
        assert_eq!(entity.join().unwrap().kind, datatable_query::JoinType::Inner);
        // no second entity was created for the ignored call
        assert_eq!(table.entity_count(), 2);
    }

    #[test]
    fn join_reuses_entity_registered_under_requested_alias() {
        let mut table = user_table();
        let address = table
            .join(table.root(), "address", Some("a"), JoinMeta::left())
            .unwrap();
        let country = table
            .join(address, "country", Some("c"), JoinMeta::left())
            .unwrap();

        // a different parent requesting alias "c" shares the same entity
        let shared = table
            .join(table.root(), "homeland", Some("c"), JoinMeta::inner())
            .unwrap();
        assert_eq!(shared, country);
        // the reused entity keeps its original parent but takes the new
        // join metadata
        assert_eq!(table.entity(shared).parent(), Some(address));
        assert_eq!(
            table.entity(shared).join().unwrap().kind,
            datatable_query::JoinType::Inner
        );
    }

    #[test]
    fn aliases_are_unique_per_table() {
        let mut table = user_table();
        let address = table
            .join(table.root(), "address", None, JoinMeta::left())
            .unwrap();
        let country = table.join(address, "country", None, JoinMeta::left()).unwrap();

        let mut aliases: Vec<_> = table.entities().map(|(_, e)| e.alias().to_string()).collect();
        aliases.sort();
        aliases.dedup();
        assert_eq!(aliases.len(), table.entity_count());
        assert_ne!(table.entity(address).alias(), table.entity(country).alias());
    }

    #[test]
    fn path_prepends_parent_names() {
        let mut table = user_table();
        let address = table
            .join(table.root(), "address", Some("a"), JoinMeta::left())
            .unwrap();
        let country = table
            .join(address, "country", Some("c"), JoinMeta::left())
            .unwrap();

        assert_eq!(table.path(table.root()), vec!["User"]);
        assert_eq!(table.path(address), vec!["User", "address"]);
        assert_eq!(table.path(country), vec!["User", "address", "country"]);
    }

    #[test]
    fn class_resolution_follows_associations() {
        let mut table = user_table();
        let address = table
            .join(table.root(), "address", Some("a"), JoinMeta::left())
            .unwrap();
        let country = table
            .join(address, "country", Some("c"), JoinMeta::left())
            .unwrap();

        assert_eq!(table.class_name(table.root()).unwrap(), "app.entity.User");
        assert_eq!(table.class_name(address).unwrap(), "app.entity.Address");
        assert_eq!(table.class_name(country).unwrap(), "app.entity.Country");
        assert_eq!(table.primary_keys(address).unwrap(), vec!["id".to_string()]);
    }

    #[test]
    fn unknown_association_propagates_metadata_error() {
        let mut table = user_table();
        let orders = table
            .join(table.root(), "orders", Some("o"), JoinMeta::left())
            .unwrap();
        assert!(table.class_name(orders).unwrap_err().is_metadata());
    }

    #[test]
    fn is_joined_reflects_sink_state() {
        let mut table = user_table();
        let address = table
            .join(table.root(), "address", Some("a"), JoinMeta::left())
            .unwrap();

        let mut sink = SelectQuery::new("User", "u");
        assert!(!table.is_joined(address, &sink));
        table.apply_joins(&mut sink);
        assert!(table.is_joined(address, &sink));
    }
}
