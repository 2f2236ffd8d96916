//! Composite entity nodes.

use crate::field::FieldNode;
use datatable_query::{Expr, JoinConditionType, JoinType};
use std::collections::HashMap;

/// Stable handle to an entity in a table's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntityId(pub(crate) usize);

/// Join metadata carried by a non-root entity.
#[derive(Debug, Clone)]
pub struct JoinMeta {
    /// Kind of join
    pub kind: JoinType,
    /// How the extra condition composes, if one is present
    pub condition_type: Option<JoinConditionType>,
    /// Extra condition restricting the join
    pub condition: Option<Expr>,
}

impl JoinMeta {
    /// Join metadata of the given kind with no extra condition.
    pub fn new(kind: JoinType) -> Self {
        Self {
            kind,
            condition_type: None,
            condition: None,
        }
    }

    /// LEFT join metadata.
    pub fn left() -> Self {
        Self::new(JoinType::Left)
    }

    /// INNER join metadata.
    pub fn inner() -> Self {
        Self::new(JoinType::Inner)
    }

    /// Attach an extra condition.
    pub fn condition(mut self, kind: JoinConditionType, expr: Expr) -> Self {
        self.condition_type = Some(kind);
        self.condition = Some(expr);
        self
    }
}

impl Default for JoinMeta {
    fn default() -> Self {
        Self::left()
    }
}

/// A node of the composition tree: the root relation or one joined
/// relation.
///
/// Entities own their leaf fields in insertion order and cache their
/// registered sub-relations by name; the `relations` cache is what makes
/// repeated join registration idempotent per parent.
#[derive(Debug, Clone)]
pub struct Entity {
    pub(crate) name: String,
    pub(crate) alias: String,
    pub(crate) parent: Option<EntityId>,
    /// (field key, child) pairs, insertion-ordered, keys unique
    pub(crate) fields: Vec<(String, FieldNode)>,
    /// Relation name -> child entity, the join-deduplication cache
    pub(crate) relations: HashMap<String, EntityId>,
    /// Join metadata; `None` for the root
    pub(crate) join: Option<JoinMeta>,
}

impl Entity {
    pub(crate) fn new(name: String, alias: String, parent: Option<EntityId>) -> Self {
        Self {
            name,
            alias,
            parent,
            fields: Vec::new(),
            relations: HashMap::new(),
            join: None,
        }
    }

    /// The relation/entity identifier known to the metadata accessor.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The query-local alias.
    pub fn alias(&self) -> &str {
        &self.alias
    }

    /// The parent entity, or `None` for the root.
    pub fn parent(&self) -> Option<EntityId> {
        self.parent
    }

    /// Whether this entity is the tree root.
    pub fn is_root(&self) -> bool {
        self.parent.is_none()
    }

    /// The join metadata, or `None` for the root.
    pub fn join(&self) -> Option<&JoinMeta> {
        self.join.as_ref()
    }

    /// The entity's children, in insertion order.
    pub fn fields(&self) -> &[(String, FieldNode)] {
        &self.fields
    }

    /// Look up a child by field key.
    pub fn field(&self, key: &str) -> Option<&FieldNode> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, node)| node)
    }

    /// Look up a cached sub-relation by name.
    pub fn relation(&self, name: &str) -> Option<EntityId> {
        self.relations.get(name).copied()
    }

    /// Insert a child under `key`, replacing in place if the key exists.
    pub(crate) fn set_field(&mut self, key: String, node: FieldNode) {
        match self.fields.iter().position(|(k, _)| *k == key) {
            Some(index) => self.fields[index].1 = node,
            None => self.fields.push((key, node)),
        }
    }
}
