//! Entity metadata access.
//!
//! The composition tree never inspects a schema directly: class identities,
//! identifier fields, and association targets all come from a
//! [`MetadataProvider`]. Embedders sitting on a live ORM implement the trait
//! against its metadata factory; everyone else (tests included) can describe
//! the entity graph up front with a [`SchemaRegistry`].

use crate::error::{MetadataError, Result};
use std::collections::HashMap;

/// Resolves entity identifiers to class identities, identifier fields, and
/// association targets.
///
/// All lookups are pure: implementations may cache internally, but callers
/// re-query on every resolution and must receive consistent answers for the
/// lifetime of a request.
pub trait MetadataProvider {
    /// Resolve an entity identifier to its fully-qualified class identity.
    fn class_name(&self, entity: &str) -> Result<String>;

    /// Resolve the class reachable from `class` through the association
    /// named `association`.
    fn association_target(&self, class: &str, association: &str) -> Result<String>;

    /// The identifier (primary key) field(s) of `class`.
    fn identifier_fields(&self, class: &str) -> Result<Vec<String>>;
}

/// Static description of one entity in a [`SchemaRegistry`].
#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    /// Entity identifier as used in tree assembly (e.g. `"User"`).
    name: String,
    /// Fully-qualified class identity (e.g. `"app.entity.User"`).
    class_name: String,
    /// Identifier field(s).
    identifier: Vec<String>,
    /// Association name -> target entity identifier.
    associations: HashMap<String, String>,
}

impl EntityDescriptor {
    /// Create a descriptor with a single `"id"` identifier field.
    pub fn new(name: impl Into<String>, class_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            class_name: class_name.into(),
            identifier: vec!["id".to_string()],
            associations: HashMap::new(),
        }
    }

    /// Replace the identifier field(s).
    pub fn identifier(mut self, fields: &[&str]) -> Self {
        self.identifier = fields.iter().map(|&f| f.to_string()).collect();
        self
    }

    /// Declare an association to another registered entity.
    pub fn association(mut self, name: impl Into<String>, target: impl Into<String>) -> Self {
        self.associations.insert(name.into(), target.into());
        self
    }

    /// The entity identifier.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The fully-qualified class identity.
    pub fn class(&self) -> &str {
        &self.class_name
    }
}

/// In-memory [`MetadataProvider`] backed by registered [`EntityDescriptor`]s.
#[derive(Debug, Default)]
pub struct SchemaRegistry {
    entities: HashMap<String, EntityDescriptor>,
}

impl SchemaRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an entity descriptor, replacing any previous one with the
    /// same name.
    pub fn register(&mut self, descriptor: EntityDescriptor) -> &mut Self {
        tracing::debug!(
            entity = %descriptor.name,
            class = %descriptor.class_name,
            associations = descriptor.associations.len(),
            "registering entity descriptor"
        );
        self.entities.insert(descriptor.name.clone(), descriptor);
        self
    }

    fn by_name(&self, entity: &str) -> Result<&EntityDescriptor> {
        self.entities
            .get(entity)
            .ok_or_else(|| MetadataError::unknown_entity(entity).into())
    }

    fn by_class(&self, class: &str) -> Result<&EntityDescriptor> {
        self.entities
            .values()
            .find(|d| d.class_name == class)
            .ok_or_else(|| MetadataError::unknown_entity(class).into())
    }
}

impl MetadataProvider for SchemaRegistry {
    fn class_name(&self, entity: &str) -> Result<String> {
        Ok(self.by_name(entity)?.class_name.clone())
    }

    fn association_target(&self, class: &str, association: &str) -> Result<String> {
        let descriptor = self.by_class(class)?;
        let target = descriptor.associations.get(association).ok_or_else(|| {
            MetadataError::unknown_association(class, association)
        })?;
        Ok(self.by_name(target)?.class_name.clone())
    }

    fn identifier_fields(&self, class: &str) -> Result<Vec<String>> {
        Ok(self.by_class(class)?.identifier.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, MetadataErrorKind};

    fn registry() -> SchemaRegistry {
        let mut registry = SchemaRegistry::new();
        registry
            .register(
                EntityDescriptor::new("User", "app.entity.User")
                    .association("address", "Address"),
            )
            .register(
                EntityDescriptor::new("Address", "app.entity.Address")
                    .identifier(&["address_id"]),
            );
        registry
    }

    #[test]
    fn resolves_class_name() {
        let registry = registry();
        assert_eq!(registry.class_name("User").unwrap(), "app.entity.User");
    }

    #[test]
    fn resolves_association_target_to_class() {
        let registry = registry();
        assert_eq!(
            registry
                .association_target("app.entity.User", "address")
                .unwrap(),
            "app.entity.Address"
        );
    }

    #[test]
    fn resolves_identifier_fields() {
        let registry = registry();
        assert_eq!(
            registry.identifier_fields("app.entity.User").unwrap(),
            vec!["id".to_string()]
        );
        assert_eq!(
            registry.identifier_fields("app.entity.Address").unwrap(),
            vec!["address_id".to_string()]
        );
    }

    #[test]
    fn unknown_entity_fails() {
        let registry = registry();
        let err = registry.class_name("Order").unwrap_err();
        match err {
            Error::Metadata(e) => assert_eq!(e.kind, MetadataErrorKind::UnknownEntity),
            other => panic!("expected metadata error, got {other:?}"),
        }
    }

    #[test]
    fn unknown_association_fails() {
        let registry = registry();
        let err = registry
            .association_target("app.entity.User", "orders")
            .unwrap_err();
        match err {
            Error::Metadata(e) => {
                assert_eq!(e.kind, MetadataErrorKind::UnknownAssociation);
                assert_eq!(e.association.as_deref(), Some("orders"));
            }
            other => panic!("expected metadata error, got {other:?}"),
        }
    }
}
