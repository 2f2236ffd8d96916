//! Leaf field behavior.

use crate::entity::EntityId;
use datatable_core::{Error, Result};
use datatable_query::{Expr, SelectSpec};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// How a field's raw value is coerced during formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FormatHint {
    /// Render as text (stringify non-strings)
    #[default]
    Text,
    /// Coerce to a 64-bit integer
    Integer,
    /// Coerce to a floating-point number
    Number,
    /// Coerce to a boolean
    Boolean,
    /// Pass the raw value through untouched
    Raw,
}

/// Per-field configuration.
///
/// The recognized option set is closed: search participation per mode,
/// sortability (consumed by the sibling ordering component), and the
/// formatting coercion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldOptions {
    /// Participates in per-column filtering
    pub searchable: bool,
    /// Participates in cross-column global search
    pub global_searchable: bool,
    /// May be used as an ordering key
    pub sortable: bool,
    /// Formatting coercion
    pub format_hint: FormatHint,
}

impl FieldOptions {
    /// Create options with everything disabled and `Text` formatting.
    pub const fn new() -> Self {
        Self {
            searchable: false,
            global_searchable: false,
            sortable: false,
            format_hint: FormatHint::Text,
        }
    }

    /// Set per-column search participation.
    pub const fn searchable(mut self, value: bool) -> Self {
        self.searchable = value;
        self
    }

    /// Set global search participation.
    pub const fn global_searchable(mut self, value: bool) -> Self {
        self.global_searchable = value;
        self
    }

    /// Set sortability.
    pub const fn sortable(mut self, value: bool) -> Self {
        self.sortable = value;
        self
    }

    /// Set the formatting coercion.
    pub const fn format_hint(mut self, hint: FormatHint) -> Self {
        self.format_hint = hint;
        self
    }
}

/// A leaf node: one scalar column's select/filter/format behavior.
#[derive(Debug, Clone)]
pub struct Field {
    /// Column name on the owning entity
    name: String,
    options: FieldOptions,
    /// Search term assigned for the current request, if any
    search: Option<String>,
}

impl Field {
    /// Create a field.
    ///
    /// Fails with `InvalidArgument` when the column name is empty.
    pub fn new(name: impl Into<String>, options: FieldOptions) -> Result<Self> {
        let name = name.into();
        if name.is_empty() {
            return Err(Error::invalid_argument("name", "field name must not be empty"));
        }
        Ok(Self {
            name,
            options,
            search: None,
        })
    }

    /// The column name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field's configuration.
    pub fn options(&self) -> &FieldOptions {
        &self.options
    }

    /// The current search term, if one is set.
    pub fn search(&self) -> Option<&str> {
        self.search.as_deref()
    }

    /// Assign or clear the search term for the current request.
    pub fn set_search(&mut self, term: Option<String>) {
        self.search = term;
    }

    /// Whether this field participates in search for the given mode.
    ///
    /// A field only participates when it has a term to match; an enabled
    /// flag without a term contributes nothing.
    pub fn is_search(&self, global: bool) -> bool {
        let enabled = if global {
            self.options.global_searchable
        } else {
            self.options.searchable
        };
        enabled && self.search.is_some()
    }

    /// The qualified column reference under the owning entity's alias.
    pub fn full_name(&self, alias: &str) -> String {
        format!("{alias}.{}", self.name)
    }

    /// Build this field's search predicate, if it has a term to match.
    pub fn predicate(&self, alias: &str) -> Option<Expr> {
        let term = self.search.as_ref()?;
        Some(Expr::qualified(alias, &self.name).like(format!("%{term}%")))
    }

    /// This field's contribution to the declarative select spec.
    pub fn select_spec(&self, alias: &str) -> SelectSpec {
        let mut spec = SelectSpec::new();
        spec.insert(
            alias.to_string(),
            JsonValue::Array(vec![JsonValue::String(self.name.clone())]),
        );
        spec
    }

    /// Coerce an extracted raw value per the field's format hint.
    pub fn format(&self, value: &JsonValue) -> JsonValue {
        if value.is_null() {
            return JsonValue::Null;
        }

        match self.options.format_hint {
            FormatHint::Raw => value.clone(),
            FormatHint::Text => match value {
                JsonValue::String(s) => JsonValue::String(s.clone()),
                other => JsonValue::String(other.to_string()),
            },
            FormatHint::Integer => match value {
                JsonValue::Number(n) => n.as_i64().map_or(JsonValue::Null, JsonValue::from),
                JsonValue::String(s) => s
                    .trim()
                    .parse::<i64>()
                    .map_or(JsonValue::Null, JsonValue::from),
                JsonValue::Bool(b) => JsonValue::from(i64::from(*b)),
                _ => JsonValue::Null,
            },
            FormatHint::Number => match value {
                JsonValue::Number(n) => n.as_f64().map_or(JsonValue::Null, JsonValue::from),
                JsonValue::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map_or(JsonValue::Null, JsonValue::from),
                _ => JsonValue::Null,
            },
            FormatHint::Boolean => match value {
                JsonValue::Bool(b) => JsonValue::Bool(*b),
                JsonValue::Number(n) => JsonValue::Bool(n.as_f64() != Some(0.0)),
                JsonValue::String(s) => match s.as_str() {
                    "true" | "1" => JsonValue::Bool(true),
                    "false" | "0" => JsonValue::Bool(false),
                    _ => JsonValue::Null,
                },
                _ => JsonValue::Null,
            },
        }
    }
}

/// A child of an entity: either a leaf column or a nested entity.
///
/// The capability set the traversals need (select spec, filter, format,
/// search participation, path) is closed over these two variants; the
/// traversal algorithms dispatch on the variant.
#[derive(Debug, Clone)]
pub enum FieldNode {
    /// A scalar column
    Leaf(Field),
    /// A nested entity, formatted as a sub-structure
    Entity(EntityId),
}

impl FieldNode {
    /// The leaf field, if this node is one.
    pub fn as_leaf(&self) -> Option<&Field> {
        match self {
            FieldNode::Leaf(field) => Some(field),
            FieldNode::Entity(_) => None,
        }
    }

    /// The nested entity id, if this node is one.
    pub fn as_entity(&self) -> Option<EntityId> {
        match self {
            FieldNode::Leaf(_) => None,
            FieldNode::Entity(id) => Some(*id),
        }
    }
}
