//! Error types for datatable operations.

use std::fmt;

/// The primary error type for all datatable operations.
#[derive(Debug)]
pub enum Error {
    /// Invalid argument at tree-assembly time (e.g. empty entity name)
    InvalidArgument(InvalidArgumentError),
    /// An explicit alias collided with one already registered on the table
    DuplicateAlias(DuplicateAliasError),
    /// Metadata resolution errors (unknown entity or association)
    Metadata(MetadataError),
    /// Property-path resolution errors during formatting
    Path(PathError),
}

#[derive(Debug)]
pub struct InvalidArgumentError {
    /// Which argument was rejected
    pub argument: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct DuplicateAliasError {
    /// The alias that was already registered
    pub alias: String,
}

#[derive(Debug)]
pub struct MetadataError {
    pub kind: MetadataErrorKind,
    /// The entity identifier or class the lookup started from
    pub entity: String,
    /// The association name, for association lookups
    pub association: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetadataErrorKind {
    /// No entity or class registered under the given identifier
    UnknownEntity,
    /// The class exists but has no association under the given name
    UnknownAssociation,
}

#[derive(Debug)]
pub struct PathError {
    /// The full path being resolved
    pub path: String,
    pub message: String,
}

impl Error {
    /// Create an `InvalidArgument` error for the named argument.
    pub fn invalid_argument(argument: &'static str, message: impl Into<String>) -> Self {
        Error::InvalidArgument(InvalidArgumentError {
            argument,
            message: message.into(),
        })
    }

    /// Create a `DuplicateAlias` error.
    pub fn duplicate_alias(alias: impl Into<String>) -> Self {
        Error::DuplicateAlias(DuplicateAliasError {
            alias: alias.into(),
        })
    }

    /// Is this a metadata resolution failure?
    pub fn is_metadata(&self) -> bool {
        matches!(self, Error::Metadata(_))
    }

    /// Is this a path resolution failure?
    pub fn is_path(&self) -> bool {
        matches!(self, Error::Path(_))
    }
}

impl MetadataError {
    /// No entity or class registered under `entity`.
    pub fn unknown_entity(entity: impl Into<String>) -> Self {
        let entity = entity.into();
        Self {
            kind: MetadataErrorKind::UnknownEntity,
            message: format!("unknown entity '{entity}'"),
            entity,
            association: None,
        }
    }

    /// `class` exists but has no association named `association`.
    pub fn unknown_association(class: impl Into<String>, association: impl Into<String>) -> Self {
        let class = class.into();
        let association = association.into();
        Self {
            kind: MetadataErrorKind::UnknownAssociation,
            message: format!("class '{class}' has no association '{association}'"),
            entity: class,
            association: Some(association),
        }
    }
}

impl PathError {
    /// The value at `path` is missing the given segment.
    pub fn not_found(path: impl Into<String>, segment: impl fmt::Display) -> Self {
        Self {
            path: path.into(),
            message: format!("no value at segment '{segment}'"),
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(e) => {
                write!(f, "Invalid argument '{}': {}", e.argument, e.message)
            }
            Error::DuplicateAlias(e) => write!(f, "Duplicate alias: {}", e.alias),
            Error::Metadata(e) => write!(f, "Metadata error: {}", e.message),
            Error::Path(e) => write!(f, "Path error at '{}': {}", e.path, e.message),
        }
    }
}

impl std::error::Error for Error {}

impl fmt::Display for InvalidArgumentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for DuplicateAliasError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "alias '{}' is already registered", self.alias)
    }
}

impl fmt::Display for MetadataError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl fmt::Display for PathError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.message)
    }
}

impl From<InvalidArgumentError> for Error {
    fn from(err: InvalidArgumentError) -> Self {
        Error::InvalidArgument(err)
    }
}

impl From<DuplicateAliasError> for Error {
    fn from(err: DuplicateAliasError) -> Self {
        Error::DuplicateAlias(err)
    }
}

impl From<MetadataError> for Error {
    fn from(err: MetadataError) -> Self {
        Error::Metadata(err)
    }
}

impl From<PathError> for Error {
    fn from(err: PathError) -> Self {
        Error::Path(err)
    }
}

/// Result type alias for datatable operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_argument_display_names_the_argument() {
        let err = Error::invalid_argument("name", "must not be empty");
        assert_eq!(
            err.to_string(),
            "Invalid argument 'name': must not be empty"
        );
    }

    #[test]
    fn metadata_helpers_set_kind_and_fields() {
        let unknown = MetadataError::unknown_entity("User");
        assert_eq!(unknown.kind, MetadataErrorKind::UnknownEntity);
        assert_eq!(unknown.entity, "User");
        assert!(unknown.association.is_none());

        let assoc = MetadataError::unknown_association("app.User", "address");
        assert_eq!(assoc.kind, MetadataErrorKind::UnknownAssociation);
        assert_eq!(assoc.association.as_deref(), Some("address"));

        let err = Error::from(assoc);
        assert!(err.is_metadata());
        assert!(!err.is_path());
    }

    #[test]
    fn path_error_reports_segment() {
        let err: Error = PathError::not_found("address.city", "city").into();
        assert!(err.is_path());
        assert_eq!(
            err.to_string(),
            "Path error at 'address.city': no value at segment 'city'"
        );
    }
}
