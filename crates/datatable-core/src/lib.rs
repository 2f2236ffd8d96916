//! Core types and traits for Datatable Rust.
//!
//! This crate provides the foundational abstractions the composition tree
//! builds on:
//!
//! - `Error`/`Result` taxonomy shared across the workspace
//! - `Value` for filter parameter binding
//! - `MetadataProvider` trait plus the in-memory `SchemaRegistry`
//! - `PropertyPath` resolution over structured row values

pub mod access;
pub mod error;
pub mod metadata;
pub mod value;

pub use access::{PathSegment, PropertyPath, resolve};
pub use error::{
    DuplicateAliasError, Error, InvalidArgumentError, MetadataError, MetadataErrorKind, PathError,
    Result,
};
pub use metadata::{EntityDescriptor, MetadataProvider, SchemaRegistry};
pub use value::Value;
