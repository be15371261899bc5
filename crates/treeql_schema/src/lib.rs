//! Schema layer for treeql.
//!
//! This crate provides:
//! - `ty`: Type references and unwrapping
//! - `types`: Named type definitions
//! - `schema`: The schema model and SDL schema builder
//! - `scalars`: Configurable scalar classification and text input conversion
//! - `error`: Schema construction errors

pub mod error;
pub mod scalars;
pub mod schema;
pub mod ty;
pub mod types;

pub use error::SchemaError;
pub use scalars::{ScalarKind, ScalarKinds};
pub use schema::Schema;
pub use ty::TypeRef;
pub use types::{
    EnumType, EnumValueDefinition, FieldDefinition, InputObjectType, InputValueDefinition,
    InterfaceType, ObjectType, ScalarType, TypeDefinition, UnionType,
};
