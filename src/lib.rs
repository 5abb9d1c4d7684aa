//! A compile-time accessor generator for the GVariant binary
//! serialization format.
//!
//! Given a small schema language naming composite types — arrays,
//! dictionaries, maybes, structs, variants — over a fixed set of basic
//! scalar/string kinds, this crate computes each type's alignment,
//! fixedness, and (for structs) per-field offset table, then emits C code
//! exposing zero-copy accessors and canonical-text formatters over that
//! layout.
//!
//! The pipeline is schema text → AST ([`schema`]) → named type registry
//! ([`model`]) → emitted C source ([`codegen`]).
#![deny(unused_features, stable_features)]

pub mod codegen;
pub mod error;
pub mod model;
pub mod schema;

pub use crate::error::{SchemaError, SchemaResult};
pub use crate::model::TypeRegistry;
pub use crate::schema::Schema;

/// Parse and resolve a whole schema file's source text in one step.
pub fn compile_schema(src: &str) -> SchemaResult<TypeRegistry> {
    let schema = schema::Parser::parse_source(src)?;
    model::build_schema(&schema)
}
