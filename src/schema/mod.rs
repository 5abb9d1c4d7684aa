//! The schema text format and its abstract syntax tree.
//!
//! A schema is a sequence of `type NAME TYPESPEC;` declarations in
//! dependency order. See the crate's `SPEC_FULL.md` §4.1 for the full
//! grammar; this module only defines the AST the parser builds and the
//! token stream the lexer produces over it.
mod lexer;
mod parser;

pub use self::lexer::{Lexer, Token};
pub use self::parser::Parser;

use crate::error::Location;
use crate::model::BasicKind;

/// An endianness attribute attached to a field.
///
/// Parsed for fidelity with real-world schemas, but never consulted by the
/// layout engine or emitters: only little-endian output is supported, per
/// the format's Non-goals.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum EndianAttr {
    /// `bigendian`
    Big,
    /// `littleendian`
    Little,
    /// `nativeendian`
    Native,
}

/// A type expression as written in the schema, before name resolution.
#[derive(Clone, Debug)]
pub enum TypeSpec {
    /// One of the fixed basic kinds.
    Basic(BasicKind),
    /// The `variant` keyword.
    Variant,
    /// `[] T`
    Array(Box<TypeSpec>),
    /// `[K] V`, `K` restricted to a basic type by the grammar.
    Dict(BasicKind, Box<TypeSpec>),
    /// `? T`
    Maybe(Box<TypeSpec>),
    /// `{ field... }`
    Struct(Vec<FieldSpec>),
    /// A reference to a type declared earlier in the schema, with the
    /// location of the reference (used to report unresolved names).
    Named(String, Location),
}

/// One field inside a `struct` type expression.
#[derive(Clone, Debug)]
pub struct FieldSpec {
    /// The field's name, used both for accessor generation and for name
    /// propagation to the field's type.
    pub name: String,
    /// Endianness attributes, parsed and ignored.
    pub attrs: Vec<EndianAttr>,
    /// The field's type expression.
    pub spec: TypeSpec,
}

/// A single `type NAME TYPESPEC;` declaration.
#[derive(Clone, Debug)]
pub struct TypeDef {
    /// The name under which this type is registered.
    pub name: String,
    /// The type expression.
    pub spec: TypeSpec,
    /// Where the `type` keyword introducing this declaration appeared.
    pub location: Location,
}

/// A full schema file: an ordered list of top-level type declarations.
#[derive(Clone, Debug, Default)]
pub struct Schema {
    /// Declarations in source order (which is also dependency order).
    pub defs: Vec<TypeDef>,
}
