//! Error types for the schema compiler.
//!
//! Three families, matching the error-handling design: [`SchemaError`] for
//! malformed input (recoverable only by fixing the schema and re-running),
//! plus the `debug_assert!`/`panic!` call sites scattered through
//! [`crate::model::layout`] for internal invariant violations, which are
//! bugs rather than `Result`s. Command-line usage errors are reported by
//! `clap` itself and never reach this module.
use std::fmt;

/// The location of a token in the schema source, used to annotate parse
/// errors.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Default)]
pub struct Location {
    /// One-based line number.
    pub line: usize,
    /// One-based column number.
    pub column: usize,
}
impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Everything that can go wrong while parsing a schema or resolving its
/// named types.
#[derive(thiserror::Error, Debug)]
pub enum SchemaError {
    /// The lexer found a character that starts no valid token.
    #[error("{location}: unexpected character {found:?}")]
    UnexpectedChar {
        /// Where the bad character was found.
        location: Location,
        /// The offending character.
        found: char,
    },
    /// The parser wanted one kind of token but got another.
    #[error("{location}: expected {expected}, found {found}")]
    UnexpectedToken {
        /// Where the mismatch occurred.
        location: Location,
        /// What the grammar required at this point.
        expected: &'static str,
        /// A human-readable description of what was actually found.
        found: String,
    },
    /// Input ended mid-construct.
    #[error("{location}: unexpected end of input, expected {expected}")]
    UnexpectedEof {
        /// The location of the last token seen.
        location: Location,
        /// What the grammar required at this point.
        expected: &'static str,
    },
    /// A `[ basic ]` dict-key position named something that isn't a basic
    /// type.
    #[error("{location}: unknown basic type {name:?}")]
    UnknownBasicType {
        /// Where the bad identifier appeared.
        location: Location,
        /// The identifier that wasn't a basic type.
        name: String,
    },
    /// A `named` reference didn't resolve to any type declared so far.
    #[error("{location}: unknown named type {name:?}")]
    UnknownNamedType {
        /// Where the reference appeared.
        location: Location,
        /// The unresolved name.
        name: String,
    },
    /// The same top-level name was declared twice.
    #[error("{location}: duplicate type definition {name:?}")]
    DuplicateType {
        /// Where the second declaration appeared.
        location: Location,
        /// The name declared twice.
        name: String,
    },
}

/// A specialized [`Result`] for schema parsing and type resolution.
pub type SchemaResult<T> = Result<T, SchemaError>;
