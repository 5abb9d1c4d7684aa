//! Recursive-descent parser over the token stream produced by [`super::Lexer`].
use crate::error::{Location, SchemaError, SchemaResult};
use crate::model::BasicKind;
use crate::schema::lexer::{Lexer, SpannedToken, Token};
use crate::schema::{EndianAttr, FieldSpec, Schema, TypeDef, TypeSpec};

/// Parses a whole schema file into a [`Schema`] AST.
///
/// The parser performs no name resolution: a `named` reference is recorded
/// as `TypeSpec::Named(name)` and resolved later by
/// [`crate::model::build_schema`].
pub struct Parser {
    tokens: Vec<SpannedToken>,
    pos: usize,
}
impl Parser {
    /// Tokenize and parse the given schema source.
    pub fn parse_source(src: &str) -> SchemaResult<Schema> {
        let tokens = Lexer::new(src).tokenize()?;
        let mut parser = Parser { tokens, pos: 0 };
        parser.parse_schema()
    }

    fn peek(&self) -> &Token {
        &self.tokens[self.pos].token
    }

    fn location(&self) -> Location {
        self.tokens[self.pos].location
    }

    fn bump(&mut self) -> Token {
        let token = self.tokens[self.pos].token.clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn expect(&mut self, expected: &Token, label: &'static str) -> SchemaResult<()> {
        if self.peek() == expected {
            self.bump();
            Ok(())
        } else if matches!(self.peek(), Token::Eof) {
            Err(SchemaError::UnexpectedEof {
                location: self.location(),
                expected: label,
            })
        } else {
            Err(SchemaError::UnexpectedToken {
                location: self.location(),
                expected: label,
                found: self.peek().describe(),
            })
        }
    }

    fn expect_ident(&mut self, label: &'static str) -> SchemaResult<String> {
        match self.peek().clone() {
            Token::Ident(name) => {
                self.bump();
                Ok(name)
            }
            Token::Eof => Err(SchemaError::UnexpectedEof {
                location: self.location(),
                expected: label,
            }),
            _ => Err(SchemaError::UnexpectedToken {
                location: self.location(),
                expected: label,
                found: self.peek().describe(),
            }),
        }
    }

    fn parse_schema(&mut self) -> SchemaResult<Schema> {
        let mut defs = Vec::new();
        while !matches!(self.peek(), Token::Eof) {
            defs.push(self.parse_typedef()?);
        }
        Ok(Schema { defs })
    }

    fn parse_typedef(&mut self) -> SchemaResult<TypeDef> {
        let location = self.location();
        self.expect(&Token::KwType, "'type'")?;
        let name = self.expect_ident("a type name")?;
        let spec = self.parse_typespec()?;
        self.expect(&Token::Semi, "';'")?;
        Ok(TypeDef {
            name,
            spec,
            location,
        })
    }

    fn parse_typespec(&mut self) -> SchemaResult<TypeSpec> {
        match self.peek().clone() {
            Token::LBrack => self.parse_array_or_dict(),
            Token::Question => {
                self.bump();
                Ok(TypeSpec::Maybe(Box::new(self.parse_typespec()?)))
            }
            Token::LBrace => self.parse_struct(),
            Token::KwVariant => {
                self.bump();
                Ok(TypeSpec::Variant)
            }
            Token::Ident(name) => {
                let location = self.location();
                self.bump();
                Ok(match BasicKind::from_name(&name) {
                    Some(kind) => TypeSpec::Basic(kind),
                    None => TypeSpec::Named(name, location),
                })
            }
            Token::Eof => Err(SchemaError::UnexpectedEof {
                location: self.location(),
                expected: "a type expression",
            }),
            _ => Err(SchemaError::UnexpectedToken {
                location: self.location(),
                expected: "a type expression",
                found: self.peek().describe(),
            }),
        }
    }

    fn parse_array_or_dict(&mut self) -> SchemaResult<TypeSpec> {
        self.expect(&Token::LBrack, "'['")?;
        if matches!(self.peek(), Token::RBrack) {
            self.bump();
            let element = self.parse_typespec()?;
            return Ok(TypeSpec::Array(Box::new(element)));
        }
        let key_location = self.location();
        let key_name = self.expect_ident("a basic type name")?;
        let key_kind = BasicKind::from_name(&key_name).ok_or_else(|| SchemaError::UnknownBasicType {
            location: key_location,
            name: key_name.clone(),
        })?;
        self.expect(&Token::RBrack, "']'")?;
        let value = self.parse_typespec()?;
        Ok(TypeSpec::Dict(key_kind, Box::new(value)))
    }

    fn parse_struct(&mut self) -> SchemaResult<TypeSpec> {
        self.expect(&Token::LBrace, "'{'")?;
        let mut fields = Vec::new();
        while !matches!(self.peek(), Token::RBrace) {
            fields.push(self.parse_field()?);
        }
        self.expect(&Token::RBrace, "'}'")?;
        Ok(TypeSpec::Struct(fields))
    }

    fn parse_field(&mut self) -> SchemaResult<FieldSpec> {
        let name = self.expect_ident("a field name")?;
        self.expect(&Token::Colon, "':'")?;
        let mut attrs = Vec::new();
        while let Token::KwEndian(attr) = self.peek().clone() {
            attrs.push(attr);
            self.bump();
        }
        let spec = self.parse_typespec()?;
        self.expect(&Token::Semi, "';'")?;
        Ok(FieldSpec { name, attrs, spec })
    }
}

#[allow(dead_code)]
fn describe_attr(attr: EndianAttr) -> &'static str {
    match attr {
        EndianAttr::Big => "bigendian",
        EndianAttr::Little => "littleendian",
        EndianAttr::Native => "nativeendian",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unit_struct() {
        let schema = Parser::parse_source("type Foo {};").unwrap();
        assert_eq!(schema.defs.len(), 1);
        assert_eq!(schema.defs[0].name, "Foo");
        assert!(matches!(&schema.defs[0].spec, TypeSpec::Struct(fields) if fields.is_empty()));
    }

    #[test]
    fn pair_struct() {
        let schema = Parser::parse_source("type Pair { a: int32; b: byte; };").unwrap();
        match &schema.defs[0].spec {
            TypeSpec::Struct(fields) => {
                assert_eq!(fields.len(), 2);
                assert_eq!(fields[0].name, "a");
                assert!(matches!(fields[0].spec, TypeSpec::Basic(BasicKind::Int32)));
                assert_eq!(fields[1].name, "b");
                assert!(matches!(fields[1].spec, TypeSpec::Basic(BasicKind::Byte)));
            }
            other => panic!("expected struct, got {:?}", other),
        }
    }

    #[test]
    fn array_of_string() {
        let schema = Parser::parse_source("type Names []string;").unwrap();
        assert!(matches!(
            &schema.defs[0].spec,
            TypeSpec::Array(inner) if matches!(**inner, TypeSpec::Basic(BasicKind::String))
        ));
    }

    #[test]
    fn dict_of_string_to_int32() {
        let schema = Parser::parse_source("type D [string]int32;").unwrap();
        match &schema.defs[0].spec {
            TypeSpec::Dict(key, value) => {
                assert_eq!(*key, BasicKind::String);
                assert!(matches!(**value, TypeSpec::Basic(BasicKind::Int32)));
            }
            other => panic!("expected dict, got {:?}", other),
        }
    }

    #[test]
    fn maybe_string() {
        let schema = Parser::parse_source("type M ?string;").unwrap();
        assert!(matches!(
            &schema.defs[0].spec,
            TypeSpec::Maybe(inner) if matches!(**inner, TypeSpec::Basic(BasicKind::String))
        ));
    }

    #[test]
    fn field_attributes_are_parsed_and_kept() {
        let schema = Parser::parse_source("type T { a: bigendian int32; };").unwrap();
        match &schema.defs[0].spec {
            TypeSpec::Struct(fields) => {
                assert_eq!(fields[0].attrs, vec![EndianAttr::Big]);
            }
            other => panic!("expected struct, got {:?}", other),
        }
    }

    #[test]
    fn named_reference_is_recorded_unresolved() {
        let schema = Parser::parse_source("type A int32; type B A;").unwrap();
        assert!(matches!(&schema.defs[1].spec, TypeSpec::Named(name, _) if name == "A"));
    }

    #[test]
    fn unknown_basic_in_dict_key_position_is_an_error() {
        let err = Parser::parse_source("type D [NotABasic]int32;").unwrap_err();
        assert!(matches!(err, SchemaError::UnknownBasicType { .. }));
    }

    #[test]
    fn missing_semicolon_is_an_error() {
        let err = Parser::parse_source("type Foo {}").unwrap_err();
        assert!(matches!(err, SchemaError::UnexpectedEof { .. }));
    }
}
