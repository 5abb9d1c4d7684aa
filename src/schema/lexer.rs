//! Tokenizer for the schema text format.
use crate::error::{Location, SchemaError, SchemaResult};

/// A lexical token.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum Token {
    /// `[`
    LBrack,
    /// `]`
    RBrack,
    /// `{`
    LBrace,
    /// `}`
    RBrace,
    /// `:`
    Colon,
    /// `;`
    Semi,
    /// `?`
    Question,
    /// The `type` keyword.
    KwType,
    /// The `variant` keyword.
    KwVariant,
    /// `bigendian` / `littleendian` / `nativeendian`
    KwEndian(crate::schema::EndianAttr),
    /// An identifier, including basic type names (the parser disambiguates
    /// basic-type keywords from ordinary identifiers by lookup, since both
    /// share the same lexical shape).
    Ident(String),
    /// End of input.
    Eof,
}
impl Token {
    /// A short human-readable label, used in "expected X, found Y" errors.
    pub fn describe(&self) -> String {
        match self {
            Token::LBrack => "'['".to_string(),
            Token::RBrack => "']'".to_string(),
            Token::LBrace => "'{'".to_string(),
            Token::RBrace => "'}'".to_string(),
            Token::Colon => "':'".to_string(),
            Token::Semi => "';'".to_string(),
            Token::Question => "'?'".to_string(),
            Token::KwType => "'type'".to_string(),
            Token::KwVariant => "'variant'".to_string(),
            Token::KwEndian(_) => "an endianness attribute".to_string(),
            Token::Ident(name) => format!("identifier {:?}", name),
            Token::Eof => "end of input".to_string(),
        }
    }
}

/// A token paired with the location of its first character.
#[derive(Clone, Debug)]
pub struct SpannedToken {
    /// The token itself.
    pub token: Token,
    /// Where it starts in the source.
    pub location: Location,
}

/// Converts schema source text into a stream of [`SpannedToken`]s.
///
/// C++-style `//` line comments are skipped entirely; they never produce
/// tokens.
pub struct Lexer<'src> {
    chars: std::iter::Peekable<std::str::CharIndices<'src>>,
    src: &'src str,
    line: usize,
    column: usize,
}
impl<'src> Lexer<'src> {
    /// Create a lexer over the given source text.
    pub fn new(src: &'src str) -> Self {
        Lexer {
            chars: src.char_indices().peekable(),
            src,
            line: 1,
            column: 1,
        }
    }

    fn location(&self) -> Location {
        Location {
            line: self.line,
            column: self.column,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let (_, c) = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn peek_char(&mut self) -> Option<char> {
        self.chars.peek().map(|&(_, c)| c)
    }

    fn skip_whitespace_and_comments(&mut self) {
        loop {
            match self.peek_char() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    if matches!(lookahead.peek(), Some(&(_, '/'))) {
                        while !matches!(self.peek_char(), Some('\n') | None) {
                            self.bump();
                        }
                    } else {
                        break;
                    }
                }
                _ => break,
            }
        }
    }

    /// Tokenize the entire source, ending with a single [`Token::Eof`].
    pub fn tokenize(mut self) -> SchemaResult<Vec<SpannedToken>> {
        let mut tokens = Vec::new();
        loop {
            self.skip_whitespace_and_comments();
            let location = self.location();
            let Some(c) = self.peek_char() else {
                tokens.push(SpannedToken {
                    token: Token::Eof,
                    location,
                });
                break;
            };
            let token = match c {
                '[' => {
                    self.bump();
                    Token::LBrack
                }
                ']' => {
                    self.bump();
                    Token::RBrack
                }
                '{' => {
                    self.bump();
                    Token::LBrace
                }
                '}' => {
                    self.bump();
                    Token::RBrace
                }
                ':' => {
                    self.bump();
                    Token::Colon
                }
                ';' => {
                    self.bump();
                    Token::Semi
                }
                '?' => {
                    self.bump();
                    Token::Question
                }
                c if c.is_alphabetic() || c == '_' => self.lex_ident(),
                other => {
                    return Err(SchemaError::UnexpectedChar {
                        location,
                        found: other,
                    })
                }
            };
            tokens.push(SpannedToken { token, location });
        }
        Ok(tokens)
    }

    fn lex_ident(&mut self) -> Token {
        let start = self.chars.peek().map(|&(i, _)| i).unwrap();
        while matches!(self.peek_char(), Some(c) if c.is_alphanumeric() || c == '_') {
            self.bump();
        }
        let end = self
            .chars
            .peek()
            .map(|&(i, _)| i)
            .unwrap_or(self.src.len());
        let word = &self.src[start..end];
        match word {
            "type" => Token::KwType,
            "variant" => Token::KwVariant,
            "bigendian" => Token::KwEndian(crate::schema::EndianAttr::Big),
            "littleendian" => Token::KwEndian(crate::schema::EndianAttr::Little),
            "nativeendian" => Token::KwEndian(crate::schema::EndianAttr::Native),
            _ => Token::Ident(word.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens_of(src: &str) -> Vec<Token> {
        Lexer::new(src)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|t| t.token)
            .collect()
    }

    #[test]
    fn punctuation_and_idents() {
        assert_eq!(
            tokens_of("type Pair { a: int32; };"),
            vec![
                Token::KwType,
                Token::Ident("Pair".into()),
                Token::LBrace,
                Token::Ident("a".into()),
                Token::Colon,
                Token::Ident("int32".into()),
                Token::Semi,
                Token::RBrace,
                Token::Semi,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn comments_are_skipped() {
        assert_eq!(
            tokens_of("// a comment\ntype Foo {};"),
            vec![
                Token::KwType,
                Token::Ident("Foo".into()),
                Token::LBrace,
                Token::RBrace,
                Token::Semi,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn endian_attribute_keywords() {
        assert_eq!(
            tokens_of("bigendian littleendian nativeendian"),
            vec![
                Token::KwEndian(crate::schema::EndianAttr::Big),
                Token::KwEndian(crate::schema::EndianAttr::Little),
                Token::KwEndian(crate::schema::EndianAttr::Native),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn unexpected_char_is_reported() {
        let err = Lexer::new("type Foo = 1;").tokenize().unwrap_err();
        assert!(matches!(err, SchemaError::UnexpectedChar { found: '=', .. }));
    }
}
