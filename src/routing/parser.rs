//! Parser for route path patterns
//!
//! Consumes the lexer's token stream and produces an alternating list of
//! static and dynamic chunks. All semantic validation of a pattern lives
//! here; registration fails before anything touches the tree.

use super::lexer::{Lexer, Token, TokenKind};
use crate::error::{Error, Result};
use regex::bytes::Regex;

/// A compiled parameter constraint.
///
/// The raw source is kept for equality checks and URL generation; the
/// compiled regex is anchored so it always matches the whole captured value.
#[derive(Debug, Clone)]
pub struct ParamPattern {
    source: String,
    regex: Regex,
}

impl ParamPattern {
    /// Compile a regex source, wrapping it in `^(?:...)$` anchors.
    pub fn compile(pattern: &str, source: &str) -> Result<Self> {
        let anchored = format!("^(?:{})$", source);
        let regex = Regex::new(&anchored).map_err(|e| Error::Regex {
            pattern: pattern.to_string(),
            regex: source.to_string(),
            source: e,
        })?;

        Ok(Self {
            source: source.to_string(),
            regex,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn is_match(&self, value: &[u8]) -> bool {
        self.regex.is_match(value)
    }

    /// A catch-all parameter is the wildcard sentinel `.*`; it is the only
    /// constraint allowed to span `/`.
    pub fn is_catch_all(&self) -> bool {
        self.source == ".*"
    }
}

impl PartialEq for ParamPattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

/// A parsed fragment of a pattern: literal text, or a named parameter with
/// an optional regex constraint.
#[derive(Debug, Clone, PartialEq)]
pub enum Chunk {
    Static(String),
    Dynamic {
        name: String,
        pattern: Option<ParamPattern>,
    },
}

impl Chunk {
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Chunk::Dynamic { .. })
    }
}

/// Parse a path pattern into chunks.
pub fn parse_pattern(pattern: &str) -> Result<Vec<Chunk>> {
    Parser::new(pattern).parse()
}

/// Parser for path patterns
pub struct Parser {
    pattern: String,
    tokens: Vec<Token>,
    position: usize,
}

impl Parser {
    pub fn new(pattern: &str) -> Self {
        let tokens = Lexer::new(pattern).tokenize();

        Self {
            pattern: pattern.to_string(),
            tokens,
            position: 0,
        }
    }

    /// Current token; the stream is always terminated by `End`.
    fn current(&self) -> &Token {
        match self.tokens.get(self.position) {
            Some(token) => token,
            None => &self.tokens[self.tokens.len() - 1],
        }
    }

    fn advance(&mut self) {
        self.position += 1;
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::parse(self.pattern.clone(), self.current().offset, message)
    }

    /// Parse the whole pattern into an alternating chunk list.
    ///
    /// The first chunk is always static and starts with `/`.
    pub fn parse(mut self) -> Result<Vec<Chunk>> {
        if self.current().kind != TokenKind::Slash {
            return Err(self.error("expected `/`"));
        }

        let mut chunks = Vec::new();
        let mut static_buf = String::new();
        let mut last_was_slash = false;
        let mut last_was_var = false;

        loop {
            let kind = self.current().kind.clone();
            match kind {
                TokenKind::Slash => {
                    if last_was_slash {
                        return Err(self.error("empty path segment"));
                    }
                    static_buf.push('/');
                    last_was_slash = true;
                    last_was_var = false;
                    self.advance();
                }

                TokenKind::Static(text) => {
                    static_buf.push_str(&text);
                    last_was_slash = false;
                    last_was_var = false;
                    self.advance();
                }

                TokenKind::OpenVar => {
                    if last_was_var {
                        return Err(self.error("adjacent parameters must be separated"));
                    }
                    if !static_buf.is_empty() {
                        chunks.push(Chunk::Static(std::mem::take(&mut static_buf)));
                    }
                    self.advance();
                    chunks.push(self.parse_variable()?);
                    last_was_slash = false;
                    last_was_var = true;
                }

                TokenKind::CloseVar => return Err(self.error("unmatched `}`")),

                TokenKind::Regex(_) => {
                    return Err(self.error("regex constraint outside of a parameter"))
                }

                TokenKind::VarIdent(_) => {
                    return Err(self.error("parameter name outside of a parameter"))
                }

                TokenKind::End => {
                    if !static_buf.is_empty() {
                        chunks.push(Chunk::Static(static_buf));
                    }
                    break;
                }
            }
        }

        Ok(chunks)
    }

    /// Parse `ident regex? '}'`, the opening brace already consumed.
    fn parse_variable(&mut self) -> Result<Chunk> {
        let name = match &self.current().kind {
            TokenKind::VarIdent(name) => name.clone(),
            TokenKind::CloseVar => return Err(self.error("empty parameter name")),
            _ => return Err(self.error("expected parameter name")),
        };
        self.advance();

        let pattern = match &self.current().kind {
            TokenKind::Regex(source) => {
                let source = source.clone();
                self.advance();
                Some(ParamPattern::compile(&self.pattern, &source)?)
            }
            _ => None,
        };

        match self.current().kind {
            TokenKind::CloseVar => {
                self.advance();
                Ok(Chunk::Dynamic { name, pattern })
            }
            _ => Err(self.error("unterminated parameter, expected `}`")),
        }
    }
}
