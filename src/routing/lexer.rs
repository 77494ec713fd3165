//! Lexer for route path patterns
//!
//! Tokenizes patterns like `/users/{id:[0-9]+}` into a flat token stream.
//! The lexer is intentionally lenient: it never fails, and malformed input
//! surfaces as an unexpected token sequence that the parser rejects.

use std::fmt;

/// Token types for path pattern syntax
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    /// `/`
    Slash,
    /// A run of literal path characters
    Static(String),
    /// `{` opening a parameter
    OpenVar,
    /// Parameter identifier inside braces
    VarIdent(String),
    /// `}` closing a parameter
    CloseVar,
    /// Regex constraint following `:` inside a parameter (outer braces excluded)
    Regex(String),
    /// End of input
    End,
}

#[derive(Debug, Clone)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

impl Token {
    pub fn new(kind: TokenKind, offset: usize) -> Self {
        Self { kind, offset }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} at offset {}", self.kind, self.offset)
    }
}

/// Lexer mode: `Identifier` is entered after `{` and left after one
/// identifier has been emitted.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Mode {
    Static,
    Identifier,
}

/// Lexer for path patterns
pub struct Lexer {
    input: Vec<char>,
    position: usize,
    current_char: Option<char>,
    mode: Mode,
}

impl Lexer {
    pub fn new(input: &str) -> Self {
        let chars: Vec<char> = input.chars().collect();
        let current_char = chars.first().copied();

        Self {
            input: chars,
            position: 0,
            current_char,
            mode: Mode::Static,
        }
    }

    /// Tokenize the whole input, always terminated by an `End` token.
    pub fn tokenize(mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let done = token.kind == TokenKind::End;
            tokens.push(token);
            if done {
                break;
            }
        }
        tokens
    }

    /// Advance to the next character
    fn advance(&mut self) {
        self.position += 1;
        self.current_char = self.input.get(self.position).copied();
    }

    fn next_token(&mut self) -> Token {
        let offset = self.position;
        let kind = match self.current_char {
            None => TokenKind::End,
            Some('/') => {
                self.advance();
                self.mode = Mode::Static;
                TokenKind::Slash
            }
            Some('{') => {
                self.advance();
                self.mode = Mode::Identifier;
                TokenKind::OpenVar
            }
            Some('}') => {
                self.advance();
                self.mode = Mode::Static;
                TokenKind::CloseVar
            }
            Some(':') => {
                self.advance();
                TokenKind::Regex(self.read_regex())
            }
            Some(c) => {
                if self.mode == Mode::Identifier && is_identifier_char(c) {
                    let ident = self.read_identifier();
                    self.mode = Mode::Static;
                    TokenKind::VarIdent(ident)
                } else {
                    self.mode = Mode::Static;
                    TokenKind::Static(self.read_static())
                }
            }
        };
        Token::new(kind, offset)
    }

    /// Read an identifier: ASCII letters, digits and `_`.
    fn read_identifier(&mut self) -> String {
        let mut result = String::new();
        while let Some(c) = self.current_char {
            if !is_identifier_char(c) {
                break;
            }
            result.push(c);
            self.advance();
        }
        result
    }

    /// Read a regex source up to (but not including) the matching `}`.
    ///
    /// Brace depth is tracked so that balanced braces inside the regex,
    /// e.g. quantifiers like `[0-9]{4}`, are kept intact.
    fn read_regex(&mut self) -> String {
        let mut result = String::new();
        let mut brace_depth = 0usize;

        while let Some(c) = self.current_char {
            match c {
                '{' => brace_depth += 1,
                '}' => {
                    if brace_depth == 0 {
                        break;
                    }
                    brace_depth -= 1;
                }
                _ => {}
            }
            result.push(c);
            self.advance();
        }

        result
    }

    /// Read a run of literal path characters, stopping at any
    /// structural character.
    fn read_static(&mut self) -> String {
        let mut result = String::new();
        while let Some(c) = self.current_char {
            if matches!(c, '/' | '{' | '}' | ':') {
                break;
            }
            result.push(c);
            self.advance();
        }
        result
    }
}

fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(pattern: &str) -> Vec<TokenKind> {
        Lexer::new(pattern)
            .tokenize()
            .into_iter()
            .map(|t| t.kind)
            .collect()
    }

    #[test]
    fn test_static_pattern() {
        assert_eq!(
            kinds("/users/profile"),
            vec![
                TokenKind::Slash,
                TokenKind::Static("users".to_string()),
                TokenKind::Slash,
                TokenKind::Static("profile".to_string()),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_root_pattern() {
        assert_eq!(kinds("/"), vec![TokenKind::Slash, TokenKind::End]);
    }

    #[test]
    fn test_parameter() {
        assert_eq!(
            kinds("/users/{id}"),
            vec![
                TokenKind::Slash,
                TokenKind::Static("users".to_string()),
                TokenKind::Slash,
                TokenKind::OpenVar,
                TokenKind::VarIdent("id".to_string()),
                TokenKind::CloseVar,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_parameter_with_regex() {
        assert_eq!(
            kinds("/users/{id:[0-9]+}"),
            vec![
                TokenKind::Slash,
                TokenKind::Static("users".to_string()),
                TokenKind::Slash,
                TokenKind::OpenVar,
                TokenKind::VarIdent("id".to_string()),
                TokenKind::Regex("[0-9]+".to_string()),
                TokenKind::CloseVar,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_regex_with_nested_braces() {
        // Quantifier braces inside the regex must not close the variable
        assert_eq!(
            kinds("/{date:[0-9]{4}-[0-9]{2}-[0-9]{2}}"),
            vec![
                TokenKind::Slash,
                TokenKind::OpenVar,
                TokenKind::VarIdent("date".to_string()),
                TokenKind::Regex("[0-9]{4}-[0-9]{2}-[0-9]{2}".to_string()),
                TokenKind::CloseVar,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_catch_all() {
        assert_eq!(
            kinds("/files/{path:.*}"),
            vec![
                TokenKind::Slash,
                TokenKind::Static("files".to_string()),
                TokenKind::Slash,
                TokenKind::OpenVar,
                TokenKind::VarIdent("path".to_string()),
                TokenKind::Regex(".*".to_string()),
                TokenKind::CloseVar,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_empty_variable_is_lexed_leniently() {
        // Semantically invalid, but the lexer just reports what it saw
        assert_eq!(
            kinds("/{}"),
            vec![
                TokenKind::Slash,
                TokenKind::OpenVar,
                TokenKind::CloseVar,
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_unterminated_variable() {
        assert_eq!(
            kinds("/path/{id"),
            vec![
                TokenKind::Slash,
                TokenKind::Static("path".to_string()),
                TokenKind::Slash,
                TokenKind::OpenVar,
                TokenKind::VarIdent("id".to_string()),
                TokenKind::End,
            ]
        );
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(kinds(""), vec![TokenKind::End]);
    }

    #[test]
    fn test_offsets() {
        let tokens = Lexer::new("/a/{b}").tokenize();
        let offsets: Vec<usize> = tokens.iter().map(|t| t.offset).collect();
        assert_eq!(offsets, vec![0, 1, 2, 3, 4, 5, 6]);
    }
}
