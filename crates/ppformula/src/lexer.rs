//! Formula tokenizer
//!
//! A single forward scan over the source text. The lexer never fails: anything it does not
//! recognise is swallowed into a [`Token::Text`] run so the parser always has something to work
//! with.

use crate::value::parse_float_prefix;
use lazy_regex::regex_is_match;
use std::fmt;

/// Lexical token
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `[[ Name ]]`, trimmed inner text
    Field(String),
    /// Quoted string literal
    String(String),
    /// Numeric literal
    Number(f64),
    /// Bare `YYYY-MM-DD...` text
    Date(String),
    /// `=NAME` or `=!NAME`, upper-cased
    Function(String),
    LeftParen,
    RightParen,
    Semicolon,
    Comma,
    /// One of `+ - * / %`
    Operator(char),
    /// Any other run of characters
    Text(String),
}

/// Discriminant of a [`Token`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Field,
    String,
    Number,
    Date,
    Function,
    LeftParen,
    RightParen,
    Semicolon,
    Comma,
    Operator,
    Text,
}

impl Token {
    pub fn kind(&self) -> TokenKind {
        match self {
            Token::Field(_) => TokenKind::Field,
            Token::String(_) => TokenKind::String,
            Token::Number(_) => TokenKind::Number,
            Token::Date(_) => TokenKind::Date,
            Token::Function(_) => TokenKind::Function,
            Token::LeftParen => TokenKind::LeftParen,
            Token::RightParen => TokenKind::RightParen,
            Token::Semicolon => TokenKind::Semicolon,
            Token::Comma => TokenKind::Comma,
            Token::Operator(_) => TokenKind::Operator,
            Token::Text(_) => TokenKind::Text,
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TokenKind::Field => "FIELD",
            TokenKind::String => "STRING",
            TokenKind::Number => "NUMBER",
            TokenKind::Date => "DATE",
            TokenKind::Function => "FUNCTION",
            TokenKind::LeftParen => "LPAREN",
            TokenKind::RightParen => "RPAREN",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::Comma => "COMMA",
            TokenKind::Operator => "OPERATOR",
            TokenKind::Text => "TEXT",
        };
        f.write_str(name)
    }
}

/// Split formula source into tokens.
///
/// # Example
/// ```rust
/// use ppformula::lexer::{tokenize, Token};
///
/// let tokens = tokenize("=UPPERCASE([[Name]])");
/// assert_eq!(tokens[0], Token::Function("UPPERCASE".into()));
/// assert_eq!(tokens[2], Token::Field("Name".into()));
/// ```
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();
    while let Some(token) = lexer.next_token() {
        tokens.push(token);
    }
    tracing::trace!(count = tokens.len(), "tokenized formula");
    tokens
}

/// Names of all fields referenced in `source`, sorted and de-duplicated.
///
/// References inside `//` comments are not reported since the lexer drops them.
pub fn field_names(source: &str) -> Vec<String> {
    let mut names: Vec<String> = tokenize(source)
        .into_iter()
        .filter_map(|token| match token {
            Token::Field(name) => Some(name),
            _ => None,
        })
        .collect();
    names.sort();
    names.dedup();
    names
}

struct Lexer<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self { input, pos: 0 }
    }

    fn next_token(&mut self) -> Option<Token> {
        loop {
            self.skip_whitespace();
            if self.peek_char() == Some('/') && self.peek_char_at(1) == Some('/') {
                self.skip_comment();
                continue;
            }
            break;
        }

        let c = self.peek_char()?;

        if c == '[' && self.peek_char_at(1) == Some('[') {
            return Some(self.scan_field());
        }

        if c == '"' {
            return Some(self.scan_double_quoted());
        }

        if c == '\'' {
            return Some(self.scan_single_quoted());
        }

        if c.is_ascii_digit()
            || (c == '-' && self.peek_char_at(1).map_or(false, |c| c.is_ascii_digit()))
        {
            return Some(self.scan_number());
        }

        if c == '=' {
            return Some(self.scan_function());
        }

        match c {
            '(' => {
                self.advance();
                return Some(Token::LeftParen);
            }
            ')' => {
                self.advance();
                return Some(Token::RightParen);
            }
            ';' => {
                self.advance();
                return Some(Token::Semicolon);
            }
            ',' => {
                self.advance();
                return Some(Token::Comma);
            }
            '+' | '-' | '*' | '/' | '%' => {
                self.advance();
                return Some(Token::Operator(c));
            }
            // A single bracket that does not open a field reference
            '[' | ']' => {
                self.advance();
                return Some(Token::Text(c.to_string()));
            }
            _ => {}
        }

        Some(self.scan_text())
    }

    fn scan_field(&mut self) -> Token {
        self.advance();
        self.advance();

        let start = self.pos;
        while !self.is_at_end()
            && !(self.peek_char() == Some(']') && self.peek_char_at(1) == Some(']'))
        {
            self.advance();
        }
        let name = self.input[start..self.pos].trim().to_string();

        // Skip closing ]]
        self.advance();
        self.advance();

        Token::Field(name)
    }

    fn scan_double_quoted(&mut self) -> Token {
        self.advance();

        let mut s = String::new();
        while let Some(c) = self.peek_char() {
            if c == '"' {
                break;
            }
            if c == '\\' {
                if let Some(escaped) = self.peek_char_at(1) {
                    s.push(escaped);
                    self.advance();
                    self.advance();
                    continue;
                }
            }
            s.push(c);
            self.advance();
        }

        self.advance();
        Token::String(s)
    }

    fn scan_single_quoted(&mut self) -> Token {
        self.advance();

        let start = self.pos;
        while self.peek_char().map_or(false, |c| c != '\'') {
            self.advance();
        }
        let s = self.input[start..self.pos].to_string();

        self.advance();
        Token::String(s)
    }

    fn scan_number(&mut self) -> Token {
        let start = self.pos;
        if self.peek_char() == Some('-') {
            self.advance();
        }
        while self
            .peek_char()
            .map_or(false, |c| c.is_ascii_digit() || c == '.')
        {
            self.advance();
        }

        let text = &self.input[start..self.pos];
        Token::Number(parse_float_prefix(text).unwrap_or(f64::NAN))
    }

    fn scan_function(&mut self) -> Token {
        self.advance();

        let mut name = String::new();
        if self.peek_char() == Some('!') {
            name.push('!');
            self.advance();
        }
        while let Some(c) = self.peek_char() {
            if !(c.is_ascii_alphanumeric() || c == '_') {
                break;
            }
            name.push(c.to_ascii_uppercase());
            self.advance();
        }

        Token::Function(name)
    }

    fn scan_text(&mut self) -> Token {
        let start = self.pos;
        while self.peek_char().map_or(false, |c| !is_text_delimiter(c)) {
            self.advance();
        }
        let text = &self.input[start..self.pos];

        if regex_is_match!(r"^[0-9]{4}-[0-9]{2}-[0-9]{2}", text) {
            Token::Date(text.to_string())
        } else if regex_is_match!(r"^(?:[0-9]+|[0-9]*\.[0-9]+)$", text) {
            Token::Number(text.parse().unwrap_or(f64::NAN))
        } else {
            Token::Text(text.to_string())
        }
    }

    fn skip_comment(&mut self) {
        while self.peek_char().map_or(false, |c| c != '\n') {
            self.advance();
        }
    }

    // === Helper methods ===

    fn peek_char(&self) -> Option<char> {
        self.input[self.pos..].chars().next()
    }

    fn peek_char_at(&self, offset: usize) -> Option<char> {
        self.input[self.pos..].chars().nth(offset)
    }

    fn advance(&mut self) {
        if let Some(c) = self.peek_char() {
            self.pos += c.len_utf8();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek_char().map_or(false, |c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn is_at_end(&self) -> bool {
        self.pos >= self.input.len()
    }
}

fn is_text_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')' | ';' | ',' | '=')
}
