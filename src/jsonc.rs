//! Position-aware JSON-with-comments parsing
//!
//! Parses JSONC text (JSON plus `//` and `/* */` comments and trailing commas)
//! into a [`SyntaxNode`] tree where every node knows its line/column span in
//! the original text. The tree can be evaluated into a plain
//! [`serde_json::Value`] with [`evaluate`].

use serde_json::{Map, Number, Value};
use thiserror::Error;

/// Error type for JSONC parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} (line {line}, column {column})")]
pub struct ParseError {
    pub message: String,
    pub line: usize,
    pub column: usize,
}

/// A location in the source text.
///
/// `line` and `column` are 1-indexed; `column` counts characters, not bytes.
/// `offset` is the byte offset into the text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

/// Source range of a node. `end` points just past the last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: Position,
    pub end: Position,
}

/// A node of the parsed syntax tree.
#[derive(Debug, Clone, PartialEq)]
pub struct SyntaxNode {
    pub span: Span,
    pub kind: NodeKind,
}

/// Node variants.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    Object(Vec<Member>),
    Array(Vec<SyntaxNode>),
    String(String),
    Number(Number),
    Boolean(bool),
    Null,
}

/// An object member: `"key": value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Member {
    pub key: String,
    pub key_span: Span,
    pub value: SyntaxNode,
}

impl SyntaxNode {
    /// Find the value of the member named `key` (last one wins on duplicates).
    pub fn member(&self, key: &str) -> Option<&SyntaxNode> {
        match &self.kind {
            NodeKind::Object(members) => {
                members.iter().rev().find(|m| m.key == key).map(|m| &m.value)
            }
            _ => None,
        }
    }

    /// Get the array element at `index`.
    pub fn element(&self, index: usize) -> Option<&SyntaxNode> {
        match &self.kind {
            NodeKind::Array(elements) => elements.get(index),
            _ => None,
        }
    }

    /// Short name of the node kind, used in messages.
    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            NodeKind::Object(_) => "object",
            NodeKind::Array(_) => "array",
            NodeKind::String(_) => "string",
            NodeKind::Number(_) => "number",
            NodeKind::Boolean(_) => "boolean",
            NodeKind::Null => "null",
        }
    }
}

/// Parse JSONC text into a syntax tree.
///
/// The whole input must contain exactly one value, optionally surrounded by
/// whitespace and comments.
///
/// # Example
///
/// ```
/// use vivliostyle_config::jsonc::{parse, NodeKind};
///
/// let tree = parse("{\n  // title\n  \"title\": \"Book\",\n}").unwrap();
/// let title = tree.member("title").unwrap();
/// assert_eq!(title.kind, NodeKind::String("Book".to_string()));
/// assert_eq!(title.span.start.line, 3);
/// ```
pub fn parse(text: &str) -> Result<SyntaxNode, ParseError> {
    let mut parser = Parser::new(text);
    parser.skip_trivia()?;
    let node = parser.parse_value()?;
    parser.skip_trivia()?;
    if let Some(ch) = parser.peek() {
        return Err(parser.error(format!("Unexpected character '{}' after value", ch)));
    }
    Ok(node)
}

/// Convert a syntax tree into a plain JSON value.
///
/// Duplicate object keys resolve to the last occurrence, as `JSON.parse` does.
pub fn evaluate(node: &SyntaxNode) -> Value {
    match &node.kind {
        NodeKind::Object(members) => {
            let mut map = Map::new();
            for member in members {
                map.insert(member.key.clone(), evaluate(&member.value));
            }
            Value::Object(map)
        }
        NodeKind::Array(elements) => Value::Array(elements.iter().map(evaluate).collect()),
        NodeKind::String(s) => Value::String(s.clone()),
        NodeKind::Number(n) => Value::Number(n.clone()),
        NodeKind::Boolean(b) => Value::Bool(*b),
        NodeKind::Null => Value::Null,
    }
}

/// Parse JSONC text straight into a value.
pub fn parse_value(text: &str) -> Result<Value, ParseError> {
    parse(text).map(|node| evaluate(&node))
}

/// Deepest nesting of objects and arrays accepted, as in `serde_json`.
pub const MAX_DEPTH: usize = 128;

struct Parser<'a> {
    text: &'a str,
    pos: Position,
    depth: usize,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str) -> Self {
        Self { text, pos: Position { line: 1, column: 1, offset: 0 }, depth: 0 }
    }

    fn peek(&self) -> Option<char> {
        self.text[self.pos.offset..].chars().next()
    }

    fn peek_second(&self) -> Option<char> {
        self.text[self.pos.offset..].chars().nth(1)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek()?;
        self.pos.offset += ch.len_utf8();
        if ch == '\n' {
            self.pos.line += 1;
            self.pos.column = 1;
        } else {
            self.pos.column += 1;
        }
        Some(ch)
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError { message: message.into(), line: self.pos.line, column: self.pos.column }
    }

    fn error_at(&self, at: Position, message: impl Into<String>) -> ParseError {
        ParseError { message: message.into(), line: at.line, column: at.column }
    }

    fn unexpected(&self) -> ParseError {
        match self.peek() {
            Some(ch) => self.error(format!("Unexpected character '{}'", ch)),
            None => self.error("Unexpected end of input"),
        }
    }

    /// Skip whitespace and comments.
    fn skip_trivia(&mut self) -> Result<(), ParseError> {
        loop {
            match (self.peek(), self.peek_second()) {
                (Some(' ' | '\t' | '\n' | '\r' | '\u{feff}'), _) => {
                    self.bump();
                }
                (Some('/'), Some('/')) => {
                    while let Some(ch) = self.peek() {
                        if ch == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                (Some('/'), Some('*')) => {
                    let start = self.pos;
                    self.bump();
                    self.bump();
                    loop {
                        match self.bump() {
                            Some('*') if self.peek() == Some('/') => {
                                self.bump();
                                break;
                            }
                            Some(_) => {}
                            None => return Err(self.error_at(start, "Unterminated block comment")),
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn parse_value(&mut self) -> Result<SyntaxNode, ParseError> {
        match self.peek() {
            Some(open @ ('{' | '[')) => {
                if self.depth >= MAX_DEPTH {
                    return Err(self.error("Recursion limit exceeded"));
                }
                self.depth += 1;
                let node = if open == '{' { self.parse_object() } else { self.parse_array() };
                self.depth -= 1;
                node
            }
            Some('"') => {
                let start = self.pos;
                let s = self.parse_string()?;
                Ok(self.node(start, NodeKind::String(s)))
            }
            Some('-' | '0'..='9') => self.parse_number(),
            Some('t') => self.parse_keyword("true", NodeKind::Boolean(true)),
            Some('f') => self.parse_keyword("false", NodeKind::Boolean(false)),
            Some('n') => self.parse_keyword("null", NodeKind::Null),
            _ => Err(self.unexpected()),
        }
    }

    fn node(&self, start: Position, kind: NodeKind) -> SyntaxNode {
        SyntaxNode { span: Span { start, end: self.pos }, kind }
    }

    fn parse_object(&mut self) -> Result<SyntaxNode, ParseError> {
        let start = self.pos;
        self.bump();
        let mut members = Vec::new();
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some('}') => {
                    self.bump();
                    return Ok(self.node(start, NodeKind::Object(members)));
                }
                Some('"') => {}
                _ => return Err(self.unexpected()),
            }

            let key_start = self.pos;
            let key = self.parse_string()?;
            let key_span = Span { start: key_start, end: self.pos };

            self.skip_trivia()?;
            if self.peek() != Some(':') {
                return Err(self.error("Expected ':' after object key"));
            }
            self.bump();
            self.skip_trivia()?;
            let value = self.parse_value()?;
            members.push(Member { key, key_span, value });

            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some('}') => {}
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_array(&mut self) -> Result<SyntaxNode, ParseError> {
        let start = self.pos;
        self.bump();
        let mut elements = Vec::new();
        loop {
            self.skip_trivia()?;
            if self.peek() == Some(']') {
                self.bump();
                return Ok(self.node(start, NodeKind::Array(elements)));
            }

            elements.push(self.parse_value()?);

            self.skip_trivia()?;
            match self.peek() {
                Some(',') => {
                    self.bump();
                }
                Some(']') => {}
                _ => return Err(self.unexpected()),
            }
        }
    }

    fn parse_keyword(&mut self, word: &str, kind: NodeKind) -> Result<SyntaxNode, ParseError> {
        let start = self.pos;
        if !self.text[self.pos.offset..].starts_with(word) {
            return Err(self.unexpected());
        }
        for _ in word.chars() {
            self.bump();
        }
        Ok(self.node(start, kind))
    }

    fn parse_number(&mut self) -> Result<SyntaxNode, ParseError> {
        let start = self.pos;
        if self.peek() == Some('-') {
            self.bump();
        }
        match self.peek() {
            Some('0') => {
                self.bump();
            }
            Some('1'..='9') => self.bump_digits(),
            _ => return Err(self.unexpected()),
        }
        if self.peek() == Some('.') {
            self.bump();
            if !matches!(self.peek(), Some('0'..='9')) {
                return Err(self.unexpected());
            }
            self.bump_digits();
        }
        if matches!(self.peek(), Some('e' | 'E')) {
            self.bump();
            if matches!(self.peek(), Some('+' | '-')) {
                self.bump();
            }
            if !matches!(self.peek(), Some('0'..='9')) {
                return Err(self.unexpected());
            }
            self.bump_digits();
        }

        let literal = &self.text[start.offset..self.pos.offset];
        let number: Number = serde_json::from_str(literal)
            .map_err(|e| self.error_at(start, format!("Invalid number '{}': {}", literal, e)))?;
        Ok(self.node(start, NodeKind::Number(number)))
    }

    fn bump_digits(&mut self) {
        while matches!(self.peek(), Some('0'..='9')) {
            self.bump();
        }
    }

    fn parse_string(&mut self) -> Result<String, ParseError> {
        let start = self.pos;
        self.bump();
        let mut out = String::new();
        loop {
            let ch = match self.bump() {
                Some(ch) => ch,
                None => return Err(self.error_at(start, "Unterminated string")),
            };
            match ch {
                '"' => return Ok(out),
                '\\' => {
                    let escape_pos = self.pos;
                    match self.bump() {
                        Some('"') => out.push('"'),
                        Some('\\') => out.push('\\'),
                        Some('/') => out.push('/'),
                        Some('b') => out.push('\u{8}'),
                        Some('f') => out.push('\u{c}'),
                        Some('n') => out.push('\n'),
                        Some('r') => out.push('\r'),
                        Some('t') => out.push('\t'),
                        Some('u') => out.push(self.parse_unicode_escape()?),
                        _ => return Err(self.error_at(escape_pos, "Invalid escape sequence")),
                    }
                }
                c if (c as u32) < 0x20 => {
                    return Err(self.error("Control character in string literal"));
                }
                c => out.push(c),
            }
        }
    }

    fn parse_hex4(&mut self) -> Result<u32, ParseError> {
        let mut code = 0u32;
        for _ in 0..4 {
            let digit = self
                .peek()
                .and_then(|c| c.to_digit(16))
                .ok_or_else(|| self.error("Invalid unicode escape"))?;
            self.bump();
            code = code * 16 + digit;
        }
        Ok(code)
    }

    fn parse_unicode_escape(&mut self) -> Result<char, ParseError> {
        let high = self.parse_hex4()?;
        if (0xD800..0xDC00).contains(&high) {
            // surrogate pair
            if self.peek() == Some('\\') && self.peek_second() == Some('u') {
                self.bump();
                self.bump();
                let low = self.parse_hex4()?;
                if (0xDC00..0xE000).contains(&low) {
                    let code = 0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00);
                    return char::from_u32(code).ok_or_else(|| self.error("Invalid unicode escape"));
                }
            }
            return Ok('\u{fffd}');
        }
        Ok(char::from_u32(high).unwrap_or('\u{fffd}'))
    }
}
