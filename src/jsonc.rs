//! Span-preserving JSONC parser.
//!
//! The tree records byte spans into the original text instead of owning a
//! normalized copy, so edits can be spliced into the source and everything
//! else (comments, trailing commas, whitespace) survives untouched.

use std::ops::Range;

/// A parse failure with the byte offset where it happened.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsoncError {
    pub offset: usize,
    pub message: String,
}

impl std::fmt::Display for JsoncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at byte {}", self.message, self.offset)
    }
}

impl std::error::Error for JsoncError {}

/// A value node with its span in the source.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonNode {
    pub kind: JsonKind,
    pub span: Range<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum JsonKind {
    Object(JsonObject),
    Array(JsonArray),
    /// Decoded string content.
    String(String),
    /// Number as written.
    Number(String),
    Bool(bool),
    Null,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonObject {
    pub members: Vec<JsonMember>,
    pub trailing_comma: bool,
    /// Offset of the closing `}`.
    pub close: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonMember {
    pub key: String,
    pub key_span: Range<usize>,
    pub value: JsonNode,
}

impl JsonMember {
    /// Span from the key to the end of the value.
    pub fn span(&self) -> Range<usize> {
        self.key_span.start..self.value.span.end
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct JsonArray {
    pub elements: Vec<JsonNode>,
    pub trailing_comma: bool,
    /// Offset of the closing `]`.
    pub close: usize,
}

impl JsonNode {
    /// Returns the object payload, if this is an object.
    pub fn as_object(&self) -> Option<&JsonObject> {
        match &self.kind {
            JsonKind::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Returns the array payload, if this is an array.
    pub fn as_array(&self) -> Option<&JsonArray> {
        match &self.kind {
            JsonKind::Array(arr) => Some(arr),
            _ => None,
        }
    }

    /// Follows a key path through nested objects.
    pub fn pointer(&self, path: &[String]) -> Option<&JsonNode> {
        let mut node = self;
        for key in path {
            node = node.as_object()?.get(key)?;
        }
        Some(node)
    }

    /// Converts the node to a plain JSON value, dropping layout.
    pub fn to_value(&self) -> serde_json::Value {
        use serde_json::Value;
        match &self.kind {
            JsonKind::Object(obj) => Value::Object(
                obj.members
                    .iter()
                    .map(|m| (m.key.clone(), m.value.to_value()))
                    .collect(),
            ),
            JsonKind::Array(arr) => Value::Array(arr.elements.iter().map(|e| e.to_value()).collect()),
            JsonKind::String(s) => Value::String(s.clone()),
            JsonKind::Number(n) => serde_json::from_str(n).unwrap_or(Value::Null),
            JsonKind::Bool(b) => Value::Bool(*b),
            JsonKind::Null => Value::Null,
        }
    }
}

impl JsonObject {
    /// Returns the last member with the given key (the one a JSON reader keeps).
    pub fn member(&self, key: &str) -> Option<&JsonMember> {
        self.members.iter().rev().find(|m| m.key == key)
    }

    /// Returns the value of the last member with the given key.
    pub fn get(&self, key: &str) -> Option<&JsonNode> {
        self.member(key).map(|m| &m.value)
    }
}

/// Parses a JSON or JSONC document.
pub fn parse(source: &str) -> Result<JsonNode, JsoncError> {
    let mut parser = JsoncParser {
        src: source.as_bytes(),
        text: source,
        pos: 0,
    };
    if source.starts_with('\u{feff}') {
        parser.pos = '\u{feff}'.len_utf8();
    }
    parser.skip_trivia()?;
    let root = parser.value()?;
    parser.skip_trivia()?;
    if parser.pos < parser.src.len() {
        return Err(parser.error("unexpected content after document"));
    }
    Ok(root)
}

struct JsoncParser<'a> {
    src: &'a [u8],
    text: &'a str,
    pos: usize,
}

impl<'a> JsoncParser<'a> {
    fn error(&self, message: &str) -> JsoncError {
        JsoncError {
            offset: self.pos,
            message: message.to_string(),
        }
    }

    fn peek(&self) -> Option<u8> {
        self.src.get(self.pos).copied()
    }

    fn skip_trivia(&mut self) -> Result<(), JsoncError> {
        while let Some(b) = self.peek() {
            match b {
                b' ' | b'\t' | b'\n' | b'\r' => self.pos += 1,
                b'/' if self.src.get(self.pos + 1) == Some(&b'/') => {
                    while let Some(c) = self.peek() {
                        if c == b'\n' {
                            break;
                        }
                        self.pos += 1;
                    }
                }
                b'/' if self.src.get(self.pos + 1) == Some(&b'*') => {
                    let start = self.pos;
                    self.pos += 2;
                    loop {
                        match self.peek() {
                            Some(b'*') if self.src.get(self.pos + 1) == Some(&b'/') => {
                                self.pos += 2;
                                break;
                            }
                            Some(_) => self.pos += 1,
                            None => {
                                self.pos = start;
                                return Err(self.error("unterminated block comment"));
                            }
                        }
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn value(&mut self) -> Result<JsonNode, JsoncError> {
        let start = self.pos;
        let kind = match self.peek() {
            Some(b'{') => JsonKind::Object(self.object()?),
            Some(b'[') => JsonKind::Array(self.array()?),
            Some(b'"') => JsonKind::String(self.string()?),
            Some(b'-' | b'0'..=b'9') => JsonKind::Number(self.number()?),
            Some(b't') => self.keyword("true", JsonKind::Bool(true))?,
            Some(b'f') => self.keyword("false", JsonKind::Bool(false))?,
            Some(b'n') => self.keyword("null", JsonKind::Null)?,
            Some(_) => return Err(self.error("expected a value")),
            None => return Err(self.error("unexpected end of input")),
        };
        Ok(JsonNode {
            kind,
            span: start..self.pos,
        })
    }

    fn keyword(&mut self, word: &str, kind: JsonKind) -> Result<JsonKind, JsoncError> {
        if self.src[self.pos..].starts_with(word.as_bytes()) {
            self.pos += word.len();
            Ok(kind)
        } else {
            Err(self.error("invalid literal"))
        }
    }

    fn number(&mut self) -> Result<String, JsoncError> {
        let start = self.pos;
        while let Some(b) = self.peek() {
            if b.is_ascii_digit() || matches!(b, b'-' | b'+' | b'.' | b'e' | b'E') {
                self.pos += 1;
            } else {
                break;
            }
        }
        let raw = &self.text[start..self.pos];
        if raw.parse::<f64>().is_err() {
            self.pos = start;
            return Err(self.error("invalid number"));
        }
        Ok(raw.to_string())
    }

    fn string(&mut self) -> Result<String, JsoncError> {
        let start = self.pos;
        self.pos += 1;
        let mut out = String::new();
        loop {
            let Some(b) = self.peek() else {
                self.pos = start;
                return Err(self.error("unterminated string"));
            };
            match b {
                b'"' => {
                    self.pos += 1;
                    return Ok(out);
                }
                b'\\' => {
                    self.pos += 1;
                    let esc = self.peek().ok_or_else(|| self.error("unterminated escape"))?;
                    self.pos += 1;
                    match esc {
                        b'"' => out.push('"'),
                        b'\\' => out.push('\\'),
                        b'/' => out.push('/'),
                        b'b' => out.push('\u{8}'),
                        b'f' => out.push('\u{c}'),
                        b'n' => out.push('\n'),
                        b'r' => out.push('\r'),
                        b't' => out.push('\t'),
                        b'u' => out.push(self.unicode_escape()?),
                        _ => return Err(self.error("invalid escape")),
                    }
                }
                b'\n' => return Err(self.error("newline in string")),
                _ => {
                    // Copy one UTF-8 scalar.
                    let ch = self.text[self.pos..]
                        .chars()
                        .next()
                        .ok_or_else(|| self.error("invalid UTF-8"))?;
                    out.push(ch);
                    self.pos += ch.len_utf8();
                }
            }
        }
    }

    fn hex4(&mut self) -> Result<u32, JsoncError> {
        let digits = self
            .text
            .get(self.pos..self.pos + 4)
            .ok_or_else(|| self.error("short unicode escape"))?;
        let code = u32::from_str_radix(digits, 16).map_err(|_| self.error("invalid unicode escape"))?;
        self.pos += 4;
        Ok(code)
    }

    fn unicode_escape(&mut self) -> Result<char, JsoncError> {
        let first = self.hex4()?;
        if (0xD800..0xDC00).contains(&first) && self.src[self.pos..].starts_with(b"\\u") {
            self.pos += 2;
            let second = self.hex4()?;
            let code = 0x10000 + ((first - 0xD800) << 10) + (second.wrapping_sub(0xDC00) & 0x3FF);
            return char::from_u32(code).ok_or_else(|| self.error("invalid surrogate pair"));
        }
        Ok(char::from_u32(first).unwrap_or('\u{fffd}'))
    }

    fn object(&mut self) -> Result<JsonObject, JsoncError> {
        self.pos += 1;
        let mut members = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(b'}') => {
                    let close = self.pos;
                    self.pos += 1;
                    return Ok(JsonObject {
                        members,
                        trailing_comma,
                        close,
                    });
                }
                Some(b'"') => {
                    let key_start = self.pos;
                    let key = self.string()?;
                    let key_span = key_start..self.pos;
                    self.skip_trivia()?;
                    if self.peek() != Some(b':') {
                        return Err(self.error("expected ':'"));
                    }
                    self.pos += 1;
                    self.skip_trivia()?;
                    let value = self.value()?;
                    members.push(JsonMember { key, key_span, value });
                    self.skip_trivia()?;
                    match self.peek() {
                        Some(b',') => {
                            self.pos += 1;
                            trailing_comma = true;
                        }
                        Some(b'}') => trailing_comma = false,
                        _ => return Err(self.error("expected ',' or '}'")),
                    }
                }
                Some(_) => return Err(self.error("expected a string key")),
                None => return Err(self.error("unterminated object")),
            }
        }
    }

    fn array(&mut self) -> Result<JsonArray, JsoncError> {
        self.pos += 1;
        let mut elements = Vec::new();
        let mut trailing_comma = false;
        loop {
            self.skip_trivia()?;
            match self.peek() {
                Some(b']') => {
                    let close = self.pos;
                    self.pos += 1;
                    return Ok(JsonArray {
                        elements,
                        trailing_comma,
                        close,
                    });
                }
                Some(_) => {
                    elements.push(self.value()?);
                    self.skip_trivia()?;
                    match self.peek() {
                        Some(b',') => {
                            self.pos += 1;
                            trailing_comma = true;
                        }
                        Some(b']') => trailing_comma = false,
                        _ => return Err(self.error("expected ',' or ']'")),
                    }
                }
                None => return Err(self.error("unterminated array")),
            }
        }
    }
}
