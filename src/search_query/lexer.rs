use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

/// `-?#name` where name is made of Unicode letters, digits or underscores.
static TAG_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(-?)#(\w+)$").expect("tag pattern is valid"));

/// Names accepted before a `:` to form a qualifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Qualifier {
    Url,
}

impl Qualifier {
    pub const ALL: [Qualifier; 1] = [Qualifier::Url];

    pub fn as_str(&self) -> &'static str {
        match self {
            Qualifier::Url => "url",
        }
    }

    pub fn from_name(name: &str) -> Option<Qualifier> {
        Self::ALL.into_iter().find(|q| q.as_str() == name)
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "value")]
pub enum TokenKind {
    Text(String),
    Qualifier(Qualifier),
    Tag(String),
    Not,
    EndOfQuery,
}

impl TokenKind {
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::Text(_) => "Text",
            TokenKind::Qualifier(_) => "Qualifier",
            TokenKind::Tag(_) => "Tag",
            TokenKind::Not => "Not",
            TokenKind::EndOfQuery => "EndOfQuery",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Token {
    #[serde(flatten)]
    pub kind: TokenKind,
    pub position: usize,
}

impl Token {
    pub fn new(kind: TokenKind, position: usize) -> Self {
        Self { kind, position }
    }
}

/// Word being accumulated by the scanner.
#[derive(Default)]
struct Buffer {
    text: String,
    start: Option<usize>,
    /// Set once a quoted or escaped character lands in the buffer; such a
    /// word is never read as a tag or a qualifier.
    literal: bool,
}

impl Buffer {
    fn push(&mut self, c: char, position: usize, literal: bool) {
        self.start.get_or_insert(position);
        self.text.push(c);
        self.literal |= literal;
    }

    fn take(&mut self) -> Buffer {
        std::mem::take(self)
    }
}

/// Splits a search string into tokens. Never fails: unterminated quotes and
/// stray escapes are absorbed into the surrounding text.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut buffer = Buffer::default();
    let mut quote_open: Option<usize> = None;
    let mut escaped = false;
    let mut len = 0;

    for (i, c) in input.chars().enumerate() {
        len = i + 1;

        if escaped {
            buffer.push(c, i, true);
            escaped = false;
            continue;
        }

        match c {
            '\\' => escaped = true,
            '"' => {
                quote_open = match quote_open {
                    Some(_) => None,
                    None => {
                        buffer.start.get_or_insert(i);
                        Some(i)
                    }
                };
            }
            _ if quote_open.is_some() => buffer.push(c, i, true),
            ':' if !buffer.literal => match Qualifier::from_name(&buffer.text) {
                Some(qualifier) => {
                    let word = buffer.take();
                    let position = word.start.unwrap_or(i);
                    tokens.push(Token::new(TokenKind::Qualifier(qualifier), position));
                }
                None => buffer.push(c, i, false),
            },
            c if c.is_whitespace() => flush(&mut tokens, buffer.take()),
            c => buffer.push(c, i, false),
        }
    }

    if escaped {
        log::debug!("dropping dangling escape at end of query");
    }

    // Trailing word, including one left inside an unterminated quote.
    flush(&mut tokens, buffer.take());

    tokens.push(Token::new(TokenKind::EndOfQuery, len + 1));
    tokens
}

fn flush(tokens: &mut Vec<Token>, word: Buffer) {
    if word.text.is_empty() {
        return;
    }

    if !word.literal {
        if let Some(caps) = TAG_RE.captures(&word.text) {
            let mut position = word.start.unwrap_or_default();
            if !caps[1].is_empty() {
                tokens.push(Token::new(TokenKind::Not, position));
                position += 1;
            }
            tokens.push(Token::new(TokenKind::Tag(caps[2].to_string()), position));
            return;
        }
    }

    let position = word.start.unwrap_or_default();
    tokens.push(Token::new(TokenKind::Text(word.text), position));
}
