//! Lexer for GraphQL executable and type system documents.

use crate::token::{Token, TokenKind};
use memchr::{memchr, memchr3};
use treeql_core::Span;

/// A lexer for GraphQL source code.
pub struct Lexer<'a> {
    source: &'a str,
    bytes: &'a [u8],
    pos: u32,
}

impl<'a> Lexer<'a> {
    /// Creates a new lexer.
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            bytes: source.as_bytes(),
            pos: 0,
        }
    }

    /// Returns the current position.
    #[inline]
    pub fn pos(&self) -> u32 {
        self.pos
    }

    #[inline]
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos as usize).copied()
    }

    #[inline]
    fn peek_at(&self, offset: u32) -> Option<u8> {
        self.bytes.get((self.pos + offset) as usize).copied()
    }

    #[inline]
    fn advance(&mut self) {
        self.pos += 1;
    }

    #[inline]
    fn advance_by(&mut self, n: u32) {
        self.pos += n;
    }

    #[inline]
    fn rest(&self) -> &'a [u8] {
        &self.bytes[self.pos as usize..]
    }

    /// Scans the next token.
    pub fn next_token(&mut self) -> Token {
        self.skip_trivia();

        let start = self.pos;

        let Some(c) = self.peek() else {
            return Token::new(TokenKind::Eof, Span::empty(start));
        };

        let kind = match c {
            b'{' => self.single(TokenKind::LBrace),
            b'}' => self.single(TokenKind::RBrace),
            b'(' => self.single(TokenKind::LParen),
            b')' => self.single(TokenKind::RParen),
            b'[' => self.single(TokenKind::LBracket),
            b']' => self.single(TokenKind::RBracket),
            b':' => self.single(TokenKind::Colon),
            b'=' => self.single(TokenKind::Eq),
            b'|' => self.single(TokenKind::Pipe),
            b'&' => self.single(TokenKind::Amp),
            b'@' => self.single(TokenKind::At),
            b'!' => self.single(TokenKind::Bang),
            b'$' => self.single(TokenKind::Dollar),
            b'.' => {
                if self.peek_at(1) == Some(b'.') && self.peek_at(2) == Some(b'.') {
                    self.advance_by(3);
                    TokenKind::Spread
                } else {
                    self.advance();
                    TokenKind::Error
                }
            }

            b'"' => self.scan_string(),

            b'-' | b'0'..=b'9' => self.scan_number(),

            b'a'..=b'z' | b'A'..=b'Z' | b'_' => self.scan_name(),

            _ => {
                // Skip the whole UTF-8 sequence so spans stay on char boundaries.
                let width = self.source[self.pos as usize..]
                    .chars()
                    .next()
                    .map_or(1, char::len_utf8);
                self.advance_by(u32::try_from(width).unwrap_or(1));
                TokenKind::Error
            }
        };

        Token::new(kind, Span::new(start, self.pos))
    }

    #[inline]
    fn single(&mut self, kind: TokenKind) -> TokenKind {
        self.advance();
        kind
    }

    /// Skips whitespace, commas, comments and the byte order mark.
    fn skip_trivia(&mut self) {
        loop {
            match self.peek() {
                Some(b' ' | b'\t' | b'\r' | b'\n' | b',') => {
                    self.advance();
                }
                Some(b'#') => match memchr(b'\n', self.rest()) {
                    Some(offset) => self.advance_by(offset as u32),
                    None => self.pos = self.bytes.len() as u32,
                },
                Some(0xEF) if self.peek_at(1) == Some(0xBB) && self.peek_at(2) == Some(0xBF) => {
                    self.advance_by(3);
                }
                _ => break,
            }
        }
    }

    fn scan_name(&mut self) -> TokenKind {
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == b'_' {
                self.advance();
            } else {
                break;
            }
        }
        TokenKind::Name
    }

    fn scan_digits(&mut self) -> u32 {
        let start = self.pos;
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.advance();
        }
        self.pos - start
    }

    fn scan_number(&mut self) -> TokenKind {
        let mut is_float = false;

        if self.peek() == Some(b'-') {
            self.advance();
        }

        // Integer part; leading zeros are not allowed.
        match self.peek() {
            Some(b'0') => {
                self.advance();
                if self.peek().is_some_and(|c| c.is_ascii_digit()) {
                    self.scan_digits();
                    return TokenKind::Error;
                }
            }
            Some(b'1'..=b'9') => {
                self.scan_digits();
            }
            _ => return TokenKind::Error,
        }

        if self.peek() == Some(b'.') {
            is_float = true;
            self.advance();
            if self.scan_digits() == 0 {
                return TokenKind::Error;
            }
        }

        if let Some(b'e' | b'E') = self.peek() {
            is_float = true;
            self.advance();
            if let Some(b'+' | b'-') = self.peek() {
                self.advance();
            }
            if self.scan_digits() == 0 {
                return TokenKind::Error;
            }
        }

        // A number must not run straight into a name, as in `123abc`.
        if self
            .peek()
            .is_some_and(|c| c == b'.' || c == b'_' || c.is_ascii_alphabetic())
        {
            self.scan_name();
            return TokenKind::Error;
        }

        if is_float {
            TokenKind::FloatLiteral
        } else {
            TokenKind::IntLiteral
        }
    }

    fn scan_string(&mut self) -> TokenKind {
        self.advance(); // Opening quote

        if self.peek() == Some(b'"') && self.peek_at(1) == Some(b'"') {
            self.advance_by(2);
            return self.scan_block_string();
        }

        loop {
            match memchr3(b'"', b'\\', b'\n', self.rest()) {
                None => {
                    self.pos = self.bytes.len() as u32;
                    return TokenKind::Error;
                }
                Some(offset) => {
                    self.advance_by(offset as u32);
                    match self.peek() {
                        Some(b'"') => {
                            self.advance();
                            return TokenKind::StringLiteral;
                        }
                        Some(b'\\') => {
                            self.advance();
                            // The escaped character, if any; a newline still ends the string.
                            match self.source[self.pos as usize..].chars().next() {
                                None => return TokenKind::Error,
                                Some('\n') => {}
                                Some(c) => self.advance_by(c.len_utf8() as u32),
                            }
                        }
                        _ => return TokenKind::Error,
                    }
                }
            }
        }
    }

    fn scan_block_string(&mut self) -> TokenKind {
        loop {
            match memchr(b'"', self.rest()) {
                None => {
                    self.pos = self.bytes.len() as u32;
                    return TokenKind::Error;
                }
                Some(offset) => {
                    self.advance_by(offset as u32);
                    if self.peek_at(1) == Some(b'"') && self.peek_at(2) == Some(b'"') {
                        let escaped = self.pos > 0 && self.bytes[self.pos as usize - 1] == b'\\';
                        self.advance_by(3);
                        if !escaped {
                            return TokenKind::BlockStringLiteral;
                        }
                    } else {
                        self.advance();
                    }
                }
            }
        }
    }

    /// Gets the text at the given span.
    pub fn span_text(&self, span: Span) -> &'a str {
        &self.source[span.start as usize..span.end as usize]
    }
}

/// Tokenizes the entire source.
pub fn tokenize(source: &str) -> Vec<Token> {
    let mut lexer = Lexer::new(source);
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token();
        let is_eof = token.is_eof();
        tokens.push(token);
        if is_eof {
            break;
        }
    }

    tokens
}

/// Decodes the raw text of a `"..."` literal, quotes included.
///
/// Returns `None` on an invalid escape sequence.
pub fn string_value(raw: &str) -> Option<String> {
    let inner = raw.strip_prefix('"')?.strip_suffix('"')?;
    let mut out = String::with_capacity(inner.len());
    let mut chars = inner.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next()? {
            '"' => out.push('"'),
            '\\' => out.push('\\'),
            '/' => out.push('/'),
            'b' => out.push('\u{8}'),
            'f' => out.push('\u{c}'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'u' => {
                let hex: String = chars.by_ref().take(4).collect();
                if hex.len() != 4 {
                    return None;
                }
                let code = u32::from_str_radix(&hex, 16).ok()?;
                out.push(char::from_u32(code)?);
            }
            _ => return None,
        }
    }

    Some(out)
}

/// Decodes the raw text of a `"""..."""` literal: unescapes `\"""`, strips the
/// common indentation and drops leading and trailing blank lines.
pub fn block_string_value(raw: &str) -> String {
    let inner = raw
        .strip_prefix("\"\"\"")
        .and_then(|s| s.strip_suffix("\"\"\""))
        .unwrap_or(raw)
        .replace("\\\"\"\"", "\"\"\"");

    let lines: Vec<&str> = inner.lines().collect();

    let common_indent = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start_matches([' ', '\t']).len())
        .min()
        .unwrap_or(0);

    let mut dedented: Vec<&str> = lines
        .iter()
        .enumerate()
        .map(|(i, line)| {
            if i == 0 {
                *line
            } else if line.len() < common_indent {
                line.trim_start_matches([' ', '\t'])
            } else {
                line.get(common_indent..).unwrap_or_default()
            }
        })
        .collect();

    while dedented.first().is_some_and(|l| l.trim().is_empty()) {
        dedented.remove(0);
    }
    while dedented.last().is_some_and(|l| l.trim().is_empty()) {
        dedented.pop();
    }

    dedented.join("\n")
}
