//! Stream tokeniser. Classifies bytes into a small set of syntactic
//! categories and assembles them into the [`Token`]s the parser
//! consumes, tracking the line number of every token for diagnostics.
//!
//! The PGN grammar is multi-line, error-recovering, and needs per-token
//! line numbers — a shape that doesn't suit a small parser-combinator
//! grammar the way FEN and move tokens do, so this follows plain
//! systems-Rust buffered-reader style instead.

use std::io::BufRead;

use crate::config::ParserConfig;
use crate::error::{Diagnostic, Diagnostics};
use crate::notation::decode::decode_move_token;
use crate::pgn::token::{Token, TokenKind};

/// Coarse byte classification backing the atom scanner. Built as an
/// explicit 256-entry table per the design note, even though several
/// categories share a single match arm in practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ByteClass {
    Whitespace,
    BracketOpen,
    BracketClose,
    BraceOpen,
    BraceClose,
    ParenOpen,
    ParenClose,
    Quote,
    Dollar,
    Percent,
    Backslash,
    Asterisk,
    BangOrQuery,
    Other,
}

const fn classify_byte(b: u8) -> ByteClass {
    match b {
        b' ' | b'\t' | b'\r' | b'\n' | 0x0b | 0x0c => ByteClass::Whitespace,
        b'[' => ByteClass::BracketOpen,
        b']' => ByteClass::BracketClose,
        b'{' => ByteClass::BraceOpen,
        b'}' => ByteClass::BraceClose,
        b'(' => ByteClass::ParenOpen,
        b')' => ByteClass::ParenClose,
        b'"' => ByteClass::Quote,
        b'$' => ByteClass::Dollar,
        b'%' => ByteClass::Percent,
        b'\\' => ByteClass::Backslash,
        b'*' => ByteClass::Asterisk,
        b'!' | b'?' => ByteClass::BangOrQuery,
        _ => ByteClass::Other,
    }
}

const BYTE_CLASS_TABLE: [ByteClass; 256] = {
    let mut table = [ByteClass::Other; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = classify_byte(i as u8);
        i += 1;
    }
    table
};

fn class_of(c: char) -> ByteClass {
    if c.is_ascii() {
        BYTE_CLASS_TABLE[c as usize]
    } else {
        ByteClass::Other
    }
}

/// An atom boundary: any character that can't appear inside a bare
/// move/result/move-number token.
fn is_atom_boundary(c: char) -> bool {
    matches!(
        class_of(c),
        ByteClass::Whitespace
            | ByteClass::BracketOpen
            | ByteClass::BracketClose
            | ByteClass::BraceOpen
            | ByteClass::BraceClose
            | ByteClass::ParenOpen
            | ByteClass::ParenClose
            | ByteClass::Dollar
            | ByteClass::Quote
    )
}

pub struct Lexer<R, D> {
    reader: R,
    buffer: Vec<char>,
    pos: usize,
    line: u32,
    at_line_start: bool,
    eof: bool,
    config: ParserConfig,
    diagnostics: D,
    /// At most one token queued by `lex_tag`, which produces a `Tag`
    /// and a `String` token from a single bracketed entry.
    pending: Option<Token>,
}

impl<R: BufRead, D: Diagnostics> Lexer<R, D> {
    pub fn new(reader: R, config: ParserConfig, diagnostics: D) -> Self {
        Self {
            reader,
            buffer: Vec::new(),
            pos: 0,
            line: 1,
            at_line_start: true,
            eof: false,
            config,
            diagnostics,
            pending: None,
        }
    }

    pub fn line(&self) -> u32 {
        self.line
    }

    pub fn into_diagnostics(self) -> D {
        self.diagnostics
    }

    /// Lets the parser (C4 upper half) route its own recoverable
    /// findings through the same sink the lexer reports into.
    pub fn report(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.report(diagnostic);
    }

    fn refill(&mut self) -> bool {
        if self.eof {
            return false;
        }
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(0) => {
                self.eof = true;
                false
            }
            Ok(_) => {
                self.buffer.extend(line.chars());
                true
            }
            Err(_) => {
                self.eof = true;
                false
            }
        }
    }

    fn peek(&mut self) -> Option<char> {
        if self.pos >= self.buffer.len() && !self.refill() {
            return None;
        }
        self.buffer.get(self.pos).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        self.at_line_start = c == '\n';
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn compact(&mut self) {
        if self.pos > 8192 {
            self.buffer.drain(..self.pos);
            self.pos = 0;
        }
    }

    fn skip_inline_whitespace(&mut self) {
        while matches!(self.peek(), Some(c) if c.is_whitespace()) {
            self.bump();
        }
    }

    fn skip_whitespace_and_escape_lines(&mut self) {
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('%') if self.at_line_start => {
                    while let Some(c) = self.bump() {
                        if c == '\n' {
                            break;
                        }
                    }
                }
                _ => break,
            }
        }
    }

    /// Next token from the stream.
    pub fn next_token(&mut self) -> Token {
        loop {
            if let Some(tok) = self.pending.take() {
                return tok;
            }
            self.compact();
            self.skip_whitespace_and_escape_lines();
            let line = self.line;
            let Some(c) = self.peek() else {
                return Token::new(TokenKind::Eof, line);
            };
            let produced = match class_of(c) {
                ByteClass::BracketOpen => Some(self.lex_tag(line)),
                ByteClass::BraceOpen => Some(Token::new(TokenKind::Comment(self.lex_comment()), line)),
                ByteClass::ParenOpen => {
                    self.bump();
                    Some(Token::new(TokenKind::RavStart, line))
                }
                ByteClass::ParenClose => {
                    self.bump();
                    Some(Token::new(TokenKind::RavEnd, line))
                }
                ByteClass::Dollar => Some(Token::new(TokenKind::Nag(self.lex_nag()), line)),
                ByteClass::BangOrQuery => Some(Token::new(TokenKind::Nag(self.lex_glyph()), line)),
                ByteClass::Asterisk => {
                    self.bump();
                    Some(Token::new(TokenKind::TerminatingResult("*".to_string()), line))
                }
                ByteClass::BracketClose | ByteClass::BraceClose | ByteClass::Quote => {
                    self.bump();
                    self.diagnostics.report(Diagnostic::LexError {
                        message: format!("unexpected character '{c}'"),
                        line,
                    });
                    None
                }
                _ => Some(self.lex_atom(line)),
            };
            if let Some(tok) = produced {
                return tok;
            }
        }
    }

    fn lex_tag(&mut self, line: u32) -> Token {
        self.bump(); // '['
        self.skip_inline_whitespace();
        let mut name = String::new();
        while let Some(c) = self.peek() {
            if is_atom_boundary(c) {
                break;
            }
            name.push(c);
            self.bump();
        }
        self.skip_inline_whitespace();
        let value = if self.peek() == Some('"') { self.lex_string() } else { String::new() };
        self.skip_inline_whitespace();
        if self.peek() == Some(']') {
            self.bump();
        } else {
            self.diagnostics.report(Diagnostic::LexError {
                message: format!("tag '{name}' is missing its closing ']'"),
                line,
            });
        }
        self.pending = Some(Token::new(TokenKind::String(value), line));
        Token::new(TokenKind::Tag(name), line)
    }

    fn lex_string(&mut self) -> String {
        self.bump(); // opening quote
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c == '\\' {
                self.bump();
                if let Some(escaped) = self.peek() {
                    s.push(escaped);
                    self.bump();
                }
                continue;
            }
            if c == '"' {
                self.bump();
                break;
            }
            s.push(c);
            self.bump();
        }
        s
    }

    fn lex_comment(&mut self) -> String {
        self.bump(); // '{'
        let mut depth = 1u32;
        let mut s = String::new();
        while let Some(c) = self.peek() {
            match c {
                '{' if self.config.allow_nested_comments => {
                    depth += 1;
                    s.push(c);
                    self.bump();
                }
                '}' => {
                    self.bump();
                    depth -= 1;
                    if depth == 0 {
                        break;
                    }
                    s.push('}');
                }
                _ => {
                    s.push(c);
                    self.bump();
                }
            }
        }
        s
    }

    fn lex_nag(&mut self) -> u8 {
        self.bump(); // '$'
        let mut digits = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                digits.push(c);
                self.bump();
            } else {
                break;
            }
        }
        digits.parse::<u32>().unwrap_or(0).min(255) as u8
    }

    /// `!`, `?`, `!!`, `??`, `!?`, `?!` compressed to NAG `$1`..`$6`.
    fn lex_glyph(&mut self) -> u8 {
        let first = self.bump().unwrap_or('!');
        let second = if matches!(self.peek(), Some('!') | Some('?')) { self.bump() } else { None };
        match (first, second) {
            ('!', None) => 1,
            ('?', None) => 2,
            ('!', Some('!')) => 3,
            ('?', Some('?')) => 4,
            ('!', Some('?')) => 5,
            ('?', Some('!')) => 6,
            _ => 0,
        }
    }

    fn lex_atom(&mut self, line: u32) -> Token {
        let mut atom = String::new();
        while let Some(c) = self.peek() {
            if is_atom_boundary(c) {
                break;
            }
            atom.push(c);
            self.bump();
        }
        classify_atom(&atom, line)
    }
}

fn classify_atom(atom: &str, line: u32) -> Token {
    if let Some(digits) = atom.strip_suffix("...").or_else(|| atom.strip_suffix('.')) {
        if !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()) {
            if let Ok(n) = digits.parse::<u32>() {
                return Token::new(TokenKind::MoveNumber(n), line);
            }
        }
    }
    if matches!(atom, "1-0" | "0-1" | "1/2-1/2") {
        return Token::new(TokenKind::TerminatingResult(atom.to_string()), line);
    }
    Token::new(TokenKind::Move(decode_move_token(atom)), line)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NullDiagnostics;
    use crate::model::MoveClass;

    fn lex_all(input: &str) -> Vec<TokenKind> {
        let mut lexer = Lexer::new(input.as_bytes(), ParserConfig::default(), NullDiagnostics);
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn tags_then_moves_then_result() {
        let kinds = lex_all("[Event \"Test\"]\n\n1. e4 e5 1-0\n");
        assert_eq!(kinds[0], TokenKind::Tag("Event".to_string()));
        assert_eq!(kinds[1], TokenKind::String("Test".to_string()));
        assert_eq!(kinds[2], TokenKind::MoveNumber(1));
        assert!(matches!(&kinds[3], TokenKind::Move(m) if m.class == MoveClass::PawnMove));
        assert!(matches!(&kinds[4], TokenKind::Move(m) if m.class == MoveClass::PawnMove));
        assert_eq!(kinds[5], TokenKind::TerminatingResult("1-0".to_string()));
    }

    #[test]
    fn percent_line_is_skipped() {
        let kinds = lex_all("%this is an escaped line\n1. e4 *");
        assert_eq!(kinds[0], TokenKind::MoveNumber(1));
    }

    #[test]
    fn glyph_compression() {
        let kinds = lex_all("e4!! e5?!");
        assert_eq!(kinds[1], TokenKind::Nag(3));
        assert_eq!(kinds[3], TokenKind::Nag(6));
    }

    #[test]
    fn comment_and_variation_brackets() {
        let kinds = lex_all("e4 {a comment} (e5) *");
        assert!(matches!(&kinds[1], TokenKind::Comment(s) if s == "a comment"));
        assert_eq!(kinds[2], TokenKind::RavStart);
        assert_eq!(kinds[4], TokenKind::RavEnd);
    }

    #[test]
    fn castling_with_digit_zero_is_a_move_not_a_result() {
        let kinds = lex_all("0-0 0-1");
        assert!(matches!(&kinds[0], TokenKind::Move(m) if m.class == MoveClass::KingsideCastle));
        assert_eq!(kinds[1], TokenKind::TerminatingResult("0-1".to_string()));
    }

    #[test]
    fn string_escapes_are_resolved() {
        let kinds = lex_all(r#"[Note "a \"quoted\" word"]"#);
        assert_eq!(kinds[1], TokenKind::String("a \"quoted\" word".to_string()));
    }
}
