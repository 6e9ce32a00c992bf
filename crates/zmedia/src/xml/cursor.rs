//! Byte cursor over XML input with line/column tracking

use crate::error::Pos;

/// Forward-only reader over the raw document bytes
#[derive(Clone, Debug)]
pub struct Cursor<'a> {
    input: &'a [u8],
    at: Pos,
}

impl<'a> Cursor<'a> {
    pub const fn new(input: &'a [u8]) -> Self {
        Self {
            input,
            at: Pos::new(0, 1, 1),
        }
    }

    pub fn current(&self) -> Option<u8> {
        self.input.get(self.at.offset).copied()
    }

    pub fn starts_with(&self, pattern: &[u8]) -> bool {
        self.remaining().starts_with(pattern)
    }

    pub fn advance(&mut self) {
        if let Some(b) = self.current() {
            self.at.offset += 1;
            if b == b'\n' {
                self.at.line += 1;
                self.at.col = 1;
            } else {
                self.at.col += 1;
            }
        }
    }

    pub fn advance_by(&mut self, count: usize) {
        for _ in 0..count {
            self.advance();
        }
    }

    /// Consume bytes while `keep` holds and return them
    pub fn take_while(&mut self, mut keep: impl FnMut(u8) -> bool) -> &'a [u8] {
        let start = self.at.offset;
        while self.current().is_some_and(&mut keep) {
            self.advance();
        }
        self.input.get(start..self.at.offset).unwrap_or_default()
    }

    pub fn skip_whitespace(&mut self) {
        self.take_while(|b| matches!(b, b' ' | b'\t' | b'\n' | b'\r'));
    }

    /// Move past the next occurrence of `pattern`; `false` if the input ends first
    pub fn skip_past(&mut self, pattern: &[u8]) -> bool {
        while !self.is_eof() {
            if self.starts_with(pattern) {
                self.advance_by(pattern.len());
                return true;
            }
            self.advance();
        }
        false
    }

    pub fn consume(&mut self, expected: u8) -> bool {
        let matched = self.current() == Some(expected);
        if matched {
            self.advance();
        }
        matched
    }

    pub const fn position(&self) -> Pos {
        self.at
    }

    pub const fn is_eof(&self) -> bool {
        self.at.offset >= self.input.len()
    }

    pub fn remaining(&self) -> &'a [u8] {
        self.input.get(self.at.offset..).unwrap_or_default()
    }
}
