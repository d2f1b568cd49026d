use std::{fmt, iter::Peekable, str::Chars};

/// Zero-based location of the next unread character.
#[derive(Debug, Clone, Copy, Default, Eq, PartialEq)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:{}]", self.line, self.column)
    }
}

/// Character source with one character of lookahead and line/column bookkeeping.
///
/// Reading past the end is idempotent: both [`CharReader::peek`] and
/// [`Iterator::next`] keep returning `None`.
#[derive(Debug)]
pub struct CharReader<I: Iterator<Item = char>> {
    chars: Peekable<I>,
    offset: usize,
    pos: Position,
}

impl<I: Iterator<Item = char>> CharReader<I> {
    pub fn new(chars: I) -> Self {
        Self {
            chars: chars.peekable(),
            offset: 0,
            pos: Position::default(),
        }
    }

    /// Returns the next character without consuming it.
    pub fn peek(&mut self) -> Option<char> {
        self.chars.peek().copied()
    }

    pub fn is_at_end(&mut self) -> bool {
        self.peek().is_none()
    }

    pub fn position(&self) -> Position {
        self.pos
    }

    /// Number of characters consumed so far.
    pub fn offset(&self) -> usize {
        self.offset
    }
}

impl<I: Iterator<Item = char>> Iterator for CharReader<I> {
    type Item = char;

    fn next(&mut self) -> Option<char> {
        let ch = self.chars.next()?;
        self.offset += 1;
        if ch == '\n' {
            self.pos.line += 1;
            self.pos.column = 0;
        } else {
            self.pos.column += 1;
        }
        Some(ch)
    }
}

impl<'a> From<&'a str> for CharReader<Chars<'a>> {
    fn from(source: &'a str) -> Self {
        Self::new(source.chars())
    }
}
