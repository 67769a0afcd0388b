//! Input cursor and position tracking.
//!
//! [`ParserSource`] is an immutable cursor over the input: advancing returns
//! a new value and never mutates the original, so a failed branch simply
//! drops its advanced copy and the caller retries from the one it kept.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::diagnostics::ErrorInfo;

// ============================================================================
// POSITION
// ============================================================================

/// A human-oriented location in the input: 1-based line and column plus the
/// absolute byte offset. A newline bumps the line and resets the column; any
/// other character bumps the column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub line: usize,
    pub column: usize,
    pub offset: usize,
}

impl Position {
    /// The position before anything has been consumed.
    pub fn start() -> Self {
        Self {
            line: 1,
            column: 1,
            offset: 0,
        }
    }

    /// The position after consuming `c` at this position.
    pub fn forward(self, c: char) -> Self {
        if c == '\n' {
            Self {
                line: self.line + 1,
                column: 1,
                offset: self.offset + c.len_utf8(),
            }
        } else {
            Self {
                line: self.line,
                column: self.column + 1,
                offset: self.offset + c.len_utf8(),
            }
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

// ============================================================================
// PARSER SOURCE
// ============================================================================

/// An immutable cursor over the input string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParserSource<'s> {
    input: &'s str,
    position: Position,
}

impl<'s> ParserSource<'s> {
    /// A cursor at the start of `input`.
    pub fn new(input: &'s str) -> Self {
        Self {
            input,
            position: Position::start(),
        }
    }

    /// The unconsumed remainder of the input.
    pub fn rest(&self) -> &'s str {
        &self.input[self.position.offset..]
    }

    pub fn position(&self) -> Position {
        self.position
    }

    pub fn offset(&self) -> usize {
        self.position.offset
    }

    pub fn is_empty(&self) -> bool {
        self.rest().is_empty()
    }

    /// The next character, without consuming it.
    pub fn peek(&self) -> Option<char> {
        self.rest().chars().next()
    }

    /// Consumes one character, yielding it and the advanced cursor.
    pub fn next(self) -> Result<(char, ParserSource<'s>), ErrorInfo> {
        match self.peek() {
            Some(c) => Ok((
                c,
                Self {
                    input: self.input,
                    position: self.position.forward(c),
                },
            )),
            None => Err(self.end_of_input()),
        }
    }

    /// Consumes `text` if the remaining input starts with it.
    pub fn take_literal(self, text: &str) -> Option<ParserSource<'s>> {
        if !self.rest().starts_with(text) {
            return None;
        }
        let position = text.chars().fold(self.position, Position::forward);
        Some(Self {
            input: self.input,
            position,
        })
    }

    /// The text consumed between `start` and this cursor. Both cursors must
    /// come from the same parse run.
    pub fn consumed_since(&self, start: &ParserSource<'s>) -> &'s str {
        &self.input[start.position.offset..self.position.offset]
    }

    /// The standard end-of-input failure at the current position.
    pub fn end_of_input(&self) -> ErrorInfo {
        ErrorInfo::new("unexpected end of input", self.position)
    }
}
