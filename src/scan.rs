// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Source positions and positioned diagnostics.
//!
//! A [Position] is an immutable cursor into a shared source text; scanners
//! and parsers hand positions around freely and compare them by file name
//! and offset. Problems found anywhere in the pipeline become [Message]s
//! collected in a [MessageSet], which keeps them deduplicated and in source
//! order for reporting.

use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

/// A named source text, shared by all positions into it.
#[derive(Debug)]
pub struct SourceFile {
    /// File name as shown in diagnostics.
    pub name: String,
    /// Full text of the file.
    pub text: String,
}

/// Failure to load a source file.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The file could not be read.
    #[error("could not read {path}: {err}")]
    Io {
        /// Path as given on the command line.
        path: String,
        /// Underlying I/O error.
        #[source]
        err: std::io::Error,
    },
}

/// Reads a file and returns a position at its beginning.
pub fn load(path: &str) -> Result<Position, SourceError> {
    let text = std::fs::read_to_string(Path::new(path)).map_err(|err| SourceError::Io {
        path: path.to_string(),
        err,
    })?;
    Ok(Position::beginning_of(path, text))
}

/// An immutable cursor into a source text.
///
/// Tracks a byte offset plus 1-based line and column. Positions into the
/// same file only ever move forward; ordering and equality consider the
/// file name and the offset.
#[derive(Debug, Clone)]
pub struct Position {
    file: Arc<SourceFile>,
    offs: usize,
    line: u32,
    column: u32,
}

impl Position {
    /// A position at the start of the given text.
    pub fn beginning_of(name: impl Into<String>, text: impl Into<String>) -> Position {
        Position {
            file: Arc::new(SourceFile {
                name: name.into(),
                text: text.into(),
            }),
            offs: 0,
            line: 1,
            column: 1,
        }
    }

    /// The file this position points into.
    pub fn file(&self) -> &Arc<SourceFile> {
        &self.file
    }

    /// Byte offset into the text.
    pub fn offset(&self) -> usize {
        self.offs
    }

    /// 1-based line number.
    pub fn line(&self) -> u32 {
        self.line
    }

    /// 1-based column number.
    pub fn column(&self) -> u32 {
        self.column
    }

    /// The character under the cursor, or `None` at end of input.
    pub fn ch(&self) -> Option<char> {
        self.file.text[self.offs..].chars().next()
    }

    /// The position one character further, or this position at end of input.
    pub fn next(&self) -> Position {
        match self.ch() {
            None => self.clone(),
            Some(c) => {
                let (line, column) = if c == '\n' {
                    (self.line + 1, 1)
                } else {
                    (self.line, self.column + 1)
                };
                Position {
                    file: Arc::clone(&self.file),
                    offs: self.offs + c.len_utf8(),
                    line,
                    column,
                }
            }
        }
    }

    /// The position `n` characters further (clamped to end of input).
    pub fn skip(&self, n: usize) -> Position {
        let mut pos = self.clone();
        for _ in 0..n {
            pos = pos.next();
        }
        pos
    }

    /// The text between this position and `follow`.
    pub fn image(&self, follow: &Position) -> &str {
        assert_eq!(self.file.name, follow.file.name);
        &self.file.text[self.offs..follow.offs]
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({}, {})", self.line, self.column)
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.file.name == other.file.name && self.offs == other.offs
    }
}

impl Eq for Position {}

impl PartialOrd for Position {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Position {
    fn cmp(&self, other: &Self) -> Ordering {
        self.file
            .name
            .cmp(&other.file.name)
            .then(self.offs.cmp(&other.offs))
    }
}

/// A diagnostic at a source position.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Message {
    /// Where the problem was found.
    pub position: Position,
    /// Human-readable description.
    pub description: String,
}

impl Message {
    /// A message with the given position and description.
    pub fn new(position: Position, description: impl Into<String>) -> Message {
        Message {
            position,
            description: description.into(),
        }
    }
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}: {}", self.position, self.description)
    }
}

/// Messages in source order, without duplicates.
#[derive(Debug, Default)]
pub struct MessageSet {
    messages: BTreeSet<Message>,
}

impl MessageSet {
    /// An empty message set.
    pub fn new() -> MessageSet {
        MessageSet::default()
    }

    /// Records a message; duplicates are ignored.
    pub fn add(&mut self, message: Message) {
        self.messages.insert(message);
    }

    /// Moves all messages from `other` into this set.
    pub fn extend(&mut self, other: MessageSet) {
        self.messages.extend(other.messages);
    }

    /// Number of distinct messages.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether no messages have been recorded.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Messages in source order.
    pub fn iter(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter()
    }

    /// Drops all recorded messages.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_position_beginning() {
        let pos = Position::beginning_of("dummy.txt", "ab\ncd");
        assert_eq!(0, pos.offset());
        assert_eq!(1, pos.line());
        assert_eq!(1, pos.column());
        assert_eq!(Some('a'), pos.ch());
        assert_eq!("(1, 1)", pos.to_string());
    }

    #[test]
    fn test_position_walk() {
        let pos = Position::beginning_of("dummy.txt", "ab\ncd");
        let chars: Vec<_> = (0..6).map(|i| pos.skip(i).ch()).collect();
        assert_eq!(
            vec![Some('a'), Some('b'), Some('\n'), Some('c'), Some('d'), None],
            chars
        );

        let nl = pos.skip(2);
        assert_eq!((1, 4), (nl.line(), nl.column()));
        let c = nl.next();
        assert_eq!((2, 1), (c.line(), c.column()));
        assert_eq!((2, 2), (c.next().line(), c.next().column()));
    }

    #[test]
    fn test_position_end_of_input() {
        let end = Position::beginning_of("dummy.txt", "xy").skip(2);
        assert_eq!(None, end.ch());
        assert_eq!(end, end.next());
        assert_eq!(end, end.skip(10));
    }

    #[test]
    fn test_position_image() {
        let start = Position::beginning_of("dummy.txt", "hello world");
        let follow = start.skip(5);
        assert_eq!("hello", start.image(&follow));
        assert_eq!("", start.image(&start));
        assert_eq!(" world", follow.image(&follow.skip(6)));
    }

    #[test]
    fn test_position_order() {
        let pos = Position::beginning_of("a.txt", "text");
        assert!(pos < pos.next());
        assert!(pos.skip(2) > pos.skip(1));
        assert_eq!(pos.skip(3), pos.skip(3));

        let other = Position::beginning_of("b.txt", "text");
        assert!(pos.skip(4) < other);
    }

    #[test]
    fn test_message_order() {
        let pos = Position::beginning_of("dummy.txt", "text");
        let m1 = Message::new(pos.clone(), "zzz");
        let m2 = Message::new(pos.next(), "aaa");
        assert!(m1 < m2);
        assert!(Message::new(pos.clone(), "aaa") < m1);
        assert_eq!("(1, 1): zzz", m1.to_string());
    }

    #[test]
    fn test_message_set() {
        let pos = Position::beginning_of("dummy.txt", "text");
        let mut ms = MessageSet::new();
        assert!(ms.is_empty());

        ms.add(Message::new(pos.skip(2), "second"));
        ms.add(Message::new(pos.clone(), "first"));
        ms.add(Message::new(pos.skip(2), "second"));
        assert_eq!(2, ms.len());

        let descriptions: Vec<_> = ms.iter().map(|m| m.description.as_str()).collect();
        assert_eq!(vec!["first", "second"], descriptions);

        ms.clear();
        assert!(ms.is_empty());
    }
}
