// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The SMT-LIB 2 front end: scanner, parser, and interpreter.
//!
//! The supported fragment covers `assert`, `check-sat`, `declare-const`,
//! `declare-fun`, `define-fun`, `get-model`, `simplify`, and `let` terms.
//! Every stage keeps going on errors; problems become positioned
//! [Message](crate::scan::Message)s rather than early exits.

pub mod interp;
pub mod parser;

use std::fmt;

use crate::scan::{Message, MessageSet, Position};

/// Token classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Tag {
    LParen,
    RParen,
    Ident,
    Number,
    Bool,
    Int,
    Assert,
    CheckSat,
    DeclareConst,
    DeclareFun,
    DefineFun,
    GetModel,
    Simplify,
    Let,
}

impl Tag {
    fn label(self) -> &'static str {
        match self {
            Tag::LParen => "(",
            Tag::RParen => ")",
            Tag::Ident => "identifier",
            Tag::Number => "number",
            Tag::Bool => "Bool",
            Tag::Int => "Int",
            Tag::Assert => "assert",
            Tag::CheckSat => "check-sat",
            Tag::DeclareConst => "declare-const",
            Tag::DeclareFun => "declare-fun",
            Tag::DefineFun => "define-fun",
            Tag::GetModel => "get-model",
            Tag::Simplify => "simplify",
            Tag::Let => "let",
        }
    }

    fn keyword(image: &str) -> Option<Tag> {
        match image {
            "Bool" => Some(Tag::Bool),
            "Int" => Some(Tag::Int),
            "assert" => Some(Tag::Assert),
            "check-sat" => Some(Tag::CheckSat),
            "declare-const" => Some(Tag::DeclareConst),
            "declare-fun" => Some(Tag::DeclareFun),
            "define-fun" => Some(Tag::DefineFun),
            "get-model" => Some(Tag::GetModel),
            "simplify" => Some(Tag::Simplify),
            "let" => Some(Tag::Let),
            _ => None,
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "'{}'", self.label())
    }
}

const SYMBOL_PUNCT: &str = "+-/*=%?!.$_~&^<>@";

fn is_symbol_start(ch: char) -> bool {
    ch.is_ascii_alphabetic() || SYMBOL_PUNCT.contains(ch)
}

fn is_symbol_follow(ch: char) -> bool {
    is_symbol_start(ch) || ch.is_ascii_digit()
}

/// Lexical scanner over one source text.
///
/// Holds the current token (`tag` is `None` at end of input) with its start
/// and follow positions, and collects diagnostics for the whole front end.
#[derive(Debug)]
pub struct Scanner {
    start: Position,
    follow: Position,
    tag: Option<Tag>,
    ms: MessageSet,
}

impl Scanner {
    /// A scanner positioned at its first token.
    pub fn new(pos: Position) -> Scanner {
        let mut scanner = Scanner {
            start: pos.clone(),
            follow: pos,
            tag: None,
            ms: MessageSet::new(),
        };
        scanner.tag = scanner.scan();
        scanner
    }

    /// Start of the current token.
    pub fn start(&self) -> &Position {
        &self.start
    }

    /// Position just past the current token.
    pub fn follow(&self) -> &Position {
        &self.follow
    }

    /// The current token's tag, `None` at end of input.
    pub fn tag(&self) -> Option<Tag> {
        self.tag
    }

    /// The current token's text.
    pub fn image(&self) -> &str {
        self.start.image(&self.follow)
    }

    /// Advances to the next token.
    pub fn read_token(&mut self) {
        self.tag = self.scan();
    }

    /// Records a diagnostic.
    pub fn report(&mut self, at: Position, description: impl Into<String>) {
        self.ms.add(Message::new(at, description));
    }

    /// The diagnostics collected so far.
    pub fn into_messages(self) -> MessageSet {
        self.ms
    }

    #[cfg(test)]
    fn message_count(&self) -> usize {
        self.ms.len()
    }

    fn consume(&mut self, pred: impl Fn(char) -> bool) -> bool {
        match self.follow.ch() {
            Some(ch) if pred(ch) => {
                self.follow = self.follow.next();
                true
            }
            _ => false,
        }
    }

    fn consume_while(&mut self, pred: impl Fn(char) -> bool) {
        while self.consume(&pred) {}
    }

    fn scan(&mut self) -> Option<Tag> {
        loop {
            self.consume_while(char::is_whitespace);
            self.start = self.follow.clone();
            let ch = self.follow.ch()?;
            if ch == ';' {
                self.consume_while(|c| c != '\n');
            } else if ch == '(' {
                self.follow = self.follow.next();
                return Some(Tag::LParen);
            } else if ch == ')' {
                self.follow = self.follow.next();
                return Some(Tag::RParen);
            } else if is_symbol_start(ch) {
                self.consume_while(is_symbol_follow);
                return Some(Tag::keyword(self.image()).unwrap_or(Tag::Ident));
            } else if ch.is_ascii_digit() {
                self.consume_while(|c| c.is_ascii_digit());
                return Some(Tag::Number);
            } else {
                let at = self.follow.clone();
                self.report(at, format!("invalid character {ch:?}"));
                self.follow = self.follow.next();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLES: &[(&str, Tag)] = &[
        ("(", Tag::LParen),
        (")", Tag::RParen),
        ("+", Tag::Ident),
        ("x", Tag::Ident),
        ("x1", Tag::Ident),
        ("x-files", Tag::Ident),
        ("Bool", Tag::Bool),
        ("Int", Tag::Int),
        ("assert", Tag::Assert),
        ("check-sat", Tag::CheckSat),
        ("declare-const", Tag::DeclareConst),
        ("declare-fun", Tag::DeclareFun),
        ("define-fun", Tag::DefineFun),
        ("get-model", Tag::GetModel),
        ("simplify", Tag::Simplify),
        ("let", Tag::Let),
    ];

    const DELIMITERS: &[&str] = &[
        " ",
        "\t ",
        " \t",
        "\n",
        " \n",
        "\n ",
        "   ",
        "\n\n\n",
        "; this is comment\n",
        ";;;;;;;;\n",
        "  ; \t\n",
    ];

    #[test]
    fn test_single_tokens() {
        for &(text, tag) in SAMPLES {
            let start = Position::beginning_of("dummy.txt", text);
            let follow = start.skip(text.chars().count());

            let scanner = Scanner::new(start.clone());
            assert_eq!(0, scanner.message_count(), "text {text:?}");
            assert_eq!(&start, scanner.start(), "text {text:?}");
            assert_eq!(&follow, scanner.follow(), "text {text:?}");
            assert_eq!(Some(tag), scanner.tag(), "text {text:?}");
            assert_eq!(text, scanner.image());
        }
    }

    #[test]
    fn test_empty_input() {
        for &delimiter in DELIMITERS {
            let pos = Position::beginning_of("dummy.txt", delimiter);
            let end = pos.skip(delimiter.chars().count());
            let scanner = Scanner::new(pos);
            assert_eq!(None, scanner.tag());
            assert_eq!(&end, scanner.start());
            assert_eq!(&end, scanner.follow());
            assert_eq!(0, scanner.message_count());
        }
    }

    #[test]
    fn test_all_sample_pairs() {
        for (i, &(a, tag_a)) in SAMPLES.iter().enumerate() {
            for &(b, tag_b) in SAMPLES.iter() {
                let delimiter = DELIMITERS[i % DELIMITERS.len()];
                let text = format!("{a}{delimiter}{b}");
                let pos = Position::beginning_of("dummy.txt", &text);

                let mut scanner = Scanner::new(pos.clone());
                assert_eq!(Some(tag_a), scanner.tag(), "text {text:?}");
                assert_eq!(&pos, scanner.start());
                let after_a = pos.skip(a.chars().count());
                assert_eq!(&after_a, scanner.follow());

                scanner.read_token();
                assert_eq!(Some(tag_b), scanner.tag(), "text {text:?}");
                let b_start = after_a.skip(delimiter.chars().count());
                assert_eq!(&b_start, scanner.start());
                assert_eq!(&b_start.skip(b.chars().count()), scanner.follow());

                scanner.read_token();
                assert_eq!(None, scanner.tag(), "text {text:?}");
                assert_eq!(0, scanner.message_count());
            }
        }
    }

    #[test]
    fn test_adjacent_parens() {
        let pos = Position::beginning_of("dummy.txt", "(()");
        let mut scanner = Scanner::new(pos);
        assert_eq!(Some(Tag::LParen), scanner.tag());
        scanner.read_token();
        assert_eq!(Some(Tag::LParen), scanner.tag());
        scanner.read_token();
        assert_eq!(Some(Tag::RParen), scanner.tag());
        scanner.read_token();
        assert_eq!(None, scanner.tag());
    }

    #[test]
    fn test_number_and_ident_boundary() {
        let pos = Position::beginning_of("dummy.txt", "12x");
        let mut scanner = Scanner::new(pos);
        assert_eq!(Some(Tag::Number), scanner.tag());
        assert_eq!("12", scanner.image());
        scanner.read_token();
        assert_eq!(Some(Tag::Ident), scanner.tag());
        assert_eq!("x", scanner.image());
    }

    #[test]
    fn test_invalid_character() {
        let pos = Position::beginning_of("dummy.txt", "x # y");
        let mut scanner = Scanner::new(pos);
        assert_eq!(Some(Tag::Ident), scanner.tag());
        assert_eq!("x", scanner.image());
        scanner.read_token();
        assert_eq!(Some(Tag::Ident), scanner.tag());
        assert_eq!("y", scanner.image());

        let ms = scanner.into_messages();
        let messages: Vec<String> = ms.iter().map(|m| m.to_string()).collect();
        assert_eq!(vec!["(1, 3): invalid character '#'"], messages);
    }

    #[test]
    fn test_comment_to_end_of_line() {
        let pos = Position::beginning_of("dummy.txt", "; header\nassert ; trailing");
        let mut scanner = Scanner::new(pos);
        assert_eq!(Some(Tag::Assert), scanner.tag());
        scanner.read_token();
        assert_eq!(None, scanner.tag());
    }
}
