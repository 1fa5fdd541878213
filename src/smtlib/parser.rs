// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Recursive descent parser with error recovery.
//!
//! Grammar:
//!
//! ```text
//! script      = { command }.
//! command     = "(" ( "assert" term
//!                   | "check-sat"
//!                   | "declare-const" ident sort
//!                   | "declare-fun" ident "(" { sort } ")" sort
//!                   | "define-fun" ident "(" { "(" ident sort ")" } ")" sort term
//!                   | "get-model"
//!                   | "simplify" term ) ")".
//! term        = ident | number | "(" ( call-expr | let-expr ) ")".
//! call-expr   = ident term { term }.
//! let-expr    = "let" "(" var-binding { var-binding } ")" term.
//! var-binding = "(" ident term ")".
//! ```
//!
//! An expectation failure reports a message and unwinds to the nearest
//! enclosing construct, which skips tokens up to its following set and
//! leaves the affected node partially populated. Consumers treat such
//! inconsistent nodes as wrapper terms or skip the command.

use crate::scan::Position;
use crate::smtlib::{Scanner, Tag};
use crate::syntax::Sort;

/// Marker for an abandoned parse; the message is already reported.
#[derive(Debug)]
struct Recovery;

type Attempt = Result<(), Recovery>;

/// A parsed source file.
#[derive(Debug)]
pub struct Script {
    /// Top-level commands in source order.
    pub commands: Vec<CommandNode>,
}

/// One command; `content` is `None` when the head keyword was bad.
#[derive(Debug)]
pub struct CommandNode {
    /// Position of the opening parenthesis.
    pub start: Position,
    /// The recognized command, if any.
    pub content: Option<Command>,
}

/// Command payloads.
#[derive(Debug)]
pub enum Command {
    /// `(assert term)`
    Assert(TermNode),
    /// `(check-sat)`
    CheckSat {
        /// Position of the keyword.
        start: Position,
    },
    /// `(declare-const ident sort)`
    DeclareConst {
        /// Declared name.
        ident: IdentNode,
        /// Declared sort.
        sort: SortNode,
    },
    /// `(declare-fun ident (sort*) sort)`
    DeclareFun {
        /// Declared name.
        ident: IdentNode,
        /// Argument sorts.
        args: Vec<SortNode>,
        /// Result sort.
        sort: SortNode,
    },
    /// `(define-fun ident ((ident sort)*) sort term)`
    DefineFun {
        /// Defined name.
        ident: IdentNode,
        /// Formal parameters.
        args: Vec<SortedVar>,
        /// Declared result sort.
        sort: SortNode,
        /// Macro body.
        term: TermNode,
    },
    /// `(get-model)`
    GetModel {
        /// Position of the keyword.
        start: Position,
    },
    /// `(simplify term)`
    Simplify(TermNode),
}

/// A term; `content` is `None` when nothing term-like was found.
#[derive(Debug)]
pub struct TermNode {
    /// First token of the term.
    pub start: Position,
    /// Just past the last consumed token.
    pub follow: Position,
    /// The recognized term shape, if any.
    pub content: Option<TermContent>,
}

/// The shapes a term can take.
#[derive(Debug)]
pub enum TermContent {
    /// A bare identifier.
    Ident(IdentNode),
    /// A number literal.
    Number(NumberNode),
    /// A parenthesized application.
    Call(CallExpr),
    /// A parenthesized `let`.
    Let(LetExpr),
}

/// An applied identifier; `args` is `None` when the arguments were missing.
#[derive(Debug)]
pub struct CallExpr {
    /// The applied name.
    pub ident: IdentNode,
    /// Argument terms, at least one when present.
    pub args: Option<Vec<TermNode>>,
}

/// A `let` expression.
#[derive(Debug)]
pub struct LetExpr {
    /// The bindings, possibly with inconsistent entries.
    pub bindings: Vec<VarBinding>,
    /// The body.
    pub term: Box<TermNode>,
}

/// One `(ident term)` binding; either field may be missing after recovery.
#[derive(Debug)]
pub struct VarBinding {
    /// Bound name.
    pub ident: Option<IdentNode>,
    /// Bound term.
    pub term: Option<TermNode>,
}

impl VarBinding {
    /// Whether both parts were parsed.
    pub fn is_consistent(&self) -> bool {
        self.ident.is_some() && self.term.is_some()
    }
}

/// An identifier; `name` is `None` when the token was not an identifier.
#[derive(Debug)]
pub struct IdentNode {
    /// Position of the token.
    pub start: Position,
    /// Just past the token.
    pub follow: Position,
    /// The identifier text, if any.
    pub name: Option<String>,
}

/// A number literal; `value` is `None` for a bad or out-of-range token.
#[derive(Debug)]
pub struct NumberNode {
    /// Position of the token.
    pub start: Position,
    /// The parsed value, if any.
    pub value: Option<i64>,
}

/// A sort name; `value` is `None` when the token named no sort.
#[derive(Debug)]
pub struct SortNode {
    /// Position of the token.
    pub start: Position,
    /// The named sort, if any.
    pub value: Option<Sort>,
}

/// A formal parameter of `define-fun`.
#[derive(Debug)]
pub struct SortedVar {
    /// Parameter name.
    pub ident: IdentNode,
    /// Parameter sort.
    pub sort: SortNode,
}

/// Parses a whole script, reporting problems through the scanner.
pub fn parse(scanner: &mut Scanner) -> Script {
    let frontier = scanner.start().clone();
    let mut parser = Parser { scanner, frontier };
    let mut commands = Vec::new();
    while parser.matches(&[Tag::LParen]).is_some() {
        commands.push(parser.command());
    }
    Script { commands }
}

struct Parser<'a> {
    scanner: &'a mut Scanner,
    /// Just past the last consumed token.
    frontier: Position,
}

impl Parser<'_> {
    fn next(&mut self) {
        self.frontier = self.scanner.follow().clone();
        self.scanner.read_token();
    }

    fn matches(&self, tags: &[Tag]) -> Option<Tag> {
        self.scanner.tag().filter(|tag| tags.contains(tag))
    }

    fn expect(&mut self, tags: &[Tag]) -> Result<Tag, Recovery> {
        if let Some(tag) = self.matches(tags) {
            return Ok(tag);
        }
        let mut labels: Vec<String> = tags.iter().map(Tag::to_string).collect();
        labels.sort();
        let description = if labels.len() == 1 {
            format!("{} expected", labels[0])
        } else {
            format!("any of {} expected", labels.join(", "))
        };
        self.report(description);
        Err(Recovery)
    }

    /// Reports at the start of the current token.
    fn report(&mut self, description: String) {
        let at = self.scanner.start().clone();
        self.scanner.report(at, description);
    }

    /// Skips tokens up to the following set after a failed parse.
    fn sync(&mut self, attempt: Attempt, following: &[Tag]) {
        if attempt.is_ok() {
            return;
        }
        while self.scanner.tag().is_some() && self.matches(following).is_none() {
            self.scanner.read_token();
        }
    }

    /// End position of a node started at `start`; never before it.
    fn follow_since(&self, start: &Position) -> Position {
        if *start <= self.frontier {
            self.frontier.clone()
        } else {
            start.clone()
        }
    }

    fn command(&mut self) -> CommandNode {
        let start = self.scanner.start().clone();
        let mut content = None;
        let attempt = self.command_body(&mut content);
        self.sync(attempt, &[Tag::LParen]);
        CommandNode { start, content }
    }

    fn command_body(&mut self, content: &mut Option<Command>) -> Attempt {
        self.expect(&[Tag::LParen])?;
        self.next();
        let tag = self.expect(&[
            Tag::Assert,
            Tag::CheckSat,
            Tag::DeclareConst,
            Tag::DeclareFun,
            Tag::DefineFun,
            Tag::GetModel,
            Tag::Simplify,
        ])?;
        let keyword = self.scanner.start().clone();
        self.next();
        *content = Some(match tag {
            Tag::Assert => Command::Assert(self.term()),
            Tag::CheckSat => Command::CheckSat { start: keyword },
            Tag::DeclareConst => Command::DeclareConst {
                ident: self.ident(),
                sort: self.sort(),
            },
            Tag::DeclareFun => Command::DeclareFun {
                ident: self.ident(),
                args: self.sort_list(),
                sort: self.sort(),
            },
            Tag::DefineFun => Command::DefineFun {
                ident: self.ident(),
                args: self.sorted_var_list(),
                sort: self.sort(),
                term: self.term(),
            },
            Tag::GetModel => Command::GetModel { start: keyword },
            _ => Command::Simplify(self.term()),
        });
        self.expect(&[Tag::RParen])?;
        self.next();
        Ok(())
    }

    fn term(&mut self) -> TermNode {
        let start = self.scanner.start().clone();
        let mut content = None;
        let attempt = self.term_body(&mut content);
        self.sync(
            attempt,
            &[Tag::LParen, Tag::Ident, Tag::Number, Tag::RParen],
        );
        TermNode {
            follow: self.follow_since(&start),
            start,
            content,
        }
    }

    fn term_body(&mut self, content: &mut Option<TermContent>) -> Attempt {
        match self.expect(&[Tag::Ident, Tag::Number, Tag::LParen])? {
            Tag::Ident => *content = Some(TermContent::Ident(self.ident())),
            Tag::Number => *content = Some(TermContent::Number(self.number())),
            _ => {
                self.next();
                let inner = if self.matches(&[Tag::Let]).is_some() {
                    TermContent::Let(self.let_expr())
                } else {
                    TermContent::Call(self.call_expr())
                };
                *content = Some(inner);
                self.expect(&[Tag::RParen])?;
                self.next();
            }
        }
        Ok(())
    }

    fn call_expr(&mut self) -> CallExpr {
        let ident = self.ident();
        let args = if self.matches(&[Tag::LParen, Tag::Ident, Tag::Number]).is_some() {
            Some(self.term_list())
        } else {
            self.report("invalid function application, arguments missing".to_string());
            self.sync(Err(Recovery), &[Tag::RParen]);
            None
        };
        CallExpr { ident, args }
    }

    fn term_list(&mut self) -> Vec<TermNode> {
        let mut terms = vec![self.term()];
        while self.matches(&[Tag::Ident, Tag::Number, Tag::LParen]).is_some() {
            terms.push(self.term());
        }
        terms
    }

    fn let_expr(&mut self) -> LetExpr {
        debug_assert_eq!(Some(Tag::Let), self.scanner.tag());
        self.next();
        let bindings = self.var_binding_list();
        let term = Box::new(self.term());
        LetExpr { bindings, term }
    }

    fn var_binding_list(&mut self) -> Vec<VarBinding> {
        let mut bindings = Vec::new();
        let attempt = self.var_binding_list_body(&mut bindings);
        self.sync(attempt, &[Tag::LParen, Tag::Ident, Tag::Number]);
        bindings
    }

    fn var_binding_list_body(&mut self, bindings: &mut Vec<VarBinding>) -> Attempt {
        self.expect(&[Tag::LParen])?;
        self.next();
        bindings.push(self.var_binding());
        while self.matches(&[Tag::LParen]).is_some() {
            bindings.push(self.var_binding());
        }
        self.expect(&[Tag::RParen])?;
        self.next();
        Ok(())
    }

    fn var_binding(&mut self) -> VarBinding {
        let mut binding = VarBinding {
            ident: None,
            term: None,
        };
        let attempt = self.var_binding_body(&mut binding);
        self.sync(attempt, &[Tag::LParen, Tag::RParen]);
        binding
    }

    fn var_binding_body(&mut self, binding: &mut VarBinding) -> Attempt {
        self.expect(&[Tag::LParen])?;
        self.next();
        binding.ident = Some(self.ident());
        binding.term = Some(self.term());
        self.expect(&[Tag::RParen])?;
        self.next();
        Ok(())
    }

    fn ident(&mut self) -> IdentNode {
        let start = self.scanner.start().clone();
        let name = match self.expect(&[Tag::Ident]) {
            Ok(_) => {
                let name = self.scanner.image().to_string();
                self.next();
                Some(name)
            }
            Err(recovery) => {
                self.sync(
                    Err(recovery),
                    &[
                        Tag::Bool,
                        Tag::Int,
                        Tag::LParen,
                        Tag::Ident,
                        Tag::Number,
                        Tag::RParen,
                    ],
                );
                None
            }
        };
        IdentNode {
            follow: self.follow_since(&start),
            start,
            name,
        }
    }

    fn number(&mut self) -> NumberNode {
        let start = self.scanner.start().clone();
        let value = match self.expect(&[Tag::Number]) {
            Ok(_) => {
                let parsed = self.scanner.image().parse::<i64>().ok();
                if parsed.is_none() {
                    self.report("number out of range".to_string());
                }
                self.next();
                parsed
            }
            Err(recovery) => {
                self.sync(
                    Err(recovery),
                    &[Tag::LParen, Tag::Ident, Tag::Number, Tag::RParen],
                );
                None
            }
        };
        NumberNode { start, value }
    }

    fn sort(&mut self) -> SortNode {
        let start = self.scanner.start().clone();
        let value = match self.expect(&[Tag::Bool, Tag::Int]) {
            Ok(tag) => {
                self.next();
                Some(if tag == Tag::Bool { Sort::Bool } else { Sort::Int })
            }
            Err(recovery) => {
                self.sync(
                    Err(recovery),
                    &[
                        Tag::RParen,
                        Tag::LParen,
                        Tag::Ident,
                        Tag::Number,
                        Tag::Bool,
                        Tag::Int,
                    ],
                );
                None
            }
        };
        SortNode { start, value }
    }

    fn sort_list(&mut self) -> Vec<SortNode> {
        let mut sorts = Vec::new();
        let attempt = self.sort_list_body(&mut sorts);
        self.sync(attempt, &[Tag::Bool, Tag::Int]);
        sorts
    }

    fn sort_list_body(&mut self, sorts: &mut Vec<SortNode>) -> Attempt {
        if self.matches(&[Tag::Bool, Tag::Int]).is_some() {
            self.report("sort list in '(' and ')' expected".to_string());
            return Ok(());
        }
        self.expect(&[Tag::LParen])?;
        self.next();
        while self.matches(&[Tag::Bool, Tag::Int]).is_some() {
            sorts.push(self.sort());
        }
        self.expect(&[Tag::RParen])?;
        self.next();
        Ok(())
    }

    fn sorted_var_list(&mut self) -> Vec<SortedVar> {
        let mut vars = Vec::new();
        let attempt = self.sorted_var_list_body(&mut vars);
        self.sync(attempt, &[Tag::Bool, Tag::Int]);
        vars
    }

    fn sorted_var_list_body(&mut self, vars: &mut Vec<SortedVar>) -> Attempt {
        if self.matches(&[Tag::Bool, Tag::Int]).is_some() {
            self.report("list of sorted variables in '(' and ')' expected".to_string());
            return Ok(());
        }
        self.expect(&[Tag::LParen])?;
        self.next();
        let missing_parentheses = self.matches(&[Tag::Ident]).is_some();
        if missing_parentheses {
            self.report("list of sorted variables must begin with '('".to_string());
            vars.push(self.sorted_var());
            self.expect(&[Tag::RParen])?;
            self.next();
        }
        while self.matches(&[Tag::LParen]).is_some() {
            self.next();
            vars.push(self.sorted_var());
            self.expect(&[Tag::RParen])?;
            self.next();
        }
        if missing_parentheses {
            self.report("list of sorted variables must end with ')'".to_string());
        } else {
            self.expect(&[Tag::RParen])?;
            self.next();
        }
        Ok(())
    }

    fn sorted_var(&mut self) -> SortedVar {
        SortedVar {
            ident: self.ident(),
            sort: self.sort(),
        }
    }
}
