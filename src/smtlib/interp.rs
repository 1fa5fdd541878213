// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Command interpretation over parsed scripts.
//!
//! The interpreter owns the term pool, a scoped symbol table, and the set
//! of asserted terms. Commands with recovered syntax errors still execute
//! as far as their surviving fields allow; terms that failed to elaborate
//! are wrapper applications and poison the assertions they appear in, so
//! solving only ever sees well-sorted input.

use fxhash::FxHashMap;

use crate::printer;
use crate::scan::{Message, MessageSet, Position};
use crate::scope::ScopedMap;
use crate::smtlib::parser::{
    self, CallExpr, Command, CommandNode, IdentNode, LetExpr, SortNode, TermContent, TermNode,
};
use crate::smtlib::Scanner;
use crate::solver::{Model, Status};
use crate::syntax::{Sort, Symbol, Term, TermPool};
use crate::term::cnf::to_cnf;
use crate::term::subst::substitute;

/// Name resolution for the SMT-LIB surface syntax.
///
/// Builtin names are fixed; `=` and `-` resolve by argument sorts. Declared
/// names live in scoped layers so `define-fun` formals and `let` bindings
/// can shadow and be rolled back. The reverse map recovers names for
/// rendering.
pub struct SymbolTable {
    names: ScopedMap<String, Symbol>,
    ids: ScopedMap<Symbol, String>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        SymbolTable::new()
    }
}

impl SymbolTable {
    /// A table holding only the builtin names.
    pub fn new() -> SymbolTable {
        let mut ids = ScopedMap::new();
        for (name, symbol) in [
            ("not", Symbol::Not(Sort::Bool)),
            ("and", Symbol::And),
            ("or", Symbol::Or),
            ("=>", Symbol::Implies),
            ("+", Symbol::IntSum),
            ("=", Symbol::BoolEq),
            ("=", Symbol::IntEq),
            ("-", Symbol::Not(Sort::Int)),
            ("-", Symbol::IntDiff),
        ] {
            ids.insert(symbol, name.to_string());
        }
        SymbolTable {
            names: ScopedMap::new(),
            ids,
        }
    }

    fn builtin(name: &str) -> Option<Symbol> {
        match name {
            "true" => Some(Symbol::BoolConst(true)),
            "false" => Some(Symbol::BoolConst(false)),
            "not" => Some(Symbol::Not(Sort::Bool)),
            "and" => Some(Symbol::And),
            "or" => Some(Symbol::Or),
            "=>" => Some(Symbol::Implies),
            "+" => Some(Symbol::IntSum),
            _ => None,
        }
    }

    /// Whether `name` cannot be redeclared.
    pub fn is_standard(name: &str) -> bool {
        SymbolTable::builtin(name).is_some() || name == "=" || name == "-"
    }

    /// The symbol `name` denotes when applied to arguments of the given
    /// sorts, or `None` for an undeclared name.
    pub fn resolve(&self, name: &str, arg_sorts: &[Sort]) -> Option<Symbol> {
        if let Some(symbol) = SymbolTable::builtin(name) {
            return Some(symbol);
        }
        match name {
            "=" => Some(if arg_sorts.first() == Some(&Sort::Int) {
                Symbol::IntEq
            } else {
                Symbol::BoolEq
            }),
            "-" => Some(if arg_sorts.len() == 1 {
                Symbol::Not(Sort::Int)
            } else {
                Symbol::IntDiff
            }),
            _ => self.names.get(name).copied(),
        }
    }

    /// Binds `name` in the current scope; fails on builtin names and on
    /// names already bound in this scope.
    pub fn declare(&mut self, name: &str, symbol: Symbol) -> bool {
        if SymbolTable::is_standard(name) || self.names.top_contains(name) {
            return false;
        }
        self.names.insert(name.to_string(), symbol);
        self.ids.insert(symbol, name.to_string());
        true
    }

    /// The surface name of `symbol`, if it has one.
    pub fn name_of(&self, symbol: Symbol) -> Option<&str> {
        self.ids.get(&symbol).map(String::as_str)
    }

    /// All visible declared names, sorted.
    pub fn visible_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.names.iter().map(|(name, _)| name.clone()).collect();
        names.sort();
        names
    }

    fn push_scope(&mut self) {
        self.names.push_scope();
        self.ids.push_scope();
    }

    fn rollback(&mut self) {
        self.names.rollback();
        self.ids.rollback();
    }
}

/// Executes SMT-LIB scripts, accumulating declarations, assertions, and
/// diagnostics across calls.
pub struct Interp {
    pool: TermPool,
    symbols: SymbolTable,
    assertions: Vec<Term>,
    model: Option<Model>,
    ms: MessageSet,
    output: Vec<String>,
}

impl Default for Interp {
    fn default() -> Self {
        Interp::new()
    }
}

impl Interp {
    /// A fresh interpreter with no declarations or assertions.
    pub fn new() -> Interp {
        Interp {
            pool: TermPool::new(),
            symbols: SymbolTable::new(),
            assertions: Vec::new(),
            model: None,
            ms: MessageSet::new(),
            output: Vec::new(),
        }
    }

    /// Scans, parses, and runs the script starting at `pos`.
    pub fn execute(&mut self, pos: Position) {
        let mut scanner = Scanner::new(pos);
        let script = parser::parse(&mut scanner);
        self.ms.extend(scanner.into_messages());
        for command in &script.commands {
            self.command(command);
        }
    }

    /// Diagnostics collected so far, in source order.
    pub fn messages(&self) -> &MessageSet {
        &self.ms
    }

    /// Lines produced by `check-sat`, `get-model`, and `simplify`.
    pub fn output(&self) -> &[String] {
        &self.output
    }

    /// The conjunction of everything asserted so far.
    pub fn assertion(&mut self) -> Term {
        if self.assertions.is_empty() {
            self.pool.bool_const(true)
        } else {
            let items = self.assertions.clone();
            self.pool.and(&items)
        }
    }

    /// Renders `t` with the declared names.
    pub fn serialize(&self, t: Term) -> String {
        let Self { pool, symbols, .. } = self;
        printer::serialize(pool, t, |s| symbols.name_of(s).map(str::to_string))
    }

    fn command(&mut self, node: &CommandNode) {
        match &node.content {
            None => {}
            Some(Command::Assert(term)) => self.assert_term(term),
            Some(Command::CheckSat { .. }) => self.check_sat(),
            Some(Command::DeclareConst { ident, sort }) => {
                let var = self.pool.fresh_var(sort_or_unknown(sort));
                self.declare_symbol(ident, var);
            }
            Some(Command::DeclareFun { ident, args, sort }) => {
                let arg_sorts: Vec<Sort> = args.iter().map(sort_or_unknown).collect();
                let fun = self.pool.fresh_fun(sort_or_unknown(sort), arg_sorts);
                self.declare_symbol(ident, fun);
            }
            Some(Command::DefineFun {
                ident,
                args,
                sort,
                term,
            }) => self.define_fun(ident, args, sort, term),
            Some(Command::GetModel { start }) => self.get_model(start),
            Some(Command::Simplify(term)) => self.simplify(term),
        }
    }

    fn assert_term(&mut self, node: &TermNode) {
        let e = self.term(node);
        let sort = self.pool.sort(e);
        if sort != Sort::Unknown && sort != Sort::Bool {
            self.ms.add(Message::new(
                node.start.clone(),
                "invalid assert command, term is not Bool",
            ));
        }
        if !self.pool.has_wrappers(e) && !self.assertions.contains(&e) {
            self.assertions.push(e);
        }
    }

    fn check_sat(&mut self) {
        let assertion = self.assertion();
        let mut model = Model::new(&mut self.pool, assertion);
        let status = model.solve();
        self.output.push(status.to_string());
        self.model = Some(model);
    }

    fn define_fun(
        &mut self,
        ident: &IdentNode,
        args: &[parser::SortedVar],
        sort: &SortNode,
        term: &TermNode,
    ) {
        self.symbols.push_scope();
        let mut formals = Vec::with_capacity(args.len());
        for sv in args {
            let var = self.pool.fresh_var(sort_or_unknown(&sv.sort));
            formals.push(var);
            self.declare_symbol(&sv.ident, var);
        }
        let body = self.term(term);
        self.symbols.rollback();

        let body_sort = self.pool.sort(body);
        let result_sort = sort.value.unwrap_or(body_sort);
        if self.pool.is_valency(self.pool.symbol(body)) && result_sort != body_sort {
            self.ms.add(Message::new(
                sort.start.clone(),
                "invalid function definition, sort mismatch",
            ));
        }
        let mac = self.pool.define_macro(result_sort, &formals, body);
        self.declare_symbol(ident, mac);
    }

    fn get_model(&mut self, start: &Position) {
        let Self {
            pool,
            symbols,
            model,
            ms,
            output,
            ..
        } = self;
        match model {
            Some(model) if model.status() != Some(Status::Unsat) => {
                for name in symbols.visible_names() {
                    let Some(symbol) = symbols.resolve(&name, &[]) else {
                        continue;
                    };
                    if !matches!(symbol, Symbol::Var(_)) || pool.sort_of(symbol) != Sort::Bool {
                        continue;
                    }
                    let atom = pool.apply(symbol, &[]);
                    if let Some(value) = model.eval(pool, atom) {
                        let s =
                            printer::serialize(pool, value, |s| {
                                symbols.name_of(s).map(str::to_string)
                            });
                        output.push(format!("{name}: {s}"));
                    }
                }
            }
            _ => ms.add(Message::new(start.clone(), "model not available")),
        }
    }

    fn simplify(&mut self, node: &TermNode) {
        let e = self.term(node);
        let reduced = if self.pool.sort(e) == Sort::Bool {
            to_cnf(&mut self.pool, e)
        } else {
            e
        };
        let s = self.serialize(reduced);
        self.output.push(s);
    }

    fn term(&mut self, node: &TermNode) -> Term {
        match &node.content {
            None => self.wrapper_atom(),
            Some(TermContent::Ident(ident)) => self.apply_name(ident, &[]),
            Some(TermContent::Number(number)) => match number.value {
                Some(v) => self.pool.int_const(v),
                None => self.wrapper_atom(),
            },
            Some(TermContent::Call(CallExpr { ident, args })) => match args {
                Some(args) => self.apply_name(ident, args),
                None => self.wrapper_atom(),
            },
            Some(TermContent::Let(le)) => self.let_term(le),
        }
    }

    fn apply_name(&mut self, ident: &IdentNode, arg_nodes: &[TermNode]) -> Term {
        let args: Vec<Term> = arg_nodes.iter().map(|n| self.term(n)).collect();
        let Some(name) = ident.name.clone() else {
            return self.wrapper_atom();
        };
        let arg_sorts: Vec<Sort> = args.iter().map(|&e| self.pool.sort(e)).collect();
        let symbol = match self.symbols.resolve(&name, &arg_sorts) {
            Some(symbol) => symbol,
            None => {
                self.ms.add(Message::new(
                    ident.start.clone(),
                    format!("symbol '{name}' not declared"),
                ));
                let wrapper = self.pool.fresh_wrapper(None);
                self.symbols.declare(&name, wrapper);
                wrapper
            }
        };

        let term = self.pool.apply(symbol, &args);
        if self.pool.is_valency(symbol) && matches!(self.pool.symbol(term), Symbol::Wrapper(_)) {
            // pinpoint which actual argument broke the application
            for (i, n) in arg_nodes.iter().enumerate() {
                match self.pool.arg_sort(symbol, i, true) {
                    None => {
                        self.ms.add(Message::new(
                            n.start.clone(),
                            format!("extra argument passed to function '{name}'"),
                        ));
                        break;
                    }
                    Some(formal) => {
                        let actual = arg_sorts[i];
                        if actual != Sort::Unknown && actual != formal {
                            self.ms.add(Message::new(
                                n.start.clone(),
                                format!(
                                    "sort mismatch at argument #{} for function '{name}'",
                                    i + 1
                                ),
                            ));
                        }
                    }
                }
            }
            if self.pool.arg_sort(symbol, arg_nodes.len(), false).is_some() {
                let at = match arg_nodes.last() {
                    Some(n) => n.follow.clone(),
                    None => ident.follow.clone(),
                };
                self.ms.add(Message::new(
                    at,
                    format!(
                        "not enough arguments ({}) passed to function '{name}'",
                        arg_nodes.len()
                    ),
                ));
            }
        }
        term
    }

    fn let_term(&mut self, le: &LetExpr) -> Term {
        // binding terms see the outer scope
        let mut bound = Vec::new();
        for binding in &le.bindings {
            if let (Some(ident), Some(term)) = (&binding.ident, &binding.term) {
                let e = self.term(term);
                bound.push((ident, e));
            }
        }
        self.symbols.push_scope();
        let mut table = FxHashMap::default();
        for (ident, e) in bound {
            let sort = self.pool.sort(e);
            let var = self.pool.fresh_var(sort);
            let atom = self.pool.apply(var, &[]);
            table.insert(atom, e);
            self.declare_symbol(ident, var);
        }
        let body = self.term(&le.term);
        let result = substitute(&mut self.pool, body, &table);
        self.symbols.rollback();
        result
    }

    fn declare_symbol(&mut self, ident: &IdentNode, symbol: Symbol) {
        let Some(name) = &ident.name else {
            return;
        };
        if !self.symbols.declare(name, symbol) {
            let description = if SymbolTable::is_standard(name) {
                format!("invalid declaration, builtin symbol '{name}'")
            } else {
                format!("invalid declaration, symbol '{name}' already declared")
            };
            self.ms
                .add(Message::new(ident.start.clone(), description));
        }
    }

    fn wrapper_atom(&mut self) -> Term {
        let wrapper = self.pool.fresh_wrapper(None);
        self.pool.apply(wrapper, &[])
    }
}

fn sort_or_unknown(node: &SortNode) -> Sort {
    node.value.unwrap_or(Sort::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(src: &str) -> Interp {
        let mut interp = Interp::new();
        interp.execute(Position::beginning_of("test.smt", src));
        interp
    }

    fn messages(interp: &Interp) -> Vec<String> {
        interp.messages().iter().map(|m| m.to_string()).collect()
    }

    /// Runs `src`, requires it to be clean, and renders the CNF of the
    /// accumulated assertion.
    fn checked(src: &str) -> String {
        let mut interp = run(src);
        assert!(interp.ms.is_empty(), "{:?}", messages(&interp));
        let assertion = interp.assertion();
        let cnf = to_cnf(&mut interp.pool, assertion);
        interp.serialize(cnf)
    }

    #[test]
    fn test_conjoined_assertions() {
        let src = "\
            (declare-const A Bool)\n\
            (declare-const B Bool)\n\
            (assert A)\n\
            (assert B)\n";
        assert_eq!("(and A B)", checked(src));
    }

    #[test]
    fn test_integer_equality() {
        let src = "\
            (declare-const A Int)\n\
            (declare-const B Int)\n\
            (assert (= A B))\n";
        assert_eq!("(= A B)", checked(src));
    }

    #[test]
    fn test_macro_expansion() {
        let src = "\
            (declare-const A Bool)\n\
            (declare-const B Bool)\n\
            (define-fun F ((x Bool) (y Bool)) Bool (and x y))\n\
            (assert (F A B))\n";
        assert_eq!("(and A B)", checked(src));
    }

    #[test]
    fn test_tseitin_conversion() {
        let src = "\
            (declare-const A Bool)\n\
            (declare-const B Bool)\n\
            (declare-const C Bool)\n\
            (declare-const D Bool)\n\
            (assert (or (and A B) (and C D)))\n";
        let expected = "(and\n\
            \t(or (not τ0) A)\n\
            \t(or (not τ0) B)\n\
            \t(or (not τ1) C)\n\
            \t(or (not τ1) D)\n\
            \t(or (not A) (not B) τ0)\n\
            \t(or (not C) (not D) τ1)\n\
            \t(or τ0 τ1))";
        assert_eq!(expected, checked(src));
    }

    #[test]
    fn test_tseitin_under_uninterpreted_function() {
        let src = "\
            (declare-const A Bool)\n\
            (declare-const B Bool)\n\
            (declare-const C Bool)\n\
            (declare-const D Bool)\n\
            (declare-fun F (Bool Bool) Bool)\n\
            (assert (F (and A B) (and C D)))\n";
        let expected = "(and\n\
            \t(F τ0 τ1)\n\
            \t(or (not τ0) A)\n\
            \t(or (not τ0) B)\n\
            \t(or (not τ1) C)\n\
            \t(or (not τ1) D)\n\
            \t(or (not A) (not B) τ0)\n\
            \t(or (not C) (not D) τ1))";
        assert_eq!(expected, checked(src));
    }

    #[test]
    fn test_shared_subterm_reference() {
        let src = "\
            (declare-const A Bool)\n\
            (declare-const B Bool)\n\
            (declare-fun F (Bool) Bool)\n\
            (assert (and (F (and A B)) (F (F (and A B)))))\n";
        let expected = "(and\n\
            \t[1]\n\
            \t(F [1])\n\
            \t(or (not τ0) A)\n\
            \t(or (not τ0) B)\n\
            \t(or (not A) (not B) τ0))\n\
            where\n\
            \t[1]:\n\
            \t\t(F τ0)";
        assert_eq!(expected, checked(src));
    }

    #[test]
    fn test_let_bindings_see_outer_scope() {
        let src = "\
            (declare-const x Bool)\n\
            (assert (let ((x (not x))) x))\n";
        assert_eq!("(not x)", checked(src));
    }

    #[test]
    fn test_let_substitution() {
        let src = "\
            (declare-const A Bool)\n\
            (declare-const B Bool)\n\
            (assert (let ((x A) (y B)) (and x y)))\n";
        assert_eq!("(and A B)", checked(src));
    }

    #[test]
    fn test_undeclared_symbol() {
        let mut interp = run("(assert X)");
        assert_eq!(
            vec!["(1, 9): symbol 'X' not declared".to_string()],
            messages(&interp)
        );
        // the broken assertion is dropped
        let assertion = interp.assertion();
        assert_eq!(Symbol::BoolConst(true), interp.pool.symbol(assertion));
    }

    #[test]
    fn test_assert_requires_bool() {
        let interp = run("(declare-const A Int)\n(assert A)");
        assert_eq!(
            vec!["(2, 9): invalid assert command, term is not Bool".to_string()],
            messages(&interp)
        );
    }

    #[test]
    fn test_argument_sort_mismatch() {
        let interp = run("(declare-const A Int)\n(assert (and A A))");
        assert_eq!(
            vec![
                "(2, 14): sort mismatch at argument #1 for function 'and'".to_string(),
                "(2, 16): sort mismatch at argument #2 for function 'and'".to_string(),
            ],
            messages(&interp)
        );
    }

    #[test]
    fn test_not_enough_arguments() {
        let interp = run("(declare-const A Bool)\n(assert (=> A))");
        assert_eq!(
            vec!["(2, 14): not enough arguments (1) passed to function '=>'".to_string()],
            messages(&interp)
        );
    }

    #[test]
    fn test_extra_argument() {
        let interp = run("(declare-const A Bool)\n(assert (not A A))");
        assert_eq!(
            vec!["(2, 16): extra argument passed to function 'not'".to_string()],
            messages(&interp)
        );
    }

    #[test]
    fn test_duplicate_declaration() {
        let interp = run("(declare-const A Bool)\n(declare-const A Int)");
        assert_eq!(
            vec!["(2, 16): invalid declaration, symbol 'A' already declared".to_string()],
            messages(&interp)
        );
    }

    #[test]
    fn test_builtin_declaration() {
        let interp = run("(declare-const and Bool)");
        assert_eq!(
            vec!["(1, 16): invalid declaration, builtin symbol 'and'".to_string()],
            messages(&interp)
        );
    }

    #[test]
    fn test_define_fun_sort_mismatch() {
        let interp = run("(define-fun F ((x Bool)) Int x)");
        assert_eq!(
            vec!["(1, 26): invalid function definition, sort mismatch".to_string()],
            messages(&interp)
        );
    }

    #[test]
    fn test_check_sat_and_get_model() {
        let src = "\
            (declare-const A Bool)\n\
            (declare-const B Bool)\n\
            (assert A)\n\
            (assert (or (not A) B))\n\
            (check-sat)\n\
            (get-model)\n";
        let interp = run(src);
        assert!(interp.ms.is_empty(), "{:?}", messages(&interp));
        assert_eq!(
            vec!["SAT".to_string(), "A: true".to_string(), "B: true".to_string()],
            interp.output().to_vec()
        );
    }

    #[test]
    fn test_unsat_has_no_model() {
        let src = "\
            (declare-const A Bool)\n\
            (assert A)\n\
            (assert (not A))\n\
            (check-sat)\n\
            (get-model)\n";
        let interp = run(src);
        assert_eq!(vec!["UNSAT".to_string()], interp.output().to_vec());
        assert_eq!(
            vec!["(5, 2): model not available".to_string()],
            messages(&interp)
        );
    }

    #[test]
    fn test_get_model_before_check_sat() {
        let interp = run("(get-model)");
        assert_eq!(
            vec!["(1, 2): model not available".to_string()],
            messages(&interp)
        );
    }

    #[test]
    fn test_simplify_output() {
        let src = "\
            (declare-const A Bool)\n\
            (declare-const B Bool)\n\
            (simplify (=> A B))\n";
        let interp = run(src);
        assert!(interp.ms.is_empty(), "{:?}", messages(&interp));
        assert_eq!(vec!["(or (not A) B)".to_string()], interp.output().to_vec());
    }
}
