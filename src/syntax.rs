// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Sorts, symbols, and hash-consed terms.
//!
//! All terms live in a [TermPool]; structurally identical applications are
//! interned to the same [Term] id, so equality is id comparison. Applying a
//! symbol with [TermPool::apply] checks argument sorts and runs the symbol's
//! reduction rules eagerly, so the pool only ever holds canonical terms:
//! connectives and sums are flattened, sorted, and simplified, implications
//! and differences are rewritten away, and negation is pushed inward where a
//! rule exists. Ill-sorted applications are not errors; they are rebuilt
//! under a fresh wrapper symbol and poison enclosing terms through
//! [TermPool::has_wrappers].

use std::cmp::Ordering;

use fxhash::{FxHashMap, FxHashSet};

use crate::term::subst::substitute;

/// The sorts of the language. `Unknown` is the sort of ill-formed terms and
/// passes every argument-sort check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Sort {
    /// Sort of wrapper terms; unifies with anything.
    Unknown,
    /// Booleans.
    Bool,
    /// Integers.
    Int,
}

/// Id of a declared variable; sorts live in the pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VarId(u32);

/// Id of a declared uninterpreted function.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FunId(u32);

/// Id of a defined macro.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MacroId(u32);

/// Id of a wrapper symbol. Wrappers are fresh per creation and never
/// compare equal to each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct WrapperId(u32);

/// A function or constant symbol. Small and `Copy`; per-id payload (sorts,
/// macro bodies, wrapped symbols) lives in the [TermPool] side tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Symbol {
    /// Negation for a given sort.
    Not(Sort),
    /// `true` / `false`.
    BoolConst(bool),
    /// An integer literal.
    IntConst(i64),
    /// A Tseitin variable, keyed by the term it names.
    Tseitin(Term),
    /// A declared variable.
    Var(VarId),
    /// A declared uninterpreted function.
    Fun(FunId),
    /// A defined macro.
    Macro(MacroId),
    /// Disjunction (associative-commutative, neutral element `false`).
    Or,
    /// Conjunction (associative-commutative, neutral element `true`).
    And,
    /// Implication; always rewrites to a disjunction.
    Implies,
    /// Boolean equality; always rewrites to connectives.
    BoolEq,
    /// Exclusive or; always rewrites to connectives.
    Xor,
    /// Integer difference; always rewrites to a sum.
    IntDiff,
    /// Integer equality.
    IntEq,
    /// Integer sum (associative-commutative).
    IntSum,
    /// Placeholder for an ill-sorted application.
    Wrapper(WrapperId),
}

/// A hash-consed term; an index into a [TermPool].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Term(u32);

#[derive(Debug)]
struct TermData {
    symbol: Symbol,
    args: Box<[Term]>,
    has_wrappers: bool,
}

#[derive(Debug)]
struct FunDecl {
    sort: Sort,
    args: Vec<Sort>,
}

#[derive(Debug)]
struct MacroDef {
    sort: Sort,
    formals: Vec<VarId>,
    body: Term,
}

/// Arena and interning tables for terms and declared symbols.
#[derive(Debug, Default)]
pub struct TermPool {
    terms: Vec<TermData>,
    interned: FxHashMap<(Symbol, Box<[Term]>), Term>,
    neg: FxHashMap<Term, Term>,
    vars: Vec<Sort>,
    funs: Vec<FunDecl>,
    macros: Vec<MacroDef>,
    wrappers: Vec<Option<Symbol>>,
}

impl TermPool {
    /// An empty pool.
    pub fn new() -> TermPool {
        TermPool::default()
    }

    /// The symbol at the root of `t`.
    pub fn symbol(&self, t: Term) -> Symbol {
        self.terms[t.0 as usize].symbol
    }

    /// The arguments of `t`.
    pub fn args(&self, t: Term) -> &[Term] {
        &self.terms[t.0 as usize].args
    }

    /// Whether `t` contains a wrapper symbol anywhere.
    pub fn has_wrappers(&self, t: Term) -> bool {
        self.terms[t.0 as usize].has_wrappers
    }

    /// The sort of `t`.
    pub fn sort(&self, t: Term) -> Sort {
        self.sort_of(self.symbol(t))
    }

    /// The result sort of `symbol`.
    pub fn sort_of(&self, symbol: Symbol) -> Sort {
        match symbol {
            Symbol::Not(sort) => sort,
            Symbol::BoolConst(_)
            | Symbol::Tseitin(_)
            | Symbol::Or
            | Symbol::And
            | Symbol::Implies
            | Symbol::BoolEq
            | Symbol::Xor
            | Symbol::IntEq => Sort::Bool,
            Symbol::IntConst(_) | Symbol::IntDiff | Symbol::IntSum => Sort::Int,
            Symbol::Var(v) => self.vars[v.0 as usize],
            Symbol::Fun(f) => self.funs[f.0 as usize].sort,
            Symbol::Macro(m) => self.macros[m.0 as usize].sort,
            Symbol::Wrapper(w) => match self.wrappers[w.0 as usize] {
                Some(inner) => self.sort_of(inner),
                None => Sort::Unknown,
            },
        }
    }

    /// Whether `symbol` takes part in valency checking and reduction.
    pub fn is_valency(&self, symbol: Symbol) -> bool {
        !matches!(symbol, Symbol::Wrapper(_))
    }

    /// The formal sort of argument `index`, or `None` past the last formal.
    /// For variadic symbols `present` tells whether an actual argument
    /// exists at that index; the first argument is required either way.
    pub fn arg_sort(&self, symbol: Symbol, index: usize, present: bool) -> Option<Sort> {
        match symbol {
            Symbol::BoolConst(_) | Symbol::IntConst(_) | Symbol::Var(_) | Symbol::Tseitin(_) => {
                None
            }
            Symbol::Not(sort) => (index == 0).then_some(sort),
            Symbol::Implies => (index < 2).then_some(Sort::Bool),
            Symbol::IntDiff => (index < 2).then_some(Sort::Int),
            Symbol::And | Symbol::Or | Symbol::BoolEq | Symbol::Xor => {
                (index == 0 || present).then_some(Sort::Bool)
            }
            Symbol::IntEq | Symbol::IntSum => (index == 0 || present).then_some(Sort::Int),
            Symbol::Fun(f) => self.funs[f.0 as usize].args.get(index).copied(),
            Symbol::Macro(m) => {
                let def = &self.macros[m.0 as usize];
                def.formals.get(index).map(|&v| self.vars[v.0 as usize])
            }
            Symbol::Wrapper(_) => None,
        }
    }

    /// Whether actual argument sorts fit the symbol's formals. `Unknown`
    /// actuals fit anything; a missing formal past the end rejects.
    pub fn check_args(&self, symbol: Symbol, sorts: &[Sort]) -> bool {
        for (index, &sort) in sorts.iter().enumerate() {
            if sort != Sort::Unknown && self.arg_sort(symbol, index, true) != Some(sort) {
                return false;
            }
        }
        self.arg_sort(symbol, sorts.len(), false).is_none()
    }

    /// A fresh variable symbol of the given sort.
    pub fn fresh_var(&mut self, sort: Sort) -> Symbol {
        let id = VarId(self.vars.len() as u32);
        self.vars.push(sort);
        Symbol::Var(id)
    }

    /// A fresh uninterpreted function symbol.
    pub fn fresh_fun(&mut self, sort: Sort, args: Vec<Sort>) -> Symbol {
        let id = FunId(self.funs.len() as u32);
        self.funs.push(FunDecl { sort, args });
        Symbol::Fun(id)
    }

    /// A macro symbol with the given formal variables and body.
    pub fn define_macro(&mut self, sort: Sort, formals: &[Symbol], body: Term) -> Symbol {
        let formals = formals
            .iter()
            .map(|&s| match s {
                Symbol::Var(v) => v,
                _ => panic!("macro formal is not a variable"),
            })
            .collect();
        let id = MacroId(self.macros.len() as u32);
        self.macros.push(MacroDef {
            sort,
            formals,
            body,
        });
        Symbol::Macro(id)
    }

    /// A fresh wrapper symbol, optionally remembering the symbol whose
    /// application failed.
    pub fn fresh_wrapper(&mut self, wrapped: Option<Symbol>) -> Symbol {
        let id = WrapperId(self.wrappers.len() as u32);
        self.wrappers.push(wrapped);
        Symbol::Wrapper(id)
    }

    /// Interns an application as-is, without checks or reduction.
    pub(crate) fn intern(&mut self, symbol: Symbol, args: Vec<Term>) -> Term {
        let key = (symbol, args.into_boxed_slice());
        if let Some(&t) = self.interned.get(&key) {
            return t;
        }
        let has_wrappers = matches!(symbol, Symbol::Wrapper(_))
            || key.1.iter().any(|&a| self.has_wrappers(a));
        let t = Term(self.terms.len() as u32);
        self.terms.push(TermData {
            symbol,
            args: key.1.clone(),
            has_wrappers,
        });
        self.interned.insert(key, t);
        t
    }

    /// Applies `symbol` to `args`: sort-checks, reduces, interns.
    pub fn apply(&mut self, symbol: Symbol, args: &[Term]) -> Term {
        if let Symbol::Wrapper(_) = symbol {
            return self.intern(symbol, args.to_vec());
        }
        let sorts: Vec<Sort> = args.iter().map(|&a| self.sort(a)).collect();
        if !self.check_args(symbol, &sorts) {
            let wrapper = self.fresh_wrapper(Some(symbol));
            return self.intern(wrapper, args.to_vec());
        }
        match self.reduce(symbol, args) {
            Some(t) => t,
            None => self.intern(symbol, args.to_vec()),
        }
    }

    /// The negation of `t`. Involutive; memoized.
    pub fn negated(&mut self, t: Term) -> Term {
        if let Some(&n) = self.neg.get(&t) {
            return n;
        }
        let negator = Symbol::Not(self.sort(t));
        let n = self.negate_or_wrap(negator, t);
        self.neg.insert(t, n);
        n
    }

    fn negate_or_wrap(&mut self, negator: Symbol, t: Term) -> Term {
        match self.negate_rule(t) {
            Some(n) => n,
            None => self.intern(negator, vec![t]),
        }
    }

    fn negate_rule(&mut self, t: Term) -> Option<Term> {
        match self.symbol(t) {
            Symbol::Not(_) => Some(self.args(t)[0]),
            Symbol::BoolConst(b) => Some(self.bool_const(!b)),
            Symbol::IntConst(v) => v.checked_neg().map(|n| self.int_const(n)),
            Symbol::And => {
                let negs = self.negated_args(t);
                Some(self.or(&negs))
            }
            Symbol::Or => {
                let negs = self.negated_args(t);
                Some(self.and(&negs))
            }
            Symbol::IntSum => {
                let negs = self.negated_args(t);
                Some(self.int_sum(&negs))
            }
            _ => None,
        }
    }

    fn negated_args(&mut self, t: Term) -> Vec<Term> {
        let args: Vec<Term> = self.args(t).to_vec();
        args.into_iter().map(|a| self.negated(a)).collect()
    }

    fn reduce(&mut self, symbol: Symbol, args: &[Term]) -> Option<Term> {
        match symbol {
            Symbol::Not(_) => Some(self.negate_or_wrap(symbol, args[0])),
            Symbol::Implies => {
                let na = self.negated(args[0]);
                Some(self.or(&[na, args[1]]))
            }
            Symbol::BoolEq => Some(self.reduce_bool_eq(args)),
            Symbol::Xor => {
                let any = self.or(args);
                let all = self.and(args);
                let not_all = self.negated(all);
                Some(self.and(&[any, not_all]))
            }
            Symbol::IntDiff => {
                let nb = self.negated(args[1]);
                Some(self.int_sum(&[args[0], nb]))
            }
            Symbol::IntEq => self.reduce_int_eq(args),
            Symbol::And | Symbol::Or | Symbol::IntSum => Some(self.reduce_ac(symbol, args)),
            Symbol::Macro(m) => self.reduce_macro(m, args),
            _ => None,
        }
    }

    fn reduce_bool_eq(&mut self, args: &[Term]) -> Term {
        let mut es = dedup(args);
        if es.len() == 1 {
            return self.bool_const(true);
        }
        es.sort_by(|&a, &b| self.cmp_terms(a, b));
        if es.len() == 2 {
            let (a, b) = (es[0], es[1]);
            let na = self.negated(a);
            let nb = self.negated(b);
            let fwd = self.or(&[na, b]);
            let bwd = self.or(&[a, nb]);
            return self.and(&[fwd, bwd]);
        }
        let links: Vec<Term> = es
            .windows(2)
            .map(|w| {
                let pair = [w[0], w[1]];
                self.bool_eq(&pair)
            })
            .collect();
        self.and(&links)
    }

    fn reduce_int_eq(&mut self, args: &[Term]) -> Option<Term> {
        let es = dedup(args);
        if es.len() == 1 {
            return Some(self.bool_const(true));
        }
        if es.iter().any(|&e| self.symbol(e) == Symbol::IntSum) {
            let sums: Vec<FxHashSet<Term>> = es
                .iter()
                .map(|&e| {
                    if self.symbol(e) == Symbol::IntSum {
                        self.args(e).iter().copied().collect()
                    } else {
                        std::iter::once(e).collect()
                    }
                })
                .collect();
            let mut common = sums[0].clone();
            for s in &sums[1..] {
                common.retain(|t| s.contains(t));
            }
            if !common.is_empty() {
                let mut new_args = Vec::with_capacity(sums.len());
                for s in &sums {
                    let mut rest: Vec<Term> =
                        s.iter().copied().filter(|t| !common.contains(t)).collect();
                    rest.sort_by(|&a, &b| self.cmp_terms(a, b));
                    let side = match rest.len() {
                        0 => self.int_const(0),
                        1 => rest[0],
                        _ => self.int_sum(&rest),
                    };
                    new_args.push(side);
                }
                return Some(self.int_eq(&new_args));
            }
        }
        let unsorted = args
            .windows(2)
            .any(|w| self.cmp_terms(w[0], w[1]) == Ordering::Greater);
        if es.len() < args.len() || unsorted {
            let mut sorted = es;
            sorted.sort_by(|&a, &b| self.cmp_terms(a, b));
            return Some(self.int_eq(&sorted));
        }
        None
    }

    fn reduce_macro(&mut self, m: MacroId, args: &[Term]) -> Option<Term> {
        let (sort, body, formals) = {
            let def = &self.macros[m.0 as usize];
            (def.sort, def.body, def.formals.clone())
        };
        let body_symbol = self.symbol(body);
        if !self.is_valency(body_symbol) || self.sort_of(body_symbol) != sort {
            return None;
        }
        let mut table = FxHashMap::default();
        for (&v, &a) in formals.iter().zip(args) {
            let formal = self.apply(Symbol::Var(v), &[]);
            table.insert(formal, a);
        }
        Some(substitute(self, body, &table))
    }

    /// Flatten-and-pair reduction for associative-commutative symbols.
    /// Nested applications of the same symbol flatten into a multiset of
    /// arguments (duplicates keep their multiplicity), pairs reduce to a
    /// fixpoint, and the survivors come out sorted.
    fn reduce_ac(&mut self, symbol: Symbol, args: &[Term]) -> Term {
        let mut index_to_term: Vec<Term> = Vec::new();
        let mut res = self.ac_flatten(symbol, args, &mut index_to_term);
        let all: Vec<usize> = res.iter().copied().collect();
        let mut tasks: Vec<(Vec<usize>, Vec<usize>)> = vec![(all.clone(), all)];
        while let Some((first, second)) = tasks.pop() {
            let mut second_list: Vec<usize> =
                second.iter().copied().filter(|i| res.contains(i)).collect();
            let mut created: FxHashSet<usize> = FxHashSet::default();
            for &a in &first {
                if !res.contains(&a) {
                    continue;
                }
                for j in 0..second_list.len() {
                    let b = second_list[j];
                    if a == b || !res.contains(&b) {
                        continue;
                    }
                    if let Some(c) = self.ac_binary(symbol, index_to_term[a], index_to_term[b]) {
                        res.remove(&a);
                        res.remove(&b);
                        created.extend(self.ac_flatten(symbol, &[c], &mut index_to_term));
                        second_list.swap_remove(j);
                        break;
                    }
                }
            }
            if !created.is_empty() {
                let survivors: Vec<usize> = res.iter().copied().collect();
                let fresh: Vec<usize> = created.iter().copied().collect();
                tasks.push((survivors.clone(), fresh.clone()));
                tasks.push((fresh.clone(), survivors));
                tasks.push((fresh.clone(), fresh));
                res.extend(created);
            }
        }
        let mut new_args: Vec<Term> = res.iter().map(|&i| index_to_term[i]).collect();
        new_args.sort_by(|&a, &b| self.cmp_terms(a, b));
        if new_args.len() == 1 && self.is_valency(self.symbol(new_args[0])) {
            new_args[0]
        } else {
            self.intern(symbol, new_args)
        }
    }

    fn ac_flatten(
        &self,
        symbol: Symbol,
        items: &[Term],
        index_to_term: &mut Vec<Term>,
    ) -> FxHashSet<usize> {
        let mut dest = FxHashSet::default();
        let mut stack: Vec<Term> = items.to_vec();
        while let Some(t) = stack.pop() {
            if self.symbol(t) == symbol {
                stack.extend(self.args(t).iter().copied());
            } else {
                dest.insert(index_to_term.len());
                index_to_term.push(t);
            }
        }
        dest
    }

    fn ac_binary(&mut self, symbol: Symbol, a: Term, b: Term) -> Option<Term> {
        match symbol {
            Symbol::And | Symbol::Or => self.connective_binary(symbol, a, b),
            Symbol::IntSum => self.sum_binary(a, b),
            _ => unreachable!("not an associative-commutative symbol"),
        }
    }

    fn connective_binary(&mut self, symbol: Symbol, a: Term, b: Term) -> Option<Term> {
        let neutral = symbol == Symbol::And;
        let zero = self.bool_const(neutral);
        let one = self.bool_const(!neutral);
        if a == b {
            return Some(a);
        }
        let na = self.negated(a);
        if na == b {
            return Some(one);
        }
        if a == zero {
            return Some(b);
        }
        if a == one {
            return Some(a);
        }

        let opposite = if symbol == Symbol::And {
            Symbol::Or
        } else {
            Symbol::And
        };
        if self.symbol(b) == opposite {
            let b_args: FxHashSet<Term> = self.args(b).iter().copied().collect();
            if b_args.contains(&na) {
                // unit "resolution": b collapses to its other branches
                let mut rest: Vec<Term> =
                    b_args.iter().copied().filter(|&t| t != na).collect();
                rest.sort_by(|&x, &y| self.cmp_terms(x, y));
                let shrunk = self.apply(opposite, &rest);
                return Some(self.apply(symbol, &[a, shrunk]));
            }
            let a_args: FxHashSet<Term> = if self.symbol(a) == opposite {
                self.args(a).iter().copied().collect()
            } else {
                std::iter::once(a).collect()
            };
            if a_args.is_subset(&b_args) {
                return Some(a);
            }
            let common: FxHashSet<Term> = a_args.intersection(&b_args).copied().collect();
            if !common.is_empty() {
                let a_rest = self.apply_sorted(opposite, &a_args, &common);
                let b_rest = self.apply_sorted(opposite, &b_args, &common);
                if a_rest == self.negated(b_rest) {
                    let mut kept: Vec<Term> = common.iter().copied().collect();
                    kept.sort_by(|&x, &y| self.cmp_terms(x, y));
                    return Some(self.apply(opposite, &kept));
                }
            }
        }
        None
    }

    fn apply_sorted(
        &mut self,
        symbol: Symbol,
        items: &FxHashSet<Term>,
        without: &FxHashSet<Term>,
    ) -> Term {
        let mut rest: Vec<Term> = items
            .iter()
            .copied()
            .filter(|t| !without.contains(t))
            .collect();
        rest.sort_by(|&x, &y| self.cmp_terms(x, y));
        self.apply(symbol, &rest)
    }

    fn sum_binary(&mut self, a: Term, b: Term) -> Option<Term> {
        let nb = self.negated(b);
        if a == nb {
            return Some(self.int_const(0));
        }
        let zero = self.int_const(0);
        if a == zero {
            return Some(b);
        }
        if let (Symbol::IntConst(x), Symbol::IntConst(y)) = (self.symbol(a), self.symbol(b)) {
            if let Some(z) = x.checked_add(y) {
                return Some(self.int_const(z));
            }
        }
        None
    }

    // ------------------------------------------------------------------
    // smart constructors

    /// `true` or `false`.
    pub fn bool_const(&mut self, value: bool) -> Term {
        self.apply(Symbol::BoolConst(value), &[])
    }

    /// An integer literal.
    pub fn int_const(&mut self, value: i64) -> Term {
        self.apply(Symbol::IntConst(value), &[])
    }

    /// Canonical conjunction of `args`.
    pub fn and(&mut self, args: &[Term]) -> Term {
        self.apply(Symbol::And, args)
    }

    /// Canonical disjunction of `args`.
    pub fn or(&mut self, args: &[Term]) -> Term {
        self.apply(Symbol::Or, args)
    }

    /// `a => b`, rewritten to a disjunction.
    pub fn implies(&mut self, a: Term, b: Term) -> Term {
        self.apply(Symbol::Implies, &[a, b])
    }

    /// Boolean equality over `args`, rewritten to connectives.
    pub fn bool_eq(&mut self, args: &[Term]) -> Term {
        self.apply(Symbol::BoolEq, args)
    }

    /// Integer equality over `args`.
    pub fn int_eq(&mut self, args: &[Term]) -> Term {
        self.apply(Symbol::IntEq, args)
    }

    /// Canonical sum of `args`.
    pub fn int_sum(&mut self, args: &[Term]) -> Term {
        self.apply(Symbol::IntSum, args)
    }

    /// `a - b`, rewritten to a sum.
    pub fn int_diff(&mut self, a: Term, b: Term) -> Term {
        self.apply(Symbol::IntDiff, &[a, b])
    }

    /// The Tseitin variable naming `t`.
    pub fn tseitin(&mut self, t: Term) -> Term {
        debug_assert_eq!(Sort::Bool, self.sort(t));
        self.apply(Symbol::Tseitin(t), &[])
    }

    // ------------------------------------------------------------------
    // the global term order

    /// Total order on terms: by symbol, then lexicographically by args.
    /// Canonical argument sorting and clause-literal sorting use this.
    pub fn cmp_terms(&self, a: Term, b: Term) -> Ordering {
        if a == b {
            return Ordering::Equal;
        }
        let by_symbol = self.cmp_symbols(self.symbol(a), self.symbol(b));
        if by_symbol != Ordering::Equal {
            return by_symbol;
        }
        let (aa, ba) = (self.args(a), self.args(b));
        for (&x, &y) in aa.iter().zip(ba.iter()) {
            let o = self.cmp_terms(x, y);
            if o != Ordering::Equal {
                return o;
            }
        }
        aa.len().cmp(&ba.len())
    }

    /// Total order on symbols: negators, constants, variables, functions,
    /// macros, then compound symbol classes, with per-class payloads.
    pub fn cmp_symbols(&self, a: Symbol, b: Symbol) -> Ordering {
        fn rank(s: Symbol) -> (u8, u8) {
            match s {
                Symbol::Not(_) => (0, 0),
                Symbol::BoolConst(_) => (1, 0),
                Symbol::IntConst(_) => (1, 1),
                Symbol::Tseitin(_) => (2, 0),
                Symbol::Var(_) => (2, 1),
                Symbol::Fun(_) => (3, 0),
                Symbol::Macro(_) => (4, 0),
                Symbol::Or | Symbol::And => (5, 0),
                Symbol::BoolEq => (5, 1),
                Symbol::Implies => (5, 2),
                Symbol::Xor => (5, 3),
                Symbol::IntDiff => (5, 4),
                Symbol::IntEq => (5, 5),
                Symbol::IntSum => (5, 6),
                Symbol::Wrapper(_) => (5, 7),
            }
        }
        rank(a).cmp(&rank(b)).then_with(|| match (a, b) {
            (Symbol::Not(x), Symbol::Not(y)) => x.cmp(&y),
            (Symbol::BoolConst(x), Symbol::BoolConst(y)) => x.cmp(&y),
            (Symbol::IntConst(x), Symbol::IntConst(y)) => x.cmp(&y),
            (Symbol::Tseitin(x), Symbol::Tseitin(y)) => self.cmp_terms(x, y),
            (Symbol::Var(x), Symbol::Var(y)) => x.cmp(&y),
            (Symbol::Fun(x), Symbol::Fun(y)) => x.cmp(&y),
            (Symbol::Macro(x), Symbol::Macro(y)) => x.cmp(&y),
            (Symbol::Wrapper(x), Symbol::Wrapper(y)) => x.cmp(&y),
            (Symbol::Or, Symbol::And) => Ordering::Less,
            (Symbol::And, Symbol::Or) => Ordering::Greater,
            _ => Ordering::Equal,
        })
    }
}

/// First occurrences of each term, in order.
fn dedup(args: &[Term]) -> Vec<Term> {
    let mut seen = FxHashSet::default();
    args.iter().copied().filter(|&a| seen.insert(a)).collect()
}
