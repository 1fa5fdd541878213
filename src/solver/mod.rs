// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! CDCL satisfiability solving over boolean terms.
//!
//! [Model] bridges the term world and the expression-free core in [sat]:
//! it converts an assertion to CNF, numbers the atoms by frequency, and
//! runs the solve loop. Boolean constants never reach the core; a formula
//! that reduces to a constant is decided here.

pub mod sat;

use std::cmp::{Ordering, Reverse};
use std::fmt;

use fxhash::FxHashMap;

use crate::solver::sat::{Assignment, Lit, Var};
use crate::syntax::{Sort, Symbol, Term, TermPool};
use crate::term::cnf::to_cnf;

/// The verdict of a solver run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// A satisfying assignment was found.
    Sat,
    /// The asserted formula has no models.
    Unsat,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(match self {
            Status::Sat => "SAT",
            Status::Unsat => "UNSAT",
        })
    }
}

/// A solver instance for one asserted formula.
pub struct Model {
    /// Canonical atom orientation to SAT variable.
    vars: FxHashMap<Term, Var>,
    assignment: Assignment,
    status: Option<Status>,
}

impl Model {
    /// Builds a model for `assertion`, which must be boolean.
    pub fn new(pool: &mut TermPool, assertion: Term) -> Model {
        debug_assert_eq!(Sort::Bool, pool.sort(assertion));
        let cnf = to_cnf(pool, assertion);
        if let Symbol::BoolConst(value) = pool.symbol(cnf) {
            return Model {
                vars: FxHashMap::default(),
                assignment: Assignment::new(0),
                status: Some(if value { Status::Sat } else { Status::Unsat }),
            };
        }

        let conjuncts: Vec<Term> = if pool.symbol(cnf) == Symbol::And {
            pool.args(cnf).to_vec()
        } else {
            vec![cnf]
        };

        // atoms in canonical orientation, counted across all clauses
        let mut atoms: Vec<Term> = Vec::new();
        let mut counts: FxHashMap<Term, usize> = FxHashMap::default();
        let mut clauses: Vec<Vec<(Term, bool)>> = Vec::new();
        for clause in conjuncts {
            let terms: Vec<Term> = if pool.symbol(clause) == Symbol::Or {
                pool.args(clause).to_vec()
            } else {
                vec![clause]
            };
            let mut shaped = Vec::with_capacity(terms.len());
            for e in terms {
                debug_assert!(!matches!(pool.symbol(e), Symbol::And | Symbol::Or));
                let canonical = canonical_orientation(pool, e);
                if !counts.contains_key(&canonical) {
                    atoms.push(canonical);
                }
                *counts.entry(canonical).or_insert(0) += 1;
                shaped.push((canonical, canonical != e));
            }
            clauses.push(shaped);
        }

        // frequent atoms get small variable numbers; the sort is stable, so
        // ties keep their first-occurrence order
        atoms.sort_by_key(|t| Reverse(counts[t]));
        let vars: FxHashMap<Term, Var> = atoms
            .iter()
            .enumerate()
            .map(|(i, &t)| (t, Var(i as u32 + 1)))
            .collect();

        let mut assignment = Assignment::new(atoms.len());
        for shaped in clauses {
            let lits: Vec<Lit> = shaped
                .into_iter()
                .map(|(t, negated)| Lit::new(vars[&t], negated))
                .collect();
            assignment.add_clause(&lits);
        }
        Model {
            vars,
            assignment,
            status: None,
        }
    }

    /// The verdict of the last [Model::solve] call, if any.
    pub fn status(&self) -> Option<Status> {
        self.status
    }

    /// Runs the CDCL loop to a verdict. Idempotent.
    pub fn solve(&mut self) -> Status {
        if let Some(status) = self.status {
            return status;
        }
        let status = self.run();
        log::debug!("verdict: {status}");
        self.status = Some(status);
        status
    }

    fn run(&mut self) -> Status {
        let a = &mut self.assignment;
        loop {
            while let Some(clause) = a.propagate() {
                if a.is_conflict(clause) {
                    let literals = a.analyze(clause);
                    log::debug!("learnt a clause of {} literals", literals.len());
                    let x = literals[0];
                    if literals.len() == 1 {
                        if a.link(x) == a.sentinel() {
                            return Status::Unsat;
                        }
                        let first = a.link(a.sentinel());
                        if first != a.sentinel() {
                            a.backtrack(first);
                        }
                    } else {
                        let y = literals[1];
                        let target = if a.antecedent(y).is_none() {
                            a.link(y)
                        } else {
                            let chained = a.link(y);
                            a.link(chained)
                        };
                        debug_assert_ne!(a.sentinel(), target);
                        a.backtrack(target);
                    }
                    let learnt = a.add_clause(&literals);
                    a.imply(x.negated(), learnt);
                } else if let Some(z) = a.derive(clause) {
                    a.imply(z.negated(), clause);
                }
            }
            match a.next_free() {
                Some(d) => a.decide(d),
                None => return Status::Sat,
            }
        }
    }

    /// The value of a boolean variable term in the found assignment, as a
    /// constant term. `None` when the atom does not occur in the formula or
    /// was never placed.
    pub fn eval(&self, pool: &mut TermPool, t: Term) -> Option<Term> {
        debug_assert_eq!(Sort::Bool, pool.sort(t));
        let canonical = canonical_orientation(pool, t);
        let var = *self.vars.get(&canonical)?;
        let lit = Lit::new(var, canonical != t);
        let value = self.assignment.value(lit)?;
        Some(pool.bool_const(value))
    }
}

/// The smaller of a literal term and its negation; both orientations of an
/// atom share one SAT variable keyed on this.
fn canonical_orientation(pool: &mut TermPool, t: Term) -> Term {
    let neg = pool.negated(t);
    match pool.cmp_terms(t, neg) {
        Ordering::Less => t,
        _ => neg,
    }
}
