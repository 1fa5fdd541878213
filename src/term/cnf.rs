// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Tseitin conversion to conjunctive normal form.

use fxhash::FxHashSet;

use crate::syntax::{Sort, Symbol, Term, TermPool};
use crate::term::subst::transform;

/// Converts a boolean term to CNF.
///
/// Every symbol is re-applied bottom-up; a conjunction or disjunction that
/// survives reduction strictly below the root is replaced by its Tseitin
/// variable, whose defining implications join the result. The root
/// connective is kept as-is, so the result is a conjunction of clauses over
/// atoms and Tseitin variables.
pub fn to_cnf(pool: &mut TermPool, t: Term) -> Term {
    debug_assert_eq!(Sort::Bool, pool.sort(t));
    let mut eqs: FxHashSet<Term> = FxHashSet::default();
    let root = t;
    let rebuilt = transform(pool, t, |pool, e, args| {
        let symbol = pool.symbol(e);
        let w = pool.apply(symbol, args);
        let w_symbol = pool.symbol(w);
        if !matches!(w_symbol, Symbol::And | Symbol::Or) || e == root {
            return w;
        }
        let v = pool.tseitin(w);
        if w_symbol == Symbol::And {
            let all = pool.and(args);
            eqs.insert(pool.implies(all, v));
            for &a in args {
                let back = pool.implies(v, a);
                eqs.insert(back);
            }
        } else {
            let any = pool.or(args);
            eqs.insert(pool.implies(v, any));
            for &a in args {
                let fwd = pool.implies(a, v);
                eqs.insert(fwd);
            }
        }
        v
    });
    let mut items = vec![rebuilt];
    items.extend(eqs.iter().copied());
    pool.and(&items)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh_atom(p: &mut TermPool) -> Term {
        let v = p.fresh_var(Sort::Bool);
        p.apply(v, &[])
    }

    #[test]
    fn test_atom_is_untouched() {
        let mut p = TermPool::new();
        let a = fresh_atom(&mut p);
        assert_eq!(a, to_cnf(&mut p, a));
    }

    #[test]
    fn test_root_connective_survives() {
        let mut p = TermPool::new();
        let a = fresh_atom(&mut p);
        let b = fresh_atom(&mut p);
        let e = p.and(&[a, b]);
        assert_eq!(e, to_cnf(&mut p, e));
        let e = p.or(&[a, b]);
        assert_eq!(e, to_cnf(&mut p, e));
    }

    #[test]
    fn test_nested_connectives_get_names() {
        let mut p = TermPool::new();
        let atoms: Vec<Term> = (0..4).map(|_| fresh_atom(&mut p)).collect();
        let ab = p.and(&[atoms[0], atoms[1]]);
        let cd = p.and(&[atoms[2], atoms[3]]);
        let e = p.or(&[ab, cd]);

        let cnf = to_cnf(&mut p, e);
        assert_eq!(Symbol::And, p.symbol(cnf));
        // one clause over the two Tseitin variables plus three defining
        // clauses per named conjunction
        assert_eq!(7, p.args(cnf).len());

        let tau_ab = p.tseitin(ab);
        let tau_cd = p.tseitin(cd);
        let top = p.or(&[tau_ab, tau_cd]);
        assert!(p.args(cnf).contains(&top));
    }

    #[test]
    fn test_every_clause_is_flat() {
        let mut p = TermPool::new();
        let atoms: Vec<Term> = (0..4).map(|_| fresh_atom(&mut p)).collect();
        let ab = p.and(&[atoms[0], atoms[1]]);
        let cd = p.or(&[atoms[2], atoms[3]]);
        let e = p.or(&[ab, cd]);

        let cnf = to_cnf(&mut p, e);
        assert_eq!(Symbol::And, p.symbol(cnf));
        for &clause in p.args(cnf).to_vec().iter() {
            let lits: Vec<Term> = if p.symbol(clause) == Symbol::Or {
                p.args(clause).to_vec()
            } else {
                vec![clause]
            };
            for lit in lits {
                assert!(!matches!(p.symbol(lit), Symbol::And | Symbol::Or));
            }
        }
    }
}
