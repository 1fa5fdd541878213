// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Bottom-up traversals over the term DAG.
//!
//! Terms share structure, so every traversal visits each distinct node
//! exactly once, children before parents.

use fxhash::FxHashMap;

use crate::syntax::{Term, TermPool};

/// Visits every node reachable from `t` once, in post-order.
pub fn post_order(pool: &TermPool, t: Term, mut visit: impl FnMut(Term)) {
    // tri-state: absent = unseen, false = expanded, true = visited
    let mut state: FxHashMap<Term, bool> = FxHashMap::default();
    let mut stack = vec![t];
    while let Some(&e) = stack.last() {
        match state.get(&e) {
            None => {
                state.insert(e, false);
                for &a in pool.args(e).iter().rev() {
                    if !state.contains_key(&a) {
                        stack.push(a);
                    }
                }
            }
            Some(false) => {
                state.insert(e, true);
                stack.pop();
                visit(e);
            }
            Some(true) => {
                stack.pop();
            }
        }
    }
}

/// The nodes reachable from `t` in post-order.
pub fn post_order_nodes(pool: &TermPool, t: Term) -> Vec<Term> {
    let mut nodes = Vec::new();
    post_order(pool, t, |e| nodes.push(e));
    nodes
}

/// Computes a value per node from the values of its arguments.
pub fn fold<E: Clone>(
    pool: &TermPool,
    t: Term,
    mut f: impl FnMut(&TermPool, Term, &[E]) -> E,
) -> E {
    let mut values: FxHashMap<Term, E> = FxHashMap::default();
    for e in post_order_nodes(pool, t) {
        let args: Vec<E> = pool.args(e).iter().map(|a| values[a].clone()).collect();
        let value = f(pool, e, &args);
        values.insert(e, value);
    }
    values.remove(&t).unwrap()
}

/// Rebuilds `t` bottom-up. The callback sees each original node together
/// with its already-rebuilt arguments; wrapper applications are rebuilt
/// verbatim without consulting the callback.
pub fn transform(
    pool: &mut TermPool,
    t: Term,
    mut f: impl FnMut(&mut TermPool, Term, &[Term]) -> Term,
) -> Term {
    let order = post_order_nodes(pool, t);
    let mut rebuilt: FxHashMap<Term, Term> = FxHashMap::default();
    for e in order {
        let new_args: Vec<Term> = pool.args(e).iter().map(|a| rebuilt[a]).collect();
        let symbol = pool.symbol(e);
        let w = if pool.is_valency(symbol) {
            f(pool, e, &new_args)
        } else {
            pool.intern(symbol, new_args)
        };
        rebuilt.insert(e, w);
    }
    rebuilt[&t]
}

/// Replaces mapped nodes by their images. Images are not substituted into
/// again, so `{f -> u, u -> z}` rewrites `f` to `u`, not to `z`.
pub fn substitute(pool: &mut TermPool, t: Term, table: &FxHashMap<Term, Term>) -> Term {
    transform(pool, t, |pool, e, args| match table.get(&e) {
        Some(&image) => image,
        None => {
            let symbol = pool.symbol(e);
            pool.apply(symbol, args)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::Sort;

    #[test]
    fn test_post_order_visits_once() {
        let mut p = TermPool::new();
        let f = p.fresh_fun(Sort::Bool, vec![Sort::Bool]);
        let a = p.fresh_var(Sort::Bool);
        let ea = p.apply(a, &[]);
        let fa = p.apply(f, &[ea]);
        let ffa = p.apply(f, &[fa]);
        let e = p.and(&[fa, ffa]);

        let nodes = post_order_nodes(&p, e);
        assert_eq!(vec![ea, fa, ffa, e], nodes);
    }

    #[test]
    fn test_fold_shares_work() {
        let mut p = TermPool::new();
        let f = p.fresh_fun(Sort::Bool, vec![Sort::Bool]);
        let a = p.fresh_var(Sort::Bool);
        let ea = p.apply(a, &[]);
        let fa = p.apply(f, &[ea]);
        let g = p.apply(f, &[fa]);
        let e = p.or(&[fa, g]);

        let mut count = 0;
        let depth = fold(&p, e, |_, _, args: &[u32]| {
            count += 1;
            1 + args.iter().copied().max().unwrap_or(0)
        });
        assert_eq!(4, count); // ea, fa, g, e
        assert_eq!(4, depth);
    }

    #[test]
    fn test_substitute_does_not_chain() {
        let mut p = TermPool::new();
        let b = p.fresh_fun(Sort::Bool, vec![Sort::Bool, Sort::Bool]);
        let mk = |p: &mut TermPool| {
            let v = p.fresh_var(Sort::Bool);
            p.apply(v, &[])
        };
        let (f, u, v, z) = (mk(&mut p), mk(&mut p), mk(&mut p), mk(&mut p));
        let e = p.apply(b, &[f, u]);
        let e = {
            let inner = p.apply(b, &[u, v]);
            p.apply(b, &[e, inner])
        };

        let mut table = FxHashMap::default();
        table.insert(f, u);
        table.insert(u, z);
        let r = substitute(&mut p, e, &table);

        let left = p.apply(b, &[u, z]);
        let right = p.apply(b, &[z, v]);
        assert_eq!(p.apply(b, &[left, right]), r);
    }
}
