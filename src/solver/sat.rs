// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! The CDCL working state: trail, watches, clauses.
//!
//! The core is expression-free; [crate::solver::Model] maps terms to
//! variables. Variable 0 is a sentinel that anchors the decision chain and
//! never appears in clauses.
//!
//! Placing a literal records it as *false*: a decision falsifies the
//! default orientation of the next unassigned variable, and an implication
//! falsifies the negation of the literal a clause forces to be true. The
//! trail (`order`) holds placed literals before `border` and free defaults
//! after it.

use std::collections::BinaryHeap;

use fxhash::{FxHashMap, FxHashSet};

/// A SAT variable. Variable 0 is the sentinel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Var(pub u32);

/// A signed literal; the positive orientation is the variable's canonical
/// (default) one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Lit(u32);

impl Lit {
    /// The literal for `var` with the given orientation.
    pub fn new(var: Var, negated: bool) -> Lit {
        Lit(var.0 << 1 | negated as u32)
    }

    /// The variable of this literal.
    pub fn var(self) -> Var {
        Var(self.0 >> 1)
    }

    /// Whether this is the negated orientation.
    pub fn is_negated(self) -> bool {
        self.0 & 1 != 0
    }

    /// The opposite orientation.
    pub fn negated(self) -> Lit {
        Lit(self.0 ^ 1)
    }

    fn code(self) -> usize {
        self.0 as usize
    }
}

/// Index of an interned clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClauseId(u32);

/// One side of a clause's watched pair, kept in a literal's watch list.
#[derive(Debug, Clone, Copy)]
struct Watch {
    clause: ClauseId,
    side: usize,
}

#[derive(Debug)]
struct ClauseData {
    /// Literals in canonical (sorted) order.
    lits: Box<[Lit]>,
    /// Currently watched literals; both sides equal for a unit clause.
    watched: [Lit; 2],
}

/// Assignment trail, watch lists, and the clause store.
#[derive(Debug)]
pub struct Assignment {
    /// Trail: one slot per variable. Slots before `border` hold placed
    /// (falsified) literals; slots after it hold default orientations.
    order: Vec<Lit>,
    /// Per-variable index into `order`.
    position: Vec<usize>,
    /// Per-variable decision chaining (see module docs).
    link: Vec<Lit>,
    /// Per-variable clause that implied the placement, if any.
    antecedent: Vec<Option<ClauseId>>,
    border: usize,
    cursor: (usize, usize),
    top_decision: Lit,
    /// Watch lists indexed by literal code.
    watches: Vec<Vec<Watch>>,
    clauses: Vec<ClauseData>,
    interned: FxHashMap<Box<[Lit]>, ClauseId>,
}

impl Assignment {
    /// An empty assignment over `vars` user variables (1..=vars), plus the
    /// sentinel.
    pub fn new(vars: usize) -> Assignment {
        let n = vars + 1;
        let sentinel = Lit::new(Var(0), false);
        Assignment {
            order: (0..n).map(|v| Lit::new(Var(v as u32), false)).collect(),
            position: (0..n).collect(),
            link: vec![sentinel; n],
            antecedent: vec![None; n],
            border: 1,
            cursor: (1, 0),
            top_decision: sentinel,
            watches: vec![Vec::new(); 2 * n],
            clauses: Vec::new(),
            interned: FxHashMap::default(),
        }
    }

    /// The sentinel literal.
    pub fn sentinel(&self) -> Lit {
        Lit::new(Var(0), false)
    }

    /// `Some(value)` of a placed literal, `None` for a free one.
    pub fn value(&self, lit: Lit) -> Option<bool> {
        let index = self.position[lit.var().0 as usize];
        if index < self.border {
            Some(self.order[index] == lit.negated())
        } else {
            None
        }
    }

    /// The decision chain link of the literal's variable.
    pub fn link(&self, lit: Lit) -> Lit {
        self.link[lit.var().0 as usize]
    }

    /// The clause that implied the literal's variable, if any.
    pub fn antecedent(&self, lit: Lit) -> Option<ClauseId> {
        self.antecedent[lit.var().0 as usize]
    }

    /// Whether every variable is placed.
    pub fn complete(&self) -> bool {
        self.border == self.order.len()
    }

    /// The default orientation of the next free variable.
    pub fn next_free(&self) -> Option<Lit> {
        (!self.complete()).then(|| self.order[self.border])
    }

    /// Moves `lit` to the border slot and marks it placed (false).
    fn place(&mut self, lit: Lit) {
        debug_assert!(self.value(lit).is_none());
        let var = lit.var().0 as usize;
        let index = self.position[var];
        if index != self.border {
            let moved = self.order[self.border];
            self.order[index] = moved;
            self.position[moved.var().0 as usize] = index;
            self.position[var] = self.border;
        }
        self.order[self.border] = lit;
        self.border += 1;
    }

    /// Places `lit` as a decision, extending the decision chain.
    pub fn decide(&mut self, lit: Lit) {
        self.place(lit);
        let var = lit.var().0 as usize;
        self.link[var] = lit;
        self.antecedent[var] = None;
        let top = self.top_decision;
        self.link[top.var().0 as usize] = lit;
        self.top_decision = lit;
    }

    /// Places `lit` as implied by `clause` at the current level.
    pub fn imply(&mut self, lit: Lit, clause: ClauseId) {
        self.place(lit);
        let var = lit.var().0 as usize;
        self.link[var] = self.top_decision;
        self.antecedent[var] = Some(clause);
    }

    /// Interns a clause; re-adding an existing clause returns its id
    /// without touching the watches. Watches attach to the first two
    /// literals as given.
    pub fn add_clause(&mut self, lits: &[Lit]) -> ClauseId {
        assert!(!lits.is_empty());
        let mut sorted = lits.to_vec();
        sorted.sort();
        let key = sorted.into_boxed_slice();
        if let Some(&id) = self.interned.get(&key) {
            return id;
        }
        let id = ClauseId(self.clauses.len() as u32);
        let watched = [lits[0], lits[if lits.len() > 1 { 1 } else { 0 }]];
        self.clauses.push(ClauseData {
            lits: key.clone(),
            watched,
        });
        self.interned.insert(key, id);
        self.watches[watched[0].code()].push(Watch { clause: id, side: 0 });
        if watched[1] != watched[0] {
            self.watches[watched[1].code()].push(Watch { clause: id, side: 1 });
        }
        id
    }

    /// The literals of `clause`, sorted.
    pub fn clause_lits(&self, clause: ClauseId) -> &[Lit] {
        &self.clauses[clause.0 as usize].lits
    }

    /// Whether both watched literals of `clause` are false.
    pub fn is_conflict(&self, clause: ClauseId) -> bool {
        let [p, q] = self.clauses[clause.0 as usize].watched;
        self.value(p) == Some(false) && self.value(q) == Some(false)
    }

    /// The unit rule: the literal forced by `clause`, if any.
    pub fn derive(&self, clause: ClauseId) -> Option<Lit> {
        let [p, q] = self.clauses[clause.0 as usize].watched;
        if (self.value(p) == Some(false) || p == q) && self.value(q).is_none() {
            return Some(q);
        }
        if self.value(q) == Some(false) && self.value(p).is_none() {
            return Some(p);
        }
        None
    }

    /// Tries to move the watch away from its falsified literal; fails when
    /// every other literal is false or watched by the other side.
    fn update_watch(&mut self, watch: Watch) -> bool {
        let data = &self.clauses[watch.clause.0 as usize];
        let other = data.watched[1 - watch.side];
        for i in 0..data.lits.len() {
            let lit = self.clauses[watch.clause.0 as usize].lits[i];
            if lit != other && self.value(lit) != Some(false) {
                self.clauses[watch.clause.0 as usize].watched[watch.side] = lit;
                return true;
            }
        }
        false
    }

    /// Resumes the watch-list walk over falsified literals; yields the next
    /// clause whose watch could not be relocated (a conflict or unit
    /// clause), or `None` when the walk reaches the border.
    pub fn propagate(&mut self) -> Option<ClauseId> {
        loop {
            let (i, j) = self.cursor;
            if i == self.border {
                return None;
            }
            let lit = self.order[i];
            if j == self.watches[lit.code()].len() {
                self.cursor = (i + 1, 0);
                continue;
            }
            let watch = self.watches[lit.code()][j];
            if !self.update_watch(watch) {
                self.cursor = (i, j + 1);
                return Some(watch.clause);
            }
            self.watches[lit.code()].swap_remove(j);
            let moved_to = self.clauses[watch.clause.0 as usize].watched[watch.side];
            self.watches[moved_to.code()].push(watch);
        }
    }

    /// 1-UIP conflict analysis. Returns the asserting clause's literals;
    /// the first one is the unique implication point.
    pub fn analyze(&self, conflict: ClauseId) -> Vec<Lit> {
        let top = self.top_decision;
        let mut heap: BinaryHeap<usize> = BinaryHeap::new();
        let mut visited: FxHashSet<Lit> = FxHashSet::default();
        let mut count = 0usize;

        let mut push_clause = |heap: &mut BinaryHeap<usize>,
                               visited: &mut FxHashSet<Lit>,
                               clause: ClauseId|
         -> usize {
            let mut fresh = 0;
            for &lit in self.clause_lits(clause) {
                if !visited.contains(&lit) && !visited.contains(&lit.negated()) {
                    heap.push(self.position[lit.var().0 as usize]);
                    if self.link(lit) == top || lit == top {
                        fresh += 1;
                    }
                    visited.insert(lit);
                }
            }
            fresh
        };

        count += push_clause(&mut heap, &mut visited, conflict);
        let mut result = Vec::new();
        while let Some(index) = heap.pop() {
            let lit = self.order[index];
            if self.link(lit) != top || count == 1 {
                result.push(lit);
            } else {
                let reason = self.antecedent(lit).expect("level literal has no antecedent");
                count += push_clause(&mut heap, &mut visited, reason);
                count -= 1;
            }
        }
        result
    }

    /// Unwinds the trail back to (and including) the falsified decision
    /// `lit`, repairing the decision chain and the propagation cursor.
    pub fn backtrack(&mut self, lit: Lit) {
        debug_assert_eq!(Some(false), self.value(lit));
        debug_assert!(self.antecedent(lit).is_none());
        let index = self.position[lit.var().0 as usize];
        self.border = index;
        if self.cursor.0 >= index {
            self.cursor = (index, 0);
        }
        let last = self.order[index - 1];
        let mut top = self.link(last);
        if top == lit {
            top = last;
        }
        self.link[top.var().0 as usize] = top;
        self.top_decision = top;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lits(assignment: &Assignment, n: usize) -> Vec<Lit> {
        let _ = assignment;
        (1..=n).map(|v| Lit::new(Var(v as u32), false)).collect()
    }

    #[test]
    fn test_values_and_decisions() {
        let mut a = Assignment::new(3);
        let xs = lits(&a, 3);
        for &x in &xs {
            assert_eq!(None, a.value(x));
            assert_eq!(None, a.value(x.negated()));
        }

        a.decide(xs[0]);
        assert_eq!(Some(false), a.value(xs[0]));
        assert_eq!(Some(true), a.value(xs[0].negated()));
        assert_eq!(None, a.value(xs[1]));

        a.decide(xs[1].negated());
        assert_eq!(Some(true), a.value(xs[1]));
        assert_eq!(Some(false), a.value(xs[1].negated()));
    }

    #[test]
    fn test_decision_chain() {
        let mut a = Assignment::new(3);
        let xs = lits(&a, 3);
        let s = a.sentinel();

        a.decide(xs[0]);
        assert_eq!(xs[0], a.link(s));
        assert_eq!(xs[0], a.link(xs[0]));

        a.decide(xs[1]);
        assert_eq!(xs[1], a.link(xs[0]));
        assert_eq!(xs[1], a.link(xs[1]));

        let c = a.add_clause(&[xs[1], xs[2]]);
        a.imply(xs[2], c);
        assert_eq!(xs[1], a.link(xs[2]));
        assert_eq!(Some(c), a.antecedent(xs[2]));
        assert_eq!(None, a.antecedent(xs[1]));
    }

    #[test]
    fn test_unit_clause() {
        let mut a = Assignment::new(1);
        let x = Lit::new(Var(1), false);
        let c = a.add_clause(&[x]);
        assert_eq!(Some(x), a.derive(c));
        assert!(!a.is_conflict(c));

        a.imply(x.negated(), c);
        assert_eq!(None, a.derive(c));
        assert!(!a.is_conflict(c));
    }

    #[test]
    fn test_binary_clause() {
        let mut a = Assignment::new(2);
        let xs = lits(&a, 2);
        let c = a.add_clause(&[xs[0], xs[1]]);
        assert_eq!(None, a.derive(c));

        a.decide(xs[0]);
        assert_eq!(Some(xs[1]), a.derive(c));

        a.decide(xs[1]);
        assert!(a.is_conflict(c));
    }

    #[test]
    fn test_clause_interning() {
        let mut a = Assignment::new(2);
        let xs = lits(&a, 2);
        let c1 = a.add_clause(&[xs[0], xs[1]]);
        let c2 = a.add_clause(&[xs[1], xs[0]]);
        assert_eq!(c1, c2);
        let c3 = a.add_clause(&[xs[0], xs[1].negated()]);
        assert_ne!(c1, c3);
    }

    #[test]
    fn test_propagation_relocates_watches() {
        let mut a = Assignment::new(3);
        let xs = lits(&a, 3);
        let c = a.add_clause(&[xs[0], xs[1], xs[2]]);

        a.decide(xs[0]);
        assert_eq!(None, a.propagate()); // watch moves to x3

        a.decide(xs[1]);
        assert_eq!(Some(c), a.propagate()); // unit now
        assert_eq!(Some(xs[2]), a.derive(c));

        a.imply(xs[2].negated(), c);
        assert_eq!(None, a.propagate());
    }

    #[test]
    fn test_propagation_to_conflict() {
        let mut a = Assignment::new(2);
        let xs = lits(&a, 2);
        let c = a.add_clause(&[xs[0], xs[1]]);

        a.decide(xs[0]);
        assert_eq!(Some(c), a.propagate()); // unit already
        assert_eq!(Some(xs[1]), a.derive(c));
        a.decide(xs[1]);
        let got = a.propagate();
        assert_eq!(Some(c), got);
        assert!(a.is_conflict(c));
    }

    #[test]
    fn test_analyze_simple_conflict() {
        // x1 decided; c = (x1 x2) implies not x2; d = (x1 not x2) conflicts
        let mut a = Assignment::new(2);
        let xs = lits(&a, 2);
        let c = a.add_clause(&[xs[0], xs[1]]);
        let d = a.add_clause(&[xs[0], xs[1].negated()]);

        a.decide(xs[0]);
        assert_eq!(Some(c), a.propagate());
        a.imply(xs[1].negated(), c);
        let got = a.propagate();
        assert_eq!(Some(d), got);
        assert!(a.is_conflict(d));

        let asserting = a.analyze(d);
        assert_eq!(vec![xs[0]], asserting);
    }

    #[test]
    fn test_analyze_uip() {
        // Classic first-UIP shape: two decision levels, the conflict
        // resolves to the level-2 implication that dominates it.
        let mut a = Assignment::new(6);
        let xs = lits(&a, 6);
        let (x1, x2, x3, x4, x5, x6) =
            (xs[0], xs[1], xs[2], xs[3], xs[4], xs[5]);

        let c1 = a.add_clause(&[x1, x3]);
        let c2 = a.add_clause(&[x2.negated(), x3.negated(), x4]);
        let c3 = a.add_clause(&[x4.negated(), x5]);
        let c4 = a.add_clause(&[x4.negated(), x6]);
        let c5 = a.add_clause(&[x5.negated(), x6.negated(), x3.negated()]);

        // level 1: decide x1 false, c1 forces x3
        a.decide(x1);
        assert_eq!(Some(c1), a.propagate());
        assert_eq!(Some(x3), a.derive(c1));
        a.imply(x3.negated(), c1);
        assert_eq!(None, a.propagate());

        // level 2: decide x2 true (place its negation)
        a.decide(x2.negated());
        assert_eq!(Some(c2), a.propagate());
        a.imply(x4.negated(), c2);
        assert_eq!(Some(c3), a.propagate());
        a.imply(x5.negated(), c3);
        assert_eq!(Some(c4), a.propagate());
        a.imply(x6.negated(), c4);
        let conflict = a.propagate().expect("conflict expected");
        assert_eq!(c5, conflict);
        assert!(a.is_conflict(conflict));

        // x4 is the first UIP; x3 came from level 1
        let asserting = a.analyze(conflict);
        assert_eq!(vec![x4.negated(), x3.negated()], asserting);
    }

    #[test]
    fn test_backtrack() {
        let mut a = Assignment::new(4);
        let xs = lits(&a, 4);
        let s = a.sentinel();

        a.decide(xs[0]);
        let c = a.add_clause(&[xs[0], xs[1]]);
        a.imply(xs[1], c);
        a.decide(xs[2]);
        a.decide(xs[3]);
        assert_eq!(xs[3], a.link(xs[2])); // chained onto the previous decision
        assert_eq!(Some(false), a.value(xs[3]));

        a.backtrack(xs[2]);
        assert_eq!(None, a.value(xs[2]));
        assert_eq!(None, a.value(xs[3]));
        assert_eq!(Some(false), a.value(xs[0]));
        assert_eq!(Some(false), a.value(xs[1]));
        assert_eq!(xs[0], a.link(xs[0])); // x1 is topmost again

        a.backtrack(xs[0]);
        assert_eq!(None, a.value(xs[0]));
        assert_eq!(s, a.link(s));
    }
}
