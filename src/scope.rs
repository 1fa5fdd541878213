// Copyright 2022-2023 VMware, Inc.
// SPDX-License-Identifier: BSD-2-Clause

//! Layered maps with scope rollback.
//!
//! The symbol table needs to open a scope for `define-fun` formals or `let`
//! bindings, shadow outer entries, and then either roll the scope back or
//! merge it into the enclosing one. A [ScopedMap] is a stack of hash-map
//! layers where removal in an inner layer is a tombstone hiding outer
//! entries.

use std::borrow::Borrow;
use std::hash::Hash;

use fxhash::{FxHashMap, FxHashSet};

/// A stack of map layers; lookups see the topmost entry for a key.
#[derive(Debug, Clone)]
pub struct ScopedMap<K, V> {
    layers: Vec<FxHashMap<K, Option<V>>>,
}

impl<K: Eq + Hash + Clone, V> Default for ScopedMap<K, V> {
    fn default() -> Self {
        ScopedMap {
            layers: vec![FxHashMap::default()],
        }
    }
}

impl<K: Eq + Hash + Clone, V> ScopedMap<K, V> {
    /// A map with a single base layer.
    pub fn new() -> ScopedMap<K, V> {
        ScopedMap::default()
    }

    /// The topmost value for `key`, unless hidden by a removal.
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        for layer in self.layers.iter().rev() {
            if let Some(entry) = layer.get(key) {
                return entry.as_ref();
            }
        }
        None
    }

    /// Whether `key` is visible.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Whether `key` was introduced in the top layer.
    pub fn top_contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        matches!(self.layers.last().and_then(|l| l.get(key)), Some(Some(_)))
    }

    /// Binds `key` in the top layer, shadowing outer bindings.
    pub fn insert(&mut self, key: K, value: V) {
        self.layers
            .last_mut()
            .expect("scoped map has no layers")
            .insert(key, Some(value));
    }

    /// Hides `key`, leaving outer bindings restorable by rollback.
    pub fn remove(&mut self, key: &K) {
        self.layers
            .last_mut()
            .expect("scoped map has no layers")
            .insert(key.clone(), None);
    }

    /// Opens a new scope.
    pub fn push_scope(&mut self) {
        self.layers.push(FxHashMap::default());
    }

    /// Discards the top scope; the base layer cannot be rolled back.
    pub fn rollback(&mut self) {
        assert!(self.layers.len() > 1, "rollback of the base layer");
        self.layers.pop();
    }

    /// Merges the top scope into the one below it.
    pub fn commit(&mut self) {
        assert!(self.layers.len() > 1, "commit of the base layer");
        let top = self.layers.pop().unwrap();
        let below = self.layers.last_mut().unwrap();
        for (key, entry) in top {
            below.insert(key, entry);
        }
    }

    /// Number of visible bindings.
    pub fn len(&self) -> usize {
        self.iter().count()
    }

    /// Whether no bindings are visible.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Visible bindings, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        let mut seen: FxHashSet<&K> = FxHashSet::default();
        let mut found: Vec<(&K, &V)> = Vec::new();
        for layer in self.layers.iter().rev() {
            for (key, entry) in layer {
                if seen.insert(key) {
                    if let Some(value) = entry {
                        found.push((key, value));
                    }
                }
            }
        }
        found.into_iter()
    }
}
