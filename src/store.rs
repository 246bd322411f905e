// SPDX-License-Identifier: PMPL-1.0-or-later

//! The fact store: a keyed container from `(predicate, args)` to degree,
//! with fuzzy-OR combine on insert.
//!
//! Modeled on the teacher's `kanren::core::FactDB`, which kept a
//! `HashSet<LogicFact>` and asserted new facts directly; this store instead
//! keys on fact identity so `insert_or_combine` can implement spec.md
//! §4.3's "replace the stored degree with `max(stored, fact.degree)`" in
//! place, without scanning the whole set.

use crate::model::{Fact, FactKey};
use std::collections::HashMap;

/// A keyed container of facts, indexed by `(predicate, args)`.
#[derive(Debug, Default, Clone)]
pub struct FactStore {
    facts: HashMap<FactKey, f64>,
}

impl FactStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a fact, combining with any existing fact of the same key by
    /// taking the maximum degree (fuzzy-OR). Returns `true` if the stored
    /// degree was inserted for the first time or increased.
    pub fn insert_or_combine(&mut self, fact: Fact) -> bool {
        match self.facts.get(&(fact.predicate.clone(), fact.args.clone())) {
            None => {
                self.facts.insert(fact.key(), fact.degree);
                true
            }
            Some(&existing) => {
                let combined = existing.max(fact.degree);
                if combined > existing {
                    self.facts.insert(fact.key(), combined);
                    true
                } else {
                    false
                }
            }
        }
    }

    /// Unconditionally sets the degree of a fact, inserting it if absent.
    /// Returns `true` if the stored value changed (or was newly inserted).
    pub fn set(&mut self, fact: Fact) -> bool {
        let key = fact.key();
        match self.facts.insert(key, fact.degree) {
            None => true,
            Some(previous) => previous != fact.degree,
        }
    }

    /// Removes the fact with the given identity. Idempotent; returns
    /// `true` if a fact was actually present and removed.
    pub fn remove(&mut self, predicate: &str, args: &[String]) -> bool {
        self.facts
            .remove(&(predicate.to_string(), args.to_vec()))
            .is_some()
    }

    pub fn lookup(&self, predicate: &str, args: &[String]) -> Option<f64> {
        self.facts.get(&(predicate.to_string(), args.to_vec())).copied()
    }

    /// All facts whose predicate matches, in an unspecified but
    /// deterministic-for-a-given-insertion-sequence order (spec.md §4.3).
    pub fn scan(&self, predicate: &str) -> Vec<Fact> {
        let mut out: Vec<Fact> = self
            .facts
            .iter()
            .filter(|((p, _), _)| p == predicate)
            .map(|((p, args), degree)| Fact::new(p.clone(), args.clone(), *degree))
            .collect();
        out.sort_by(|a, b| a.args.cmp(&b.args));
        out
    }

    pub fn all(&self) -> Vec<Fact> {
        let mut out: Vec<Fact> = self
            .facts
            .iter()
            .map(|((p, args), degree)| Fact::new(p.clone(), args.clone(), *degree))
            .collect();
        out.sort_by(|a, b| (a.predicate.clone(), a.args.clone()).cmp(&(b.predicate.clone(), b.args.clone())));
        out
    }

    pub fn len(&self) -> usize {
        self.facts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.facts.is_empty()
    }

    pub fn clear(&mut self) {
        self.facts.clear();
    }
}
