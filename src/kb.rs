// SPDX-License-Identifier: PMPL-1.0-or-later

//! `KnowledgeBase`: the single owned value the rest of the crate's public
//! surface hangs off (spec.md §9 "Mutable global-like container" — there is
//! no shared global state, merging and serialization always produce new
//! instances).
//!
//! Plays the role the teacher's `LogicEngine` plays around its `FactDB`: one
//! struct owning the mutable state, exposing the handful of operations spec
//! §6 calls the "library surface" while delegating the actual algorithms to
//! `store`, `driver`, `matcher`, `merge`, and `serialize`.

use crate::error::{EngineError, MergeError, SerializationError, ValidationError};
use crate::merge::{self, Conflict, MergeConfig, MergeOutcome, MergeStrategy};
use crate::model::{Fact, Rule};
use crate::query;
use crate::serialize;
use crate::store::FactStore;
use serde_json::Value;
use std::path::Path;

/// A fact store plus a rule base, kept sorted by descending priority with
/// insertion-order tie-break (spec.md §3 invariant 3).
#[derive(Debug, Default, Clone)]
pub struct KnowledgeBase {
    facts: FactStore,
    rules: Vec<Rule>,
    last_conflicts: Vec<Conflict>,
}

impl KnowledgeBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Validates and inserts a single fact via fuzzy-OR combine.
    pub fn add_fact(&mut self, fact: Fact) -> Result<(), ValidationError> {
        fact.validate()?;
        self.facts.insert_or_combine(fact);
        Ok(())
    }

    pub fn add_facts(&mut self, facts: impl IntoIterator<Item = Fact>) -> Result<(), ValidationError> {
        for fact in facts {
            self.add_fact(fact)?;
        }
        Ok(())
    }

    /// Validates and inserts a rule, then re-sorts the rule base by
    /// descending priority with insertion-order tie-break.
    pub fn add_rule(&mut self, rule: Rule) -> Result<(), ValidationError> {
        rule.validate()?;
        self.rules.push(rule);
        self.resort_rules();
        Ok(())
    }

    pub fn add_rules(&mut self, rules: impl IntoIterator<Item = Rule>) -> Result<(), ValidationError> {
        for rule in rules {
            rule.validate()?;
            self.rules.push(rule);
        }
        self.resort_rules();
        Ok(())
    }

    /// Stable sort keeps ties in insertion order (spec.md §3 invariant 3);
    /// `Vec::sort_by` is a stable sort.
    fn resort_rules(&mut self) {
        self.rules.sort_by(|a, b| b.priority.cmp(&a.priority));
    }

    pub fn clear(&mut self) {
        self.facts.clear();
        self.rules.clear();
        self.last_conflicts.clear();
    }

    /// Runs the fixed-point driver (spec.md §4.4) against the live store.
    pub fn run(&mut self, max_iterations: u32) -> Result<(), EngineError> {
        crate::driver::run(&mut self.facts, &self.rules, max_iterations)?;
        Ok(())
    }

    /// Read-only lookup over the fact store (spec.md §4.6). `args` is
    /// `None` for "any arity, any values"; otherwise a positional pattern
    /// with `None` entries acting as wildcards.
    pub fn query(&self, predicate: &str, args: Option<&[Option<String>]>) -> Vec<Fact> {
        query::query(&self.facts, predicate, args)
    }

    pub fn get_facts(&self) -> Vec<Fact> {
        self.facts.all()
    }

    pub fn get_rules(&self) -> &[Rule] {
        &self.rules
    }

    pub fn fact_store(&self) -> &FactStore {
        &self.facts
    }

    pub fn to_dict(&self) -> Value {
        serialize::to_dict(&self.facts.all(), &self.rules)
    }

    pub fn from_dict(value: &Value) -> Result<Self, SerializationError> {
        let (facts, rules) = serialize::from_dict(value)?;
        Ok(Self::from_parts(facts, rules))
    }

    pub fn save_to_file(&self, path: impl AsRef<Path>) -> Result<(), SerializationError> {
        serialize::save_to_file(path.as_ref(), &self.facts.all(), &self.rules)
    }

    pub fn load_from_file(path: impl AsRef<Path>) -> Result<Self, SerializationError> {
        let (facts, rules) = serialize::load_from_file(path.as_ref())?;
        Ok(Self::from_parts(facts, rules))
    }

    /// Builds a `KnowledgeBase` from already-validated facts and rules,
    /// applying the invariant-3 sort. Used by the serialization round trip,
    /// where validation already happened during parsing.
    fn from_parts(facts: Vec<Fact>, rules: Vec<Rule>) -> Self {
        let mut store = FactStore::new();
        for fact in facts {
            store.insert_or_combine(fact);
        }
        let mut rules = rules;
        rules.sort_by(|a, b| b.priority.cmp(&a.priority));
        Self {
            facts: store,
            rules,
            last_conflicts: Vec::new(),
        }
    }

    /// Merges `self` and `other` under `strategy`, returning a new
    /// `KnowledgeBase`. Pure: neither `self` nor `other` is mutated
    /// (spec.md §4.5, §8 invariant 6).
    pub fn merge(
        &self,
        other: &KnowledgeBase,
        strategy: MergeStrategy,
        config: &MergeConfig,
    ) -> Result<KnowledgeBase, MergeError> {
        let MergeOutcome {
            facts,
            rules,
            conflicts,
        } = merge::merge(&self.facts, &self.rules, &other.facts, &other.rules, &strategy, config)?;
        Ok(KnowledgeBase {
            facts,
            rules,
            last_conflicts: conflicts,
        })
    }

    /// The conflict list recorded by the most recent `merge` call that
    /// produced this instance (empty for a freshly constructed KB).
    pub fn conflict_report(&self) -> &[Conflict] {
        &self.last_conflicts
    }
}
