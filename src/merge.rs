// SPDX-License-Identifier: PMPL-1.0-or-later

//! The merger (spec.md §4.5): combines two knowledge bases into a third
//! under one of five strategies, without running inference and without
//! mutating either input.

use crate::error::MergeError;
use crate::model::{Fact, Rule};
use crate::store::FactStore;

/// One of the five merge strategies (spec.md §4.5).
#[derive(Debug, Clone)]
pub enum MergeStrategy {
    Union,
    Override,
    Complement,
    Weighted(f64, f64),
    Smart,
}

/// Configuration the merger consults regardless of strategy (spec.md §6).
/// `weights` only matters for `Weighted`; `auto_resolve` and `strict` only
/// for `Smart`.
#[derive(Debug, Clone)]
pub struct MergeConfig {
    pub threshold: f64,
    pub exclusion_families: Vec<Vec<String>>,
    pub auto_resolve: bool,
    /// When `true`, SMART with `auto_resolve = false` raises
    /// `MergeError::UnresolvedConflicts` instead of silently falling back to
    /// UNION (spec.md §7's fourth merge-error condition).
    pub strict: bool,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            threshold: 0.5,
            exclusion_families: Vec::new(),
            auto_resolve: false,
            strict: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
    FactContradiction,
    MutualExclusion,
    RuleConflict,
    Subsumption,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub kind: ConflictKind,
    pub severity: f64,
    pub kb1_item: String,
    pub kb2_item: String,
    pub description: String,
    pub suggested_resolution: String,
}

#[derive(Debug, Clone)]
pub struct MergeOutcome {
    pub facts: FactStore,
    pub rules: Vec<Rule>,
    pub conflicts: Vec<Conflict>,
}

fn fact_label(fact: &Fact) -> String {
    format!("{}({})={}", fact.predicate, fact.args.join(", "), fact.degree)
}

/// Merges `(facts_a, rules_a)` and `(facts_b, rules_b)` under `strategy`.
/// Pure: neither input is touched.
pub fn merge(
    facts_a: &FactStore,
    rules_a: &[Rule],
    facts_b: &FactStore,
    rules_b: &[Rule],
    strategy: &MergeStrategy,
    config: &MergeConfig,
) -> Result<MergeOutcome, MergeError> {
    match strategy {
        MergeStrategy::Union => Ok(merge_union(facts_a, rules_a, facts_b, rules_b)),
        MergeStrategy::Override => Ok(merge_override(facts_a, rules_a, facts_b, rules_b)),
        MergeStrategy::Complement => Ok(merge_complement(facts_a, rules_a, facts_b, rules_b)),
        MergeStrategy::Weighted(w1, w2) => merge_weighted(facts_a, rules_a, facts_b, rules_b, *w1, *w2),
        MergeStrategy::Smart => merge_smart(facts_a, rules_a, facts_b, rules_b, config),
    }
}

fn merge_union(facts_a: &FactStore, rules_a: &[Rule], facts_b: &FactStore, rules_b: &[Rule]) -> MergeOutcome {
    let mut facts = facts_a.clone();
    for fact in facts_b.all() {
        facts.insert_or_combine(fact);
    }
    let mut rules = rules_a.to_vec();
    rules.extend(rules_b.iter().cloned());
    MergeOutcome {
        facts,
        rules,
        conflicts: Vec::new(),
    }
}

fn merge_override(facts_a: &FactStore, rules_a: &[Rule], facts_b: &FactStore, rules_b: &[Rule]) -> MergeOutcome {
    let mut facts = facts_a.clone();
    for fact in facts_b.all() {
        facts.set(fact);
    }

    let mut rules = rules_a.to_vec();
    for incoming in rules_b {
        match rules.iter_mut().find(|r| r.identity() == incoming.identity()) {
            Some(slot) => *slot = incoming.clone(),
            None => rules.push(incoming.clone()),
        }
    }

    MergeOutcome {
        facts,
        rules,
        conflicts: Vec::new(),
    }
}

fn merge_complement(facts_a: &FactStore, rules_a: &[Rule], facts_b: &FactStore, rules_b: &[Rule]) -> MergeOutcome {
    let mut facts = facts_a.clone();
    for fact in facts_b.all() {
        if facts.lookup(&fact.predicate, &fact.args).is_none() {
            facts.set(fact);
        }
    }

    let mut rules = rules_a.to_vec();
    let present: Vec<String> = rules_a.iter().map(Rule::identity).collect();
    for incoming in rules_b {
        if !present.contains(&incoming.identity()) {
            rules.push(incoming.clone());
        }
    }

    MergeOutcome {
        facts,
        rules,
        conflicts: Vec::new(),
    }
}

fn merge_weighted(
    facts_a: &FactStore,
    rules_a: &[Rule],
    facts_b: &FactStore,
    rules_b: &[Rule],
    w1: f64,
    w2: f64,
) -> Result<MergeOutcome, MergeError> {
    if w1 + w2 <= 0.0 {
        return Err(MergeError::InvalidWeights(w1, w2));
    }

    let mut facts = FactStore::new();
    for fact in facts_a.all() {
        match facts_b.lookup(&fact.predicate, &fact.args) {
            Some(d2) => {
                let blended = (w1 * fact.degree + w2 * d2) / (w1 + w2);
                facts.set(Fact::new(fact.predicate.clone(), fact.args.clone(), blended));
            }
            None => {
                facts.set(fact);
            }
        }
    }
    for fact in facts_b.all() {
        if facts_a.lookup(&fact.predicate, &fact.args).is_none() {
            facts.set(fact);
        }
    }

    let mut rules = rules_a.to_vec();
    rules.extend(rules_b.iter().cloned());

    Ok(MergeOutcome {
        facts,
        rules,
        conflicts: Vec::new(),
    })
}

fn merge_smart(
    facts_a: &FactStore,
    rules_a: &[Rule],
    facts_b: &FactStore,
    rules_b: &[Rule],
    config: &MergeConfig,
) -> Result<MergeOutcome, MergeError> {
    let conflicts = detect_conflicts(facts_a, rules_a, facts_b, rules_b, config);

    if !config.auto_resolve {
        if config.strict && !conflicts.is_empty() {
            return Err(MergeError::UnresolvedConflicts);
        }
        // Deferred resolution: fall back to UNION, conflicts are reported
        // for the caller to inspect, not acted upon (spec.md §4.5).
        let mut outcome = merge_union(facts_a, rules_a, facts_b, rules_b);
        outcome.conflicts = conflicts;
        return Ok(outcome);
    }

    // FactContradiction's suggested resolution is "keep the higher degree",
    // which `insert_or_combine` already implements via fuzzy-OR.
    let mut facts = facts_a.clone();
    for fact in facts_b.all() {
        facts.insert_or_combine(fact);
    }

    // MutualExclusion's suggested resolution is "keep the higher degree";
    // unlike FactContradiction the two facts have different keys (distinct
    // predicates), so fuzzy-OR above leaves both in the store — drop the
    // lower-degree one of each conflicting pair explicitly. Ties keep KB1's
    // fact, matching the tie-break convention used for rule conflicts below.
    for (fact_a, fact_b) in mutual_exclusion_pairs(facts_a, facts_b, config) {
        let loser = if fact_a.degree >= fact_b.degree { &fact_b } else { &fact_a };
        facts.remove(&loser.predicate, &loser.args);
    }

    let mut rules = rules_a.to_vec();
    for conflict in conflicts.iter().filter(|c| c.kind == ConflictKind::RuleConflict) {
        // Suggested resolution: keep the higher priority, ties to KB1. The
        // rule is already present from `rules_a`; only replace it if B's
        // version outranks it.
        if let Some(incoming) = rules_b.iter().find(|r| r.identity() == conflict.kb1_item) {
            if let Some(slot) = rules.iter_mut().find(|r| r.identity() == incoming.identity()) {
                if incoming.priority > slot.priority {
                    *slot = incoming.clone();
                }
            }
        }
    }

    let resolved_names: Vec<String> = conflicts
        .iter()
        .filter(|c| c.kind == ConflictKind::RuleConflict)
        .map(|c| c.kb1_item.clone())
        .collect();
    for incoming in rules_b {
        let already_present = rules.iter().any(|r| r.identity() == incoming.identity());
        if !already_present && !resolved_names.contains(&incoming.identity()) {
            rules.push(incoming.clone());
        }
    }

    // Subsumption's suggested resolution is "keep the more specific rule":
    // `subsumption_conflict` records the specific rule's identity as
    // `kb1_item` and the general (subsumed) one's as `kb2_item`, so drop
    // anything named as the general side.
    let subsumed: Vec<String> = conflicts
        .iter()
        .filter(|c| c.kind == ConflictKind::Subsumption)
        .map(|c| c.kb2_item.clone())
        .collect();
    rules.retain(|r| !subsumed.contains(&r.identity()));

    Ok(MergeOutcome {
        facts,
        rules,
        conflicts,
    })
}

fn detect_conflicts(
    facts_a: &FactStore,
    rules_a: &[Rule],
    facts_b: &FactStore,
    rules_b: &[Rule],
    config: &MergeConfig,
) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for fact_a in facts_a.all() {
        if let Some(d2) = facts_b.lookup(&fact_a.predicate, &fact_a.args) {
            let diff = (fact_a.degree - d2).abs();
            if diff >= config.threshold {
                conflicts.push(Conflict {
                    kind: ConflictKind::FactContradiction,
                    severity: diff,
                    kb1_item: fact_label(&fact_a),
                    kb2_item: format!("{}({})={}", fact_a.predicate, fact_a.args.join(", "), d2),
                    description: format!(
                        "{}({}) has degree {} in KB1 and {} in KB2",
                        fact_a.predicate,
                        fact_a.args.join(", "),
                        fact_a.degree,
                        d2
                    ),
                    suggested_resolution: "keep the higher degree".to_string(),
                });
            }
        }
    }

    for (fact_a, fact_b) in mutual_exclusion_pairs(facts_a, facts_b, config) {
        let subject = fact_a.args.first().cloned().unwrap_or_default();
        conflicts.push(Conflict {
            kind: ConflictKind::MutualExclusion,
            severity: fact_a.degree.min(fact_b.degree),
            kb1_item: fact_label(&fact_a),
            kb2_item: fact_label(&fact_b),
            description: format!(
                "{subject} is assigned both {} and {} from a declared exclusion family",
                fact_a.predicate, fact_b.predicate
            ),
            suggested_resolution: "keep the higher degree; annotate uncertainty".to_string(),
        });
    }

    for rule_a in rules_a {
        if rule_a.name.is_none() {
            continue;
        }
        for rule_b in rules_b {
            if rule_a.name != rule_b.name {
                continue;
            }
            if rule_a.conditions != rule_b.conditions || rule_a.actions != rule_b.actions {
                conflicts.push(Conflict {
                    kind: ConflictKind::RuleConflict,
                    severity: 1.0,
                    kb1_item: rule_a.identity(),
                    kb2_item: rule_b.identity(),
                    description: format!(
                        "rule {:?} has structurally different bodies in KB1 and KB2",
                        rule_a.name.as_deref().unwrap_or("")
                    ),
                    suggested_resolution: "keep the higher priority; ties break to KB1".to_string(),
                });
            }
        }
    }

    for rule_a in rules_a {
        for rule_b in rules_b {
            if rule_a.actions == rule_b.actions {
                if is_strict_superset(&rule_a.conditions, &rule_b.conditions) {
                    conflicts.push(subsumption_conflict(rule_a, rule_b));
                } else if is_strict_superset(&rule_b.conditions, &rule_a.conditions) {
                    conflicts.push(subsumption_conflict(rule_b, rule_a));
                }
            }
        }
    }

    conflicts
}

/// Every pair of facts that share a subject (first arg) but belong to a
/// declared exclusion family (spec.md §4.5 `MutualExclusion`), used both to
/// report the conflict and, under `auto_resolve`, to pick a winner.
fn mutual_exclusion_pairs(facts_a: &FactStore, facts_b: &FactStore, config: &MergeConfig) -> Vec<(Fact, Fact)> {
    let mut pairs = Vec::new();
    for fact_a in facts_a.all() {
        for fact_b in facts_b.all() {
            if fact_a.predicate == fact_b.predicate {
                continue;
            }
            let Some(subject_a) = fact_a.args.first() else { continue };
            let Some(subject_b) = fact_b.args.first() else { continue };
            if subject_a != subject_b {
                continue;
            }
            let shares_family = config
                .exclusion_families
                .iter()
                .any(|family| family.contains(&fact_a.predicate) && family.contains(&fact_b.predicate));
            if shares_family {
                pairs.push((fact_a.clone(), fact_b.clone()));
            }
        }
    }
    pairs
}

fn is_strict_superset(broader: &[crate::model::Condition], narrower: &[crate::model::Condition]) -> bool {
    broader.len() > narrower.len() && narrower.iter().all(|c| broader.contains(c))
}

fn subsumption_conflict(specific: &Rule, general: &Rule) -> Conflict {
    Conflict {
        kind: ConflictKind::Subsumption,
        severity: 0.3,
        kb1_item: specific.identity(),
        kb2_item: general.identity(),
        description: format!(
            "rule {} subsumes rule {} (superset of conditions, identical actions)",
            specific.identity(),
            general.identity()
        ),
        suggested_resolution: "keep the more specific rule (larger condition set)".to_string(),
    }
}
