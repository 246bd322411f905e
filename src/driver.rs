// SPDX-License-Identifier: PMPL-1.0-or-later

//! The fixed-point inference driver: repeatedly fires rules in
//! descending-priority order until a pass changes nothing, or
//! `max_iterations` is exceeded.
//!
//! The outer repeat-until-no-change loop mirrors the teacher's
//! `FactDB::forward_chain` (accumulate `new_facts`, stop when a pass
//! derives none); this driver generalizes it to priority ordering, the
//! three action kinds, and degree-expression evaluation.

use crate::bindings::Bindings;
use crate::error::InferenceError;
use crate::matcher;
use crate::model::{Action, Fact, FactTemplate, Rule};
use crate::ops;
use crate::store::FactStore;

/// Runs the driver to a fixed point. Rules are assumed already sorted by
/// descending priority with insertion-order tie-break (spec.md §3
/// invariant 3) — the caller (`KnowledgeBase`) is responsible for that
/// ordering; this function iterates `rules` as given.
pub fn run(store: &mut FactStore, rules: &[Rule], max_iterations: u32) -> Result<(), InferenceError> {
    for _ in 0..max_iterations {
        let mut changed = false;

        for rule in rules {
            for (bindings, match_degree) in matcher::match_all(&rule.conditions, store) {
                for action in &rule.actions {
                    if apply_action(store, action, &bindings, match_degree)? {
                        changed = true;
                    }
                }
            }
        }

        if !changed {
            return Ok(());
        }
    }

    Err(InferenceError::MaxIterationsExceeded(max_iterations))
}

fn apply_action(
    store: &mut FactStore,
    action: &Action,
    bindings: &Bindings,
    match_degree: f64,
) -> Result<bool, InferenceError> {
    match action {
        Action::Add(template) => {
            let fact = instantiate(store, template, bindings, match_degree)?;
            Ok(store.insert_or_combine(fact))
        }
        Action::Modify(template) => {
            let fact = instantiate(store, template, bindings, match_degree)?;
            // Modify on an absent key behaves as Add (spec.md §9 Open
            // Question, pinned): `set` already inserts when absent, and
            // when present it's an unconditional overwrite, so routing
            // both cases through `set` implements that pin directly.
            Ok(store.set(fact))
        }
        Action::Retract(template) => {
            let args = instantiate_args(template, bindings)?;
            Ok(store.remove(&template.predicate, &args))
        }
    }
}

fn instantiate_args(template: &FactTemplate, bindings: &Bindings) -> Result<Vec<String>, InferenceError> {
    template
        .args
        .iter()
        .map(|term| match term {
            crate::term::Term::Symbol(s) => Ok(s.clone()),
            crate::term::Term::Var(name) => {
                bindings
                    .term(name)
                    .map(str::to_string)
                    .ok_or_else(|| InferenceError::UnboundTemplateVariable {
                        predicate: template.predicate.clone(),
                        var: name.clone(),
                    })
            }
        })
        .collect()
}

fn instantiate(
    store: &FactStore,
    template: &FactTemplate,
    bindings: &Bindings,
    match_degree: f64,
) -> Result<Fact, InferenceError> {
    let args = instantiate_args(template, bindings)?;

    if let Some(existing) = store.scan(&template.predicate).first() {
        if existing.args.len() != args.len() {
            return Err(InferenceError::ArityMismatch {
                predicate: template.predicate.clone(),
                expected: existing.args.len(),
                actual: args.len(),
            });
        }
    }

    let degree = match &template.degree {
        Some(expr) => ops::eval_degree_expr(expr, bindings)?,
        None => match_degree.clamp(0.0, 1.0),
    };

    Ok(Fact::new(template.predicate.clone(), args, degree))
}
