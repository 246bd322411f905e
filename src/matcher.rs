// SPDX-License-Identifier: PMPL-1.0-or-later

//! The pattern matcher: matches a condition against the fact store under a
//! set of bindings, enumerating every binding extension (not just the
//! first), because the driver fires an action once per distinct match.
//!
//! The cartesian-extension loop in `match_and` is the same shape as the
//! teacher's `FactDB::match_body` (fold over body atoms, re-unifying the
//! database against each partial substitution); this module generalizes it
//! to the spec's AND/OR/NOT combinators and adds degree propagation.

use crate::bindings::Bindings;
use crate::model::{AtomCondition, Condition};
use crate::ops;
use crate::store::FactStore;
use crate::term::Term;

/// One satisfying extension of a condition: the bindings it produced, and
/// the degree it contributed (spec.md §4.2).
pub type Match = (Bindings, f64);

/// Matches a condition, returning every satisfying `(bindings, degree)`
/// extension.
pub fn match_condition(condition: &Condition, bindings: &Bindings, store: &FactStore) -> Vec<Match> {
    match condition {
        Condition::Atom(atom) => match_atom(atom, bindings, store),
        Condition::And(children) => match_and(children, bindings, store),
        Condition::Or(children) => match_or(children, bindings, store),
        Condition::Not(child) => match_not(child, bindings, store),
    }
}

/// Matches an implicit top-level AND across a rule's condition sequence.
pub fn match_all(conditions: &[Condition], store: &FactStore) -> Vec<Match> {
    match_and(conditions, &Bindings::new(), store)
}

fn match_atom(atom: &AtomCondition, bindings: &Bindings, store: &FactStore) -> Vec<Match> {
    let mut out = Vec::new();

    for fact in store.scan(&atom.predicate) {
        if fact.args.len() != atom.args.len() {
            continue;
        }

        let Some(mut extended) = unify_args(&atom.args, &fact.args, bindings) else {
            continue;
        };

        if let Some(degree_var) = &atom.degree_var {
            match extended.with_degree(degree_var, fact.degree) {
                Some(next) => extended = next,
                None => continue,
            }
        }

        if let Some(constraint) = &atom.degree_constraint {
            if !ops::eval_constraint(constraint, &extended) {
                continue;
            }
        }

        out.push((extended, fact.degree));
    }

    out
}

/// Unifies each condition term against the corresponding fact argument,
/// threading the extended bindings through left to right.
fn unify_args(cond_args: &[Term], fact_args: &[String], bindings: &Bindings) -> Option<Bindings> {
    let mut current = bindings.clone();
    for (term, value) in cond_args.iter().zip(fact_args.iter()) {
        match term {
            Term::Symbol(s) => {
                if s != value {
                    return None;
                }
            }
            Term::Var(name) => {
                current = current.with_term(name, value)?;
            }
        }
    }
    Some(current)
}

fn match_and(children: &[Condition], bindings: &Bindings, store: &FactStore) -> Vec<Match> {
    let mut current: Vec<Match> = vec![(bindings.clone(), 1.0)];

    for child in children {
        let mut next = Vec::new();
        for (partial_bindings, partial_degree) in &current {
            for (extended, degree) in match_condition(child, partial_bindings, store) {
                next.push((extended, partial_degree.min(degree)));
            }
        }
        current = next;
        if current.is_empty() {
            break;
        }
    }

    current
}

fn match_or(children: &[Condition], bindings: &Bindings, store: &FactStore) -> Vec<Match> {
    let mut results: Vec<Match> = Vec::new();

    for child in children {
        for (extended, degree) in match_condition(child, bindings, store) {
            match results
                .iter_mut()
                .find(|(existing, _)| *existing == extended)
            {
                Some((_, existing_degree)) => {
                    if degree > *existing_degree {
                        *existing_degree = degree;
                    }
                }
                None => results.push((extended, degree)),
            }
        }
    }

    results
}

fn match_not(child: &Condition, bindings: &Bindings, store: &FactStore) -> Vec<Match> {
    if match_condition(child, bindings, store).is_empty() {
        vec![(bindings.clone(), 1.0)]
    } else {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ComparisonOp, DegreeConstraint, DegreeOperand, Fact};

    fn atom(predicate: &str, args: Vec<Term>) -> Condition {
        Condition::Atom(AtomCondition {
            predicate: predicate.to_string(),
            args,
            degree_var: None,
            degree_constraint: None,
        })
    }

    #[test]
    fn atom_binds_unbound_variables() {
        let mut store = FactStore::new();
        store.insert_or_combine(Fact::new("parent", vec!["tom".into(), "bob".into()], 1.0));
        store.insert_or_combine(Fact::new("parent", vec!["tom".into(), "liz".into()], 1.0));

        let cond = atom("parent", vec![Term::symbol("tom"), Term::var("x")]);
        let matches = match_condition(&cond, &Bindings::new(), &store);
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn atom_with_bound_variable_requires_consistency() {
        let mut store = FactStore::new();
        store.insert_or_combine(Fact::new("parent", vec!["tom".into(), "bob".into()], 1.0));
        store.insert_or_combine(Fact::new("parent", vec!["bob".into(), "ann".into()], 1.0));

        // grandparent(x, z) :- parent(x, y), parent(y, z)
        let cond = Condition::And(vec![
            atom("parent", vec![Term::var("x"), Term::var("y")]),
            atom("parent", vec![Term::var("y"), Term::var("z")]),
        ]);
        let matches = match_condition(&cond, &Bindings::new(), &store);
        assert_eq!(matches.len(), 1);
        let (bindings, _) = &matches[0];
        assert_eq!(bindings.term("x"), Some("tom"));
        assert_eq!(bindings.term("z"), Some("ann"));
    }

    #[test]
    fn and_contributes_the_minimum_degree() {
        let mut store = FactStore::new();
        store.insert_or_combine(Fact::new("a", vec!["x".into()], 0.9));
        store.insert_or_combine(Fact::new("b", vec!["x".into()], 0.3));

        let cond = Condition::And(vec![
            atom("a", vec![Term::var("v")]),
            atom("b", vec![Term::var("v")]),
        ]);
        let matches = match_condition(&cond, &Bindings::new(), &store);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].1, 0.3);
    }

    #[test]
    fn empty_and_matches_trivially() {
        let store = FactStore::new();
        let matches = match_and(&[], &Bindings::new(), &store);
        assert_eq!(matches, vec![(Bindings::new(), 1.0)]);
    }

    #[test]
    fn or_deduplicates_keeping_the_maximum() {
        let mut store = FactStore::new();
        store.insert_or_combine(Fact::new("has-wings", vec!["bird".into()], 0.9));
        store.insert_or_combine(Fact::new("is-airplane", vec!["jet".into()], 1.0));

        let cond = Condition::Or(vec![
            atom("has-wings", vec![Term::var("x")]),
            atom("is-airplane", vec![Term::var("x")]),
        ]);
        let matches = match_condition(&cond, &Bindings::new(), &store);
        assert_eq!(matches.len(), 2);
    }

    #[test]
    fn not_matches_when_child_has_no_extensions() {
        let store = FactStore::new();
        let cond = Condition::Not(Box::new(atom("p", vec![Term::symbol("x")])));
        let matches = match_condition(&cond, &Bindings::new(), &store);
        assert_eq!(matches, vec![(Bindings::new(), 1.0)]);
    }

    #[test]
    fn not_fails_when_child_has_an_extension() {
        let mut store = FactStore::new();
        store.insert_or_combine(Fact::new("p", vec!["x".into()], 1.0));
        let cond = Condition::Not(Box::new(atom("p", vec![Term::symbol("x")])));
        let matches = match_condition(&cond, &Bindings::new(), &store);
        assert!(matches.is_empty());
    }

    #[test]
    fn degree_constraint_rejects_candidates() {
        let mut store = FactStore::new();
        store.insert_or_combine(Fact::new("is-zebra", vec!["sam".into()], 0.3));

        let cond = Condition::Atom(AtomCondition {
            predicate: "is-zebra".into(),
            args: vec![Term::var("x")],
            degree_var: Some("d".into()),
            degree_constraint: Some(DegreeConstraint {
                op: ComparisonOp::Gt,
                lhs: DegreeOperand::Var("d".into()),
                rhs: DegreeOperand::Literal(0.5),
            }),
        });
        let matches = match_condition(&cond, &Bindings::new(), &store);
        assert!(matches.is_empty());
    }
}
