// SPDX-License-Identifier: PMPL-1.0-or-later

//! The read-only query interface (spec.md §4.6). Queries never mutate the
//! store and never run inference.

use crate::model::Fact;
use crate::store::FactStore;

/// Returns every stored fact whose predicate matches and whose arg pattern
/// matches positionally. `args` is `None` for "any arity, any values";
/// `Some(pattern)` requires the same arity, with `None` entries in the
/// pattern acting as a positional wildcard and `Some(value)` entries
/// requiring an exact match.
pub fn query(store: &FactStore, predicate: &str, args: Option<&[Option<String>]>) -> Vec<Fact> {
    store
        .scan(predicate)
        .into_iter()
        .filter(|fact| matches_pattern(fact, args))
        .collect()
}

fn matches_pattern(fact: &Fact, pattern: Option<&[Option<String>]>) -> bool {
    let Some(pattern) = pattern else {
        return true;
    };
    if pattern.len() != fact.args.len() {
        return false;
    }
    fact.args
        .iter()
        .zip(pattern.iter())
        .all(|(arg, slot)| match slot {
            None => true,
            Some(expected) => arg == expected,
        })
}
