// SPDX-License-Identifier: PMPL-1.0-or-later

//! Variable bindings produced while matching a rule's conditions.
//!
//! Modeled on the teacher's `kanren::core::Substitution` (a walk/unify map
//! keyed by variable), split into two maps because this engine's variables
//! carry two different kinds of value: a term variable resolves to a ground
//! symbol, a degree variable resolves to a real number.

use std::collections::HashMap;

/// A partial map from variable name to bound value, grown monotonically
/// during a single condition evaluation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bindings {
    terms: HashMap<String, String>,
    degrees: HashMap<String, f64>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(&self, var: &str) -> Option<&str> {
        self.terms.get(var).map(String::as_str)
    }

    pub fn degree(&self, var: &str) -> Option<f64> {
        self.degrees.get(var).copied()
    }

    /// Binds a term variable to a ground symbol, extending a clone of
    /// `self`. Fails if the variable is already bound to a different
    /// symbol; succeeds as a no-op if it is already bound to the same one.
    pub fn with_term(&self, var: &str, value: &str) -> Option<Bindings> {
        if let Some(existing) = self.terms.get(var) {
            return if existing == value {
                Some(self.clone())
            } else {
                None
            };
        }
        let mut next = self.clone();
        next.terms.insert(var.to_string(), value.to_string());
        Some(next)
    }

    /// Binds a degree variable to a real, extending a clone of `self`.
    /// Fails if already bound to a different value (exact equality, since
    /// the only source of a degree binding is a stored fact's degree).
    pub fn with_degree(&self, var: &str, value: f64) -> Option<Bindings> {
        if let Some(&existing) = self.degrees.get(var) {
            return if existing == value {
                Some(self.clone())
            } else {
                None
            };
        }
        let mut next = self.clone();
        next.degrees.insert(var.to_string(), value);
        Some(next)
    }

    pub fn is_term_bound(&self, var: &str) -> bool {
        self.terms.contains_key(var)
    }

    pub fn is_degree_bound(&self, var: &str) -> bool {
        self.degrees.contains_key(var)
    }
}
