// SPDX-License-Identifier: PMPL-1.0-or-later

//! The core data model: facts, conditions, degree expressions, actions, and
//! rules.
//!
//! Conditions and actions are modeled as tagged variants (sum types) per the
//! design note in spec.md §9 — a single parser (see `serialize`) turns the
//! untyped text schema into these typed nodes at load time, so the matcher
//! and driver never see an untyped shape.

use crate::error::ValidationError;
use crate::term::Term;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// A stored fact: `(predicate, args, degree)`. Identity is `(predicate,
/// args)`; the degree is the only mutable component.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fact {
    #[serde(rename = "pred")]
    pub predicate: String,
    pub args: Vec<String>,
    #[serde(rename = "deg", default = "default_degree")]
    pub degree: f64,
}

fn default_degree() -> f64 {
    1.0
}

impl Fact {
    pub fn new(predicate: impl Into<String>, args: Vec<String>, degree: f64) -> Self {
        Self {
            predicate: predicate.into(),
            args,
            degree,
        }
    }

    /// Validates the invariants spec.md §3 requires of every stored fact:
    /// non-empty predicate, degree in `[0,1]`.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.predicate.is_empty() {
            return Err(ValidationError::EmptyPredicate);
        }
        if !(0.0..=1.0).contains(&self.degree) {
            return Err(ValidationError::DegreeOutOfRange {
                predicate: self.predicate.clone(),
                args: self.args.clone(),
                degree: self.degree,
            });
        }
        Ok(())
    }

    pub fn key(&self) -> FactKey {
        (self.predicate.clone(), self.args.clone())
    }
}

/// The `(predicate, args)` identity of a fact; used as the fact store's key.
pub type FactKey = (String, Vec<String>);

/// A comparator used in a degree constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ComparisonOp {
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "=")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = ">")]
    Gt,
}

impl ComparisonOp {
    pub fn apply(self, lhs: f64, rhs: f64) -> bool {
        match self {
            ComparisonOp::Lt => lhs < rhs,
            ComparisonOp::Le => lhs <= rhs,
            ComparisonOp::Eq => lhs == rhs,
            ComparisonOp::Ne => lhs != rhs,
            ComparisonOp::Ge => lhs >= rhs,
            ComparisonOp::Gt => lhs > rhs,
        }
    }

    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw {
            "<" => Ok(ComparisonOp::Lt),
            "<=" => Ok(ComparisonOp::Le),
            "=" => Ok(ComparisonOp::Eq),
            "!=" => Ok(ComparisonOp::Ne),
            ">=" => Ok(ComparisonOp::Ge),
            ">" => Ok(ComparisonOp::Gt),
            other => Err(ValidationError::UnknownComparisonOp(other.to_string())),
        }
    }
}

/// One operand of a degree constraint: either a numeric literal or a degree
/// variable resolved from the bindings in scope at evaluation time. Parsed
/// from the text schema by `serialize::degree_operand_from_value`.
#[derive(Debug, Clone, PartialEq)]
pub enum DegreeOperand {
    Literal(f64),
    Var(String),
}

/// `[op, lhs, rhs]`. Evaluation requires every referenced variable to be
/// bound, otherwise the constraint fails (spec.md §3).
#[derive(Debug, Clone, PartialEq)]
pub struct DegreeConstraint {
    pub op: ComparisonOp,
    pub lhs: DegreeOperand,
    pub rhs: DegreeOperand,
}

/// An n-ary arithmetic operator usable in a degree expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithOp {
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "min")]
    Min,
    #[serde(rename = "max")]
    Max,
}

impl ArithOp {
    pub fn parse(raw: &str) -> Result<Self, ValidationError> {
        match raw {
            "+" => Ok(ArithOp::Add),
            "-" => Ok(ArithOp::Sub),
            "*" => Ok(ArithOp::Mul),
            "/" => Ok(ArithOp::Div),
            "min" => Ok(ArithOp::Min),
            "max" => Ok(ArithOp::Max),
            other => Err(ValidationError::UnknownArithOp(other.to_string())),
        }
    }
}

/// A numeric literal, a variable resolved at action time, or an n-ary
/// arithmetic form over nested degree expressions.
#[derive(Debug, Clone, PartialEq)]
pub enum DegreeExpr {
    Literal(f64),
    Var(String),
    Op(ArithOp, Vec<DegreeExpr>),
}

impl DegreeExpr {
    /// Every variable name referenced anywhere in this expression.
    pub fn variables(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_variables(&mut out);
        out
    }

    fn collect_variables<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            DegreeExpr::Literal(_) => {}
            DegreeExpr::Var(v) => out.push(v),
            DegreeExpr::Op(_, args) => {
                for a in args {
                    a.collect_variables(out);
                }
            }
        }
    }
}

/// A tagged condition node: an atom match, or a logical combinator over
/// child conditions.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    Atom(AtomCondition),
    And(Vec<Condition>),
    Or(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    /// Every degree variable this condition (or its children) binds via
    /// `degree_var`, or references in a `degree_constraint`. Used to check
    /// invariant 4 of spec.md §3 (every variable an action/constraint needs
    /// must be bound by some condition of the same rule).
    pub fn bound_term_vars(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_term_vars(&mut out);
        out
    }

    fn collect_term_vars<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Condition::Atom(atom) => {
                for term in &atom.args {
                    if let Some(name) = term.var_name() {
                        out.push(name);
                    }
                }
            }
            Condition::And(children) | Condition::Or(children) => {
                for c in children {
                    c.collect_term_vars(out);
                }
            }
            // NOT never extends bindings (spec.md §4.2), so its child's
            // variables are not considered bound by this condition.
            Condition::Not(_) => {}
        }
    }

    pub fn bound_degree_vars(&self) -> Vec<&str> {
        let mut out = Vec::new();
        self.collect_degree_vars(&mut out);
        out
    }

    fn collect_degree_vars<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            Condition::Atom(atom) => {
                if let Some(dv) = &atom.degree_var {
                    out.push(dv);
                }
            }
            Condition::And(children) | Condition::Or(children) => {
                for c in children {
                    c.collect_degree_vars(out);
                }
            }
            Condition::Not(_) => {}
        }
    }
}

/// `Atom{predicate, args, degree_var?, degree_constraint?}`.
#[derive(Debug, Clone, PartialEq)]
pub struct AtomCondition {
    pub predicate: String,
    pub args: Vec<Term>,
    pub degree_var: Option<String>,
    pub degree_constraint: Option<DegreeConstraint>,
}

/// A fact template used by an action: terms are substituted from bindings,
/// and the degree expression is evaluated, at instantiation time.
#[derive(Debug, Clone, PartialEq)]
pub struct FactTemplate {
    pub predicate: String,
    pub args: Vec<Term>,
    pub degree: Option<DegreeExpr>,
}

/// A tagged action node.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    Add(FactTemplate),
    Retract(FactTemplate),
    Modify(FactTemplate),
}

impl Action {
    pub fn template(&self) -> &FactTemplate {
        match self {
            Action::Add(t) | Action::Retract(t) | Action::Modify(t) => t,
        }
    }
}

/// `(name?, conditions, actions, priority, description?)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub name: Option<String>,
    pub description: Option<String>,
    pub priority: i64,
    pub conditions: Vec<Condition>,
    pub actions: Vec<Action>,
}

impl Rule {
    /// Validates spec.md §3 invariant 4: every variable referenced in a
    /// condition's degree constraint or in any action of this rule must be
    /// bound by some condition of the rule. Also rejects an empty condition
    /// list per spec.md §7's "malformed rule" list — spec.md §7 and §8 name
    /// opposite behaviours for this case; SPEC_FULL.md §9 pins this
    /// implementation to §7's validation error.
    pub fn validate(&self) -> Result<(), ValidationError> {
        let label = || self.identity_label();

        if self.conditions.is_empty() {
            return Err(ValidationError::EmptyConditions { rule: label() });
        }

        let mut bound_terms: Vec<&str> = Vec::new();
        let mut bound_degrees: Vec<&str> = Vec::new();
        for cond in &self.conditions {
            bound_terms.extend(cond.bound_term_vars());
            bound_degrees.extend(cond.bound_degree_vars());

            if let Condition::Atom(atom) = cond {
                if let Some(constraint) = &atom.degree_constraint {
                    for operand in [&constraint.lhs, &constraint.rhs] {
                        if let DegreeOperand::Var(v) = operand {
                            if !bound_degrees.contains(&v.as_str()) {
                                return Err(ValidationError::UnboundVariable {
                                    rule: label(),
                                    var: v.clone(),
                                    context: "degree_constraint",
                                });
                            }
                        }
                    }
                }
            }
        }

        for action in &self.actions {
            let template = action.template();
            for term in &template.args {
                if let Some(name) = term.var_name() {
                    if !bound_terms.contains(&name) {
                        return Err(ValidationError::UnboundVariable {
                            rule: label(),
                            var: name.to_string(),
                            context: "action args",
                        });
                    }
                }
            }
            if let Some(expr) = &template.degree {
                for var in expr.variables() {
                    if !bound_degrees.contains(&var) {
                        return Err(ValidationError::UnboundVariable {
                            rule: label(),
                            var: var.to_string(),
                            context: "action degree expression",
                        });
                    }
                }
            }
        }

        Ok(())
    }

    fn identity_label(&self) -> String {
        self.name.clone().unwrap_or_else(|| "<unnamed>".to_string())
    }

    /// Identity for conflict detection: `name` when present, else a
    /// structural fingerprint of conditions+actions (spec.md §3). The
    /// fingerprint hashes a canonical JSON rendering rather than deriving
    /// `Hash` directly, since `DegreeExpr`/`DegreeConstraint` hold `f64`
    /// values that do not implement `Eq`/`Hash`.
    pub fn identity(&self) -> String {
        match &self.name {
            Some(name) => name.clone(),
            None => format!("#{:016x}", self.structural_fingerprint()),
        }
    }

    pub fn structural_fingerprint(&self) -> u64 {
        let canonical = crate::serialize::canonical_body(&self.conditions, &self.actions);
        let mut hasher = DefaultHasher::new();
        canonical.hash(&mut hasher);
        hasher.finish()
    }
}
