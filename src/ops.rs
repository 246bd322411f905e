// SPDX-License-Identifier: PMPL-1.0-or-later

//! Fuzzy operators: T-norms, T-conorms, negations, hedges, and the
//! degree-expression / degree-constraint evaluators.
//!
//! The reference driver (see `driver`) only ever uses `and_min`, `or_max`,
//! and `negate_standard` — the rest are exposed for callers building their
//! own inference semantics on top of the same fact store and matcher,
//! mirroring how `rust-fuzzylogic`'s `eval_antecedent` exposes a fixed
//! Min-Max family while still naming the alternates in its operator module.

use crate::bindings::Bindings;
use crate::error::InferenceError;
use crate::model::{ArithOp, ComparisonOp, DegreeConstraint, DegreeExpr, DegreeOperand};

// --- T-norms (AND) ---------------------------------------------------

pub fn and_min(a: f64, b: f64) -> f64 {
    a.min(b)
}

pub fn and_product(a: f64, b: f64) -> f64 {
    a * b
}

pub fn and_lukasiewicz(a: f64, b: f64) -> f64 {
    (a + b - 1.0).max(0.0)
}

// --- T-conorms (OR) ----------------------------------------------------

pub fn or_max(a: f64, b: f64) -> f64 {
    a.max(b)
}

pub fn or_probabilistic(a: f64, b: f64) -> f64 {
    a + b - a * b
}

pub fn or_bounded(a: f64, b: f64) -> f64 {
    (a + b).min(1.0)
}

// --- Negations -----------------------------------------------------------

pub fn negate_standard(a: f64) -> f64 {
    1.0 - a
}

/// Sugeno negation, valid for `lambda > -1`.
pub fn negate_sugeno(a: f64, lambda: f64) -> f64 {
    (1.0 - a) / (1.0 + lambda * a)
}

/// Yager negation, valid for `w > 0`.
pub fn negate_yager(a: f64, w: f64) -> f64 {
    (1.0 - a.powf(w)).powf(1.0 / w)
}

// --- Hedges (power modifiers) --------------------------------------------

pub fn hedge_power(a: f64, p: f64) -> f64 {
    a.powf(p)
}

pub fn very(a: f64) -> f64 {
    hedge_power(a, 2.0)
}

pub fn somewhat(a: f64) -> f64 {
    hedge_power(a, 0.5)
}

pub fn extremely(a: f64) -> f64 {
    hedge_power(a, 3.0)
}

// --- Degree expression / constraint evaluation --------------------------

/// Evaluates a degree expression under the given bindings, clamping the
/// final result to `[0,1]` per spec.md §3. Intermediate arithmetic is not
/// clamped — only the value ultimately stored is.
pub fn eval_degree_expr(expr: &DegreeExpr, bindings: &Bindings) -> Result<f64, InferenceError> {
    Ok(eval_unclamped(expr, bindings)?.clamp(0.0, 1.0))
}

/// Evaluates without clamping, for callers (degree constraints) that need
/// the raw value rather than a clamped belief.
pub fn eval_unclamped(expr: &DegreeExpr, bindings: &Bindings) -> Result<f64, InferenceError> {
    match expr {
        DegreeExpr::Literal(v) => Ok(*v),
        DegreeExpr::Var(name) => bindings
            .degree(name)
            .ok_or_else(|| InferenceError::UnboundConstraintVariable(name.clone())),
        DegreeExpr::Op(op, args) => eval_arith(*op, args, bindings),
    }
}

fn eval_arith(op: ArithOp, args: &[DegreeExpr], bindings: &Bindings) -> Result<f64, InferenceError> {
    if args.is_empty() {
        return Err(InferenceError::EmptyVariadicExpr);
    }
    let values: Result<Vec<f64>, InferenceError> =
        args.iter().map(|a| eval_unclamped(a, bindings)).collect();
    let values = values?;

    match op {
        ArithOp::Add => Ok(values.iter().sum()),
        ArithOp::Sub => Ok(values[1..].iter().fold(values[0], |acc, v| acc - v)),
        ArithOp::Mul => Ok(values.iter().product()),
        ArithOp::Div => {
            let mut acc = values[0];
            for v in &values[1..] {
                if *v == 0.0 {
                    return Err(InferenceError::DivisionByZero);
                }
                acc /= v;
            }
            Ok(acc)
        }
        ArithOp::Min => Ok(values.iter().cloned().fold(f64::INFINITY, f64::min)),
        ArithOp::Max => Ok(values.iter().cloned().fold(f64::NEG_INFINITY, f64::max)),
    }
}

/// Resolves a degree constraint operand, failing if it names an unbound
/// variable.
fn resolve_operand(operand: &DegreeOperand, bindings: &Bindings) -> Result<f64, InferenceError> {
    match operand {
        DegreeOperand::Literal(v) => Ok(*v),
        DegreeOperand::Var(name) => bindings
            .degree(name)
            .ok_or_else(|| InferenceError::UnboundConstraintVariable(name.clone())),
    }
}

/// Evaluates a degree constraint. Returns `Ok(false)` (rather than an error)
/// when an operand variable is unbound, matching spec.md §3 "evaluation
/// requires all referenced variables to be bound; otherwise the constraint
/// fails" — failure here means the candidate match is rejected, not that
/// the whole rule evaluation aborts.
pub fn eval_constraint(constraint: &DegreeConstraint, bindings: &Bindings) -> bool {
    let lhs = resolve_operand(&constraint.lhs, bindings);
    let rhs = resolve_operand(&constraint.rhs, bindings);
    match (lhs, rhs) {
        (Ok(l), Ok(r)) => constraint.op.apply(l, r),
        _ => false,
    }
}
