// SPDX-License-Identifier: PMPL-1.0-or-later

//! The four-kind error taxonomy for the engine.
//!
//! Each kind is its own `thiserror` enum so a caller can match on the
//! specific reason without losing the outer classification the spec
//! distinguishes: validation errors are raised eagerly by ingestion,
//! inference errors abort a `run`, serialization errors come from the
//! text-schema round trip, and merge errors come from `merge`.

use thiserror::Error;

/// Top-level error returned by every public operation on a `KnowledgeBase`.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Inference(#[from] InferenceError),

    #[error(transparent)]
    Serialization(#[from] SerializationError),

    #[error(transparent)]
    Merge(#[from] MergeError),
}

/// Malformed facts, rules, or merge-strategy requests caught at ingestion.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("fact degree {degree} for {predicate}({args:?}) is outside [0,1]")]
    DegreeOutOfRange {
        predicate: String,
        args: Vec<String>,
        degree: f64,
    },

    #[error("fact predicate must not be empty")]
    EmptyPredicate,

    #[error("rule {rule} has no conditions")]
    EmptyConditions { rule: String },

    #[error("rule {rule} references unbound variable {var} in {context}")]
    UnboundVariable {
        rule: String,
        var: String,
        context: &'static str,
    },

    #[error("unknown comparison operator {0:?}")]
    UnknownComparisonOp(String),

    #[error("unknown arithmetic operator {0:?}")]
    UnknownArithOp(String),

    #[error("unknown merge strategy {0:?}")]
    UnknownMergeStrategy(String),

    #[error("term {0:?} is not a valid variable (must start with '?')")]
    NotAVariable(String),
}

/// Errors raised while running the fixed-point driver.
#[derive(Debug, Error)]
pub enum InferenceError {
    #[error("max iterations ({0}) exceeded without reaching a fixed point")]
    MaxIterationsExceeded(u32),

    #[error("division by zero while evaluating a degree expression")]
    DivisionByZero,

    #[error("degree constraint references unbound variable {0}")]
    UnboundConstraintVariable(String),

    #[error("action template for {predicate} expects {expected} args, instantiation produced {actual}")]
    ArityMismatch {
        predicate: String,
        expected: usize,
        actual: usize,
    },

    #[error("action template for {predicate} references unbound variable {var}")]
    UnboundTemplateVariable { predicate: String, var: String },

    #[error("min/max degree expression requires at least one argument")]
    EmptyVariadicExpr,
}

/// Errors raised by the text-schema load/save path.
#[derive(Debug, Error)]
pub enum SerializationError {
    #[error("schema violation: {0}")]
    Schema(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A fact parsed from the text schema failed `Fact::validate` (spec.md
    /// §7: malformed facts are "raised eagerly by the ingestion path").
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

/// Errors raised by `merge`.
#[derive(Debug, Error)]
pub enum MergeError {
    #[error("WEIGHTED merge requires weights with w1 + w2 > 0, got ({0}, {1})")]
    InvalidWeights(f64, f64),

    #[error("SMART merge found unresolved conflicts and auto_resolve is false (strict mode requested)")]
    UnresolvedConflicts,
}
