// SPDX-License-Identifier: PMPL-1.0-or-later

//! `fuzzy_infer` — a fuzzy forward-chaining production rule engine.
//!
//! A knowledge base holds facts annotated with a degree of belief in
//! `[0,1]` and a rule base describing how new facts are derived from
//! existing ones. The inference driver saturates the knowledge base by
//! repeatedly firing applicable rules to a fixed point, matching conditions
//! against facts through AND/OR/NOT combinators with variable binding and
//! degree constraints, combining duplicate facts by fuzzy-OR.
//!
//! ENGINE PIECES:
//! 1. **Matcher**: unifies rule conditions against the fact store,
//!    enumerating every binding extension.
//! 2. **Driver**: priority-ordered, fixed-point rule firing.
//! 3. **Merger**: combines two knowledge bases under five strategies,
//!    detecting and reporting conflicts.

pub mod bindings;
pub mod builder;
pub mod driver;
pub mod error;
pub mod kb;
pub mod matcher;
pub mod merge;
pub mod model;
pub mod ops;
pub mod query;
pub mod serialize;
pub mod store;
pub mod term;

pub use error::{EngineError, InferenceError, MergeError, SerializationError, ValidationError};
pub use kb::KnowledgeBase;
pub use merge::{Conflict, ConflictKind, MergeConfig, MergeStrategy};
pub use model::{
    Action, ArithOp, AtomCondition, ComparisonOp, Condition, DegreeConstraint, DegreeExpr,
    DegreeOperand, Fact, FactTemplate, Rule,
};
pub use term::Term;
