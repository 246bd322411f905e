// SPDX-License-Identifier: PMPL-1.0-or-later

//! A fluent rule builder.
//!
//! This is a convenience on top of the core model (spec.md §9): the rule it
//! produces is indistinguishable from one loaded through the text schema —
//! `RuleBuilder::build` returns the same `Rule` type `serialize::rule_from_value`
//! produces, with the same eager validation applied.

use crate::error::ValidationError;
use crate::model::{Action, Condition, Rule};

#[derive(Debug, Default)]
pub struct RuleBuilder {
    name: Option<String>,
    description: Option<String>,
    priority: i64,
    conditions: Vec<Condition>,
    actions: Vec<Action>,
}

impl RuleBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn priority(mut self, priority: i64) -> Self {
        self.priority = priority;
        self
    }

    pub fn when(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    pub fn then(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Builds and validates the rule. Returns the same `ValidationError`
    /// kinds the text-schema loader would raise for an equivalent rule.
    pub fn build(self) -> Result<Rule, ValidationError> {
        let rule = Rule {
            name: self.name,
            description: self.description,
            priority: self.priority,
            conditions: self.conditions,
            actions: self.actions,
        };
        rule.validate()?;
        Ok(rule)
    }
}
