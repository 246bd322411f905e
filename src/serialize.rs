// SPDX-License-Identifier: PMPL-1.0-or-later

//! The text schema (spec.md §6): conversion between the untyped JSON/YAML
//! wire shapes and the typed `model` nodes.
//!
//! Conditions and actions mix fixed keys (`pred`, `args`) with heterogeneous
//! arrays (`[op, operand, operand]`), which don't round-trip cleanly through
//! a derived `Deserialize` the way `Fact` does — so this module walks
//! `serde_json::Value` by hand, the way the teacher's
//! `kanren::rules::RuleSpec::to_logic_rule` turns its own loosely-typed spec
//! struct into `LogicRule`/`LogicFact`.

use crate::error::SerializationError;
use crate::model::{
    Action, ArithOp, AtomCondition, ComparisonOp, Condition, DegreeConstraint, DegreeExpr,
    DegreeOperand, Fact, FactTemplate, Rule,
};
use crate::term::Term;
use serde_json::{json, Value};
use std::path::Path;

fn schema_err(msg: impl Into<String>) -> SerializationError {
    SerializationError::Schema(msg.into())
}

fn parse_var(raw: &str) -> Result<String, SerializationError> {
    match Term::parse(raw) {
        Term::Var(name) => Ok(name),
        Term::Symbol(_) => Err(schema_err(format!(
            "expected a '?variable' reference, got {raw:?}"
        ))),
    }
}

fn arith_op_str(op: ArithOp) -> &'static str {
    match op {
        ArithOp::Add => "+",
        ArithOp::Sub => "-",
        ArithOp::Mul => "*",
        ArithOp::Div => "/",
        ArithOp::Min => "min",
        ArithOp::Max => "max",
    }
}

fn comparison_op_str(op: ComparisonOp) -> &'static str {
    match op {
        ComparisonOp::Lt => "<",
        ComparisonOp::Le => "<=",
        ComparisonOp::Eq => "=",
        ComparisonOp::Ne => "!=",
        ComparisonOp::Ge => ">=",
        ComparisonOp::Gt => ">",
    }
}

// ---------------------------------------------------------------- degrees

pub fn degree_operand_from_value(value: &Value) -> Result<DegreeOperand, SerializationError> {
    if let Some(n) = value.as_f64() {
        return Ok(DegreeOperand::Literal(n));
    }
    if let Some(s) = value.as_str() {
        return Ok(DegreeOperand::Var(parse_var(s)?));
    }
    Err(schema_err(
        "degree operand must be a number or a '?variable' string",
    ))
}

fn degree_operand_to_value(operand: &DegreeOperand) -> Value {
    match operand {
        DegreeOperand::Literal(n) => json!(n),
        DegreeOperand::Var(name) => json!(format!("?{name}")),
    }
}

fn degree_constraint_from_value(value: &Value) -> Result<DegreeConstraint, SerializationError> {
    let arr = value
        .as_array()
        .ok_or_else(|| schema_err("'deg-pred' must be an array"))?;
    if arr.len() != 3 {
        return Err(schema_err("'deg-pred' must have exactly 3 elements"));
    }
    let op_str = arr[0]
        .as_str()
        .ok_or_else(|| schema_err("'deg-pred' operator must be a string"))?;
    let op = ComparisonOp::parse(op_str).map_err(|e| schema_err(e.to_string()))?;
    let lhs = degree_operand_from_value(&arr[1])?;
    let rhs = degree_operand_from_value(&arr[2])?;
    Ok(DegreeConstraint { op, lhs, rhs })
}

fn degree_constraint_to_value(constraint: &DegreeConstraint) -> Value {
    json!([
        comparison_op_str(constraint.op),
        degree_operand_to_value(&constraint.lhs),
        degree_operand_to_value(&constraint.rhs),
    ])
}

pub fn degree_expr_from_value(value: &Value) -> Result<DegreeExpr, SerializationError> {
    if let Some(n) = value.as_f64() {
        return Ok(DegreeExpr::Literal(n));
    }
    if let Some(s) = value.as_str() {
        return Ok(DegreeExpr::Var(parse_var(s)?));
    }
    if let Some(arr) = value.as_array() {
        if arr.is_empty() {
            return Err(schema_err("degree expression array must not be empty"));
        }
        let op_str = arr[0]
            .as_str()
            .ok_or_else(|| schema_err("degree expression operator must be a string"))?;
        let op = ArithOp::parse(op_str).map_err(|e| schema_err(e.to_string()))?;
        let operands = arr[1..]
            .iter()
            .map(degree_expr_from_value)
            .collect::<Result<Vec<_>, _>>()?;
        return Ok(DegreeExpr::Op(op, operands));
    }
    Err(schema_err(
        "degree expression must be a number, a '?variable' string, or an [op, ...] array",
    ))
}

pub fn degree_expr_to_value(expr: &DegreeExpr) -> Value {
    match expr {
        DegreeExpr::Literal(n) => json!(n),
        DegreeExpr::Var(name) => json!(format!("?{name}")),
        DegreeExpr::Op(op, operands) => {
            let mut arr = vec![json!(arith_op_str(*op))];
            arr.extend(operands.iter().map(degree_expr_to_value));
            Value::Array(arr)
        }
    }
}

// ------------------------------------------------------------- conditions

pub fn condition_from_value(value: &Value) -> Result<Condition, SerializationError> {
    let obj = value
        .as_object()
        .ok_or_else(|| schema_err("condition must be an object"))?;

    if let Some(children) = obj.get("and") {
        let children = children
            .as_array()
            .ok_or_else(|| schema_err("'and' must be an array"))?;
        return Ok(Condition::And(
            children
                .iter()
                .map(condition_from_value)
                .collect::<Result<_, _>>()?,
        ));
    }
    if let Some(children) = obj.get("or") {
        let children = children
            .as_array()
            .ok_or_else(|| schema_err("'or' must be an array"))?;
        return Ok(Condition::Or(
            children
                .iter()
                .map(condition_from_value)
                .collect::<Result<_, _>>()?,
        ));
    }
    if let Some(child) = obj.get("not") {
        return Ok(Condition::Not(Box::new(condition_from_value(child)?)));
    }

    let predicate = obj
        .get("pred")
        .and_then(Value::as_str)
        .ok_or_else(|| schema_err("atom condition missing 'pred'"))?
        .to_string();
    let args = obj
        .get("args")
        .and_then(Value::as_array)
        .ok_or_else(|| schema_err("atom condition missing 'args'"))?
        .iter()
        .map(|a| {
            a.as_str()
                .map(Term::parse)
                .ok_or_else(|| schema_err("condition args must be strings"))
        })
        .collect::<Result<Vec<_>, _>>()?;

    let degree_var = match obj.get("deg") {
        Some(Value::String(s)) => Some(parse_var(s)?),
        Some(_) => return Err(schema_err("condition 'deg' must be a string")),
        None => None,
    };

    let degree_constraint = obj
        .get("deg-pred")
        .map(degree_constraint_from_value)
        .transpose()?;

    Ok(Condition::Atom(AtomCondition {
        predicate,
        args,
        degree_var,
        degree_constraint,
    }))
}

pub fn condition_to_value(condition: &Condition) -> Value {
    match condition {
        Condition::And(children) => json!({
            "and": children.iter().map(condition_to_value).collect::<Vec<_>>(),
        }),
        Condition::Or(children) => json!({
            "or": children.iter().map(condition_to_value).collect::<Vec<_>>(),
        }),
        Condition::Not(child) => json!({ "not": condition_to_value(child) }),
        Condition::Atom(atom) => {
            let mut obj = serde_json::Map::new();
            obj.insert("pred".into(), json!(atom.predicate));
            obj.insert(
                "args".into(),
                json!(atom.args.iter().map(Term::to_string).collect::<Vec<_>>()),
            );
            if let Some(dv) = &atom.degree_var {
                obj.insert("deg".into(), json!(format!("?{dv}")));
            }
            if let Some(constraint) = &atom.degree_constraint {
                obj.insert("deg-pred".into(), degree_constraint_to_value(constraint));
            }
            Value::Object(obj)
        }
    }
}

// ----------------------------------------------------------------- actions

pub fn fact_template_from_value(value: &Value) -> Result<FactTemplate, SerializationError> {
    let obj = value
        .as_object()
        .ok_or_else(|| schema_err("fact template must be an object"))?;
    let predicate = obj
        .get("pred")
        .and_then(Value::as_str)
        .ok_or_else(|| schema_err("fact template missing 'pred'"))?
        .to_string();
    let args = obj
        .get("args")
        .and_then(Value::as_array)
        .ok_or_else(|| schema_err("fact template missing 'args'"))?
        .iter()
        .map(|a| {
            a.as_str()
                .map(Term::parse)
                .ok_or_else(|| schema_err("fact template args must be strings"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    let degree = obj.get("deg").map(degree_expr_from_value).transpose()?;
    Ok(FactTemplate {
        predicate,
        args,
        degree,
    })
}

pub fn fact_template_to_value(template: &FactTemplate) -> Value {
    let mut obj = serde_json::Map::new();
    obj.insert("pred".into(), json!(template.predicate));
    obj.insert(
        "args".into(),
        json!(template.args.iter().map(Term::to_string).collect::<Vec<_>>()),
    );
    if let Some(expr) = &template.degree {
        obj.insert("deg".into(), degree_expr_to_value(expr));
    }
    Value::Object(obj)
}

pub fn action_from_value(value: &Value) -> Result<Action, SerializationError> {
    let obj = value
        .as_object()
        .ok_or_else(|| schema_err("action must be an object"))?;
    let kind = obj
        .get("action")
        .and_then(Value::as_str)
        .ok_or_else(|| schema_err("action missing 'action' field"))?;
    let fact_value = obj
        .get("fact")
        .ok_or_else(|| schema_err("action missing 'fact' field"))?;
    let template = fact_template_from_value(fact_value)?;
    match kind {
        "add" => Ok(Action::Add(template)),
        "modify" => Ok(Action::Modify(template)),
        "remove" => Ok(Action::Retract(template)),
        other => Err(schema_err(format!("unknown action kind {other:?}"))),
    }
}

pub fn action_to_value(action: &Action) -> Value {
    let (kind, template) = match action {
        Action::Add(t) => ("add", t),
        Action::Modify(t) => ("modify", t),
        Action::Retract(t) => ("remove", t),
    };
    json!({
        "action": kind,
        "fact": fact_template_to_value(template),
    })
}

// ------------------------------------------------------------------- rules

pub fn rule_from_value(value: &Value) -> Result<Rule, SerializationError> {
    let obj = value
        .as_object()
        .ok_or_else(|| schema_err("rule must be an object"))?;
    let name = obj.get("name").and_then(Value::as_str).map(str::to_string);
    let description = obj
        .get("description")
        .and_then(Value::as_str)
        .map(str::to_string);
    let priority = obj.get("priority").and_then(Value::as_i64).unwrap_or(0);

    let conditions = obj
        .get("cond")
        .and_then(Value::as_array)
        .ok_or_else(|| schema_err("rule missing 'cond'"))?
        .iter()
        .map(condition_from_value)
        .collect::<Result<Vec<_>, _>>()?;

    let actions = obj
        .get("actions")
        .and_then(Value::as_array)
        .ok_or_else(|| schema_err("rule missing 'actions'"))?
        .iter()
        .map(action_from_value)
        .collect::<Result<Vec<_>, _>>()?;

    let rule = Rule {
        name,
        description,
        priority,
        conditions,
        actions,
    };
    rule.validate()?;
    Ok(rule)
}

pub fn rule_to_value(rule: &Rule) -> Value {
    let mut obj = serde_json::Map::new();
    if let Some(name) = &rule.name {
        obj.insert("name".into(), json!(name));
    }
    if let Some(description) = &rule.description {
        obj.insert("description".into(), json!(description));
    }
    obj.insert("priority".into(), json!(rule.priority));
    obj.insert(
        "cond".into(),
        json!(rule
            .conditions
            .iter()
            .map(condition_to_value)
            .collect::<Vec<_>>()),
    );
    obj.insert(
        "actions".into(),
        json!(rule
            .actions
            .iter()
            .map(action_to_value)
            .collect::<Vec<_>>()),
    );
    Value::Object(obj)
}

/// Deterministic rendering of a rule's conditions and actions, used by
/// `Rule::structural_fingerprint` for unnamed-rule identity. `serde_json`'s
/// `Value::Object` is backed by a `BTreeMap` (the `preserve_order` feature is
/// not enabled), so key order — and therefore this string — is stable across
/// equal rule bodies regardless of authoring order.
pub(crate) fn canonical_body(conditions: &[Condition], actions: &[Action]) -> String {
    let value = json!({
        "cond": conditions.iter().map(condition_to_value).collect::<Vec<_>>(),
        "actions": actions.iter().map(action_to_value).collect::<Vec<_>>(),
    });
    value.to_string()
}

// --------------------------------------------------------- knowledge base

/// The full text-schema document: `{facts: [...], rules: [...]}`.
pub fn to_dict(facts: &[Fact], rules: &[Rule]) -> Value {
    json!({
        "facts": facts,
        "rules": rules.iter().map(rule_to_value).collect::<Vec<_>>(),
    })
}

pub fn from_dict(value: &Value) -> Result<(Vec<Fact>, Vec<Rule>), SerializationError> {
    let obj = value
        .as_object()
        .ok_or_else(|| schema_err("knowledge base document must be an object"))?;

    let facts = match obj.get("facts") {
        Some(v) => {
            let arr = v
                .as_array()
                .ok_or_else(|| schema_err("'facts' must be an array"))?;
            arr.iter()
                .map(|f| {
                    let fact = serde_json::from_value::<Fact>(f.clone())?;
                    fact.validate()?;
                    Ok(fact)
                })
                .collect::<Result<Vec<_>, SerializationError>>()?
        }
        None => Vec::new(),
    };

    let rules = match obj.get("rules") {
        Some(v) => {
            let arr = v
                .as_array()
                .ok_or_else(|| schema_err("'rules' must be an array"))?;
            arr.iter()
                .map(rule_from_value)
                .collect::<Result<Vec<_>, _>>()?
        }
        None => Vec::new(),
    };

    Ok((facts, rules))
}

pub fn to_json_string(facts: &[Fact], rules: &[Rule]) -> Result<String, SerializationError> {
    Ok(serde_json::to_string_pretty(&to_dict(facts, rules))?)
}

pub fn from_json_str(text: &str) -> Result<(Vec<Fact>, Vec<Rule>), SerializationError> {
    let value: Value = serde_json::from_str(text)?;
    from_dict(&value)
}

pub fn to_yaml_string(facts: &[Fact], rules: &[Rule]) -> Result<String, SerializationError> {
    Ok(serde_yaml::to_string(&to_dict(facts, rules))?)
}

pub fn from_yaml_str(text: &str) -> Result<(Vec<Fact>, Vec<Rule>), SerializationError> {
    let value: Value = serde_yaml::from_str(text)?;
    from_dict(&value)
}

fn is_yaml_path(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|ext| ext.to_str()),
        Some("yaml") | Some("yml")
    )
}

/// Saves facts and rules to `path`. Suffix selects the format: `.yaml`/
/// `.yml` writes YAML, anything else writes JSON — unlike the teacher's
/// `AttackProfile::load`, an unrecognized suffix is not an error, it just
/// falls back to JSON (spec.md §6).
pub fn save_to_file(
    path: &Path,
    facts: &[Fact],
    rules: &[Rule],
) -> Result<(), SerializationError> {
    let content = if is_yaml_path(path) {
        to_yaml_string(facts, rules)?
    } else {
        to_json_string(facts, rules)?
    };
    std::fs::write(path, content)?;
    Ok(())
}

pub fn load_from_file(path: &Path) -> Result<(Vec<Fact>, Vec<Rule>), SerializationError> {
    let content = std::fs::read_to_string(path)?;
    if is_yaml_path(path) {
        from_yaml_str(&content)
    } else {
        from_json_str(&content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ArithOp;

    #[test]
    fn degree_expr_round_trips_through_value() {
        let expr = DegreeExpr::Op(
            ArithOp::Mul,
            vec![DegreeExpr::Literal(0.9), DegreeExpr::Var("d".into())],
        );
        let value = degree_expr_to_value(&expr);
        let parsed = degree_expr_from_value(&value).unwrap();
        assert_eq!(expr, parsed);
    }

    #[test]
    fn condition_and_round_trips() {
        let cond = Condition::And(vec![
            Condition::Atom(AtomCondition {
                predicate: "a".into(),
                args: vec![Term::var("x")],
                degree_var: None,
                degree_constraint: None,
            }),
            Condition::Atom(AtomCondition {
                predicate: "b".into(),
                args: vec![Term::symbol("y")],
                degree_var: Some("d".into()),
                degree_constraint: Some(DegreeConstraint {
                    op: ComparisonOp::Gt,
                    lhs: DegreeOperand::Var("d".into()),
                    rhs: DegreeOperand::Literal(0.5),
                }),
            }),
        ]);
        let value = condition_to_value(&cond);
        let parsed = condition_from_value(&value).unwrap();
        assert_eq!(cond, parsed);
    }

    #[test]
    fn rule_from_value_rejects_unbound_variable() {
        let value = json!({
            "name": "bad",
            "cond": [{"pred": "p", "args": ["?x"]}],
            "actions": [{"action": "add", "fact": {"pred": "q", "args": ["?y"]}}],
        });
        assert!(rule_from_value(&value).is_err());
    }

    #[test]
    fn rule_round_trips_through_value() {
        let value = json!({
            "name": "stripes",
            "priority": 3,
            "cond": [{
                "pred": "is-zebra",
                "args": ["?x"],
                "deg": "?d",
                "deg-pred": [">", "?d", 0.5],
            }],
            "actions": [{
                "action": "add",
                "fact": {"pred": "has-stripes", "args": ["?x"], "deg": ["*", 0.9, "?d"]},
            }],
        });
        let rule = rule_from_value(&value).unwrap();
        assert_eq!(rule.name.as_deref(), Some("stripes"));
        assert_eq!(rule.priority, 3);
        let back = rule_to_value(&rule);
        let reparsed = rule_from_value(&back).unwrap();
        assert_eq!(rule, reparsed);
    }

    #[test]
    fn to_dict_and_from_dict_round_trip_a_knowledge_base() {
        let facts = vec![Fact::new("is-zebra", vec!["sam".into()], 0.8)];
        let rules = vec![rule_from_value(&json!({
            "name": "stripes",
            "cond": [{"pred": "is-zebra", "args": ["?x"]}],
            "actions": [{"action": "add", "fact": {"pred": "has-stripes", "args": ["?x"]}}],
        }))
        .unwrap()];

        let dict = to_dict(&facts, &rules);
        let (round_facts, round_rules) = from_dict(&dict).unwrap();
        assert_eq!(round_facts, facts);
        assert_eq!(round_rules, rules);
    }

    #[test]
    fn from_dict_rejects_a_fact_with_degree_out_of_range() {
        let value = json!({
            "facts": [{"pred": "rainy", "args": ["today"], "deg": 1.5}],
            "rules": [],
        });
        assert!(matches!(
            from_dict(&value),
            Err(SerializationError::Validation(_))
        ));
    }

    #[test]
    fn from_dict_rejects_a_fact_with_an_empty_predicate() {
        let value = json!({
            "facts": [{"pred": "", "args": [], "deg": 1.0}],
            "rules": [],
        });
        assert!(matches!(
            from_dict(&value),
            Err(SerializationError::Validation(_))
        ));
    }

    #[test]
    fn unknown_file_suffix_falls_back_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.txt");
        let facts = vec![Fact::new("p", vec!["x".into()], 1.0)];
        let rules: Vec<Rule> = vec![];
        save_to_file(&path, &facts, &rules).unwrap();
        let content = std::fs::read_to_string(&path).unwrap();
        assert!(serde_json::from_str::<Value>(&content).is_ok());
        let (loaded_facts, _) = load_from_file(&path).unwrap();
        assert_eq!(loaded_facts, facts);
    }

    #[test]
    fn yaml_suffix_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("kb.yaml");
        let facts = vec![Fact::new("p", vec!["x".into()], 1.0)];
        let rules: Vec<Rule> = vec![];
        save_to_file(&path, &facts, &rules).unwrap();
        let (loaded_facts, loaded_rules) = load_from_file(&path).unwrap();
        assert_eq!(loaded_facts, facts);
        assert_eq!(loaded_rules, rules);
    }
}
