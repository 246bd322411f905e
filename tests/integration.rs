// SPDX-License-Identifier: PMPL-1.0-or-later

//! End-to-end scenarios from spec.md §8, exercised through the public
//! `KnowledgeBase` surface rather than the internal driver/matcher modules
//! directly.

use fuzzy_infer::builder::RuleBuilder;
use fuzzy_infer::merge::{MergeConfig, MergeStrategy};
use fuzzy_infer::model::{
    Action, ArithOp, AtomCondition, ComparisonOp, Condition, DegreeConstraint, DegreeExpr,
    DegreeOperand, FactTemplate,
};
use fuzzy_infer::{Fact, KnowledgeBase, Term};

fn atom(predicate: &str, args: Vec<Term>) -> Condition {
    Condition::Atom(AtomCondition {
        predicate: predicate.to_string(),
        args,
        degree_var: None,
        degree_constraint: None,
    })
}

#[test]
fn zebra_stripes_scenario() {
    let mut kb = KnowledgeBase::new();
    kb.add_fact(Fact::new("is-zebra", vec!["sam".into()], 0.8)).unwrap();

    let rule = RuleBuilder::new()
        .name("stripes")
        .when(Condition::Atom(AtomCondition {
            predicate: "is-zebra".into(),
            args: vec![Term::var("x")],
            degree_var: Some("d".into()),
            degree_constraint: Some(DegreeConstraint {
                op: ComparisonOp::Gt,
                lhs: DegreeOperand::Var("d".into()),
                rhs: DegreeOperand::Literal(0.5),
            }),
        }))
        .then(Action::Add(FactTemplate {
            predicate: "has-stripes".into(),
            args: vec![Term::var("x")],
            degree: Some(DegreeExpr::Op(
                ArithOp::Mul,
                vec![DegreeExpr::Literal(0.9), DegreeExpr::Var("d".into())],
            )),
        }))
        .build()
        .unwrap();
    kb.add_rule(rule).unwrap();

    kb.run(100).unwrap();

    let results = kb.query("has-stripes", Some(&[Some("sam".to_string())]));
    assert_eq!(results.len(), 1);
    assert!((results[0].degree - 0.72).abs() < 1e-9);
}

#[test]
fn fuzzy_or_combine_scenario() {
    let mut kb = KnowledgeBase::new();
    kb.add_fact(Fact::new("rainy", vec!["today".into()], 0.4)).unwrap();
    kb.add_fact(Fact::new("rainy", vec!["today".into()], 0.7)).unwrap();

    let results = kb.query("rainy", None);
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].degree, 0.7);

    kb.add_fact(Fact::new("rainy", vec!["today".into()], 0.3)).unwrap();
    let results = kb.query("rainy", None);
    assert_eq!(results[0].degree, 0.7);
}

#[test]
fn all_matches_fire_scenario() {
    let mut kb = KnowledgeBase::new();
    kb.add_fact(Fact::new("is-mammal", vec!["dog".into()], 1.0)).unwrap();
    kb.add_fact(Fact::new("is-mammal", vec!["cat".into()], 1.0)).unwrap();

    let rule = RuleBuilder::new()
        .name("warm-blooded")
        .when(atom("is-mammal", vec![Term::var("x")]))
        .then(Action::Add(FactTemplate {
            predicate: "warm-blooded".into(),
            args: vec![Term::var("x")],
            degree: Some(DegreeExpr::Literal(1.0)),
        }))
        .build()
        .unwrap();
    kb.add_rule(rule).unwrap();

    kb.run(100).unwrap();

    let results = kb.query("warm-blooded", None);
    assert_eq!(results.len(), 2);
}

#[test]
fn or_combinator_scenario() {
    let mut kb = KnowledgeBase::new();
    kb.add_fact(Fact::new("has-wings", vec!["bird".into()], 0.9)).unwrap();
    kb.add_fact(Fact::new("is-airplane", vec!["jet".into()], 1.0)).unwrap();

    let rule = RuleBuilder::new()
        .name("can-fly")
        .when(Condition::Or(vec![
            atom("has-wings", vec![Term::var("x")]),
            atom("is-airplane", vec![Term::var("x")]),
        ]))
        .then(Action::Add(FactTemplate {
            predicate: "can-fly".into(),
            args: vec![Term::var("x")],
            degree: None,
        }))
        .build()
        .unwrap();
    kb.add_rule(rule).unwrap();

    kb.run(100).unwrap();

    let results = kb.query("can-fly", None);
    let subjects: Vec<&str> = results.iter().map(|f| f.args[0].as_str()).collect();
    assert_eq!(results.len(), 2);
    assert!(subjects.contains(&"bird"));
    assert!(subjects.contains(&"jet"));
}

#[test]
fn priority_ordering_scenario() {
    let mut kb = KnowledgeBase::new();
    kb.add_fact(Fact::new("seed", vec!["x".into()], 1.0)).unwrap();

    let high = RuleBuilder::new()
        .name("high")
        .priority(10)
        .when(atom("seed", vec![Term::var("x")]))
        .then(Action::Add(FactTemplate {
            predicate: "derived".into(),
            args: vec![Term::var("x")],
            degree: Some(DegreeExpr::Literal(0.6)),
        }))
        .build()
        .unwrap();
    let low = RuleBuilder::new()
        .name("low")
        .priority(0)
        .when(atom("seed", vec![Term::var("x")]))
        .then(Action::Add(FactTemplate {
            predicate: "derived".into(),
            args: vec![Term::var("x")],
            degree: Some(DegreeExpr::Literal(0.9)),
        }))
        .build()
        .unwrap();
    kb.add_rules(vec![high, low]).unwrap();

    kb.run(100).unwrap();

    let results = kb.query("derived", Some(&[Some("x".to_string())]));
    assert_eq!(results[0].degree, 0.9);
}

#[test]
fn smart_merge_contradiction_scenario() {
    let mut kb1 = KnowledgeBase::new();
    kb1.add_fact(Fact::new("age", vec!["alice".into(), "young".into()], 0.9))
        .unwrap();
    let mut kb2 = KnowledgeBase::new();
    kb2.add_fact(Fact::new("age", vec!["alice".into(), "young".into()], 0.1))
        .unwrap();

    let config = MergeConfig {
        threshold: 0.5,
        exclusion_families: Vec::new(),
        auto_resolve: true,
        strict: false,
    };
    let merged = kb1.merge(&kb2, MergeStrategy::Smart, &config).unwrap();

    let results = merged.query(
        "age",
        Some(&[Some("alice".to_string()), Some("young".to_string())]),
    );
    assert_eq!(results[0].degree, 0.9);

    let conflicts = merged.conflict_report();
    assert_eq!(conflicts.len(), 1);
    assert!((conflicts[0].severity - 0.8).abs() < 1e-9);
}

#[test]
fn empty_knowledge_base_runs_successfully() {
    let mut kb = KnowledgeBase::new();
    kb.run(10).unwrap();
    assert!(kb.get_facts().is_empty());
}

#[test]
fn rule_with_empty_conditions_is_rejected_at_construction() {
    let mut kb = KnowledgeBase::new();
    let rule = fuzzy_infer::model::Rule {
        name: Some("always".into()),
        description: None,
        priority: 0,
        conditions: vec![],
        actions: vec![],
    };
    assert!(kb.add_rule(rule).is_err());
}

#[test]
fn union_merge_is_commutative() {
    let mut kb1 = KnowledgeBase::new();
    kb1.add_fact(Fact::new("rainy", vec!["today".into()], 0.4)).unwrap();
    kb1.add_fact(Fact::new("age", vec!["alice".into()], 0.9)).unwrap();
    let rule = RuleBuilder::new()
        .name("stripes")
        .when(atom("is-zebra", vec![Term::var("x")]))
        .then(Action::Add(FactTemplate {
            predicate: "has-stripes".into(),
            args: vec![Term::var("x")],
            degree: None,
        }))
        .build()
        .unwrap();
    kb1.add_rule(rule).unwrap();

    let mut kb2 = KnowledgeBase::new();
    kb2.add_fact(Fact::new("rainy", vec!["today".into()], 0.7)).unwrap();
    kb2.add_fact(Fact::new("age", vec!["bob".into()], 0.5)).unwrap();

    let merged_ab = kb1.merge(&kb2, MergeStrategy::Union, &MergeConfig::default()).unwrap();
    let merged_ba = kb2.merge(&kb1, MergeStrategy::Union, &MergeConfig::default()).unwrap();

    assert_eq!(merged_ab.get_facts(), merged_ba.get_facts());

    let mut names_ab: Vec<String> = merged_ab.get_rules().iter().map(|r| r.identity()).collect();
    let mut names_ba: Vec<String> = merged_ba.get_rules().iter().map(|r| r.identity()).collect();
    names_ab.sort();
    names_ba.sort();
    assert_eq!(names_ab, names_ba);
}

#[test]
fn save_and_load_round_trips_a_knowledge_base() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("kb.yaml");

    let mut kb = KnowledgeBase::new();
    kb.add_fact(Fact::new("is-zebra", vec!["sam".into()], 0.8)).unwrap();
    let rule = RuleBuilder::new()
        .name("stripes")
        .priority(3)
        .when(atom("is-zebra", vec![Term::var("x")]))
        .then(Action::Add(FactTemplate {
            predicate: "has-stripes".into(),
            args: vec![Term::var("x")],
            degree: None,
        }))
        .build()
        .unwrap();
    kb.add_rule(rule).unwrap();

    kb.save_to_file(&path).unwrap();
    let loaded = KnowledgeBase::load_from_file(&path).unwrap();

    assert_eq!(loaded.get_facts(), kb.get_facts());
    assert_eq!(loaded.get_rules().len(), kb.get_rules().len());
    assert_eq!(loaded.get_rules()[0].priority, 3);
}
