//! Behavioral coverage of the compiler through the public API.

use quarry_filter::{
    BoolKind, Clause, Compiler, Condition, Dir, Document, FilterError, Group, Op, Projection,
    Promotion, SortSpec,
};
use serde_json::{json, Value};

fn doc(value: Value) -> Document {
    match value {
        Value::Object(map) => map,
        _ => panic!("fixture must be an object"),
    }
}

fn leaf(field: &str, value: &str) -> Clause {
    Clause::new(field, Op::Eq, value)
}

// ============================================================================
// Merge rules
// ============================================================================

#[test]
fn where_where_is_and() {
    let mut c = Compiler::new();
    c.add(leaf("a", "1"), BoolKind::And);
    c.add(leaf("b", "2"), BoolKind::And);

    assert_eq!(
        c.filter_document().unwrap(),
        json!({"$and": [{"a": {"$eq": "1"}}, {"b": {"$eq": "2"}}]})
    );
}

#[test]
fn where_or_where_is_or() {
    let mut c = Compiler::new();
    c.add(leaf("a", "1"), BoolKind::And);
    c.add(leaf("b", "2"), BoolKind::Or);

    assert_eq!(
        c.filter_document().unwrap(),
        json!({"$or": [{"a": {"$eq": "1"}}, {"b": {"$eq": "2"}}]})
    );
}

#[test]
fn where_where_or_where_relabels_whole_scope() {
    let mut c = Compiler::new();
    c.add(leaf("a", "1"), BoolKind::And);
    c.add(leaf("b", "2"), BoolKind::And);
    c.add(leaf("c", "3"), BoolKind::Or);

    assert_eq!(
        c.filter_document().unwrap(),
        json!({"$or": [
            {"a": {"$eq": "1"}},
            {"b": {"$eq": "2"}},
            {"c": {"$eq": "3"}}
        ]})
    );
}

#[test]
fn repeated_or_where_keeps_or() {
    let mut c = Compiler::new();
    c.add(leaf("a", "1"), BoolKind::And);
    c.add(leaf("b", "2"), BoolKind::Or);
    c.add(leaf("c", "3"), BoolKind::Or);

    let group = c.compile().unwrap();
    assert_eq!(group.kind, BoolKind::Or);
    assert_eq!(group.children.len(), 3);
}

#[test]
fn nested_group_with_or_inside() {
    let mut c = Compiler::new();
    c.add(leaf("a", "1"), BoolKind::And);
    c.nest(BoolKind::And, |g| {
        g.add(leaf("b", "2"), BoolKind::And);
        g.add(leaf("c", "3"), BoolKind::Or);
    });

    assert_eq!(
        c.filter_document().unwrap(),
        json!({"$and": [
            {"a": {"$eq": "1"}},
            {"$or": [{"b": {"$eq": "2"}}, {"c": {"$eq": "3"}}]}
        ]})
    );
}

#[test]
fn group_as_first_condition() {
    let mut c = Compiler::new();
    c.nest(BoolKind::And, |g| {
        g.add(leaf("name", "payam"), BoolKind::And);
    });
    c.add(leaf("lastname", "jafari"), BoolKind::And);

    assert_eq!(
        c.filter_document().unwrap(),
        json!({"$and": [
            {"$and": [{"name": {"$eq": "payam"}}]},
            {"lastname": {"$eq": "jafari"}}
        ]})
    );
}

#[test]
fn sibling_groups_are_independent() {
    let mut c = Compiler::new();
    c.nest(BoolKind::And, |g| {
        g.add(leaf("a", "1"), BoolKind::And);
        g.add(leaf("b", "2"), BoolKind::Or);
    });
    c.nest(BoolKind::And, |g| {
        g.add(leaf("c", "3"), BoolKind::And);
        g.add(leaf("d", "4"), BoolKind::And);
    });

    let root = c.compile().unwrap();
    let kinds: Vec<BoolKind> = root
        .children
        .iter()
        .map(|child| match child {
            Condition::Group(g) => g.kind,
            Condition::Clause(_) => panic!("expected groups"),
        })
        .collect();
    assert_eq!(kinds, vec![BoolKind::Or, BoolKind::And]);
}

#[test]
fn wrap_then_promote_at_every_level() {
    let mut c = Compiler::with_promotion(Promotion::WrapThenPromote);
    c.nest(BoolKind::And, |g| {
        g.add(leaf("a", "1"), BoolKind::And);
        g.add(leaf("b", "2"), BoolKind::And);
        g.add(leaf("c", "3"), BoolKind::Or);
    });

    assert_eq!(
        c.filter_document().unwrap(),
        json!({"$and": [{"$or": [
            {"$and": [{"a": {"$eq": "1"}}, {"b": {"$eq": "2"}}]},
            {"c": {"$eq": "3"}}
        ]}]})
    );
}

#[test]
fn promotion_policy_can_change_midway() {
    let mut c = Compiler::new();
    assert_eq!(c.promotion(), Promotion::Relabel);
    c.set_promotion(Promotion::WrapThenPromote);
    c.add(leaf("a", "1"), BoolKind::And);
    c.add(leaf("b", "2"), BoolKind::And);
    c.add(leaf("c", "3"), BoolKind::Or);
    assert_eq!(c.compile().unwrap().children.len(), 2);
}

#[test]
fn group_errors() {
    let mut c = Compiler::new();
    assert_eq!(c.end_group(), Err(FilterError::UnbalancedGroup));
    c.begin_group(BoolKind::Or);
    assert_eq!(
        c.filter_document(),
        Err(FilterError::UnclosedGroup { open: 1 })
    );
    assert_eq!(
        FilterError::UnclosedGroup { open: 1 }.to_string(),
        "1 condition group(s) still open"
    );
}

// ============================================================================
// Operators
// ============================================================================

#[test]
fn unknown_operator_compiles_as_eq() {
    let mut c = Compiler::new();
    c.add(Clause::new("x", Op::coerce("$bogus"), 5), BoolKind::And);

    assert_eq!(
        c.filter_document().unwrap(),
        json!({"$and": [{"x": {"$eq": 5}}]})
    );
}

#[test]
fn every_operator_renders_its_keyword() {
    let rendered: Vec<Value> = Op::ALL
        .iter()
        .map(|op| Clause::new("f", *op, json!([1])).to_document())
        .collect();

    assert_eq!(
        rendered,
        vec![
            json!({"f": {"$eq": [1]}}),
            json!({"f": {"$ne": [1]}}),
            json!({"f": {"$gt": [1]}}),
            json!({"f": {"$gte": [1]}}),
            json!({"f": {"$lt": [1]}}),
            json!({"f": {"$lte": [1]}}),
            json!({"f": {"$in": [1]}}),
            json!({"f": {"$nin": [1]}}),
        ]
    );
}

// ============================================================================
// Projection and sort
// ============================================================================

#[test]
fn select_replaces_projection() {
    let first = Projection::new(["name", "age"]);
    assert_eq!(first.to_document(), json!({"name": 1, "age": 1}));

    let second = Projection::new(["city"]);
    assert_eq!(second.to_document(), json!({"city": 1}));
}

#[test]
fn order_keywords_map_to_directions() {
    let desc = SortSpec::uniform(["name"], Dir::from_keyword("desc"));
    assert_eq!(desc.to_document(), json!({"name": -1}));

    let default = SortSpec::uniform(["name"], Dir::default());
    assert_eq!(default.to_document(), json!({"name": 1}));
}

// ============================================================================
// Evaluation against documents
// ============================================================================

#[test]
fn compiled_filter_evaluates() {
    let books = [
        doc(json!({"name": "payam", "lastname": "jafari", "year": 2001})),
        doc(json!({"name": "mohsen", "lastname": "namjoo", "year": 2008})),
        doc(json!({"name": "ali", "lastname": "jafari", "year": 1999})),
    ];

    let mut c = Compiler::new();
    c.add(leaf("lastname", "jafari"), BoolKind::And);
    c.nest(BoolKind::And, |g| {
        g.add(Clause::new("year", Op::Gte, 2000), BoolKind::And);
        g.add(leaf("name", "ali"), BoolKind::Or);
    });
    let filter: Group = c.compile().unwrap();

    let names: Vec<&str> = books
        .iter()
        .filter(|d| filter.matches(d))
        .filter_map(|d| d.get("name").and_then(Value::as_str))
        .collect();
    assert_eq!(names, vec!["payam", "ali"]);
}

#[test]
fn empty_filter_matches_everything() {
    let c = Compiler::new();
    let filter = c.compile().unwrap();
    assert!(filter.matches(&doc(json!({"anything": true}))));
}
