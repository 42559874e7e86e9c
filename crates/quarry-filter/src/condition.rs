//! The condition tree.
//!
//! A [`Clause`] is a single comparison (`field op value`). A [`Group`] joins
//! an ordered list of [`Condition`]s with one [`BoolKind`]. Trees render to
//! the store's filter document and can also be evaluated directly against
//! in-memory documents.

use serde_json::{json, Map, Value};

use crate::op::Op;
use crate::value::{compare_same_category, lookup, values_equal, Document};

/// Logical combinator of a group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum BoolKind {
    /// Every child must match.
    #[default]
    And,
    /// At least one child must match.
    Or,
}

impl BoolKind {
    /// Returns the store keyword (`$and` / `$or`).
    pub fn as_str(self) -> &'static str {
        match self {
            BoolKind::And => "$and",
            BoolKind::Or => "$or",
        }
    }
}

impl std::fmt::Display for BoolKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single comparison.
///
/// # Example
///
/// ```
/// use quarry_filter::{Clause, Op};
/// use serde_json::json;
///
/// let clause = Clause::new("age", Op::Gte, 18);
/// assert_eq!(clause.to_document(), json!({"age": {"$gte": 18}}));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Clause {
    /// The field path to compare.
    pub field: String,
    /// The comparison operator.
    pub op: Op,
    /// The operand: a scalar, or a sequence for `In`/`NotIn`.
    pub value: Value,
}

impl Clause {
    /// Creates a new clause.
    pub fn new(field: impl Into<String>, op: Op, value: impl Into<Value>) -> Self {
        Clause {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Renders `{field: {op: value}}`.
    ///
    /// A scalar operand of `In`/`NotIn` is wrapped into a one-element array.
    pub fn to_document(&self) -> Value {
        let operand = match (&self.value, self.op.expects_sequence()) {
            (Value::Array(_), _) | (_, false) => self.value.clone(),
            (scalar, true) => Value::Array(vec![scalar.clone()]),
        };
        let mut comparison = Map::new();
        comparison.insert(self.op.as_str().to_string(), operand);
        let mut doc = Map::new();
        doc.insert(self.field.clone(), Value::Object(comparison));
        Value::Object(doc)
    }

    /// Evaluates this clause against a document.
    ///
    /// Missing fields only satisfy the negative operators. When the field
    /// holds an array, `Eq` and `In` match if any element matches.
    pub fn matches(&self, doc: &Document) -> bool {
        let field = lookup(doc, &self.field);
        match self.op {
            Op::Eq => field.is_some_and(|v| self.equals(v)),
            Op::Ne => !field.is_some_and(|v| self.equals(v)),
            Op::In => field.is_some_and(|v| self.member_of_operand(v)),
            Op::NotIn => !field.is_some_and(|v| self.member_of_operand(v)),
            Op::Gt | Op::Gte | Op::Lt | Op::Lte => field.is_some_and(|v| self.ordered(v)),
        }
    }

    fn equals(&self, field: &Value) -> bool {
        if values_equal(field, &self.value) {
            return true;
        }
        match field {
            Value::Array(items) => items.iter().any(|item| values_equal(item, &self.value)),
            _ => false,
        }
    }

    fn member_of_operand(&self, field: &Value) -> bool {
        let candidates: &[Value] = match &self.value {
            Value::Array(items) => items,
            scalar => std::slice::from_ref(scalar),
        };
        let hit = |v: &Value| candidates.iter().any(|c| values_equal(v, c));
        match field {
            Value::Array(items) => hit(field) || items.iter().any(hit),
            _ => hit(field),
        }
    }

    fn ordered(&self, field: &Value) -> bool {
        let single = |v: &Value| {
            compare_same_category(v, &self.value).is_some_and(|o| self.op.eval_ordering(o))
        };
        match field {
            Value::Array(items) => items.iter().any(single),
            _ => single(field),
        }
    }
}

/// A boolean group of conditions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Group {
    /// How the children combine.
    pub kind: BoolKind,
    /// The children, in insertion order.
    pub children: Vec<Condition>,
}

impl Group {
    /// Creates an empty group.
    pub fn new(kind: BoolKind) -> Self {
        Group {
            kind,
            children: Vec::new(),
        }
    }

    /// Creates a group from existing children.
    pub fn with_children(kind: BoolKind, children: Vec<Condition>) -> Self {
        Group { kind, children }
    }

    /// Returns `true` if the group has no children.
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Renders `{kind: [children]}`.
    pub fn to_document(&self) -> Value {
        let children: Vec<Value> = self.children.iter().map(Condition::to_document).collect();
        let mut doc = Map::new();
        doc.insert(self.kind.as_str().to_string(), Value::Array(children));
        Value::Object(doc)
    }

    /// Renders this group as a top-level filter.
    ///
    /// An empty group becomes the match-all document `{}`.
    pub fn to_filter(&self) -> Value {
        if self.is_empty() {
            json!({})
        } else {
            self.to_document()
        }
    }

    /// Evaluates the group against a document.
    ///
    /// An empty AND group matches everything, an empty OR group nothing.
    pub fn matches(&self, doc: &Document) -> bool {
        match self.kind {
            BoolKind::And => self.children.iter().all(|c| c.matches(doc)),
            BoolKind::Or => self.children.iter().any(|c| c.matches(doc)),
        }
    }

    /// Maximum nesting depth below this group (a flat group has depth 1).
    pub fn depth(&self) -> usize {
        1 + self
            .children
            .iter()
            .map(|c| match c {
                Condition::Group(g) => g.depth(),
                Condition::Clause(_) => 0,
            })
            .max()
            .unwrap_or(0)
    }
}

/// A node of the condition tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Condition {
    /// A single comparison.
    Clause(Clause),
    /// A nested group.
    Group(Group),
}

impl Condition {
    /// Renders this node as a filter document fragment.
    pub fn to_document(&self) -> Value {
        match self {
            Condition::Clause(clause) => clause.to_document(),
            Condition::Group(group) => group.to_document(),
        }
    }

    /// Evaluates this node against a document.
    pub fn matches(&self, doc: &Document) -> bool {
        match self {
            Condition::Clause(clause) => clause.matches(doc),
            Condition::Group(group) => group.matches(doc),
        }
    }
}

impl From<Clause> for Condition {
    fn from(clause: Clause) -> Self {
        Condition::Clause(clause)
    }
}

impl From<Group> for Condition {
    fn from(group: Group) -> Self {
        Condition::Group(group)
    }
}
