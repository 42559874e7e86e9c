//! Accumulates chained conditions into a filter tree.
//!
//! The [`Compiler`] owns a stack of scopes: the root scope plus one scope per
//! open nested group. Each scope has a boolean kind and an ordered list of
//! children. Adding a condition with a requested kind `T` merges it into the
//! innermost scope:
//!
//! 1. An empty scope takes `T` as its kind.
//! 2. A scope whose kind equals `T` appends.
//! 3. An AND scope receiving OR is promoted to OR (see [`Promotion`]).
//! 4. An OR scope receiving AND appends under OR; AND never demotes OR.
//!
//! Closing a nested scope turns it into a single [`Group`] that is merged
//! into its parent with the kind it was opened with.

use serde_json::Value;

use crate::condition::{BoolKind, Clause, Condition, Group};
use crate::error::{FilterError, Result};

/// What happens to existing AND children when a scope is promoted to OR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Promotion {
    /// The scope's kind flips to OR and existing children become OR siblings.
    ///
    /// `a AND b` followed by `OR c` yields `a OR b OR c`.
    #[default]
    Relabel,
    /// Existing children are first wrapped in a nested AND group.
    ///
    /// `a AND b` followed by `OR c` yields `(a AND b) OR c`.
    WrapThenPromote,
}

#[derive(Debug, Clone, PartialEq)]
struct Scope {
    group: Group,
    /// Kind requested when the scope was opened, used to attach it to its parent.
    attach: BoolKind,
}

/// Condition compiler with an explicit, instance-owned scope stack.
///
/// # Example
///
/// ```
/// use quarry_filter::{BoolKind, Clause, Compiler, Op};
/// use serde_json::json;
///
/// let mut compiler = Compiler::new();
/// compiler.add(Clause::new("a", Op::Eq, 1), BoolKind::And);
/// compiler.begin_group(BoolKind::And);
/// compiler.add(Clause::new("b", Op::Eq, 2), BoolKind::And);
/// compiler.add(Clause::new("c", Op::Eq, 3), BoolKind::Or);
/// compiler.end_group().unwrap();
///
/// assert_eq!(
///     compiler.filter_document().unwrap(),
///     json!({"$and": [{"a": {"$eq": 1}}, {"$or": [{"b": {"$eq": 2}}, {"c": {"$eq": 3}}]}]})
/// );
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Compiler {
    root: Group,
    nested: Vec<Scope>,
    promotion: Promotion,
}

impl Compiler {
    /// Creates a compiler with an empty AND root and [`Promotion::Relabel`].
    pub fn new() -> Self {
        Compiler::default()
    }

    /// Creates a compiler using the given promotion policy.
    pub fn with_promotion(promotion: Promotion) -> Self {
        Compiler {
            promotion,
            ..Compiler::default()
        }
    }

    /// Returns the promotion policy.
    pub fn promotion(&self) -> Promotion {
        self.promotion
    }

    /// Changes the promotion policy for conditions added from now on.
    pub fn set_promotion(&mut self, promotion: Promotion) {
        self.promotion = promotion;
    }

    /// Adds a leaf condition to the innermost open scope.
    ///
    /// Clauses with an empty field name are ignored.
    pub fn add(&mut self, clause: Clause, kind: BoolKind) {
        if clause.field.is_empty() {
            tracing::debug!(op = %clause.op, "ignoring condition with empty field name");
            return;
        }
        self.add_condition(Condition::Clause(clause), kind);
    }

    /// Adds a prebuilt condition (leaf or group) to the innermost open scope.
    pub fn add_condition(&mut self, condition: Condition, kind: BoolKind) {
        let promotion = self.promotion;
        merge(self.current(), condition, kind, promotion);
    }

    /// Opens a nested scope that will attach to the current one with `kind`.
    pub fn begin_group(&mut self, kind: BoolKind) {
        self.nested.push(Scope {
            group: Group::new(BoolKind::And),
            attach: kind,
        });
    }

    /// Closes the innermost nested scope and merges it into its parent.
    ///
    /// A scope that received no conditions is discarded.
    pub fn end_group(&mut self) -> Result<()> {
        let scope = self.nested.pop().ok_or(FilterError::UnbalancedGroup)?;
        if scope.group.is_empty() {
            tracing::debug!(depth = self.nested.len() + 1, "discarding empty condition group");
            return Ok(());
        }
        self.add_condition(Condition::Group(scope.group), scope.attach);
        Ok(())
    }

    /// Runs `build` inside a new nested scope and closes it afterwards.
    ///
    /// Scopes the callback opens and leaves open are closed as well, so the
    /// stack is back at its original depth when this returns.
    pub fn nest<F>(&mut self, kind: BoolKind, build: F)
    where
        F: FnOnce(&mut Compiler),
    {
        let depth = self.nested.len();
        self.begin_group(kind);
        build(self);
        while self.nested.len() > depth {
            // cannot fail: the stack is non-empty inside the loop
            let _ = self.end_group();
        }
    }

    /// Number of currently open nested scopes.
    pub fn depth(&self) -> usize {
        self.nested.len()
    }

    /// Returns `true` if no condition has been added and no group is open.
    pub fn is_empty(&self) -> bool {
        self.root.is_empty() && self.nested.is_empty()
    }

    /// Returns the compiled root group.
    ///
    /// Compiling does not consume the accumulated state; repeated calls
    /// return identical trees.
    pub fn compile(&self) -> Result<Group> {
        if !self.nested.is_empty() {
            return Err(FilterError::UnclosedGroup {
                open: self.nested.len(),
            });
        }
        Ok(self.root.clone())
    }

    /// Compiles and renders the store filter document.
    pub fn filter_document(&self) -> Result<Value> {
        Ok(self.compile()?.to_filter())
    }

    fn current(&mut self) -> &mut Group {
        match self.nested.last_mut() {
            Some(scope) => &mut scope.group,
            None => &mut self.root,
        }
    }
}

fn merge(scope: &mut Group, condition: Condition, kind: BoolKind, promotion: Promotion) {
    if scope.children.is_empty() {
        scope.kind = kind;
    } else if scope.kind == BoolKind::And && kind == BoolKind::Or {
        if promotion == Promotion::WrapThenPromote && scope.children.len() > 1 {
            let prior = std::mem::take(&mut scope.children);
            scope
                .children
                .push(Condition::Group(Group::with_children(BoolKind::And, prior)));
        }
        scope.kind = BoolKind::Or;
    }
    scope.children.push(condition);
}
