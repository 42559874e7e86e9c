//! Comparison operators for filter clauses.
//!
//! The [`Op`] enum is the closed set of comparisons a clause may use. Each
//! operator renders to the store's own keyword (`$eq`, `$gte`, ...).

use std::cmp::Ordering;

/// Comparison operator for a filter clause.
///
/// - **Equality**: `Eq`, `Ne`
/// - **Ordering**: `Gt`, `Gte`, `Lt`, `Lte`
/// - **Membership**: `In`, `NotIn` (value is a sequence)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Op {
    /// Equal (exact match).
    #[default]
    Eq,
    /// Not equal.
    Ne,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Gte,
    /// Less than.
    Lt,
    /// Less than or equal.
    Lte,
    /// Value is one of the given set.
    In,
    /// Value is none of the given set.
    NotIn,
}

impl Op {
    /// Every operator, in declaration order.
    pub const ALL: [Op; 8] = [
        Op::Eq,
        Op::Ne,
        Op::Gt,
        Op::Gte,
        Op::Lt,
        Op::Lte,
        Op::In,
        Op::NotIn,
    ];

    /// Parses an operator token.
    ///
    /// Accepts the store keyword (`$gte`), the bare word (`gte`) and the
    /// symbolic form (`>=`), ignoring case and surrounding whitespace.
    pub fn from_token(token: &str) -> Option<Op> {
        let token = token.trim().to_ascii_lowercase();
        let op = match token.as_str() {
            "$eq" | "eq" | "=" | "==" => Op::Eq,
            "$ne" | "ne" | "!=" | "<>" => Op::Ne,
            "$gt" | "gt" | ">" => Op::Gt,
            "$gte" | "gte" | ">=" => Op::Gte,
            "$lt" | "lt" | "<" => Op::Lt,
            "$lte" | "lte" | "<=" => Op::Lte,
            "$in" | "in" => Op::In,
            "$nin" | "nin" | "not in" | "not_in" => Op::NotIn,
            _ => return None,
        };
        Some(op)
    }

    /// Parses an operator token, falling back to [`Op::Eq`] when it is not
    /// recognized.
    pub fn coerce(token: &str) -> Op {
        match Op::from_token(token) {
            Some(op) => op,
            None => {
                tracing::debug!(token, "unknown comparison operator, using $eq");
                Op::Eq
            }
        }
    }

    /// Returns `true` if the operator compares against a sequence of values.
    pub fn expects_sequence(self) -> bool {
        matches!(self, Op::In | Op::NotIn)
    }

    /// Returns `true` for the ordering comparisons (`Gt`, `Gte`, `Lt`, `Lte`).
    pub fn is_ordering(self) -> bool {
        matches!(self, Op::Gt | Op::Gte | Op::Lt | Op::Lte)
    }

    /// Evaluates an ordering comparison given `field.cmp(operand)`.
    pub fn eval_ordering(self, ordering: Ordering) -> bool {
        match self {
            Op::Eq => ordering == Ordering::Equal,
            Op::Ne => ordering != Ordering::Equal,
            Op::Gt => ordering == Ordering::Greater,
            Op::Gte => ordering != Ordering::Less,
            Op::Lt => ordering == Ordering::Less,
            Op::Lte => ordering != Ordering::Greater,
            Op::In | Op::NotIn => false,
        }
    }

    /// Returns the store keyword of this operator.
    pub fn as_str(self) -> &'static str {
        match self {
            Op::Eq => "$eq",
            Op::Ne => "$ne",
            Op::Gt => "$gt",
            Op::Gte => "$gte",
            Op::Lt => "$lt",
            Op::Lte => "$lte",
            Op::In => "$in",
            Op::NotIn => "$nin",
        }
    }
}

impl std::fmt::Display for Op {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
