//! Parsing of `--where` / `--or-where` expressions.

use anyhow::{bail, Result};
use once_cell::sync::Lazy;
use quarry::{BoolKind, Op};
use regex::Regex;
use serde_json::Value;

/// `<field> <operator> <value...>`; the value keeps inner whitespace and the
/// operator may be the two-word `not in`.
static CONDITION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*(\S+)\s+(not\s+in|\S+)\s+(.*?)\s*$").expect("valid condition regex")
});

/// One condition from the command line.
#[derive(Debug, Clone, PartialEq)]
pub struct CliCondition {
    pub kind: BoolKind,
    pub field: String,
    pub op: Op,
    pub value: Value,
}

impl CliCondition {
    /// Parses `"<field> <op> <value>"`.
    ///
    /// Unknown operators become equality. Values are read as JSON when they
    /// parse, otherwise as plain strings; `in`/`nin` take a comma list.
    pub fn parse(kind: BoolKind, expr: &str) -> Result<CliCondition> {
        let Some(caps) = CONDITION_RE.captures(expr) else {
            bail!("invalid condition '{expr}': expected '<field> <op> <value>'");
        };
        let token = caps[2].split_whitespace().collect::<Vec<_>>().join(" ");
        let op = Op::coerce(&token);
        let raw = &caps[3];
        if raw.is_empty() {
            bail!("invalid condition '{expr}': missing value");
        }
        let value = if op.expects_sequence() {
            Value::Array(raw.split(',').map(|part| scalar(part.trim())).collect())
        } else {
            scalar(raw)
        };
        Ok(CliCondition {
            kind,
            field: caps[1].to_string(),
            op,
            value,
        })
    }
}

fn scalar(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(expr: &str) -> CliCondition {
        CliCondition::parse(BoolKind::And, expr).unwrap()
    }

    #[test]
    fn numbers_and_strings() {
        let cond = parse("year >= 1990");
        assert_eq!(cond.field, "year");
        assert_eq!(cond.op, Op::Gte);
        assert_eq!(cond.value, json!(1990));

        let cond = parse("title = Brave New World");
        assert_eq!(cond.op, Op::Eq);
        assert_eq!(cond.value, json!("Brave New World"));
    }

    #[test]
    fn json_values() {
        assert_eq!(parse("done = true").value, json!(true));
        assert_eq!(parse("name = \"42\"").value, json!("42"));
        assert_eq!(parse("meta = null").value, json!(null));
    }

    #[test]
    fn membership_lists() {
        let cond = parse("tag in a, b,3");
        assert_eq!(cond.op, Op::In);
        assert_eq!(cond.value, json!(["a", "b", 3]));
    }

    #[test]
    fn two_word_not_in() {
        let cond = parse("tag not in a,b");
        assert_eq!(cond.field, "tag");
        assert_eq!(cond.op, Op::NotIn);
        assert_eq!(cond.value, json!(["a", "b"]));

        assert_eq!(parse("tag NOT   IN x").op, Op::NotIn);
        assert_eq!(parse("title = not in stock").value, json!("not in stock"));
    }

    #[test]
    fn unknown_operator_is_equality() {
        assert_eq!(parse("age bogus 5").op, Op::Eq);
    }

    #[test]
    fn malformed_expressions() {
        assert!(CliCondition::parse(BoolKind::And, "year").is_err());
        assert!(CliCondition::parse(BoolKind::And, "year >=").is_err());
    }
}
