//! Comparison of document values.
//!
//! Documents are `serde_json` objects. Comparisons follow the store's rules:
//! numbers compare across integer and float widths, ordering comparisons only
//! succeed within one type category, and sorting uses a fixed order between
//! categories.

use std::cmp::Ordering;

use serde_json::{Map, Number, Value};

/// A stored document.
pub type Document = Map<String, Value>;

/// Looks up a possibly dotted field path (`"author.name"`, `"tags.0"`).
pub fn lookup<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let mut parts = path.split('.');
    let mut current = doc.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Value::Object(map) => map.get(part)?,
            Value::Array(items) => items.get(part.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Compares two numbers, handling mixed integer and float representations.
///
/// Integers and floats compare exactly (no integer is rounded to a float),
/// so the order is total over everything a JSON number can hold. Returns
/// `None` only when a float comparison is undefined.
pub fn compare_numbers(a: &Number, b: &Number) -> Option<Ordering> {
    match (Numeric::of(a)?, Numeric::of(b)?) {
        (Numeric::Int(a), Numeric::Int(b)) => Some(a.cmp(&b)),
        (Numeric::Float(a), Numeric::Float(b)) => a.partial_cmp(&b),
        (Numeric::Int(a), Numeric::Float(b)) => compare_int_float(a, b),
        (Numeric::Float(a), Numeric::Int(b)) => compare_int_float(b, a).map(Ordering::reverse),
    }
}

enum Numeric {
    Int(i128),
    Float(f64),
}

impl Numeric {
    fn of(n: &Number) -> Option<Numeric> {
        if let Some(i) = n.as_i64() {
            Some(Numeric::Int(i.into()))
        } else if let Some(u) = n.as_u64() {
            Some(Numeric::Int(u.into()))
        } else {
            n.as_f64().map(Numeric::Float)
        }
    }
}

fn compare_int_float(int: i128, float: f64) -> Option<Ordering> {
    if float.is_nan() {
        return None;
    }
    // 2^127 is exact in f64 and bounds every i128
    let limit = 2f64.powi(127);
    if float >= limit {
        return Some(Ordering::Less);
    }
    if float < -limit {
        return Some(Ordering::Greater);
    }
    let whole = float.trunc();
    match int.cmp(&(whole as i128)) {
        Ordering::Equal => whole.partial_cmp(&float),
        unequal => Some(unequal),
    }
}

/// Structural equality where numbers compare by value (`1 == 1.0`).
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b) == Some(Ordering::Equal),
        (Value::Array(a), Value::Array(b)) => {
            a.len() == b.len() && a.iter().zip(b).all(|(x, y)| values_equal(x, y))
        }
        (Value::Object(a), Value::Object(b)) => {
            a.len() == b.len()
                && a.iter()
                    .all(|(key, x)| b.get(key).is_some_and(|y| values_equal(x, y)))
        }
        _ => a == b,
    }
}

/// Compares two values of the same category for `$gt`-style operators.
///
/// Returns `None` for a category mismatch (a string is neither greater nor
/// less than a number) or NaN.
pub fn compare_same_category(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(a), Value::Number(b)) => compare_numbers(a, b),
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Rank of a value's category in the sort order. Missing fields rank with
/// null.
fn category_rank(value: Option<&Value>) -> u8 {
    match value {
        None | Some(Value::Null) => 0,
        Some(Value::Number(_)) => 1,
        Some(Value::String(_)) => 2,
        Some(Value::Object(_)) => 3,
        Some(Value::Array(_)) => 4,
        Some(Value::Bool(_)) => 5,
    }
}

/// Total order used for sorting documents by a field.
///
/// Missing and null values sort first, then numbers, strings, objects,
/// arrays and booleans.
pub fn sort_order(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    let by_rank = category_rank(a).cmp(&category_rank(b));
    if by_rank != Ordering::Equal {
        return by_rank;
    }
    match (a, b) {
        (Some(Value::Array(x)), Some(Value::Array(y))) => {
            for (x, y) in x.iter().zip(y) {
                let ordering = sort_order(Some(x), Some(y));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        (Some(Value::Object(x)), Some(Value::Object(y))) => {
            for ((kx, vx), (ky, vy)) in x.iter().zip(y) {
                let ordering = kx.cmp(ky).then_with(|| sort_order(Some(vx), Some(vy)));
                if ordering != Ordering::Equal {
                    return ordering;
                }
            }
            x.len().cmp(&y.len())
        }
        (Some(x), Some(y)) => compare_same_category(x, y).unwrap_or(Ordering::Equal),
        _ => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: Value) -> Document {
        match value {
            Value::Object(map) => map,
            _ => panic!("fixture must be an object"),
        }
    }

    #[test]
    fn lookup_top_level_and_nested() {
        let d = doc(json!({"name": "payam", "author": {"city": "Tehran"}, "tags": ["a", "b"]}));
        assert_eq!(lookup(&d, "name"), Some(&json!("payam")));
        assert_eq!(lookup(&d, "author.city"), Some(&json!("Tehran")));
        assert_eq!(lookup(&d, "tags.1"), Some(&json!("b")));
        assert_eq!(lookup(&d, "tags.x"), None);
        assert_eq!(lookup(&d, "author.zip"), None);
        assert_eq!(lookup(&d, "name.first"), None);
        assert_eq!(lookup(&d, "missing"), None);
    }

    #[test]
    fn numbers_compare_across_widths() {
        let a = Number::from(5);
        let b = Number::from_f64(5.0).unwrap();
        let c = Number::from(u64::MAX);
        assert_eq!(compare_numbers(&a, &b), Some(Ordering::Equal));
        assert_eq!(compare_numbers(&a, &c), Some(Ordering::Less));
        assert_eq!(compare_numbers(&c, &c), Some(Ordering::Equal));
    }

    #[test]
    fn mixed_int_float_order_is_exact() {
        let big = Number::from(9_007_199_254_740_993_i64); // 2^53 + 1
        let big_float = Number::from_f64(9_007_199_254_740_992.0).unwrap(); // 2^53
        let exact = Number::from(9_007_199_254_740_992_i64);

        assert_eq!(compare_numbers(&big, &big_float), Some(Ordering::Greater));
        assert_eq!(compare_numbers(&big_float, &exact), Some(Ordering::Equal));
        assert_eq!(compare_numbers(&big, &exact), Some(Ordering::Greater));
        assert_eq!(compare_numbers(&big_float, &big), Some(Ordering::Less));
    }

    #[test]
    fn fractions_and_extremes() {
        let n = |v: f64| Number::from_f64(v).unwrap();
        assert_eq!(compare_numbers(&Number::from(1), &n(1.5)), Some(Ordering::Less));
        assert_eq!(compare_numbers(&Number::from(-1), &n(-1.5)), Some(Ordering::Greater));
        assert_eq!(compare_numbers(&Number::from(2), &n(2.0)), Some(Ordering::Equal));
        assert_eq!(compare_numbers(&Number::from(-1), &Number::from(u64::MAX)), Some(Ordering::Less));
        assert_eq!(compare_numbers(&Number::from(u64::MAX), &n(1e300)), Some(Ordering::Less));
        assert_eq!(compare_numbers(&Number::from(i64::MIN), &n(-1e300)), Some(Ordering::Greater));
    }

    #[test]
    fn sorting_mixed_numbers_is_consistent() {
        let mut values: Vec<Value> = vec![
            json!(9_007_199_254_740_993_i64),
            json!(9_007_199_254_740_992.0),
            json!(9_007_199_254_740_992_i64),
            json!(-0.5),
            json!(u64::MAX),
            json!(0),
        ];
        values.sort_by(|a, b| sort_order(Some(a), Some(b)));
        let rendered: Vec<String> = values.iter().map(Value::to_string).collect();
        assert_eq!(rendered[0], "-0.5");
        assert_eq!(rendered[1], "0");
        assert_eq!(rendered[4], "9007199254740993");
        assert_eq!(rendered[5], u64::MAX.to_string());
    }

    #[test]
    fn equality_is_numeric_aware() {
        assert!(values_equal(&json!(1), &json!(1.0)));
        assert!(values_equal(&json!([1, "a"]), &json!([1.0, "a"])));
        assert!(values_equal(&json!({"a": 2}), &json!({"a": 2.0})));
        assert!(!values_equal(&json!({"a": 2}), &json!({"b": 2})));
        assert!(!values_equal(&json!("1"), &json!(1)));
    }

    #[test]
    fn same_category_only() {
        assert_eq!(
            compare_same_category(&json!("b"), &json!("a")),
            Some(Ordering::Greater)
        );
        assert_eq!(compare_same_category(&json!(3), &json!("3")), None);
        assert_eq!(compare_same_category(&json!(null), &json!(0)), None);
    }

    #[test]
    fn sort_order_ranks_categories() {
        let null = json!(null);
        let num = json!(10);
        let text = json!("x");
        let flag = json!(true);
        assert_eq!(sort_order(None, Some(&null)), Ordering::Equal);
        assert_eq!(sort_order(None, Some(&num)), Ordering::Less);
        assert_eq!(sort_order(Some(&num), Some(&text)), Ordering::Less);
        assert_eq!(sort_order(Some(&flag), Some(&text)), Ordering::Greater);
        assert_eq!(
            sort_order(Some(&json!([1, 2])), Some(&json!([1, 3]))),
            Ordering::Less
        );
    }
}
