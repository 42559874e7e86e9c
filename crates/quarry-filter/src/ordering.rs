//! Sort specifications.
//!
//! Provides [`Dir`] for sort direction and [`SortSpec`], the ordered list of
//! `(field, direction)` pairs sent to the store.

use std::cmp::Ordering;

use serde_json::{Map, Value};

use crate::value::{lookup, sort_order, Document};

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Dir {
    /// Ascending order (smallest first).
    #[default]
    Asc,
    /// Descending order (largest first).
    Desc,
}

impl Dir {
    /// Interprets a direction keyword.
    ///
    /// `asc` in any case is ascending; every other keyword is descending.
    pub fn from_keyword(keyword: &str) -> Dir {
        if keyword.trim().eq_ignore_ascii_case("asc") {
            Dir::Asc
        } else {
            Dir::Desc
        }
    }

    /// Returns the store's numeric direction: `1` or `-1`.
    pub fn as_i32(self) -> i32 {
        match self {
            Dir::Asc => 1,
            Dir::Desc => -1,
        }
    }

    /// Applies this direction to an ordering.
    pub fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Dir::Asc => ordering,
            Dir::Desc => ordering.reverse(),
        }
    }

    /// Returns the display name of this direction.
    pub fn as_str(self) -> &'static str {
        match self {
            Dir::Asc => "asc",
            Dir::Desc => "desc",
        }
    }
}

impl From<&str> for Dir {
    fn from(keyword: &str) -> Self {
        Dir::from_keyword(keyword)
    }
}

impl std::fmt::Display for Dir {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single ordering key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    /// The field to sort by.
    pub field: String,
    /// The sort direction.
    pub dir: Dir,
}

impl OrderBy {
    /// Creates a new ordering key.
    pub fn new(field: impl Into<String>, dir: Dir) -> Self {
        OrderBy {
            field: field.into(),
            dir,
        }
    }
}

/// Ordered sort keys, first key is the primary one.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SortSpec {
    keys: Vec<OrderBy>,
}

impl SortSpec {
    /// Creates an empty sort spec (store order).
    pub fn new() -> Self {
        SortSpec::default()
    }

    /// Sorts every field in `fields` with the same direction.
    ///
    /// A field listed twice keeps its first position.
    pub fn uniform<I, S>(fields: I, dir: Dir) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut spec = SortSpec::new();
        for field in fields {
            spec = spec.then(field, dir);
        }
        spec
    }

    /// Appends a key unless the field is already present.
    pub fn then(mut self, field: impl Into<String>, dir: Dir) -> Self {
        let field = field.into();
        if !field.is_empty() && !self.keys.iter().any(|k| k.field == field) {
            self.keys.push(OrderBy::new(field, dir));
        }
        self
    }

    /// Returns the keys in priority order.
    pub fn keys(&self) -> &[OrderBy] {
        &self.keys
    }

    /// Returns `true` if there are no keys.
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Renders `{field: 1|-1, ...}` in key order.
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        for key in &self.keys {
            doc.insert(key.field.clone(), Value::from(key.dir.as_i32()));
        }
        Value::Object(doc)
    }

    /// Compares two documents by the keys, breaking ties with later keys.
    pub fn compare(&self, a: &Document, b: &Document) -> Ordering {
        for key in &self.keys {
            let ordering = key
                .dir
                .apply(sort_order(lookup(a, &key.field), lookup(b, &key.field)));
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
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
    fn keywords() {
        assert_eq!(Dir::from_keyword("asc"), Dir::Asc);
        assert_eq!(Dir::from_keyword("ASC"), Dir::Asc);
        assert_eq!(Dir::from_keyword("desc"), Dir::Desc);
        assert_eq!(Dir::from_keyword("sideways"), Dir::Desc);
        assert_eq!(Dir::from("Asc"), Dir::Asc);
        assert_eq!(Dir::default(), Dir::Asc);
    }

    #[test]
    fn dir_apply() {
        assert_eq!(Dir::Asc.apply(Ordering::Less), Ordering::Less);
        assert_eq!(Dir::Desc.apply(Ordering::Less), Ordering::Greater);
        assert_eq!(Dir::Desc.apply(Ordering::Equal), Ordering::Equal);
    }

    #[test]
    fn uniform_document() {
        let spec = SortSpec::uniform(["name", "age"], Dir::Desc);
        assert_eq!(spec.to_document(), json!({"name": -1, "age": -1}));
        assert_eq!(spec.keys()[0].field, "name");

        let spec = SortSpec::uniform(["name"], Dir::Asc);
        assert_eq!(spec.to_document(), json!({"name": 1}));
    }

    #[test]
    fn duplicate_fields_keep_first_position() {
        let spec = SortSpec::uniform(["a", "b", "a", ""], Dir::Asc);
        assert_eq!(spec.keys().len(), 2);
    }

    #[test]
    fn compare_by_multiple_keys() {
        let a = doc(json!({"priority": 1, "name": "a"}));
        let b = doc(json!({"priority": 1, "name": "b"}));
        let c = doc(json!({"priority": 2, "name": "a"}));

        let spec = SortSpec::new()
            .then("priority", Dir::Desc)
            .then("name", Dir::Asc);
        assert_eq!(spec.compare(&a, &b), Ordering::Less);
        assert_eq!(spec.compare(&c, &a), Ordering::Less);
        assert_eq!(SortSpec::new().compare(&a, &c), Ordering::Equal);
    }

    #[test]
    fn missing_fields_sort_first_ascending() {
        let with = doc(json!({"age": 3}));
        let without = doc(json!({}));
        let spec = SortSpec::uniform(["age"], Dir::Asc);
        assert_eq!(spec.compare(&without, &with), Ordering::Less);
    }
}
