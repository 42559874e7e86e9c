//! Field projections.

use serde_json::{Map, Value};

use crate::value::Document;

/// Name of the identifier field, always kept by a projection.
pub const ID_FIELD: &str = "_id";

/// Set of included fields, in first-seen order.
///
/// An empty projection returns whole documents.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Projection {
    fields: Vec<String>,
}

impl Projection {
    /// Creates a projection including exactly `fields`.
    pub fn new<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut projection = Projection::default();
        for field in fields {
            let field = field.into();
            if !field.is_empty() && !projection.fields.contains(&field) {
                projection.fields.push(field);
            }
        }
        projection
    }

    /// Returns the included fields.
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    /// Returns `true` if nothing is projected.
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Renders `{field: 1, ...}`.
    pub fn to_document(&self) -> Value {
        let mut doc = Map::new();
        for field in &self.fields {
            doc.insert(field.clone(), Value::from(1));
        }
        Value::Object(doc)
    }

    /// Applies the projection to a document, keeping `_id`.
    pub fn apply(&self, doc: &Document) -> Document {
        if self.is_empty() {
            return doc.clone();
        }
        let mut out = Map::new();
        if let Some(id) = doc.get(ID_FIELD) {
            out.insert(ID_FIELD.to_string(), id.clone());
        }
        for field in &self.fields {
            copy_path(doc, &mut out, field);
        }
        out
    }
}

/// Copies a dotted path from `src` into `dst`, creating intermediate objects.
fn copy_path(src: &Document, dst: &mut Document, path: &str) {
    match path.split_once('.') {
        None => {
            if let Some(value) = src.get(path) {
                dst.insert(path.to_string(), value.clone());
            }
        }
        Some((head, rest)) => {
            let Some(Value::Object(inner_src)) = src.get(head) else {
                return;
            };
            let emptied = match dst
                .entry(head.to_string())
                .or_insert_with(|| Value::Object(Map::new()))
            {
                Value::Object(inner_dst) => {
                    copy_path(inner_src, inner_dst, rest);
                    inner_dst.is_empty()
                }
                _ => false,
            };
            if emptied {
                dst.remove(head);
            }
        }
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
    fn renders_included_fields() {
        let projection = Projection::new(["name", "age"]);
        assert_eq!(projection.to_document(), json!({"name": 1, "age": 1}));
    }

    #[test]
    fn duplicates_and_empty_names_are_skipped() {
        let projection = Projection::new(["name", "", "name"]);
        assert_eq!(projection.fields(), ["name".to_string()]);
    }

    #[test]
    fn apply_keeps_id_and_listed_fields() {
        let d = doc(json!({"_id": "x1", "name": "payam", "age": 30, "city": "Tehran"}));
        let projected = Projection::new(["name", "missing"]).apply(&d);
        assert_eq!(Value::Object(projected), json!({"_id": "x1", "name": "payam"}));
    }

    #[test]
    fn apply_nested_paths() {
        let d = doc(json!({"author": {"name": "m", "born": 1970}, "title": "t"}));
        let projected = Projection::new(["author.name", "title.sub"]).apply(&d);
        assert_eq!(Value::Object(projected), json!({"author": {"name": "m"}}));
    }

    #[test]
    fn empty_projection_is_identity() {
        let d = doc(json!({"a": 1}));
        assert_eq!(Projection::default().apply(&d), d);
    }
}
