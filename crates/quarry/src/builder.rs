//! Fluent query builder.
//!
//! A [`QueryBuilder`] accumulates a namespace, a condition tree, a
//! projection and a sort, then runs one of its terminal operations against
//! the client's store.
//!
//! # Example
//!
//! ```rust
//! use quarry::{Client, Config, MemoryStore};
//! use serde_json::json;
//!
//! let client = Client::connect(MemoryStore::new(), Config::default().with_database("library"));
//! let books = client.query().table("books");
//! books.create(&json!({"title": "Dune", "year": 1965})).unwrap();
//! books.create(&json!({"title": "Emma", "year": 1815})).unwrap();
//!
//! let modern = books
//!     .clone()
//!     .where_greater_than("year", 1900)
//!     .or_where_group(|g| {
//!         g.where_equal("title", "Emma");
//!     })
//!     .order_by(["year"], "desc")
//!     .get(0)
//!     .unwrap();
//! assert_eq!(modern.len(), 2);
//! ```

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use quarry_filter::{
    BoolKind, Clause, Compiler, Dir, Document, Group, Op, Projection, Promotion, SortSpec,
};

use crate::client::Client;
use crate::error::{QueryError, Result};
use crate::state::QueryState;
use crate::store::{Collection, DocumentId, Store, Update, UpdateCounts};

/// What a query would send to the store, without running it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explain {
    pub filter: Value,
    pub projection: Value,
    pub sort: Value,
}

/// A query under construction.
///
/// Chain methods consume and return the builder. Terminal methods borrow
/// it, so the same builder can be executed again after the store changes.
pub struct QueryBuilder<'c, S> {
    client: &'c Client<S>,
    state: QueryState,
}

impl<'c, S> Clone for QueryBuilder<'c, S> {
    fn clone(&self) -> Self {
        QueryBuilder {
            client: self.client,
            state: self.state.clone(),
        }
    }
}

impl<'c, S> std::fmt::Debug for QueryBuilder<'c, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryBuilder")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl<'c, S: Store> QueryBuilder<'c, S> {
    /// Starts an empty query on the client's configured database.
    pub fn new(client: &'c Client<S>) -> Self {
        QueryBuilder {
            client,
            state: QueryState::new(client.config().database.clone()),
        }
    }

    /// The accumulated state.
    pub fn state(&self) -> &QueryState {
        &self.state
    }

    // ========================================================================
    // Namespace
    // ========================================================================

    /// Selects the database. An empty name is ignored.
    pub fn db(mut self, name: &str) -> Self {
        self.state.set_database(name);
        self
    }

    /// Selects the table (collection). An empty name is ignored.
    pub fn table(mut self, name: &str) -> Self {
        self.state.set_table(name);
        self
    }

    // ========================================================================
    // Conditions
    // ========================================================================

    /// Adds an equality condition joined with AND.
    pub fn where_(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_cmp(field, Op::Eq, value)
    }

    /// Adds an equality condition joined with OR.
    pub fn or_where(self, field: &str, value: impl Into<Value>) -> Self {
        self.or_where_cmp(field, Op::Eq, value)
    }

    /// Adds a typed comparison joined with AND.
    pub fn where_cmp(mut self, field: &str, op: Op, value: impl Into<Value>) -> Self {
        self.scope().where_cmp(field, op, value);
        self
    }

    /// Adds a typed comparison joined with OR.
    pub fn or_where_cmp(mut self, field: &str, op: Op, value: impl Into<Value>) -> Self {
        self.scope().or_where_cmp(field, op, value);
        self
    }

    /// Adds a comparison whose operator is given as text, joined with AND.
    ///
    /// Unrecognised operators become equality.
    pub fn where_op(mut self, field: &str, value: impl Into<Value>, op: &str) -> Self {
        self.scope().where_op(field, value, op);
        self
    }

    /// Adds a comparison whose operator is given as text, joined with OR.
    pub fn or_where_op(mut self, field: &str, value: impl Into<Value>, op: &str) -> Self {
        self.scope().or_where_op(field, value, op);
        self
    }

    pub fn where_equal(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_cmp(field, Op::Eq, value)
    }

    pub fn where_not(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_cmp(field, Op::Ne, value)
    }

    pub fn where_greater_than(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_cmp(field, Op::Gt, value)
    }

    pub fn where_greater_than_or_equal(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_cmp(field, Op::Gte, value)
    }

    pub fn where_less_than(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_cmp(field, Op::Lt, value)
    }

    pub fn where_less_than_or_equal(self, field: &str, value: impl Into<Value>) -> Self {
        self.where_cmp(field, Op::Lte, value)
    }

    /// Matches when the field equals any of `values`.
    pub fn where_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_cmp(field, Op::In, sequence(values))
    }

    /// Matches when the field equals none of `values`.
    pub fn where_not_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.where_cmp(field, Op::NotIn, sequence(values))
    }

    pub fn or_where_equal(self, field: &str, value: impl Into<Value>) -> Self {
        self.or_where_cmp(field, Op::Eq, value)
    }

    pub fn or_where_not(self, field: &str, value: impl Into<Value>) -> Self {
        self.or_where_cmp(field, Op::Ne, value)
    }

    pub fn or_where_greater_than(self, field: &str, value: impl Into<Value>) -> Self {
        self.or_where_cmp(field, Op::Gt, value)
    }

    pub fn or_where_greater_than_or_equal(self, field: &str, value: impl Into<Value>) -> Self {
        self.or_where_cmp(field, Op::Gte, value)
    }

    pub fn or_where_less_than(self, field: &str, value: impl Into<Value>) -> Self {
        self.or_where_cmp(field, Op::Lt, value)
    }

    pub fn or_where_less_than_or_equal(self, field: &str, value: impl Into<Value>) -> Self {
        self.or_where_cmp(field, Op::Lte, value)
    }

    pub fn or_where_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.or_where_cmp(field, Op::In, sequence(values))
    }

    pub fn or_where_not_in<I, V>(self, field: &str, values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.or_where_cmp(field, Op::NotIn, sequence(values))
    }

    /// Adds a nested group joined with AND.
    ///
    /// `build` only sees the new group; whatever it adds ends up as one
    /// nested condition. A group left empty is dropped.
    pub fn where_group<F>(mut self, build: F) -> Self
    where
        F: FnOnce(&mut GroupScope<'_>),
    {
        self.scope().where_group(build);
        self
    }

    /// Adds a nested group joined with OR.
    pub fn or_where_group<F>(mut self, build: F) -> Self
    where
        F: FnOnce(&mut GroupScope<'_>),
    {
        self.scope().or_where_group(build);
        self
    }

    /// Chooses how an AND scope becomes OR.
    pub fn with_promotion(mut self, promotion: Promotion) -> Self {
        self.state.compiler.set_promotion(promotion);
        self
    }

    // ========================================================================
    // Projection and sort
    // ========================================================================

    /// Replaces the projection with `fields`.
    pub fn select<I, F>(mut self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.state.projection = Projection::new(fields);
        self
    }

    /// Replaces the sort with `fields`, all in direction `dir`.
    ///
    /// `dir` accepts a [`Dir`] or a keyword: `"asc"` in any case is
    /// ascending, anything else descending.
    pub fn order_by<I, F>(mut self, fields: I, dir: impl Into<Dir>) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.state.sort = SortSpec::uniform(fields, dir.into());
        self
    }

    /// Replaces the sort with `fields`, ascending.
    pub fn order_by_asc<I, F>(self, fields: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: Into<String>,
    {
        self.order_by(fields, Dir::default())
    }

    // ========================================================================
    // Terminals
    // ========================================================================

    /// Returns matching documents; `limit` 0 means no limit.
    pub fn get(&self, limit: usize) -> Result<Vec<Document>> {
        let options = self.state.find_options(limit);
        self.execute("find", |collection, filter| {
            Ok(collection.find(filter, &options)?)
        })
    }

    /// Like [`get`](Self::get), deserializing each document into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, limit: usize) -> Result<Vec<T>> {
        self.get(limit)?
            .into_iter()
            .map(|doc| Ok(serde_json::from_value(Value::Object(doc))?))
            .collect()
    }

    /// Returns the first matching document, if any.
    pub fn first(&self) -> Result<Option<Document>> {
        let options = self.state.find_options(1);
        self.execute("find_one", |collection, filter| {
            Ok(collection.find_one(filter, &options)?)
        })
    }

    /// Inserts one document and returns its identifier.
    pub fn create<T: Serialize>(&self, doc: &T) -> Result<DocumentId> {
        self.execute("insert_one", |collection, _| {
            let doc = to_document(doc)?;
            Ok(collection.insert_one(doc)?)
        })
    }

    /// Inserts documents in order and returns their identifiers.
    pub fn create_many<T: Serialize>(&self, docs: &[T]) -> Result<Vec<DocumentId>> {
        self.execute("insert_many", |collection, _| {
            let docs = docs.iter().map(to_document).collect::<Result<Vec<_>>>()?;
            Ok(collection.insert_many(docs)?)
        })
    }

    /// Sets `fields` on every matching document.
    pub fn update<T: Serialize>(&self, fields: &T) -> Result<UpdateCounts> {
        self.execute("update_many", |collection, filter| {
            let update = Update::set(to_document(fields)?);
            Ok(collection.update_many(filter, &update)?)
        })
    }

    /// Removes every matching document and returns how many were removed.
    pub fn delete(&self) -> Result<u64> {
        self.execute("delete_many", |collection, filter| {
            Ok(collection.delete_many(filter)?)
        })
    }

    /// Counts matching documents.
    pub fn count(&self) -> Result<u64> {
        self.execute("count_documents", |collection, filter| {
            Ok(collection.count_documents(filter)?)
        })
    }

    /// Renders the filter, projection and sort without touching the store.
    pub fn explain(&self) -> Result<Explain> {
        Ok(Explain {
            filter: self.state.filter()?.to_filter(),
            projection: self.state.projection.to_document(),
            sort: self.state.sort.to_document(),
        })
    }

    fn scope(&mut self) -> GroupScope<'_> {
        GroupScope {
            compiler: &mut self.state.compiler,
        }
    }

    fn execute<T, F>(&self, operation: &'static str, run: F) -> Result<T>
    where
        F: FnOnce(&S::Collection, &Group) -> Result<T>,
    {
        let (namespace, collection) = self.client.collection(&self.state)?;
        let filter = self.state.filter()?;
        tracing::debug!(
            %namespace,
            operation,
            filter = %filter.to_filter(),
            "executing query"
        );
        run(&collection, &filter).inspect_err(|err| {
            tracing::debug!(%namespace, operation, error = %err, "query failed");
        })
    }
}

/// Handle passed to group callbacks.
///
/// It can only add conditions, and everything it adds lands in the group
/// that was opened for the callback.
pub struct GroupScope<'g> {
    compiler: &'g mut Compiler,
}

impl<'g> GroupScope<'g> {
    pub fn where_(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.push(field, Op::Eq, value, BoolKind::And)
    }

    pub fn or_where(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.push(field, Op::Eq, value, BoolKind::Or)
    }

    pub fn where_cmp(&mut self, field: &str, op: Op, value: impl Into<Value>) -> &mut Self {
        self.push(field, op, value, BoolKind::And)
    }

    pub fn or_where_cmp(&mut self, field: &str, op: Op, value: impl Into<Value>) -> &mut Self {
        self.push(field, op, value, BoolKind::Or)
    }

    pub fn where_op(&mut self, field: &str, value: impl Into<Value>, op: &str) -> &mut Self {
        self.push(field, Op::coerce(op), value, BoolKind::And)
    }

    pub fn or_where_op(&mut self, field: &str, value: impl Into<Value>, op: &str) -> &mut Self {
        self.push(field, Op::coerce(op), value, BoolKind::Or)
    }

    pub fn where_equal(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.push(field, Op::Eq, value, BoolKind::And)
    }

    pub fn where_not(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.push(field, Op::Ne, value, BoolKind::And)
    }

    pub fn where_greater_than(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.push(field, Op::Gt, value, BoolKind::And)
    }

    pub fn where_greater_than_or_equal(
        &mut self,
        field: &str,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.push(field, Op::Gte, value, BoolKind::And)
    }

    pub fn where_less_than(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.push(field, Op::Lt, value, BoolKind::And)
    }

    pub fn where_less_than_or_equal(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.push(field, Op::Lte, value, BoolKind::And)
    }

    pub fn where_in<I, V>(&mut self, field: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push(field, Op::In, sequence(values), BoolKind::And)
    }

    pub fn where_not_in<I, V>(&mut self, field: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push(field, Op::NotIn, sequence(values), BoolKind::And)
    }

    pub fn or_where_equal(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.push(field, Op::Eq, value, BoolKind::Or)
    }

    pub fn or_where_not(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.push(field, Op::Ne, value, BoolKind::Or)
    }

    pub fn or_where_greater_than(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.push(field, Op::Gt, value, BoolKind::Or)
    }

    pub fn or_where_greater_than_or_equal(
        &mut self,
        field: &str,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.push(field, Op::Gte, value, BoolKind::Or)
    }

    pub fn or_where_less_than(&mut self, field: &str, value: impl Into<Value>) -> &mut Self {
        self.push(field, Op::Lt, value, BoolKind::Or)
    }

    pub fn or_where_less_than_or_equal(
        &mut self,
        field: &str,
        value: impl Into<Value>,
    ) -> &mut Self {
        self.push(field, Op::Lte, value, BoolKind::Or)
    }

    pub fn or_where_in<I, V>(&mut self, field: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push(field, Op::In, sequence(values), BoolKind::Or)
    }

    pub fn or_where_not_in<I, V>(&mut self, field: &str, values: I) -> &mut Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.push(field, Op::NotIn, sequence(values), BoolKind::Or)
    }

    /// Opens a nested group joined with AND.
    pub fn where_group<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut GroupScope<'_>),
    {
        self.group(BoolKind::And, build)
    }

    /// Opens a nested group joined with OR.
    pub fn or_where_group<F>(&mut self, build: F) -> &mut Self
    where
        F: FnOnce(&mut GroupScope<'_>),
    {
        self.group(BoolKind::Or, build)
    }

    fn push(&mut self, field: &str, op: Op, value: impl Into<Value>, kind: BoolKind) -> &mut Self {
        self.compiler.add(Clause::new(field, op, value), kind);
        self
    }

    fn group<F>(&mut self, kind: BoolKind, build: F) -> &mut Self
    where
        F: FnOnce(&mut GroupScope<'_>),
    {
        self.compiler
            .nest(kind, |compiler| build(&mut GroupScope { compiler }));
        self
    }
}

fn sequence<I, V>(values: I) -> Value
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    Value::Array(values.into_iter().map(Into::into).collect())
}

fn to_document<T: Serialize>(value: &T) -> Result<Document> {
    match serde_json::to_value(value)? {
        Value::Object(doc) => Ok(doc),
        other => Err(QueryError::NotADocument {
            found: kind_name(&other),
        }),
    }
}

fn kind_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
