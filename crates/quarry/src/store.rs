//! Store capability traits.
//!
//! This module provides the [`Store`] and [`Collection`] traits that connect a
//! document store to the query builder. The builder compiles its state into a
//! filter tree and the options below; the store executes them.
//!
//! # Example
//!
//! ```rust,ignore
//! use quarry::{Collection, Namespace, Store, StoreError};
//!
//! struct DriverStore {
//!     client: driver::Client,
//! }
//!
//! impl Store for DriverStore {
//!     type Collection = DriverCollection;
//!
//!     fn ping(&self) -> Result<(), StoreError> {
//!         self.client.list_databases().map(|_| ()).map_err(to_store_error)
//!     }
//!
//!     fn collection(&self, ns: &Namespace) -> Result<Self::Collection, StoreError> {
//!         let db = self.client.database(&ns.database);
//!         Ok(DriverCollection(db.collection(&ns.collection)))
//!     }
//! }
//! ```
//!
//! # Design Notes
//!
//! - **Sync-only**: the traits are synchronous. An async driver should block
//!   internally. Timeouts and cancellation belong to the driver and come back
//!   as [`StoreError::Timeout`].
//! - **Typed filters**: collections receive the compiled [`Group`]; drivers
//!   that speak the wire format render it with [`Group::to_filter`].

use serde::Serialize;
use serde_json::{json, Value};

use quarry_filter::{Document, Group, Projection, SortSpec};

use crate::error::StoreError;

/// Identifier generated (or supplied) for an inserted document.
pub type DocumentId = Value;

/// A database and collection pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Namespace {
    pub database: String,
    pub collection: String,
}

impl Namespace {
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Namespace {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl std::fmt::Display for Namespace {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Options for find operations.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FindOptions {
    /// Maximum number of documents; `None` means unlimited.
    pub limit: Option<usize>,
    /// Fields to return; empty returns whole documents.
    pub projection: Projection,
    /// Sort keys; empty keeps store order.
    pub sort: SortSpec,
}

impl FindOptions {
    /// Renders the options in the store's shape (`limit` 0 means unlimited).
    pub fn to_document(&self) -> Value {
        json!({
            "limit": self.limit.unwrap_or(0),
            "projection": self.projection.to_document(),
            "sort": self.sort.to_document(),
        })
    }
}

/// A field-set update applied to every matching document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Update {
    /// Field paths and their new values.
    pub set: Document,
}

impl Update {
    pub fn set(fields: Document) -> Self {
        Update { set: fields }
    }

    /// Renders `{"$set": {...}}`.
    pub fn to_document(&self) -> Value {
        json!({ "$set": Value::Object(self.set.clone()) })
    }
}

/// Outcome of an update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct UpdateCounts {
    /// Documents matching the filter.
    pub matched: u64,
    /// Documents whose contents changed.
    pub modified: u64,
}

/// Operations on one collection.
pub trait Collection {
    /// Returns matching documents, sorted, limited and projected.
    fn find(&self, filter: &Group, options: &FindOptions) -> Result<Vec<Document>, StoreError>;

    /// Returns the first matching document under the same options.
    fn find_one(
        &self,
        filter: &Group,
        options: &FindOptions,
    ) -> Result<Option<Document>, StoreError> {
        let options = FindOptions {
            limit: Some(1),
            ..options.clone()
        };
        Ok(self.find(filter, &options)?.into_iter().next())
    }

    /// Inserts one document and returns its identifier.
    fn insert_one(&self, doc: Document) -> Result<DocumentId, StoreError>;

    /// Inserts documents in order and returns their identifiers.
    fn insert_many(&self, docs: Vec<Document>) -> Result<Vec<DocumentId>, StoreError>;

    /// Applies `update` to every matching document.
    fn update_many(&self, filter: &Group, update: &Update) -> Result<UpdateCounts, StoreError>;

    /// Removes every matching document and returns how many were removed.
    fn delete_many(&self, filter: &Group) -> Result<u64, StoreError>;

    /// Counts matching documents.
    fn count_documents(&self, filter: &Group) -> Result<u64, StoreError>;
}

/// A document store reachable by the query layer.
pub trait Store: Send + Sync {
    /// Handle to one collection.
    type Collection: Collection;

    /// Lightweight reachability probe, run once when a client is created.
    fn ping(&self) -> Result<(), StoreError>;

    /// Selects a database and collection.
    fn collection(&self, namespace: &Namespace) -> Result<Self::Collection, StoreError>;
}
