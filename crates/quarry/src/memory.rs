//! In-memory [`Store`] implementation.
//!
//! `MemoryStore` keeps documents per namespace behind a lock and evaluates
//! compiled filter trees directly. It backs the test suite and the CLI, and
//! is a reference for what a driver-backed store has to do.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde_json::{Map, Value};
use uuid::Uuid;

use quarry_filter::{values_equal, Document, Group, ID_FIELD};

use crate::error::StoreError;
use crate::store::{Collection, DocumentId, FindOptions, Namespace, Store, Update, UpdateCounts};

#[derive(Debug, Default)]
struct Shared {
    unreachable: bool,
    collections: RwLock<BTreeMap<Namespace, Vec<Document>>>,
    calls: AtomicUsize,
}

impl Shared {
    fn read(&self) -> RwLockReadGuard<'_, BTreeMap<Namespace, Vec<Document>>> {
        self.collections.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, BTreeMap<Namespace, Vec<Document>>> {
        self.collections.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn enter(&self) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.unreachable {
            return Err(StoreError::Unreachable(
                "connection refused by memory store".to_string(),
            ));
        }
        Ok(())
    }
}

/// Shared-state, in-process document store.
///
/// Cloning yields another handle to the same documents.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    shared: Arc<Shared>,
}

impl MemoryStore {
    /// Creates an empty, reachable store.
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Creates a store whose probe and operations all fail as unreachable.
    pub fn unreachable() -> Self {
        MemoryStore {
            shared: Arc::new(Shared {
                unreachable: true,
                ..Shared::default()
            }),
        }
    }

    /// Appends documents to a namespace without any validation.
    pub fn seed<I>(&self, namespace: &Namespace, docs: I)
    where
        I: IntoIterator<Item = Document>,
    {
        self.shared
            .write()
            .entry(namespace.clone())
            .or_default()
            .extend(docs);
    }

    /// Returns a snapshot of a namespace's documents in insertion order.
    pub fn documents(&self, namespace: &Namespace) -> Vec<Document> {
        self.shared.read().get(namespace).cloned().unwrap_or_default()
    }

    /// Number of operations issued after the reachability probe.
    pub fn calls(&self) -> usize {
        self.shared.calls.load(Ordering::SeqCst)
    }
}

impl Store for MemoryStore {
    type Collection = MemoryCollection;

    fn ping(&self) -> Result<(), StoreError> {
        if self.shared.unreachable {
            return Err(StoreError::Unreachable(
                "no memory store listening".to_string(),
            ));
        }
        Ok(())
    }

    fn collection(&self, namespace: &Namespace) -> Result<Self::Collection, StoreError> {
        self.shared.enter()?;
        Ok(MemoryCollection {
            shared: Arc::clone(&self.shared),
            namespace: namespace.clone(),
        })
    }
}

/// One collection of a [`MemoryStore`].
#[derive(Debug, Clone)]
pub struct MemoryCollection {
    shared: Arc<Shared>,
    namespace: Namespace,
}

impl MemoryCollection {
    /// Gives `doc` an `_id` if it has none and checks it is unused.
    fn prepare(doc: &mut Document, taken: &[DocumentId]) -> Result<DocumentId, StoreError> {
        let id = doc
            .entry(ID_FIELD.to_string())
            .or_insert_with(|| Value::String(Uuid::new_v4().to_string()))
            .clone();
        if taken.iter().any(|existing| values_equal(existing, &id)) {
            return Err(StoreError::Rejected(format!("duplicate key {ID_FIELD}: {id}")));
        }
        Ok(id)
    }

    fn existing_ids(docs: Option<&Vec<Document>>) -> Vec<DocumentId> {
        docs.map(|docs| docs.iter().filter_map(|d| d.get(ID_FIELD).cloned()).collect())
            .unwrap_or_default()
    }
}

impl Collection for MemoryCollection {
    fn find(&self, filter: &Group, options: &FindOptions) -> Result<Vec<Document>, StoreError> {
        self.shared.enter()?;
        let collections = self.shared.read();
        let mut matched: Vec<&Document> = collections
            .get(&self.namespace)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).collect())
            .unwrap_or_default();

        if !options.sort.is_empty() {
            matched.sort_by(|a, b| options.sort.compare(a, b));
        }
        if let Some(limit) = options.limit {
            matched.truncate(limit);
        }
        Ok(matched
            .into_iter()
            .map(|d| options.projection.apply(d))
            .collect())
    }

    fn insert_one(&self, mut doc: Document) -> Result<DocumentId, StoreError> {
        self.shared.enter()?;
        let mut collections = self.shared.write();
        let docs = collections.entry(self.namespace.clone()).or_default();
        let id = Self::prepare(&mut doc, &Self::existing_ids(Some(&*docs)))?;
        docs.push(doc);
        Ok(id)
    }

    fn insert_many(&self, docs: Vec<Document>) -> Result<Vec<DocumentId>, StoreError> {
        self.shared.enter()?;
        let mut collections = self.shared.write();
        let mut taken = Self::existing_ids(collections.get(&self.namespace));
        let mut prepared = Vec::with_capacity(docs.len());
        let mut ids = Vec::with_capacity(docs.len());
        // all or nothing: validate the whole batch before touching the collection
        for mut doc in docs {
            let id = Self::prepare(&mut doc, &taken)?;
            taken.push(id.clone());
            ids.push(id);
            prepared.push(doc);
        }
        collections
            .entry(self.namespace.clone())
            .or_default()
            .extend(prepared);
        Ok(ids)
    }

    fn update_many(&self, filter: &Group, update: &Update) -> Result<UpdateCounts, StoreError> {
        self.shared.enter()?;
        check_update_paths(update)?;
        let mut collections = self.shared.write();
        let mut counts = UpdateCounts::default();
        let Some(docs) = collections.get_mut(&self.namespace) else {
            return Ok(counts);
        };
        // every target must accept every path before any document changes
        for doc in docs.iter().filter(|d| filter.matches(d)) {
            for path in update.set.keys() {
                check_settable(doc, path)?;
            }
        }
        for doc in docs.iter_mut().filter(|d| filter.matches(d)) {
            counts.matched += 1;
            let mut changed = false;
            for (path, value) in &update.set {
                changed |= set_path(doc, path, value);
            }
            if changed {
                counts.modified += 1;
            }
        }
        Ok(counts)
    }

    fn delete_many(&self, filter: &Group) -> Result<u64, StoreError> {
        self.shared.enter()?;
        let mut collections = self.shared.write();
        let Some(docs) = collections.get_mut(&self.namespace) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|d| !filter.matches(d));
        Ok((before - docs.len()) as u64)
    }

    fn count_documents(&self, filter: &Group) -> Result<u64, StoreError> {
        self.shared.enter()?;
        let collections = self.shared.read();
        let count = collections
            .get(&self.namespace)
            .map(|docs| docs.iter().filter(|d| filter.matches(d)).count())
            .unwrap_or(0);
        Ok(count as u64)
    }
}

/// Refuses `_id` paths and paths that overlap another path of the update.
fn check_update_paths(update: &Update) -> Result<(), StoreError> {
    let paths: Vec<&String> = update.set.keys().collect();
    for path in &paths {
        if path.as_str() == ID_FIELD || path.starts_with(&format!("{ID_FIELD}.")) {
            return Err(StoreError::Rejected(format!(
                "field {ID_FIELD} is immutable (update path {path})"
            )));
        }
        if let Some(parent) = paths
            .iter()
            .find(|other| path.starts_with(&format!("{other}.")))
        {
            return Err(StoreError::Rejected(format!(
                "update paths {parent} and {path} conflict"
            )));
        }
    }
    Ok(())
}

/// Checks that every existing intermediate of `path` is an object.
fn check_settable(doc: &Document, path: &str) -> Result<(), StoreError> {
    let mut current = doc;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            break;
        }
        match current.get(segment) {
            None => return Ok(()),
            Some(Value::Object(inner)) => current = inner,
            Some(_) => {
                return Err(StoreError::Rejected(format!(
                    "cannot set {path}: {segment} is not an object"
                )))
            }
        }
    }
    Ok(())
}

/// Sets a dotted path, creating missing intermediate objects. Returns
/// whether the document changed. Paths must pass [`check_settable`] first.
fn set_path(doc: &mut Document, path: &str, value: &Value) -> bool {
    match path.split_once('.') {
        None => match doc.get(path) {
            Some(current) if values_equal(current, value) => false,
            _ => {
                doc.insert(path.to_string(), value.clone());
                true
            }
        },
        Some((head, rest)) => match doc
            .entry(head.to_string())
            .or_insert_with(|| Value::Object(Map::new()))
        {
            Value::Object(inner) => set_path(inner, rest, value),
            _ => false,
        },
    }
}
