//! Seed files: `{"<table>": [<document>, ...], ...}`.

use std::path::Path;

use anyhow::{bail, Context, Result};
use quarry::{Document, MemoryStore, Namespace};
use serde_json::Value;

/// Tables and their documents, in file order.
pub type Seed = Vec<(String, Vec<Document>)>;

/// Reads and validates a seed file.
pub fn read_seed(path: &Path) -> Result<Seed> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read seed file {}", path.display()))?;
    parse_seed(&text).with_context(|| format!("invalid seed file {}", path.display()))
}

pub fn parse_seed(text: &str) -> Result<Seed> {
    let Value::Object(tables) = serde_json::from_str::<Value>(text)? else {
        bail!("top level must be an object mapping table names to document arrays");
    };

    let mut seed = Vec::with_capacity(tables.len());
    for (table, docs) in tables {
        let Value::Array(docs) = docs else {
            bail!("table '{table}' must be an array of documents");
        };
        let docs = docs
            .into_iter()
            .enumerate()
            .map(|(i, doc)| match doc {
                Value::Object(doc) => Ok(doc),
                _ => bail!("table '{table}' entry {i} is not an object"),
            })
            .collect::<Result<Vec<_>>>()?;
        seed.push((table, docs));
    }
    Ok(seed)
}

/// Loads every table of `seed` into `database`.
pub fn load(store: &MemoryStore, database: &str, seed: Seed) {
    for (table, docs) in seed {
        tracing::debug!(database, table = %table, documents = docs.len(), "seeding table");
        store.seed(&Namespace::new(database, table), docs);
    }
}
