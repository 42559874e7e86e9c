//! quarry-cli - run quarry queries from the shell.
//!
//! Documents come from a JSON seed file and live in a [`MemoryStore`] for
//! the duration of one command; changes are not written back.
//!
//! ```text
//! quarry --seed library.json --db library --table books \
//!     --where "year >= 1950" --or-where "title = Emma" \
//!     find --order-by year --desc
//! ```

pub mod cli;
pub mod condition;
pub mod seed;

use anyhow::{bail, Context, Result};
use quarry::{BoolKind, Client, Config, Dir, MemoryStore, QueryBuilder, Store};
use serde_json::{json, Value};

pub use cli::{Cli, Command, Invocation, Shape};
pub use condition::CliCondition;

/// Executes one invocation and returns the JSON to print.
pub fn run(invocation: Invocation, config: Config) -> Result<Value> {
    let Invocation { cli, conditions } = invocation;
    let config = match cli.db {
        Some(db) => config.with_database(db),
        None => config,
    };

    let store = MemoryStore::new();
    if let Some(path) = &cli.seed {
        let tables = seed::read_seed(path)?;
        match config.database.as_deref() {
            Some(database) => seed::load(&store, database, tables),
            None => tracing::warn!("no database selected, seed file not loaded"),
        }
    }

    let client = Client::connect(store, config);
    let mut query = client.query();
    if let Some(table) = &cli.table {
        query = query.table(table);
    }
    for cond in conditions {
        query = match cond.kind {
            BoolKind::And => query.where_cmp(&cond.field, cond.op, cond.value),
            BoolKind::Or => query.or_where_cmp(&cond.field, cond.op, cond.value),
        };
    }

    let output = match cli.command {
        Command::Find { limit, shape } => json!(shaped(query, &shape).get(limit)?),
        Command::First { shape } => json!(shaped(query, &shape).first()?),
        Command::Count => json!({ "count": query.count()? }),
        Command::Delete => json!({ "deleted": query.delete()? }),
        Command::Update { fields } => {
            let fields = parse_json(&fields)?;
            serde_json::to_value(query.update(&fields)?)?
        }
        Command::Insert { documents } => match parse_json(&documents)? {
            Value::Array(docs) => json!({ "inserted": query.create_many(&docs)? }),
            doc @ Value::Object(_) => json!({ "inserted": [query.create(&doc)?] }),
            _ => bail!("insert expects a JSON object or an array of objects"),
        },
        Command::Explain { shape } => serde_json::to_value(shaped(query, &shape).explain()?)?,
    };
    Ok(output)
}

fn shaped<'c, S: Store>(query: QueryBuilder<'c, S>, shape: &Shape) -> QueryBuilder<'c, S> {
    let query = if shape.select.is_empty() {
        query
    } else {
        query.select(shape.select.iter().cloned())
    };
    if shape.order_by.is_empty() {
        query
    } else {
        let dir = if shape.desc { Dir::Desc } else { Dir::Asc };
        query.order_by(shape.order_by.iter().cloned(), dir)
    }
}

fn parse_json(text: &str) -> Result<Value> {
    serde_json::from_str(text).with_context(|| format!("invalid JSON argument: {text}"))
}
