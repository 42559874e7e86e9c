//! quarry - fluent queries for document stores.
//!
//! Chained `where` calls are compiled into one filter tree (see
//! [`quarry_filter`]) and executed through a [`Store`] implementation. The
//! crate ships [`MemoryStore`] for tests and tooling; a network driver plugs
//! in by implementing [`Store`] and [`Collection`].
//!
//! # Quick Start
//!
//! ```rust
//! use quarry::{Client, Config, MemoryStore};
//! use serde_json::json;
//!
//! let client = Client::connect(MemoryStore::new(), Config::default());
//! let users = client.query().db("app").table("users");
//!
//! users.create_many(&[
//!     json!({"name": "payam", "lastname": "jafari"}),
//!     json!({"name": "mohsen", "lastname": "jafari"}),
//!     json!({"name": "sara", "lastname": "karimi"}),
//! ]).unwrap();
//!
//! let jafaris = users
//!     .clone()
//!     .where_("lastname", "jafari")
//!     .where_group(|g| {
//!         g.where_("name", "payam").or_where("name", "mohsen");
//!     });
//! assert_eq!(jafaris.count().unwrap(), 2);
//! ```
//!
//! # Execution
//!
//! Terminal operations check, in order, that the client reached its store
//! when it was created ([`QueryError::Connection`]), that a database and a
//! table were selected ([`QueryError::Configuration`]), and only then issue
//! a store call. Terminals borrow the builder, so a query can be run again
//! and always sees the current contents of the store.

mod builder;
mod client;
mod config;
mod error;
mod memory;
mod state;
mod store;

pub use builder::{Explain, GroupScope, QueryBuilder};
pub use client::Client;
pub use config::{
    Config, EnvReader, MockEnv, RealEnv, DEFAULT_ADDRESS, DEFAULT_PORT, ENV_ADDRESS,
    ENV_DATABASE, ENV_PASSWORD, ENV_PORT, ENV_USERNAME,
};
pub use error::{ConfigError, QueryError, Result, Setting, StoreError};
pub use memory::{MemoryCollection, MemoryStore};
pub use state::QueryState;
pub use store::{Collection, DocumentId, FindOptions, Namespace, Store, Update, UpdateCounts};

pub use quarry_filter::{
    BoolKind, Clause, Compiler, Condition, Dir, Document, FilterError, Group, Op, OrderBy,
    Projection, Promotion, SortSpec,
};
