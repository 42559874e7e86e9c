//! quarry-filter - condition compiler for document-store filters.
//!
//! Turns a sequence of chained `where` / `or where` calls, including nested
//! groups, into a single filter tree and renders it as the store's filter
//! document. It also carries the projection and sort specs that travel with
//! a query, and can evaluate a filter tree against in-memory documents.
//!
//! # Quick Start
//!
//! ```rust
//! use quarry_filter::{BoolKind, Clause, Compiler, Op};
//! use serde_json::json;
//!
//! let mut compiler = Compiler::new();
//! compiler.add(Clause::new("lastname", Op::Eq, "jafari"), BoolKind::And);
//! compiler.nest(BoolKind::And, |group| {
//!     group.add(Clause::new("name", Op::Eq, "payam"), BoolKind::And);
//!     group.add(Clause::new("name", Op::Eq, "mohsen"), BoolKind::Or);
//! });
//!
//! assert_eq!(
//!     compiler.filter_document().unwrap(),
//!     json!({"$and": [
//!         {"lastname": {"$eq": "jafari"}},
//!         {"$or": [{"name": {"$eq": "payam"}}, {"name": {"$eq": "mohsen"}}]}
//!     ]})
//! );
//! ```
//!
//! # Merge Semantics
//!
//! Each scope (the root, or one open group) has a boolean kind:
//!
//! | Scope kind | Added as | Result |
//! |------------|----------|--------|
//! | empty | any `T` | scope becomes `T` |
//! | AND | AND | appended |
//! | OR | OR | appended |
//! | AND | OR | scope promoted to OR, see [`Promotion`] |
//! | OR | AND | appended under OR |
//!
//! Mixing AND and OR at one level therefore needs an explicit nested group.

mod compiler;
mod condition;
mod error;
mod op;
mod ordering;
mod projection;
mod value;

pub use compiler::{Compiler, Promotion};
pub use condition::{BoolKind, Clause, Condition, Group};
pub use error::{FilterError, Result};
pub use op::Op;
pub use ordering::{Dir, OrderBy, SortSpec};
pub use projection::{Projection, ID_FIELD};
pub use value::{compare_numbers, lookup, sort_order, values_equal, Document};
