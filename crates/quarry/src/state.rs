//! Accumulated state of one query.

use quarry_filter::{Compiler, Group, Projection, SortSpec};
use serde_json::Value;

use crate::error::{QueryError, Result, Setting};
use crate::store::{FindOptions, Namespace};

/// Everything a builder chain has accumulated so far.
///
/// Each builder owns one `QueryState`; nothing here is shared between
/// queries.
#[derive(Debug, Clone, Default)]
pub struct QueryState {
    pub database: Option<String>,
    pub table: Option<String>,
    pub compiler: Compiler,
    pub projection: Projection,
    pub sort: SortSpec,
}

impl QueryState {
    /// Creates a state whose database defaults to `database`.
    pub fn new(database: Option<String>) -> Self {
        QueryState {
            database: database.filter(|name| !name.is_empty()),
            ..QueryState::default()
        }
    }

    /// Selects the database. An empty name keeps the current one.
    pub fn set_database(&mut self, name: &str) {
        if !name.is_empty() {
            self.database = Some(name.to_string());
        }
    }

    /// Selects the table. An empty name keeps the current one.
    pub fn set_table(&mut self, name: &str) {
        if !name.is_empty() {
            self.table = Some(name.to_string());
        }
    }

    /// Returns the namespace to execute against.
    ///
    /// The database is checked before the table.
    pub fn namespace(&self) -> Result<Namespace> {
        let database = self
            .database
            .as_deref()
            .ok_or(QueryError::Configuration(Setting::Database))?;
        let table = self
            .table
            .as_deref()
            .ok_or(QueryError::Configuration(Setting::Table))?;
        Ok(Namespace::new(database, table))
    }

    /// Compiles the condition tree.
    pub fn filter(&self) -> Result<Group> {
        Ok(self.compiler.compile()?)
    }

    /// Compiles and renders the store filter document.
    pub fn filter_document(&self) -> Result<Value> {
        Ok(self.filter()?.to_filter())
    }

    /// Builds find options; a limit of 0 means unlimited.
    pub fn find_options(&self, limit: usize) -> FindOptions {
        FindOptions {
            limit: (limit > 0).then_some(limit),
            projection: self.projection.clone(),
            sort: self.sort.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_names_keep_previous_values() {
        let mut state = QueryState::new(Some("library".into()));
        state.set_table("books");
        state.set_table("");
        state.set_database("");
        assert_eq!(state.namespace().unwrap(), Namespace::new("library", "books"));
    }

    #[test]
    fn database_is_checked_first() {
        let state = QueryState::new(None);
        assert!(matches!(
            state.namespace(),
            Err(QueryError::Configuration(Setting::Database))
        ));

        let state = QueryState::new(Some(String::new()));
        assert!(state.database.is_none());
    }

    #[test]
    fn missing_table() {
        let state = QueryState::new(Some("library".into()));
        assert!(matches!(
            state.namespace(),
            Err(QueryError::Configuration(Setting::Table))
        ));
    }

    #[test]
    fn zero_limit_is_unlimited() {
        let state = QueryState::default();
        assert_eq!(state.find_options(0).limit, None);
        assert_eq!(state.find_options(5).limit, Some(5));
    }
}
