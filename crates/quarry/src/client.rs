//! Connection handle and execution guard.

use crate::builder::QueryBuilder;
use crate::config::Config;
use crate::error::{QueryError, Result, StoreError};
use crate::state::QueryState;
use crate::store::{Namespace, Store};

/// A store plus the settings used to reach it.
///
/// Creating a client probes the store once. A failed probe does not fail
/// construction: the client is marked disconnected and every query
/// executed through it returns [`QueryError::Connection`].
#[derive(Debug)]
pub struct Client<S> {
    store: S,
    config: Config,
    probe_error: Option<StoreError>,
}

impl<S: Store> Client<S> {
    /// Wraps `store`, probing it for reachability.
    pub fn connect(store: S, config: Config) -> Self {
        let probe_error = match store.ping() {
            Ok(()) => None,
            Err(err) => {
                tracing::warn!(
                    uri = %redacted_uri(&config),
                    error = %err,
                    "store unreachable, queries will fail"
                );
                Some(err)
            }
        };
        Client {
            store,
            config,
            probe_error,
        }
    }

    /// Returns `true` if the construction-time probe succeeded.
    pub fn is_connected(&self) -> bool {
        self.probe_error.is_none()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Starts a new query on the configured database.
    pub fn query(&self) -> QueryBuilder<'_, S> {
        QueryBuilder::new(self)
    }

    /// Checks the connection and the namespace, then selects the collection.
    ///
    /// No store operation is issued when either check fails.
    pub(crate) fn collection(&self, state: &QueryState) -> Result<(Namespace, S::Collection)> {
        if let Some(err) = &self.probe_error {
            return Err(QueryError::Connection {
                reason: err.to_string(),
            });
        }
        let namespace = state.namespace()?;
        let collection = self.store.collection(&namespace)?;
        Ok((namespace, collection))
    }
}

fn redacted_uri(config: &Config) -> String {
    if config.password.is_empty() {
        config.connection_uri()
    } else {
        Config {
            password: "***".to_string(),
            ..config.clone()
        }
        .connection_uri()
    }
}
