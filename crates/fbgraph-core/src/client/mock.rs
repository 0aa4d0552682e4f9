//! In-process client calling a simulator directly.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::Result;
use crate::simulator::Graph;

use super::query::{ConnectionQuery, FetchOptions};
use super::GraphClient;

/// A [`GraphClient`] backed by a shared [`Graph`].
#[derive(Debug, Clone)]
pub struct MockGraphApi {
    graph: Arc<Graph>,
    access_token: Option<String>,
}

impl MockGraphApi {
    /// Creates a client acting with `access_token` (none for the application itself).
    #[must_use]
    pub fn new(graph: Arc<Graph>, access_token: Option<&str>) -> Self {
        Self {
            graph,
            access_token: access_token.map(str::to_string),
        }
    }

    /// Returns the simulator this client talks to.
    #[must_use]
    pub fn graph(&self) -> &Arc<Graph> {
        &self.graph
    }
}

impl GraphClient for MockGraphApi {
    fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    fn with_access_token(&self, access_token: Option<&str>) -> Self {
        Self::new(Arc::clone(&self.graph), access_token)
    }

    fn fetch(&self, id: &str, options: &FetchOptions) -> Result<Value> {
        self.graph.fetch(self.access_token(), id, options)
    }

    fn multi_fetch(&self, ids: &[&str]) -> Result<Value> {
        self.graph.multi_fetch(self.access_token(), ids)
    }

    fn fetch_connections(
        &self,
        id: &str,
        relation: &str,
        query: &ConnectionQuery,
    ) -> Result<Value> {
        self.graph
            .fetch_connection(self.access_token(), id, relation, query)
    }

    fn put(&self, parent_id: &str, relation: &str, data: &Map<String, Value>) -> Result<Value> {
        self.graph.put(self.access_token(), parent_id, relation, data)
    }

    fn search(
        &self,
        object_type: &str,
        query: &str,
        extra: &BTreeMap<String, String>,
    ) -> Result<Value> {
        self.graph
            .search(self.access_token(), object_type, query, extra)
    }

    fn delete(&self, id: &str) -> Result<Value> {
        self.graph.delete(self.access_token(), id)
    }
}
