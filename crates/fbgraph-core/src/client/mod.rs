//! Graph API clients.
//!
//! [`GraphClient`] is the method surface shared by the real client
//! ([`GraphApi`], speaking HTTP through a [`Transport`]) and the in-process
//! facade ([`MockGraphApi`], calling a simulator [`Graph`](crate::simulator::Graph)
//! directly). Code written against the trait runs unchanged on both.

mod http;
mod mock;
pub(crate) mod query;
mod sim_transport;
mod test_user;
mod transport;


use std::collections::BTreeMap;

use serde_json::{json, Map, Value};

use crate::error::Result;

pub use http::{get_oauth_access_token, GraphApi};
pub use mock::MockGraphApi;
pub use query::{ConnectionQuery, FetchOptions};
pub use sim_transport::SimulatorTransport;
pub use test_user::{TestUser, TestUserRecord};
pub use transport::{Method, Transport, TransportResponse};

/// Operations of the remote graph API.
pub trait GraphClient: Sized {
    /// Returns the access token requests are made with.
    fn access_token(&self) -> Option<&str>;

    /// Returns a client for the same endpoint acting with another token.
    #[must_use]
    fn with_access_token(&self, access_token: Option<&str>) -> Self;

    /// Fetches one object. `id` may be `me`.
    fn fetch(&self, id: &str, options: &FetchOptions) -> Result<Value>;

    /// Fetches several objects, keyed by id.
    fn multi_fetch(&self, ids: &[&str]) -> Result<Value>;

    /// Reads a connection as `{"data": [...]}`.
    fn fetch_connections(&self, id: &str, relation: &str, query: &ConnectionQuery)
        -> Result<Value>;

    /// Writes to a connection of `parent_id`.
    fn put(&self, parent_id: &str, relation: &str, data: &Map<String, Value>) -> Result<Value>;

    /// Searches objects of a type, e.g. `user`.
    fn search(
        &self,
        object_type: &str,
        query: &str,
        extra: &BTreeMap<String, String>,
    ) -> Result<Value>;

    /// Deletes an object.
    fn delete(&self, id: &str) -> Result<Value>;

    /// Fetches the object an URL refers to.
    fn fetch_url(&self, url: &str) -> Result<Value> {
        let result = self.multi_fetch(&[url])?;
        Ok(result.get(url).cloned().unwrap_or(Value::Null))
    }

    /// Posts a message on a profile's wall.
    ///
    /// `attachment` may carry `name`, `link`, `caption`, `description` and
    /// `picture`.
    fn put_wall_post(
        &self,
        message: &str,
        attachment: &Map<String, Value>,
        profile_id: &str,
    ) -> Result<Value> {
        let mut data = attachment.clone();
        data.insert("message".to_string(), json!(message));
        self.put(profile_id, "feed", &data)
    }

    /// Comments on an object.
    fn put_comment(&self, object_id: &str, message: &str) -> Result<Value> {
        let mut data = Map::new();
        data.insert("message".to_string(), json!(message));
        self.put(object_id, "comments", &data)
    }

    /// Likes an object as the current user.
    fn put_like(&self, object_id: &str) -> Result<Value> {
        self.put(object_id, "likes", &Map::new())
    }
}
