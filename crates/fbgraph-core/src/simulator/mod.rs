//! In-process simulator of the remote social graph.
//!
//! [`Graph`] owns the object store, the session manager and the identity
//! generator behind a single lock, so every operation observes and leaves a
//! consistent graph. Share it with `Arc<Graph>`.
//!
//! # Example
//!
//! ```rust
//! use std::sync::Arc;
//! use fbgraph_core::client::{FetchOptions, GraphClient};
//! use fbgraph_core::simulator::Graph;
//!
//! let graph = Arc::new(Graph::new("app", "s3cr3t").unwrap());
//! let user = graph.create_user(true, &["email"], serde_json::Map::new()).unwrap();
//!
//! let me = user.graph_api().unwrap().fetch("me", &FetchOptions::new()).unwrap();
//! assert_eq!(me["id"], user.id());
//! ```

mod realtime;

#[cfg(test)]
mod graph_tests;

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use parking_lot::{Mutex, MutexGuard};
use serde_json::{json, Map, Value};
use tracing::{debug, info, warn};

use crate::auth::{
    constant_time_eq, encode_cookie_token, parse_signed_request, unix_now, user_from_cookies,
    SignedRequest,
};
use crate::client::query::{page, parse_count};
use crate::client::{ConnectionQuery, FetchOptions, MockGraphApi, TestUser};
use crate::config::GraphConfig;
use crate::error::{Error, Result};
use crate::graph::{
    GraphObject, GraphStore, IdentityGenerator, NodeKind, WriteContext, WriteRequest,
};
use crate::session::SessionManager;

pub use realtime::{RealtimeEntry, RealtimeUpdate};

/// Alias the remote API resolves to the caller's own user.
pub const ME: &str = "me";

struct GraphState {
    store: GraphStore,
    sessions: SessionManager,
    identities: IdentityGenerator,
}

/// The simulated graph of one application.
pub struct Graph {
    config: GraphConfig,
    state: Mutex<GraphState>,
}

impl std::fmt::Debug for Graph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Graph")
            .field("app_id", &self.config.app.id)
            .field("objects", &self.state.try_lock().map(|s| s.store.len()))
            .finish_non_exhaustive()
    }
}

impl Graph {
    /// Creates a graph for the given application with default settings.
    pub fn new(app_id: &str, app_secret: &str) -> Result<Self> {
        Self::from_config(GraphConfig::for_app(app_id, app_secret))
    }

    /// Creates a graph from a validated configuration.
    ///
    /// The application object is created up front so test users can be
    /// provisioned through `<app_id>/accounts/test-users`.
    pub fn from_config(config: GraphConfig) -> Result<Self> {
        config.validate()?;

        let mut store = GraphStore::new();
        let app = GraphObject::new(&config.app.id, NodeKind::Application)
            .with_field("name", json!(config.app.name));
        store.set(&config.app.id, app);

        let identities =
            IdentityGenerator::new(config.test_users.seed, &config.test_users.email_domain);
        info!(app_id = %config.app.id, "graph simulator created");

        Ok(Self {
            config,
            state: Mutex::new(GraphState {
                store,
                sessions: SessionManager::new(),
                identities,
            }),
        })
    }

    /// Returns the configuration the graph was built from.
    #[must_use]
    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    /// Returns the application id.
    #[must_use]
    pub fn app_id(&self) -> &str {
        &self.config.app.id
    }

    /// Returns the application secret.
    #[must_use]
    pub fn app_secret(&self) -> &str {
        &self.config.app.secret
    }

    fn lock(&self) -> MutexGuard<'_, GraphState> {
        self.state.lock()
    }

    // ── Facade operations ─────────────────────────────────────────────

    /// Fetches an object, or a connection when `path` has more than one segment.
    pub fn fetch(
        &self,
        access_token: Option<&str>,
        path: &str,
        options: &FetchOptions,
    ) -> Result<Value> {
        let (id, rest) = split_once_slash(path.trim_matches('/'));
        if let Some(relation_path) = rest {
            return self.fetch_connection(access_token, id, relation_path, &ConnectionQuery::new());
        }

        let state = self.lock();
        let id = resolve_id(&state.sessions, id, access_token)?;
        let object = state.store.get(&id)?;
        debug!(id = %id, fields = options.fields.len(), "object fetched");
        Ok(self.render(&state.store, object, options))
    }

    /// Reads the entries of a connection, e.g. `me/friends` or
    /// `<app_id>/accounts/test-users`.
    pub fn fetch_connection(
        &self,
        access_token: Option<&str>,
        id: &str,
        relation_path: &str,
        query: &ConnectionQuery,
    ) -> Result<Value> {
        let (relation, sub_path) = split_once_slash(relation_path);
        let sub_path = sub_path.unwrap_or("");

        let state = self.lock();
        let owner = resolve_id(&state.sessions, id, access_token)?;
        let kind = state.store.relation_kind(&owner, relation)?;
        if !kind.accepts_read_path(sub_path) {
            return Err(Error::NotFound(format!("{owner}/{relation_path}")));
        }

        let entries = state
            .store
            .peek_connection(&owner, relation)?
            .map(|c| c.read(access_token))
            .unwrap_or_default();
        let data = query.apply(entries);
        debug!(owner = %owner, relation, count = data.len(), "connection read");
        Ok(json!({ "data": data }))
    }

    /// Fetches several objects at once, keyed by the requested ids.
    pub fn multi_fetch<S: AsRef<str>>(&self, access_token: Option<&str>, ids: &[S]) -> Result<Value> {
        let state = self.lock();
        let mut result = Map::new();
        for requested in ids {
            let requested = requested.as_ref();
            let id = resolve_id(&state.sessions, requested, access_token)?;
            result.insert(requested.to_string(), state.store.get(&id)?.to_json());
        }
        debug!(count = result.len(), "objects fetched");
        Ok(Value::Object(result))
    }

    /// Writes to a connection of `parent_id` with the relation's semantics.
    pub fn put(
        &self,
        access_token: Option<&str>,
        parent_id: &str,
        relation_path: &str,
        data: &Map<String, Value>,
    ) -> Result<Value> {
        let (relation, sub_path) = split_once_slash(relation_path.trim_matches('/'));
        let sub_path = sub_path.unwrap_or("");

        let mut state = self.lock();
        let GraphState {
            store,
            sessions,
            identities,
        } = &mut *state;

        let owner = resolve_id(sessions, parent_id, access_token)?;
        let kind = store.relation_kind(&owner, relation)?;
        let mut ctx = WriteContext {
            store,
            sessions,
            identities,
            now: unix_now(),
        };
        kind.write(
            &mut ctx,
            &WriteRequest {
                owner: &owner,
                relation,
                access_token,
                sub_path,
                payload: data,
            },
        )
    }

    /// Searches objects of `object_type` whose string fields contain `query`.
    ///
    /// `extra` may carry `limit` and `offset`.
    pub fn search(
        &self,
        _access_token: Option<&str>,
        object_type: &str,
        query: &str,
        extra: &BTreeMap<String, String>,
    ) -> Result<Value> {
        let kind: NodeKind = object_type.parse()?;
        let limit = parse_count(extra, "limit")?;
        let offset = parse_count(extra, "offset")?;

        let state = self.lock();
        let hits = state
            .store
            .objects_of_kind(kind)
            .filter(|o| o.matches_text(query))
            .map(GraphObject::to_json);
        let data = page(hits, offset, limit);
        debug!(kind = %kind, query, count = data.len(), "search");
        Ok(json!({ "data": data }))
    }

    /// Deletes an object, every entry pointing at it and its session.
    pub fn delete(&self, access_token: Option<&str>, id: &str) -> Result<Value> {
        let mut state = self.lock();
        let id = resolve_id(&state.sessions, id, access_token)?;
        let removed = state.store.remove(&id)?;
        state.sessions.revoke(&id);
        info!(id = %id, kind = %removed.kind(), "object deleted");
        Ok(Value::Bool(true))
    }

    // ── Direct state manipulation ─────────────────────────────────────

    /// Returns a copy of an object.
    pub fn get(&self, id: &str) -> Result<GraphObject> {
        self.lock().store.get(id).cloned()
    }

    /// Inserts or replaces the object stored under `id`.
    pub fn set(&self, id: &str, object: GraphObject) {
        self.lock().store.set(id, object);
    }

    /// Shallow-merges `fields` into an existing object.
    pub fn update(&self, id: &str, fields: Map<String, Value>) -> Result<()> {
        self.lock().store.update(id, fields)
    }

    /// Marks a user as having installed the application.
    pub fn install_user<S: AsRef<str>>(&self, user_id: &str, permissions: &[S]) -> Result<()> {
        let mut state = self.lock();
        state.store.get(user_id)?;
        state.sessions.install(user_id, permissions);
        Ok(())
    }

    /// Removes a user's installation. Returns false if it was not installed.
    pub fn uninstall_user(&self, user_id: &str) -> bool {
        self.lock().sessions.uninstall(user_id)
    }

    /// Returns true if the user installed the application.
    #[must_use]
    pub fn is_installed(&self, user_id: &str) -> bool {
        self.lock().sessions.is_installed(user_id)
    }

    /// Returns the permissions an installed user granted.
    #[must_use]
    pub fn permissions(&self, user_id: &str) -> Option<Vec<String>> {
        self.lock().sessions.permissions(user_id)
    }

    /// Returns the user's access token, issuing one on first use.
    pub fn build_access_token(&self, user_id: &str) -> String {
        self.lock().sessions.issue_token(user_id)
    }

    /// Replaces the user's access token; the previous one stops resolving.
    pub fn rotate_access_token(&self, user_id: &str) -> String {
        self.lock().sessions.rotate_token(user_id)
    }

    /// Builds the signed request the application would receive for `user_id`.
    pub fn build_signed_request(&self, user_id: &str) -> Result<String> {
        self.lock()
            .sessions
            .build_signed_request_for(user_id, &self.config.app.secret, unix_now())
    }

    /// Verifies a signed request against the application secret.
    pub fn parse_signed_request(&self, token: &str) -> Result<SignedRequest> {
        parse_signed_request(token, &self.config.app.secret)
    }

    /// Builds the session cookie value for `user_id`. `expires` of 0 never expires.
    pub fn build_cookie(&self, user_id: &str, expires: i64) -> String {
        let access_token = self.build_access_token(user_id);
        let mut fields = BTreeMap::new();
        fields.insert("uid".to_string(), user_id.to_string());
        fields.insert("access_token".to_string(), access_token);
        fields.insert("expires".to_string(), expires.to_string());
        encode_cookie_token(&fields, &self.config.app.secret)
    }

    /// Returns the cookie name the session cookie is stored under.
    #[must_use]
    pub fn cookie_name(&self) -> String {
        format!("{}{}", self.config.cookie_prefix, self.config.app.id)
    }

    /// Decodes the application's session cookie from a cookie jar.
    #[must_use]
    pub fn user_from_cookies(
        &self,
        cookies: &HashMap<String, String>,
    ) -> Option<BTreeMap<String, String>> {
        user_from_cookies(
            cookies,
            &self.config.cookie_prefix,
            &self.config.app.id,
            &self.config.app.secret,
        )
    }

    /// Exchanges client credentials for the application's access token.
    pub fn app_access_token(&self, client_id: &str, client_secret: &str) -> Result<String> {
        let secret_ok = constant_time_eq(
            client_secret.as_bytes(),
            self.config.app.secret.as_bytes(),
        );
        if client_id != self.config.app.id || !secret_ok {
            warn!(client_id, "rejected client credentials");
            return Err(Error::Authentication(
                "invalid client credentials".to_string(),
            ));
        }
        Ok(self.build_access_token(&self.config.app.id))
    }

    /// Builds a realtime update payload for changes to existing objects.
    ///
    /// `changes` maps object ids to the names of the fields that changed.
    pub fn realtime_update<S: AsRef<str>>(
        &self,
        object_type: &str,
        changes: &BTreeMap<String, Vec<S>>,
    ) -> Result<Value> {
        let kind: NodeKind = object_type.parse()?;
        let now = unix_now();

        let state = self.lock();
        let mut update = RealtimeUpdate::new(kind.as_str());
        for (uid, fields) in changes {
            let object = state.store.get(uid)?;
            if object.kind() != kind {
                return Err(Error::NotFound(format!("{kind}/{uid}")));
            }
            update = update.with_entry(uid, fields, now);
        }
        debug!(object = %kind, entries = update.entry.len(), "realtime update built");
        Ok(serde_json::to_value(update)?)
    }

    // ── Client conveniences ───────────────────────────────────────────

    /// Returns an in-process client acting with `access_token`.
    #[must_use]
    pub fn api(self: &Arc<Self>, access_token: Option<&str>) -> MockGraphApi {
        MockGraphApi::new(Arc::clone(self), access_token)
    }

    /// Provisions a test user and optionally merges extra profile fields into it.
    pub fn create_user(
        self: &Arc<Self>,
        installed: bool,
        permissions: &[&str],
        profile: Map<String, Value>,
    ) -> Result<TestUser<MockGraphApi>> {
        let app_api = self.api(None);
        let user = TestUser::create(&app_api, &self.config.app.id, installed, permissions)?;
        if !profile.is_empty() {
            self.update(user.id(), profile)?;
        }
        Ok(user)
    }

    fn render(&self, store: &GraphStore, object: &GraphObject, options: &FetchOptions) -> Value {
        let mut value = if options.fields.is_empty() {
            object.to_json()
        } else {
            object.project(&options.fields)
        };
        if options.metadata {
            let connections: Map<String, Value> = store
                .relations()
                .relations_for(object.kind())
                .into_iter()
                .map(|relation| {
                    let url = format!(
                        "https://{}/{}/{}",
                        self.config.graph_host,
                        object.id(),
                        relation
                    );
                    (relation.to_string(), Value::String(url))
                })
                .collect();
            if let Value::Object(map) = &mut value {
                map.insert("type".to_string(), json!(object.kind().as_str()));
                map.insert("metadata".to_string(), json!({ "connections": connections }));
            }
        }
        value
    }
}

/// Resolves the `me` alias through the session manager.
fn resolve_id(sessions: &SessionManager, id: &str, access_token: Option<&str>) -> Result<String> {
    if id == ME {
        sessions.resolve_me(access_token)
    } else {
        Ok(id.to_string())
    }
}

fn split_once_slash(path: &str) -> (&str, Option<&str>) {
    match path.split_once('/') {
        Some((head, rest)) => (head, Some(rest)),
        None => (path, None),
    }
}
